//! Maps a notification event back to the WHMCS client it concerns

use std::sync::{Arc, LazyLock};

use regex::Regex;

use crate::event::NotificationEvent;
use crate::platform::{BillingPlatform, UserId};

/// Labels that carry a client id directly, in priority order
const CLIENT_ID_LABELS: [&str; 4] = ["Client ID", "User ID", "UserID", "ClientID"];

static INVOICE_IN_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Invoice #(\d+)").expect("valid regex"));

static USER_ID_IN_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"User ID:\s*(\d+)").expect("valid regex"));

static TICKET_MASK_IN_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#([A-Z]{2,3})-([0-9]+)").expect("valid regex"));

/// Which step of the chain produced the id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionSource {
    ClientIdAttribute,
    IdAttribute,
    TicketAttribute,
    InvoiceAttribute,
    InvoiceInTitle,
    UserIdInTitle,
    TicketMaskInTitle,
}

/// A resolved client id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUser {
    pub user_id: UserId,
    pub source: ResolutionSource,
}

/// Walks the fallback chain from event to client id
pub struct IdentityResolver {
    platform: Arc<dyn BillingPlatform>,
}

impl IdentityResolver {
    pub fn new(platform: Arc<dyn BillingPlatform>) -> Self {
        Self { platform }
    }

    /// Resolve the client id for an event. `None` is the normal outcome for
    /// events that do not concern a client.
    pub async fn resolve(&self, event: &NotificationEvent) -> Option<ResolvedUser> {
        let resolved = match self.from_attributes(event).await {
            Some(found) => Some(found),
            None => self.from_title(event.title()).await,
        };

        match &resolved {
            Some(found) => tracing::debug!(
                "Resolved client {} via {:?}",
                found.user_id,
                found.source
            ),
            None => tracing::info!(
                "No client ID found for notification. Title: {}",
                event.title()
            ),
        }
        resolved
    }

    async fn from_attributes(&self, event: &NotificationEvent) -> Option<ResolvedUser> {
        let attributes = event.attributes();

        if let Some(user_id) = attributes.first_value("Client ID").and_then(UserId::parse) {
            return Some(ResolvedUser {
                user_id,
                source: ResolutionSource::ClientIdAttribute,
            });
        }

        for label in CLIENT_ID_LABELS {
            if let Some(user_id) = attributes.first_value(label).and_then(UserId::parse) {
                return Some(ResolvedUser {
                    user_id,
                    source: ResolutionSource::IdAttribute,
                });
            }
        }

        if let Some(ticket_id) = attributes.first_value("Ticket ID") {
            if let Some(user_id) = self.ticket_owner(ticket_id).await {
                return Some(ResolvedUser {
                    user_id,
                    source: ResolutionSource::TicketAttribute,
                });
            }
        }

        if let Some(invoice_id) = attributes.first_value("Invoice ID") {
            if let Some(user_id) = self.invoice_owner(invoice_id).await {
                return Some(ResolvedUser {
                    user_id,
                    source: ResolutionSource::InvoiceAttribute,
                });
            }
        }

        None
    }

    async fn from_title(&self, title: &str) -> Option<ResolvedUser> {
        if let Some(captures) = INVOICE_IN_TITLE.captures(title) {
            let invoice_id = &captures[1];
            tracing::debug!("Found invoice {} in title", invoice_id);
            if let Some(user_id) = self.invoice_owner(invoice_id).await {
                return Some(ResolvedUser {
                    user_id,
                    source: ResolutionSource::InvoiceInTitle,
                });
            }
        }

        if let Some(captures) = USER_ID_IN_TITLE.captures(title) {
            if let Some(user_id) = UserId::parse(&captures[1]) {
                tracing::info!("Extracted client ID {} from notification title", user_id);
                return Some(ResolvedUser {
                    user_id,
                    source: ResolutionSource::UserIdInTitle,
                });
            }
        }

        if let Some(captures) = TICKET_MASK_IN_TITLE.captures(title) {
            let mask = captures[0].trim_start_matches('#');
            let number = &captures[2];
            tracing::info!("Found ticket mask {} in title", mask);
            match self.platform.find_ticket_by_mask(mask, number).await {
                Ok(Some(ticket)) => {
                    if let Some(user_id) = ticket.owner {
                        tracing::info!("Found client ID {} from ticket {}", user_id, mask);
                        return Some(ResolvedUser {
                            user_id,
                            source: ResolutionSource::TicketMaskInTitle,
                        });
                    }
                }
                Ok(None) => tracing::debug!("No ticket matches mask {}", mask),
                Err(e) => tracing::warn!("Ticket lookup by mask {} failed: {}", mask, e),
            }
        }

        None
    }

    async fn ticket_owner(&self, ticket_id: &str) -> Option<UserId> {
        match self.platform.get_ticket(ticket_id).await {
            Ok(Some(ticket)) => ticket.owner,
            Ok(None) => {
                tracing::debug!("Ticket {} not found", ticket_id);
                None
            }
            Err(e) => {
                tracing::warn!("Ticket lookup for {} failed: {}", ticket_id, e);
                None
            }
        }
    }

    async fn invoice_owner(&self, invoice_id: &str) -> Option<UserId> {
        match self.platform.get_invoice(invoice_id).await {
            Ok(Some(invoice)) => invoice.owner,
            Ok(None) => {
                tracing::debug!("Invoice {} not found", invoice_id);
                None
            }
            Err(e) => {
                tracing::warn!("Invoice lookup for {} failed: {}", invoice_id, e);
                None
            }
        }
    }
}
