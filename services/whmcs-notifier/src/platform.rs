//! Lookups the notifier needs from the billing platform

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A WHMCS client id
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a trimmed id; empty and `0` ids are treated as missing, as WHMCS does
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == "0" {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A support ticket, reduced to what the resolver needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketRecord {
    pub ticket_id: String,
    pub owner: Option<UserId>,
}

/// An invoice, reduced to what the resolver needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceRecord {
    pub invoice_id: String,
    pub owner: Option<UserId>,
}

/// Client details used for the optional client-info embed fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub company_name: Option<String>,
}

/// One stored custom-field value for a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFieldValue {
    pub field_id: u64,
    pub field_name: String,
    pub value: String,
}

/// Read-only access to billing platform records.
///
/// `Ok(None)` means the record does not exist; `Err` means the lookup
/// itself failed. Callers treat both as a miss.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait BillingPlatform: Send + Sync {
    async fn get_ticket(&self, ticket_id: &str) -> crate::Result<Option<TicketRecord>>;

    async fn get_invoice(&self, invoice_id: &str) -> crate::Result<Option<InvoiceRecord>>;

    async fn get_client(&self, user_id: &UserId) -> crate::Result<Option<UserRecord>>;

    /// Custom-field values stored for the client whose field name contains
    /// `name_pattern`, ignoring case
    async fn custom_field_values(
        &self,
        user_id: &UserId,
        name_pattern: &str,
    ) -> crate::Result<Vec<CustomFieldValue>>;

    /// Ticket whose public mask is `mask` or, failing that, `number`
    async fn find_ticket_by_mask(
        &self,
        mask: &str,
        number: &str,
    ) -> crate::Result<Option<TicketRecord>>;
}
