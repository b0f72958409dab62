//! BDD test world for the WHMCS notifier

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cucumber::World;
use whmcs_notifier::config::Config;
use whmcs_notifier::event::Attribute;
use whmcs_notifier::format::FormattedPayload;
use whmcs_notifier::hooks::TriggerRequest;
use whmcs_notifier::io::{HttpClient, HttpResponse};
use whmcs_notifier::platform::{
    BillingPlatform, CustomFieldValue, InvoiceRecord, TicketRecord, UserId, UserRecord,
};
use whmcs_notifier::{ConnectionStatus, NotificationEvent, NotifierError, PipelineOutcome};

/// In-memory billing platform
#[derive(Debug, Clone, Default)]
pub struct FakePlatform {
    pub tickets: HashMap<String, String>,
    pub ticket_masks: HashMap<String, String>,
    pub invoices: HashMap<String, String>,
    pub clients: HashMap<String, UserRecord>,
    pub discord_fields: HashMap<String, Vec<CustomFieldValue>>,
    pub ticket_lookups_fail: bool,
    pub lookups: Arc<AtomicUsize>,
}

impl FakePlatform {
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn count(&self) {
        self.lookups.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl BillingPlatform for FakePlatform {
    async fn get_ticket(&self, ticket_id: &str) -> whmcs_notifier::Result<Option<TicketRecord>> {
        self.count();
        if self.ticket_lookups_fail {
            return Err(NotifierError::Lookup("Ticket lookup unavailable".to_string()));
        }
        Ok(self.tickets.get(ticket_id).map(|owner| TicketRecord {
            ticket_id: ticket_id.to_string(),
            owner: UserId::parse(owner),
        }))
    }

    async fn get_invoice(&self, invoice_id: &str) -> whmcs_notifier::Result<Option<InvoiceRecord>> {
        self.count();
        Ok(self.invoices.get(invoice_id).map(|owner| InvoiceRecord {
            invoice_id: invoice_id.to_string(),
            owner: UserId::parse(owner),
        }))
    }

    async fn get_client(&self, user_id: &UserId) -> whmcs_notifier::Result<Option<UserRecord>> {
        self.count();
        Ok(self.clients.get(user_id.as_str()).cloned())
    }

    async fn custom_field_values(
        &self,
        user_id: &UserId,
        _name_pattern: &str,
    ) -> whmcs_notifier::Result<Vec<CustomFieldValue>> {
        self.count();
        Ok(self
            .discord_fields
            .get(user_id.as_str())
            .cloned()
            .unwrap_or_default())
    }

    async fn find_ticket_by_mask(
        &self,
        mask: &str,
        number: &str,
    ) -> whmcs_notifier::Result<Option<TicketRecord>> {
        self.count();
        if self.ticket_lookups_fail {
            return Err(NotifierError::Lookup("Ticket lookup unavailable".to_string()));
        }
        let found = self
            .ticket_masks
            .get(mask)
            .or_else(|| self.ticket_masks.get(number));
        Ok(found.map(|owner| TicketRecord {
            ticket_id: mask.to_string(),
            owner: UserId::parse(owner),
        }))
    }
}

/// Relay double that records every DM request it receives
#[derive(Debug, Clone)]
pub struct RecordingRelay {
    /// `None` simulates an unreachable relay
    pub status: Option<u16>,
    pub health_body: String,
    pub requests: Arc<Mutex<Vec<serde_json::Value>>>,
    pub api_keys: Arc<Mutex<Vec<String>>>,
}

impl Default for RecordingRelay {
    fn default() -> Self {
        Self {
            status: Some(200),
            health_body: r#"{"status":"ok"}"#.to_string(),
            requests: Arc::new(Mutex::new(Vec::new())),
            api_keys: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl RecordingRelay {
    pub fn recorded(&self) -> Vec<serde_json::Value> {
        self.requests.lock().unwrap().clone()
    }

    fn respond(&self, body: &str) -> whmcs_notifier::Result<HttpResponse> {
        match self.status {
            Some(status) => Ok(HttpResponse {
                status,
                body: body.to_string(),
            }),
            None => Err(NotifierError::Http("connection refused".to_string())),
        }
    }
}

#[async_trait]
impl HttpClient for RecordingRelay {
    async fn get(
        &self,
        _url: &str,
        _headers: &[(&str, &str)],
    ) -> whmcs_notifier::Result<HttpResponse> {
        self.respond(&self.health_body)
    }

    async fn post_form(
        &self,
        _url: &str,
        _params: &[(&str, &str)],
    ) -> whmcs_notifier::Result<HttpResponse> {
        Err(NotifierError::Http("unexpected form post".to_string()))
    }

    async fn post_json(
        &self,
        _url: &str,
        headers: &[(&str, &str)],
        body: &serde_json::Value,
    ) -> whmcs_notifier::Result<HttpResponse> {
        if let Some((_, key)) = headers.iter().find(|(name, _)| *name == "X-API-Key") {
            self.api_keys.lock().unwrap().push(key.to_string());
        }
        if self.status.is_some() {
            self.requests.lock().unwrap().push(body.clone());
        }
        self.respond(r#"{"success":true}"#)
    }
}

#[derive(Debug, Default, World)]
pub struct NotifierWorld {
    // Event under test
    pub title: String,
    pub message: String,
    pub attributes: Vec<Attribute>,
    pub hook: Option<TriggerRequest>,

    // Collaborators
    pub platform: FakePlatform,
    pub relay: RecordingRelay,
    pub config: Config,

    // Results
    pub resolved: Option<Option<String>>,
    pub payload: Option<FormattedPayload>,
    pub outcome: Option<PipelineOutcome>,
    pub connection: Option<ConnectionStatus>,
}

impl NotifierWorld {
    pub fn event(&self) -> NotificationEvent {
        NotificationEvent::new(
            self.title.clone(),
            self.message.clone(),
            "https://billing.example.com/viewticket.php",
            self.attributes.clone(),
        )
    }
}
