//! BillingPlatform backed by the WHMCS external API

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::config::WhmcsConfig;
use crate::io::HttpClient;
use crate::platform::{
    BillingPlatform, CustomFieldValue, InvoiceRecord, TicketRecord, UserId, UserRecord,
};
use crate::NotifierError;

/// WHMCS API client
pub struct WhmcsApi {
    config: WhmcsConfig,
    http: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for WhmcsApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhmcsApi")
            .field("api_url", &self.config.api_url)
            .finish()
    }
}

impl WhmcsApi {
    pub fn new(config: WhmcsConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { config, http }
    }

    /// Call `action` and return the decoded body of a successful response
    async fn call(&self, action: &str, params: &[(&str, &str)]) -> crate::Result<Value> {
        let mut form = vec![
            ("identifier", self.config.identifier.as_str()),
            ("secret", self.config.secret.as_str()),
            ("action", action),
            ("responsetype", "json"),
        ];
        if let Some(access_key) = self.config.access_key.as_deref() {
            form.push(("accesskey", access_key));
        }
        form.extend_from_slice(params);

        tracing::debug!("Calling WHMCS API action {}", action);
        let response = self.http.post_form(&self.config.api_url, &form).await?;
        if !response.is_success() {
            return Err(NotifierError::Http(format!(
                "WHMCS API returned status {} for {}",
                response.status, action
            )));
        }

        let body: Value = serde_json::from_str(&response.body)?;
        if body.get("result").and_then(Value::as_str) != Some("success") {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(NotifierError::Lookup(format!("{}: {}", action, message)));
        }
        Ok(body)
    }

    async fn get_ticket_by(&self, key: &str, value: &str) -> crate::Result<Option<TicketRecord>> {
        let body = self.call("GetTicket", &[(key, value)]).await?;
        Ok(Some(TicketRecord {
            ticket_id: text(&body, "ticketid").unwrap_or_else(|| value.to_string()),
            owner: owner(&body),
        }))
    }
}

#[async_trait]
impl BillingPlatform for WhmcsApi {
    async fn get_ticket(&self, ticket_id: &str) -> crate::Result<Option<TicketRecord>> {
        self.get_ticket_by("ticketid", ticket_id).await
    }

    async fn get_invoice(&self, invoice_id: &str) -> crate::Result<Option<InvoiceRecord>> {
        let body = self.call("GetInvoice", &[("invoiceid", invoice_id)]).await?;
        Ok(Some(InvoiceRecord {
            invoice_id: text(&body, "invoiceid").unwrap_or_else(|| invoice_id.to_string()),
            owner: owner(&body),
        }))
    }

    async fn get_client(&self, user_id: &UserId) -> crate::Result<Option<UserRecord>> {
        let body = self
            .call(
                "GetClientsDetails",
                &[("clientid", user_id.as_str()), ("stats", "false")],
            )
            .await?;
        let client = body.get("client").unwrap_or(&body);
        Ok(Some(UserRecord {
            id: text(client, "id").unwrap_or_else(|| user_id.to_string()),
            first_name: text(client, "firstname"),
            last_name: text(client, "lastname"),
            email: text(client, "email"),
            company_name: text(client, "companyname"),
        }))
    }

    async fn custom_field_values(
        &self,
        user_id: &UserId,
        name_pattern: &str,
    ) -> crate::Result<Vec<CustomFieldValue>> {
        let body = self
            .call(
                "GetClientsDetails",
                &[("clientid", user_id.as_str()), ("stats", "false")],
            )
            .await?;
        let client = body.get("client").unwrap_or(&body);
        let entries = client
            .get("customfields")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let pattern = name_pattern.to_lowercase();
        let mut values: Vec<CustomFieldValue> = entries
            .iter()
            .filter_map(|entry| {
                let field_id = entry.get("id").and_then(as_u64)?;
                let value = text(entry, "value").unwrap_or_default();
                let name = text(entry, "name").or_else(|| text(entry, "fieldname"));
                let field_name = match name {
                    Some(name) if name.to_lowercase().contains(&pattern) => name,
                    Some(_) => return None,
                    // Unnamed fields only match the configured field id
                    None if self.config.discord_field_id == Some(field_id) => {
                        name_pattern.to_string()
                    }
                    None => return None,
                };
                Some(CustomFieldValue {
                    field_id,
                    field_name,
                    value,
                })
            })
            .collect();
        values.sort_by_key(|v| v.field_id);
        Ok(values)
    }

    async fn find_ticket_by_mask(
        &self,
        mask: &str,
        number: &str,
    ) -> crate::Result<Option<TicketRecord>> {
        match self.get_ticket_by("ticketnum", mask).await {
            Ok(found) => Ok(found),
            Err(e) => {
                tracing::debug!("No ticket with mask {} ({}), trying {}", mask, e, number);
                self.get_ticket_by("ticketnum", number).await
            }
        }
    }
}

/// String form of a scalar JSON field; empty strings count as missing
fn text(value: &Value, key: &str) -> Option<String> {
    match value.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn owner(body: &Value) -> Option<UserId> {
    text(body, "userid").and_then(|id| UserId::parse(&id))
}
