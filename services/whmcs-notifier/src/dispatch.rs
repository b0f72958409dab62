//! Hands formatted notifications to the DM relay

use std::sync::Arc;

use relay_wire::{HealthResponse, SendDmRequest, API_KEY_HEADER, HEALTH_PATH, SEND_DM_PATH};

use crate::config::RelaySettings;
use crate::contact::ContactTarget;
use crate::format::FormattedPayload;
use crate::io::HttpClient;

/// Result of a single delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    /// Delivery failed; the failure has been logged and goes no further
    SoftFailed { reason: String },
}

/// Result of a relay health check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Ok,
    Failed(String),
}

/// Sends one request per notification, with no retry
pub struct RelayDispatcher {
    http: Arc<dyn HttpClient>,
}

impl RelayDispatcher {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    pub fn build_request(target: &ContactTarget, payload: FormattedPayload) -> SendDmRequest {
        match payload {
            FormattedPayload::PlainText { body } => SendDmRequest::plain(target.as_str(), body),
            FormattedPayload::RichEmbed(embed) => {
                SendDmRequest::embed(target.as_str(), embed.into())
            }
        }
    }

    pub async fn dispatch(
        &self,
        target: &ContactTarget,
        payload: FormattedPayload,
        settings: &RelaySettings,
    ) -> DispatchOutcome {
        let request = Self::build_request(target, payload);
        let body = match serde_json::to_value(&request) {
            Ok(body) => body,
            Err(e) => return soft_fail(format!("Encoding relay request: {}", e)),
        };

        tracing::debug!("Sending DM request for Discord user {}", target);
        let headers = [(API_KEY_HEADER, settings.api_key.as_str())];
        match self.http.post_json(&settings.api_url, &headers, &body).await {
            Ok(response) if response.is_success() => {
                tracing::info!("Notification relayed to Discord user {}", target);
                DispatchOutcome::Delivered
            }
            Ok(response) => soft_fail(format!(
                "Relay returned HTTP {}: {}",
                response.status, response.body
            )),
            Err(e) => soft_fail(format!("Relay request failed: {}", e)),
        }
    }

    /// Check that the relay is reachable and its bot session is up
    pub async fn test_connection(&self, settings: &RelaySettings) -> ConnectionStatus {
        if settings.api_url.is_empty() || settings.api_key.is_empty() {
            return ConnectionStatus::Failed("API URL and API Key are required".to_string());
        }

        let health_url = settings.api_url.replace(SEND_DM_PATH, HEALTH_PATH);
        tracing::debug!("Checking relay health at {}", health_url);

        let response = match self.http.get(&health_url, &[]).await {
            Ok(response) => response,
            Err(e) => return ConnectionStatus::Failed(format!("Connection failed: {}", e)),
        };

        if !response.is_success() {
            return ConnectionStatus::Failed(format!(
                "API returned HTTP code {}",
                response.status
            ));
        }

        match serde_json::from_str::<HealthResponse>(&response.body) {
            Ok(health) if health.is_ok() => ConnectionStatus::Ok,
            _ => ConnectionStatus::Failed("Bot health check failed".to_string()),
        }
    }
}

fn soft_fail(reason: String) -> DispatchOutcome {
    tracing::warn!("Failed to send Discord DM: {}", reason);
    DispatchOutcome::SoftFailed { reason }
}
