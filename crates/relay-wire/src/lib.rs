//! Wire types for the Discord DM relay API
//!
//! Shared by the notifier (which builds `SendDmRequest`s) and the relay
//! server (which parses them), so both sides agree on field names.

use serde::{Deserialize, Deserializer, Serialize};

/// Path of the authenticated delivery endpoint
pub const SEND_DM_PATH: &str = "/api/send-dm";

/// Path of the unauthenticated health endpoint
pub const HEALTH_PATH: &str = "/health";

/// Header carrying the shared API key
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Embed accent color used when none is given
pub const DEFAULT_EMBED_COLOR: u32 = 0x0099ff;

/// Whether `id` looks like a Discord account id (a decimal snowflake)
pub fn is_account_id(id: &str) -> bool {
    !id.is_empty() && id.len() <= 20 && id.bytes().all(|b| b.is_ascii_digit())
}

/// Body of `POST /api/send-dm`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendDmRequest {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub discord_id: Option<String>,
    /// Plain-text body; sent as `null` when an embed is used
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_embed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embed_data: Option<EmbedData>,
}

impl SendDmRequest {
    /// Request carrying a plain-text message
    pub fn plain(discord_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            discord_id: Some(discord_id.into()),
            message: Some(message.into()),
            use_embed: None,
            embed_data: None,
        }
    }

    /// Request carrying a rich embed
    pub fn embed(discord_id: impl Into<String>, embed: EmbedData) -> Self {
        Self {
            discord_id: Some(discord_id.into()),
            message: None,
            use_embed: Some(true),
            embed_data: Some(embed),
        }
    }
}

/// Rich embed description as sent over the relay
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbedData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    /// ISO 8601 timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(default)]
    pub fields: Vec<EmbedField>,
    /// Interactive components, passed through to the platform untouched
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<serde_json::Value>,
}

impl EmbedData {
    /// The color to render, falling back to the default accent for missing or zero values
    pub fn effective_color(&self) -> u32 {
        match self.color {
            Some(color) if color != 0 => color,
            _ => DEFAULT_EMBED_COLOR,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Response body of `POST /api/send-dm`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendDmResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendDmResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Response body of `GET /health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Account ids arrive as strings from most callers, but as numbers when they
/// were lifted out of a JSON profile blob.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
