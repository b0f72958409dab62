//! Error types for the relay

use serde::Deserialize;

/// Discord could not deliver the message to this user
pub const CANNOT_MESSAGE_USER: u64 = 50007;
/// No Discord account with this id
pub const UNKNOWN_USER: u64 = 10013;
/// The bot lacks access to the resource
pub const MISSING_ACCESS: u64 = 50001;

/// Errors that can occur in the relay
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Discord(#[from] DiscordError),

    #[error("Discord login failed: {0}")]
    Login(String),
}

/// An error reported by the Discord API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DiscordError {
    /// Discord's JSON error code, when the body carried one
    pub code: Option<u64>,
    pub status: u16,
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: Option<u64>,
    message: Option<String>,
}

impl DiscordError {
    /// Parse a non-2xx Discord response
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self {
                code: parsed.code,
                status,
                message: parsed
                    .message
                    .unwrap_or_else(|| format!("Discord API returned status {}", status)),
            },
            Err(_) => Self {
                code: None,
                status,
                message: format!("Discord API returned status {}: {}", status, body),
            },
        }
    }

    /// HTTP status and message to report to the relay's caller
    pub fn client_response(&self) -> (u16, String) {
        match self.code {
            Some(CANNOT_MESSAGE_USER) => (
                403,
                "Cannot send messages to this user (they may have DMs disabled)".to_string(),
            ),
            Some(UNKNOWN_USER) => (404, "Unknown user - Discord ID not found".to_string()),
            Some(MISSING_ACCESS) => (403, "Missing access - Bot lacks permissions".to_string()),
            _ => (500, self.message.clone()),
        }
    }
}

/// Result type alias for relay operations
pub type Result<T> = std::result::Result<T, RelayError>;
