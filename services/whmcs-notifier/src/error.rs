//! Error types for the notifier

/// Errors that can occur while resolving and relaying a notification
#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lookup failed: {0}")]
    Lookup(String),
}

/// Result type alias for notifier operations
pub type Result<T> = std::result::Result<T, NotifierError>;
