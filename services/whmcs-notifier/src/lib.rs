//! WHMCS notifier
//!
//! Resolves WHMCS notification events to a client's Discord account and
//! hands them to the DM relay.

pub mod config;
pub mod contact;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod format;
pub mod hooks;
pub mod identity;
pub mod io;
pub mod pipeline;
pub mod platform;
pub mod whmcs_api;

pub use config::{load_config, Config};
pub use dispatch::{ConnectionStatus, DispatchOutcome, RelayDispatcher};
pub use error::{NotifierError, Result};
pub use event::{Attribute, NotificationEvent};
pub use pipeline::{NotificationPipeline, PipelineOutcome};

use std::path::Path;
use std::sync::Arc;

use crate::io::{HttpClient, ReqwestHttpClient};
use crate::whmcs_api::WhmcsApi;

/// Pipeline wired to the WHMCS API and the relay over HTTP
pub fn build_pipeline(config: Config) -> Result<NotificationPipeline> {
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new()?);
    let platform = Arc::new(WhmcsApi::new(config.whmcs.clone(), Arc::clone(&http)));
    Ok(NotificationPipeline::new(config, platform, http))
}

/// Read a notification event from a JSON file
pub fn load_event(path: &Path) -> Result<NotificationEvent> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        NotifierError::Config(format!("Failed to read event file {:?}: {}", path, e))
    })?;
    Ok(serde_json::from_str(&content)?)
}
