//! Configuration types for the notifier

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Prefix marking a secret that should be read from the environment
const ENV_SECRET_PREFIX: &str = "env:";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelaySettings,
    #[serde(default)]
    pub preferences: NotificationPreferences,
    #[serde(default)]
    pub whmcs: WhmcsConfig,
}

impl Config {
    /// Replace `env:NAME` secrets with the value of environment variable `NAME`
    pub fn resolve_secrets(&mut self) -> crate::Result<()> {
        resolve_secret(&mut self.relay.api_key)?;
        resolve_secret(&mut self.whmcs.secret)?;
        if let Some(access_key) = self.whmcs.access_key.as_mut() {
            resolve_secret(access_key)?;
        }
        Ok(())
    }
}

/// Where and how to reach the DM relay
#[derive(Clone, Serialize, Deserialize)]
pub struct RelaySettings {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Preferred custom field when a client has several Discord-looking fields
    #[serde(default = "default_custom_field_name")]
    pub custom_field_name: String,
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            custom_field_name: default_custom_field_name(),
        }
    }
}

impl std::fmt::Debug for RelaySettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RelaySettings")
            .field("api_url", &self.api_url)
            .field("custom_field_name", &self.custom_field_name)
            .finish()
    }
}

/// Attribute and client-info decoration style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormattingProfile {
    /// Values as-is, links only
    #[default]
    Plain,
    /// Priority dots, style emoji, attribute icons and labelled client fields
    Decorated,
}

/// Per-notification formatting options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationPreferences {
    #[serde(default = "default_message_format")]
    pub message_format: String,
    #[serde(default = "default_true")]
    pub use_rich_embeds: bool,
    #[serde(default = "default_true")]
    pub priority_color_coding: bool,
    #[serde(default = "default_true")]
    pub include_attributes: bool,
    #[serde(default)]
    pub include_client_info: bool,
    #[serde(default)]
    pub profile: FormattingProfile,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            message_format: default_message_format(),
            use_rich_embeds: true,
            priority_color_coding: true,
            include_attributes: true,
            include_client_info: false,
            profile: FormattingProfile::default(),
        }
    }
}

/// WHMCS API credentials
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct WhmcsConfig {
    /// Full URL of `includes/api.php`
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub secret: String,
    #[serde(default)]
    pub access_key: Option<String>,
    /// Custom field id to use when the API does not report field names
    #[serde(default)]
    pub discord_field_id: Option<u64>,
}

impl std::fmt::Debug for WhmcsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhmcsConfig")
            .field("api_url", &self.api_url)
            .field("identifier", &self.identifier)
            .field("discord_field_id", &self.discord_field_id)
            .finish()
    }
}

fn default_custom_field_name() -> String {
    "Discord Profile".to_string()
}

fn default_message_format() -> String {
    "**{title}**\n\n{message}\n\n{url}".to_string()
}

fn default_true() -> bool {
    true
}

fn resolve_secret(value: &mut String) -> crate::Result<()> {
    if let Some(name) = value.strip_prefix(ENV_SECRET_PREFIX) {
        let resolved = std::env::var(name).map_err(|_| {
            crate::NotifierError::Config(format!("Environment variable {} is not set", name))
        })?;
        *value = resolved;
    }
    Ok(())
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::NotifierError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
