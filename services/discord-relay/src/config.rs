//! Configuration types for the relay

use serde::{Deserialize, Serialize};
use std::path::Path;

const ENV_SECRET_PREFIX: &str = "env:";

/// Main configuration structure
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    /// Shared secret expected in `X-API-Key`
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_discord_api_base")]
    pub discord_api_base: String,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Take the client address from `X-Forwarded-For`
    #[serde(default = "default_true")]
    pub trust_proxy: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind_address: default_bind_address(),
            api_key: String::new(),
            bot_token: String::new(),
            discord_api_base: default_discord_api_base(),
            rate_limit: RateLimitConfig::default(),
            trust_proxy: true,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("bind_address", &self.bind_address)
            .field("discord_api_base", &self.discord_api_base)
            .field("rate_limit", &self.rate_limit)
            .field("trust_proxy", &self.trust_proxy)
            .finish()
    }
}

impl Config {
    /// Apply `PORT`, `API_KEY` and `DISCORD_BOT_TOKEN` from the environment
    pub fn apply_env_overrides(&mut self) -> crate::Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> crate::Result<()> {
        if let Some(port) = lookup("PORT") {
            self.port = port.parse().map_err(|_| {
                crate::RelayError::Config(format!("PORT is not a valid port number: {}", port))
            })?;
        }
        if let Some(api_key) = lookup("API_KEY") {
            self.api_key = api_key;
        }
        if let Some(bot_token) = lookup("DISCORD_BOT_TOKEN") {
            self.bot_token = bot_token;
        }
        Ok(())
    }

    /// Replace `env:NAME` secrets with the value of environment variable `NAME`
    pub fn resolve_secrets(&mut self) -> crate::Result<()> {
        resolve_secret(&mut self.api_key)?;
        resolve_secret(&mut self.bot_token)?;
        Ok(())
    }

    /// Reject configurations the relay cannot run with
    pub fn validate(&self) -> crate::Result<()> {
        if self.api_key.is_empty() {
            return Err(crate::RelayError::Config("api_key is not set".to_string()));
        }
        if self.bot_token.is_empty() {
            return Err(crate::RelayError::Config("bot_token is not set".to_string()));
        }
        if self.rate_limit.max_requests == 0 || self.rate_limit.window_seconds == 0 {
            return Err(crate::RelayError::Config(
                "rate_limit values must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sliding-window limit on delivery requests per client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_max_requests")]
    pub max_requests: usize,
    #[serde(default = "default_window_seconds")]
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_seconds: default_window_seconds(),
        }
    }
}

fn default_port() -> u16 {
    3000
}

fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_discord_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_max_requests() -> usize {
    100
}

fn default_window_seconds() -> u64 {
    15 * 60
}

fn default_true() -> bool {
    true
}

fn resolve_secret(value: &mut String) -> crate::Result<()> {
    if let Some(name) = value.strip_prefix(ENV_SECRET_PREFIX) {
        let resolved = std::env::var(name).map_err(|_| {
            crate::RelayError::Config(format!("Environment variable {} is not set", name))
        })?;
        *value = resolved;
    }
    Ok(())
}

/// Load configuration from a JSON file
pub fn load_config(path: &Path) -> crate::Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        crate::RelayError::Config(format!("Failed to read config file {:?}: {}", path, e))
    })?;
    let config: Config = serde_json::from_str(&content)?;
    Ok(config)
}
