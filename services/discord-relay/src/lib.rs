//! Discord relay
//!
//! Small authenticated HTTP service that delivers direct messages through a
//! Discord bot on behalf of the billing platform.

pub mod config;
pub mod discord;
pub mod error;
pub mod io;
pub mod rate_limit;
pub mod server;

pub use config::{load_config, Config};
pub use discord::{DirectMessage, DiscordApi, RestDiscordApi};
pub use error::{DiscordError, RelayError, Result};

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::io::{HttpClient, ReqwestHttpClient};
use crate::rate_limit::RateLimiter;
use crate::server::AppState;

/// Builder for the relay.
///
/// `build` logs the bot in and binds the listener; a failed login is fatal.
pub struct RelayBuilder {
    config: Config,
    discord: Option<Arc<dyn DiscordApi>>,
    http: Option<Arc<dyn HttpClient>>,
    cancel: CancellationToken,
}

impl RelayBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            discord: None,
            http: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Use this messaging platform instead of the Discord REST API
    pub fn with_discord(mut self, discord: Arc<dyn DiscordApi>) -> Self {
        self.discord = Some(discord);
        self
    }

    /// HTTP client for the default Discord REST API
    pub fn with_http_client(mut self, http: Arc<dyn HttpClient>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_cancellation_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn build(self) -> Result<Relay> {
        let discord = match self.discord {
            Some(discord) => discord,
            None => {
                let http = match self.http {
                    Some(http) => http,
                    None => Arc::new(ReqwestHttpClient::new()?),
                };
                Arc::new(RestDiscordApi::new(
                    self.config.discord_api_base.clone(),
                    self.config.bot_token.clone(),
                    http,
                ))
            }
        };

        let bot = discord.login().await?;
        tracing::info!("Logged in as {}", bot);

        let addr = format!("{}:{}", self.config.bind_address, self.config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        tracing::info!("Server running on {}", local_addr);

        let state = AppState {
            discord: Arc::clone(&discord),
            api_key: Arc::from(self.config.api_key.as_str()),
            limiter: Arc::new(RateLimiter::new(
                &self.config.rate_limit,
                self.config.trust_proxy,
            )),
        };

        Ok(Relay {
            listener,
            local_addr,
            state,
            discord,
            cancel: self.cancel,
        })
    }
}

/// A logged-in, bound relay ready to serve
pub struct Relay {
    listener: TcpListener,
    local_addr: SocketAddr,
    state: AppState,
    discord: Arc<dyn DiscordApi>,
    cancel: CancellationToken,
}

impl Relay {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until the cancellation token fires, then close the Discord session
    pub async fn start(self) -> Result<()> {
        let router = server::build_router(self.state);
        let cancel = self.cancel.clone();

        axum::serve(
            self.listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
            tracing::info!("Shutting down...");
        })
        .await?;

        self.discord.logout().await;
        tracing::debug!("Relay stopped");
        Ok(())
    }
}
