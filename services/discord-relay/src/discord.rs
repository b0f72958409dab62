//! Discord bot session and direct-message delivery

use std::sync::Arc;

use async_trait::async_trait;
use relay_wire::{EmbedData, EmbedField, EmbedFooter};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::DiscordError;
use crate::io::HttpClient;
use crate::RelayError;

/// Embed as Discord's create-message endpoint expects it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiscordEmbed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    pub fields: Vec<EmbedField>,
}

impl From<&EmbedData> for DiscordEmbed {
    fn from(data: &EmbedData) -> Self {
        Self {
            title: data.title.clone(),
            description: data.description.clone(),
            url: data.url.clone(),
            color: data.effective_color(),
            timestamp: data.timestamp.clone(),
            footer: data.footer.clone(),
            fields: data.fields.clone(),
        }
    }
}

/// A message to deliver to one user
#[derive(Debug, Clone, PartialEq)]
pub enum DirectMessage {
    Text(String),
    Embed {
        embed: DiscordEmbed,
        /// Interactive components, passed through untouched
        components: Vec<serde_json::Value>,
    },
}

impl DirectMessage {
    pub fn embed(data: &EmbedData) -> Self {
        DirectMessage::Embed {
            embed: DiscordEmbed::from(data),
            components: data.components.clone(),
        }
    }

    /// Body for `POST /channels/{id}/messages`
    pub fn to_body(&self) -> serde_json::Value {
        match self {
            DirectMessage::Text(content) => serde_json::json!({ "content": content }),
            DirectMessage::Embed { embed, components } => {
                let mut body = serde_json::json!({ "embeds": [embed] });
                if !components.is_empty() {
                    body["components"] = serde_json::Value::Array(components.clone());
                }
                body
            }
        }
    }
}

/// The messaging platform, as the relay uses it
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub trait DiscordApi: Send + Sync {
    /// Authenticate the bot; returns its user name
    async fn login(&self) -> crate::Result<String>;

    /// Deliver `message` to the user with this id
    async fn send_dm(&self, user_id: &str, message: &DirectMessage) -> crate::Result<()>;

    /// Tear down the session
    async fn logout(&self);
}

#[derive(Deserialize)]
struct BotUser {
    username: String,
    #[serde(default)]
    discriminator: Option<String>,
}

impl BotUser {
    fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if d != "0" => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }
}

#[derive(Deserialize)]
struct Channel {
    id: String,
}

/// Discord REST API client authenticated as a bot
pub struct RestDiscordApi {
    api_base: String,
    token: String,
    http: Arc<dyn HttpClient>,
    session: RwLock<Option<String>>,
}

impl std::fmt::Debug for RestDiscordApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestDiscordApi")
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl RestDiscordApi {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
            http,
            session: RwLock::new(None),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }

    async fn get(&self, path: &str) -> crate::Result<String> {
        let authorization = self.authorization();
        let response = self
            .http
            .get(&self.url(path), &[("Authorization", authorization.as_str())])
            .await?;
        if !response.is_success() {
            return Err(DiscordError::from_response(response.status, &response.body).into());
        }
        Ok(response.body)
    }

    async fn post(&self, path: &str, body: &serde_json::Value) -> crate::Result<String> {
        let authorization = self.authorization();
        let response = self
            .http
            .post_json(
                &self.url(path),
                &[("Authorization", authorization.as_str())],
                body,
            )
            .await?;
        if !response.is_success() {
            return Err(DiscordError::from_response(response.status, &response.body).into());
        }
        Ok(response.body)
    }
}

#[async_trait]
impl DiscordApi for RestDiscordApi {
    async fn login(&self) -> crate::Result<String> {
        if self.token.is_empty() {
            return Err(RelayError::Login("no bot token configured".to_string()));
        }
        let body = self
            .get("/users/@me")
            .await
            .map_err(|e| RelayError::Login(e.to_string()))?;
        let user: BotUser = serde_json::from_str(&body)?;
        let tag = user.tag();
        *self.session.write().await = Some(tag.clone());
        Ok(tag)
    }

    async fn send_dm(&self, user_id: &str, message: &DirectMessage) -> crate::Result<()> {
        if self.session.read().await.is_none() {
            return Err(RelayError::Login("not logged in".to_string()));
        }

        // Resolve the account first so unknown ids fail with Discord's own error
        self.get(&format!("/users/{}", user_id)).await?;

        let channel_body = self
            .post(
                "/users/@me/channels",
                &serde_json::json!({ "recipient_id": user_id }),
            )
            .await?;
        let channel: Channel = serde_json::from_str(&channel_body)?;
        tracing::debug!("Opened DM channel {} for user {}", channel.id, user_id);

        self.post(&format!("/channels/{}/messages", channel.id), &message.to_body())
            .await?;
        Ok(())
    }

    async fn logout(&self) {
        if let Some(tag) = self.session.write().await.take() {
            tracing::info!("Closed Discord session for {}", tag);
        }
    }
}
