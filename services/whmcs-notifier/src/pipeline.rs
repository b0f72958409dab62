//! Event to Discord DM, end to end

use std::sync::Arc;

use crate::config::Config;
use crate::contact::ContactResolver;
use crate::dispatch::{DispatchOutcome, RelayDispatcher};
use crate::event::NotificationEvent;
use crate::format::NotificationFormatter;
use crate::identity::IdentityResolver;
use crate::io::HttpClient;
use crate::platform::BillingPlatform;

/// How processing of one event ended. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    Delivered,
    SoftFailed { reason: String },
    /// The event could not be tied to a client
    NoUser,
    /// The client id did not resolve to client details
    NoClientDetails,
    /// The client has no usable Discord account
    NoContact,
}

/// Chains identity, client lookup, contact, formatting and delivery
pub struct NotificationPipeline {
    platform: Arc<dyn BillingPlatform>,
    identity: IdentityResolver,
    contact: ContactResolver,
    formatter: NotificationFormatter,
    dispatcher: RelayDispatcher,
    config: Config,
}

impl NotificationPipeline {
    pub fn new(config: Config, platform: Arc<dyn BillingPlatform>, http: Arc<dyn HttpClient>) -> Self {
        Self {
            identity: IdentityResolver::new(Arc::clone(&platform)),
            contact: ContactResolver::new(Arc::clone(&platform)),
            formatter: NotificationFormatter::new(config.preferences.clone()),
            dispatcher: RelayDispatcher::new(http),
            platform,
            config,
        }
    }

    pub fn dispatcher(&self) -> &RelayDispatcher {
        &self.dispatcher
    }

    /// Process one event. Never fails; every early exit is logged.
    pub async fn process(&self, event: &NotificationEvent) -> PipelineOutcome {
        let Some(resolved) = self.identity.resolve(event).await else {
            return PipelineOutcome::NoUser;
        };
        let user_id = resolved.user_id;

        let user = match self.platform.get_client(&user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!("Client {} not found, skipping notification", user_id);
                return PipelineOutcome::NoClientDetails;
            }
            Err(e) => {
                tracing::warn!("Failed to load client {}: {}", user_id, e);
                return PipelineOutcome::NoClientDetails;
            }
        };

        let Some(target) = self
            .contact
            .resolve(&user_id, &self.config.relay.custom_field_name, event)
            .await
        else {
            tracing::debug!("Client {} has no Discord account on file", user_id);
            return PipelineOutcome::NoContact;
        };

        let payload = self.formatter.format(event, &user);
        match self
            .dispatcher
            .dispatch(&target, payload, &self.config.relay)
            .await
        {
            DispatchOutcome::Delivered => PipelineOutcome::Delivered,
            DispatchOutcome::SoftFailed { reason } => PipelineOutcome::SoftFailed { reason },
        }
    }
}
