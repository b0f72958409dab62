//! Finds the Discord account a client wants notifications sent to

use std::fmt;
use std::sync::Arc;

use relay_wire::is_account_id;

use crate::event::NotificationEvent;
use crate::platform::{BillingPlatform, CustomFieldValue, UserId};

/// Substring identifying Discord custom fields
pub const DISCORD_FIELD_PATTERN: &str = "discord";

/// Attribute that forces delivery to a specific account
pub const TARGET_OVERRIDE_LABEL: &str = "target_discord_id";

/// A Discord account id (snowflake)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactTarget(String);

impl ContactTarget {
    /// A trimmed, all-digit account id; anything else is no target
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if is_account_id(trimmed) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Interpret a stored custom-field value: either a bare numeric id or a
    /// JSON profile object with an `id` key
    pub fn from_stored(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        if is_account_id(trimmed) {
            return Self::parse(trimmed);
        }

        let profile: serde_json::Value = serde_json::from_str(trimmed).ok()?;
        match profile.get("id")? {
            serde_json::Value::String(id) => Self::parse(id),
            serde_json::Value::Number(id) => Self::parse(&id.to_string()),
            _ => None,
        }
    }
}

impl fmt::Display for ContactTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Resolves a client id to a Discord account
pub struct ContactResolver {
    platform: Arc<dyn BillingPlatform>,
}

impl ContactResolver {
    pub fn new(platform: Arc<dyn BillingPlatform>) -> Self {
        Self { platform }
    }

    /// The stored Discord account for `user_id`, unless the event names one
    /// explicitly via `target_discord_id`.
    ///
    /// `preferred_field` breaks ties when the client has several matching
    /// fields; otherwise the lowest field id wins.
    pub async fn resolve(
        &self,
        user_id: &UserId,
        preferred_field: &str,
        event: &NotificationEvent,
    ) -> Option<ContactTarget> {
        let mut target = match self
            .platform
            .custom_field_values(user_id, DISCORD_FIELD_PATTERN)
            .await
        {
            Ok(values) => select_field(values, preferred_field)
                .and_then(|field| ContactTarget::from_stored(&field.value)),
            Err(e) => {
                tracing::warn!("Custom field lookup for client {} failed: {}", user_id, e);
                None
            }
        };

        if let Some(value) = event.attributes().first_value(TARGET_OVERRIDE_LABEL) {
            tracing::debug!("Event overrides Discord target for client {}", user_id);
            target = ContactTarget::parse(value);
        }

        target
    }
}

fn select_field(values: Vec<CustomFieldValue>, preferred_field: &str) -> Option<CustomFieldValue> {
    let mut candidates: Vec<CustomFieldValue> = values
        .into_iter()
        .filter(|v| {
            v.field_name
                .to_lowercase()
                .contains(DISCORD_FIELD_PATTERN)
        })
        .collect();
    candidates.sort_by_key(|v| v.field_id);

    if candidates.len() > 1 {
        tracing::debug!(
            "{} Discord custom fields found, preferring '{}'",
            candidates.len(),
            preferred_field
        );
    }

    match candidates
        .iter()
        .position(|v| v.field_name.eq_ignore_ascii_case(preferred_field))
    {
        Some(index) => Some(candidates.swap_remove(index)),
        None => candidates.into_iter().next(),
    }
}
