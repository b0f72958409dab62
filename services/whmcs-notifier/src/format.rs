//! Turns an event into either a plain-text message or a rich embed

use chrono::{DateTime, SecondsFormat, Utc};
use relay_wire::{EmbedData, EmbedField, EmbedFooter, DEFAULT_EMBED_COLOR};

use crate::config::{FormattingProfile, NotificationPreferences};
use crate::event::{Attribute, AttributeStyle, AttributeValue, NotificationEvent, PriorityLevel};
use crate::platform::UserRecord;

pub const COLOR_RED: u32 = 0xff0000;
pub const COLOR_ORANGE: u32 = 0xff9900;
pub const COLOR_GREEN: u32 = 0x00ff00;

/// Footer shown on every embed
pub const FOOTER_TEXT: &str = "WHMCS Notification System";

/// Title keyword to prefix. Every category currently maps to an empty
/// prefix, so titles are sent unchanged.
const TITLE_PREFIXES: &[(&str, &str)] = &[
    ("invoice", ""),
    ("ticket", ""),
    ("order", ""),
    ("payment", ""),
    ("domain", ""),
    ("service", ""),
    ("affiliate", ""),
];

const CANCELLATION_MARKERS: &[&str] = &["cancel"];

const PAYMENT_ISSUE_MARKERS: &[&str] = &[
    "could not be processed",
    "payment failed",
    "failed payment",
    "payment issue",
    "declined",
    "reversed",
];

/// A formatted notification, ready to hand to the relay
#[derive(Debug, Clone, PartialEq)]
pub enum FormattedPayload {
    PlainText { body: String },
    RichEmbed(RichEmbed),
}

#[derive(Debug, Clone, PartialEq)]
pub struct RichEmbed {
    pub title: String,
    pub description: String,
    pub url: String,
    /// ISO 8601, with offset
    pub timestamp: String,
    pub footer_text: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
}

impl From<RichEmbed> for EmbedData {
    fn from(embed: RichEmbed) -> Self {
        Self {
            title: Some(embed.title),
            description: Some(embed.description),
            url: Some(embed.url).filter(|u| !u.is_empty()),
            color: Some(embed.color),
            timestamp: Some(embed.timestamp),
            footer: Some(EmbedFooter {
                text: embed.footer_text,
                icon_url: None,
            }),
            fields: embed.fields,
            components: Vec::new(),
        }
    }
}

/// Builds payloads according to the notification preferences
#[derive(Debug, Clone)]
pub struct NotificationFormatter {
    preferences: NotificationPreferences,
}

impl NotificationFormatter {
    pub fn new(preferences: NotificationPreferences) -> Self {
        Self { preferences }
    }

    pub fn preferences(&self) -> &NotificationPreferences {
        &self.preferences
    }

    pub fn format(&self, event: &NotificationEvent, user: &UserRecord) -> FormattedPayload {
        self.format_at(event, user, Utc::now())
    }

    /// Format with an explicit send time
    pub fn format_at(
        &self,
        event: &NotificationEvent,
        user: &UserRecord,
        now: DateTime<Utc>,
    ) -> FormattedPayload {
        if self.preferences.use_rich_embeds {
            FormattedPayload::RichEmbed(self.rich_embed(event, user, now))
        } else {
            FormattedPayload::PlainText {
                body: self.plain_text(event),
            }
        }
    }

    fn plain_text(&self, event: &NotificationEvent) -> String {
        let mut body = self
            .preferences
            .message_format
            .replace("{title}", event.title())
            .replace("{message}", event.message())
            .replace("{url}", event.url());

        if self.preferences.include_attributes {
            body.push_str("\n\n");
            for attribute in event.attributes() {
                body.push_str(&format!("**{}**: {}\n", attribute.label(), attribute.value()));
            }
        }
        body
    }

    fn rich_embed(&self, event: &NotificationEvent, user: &UserRecord, now: DateTime<Utc>) -> RichEmbed {
        let color = if self.preferences.priority_color_coding {
            priority_color(event)
        } else {
            DEFAULT_EMBED_COLOR
        };

        let mut fields = Vec::new();
        if self.preferences.include_attributes {
            let is_new_ticket = event.title().to_lowercase().contains("new support ticket");
            for attribute in event.attributes() {
                if is_new_ticket && attribute.label() == "Priority" {
                    continue;
                }
                fields.push(EmbedField {
                    name: attribute.label().to_string(),
                    value: format_attribute_value(attribute, self.preferences.profile),
                    inline: true,
                });
            }
        }
        if self.preferences.include_client_info {
            fields.extend(client_info_fields(user, self.preferences.profile));
        }

        RichEmbed {
            title: format!("{}{}", title_prefix(event.title()), event.title()),
            description: event.message().to_string(),
            url: event.url().to_string(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, false),
            footer_text: FOOTER_TEXT.to_string(),
            color,
            fields,
        }
    }
}

fn title_prefix(title: &str) -> &'static str {
    let lower = title.to_lowercase();
    TITLE_PREFIXES
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, prefix)| *prefix)
        .unwrap_or("")
}

/// Accent color for an event, first matching rule wins
pub fn priority_color(event: &NotificationEvent) -> u32 {
    let title = event.title().to_lowercase();
    let message = event.message().to_lowercase();

    if title.contains("invoice") {
        let cancelled = CANCELLATION_MARKERS
            .iter()
            .any(|m| title.contains(m) || message.contains(m));
        let payment_issue = PAYMENT_ISSUE_MARKERS.iter().any(|m| message.contains(m));
        if cancelled || payment_issue {
            return COLOR_RED;
        }
    }

    for attribute in event.attributes().matching_ignore_case("priority") {
        match attribute.value().trim().to_lowercase().as_str() {
            "high" | "urgent" => return COLOR_RED,
            "medium" => return COLOR_ORANGE,
            "low" => return COLOR_GREEN,
            _ => {}
        }
    }

    for attribute in event.attributes().matching_ignore_case("status") {
        let value = attribute.value().to_lowercase();
        if value.contains("warning") || value.contains("error") {
            return COLOR_RED;
        }
    }

    if title.contains("urgent") || title.contains("high") {
        COLOR_RED
    } else if title.contains("medium") {
        COLOR_ORANGE
    } else if title.contains("low") {
        COLOR_GREEN
    } else {
        DEFAULT_EMBED_COLOR
    }
}

/// Render one attribute value for an embed field
pub fn format_attribute_value(attribute: &Attribute, profile: FormattingProfile) -> String {
    let text = match attribute.classify() {
        AttributeValue::Priority(level) => return priority_label(level, profile),
        AttributeValue::Text(text) => text,
    };

    let mut formatted = text.to_string();
    if profile == FormattingProfile::Decorated {
        if let Some(icon) = attribute.icon() {
            formatted = format!("{} {}", icon, formatted);
        }
        if let Some(emoji) = style_emoji(attribute.style()) {
            formatted = format!("{} {}", emoji, formatted);
        }
    }

    match attribute.url() {
        Some(url) => format!("[{}]({})", formatted, url),
        None => formatted,
    }
}

fn priority_label(level: PriorityLevel, profile: FormattingProfile) -> String {
    match profile {
        FormattingProfile::Plain => level.label().to_string(),
        FormattingProfile::Decorated => {
            let dot = match level {
                PriorityLevel::High => "🔴",
                PriorityLevel::Medium => "🟠",
                PriorityLevel::Low => "🟢",
            };
            format!("{} {}", dot, level.label())
        }
    }
}

fn style_emoji(style: AttributeStyle) -> Option<&'static str> {
    match style {
        AttributeStyle::Success => Some("✅"),
        AttributeStyle::Danger => Some("❌"),
        AttributeStyle::Warning => Some("⚠️"),
        AttributeStyle::Info => Some("ℹ️"),
        AttributeStyle::None => None,
    }
}

fn client_info_fields(user: &UserRecord, profile: FormattingProfile) -> Vec<EmbedField> {
    let present = |value: &Option<String>| value.as_deref().filter(|v| !v.is_empty()).map(str::to_string);
    let label = |plain: &str, icon: &str| match profile {
        FormattingProfile::Plain => plain.to_string(),
        FormattingProfile::Decorated => format!("{} {}", icon, plain),
    };

    let mut fields = Vec::new();
    if let (Some(first), Some(last)) = (present(&user.first_name), present(&user.last_name)) {
        fields.push(EmbedField {
            name: label("Client", "👤"),
            value: format!("{} {}", first, last),
            inline: true,
        });
    }
    if let Some(email) = present(&user.email) {
        fields.push(EmbedField {
            name: label("Email", "📧"),
            value: email,
            inline: true,
        });
    }
    if let Some(company) = present(&user.company_name) {
        fields.push(EmbedField {
            name: label("Company", "🏢"),
            value: company,
            inline: true,
        });
    }
    fields
}
