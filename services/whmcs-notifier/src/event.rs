//! Notification events as emitted by WHMCS
//!
//! An event is built once (by WHMCS, a hook, or a test) and only read
//! afterwards; there are no setters.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

static TRAILING_PRIORITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(high|medium|low)$").expect("valid regex"));

static LABELLED_PRIORITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)priority[:\s]+(high|medium|low)").expect("valid regex"));

/// Semantic style attached to an attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttributeStyle {
    Success,
    Danger,
    Warning,
    Info,
    #[default]
    None,
}

impl From<String> for AttributeStyle {
    fn from(value: String) -> Self {
        match value.to_lowercase().as_str() {
            "success" => AttributeStyle::Success,
            "danger" | "error" => AttributeStyle::Danger,
            "warning" => AttributeStyle::Warning,
            "info" => AttributeStyle::Info,
            _ => AttributeStyle::None,
        }
    }
}

impl From<AttributeStyle> for String {
    fn from(style: AttributeStyle) -> Self {
        match style {
            AttributeStyle::Success => "success",
            AttributeStyle::Danger => "danger",
            AttributeStyle::Warning => "warning",
            AttributeStyle::Info => "info",
            AttributeStyle::None => "",
        }
        .to_string()
    }
}

/// Ticket priority as recognised inside attribute values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriorityLevel {
    High,
    Medium,
    Low,
}

impl PriorityLevel {
    fn from_word(word: &str) -> Option<Self> {
        match word.to_lowercase().as_str() {
            "high" => Some(PriorityLevel::High),
            "medium" => Some(PriorityLevel::Medium),
            "low" => Some(PriorityLevel::Low),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriorityLevel::High => "High",
            PriorityLevel::Medium => "Medium",
            PriorityLevel::Low => "Low",
        }
    }
}

/// Classified attribute value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeValue<'a> {
    /// A priority indicator, either as text or as one of the WHMCS priority icons
    Priority(PriorityLevel),
    Text(&'a str),
}

/// A labelled annotation on an event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    label: String,
    #[serde(deserialize_with = "string_or_number")]
    value: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    style: AttributeStyle,
    #[serde(default)]
    icon: Option<String>,
}

impl Attribute {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            url: None,
            style: AttributeStyle::None,
            icon: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_style(mut self, style: AttributeStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }

    pub fn style(&self) -> AttributeStyle {
        self.style
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref().filter(|i| !i.is_empty())
    }

    /// Classify the raw value.
    ///
    /// Only values mentioning `priority` (the word, or a `*priority.gif` icon
    /// file) are considered priority indicators; anything else is text.
    pub fn classify(&self) -> AttributeValue<'_> {
        let lower = self.value.to_lowercase();
        if !lower.contains("priority") {
            return AttributeValue::Text(&self.value);
        }

        let captured = TRAILING_PRIORITY
            .captures(&self.value)
            .or_else(|| LABELLED_PRIORITY.captures(&self.value))
            .and_then(|c| c.get(1))
            .and_then(|m| PriorityLevel::from_word(m.as_str()));
        if let Some(level) = captured {
            return AttributeValue::Priority(level);
        }

        if lower.contains("highpriority.gif") {
            AttributeValue::Priority(PriorityLevel::High)
        } else if lower.contains("mediumpriority.gif") {
            AttributeValue::Priority(PriorityLevel::Medium)
        } else if lower.contains("lowpriority.gif") {
            AttributeValue::Priority(PriorityLevel::Low)
        } else {
            AttributeValue::Text(&self.value)
        }
    }
}

/// Ordered attribute list. Labels may repeat; lookups return the first match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeStore(Vec<Attribute>);

impl AttributeStore {
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// First attribute with exactly this label
    pub fn first(&self, label: &str) -> Option<&Attribute> {
        self.0.iter().find(|a| a.label == label)
    }

    /// Value of the first attribute with exactly this label
    pub fn first_value(&self, label: &str) -> Option<&str> {
        self.first(label).map(|a| a.value.as_str())
    }

    /// Attributes whose label matches ignoring case, in order
    pub fn matching_ignore_case<'a>(
        &'a self,
        label: &'a str,
    ) -> impl Iterator<Item = &'a Attribute> + 'a {
        self.0
            .iter()
            .filter(move |a| a.label.eq_ignore_ascii_case(label))
    }
}

impl From<Vec<Attribute>> for AttributeStore {
    fn from(attributes: Vec<Attribute>) -> Self {
        Self(attributes)
    }
}

impl<'a> IntoIterator for &'a AttributeStore {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// A notification raised by WHMCS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    title: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    attributes: AttributeStore,
}

impl NotificationEvent {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        url: impl Into<String>,
        attributes: impl Into<AttributeStore>,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            url: url.into(),
            attributes: attributes.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn attributes(&self) -> &AttributeStore {
        &self.attributes
    }
}

/// WHMCS sends ids as numbers or strings depending on where they came from
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}
