//! Events raised by the billing-platform hooks

use serde::Serialize;

use crate::event::{Attribute, AttributeStyle, NotificationEvent};
use crate::pipeline::{NotificationPipeline, PipelineOutcome};

/// A notification trigger as the hooks submit it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerRequest {
    pub notification_identifier: &'static str,
    pub status: &'static str,
    pub status_style: AttributeStyle,
    pub event: NotificationEvent,
}

impl TriggerRequest {
    /// Run the hook's event through `pipeline` and log how it ended
    pub async fn fire(&self, pipeline: &NotificationPipeline) -> PipelineOutcome {
        tracing::info!(
            "Triggering {} notification ({}, {:?}): {}",
            self.notification_identifier,
            self.status,
            self.status_style,
            self.event.title()
        );
        let outcome = pipeline.process(&self.event).await;
        match &outcome {
            PipelineOutcome::Delivered => {
                tracing::info!("{} notification delivered", self.notification_identifier)
            }
            other => tracing::warn!(
                "{} notification not delivered: {:?}",
                self.notification_identifier,
                other
            ),
        }
        outcome
    }
}

/// An invoice payment failed or was reversed
pub fn invoice_unpaid(host: &str, invoice_id: &str) -> TriggerRequest {
    TriggerRequest {
        notification_identifier: "invoice.unpaid.client",
        status: "Warning",
        status_style: AttributeStyle::Warning,
        event: NotificationEvent::new(
            "⚠️ Invoice Payment Issue",
            "Your invoice payment could not be processed or has been reversed. \
             Please review your invoice and update your payment method if needed.",
            format!("https://{}/clientarea.php?action=invoices", host),
            vec![Attribute::new("Invoice ID", invoice_id)],
        ),
    }
}

pub fn affiliate_activation(host: &str, affiliate_id: &str, user_id: &str) -> TriggerRequest {
    TriggerRequest {
        notification_identifier: "affiliate.activation.user",
        status: "Success",
        status_style: AttributeStyle::Success,
        event: NotificationEvent::new(
            "🎉 Welcome to Our Affiliate Program!",
            "Your affiliate account has been activated! \
             You can now start earning commissions by referring new customers.",
            format!("https://{}/affiliates.php", host),
            vec![
                Attribute::new("Affiliate ID", affiliate_id),
                Attribute::new("User ID", user_id),
            ],
        ),
    }
}

pub fn affiliate_withdrawal(
    host: &str,
    affiliate_id: &str,
    user_id: &str,
    client_id: &str,
    balance: f64,
) -> TriggerRequest {
    let amount = format_amount(balance);
    TriggerRequest {
        notification_identifier: "affiliate.withdrawal.confirmation",
        status: "Info",
        status_style: AttributeStyle::Info,
        event: NotificationEvent::new(
            "💰 Withdrawal Request Received",
            format!(
                "Your withdrawal request for {} has been received and is being processed. \
                 You will be notified once it's completed.",
                amount
            ),
            format!("https://{}/affiliates.php", host),
            vec![
                Attribute::new("Affiliate ID", affiliate_id),
                Attribute::new("User ID", user_id),
                Attribute::new("Client ID", client_id),
                Attribute::new("Withdrawal Amount", amount),
            ],
        ),
    }
}

/// `$` plus the amount with two decimals and thousands separators
pub fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}
