use crate::message::render_alert_message;
use crate::Notifier;
use hostwatch_common::types::{AlertEvent, Recipient};
use std::sync::Arc;

/// Outcome of one dispatch, for logging and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Fans a batch of alerts out to the fixed recipient set.
pub struct AlertDispatcher {
    notifier: Arc<dyn Notifier>,
    recipients: Vec<Recipient>,
    host: Option<String>,
}

impl AlertDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, recipients: Vec<Recipient>) -> Self {
        Self {
            notifier,
            recipients,
            host: None,
        }
    }

    /// Names the monitored host in the message header.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Sends all `events` as one message to every recipient.
    ///
    /// An empty batch sends nothing. Each recipient is attempted exactly
    /// once; a failure is logged and does not stop delivery to the rest.
    pub async fn dispatch(&self, events: &[AlertEvent]) -> DispatchReport {
        let mut report = DispatchReport::default();
        if events.is_empty() {
            return report;
        }

        let text = render_alert_message(events, self.host.as_deref());

        for recipient in &self.recipients {
            match self.notifier.send(recipient, &text).await {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::error!(
                        notifier = self.notifier.name(),
                        recipient = %recipient,
                        error = %e,
                        "Failed to send alert notification"
                    );
                }
            }
        }

        tracing::info!(
            events = events.len(),
            delivered = report.delivered,
            failed = report.failed,
            "Alert batch dispatched"
        );

        report
    }
}
