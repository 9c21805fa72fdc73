//! Alert delivery.
//!
//! A [`Notifier`] delivers one text message to one [`Recipient`]. The
//! [`dispatcher::AlertDispatcher`] renders a tick's alerts into a single
//! message and fans it out to every recipient, isolating per-recipient
//! failures. [`telegram::TelegramNotifier`] is the shipped transport.

pub mod dispatcher;
pub mod error;
pub mod message;
pub mod telegram;
pub mod utils;

#[cfg(test)]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use hostwatch_common::types::Recipient;

/// Delivers text to an alert recipient (chat, user, channel).
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Sends `text` to `recipient`. No retries: an error means this message
    /// is lost for that recipient.
    async fn send(&self, recipient: &Recipient, text: &str) -> Result<()>;

    /// Transport name for logs (e.g. `"telegram"`).
    fn name(&self) -> &str;
}
