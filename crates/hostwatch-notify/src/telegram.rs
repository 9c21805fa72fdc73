use crate::error::NotifyError;
use crate::utils::{truncate_chars, MAX_BODY_LENGTH};
use crate::Notifier;
use anyhow::Result;
use async_trait::async_trait;
use hostwatch_common::types::Recipient;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Telegram caps message text at 4096 characters.
const MAX_MESSAGE_CHARS: usize = 4096;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Sends messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, bot_token: &str) -> crate::error::Result<Self> {
        let token = bot_token.trim();
        if token.is_empty() {
            return Err(NotifyError::InvalidConfig("empty bot token".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/bot{}/sendMessage", api_base.trim_end_matches('/'), token),
        })
    }

    async fn post(&self, recipient: &Recipient, text: &str) -> crate::error::Result<()> {
        let payload = serde_json::json!({
            "chat_id": recipient.as_str(),
            "text": truncate_chars(text, MAX_MESSAGE_CHARS - 1, "…"),
        });

        // without_url: the endpoint embeds the bot token
        let resp = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::HttpError(e.without_url()))?;

        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();

        let accepted = status.is_success()
            && serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("ok").and_then(Value::as_bool))
                .unwrap_or(true);

        if accepted {
            Ok(())
        } else {
            Err(NotifyError::ApiError {
                service: "telegram".to_string(),
                status: status.as_u16(),
                body: truncate_chars(&body, MAX_BODY_LENGTH, "... [truncated]"),
            })
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, recipient: &Recipient, text: &str) -> Result<()> {
        self.post(recipient, text).await?;
        tracing::debug!(recipient = %recipient, "Telegram message delivered");
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}
