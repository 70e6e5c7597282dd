use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::error::{AppError, Result};

/// Outbound side of the chat host.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send(&self, channel: &str, text: &str) -> Result<()>;
}

/// Posts `{"channel", "text"}` to an incoming-webhook URL.
pub struct WebhookChatSink {
    client: Client,
    webhook_url: String,
}

#[derive(Debug, Serialize)]
struct WebhookMessage<'a> {
    channel: &'a str,
    text: &'a str,
}

impl WebhookChatSink {
    pub fn new(webhook_url: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, webhook_url })
    }
}

#[async_trait]
impl ChatSink for WebhookChatSink {
    async fn send(&self, channel: &str, text: &str) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook_url)
            .json(&WebhookMessage { channel, text })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Chat(format!(
                "chat webhook error ({}): {}",
                status, error_text
            )));
        }

        Ok(())
    }
}
