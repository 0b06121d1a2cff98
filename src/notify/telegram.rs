//! Telegram Bot API `sendMessage`.
//!
//! Sends a form body `{chat_id, text, parse_mode, disable_web_page_preview}`.
//! Any 2xx is success. The bot token is part of the URL, so URLs are never
//! logged and transport errors are stripped of theirs.

use std::time::Duration;

use serde::Deserialize;

use super::{Ack, Notifier};
use crate::config::{Credentials, DeliveryConfig};
use crate::error::DeliveryError;

pub struct TelegramNotifier {
    client: reqwest::Client,
    url: String,
    chat_id: String,
    parse_mode: String,
    disable_link_preview: bool,
    timeout_secs: u64,
}

#[derive(Deserialize)]
struct ApiReply {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<SentMessage>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: i64,
}

impl TelegramNotifier {
    pub fn new(config: &DeliveryConfig, credentials: &Credentials) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DeliveryError::Http(e.without_url()))?;

        Ok(Self {
            client,
            url: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                credentials.token
            ),
            chat_id: credentials.chat_id.clone(),
            parse_mode: config.parse_mode.clone(),
            disable_link_preview: config.disable_link_preview,
            timeout_secs: config.timeout_secs,
        })
    }

    fn transport_error(&self, e: reqwest::Error) -> DeliveryError {
        if e.is_timeout() {
            DeliveryError::Timeout(self.timeout_secs)
        } else {
            DeliveryError::Http(e.without_url())
        }
    }
}

impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) -> Result<Ack, DeliveryError> {
        let mut form = vec![
            ("chat_id", self.chat_id.as_str()),
            ("text", message),
            (
                "disable_web_page_preview",
                if self.disable_link_preview { "true" } else { "false" },
            ),
        ];
        if !self.parse_mode.is_empty() {
            form.push(("parse_mode", self.parse_mode.as_str()));
        }

        let response = self
            .client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        // The status decides the outcome; the body only adds detail.
        let status = response.status();
        let body = response.text().await.unwrap_or_else(|e| {
            tracing::debug!(error = %e.without_url(), "could not read Telegram reply body");
            String::new()
        });
        let reply: Option<ApiReply> = serde_json::from_str(&body).ok();

        if !status.is_success() {
            let description = reply
                .and_then(|r| r.description)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_string());
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                description,
            });
        }

        let message_id = reply.and_then(|r| r.result).map(|m| m.message_id);
        tracing::info!(status = status.as_u16(), ?message_id, "message delivered");
        Ok(Ack {
            status: status.as_u16(),
            message_id,
        })
    }
}
