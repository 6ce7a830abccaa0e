//! Telegram sink — wraps the Bot API's `sendMessage` and `sendMediaGroup`.
//!
//! Every call is followed by a fixed pacing delay regardless of outcome, to
//! stay under the channel throughput limit. Responses are classified into
//! the [`SendError`] taxonomy that drives the retry policy.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use crate::delivery::sink::{MediaItem, MediaKind, MessageSink};
use crate::error::SendError;

/// Fallback when a 429 response carries no usable `retry_after`.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Telegram Bot API sink.
pub struct TelegramSink {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
    pace_delay: Duration,
    timeout: Duration,
}

impl TelegramSink {
    pub fn new(bot_token: String, chat_id: String, pace_delay: Duration, timeout: Duration) -> Self {
        Self {
            bot_token,
            chat_id,
            client: reqwest::Client::new(),
            pace_delay,
            timeout,
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    async fn check_response(resp: reqwest::Response) -> Result<(), SendError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(classify_status(status.as_u16(), &body))
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn send_text(&self, text: &str) -> Result<(), SendError> {
        let body = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });

        let result = self
            .client
            .post(self.api_url("sendMessage"))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await;

        let outcome = match result {
            Ok(resp) => Self::check_response(resp).await,
            Err(e) => Err(classify_transport(&e)),
        };

        // Pacing applies regardless of outcome.
        tokio::time::sleep(self.pace_delay).await;
        outcome
    }

    async fn send_media_batch(
        &self,
        items: &[MediaItem],
        caption: Option<&str>,
    ) -> Result<(), SendError> {
        let mut form = Form::new().text("chat_id", self.chat_id.clone());
        let mut descriptors = Vec::with_capacity(items.len());

        for (i, item) in items.iter().enumerate() {
            let attach_name = format!("file{i}");
            let mut desc = serde_json::json!({
                "type": match item.kind {
                    MediaKind::Photo => "photo",
                    MediaKind::Video => "video",
                },
                "media": format!("attach://{attach_name}"),
            });
            if i == 0 {
                if let Some(cap) = caption {
                    desc["caption"] = serde_json::Value::String(cap.to_string());
                }
            }
            descriptors.push(desc);

            form = form.part(
                attach_name,
                Part::bytes(item.bytes.clone()).file_name(item.file_name.clone()),
            );
        }

        form = form.text(
            "media",
            serde_json::Value::Array(descriptors).to_string(),
        );

        debug!(items = items.len(), "Sending media group");

        let result = self
            .client
            .post(self.api_url("sendMediaGroup"))
            .timeout(self.timeout)
            .multipart(form)
            .send()
            .await;

        let outcome = match result {
            Ok(resp) => Self::check_response(resp).await,
            Err(e) => Err(classify_transport(&e)),
        };

        tokio::time::sleep(self.pace_delay).await;
        outcome
    }
}

/// Classify transport-level failures. Timeouts, DNS, and connection resets
/// are all retryable.
fn classify_transport(e: &reqwest::Error) -> SendError {
    SendError::TransientTimeout(e.to_string())
}

/// Classify a non-success HTTP response.
fn classify_status(status: u16, body: &str) -> SendError {
    if status == 429 {
        let retry_after = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .as_ref()
            .and_then(|v| v.get("parameters"))
            .and_then(|p| p.get("retry_after"))
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
        SendError::Throttled {
            retry_after: Duration::from_secs(retry_after),
        }
    } else if status >= 500 {
        SendError::TransientTimeout(format!("HTTP {status}"))
    } else {
        let reason: String = body.chars().take(200).collect();
        SendError::PermanentRejected {
            reason: format!("HTTP {status}: {reason}"),
        }
    }
}
