// =============================================================================
// Telegram Notifier — advisory message delivery
// =============================================================================
//
// Sends the composed reports to a Telegram chat via the Bot API.  Credentials
// are injected at construction (loaded once per process in main); when they
// are absent the notifier logs each message and drops it, so the pipeline
// behaves identically in un-configured deployments.  Delivery failures are
// logged and swallowed: the signal pipeline never blocks on, or fails
// because of, notification delivery.
// =============================================================================

use anyhow::{Context, Result};
use tracing::{info, warn};

/// Telegram Bot API client bound to a single chat.
pub struct TelegramNotifier {
    client: reqwest::Client,
    credentials: Option<Credentials>,
}

struct Credentials {
    bot_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    /// Create a notifier.  Either credential being `None` (or empty) yields
    /// a disabled notifier that logs instead of sending.
    pub fn new(bot_token: Option<String>, chat_id: Option<String>) -> Self {
        let credentials = match (bot_token, chat_id) {
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => {
                Some(Credentials {
                    bot_token: token,
                    chat_id: chat,
                })
            }
            _ => {
                warn!("Telegram credentials not configured — notifications will be logged only");
                None
            }
        };

        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(5))
                .build()
                .expect("failed to build reqwest client for TelegramNotifier"),
            credentials,
        }
    }

    /// Whether real delivery is configured.
    pub fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    /// Deliver `text` to the configured chat.  Failures are logged, never
    /// propagated — the caller does not require delivery acknowledgement.
    pub async fn send(&self, text: &str) {
        match self.try_send(text).await {
            Ok(true) => {}
            Ok(false) => info!(length = text.len(), "notification dropped (Telegram not configured)"),
            Err(e) => warn!(error = %e, "failed to deliver Telegram notification"),
        }
    }

    /// Returns `Ok(true)` when the message was accepted by the Bot API and
    /// `Ok(false)` when the notifier is unconfigured.
    async fn try_send(&self, text: &str) -> Result<bool> {
        let Some(creds) = &self.credentials else {
            return Ok(false);
        };

        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            creds.bot_token
        );
        let payload = serde_json::json!({
            "chat_id": creds.chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        let resp = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .context("POST Telegram sendMessage")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Telegram API returned {status}: {body}");
        }

        Ok(true)
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_credentials_disable_delivery() {
        let notifier = TelegramNotifier::new(None, None);
        assert!(!notifier.is_configured());

        let notifier = TelegramNotifier::new(Some("token".to_string()), None);
        assert!(!notifier.is_configured());

        let notifier = TelegramNotifier::new(Some(String::new()), Some("42".to_string()));
        assert!(!notifier.is_configured());
    }

    #[test]
    fn full_credentials_enable_delivery() {
        let notifier =
            TelegramNotifier::new(Some("token".to_string()), Some("42".to_string()));
        assert!(notifier.is_configured());
    }

    #[tokio::test]
    async fn unconfigured_send_is_a_no_op() {
        let notifier = TelegramNotifier::new(None, None);
        // Must not panic or attempt network I/O.
        notifier.send("test message").await;
    }
}
