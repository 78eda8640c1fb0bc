//! Outbound notifications.
//!
//! Fire-and-forget from the engine's perspective: a failed send is
//! logged and never rolls back state that was already committed.
//! Telegram carries the operator alerts; `LogNotifier` takes over when
//! no token is configured.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::TelegramSettings;
use crate::site::CALL_TIMEOUT;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("telegram API rejected the message: {0}")]
    Rejected(String),
}

/// Outbound human-readable notification channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotifyError>;
}

// ---------------------------------------------------------------------------
// Telegram
// ---------------------------------------------------------------------------

pub struct TelegramNotifier {
    client: reqwest::Client,
    settings: TelegramSettings,
}

impl TelegramNotifier {
    pub fn new(settings: TelegramSettings) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(CALL_TIMEOUT).build()?;
        Ok(Self { client, settings })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.settings.bot_token.expose_secret()
        );
        let body = serde_json::json!({
            "chat_id": self.settings.chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected(format!("{status}: {detail}")));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Log fallback
// ---------------------------------------------------------------------------

/// Used when no Telegram token is configured: notifications land in
/// the structured log instead of vanishing.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        info!(notification = text, "Notification (no channel configured)");
        Ok(())
    }
}

/// Best-effort send used at the orchestrator boundary: errors are
/// logged, never propagated.
pub async fn send_swallowing(notifier: &dyn Notifier, text: &str) {
    if let Err(e) = notifier.send(text).await {
        warn!(error = %e, "Notification failed (ignored)");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        assert!(LogNotifier.send("hello").await.is_ok());
    }

    #[tokio::test]
    async fn test_send_swallowing_absorbs_errors() {
        let mut mock = MockNotifier::new();
        mock.expect_send()
            .returning(|_| Err(NotifyError::Transport("down".to_string())));
        // Must not panic or propagate
        send_swallowing(&mock, "anyone there?").await;
    }

    #[tokio::test]
    async fn test_send_swallowing_delivers() {
        let mut mock = MockNotifier::new();
        mock.expect_send().times(1).returning(|_| Ok(()));
        send_swallowing(&mock, "ping").await;
    }
}
