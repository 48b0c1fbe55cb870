//! Outbound SMS
//!
//! [`SignalWireSms`] talks to the SignalWire compatibility (LaML) REST API.
//! Without credentials the server falls back to [`LogOnlySms`].

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::config::SignalWireConfig;
use crate::utils::phone::mask_phone;
use crate::utils::{AppError, AppResult, ErrorCode};

#[async_trait]
pub trait SmsSender: Send + Sync {
    /// Send one text message to an E.164 number
    async fn send(&self, to: &str, body: &str) -> AppResult<()>;

    fn name(&self) -> &'static str;
}

/// SignalWire compatibility API sender
pub struct SignalWireSms {
    client: reqwest::Client,
    space: String,
    project_id: String,
    token: String,
    from_number: String,
}

impl SignalWireSms {
    /// `None` when the config lacks credentials
    pub fn from_config(config: &SignalWireConfig) -> Option<Self> {
        Some(Self {
            client: reqwest::Client::new(),
            space: config.space.clone()?,
            project_id: config.project_id.clone()?,
            token: config.token.clone()?,
            from_number: config.from_number.clone(),
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "https://{}/api/laml/2010-04-01/Accounts/{}/Messages.json",
            self.space, self.project_id
        )
    }
}

#[async_trait]
impl SmsSender for SignalWireSms {
    async fn send(&self, to: &str, body: &str) -> AppResult<()> {
        let resp = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.project_id, Some(&self.token))
            .form(&[("From", self.from_number.as_str()), ("To", to), ("Body", body)])
            .send()
            .await
            .map_err(|e| {
                AppError::with_message(ErrorCode::NetworkError, format!("SMS request failed: {e}"))
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::with_message(
                ErrorCode::NotificationFailed,
                format!("SMS rejected: {status} - {text}"),
            ));
        }

        tracing::info!(to = %mask_phone(to), "SMS sent");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "signalwire"
    }
}

/// Development sender: logs instead of sending
#[derive(Debug, Default)]
pub struct LogOnlySms;

#[async_trait]
impl SmsSender for LogOnlySms {
    async fn send(&self, to: &str, body: &str) -> AppResult<()> {
        tracing::info!(to = %mask_phone(to), chars = body.len(), "SMS (log only): {body}");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log-only"
    }
}

/// Pick the sender for a config
pub fn sender_from_config(config: &SignalWireConfig) -> Arc<dyn SmsSender> {
    match SignalWireSms::from_config(config) {
        Some(sender) => Arc::new(sender),
        None => {
            tracing::warn!("SignalWire credentials missing, SMS will only be logged");
            Arc::new(LogOnlySms)
        }
    }
}

/// Keeps every message in memory; optionally fails every send
#[derive(Debug, Default)]
pub struct RecordingSms {
    sent: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl RecordingSms {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sender whose every send fails
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// `(to, body)` pairs in send order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send(&self, to: &str, body: &str) -> AppResult<()> {
        if self.fail {
            return Err(AppError::new(ErrorCode::NotificationFailed));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push((to.to_string(), body.to_string()));
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signalwire_requires_credentials() {
        let mut config = SignalWireConfig {
            from_number: "+15550000000".into(),
            ..Default::default()
        };
        assert!(SignalWireSms::from_config(&config).is_none());

        config.space = Some("demo.signalwire.com".into());
        config.project_id = Some("proj".into());
        config.token = Some("tok".into());
        let sms = SignalWireSms::from_config(&config).unwrap();
        assert_eq!(
            sms.messages_url(),
            "https://demo.signalwire.com/api/laml/2010-04-01/Accounts/proj/Messages.json"
        );
    }

    #[tokio::test]
    async fn test_recording_sender() {
        let sms = RecordingSms::new();
        sms.send("+15551234567", "hello").await.unwrap();
        assert_eq!(sms.sent(), vec![("+15551234567".into(), "hello".into())]);

        let failing = RecordingSms::failing();
        assert!(failing.send("+15551234567", "hello").await.is_err());
        assert!(failing.sent().is_empty());
    }
}
