//! Outbound SMS via the Twilio REST API

use crate::config::{Config, Secrets};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Something that can deliver one text message to one number
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<()>;
}

/// Error document returned by Twilio on a rejected request
#[derive(Debug, Deserialize)]
struct ProviderError {
    code: Option<i64>,
    message: Option<String>,
}

/// Twilio Messages API client. Credentials are fixed at construction.
pub struct TwilioClient {
    http: reqwest::Client,
    api_base: String,
    secrets: Secrets,
}

impl TwilioClient {
    pub fn new(config: &Config, secrets: Secrets) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            secrets,
        })
    }

    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.secrets.account_sid
        )
    }
}

#[async_trait]
impl SmsSender for TwilioClient {
    async fn send(&self, to: &str, body: &str) -> Result<()> {
        let form = [
            ("To", to),
            ("From", self.secrets.phone_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .http
            .post(self.messages_url())
            .basic_auth(&self.secrets.account_sid, Some(&self.secrets.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            debug!(to = %to, status = status.as_u16(), "Provider accepted message");
            return Ok(());
        }

        let text = response.text().await.unwrap_or_default();
        Err(provider_error(status.as_u16(), &text))
    }
}

/// Map a non-2xx provider response to an error, keeping the provider's
/// code and message when the body is its JSON error document.
pub fn provider_error(status: u16, body: &str) -> Error {
    match serde_json::from_str::<ProviderError>(body) {
        Ok(parsed) => Error::Provider {
            status,
            code: parsed.code,
            message: parsed.message.unwrap_or_else(|| body.trim().to_string()),
        },
        Err(_) => Error::Provider {
            status,
            code: None,
            message: body.trim().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secrets() -> Secrets {
        Secrets {
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            phone_number: "+15005550006".to_string(),
        }
    }

    #[test]
    fn test_messages_url() {
        let mut config = Config::for_test(&std::env::temp_dir());
        config.api_base = "https://api.twilio.com/".to_string();
        let client = TwilioClient::new(&config, secrets()).unwrap();
        assert_eq!(
            client.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn test_provider_error_json() {
        let body = r#"{"code": 21211, "message": "The 'To' number is not a valid phone number.", "status": 400}"#;
        match provider_error(400, body) {
            Error::Provider { status, code, message } => {
                assert_eq!(status, 400);
                assert_eq!(code, Some(21211));
                assert!(message.contains("not a valid phone number"));
            }
            other => panic!("Expected Provider error, got {:?}", other),
        }
    }

    #[test]
    fn test_provider_error_plain_text() {
        match provider_error(503, "Service Unavailable\n") {
            Error::Provider { code, message, .. } => {
                assert_eq!(code, None);
                assert_eq!(message, "Service Unavailable");
            }
            other => panic!("Expected Provider error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_unreachable_provider_errors() {
        // Port 9 (discard) on loopback is not expected to speak HTTP
        let config = Config::for_test(&std::env::temp_dir());
        let client = TwilioClient::new(&config, secrets()).unwrap();
        assert!(client.send("+16175551234", "HELLO").await.is_err());
    }
}
