use async_trait::async_trait;
use chrono::Duration;
use reqwest::Client;
use serde_json::json;

use crate::config::MailConfig;
use crate::errors::{AppError, Result};

/// Sends a reset code to the account's registered address.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send_code(&self, identifier: &str, code: &str, ttl: Duration) -> Result<()>;
}

fn reset_message(code: &str, ttl: Duration) -> String {
    format!(
        "Your password reset code is: {}. It is valid for {} minutes. \
         If you did not request a reset, you can ignore this email.",
        code,
        ttl.num_minutes()
    )
}

/// Posts to a transactional mail HTTP API.
#[derive(Clone)]
pub struct HttpMailer {
    api_url: String,
    api_key: String,
    from: String,
    client: Client,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: String, from: String) -> Self {
        Self {
            api_url,
            api_key,
            from,
            client: Client::new(),
        }
    }
}

#[async_trait]
impl DeliveryChannel for HttpMailer {
    async fn send_code(&self, identifier: &str, code: &str, ttl: Duration) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .header("Accept", "application/json")
            .json(&json!({
                "from": self.from,
                "to": identifier,
                "subject": "Your password reset code",
                "text": reset_message(code, ttl),
            }))
            .send()
            .await
            .map_err(|e| AppError::delivery(format!("mail API error: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AppError::delivery(format!(
                "mail sending failed with status: {}",
                response.status()
            )))
        }
    }
}

/// Writes the code to the log instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogOnlyChannel;

#[async_trait]
impl DeliveryChannel for LogOnlyChannel {
    async fn send_code(&self, identifier: &str, code: &str, ttl: Duration) -> Result<()> {
        tracing::info!(
            "📧 [log-only mail] to={} code={} valid_for={}m",
            identifier,
            code,
            ttl.num_minutes()
        );
        Ok(())
    }
}

pub fn channel_from_config(config: &MailConfig) -> std::sync::Arc<dyn DeliveryChannel> {
    match &config.api_url {
        Some(url) => std::sync::Arc::new(HttpMailer::new(
            url.clone(),
            config.api_key.clone(),
            config.from.clone(),
        )),
        None => {
            tracing::warn!("MAIL_API_URL not set; reset codes will only be logged");
            std::sync::Arc::new(LogOnlyChannel)
        }
    }
}
