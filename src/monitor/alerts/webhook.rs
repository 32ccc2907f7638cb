// Chat Webhook Alert Channel - Slack-compatible incoming webhook

use crate::Result;
use crate::error::MonitorError;
use crate::monitor::alerts::AlertChannel;
use crate::monitor::config::WebhookConfig;
use crate::monitor::types::{Finding, Severity};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Chat webhook alert channel
pub struct WebhookChannel {
    config: WebhookConfig,
    client: reqwest::Client,
}

impl WebhookChannel {
    /// Create new webhook channel
    pub fn new(config: WebhookConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { config, client })
    }

    /// Format finding as a chat message with one colored attachment
    fn format_message(&self, finding: &Finding) -> serde_json::Value {
        let color = match finding.severity {
            Severity::Critical => "#dc3545",
            Severity::High => "#fd7e14",
            Severity::Medium => "#ffc107",
            Severity::Low => "#0dcaf0",
            Severity::Info => "#6c757d",
        };

        let emoji = match finding.severity {
            Severity::Critical => ":rotating_light:",
            Severity::High => ":warning:",
            Severity::Medium => ":large_orange_diamond:",
            Severity::Low => ":information_source:",
            Severity::Info => ":white_check_mark:",
        };

        json!({
            "username": "Vault Sentinel",
            "icon_emoji": emoji,
            "text": format!("{} [{}] {}", emoji, finding.severity, finding.title),
            "attachments": [
                {
                    "color": color,
                    "title": finding.title,
                    "text": finding.message,
                    "fields": [
                        { "title": "Severity", "value": finding.severity.to_string(), "short": true },
                        { "title": "Check", "value": finding.check_name, "short": true },
                        { "title": "Host", "value": finding.source_host, "short": true },
                        {
                            "title": "Time",
                            "value": finding.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                            "short": true
                        }
                    ],
                    "footer": "Vault Sentinel",
                    "ts": finding.timestamp.timestamp()
                }
            ]
        })
    }

    async fn post(&self, payload: &serde_json::Value) -> Result<()> {
        let mut request = self.client.post(&self.config.url).json(payload);

        for (key, value) in &self.config.headers {
            request = request.header(key, value);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MonitorError::delivery(
                self.channel_name(),
                format!("webhook returned status {}: {}", status, body),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl AlertChannel for WebhookChannel {
    async fn send_alert(&self, finding: &Finding) -> Result<()> {
        self.post(&self.format_message(finding)).await
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }

    async fn test_connection(&self) -> Result<()> {
        self.post(&json!({
            "text": "Test message from Vault Sentinel - connection successful!"
        }))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn create_test_config() -> WebhookConfig {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), "Bearer token123".to_string());

        WebhookConfig {
            url: "https://hooks.example.com/services/T000/B000".to_string(),
            headers,
        }
    }

    #[test]
    fn test_format_message() {
        let channel = WebhookChannel::new(create_test_config(), Duration::from_secs(5)).unwrap();
        let finding = Finding {
            check_name: "authentication".to_string(),
            severity: Severity::High,
            title: "High authentication failure rate".to_string(),
            message: "11 failed logins in the last 60s (threshold 10)".to_string(),
            timestamp: Utc::now(),
            source_host: "monitor-1".to_string(),
        };

        let message = channel.format_message(&finding);

        assert_eq!(channel.channel_name(), "webhook");
        assert_eq!(message["attachments"][0]["color"], "#fd7e14");
        assert_eq!(
            message["attachments"][0]["title"],
            "High authentication failure rate"
        );
        assert_eq!(message["attachments"][0]["fields"][1]["value"], "authentication");
        assert!(message["text"].as_str().unwrap().contains("[HIGH]"));
    }
}
