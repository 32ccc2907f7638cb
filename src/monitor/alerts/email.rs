// Email Alert Channel - Using lettre

use crate::Result;
use crate::monitor::alerts::AlertChannel;
use crate::monitor::config::EmailConfig;
use crate::monitor::types::{Finding, Severity};
use async_trait::async_trait;
use handlebars::html_escape;
use lettre::message::{MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::time::Duration;

/// Email alert channel
pub struct EmailChannel {
    config: EmailConfig,
    timeout: Duration,
}

impl EmailChannel {
    /// Create new email channel
    pub fn new(config: EmailConfig, timeout: Duration) -> Result<Self> {
        // Reject unparsable addresses at startup rather than on first alert
        config.from_address.parse::<lettre::message::Mailbox>()?;
        for to_addr in &config.to_addresses {
            to_addr.parse::<lettre::message::Mailbox>()?;
        }

        Ok(Self { config, timeout })
    }

    fn subject(finding: &Finding) -> String {
        format!(
            "[Vault Sentinel] {} - {} ({})",
            finding.severity, finding.title, finding.source_host
        )
    }

    /// Build email message from a finding
    fn build_message(&self, finding: &Finding) -> Result<Message> {
        let mut message_builder = Message::builder()
            .from(self.config.from_address.parse()?)
            .subject(Self::subject(finding));

        for to_addr in &self.config.to_addresses {
            message_builder = message_builder.to(to_addr.parse()?);
        }

        let message = message_builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_PLAIN)
                        .body(self.format_text_body(finding)),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(header::ContentType::TEXT_HTML)
                        .body(self.format_html_body(finding)),
                ),
        )?;

        Ok(message)
    }

    /// Format finding as HTML
    fn format_html_body(&self, finding: &Finding) -> String {
        let severity_color = match finding.severity {
            Severity::Critical => "#dc3545",
            Severity::High => "#fd7e14",
            Severity::Medium => "#ffc107",
            Severity::Low => "#0dcaf0",
            Severity::Info => "#6c757d",
        };

        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
        .header {{ background: {}; color: white; padding: 20px; border-radius: 5px 5px 0 0; }}
        .content {{ background: #f9f9f9; padding: 20px; border-radius: 0 0 5px 5px; }}
        h1 {{ margin: 0; font-size: 22px; }}
        .footer {{ text-align: center; margin-top: 20px; color: #666; font-size: 12px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header">
            <h1>{} - {}</h1>
        </div>
        <div class="content">
            <p>{}</p>
            <p><strong>Check:</strong> {}</p>
            <p><strong>Host:</strong> {}</p>
            <p><strong>Time:</strong> {}</p>
        </div>
        <div class="footer">
            <p>Generated by Vault Sentinel</p>
        </div>
    </div>
</body>
</html>"#,
            severity_color,
            finding.severity,
            html_escape(&finding.title),
            html_escape(&finding.message),
            html_escape(&finding.check_name),
            html_escape(&finding.source_host),
            finding.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }

    /// Format finding as plain text
    fn format_text_body(&self, finding: &Finding) -> String {
        format!(
            "Vault Sentinel Security Alert\n\n\
            Severity: {}\n\
            Check: {}\n\
            Title: {}\n\
            Host: {}\n\
            Time: {}\n\n\
            {}\n\n---\nGenerated by Vault Sentinel",
            finding.severity,
            finding.check_name,
            finding.title,
            finding.source_host,
            finding.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            finding.message
        )
    }

    /// Get SMTP transport
    fn get_transport(&self) -> Result<SmtpTransport> {
        let transport = if self.config.use_tls {
            SmtpTransport::starttls_relay(&self.config.smtp_server)?
        } else {
            SmtpTransport::builder_dangerous(&self.config.smtp_server)
        };

        let mut transport = transport
            .port(self.config.smtp_port)
            .timeout(Some(self.timeout));

        if !self.config.username.is_empty() {
            transport = transport.credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ));
        }

        Ok(transport.build())
    }
}

#[async_trait]
impl AlertChannel for EmailChannel {
    async fn send_alert(&self, finding: &Finding) -> Result<()> {
        let message = self.build_message(finding)?;
        let transport = self.get_transport()?;

        // Send email (blocking operation, run in blocking task)
        tokio::task::spawn_blocking(move || transport.send(&message).map(|_| ()))
            .await??;

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }

    async fn test_connection(&self) -> Result<()> {
        let transport = self.get_transport()?;

        let connected = tokio::task::spawn_blocking(move || transport.test_connection()).await??;
        if !connected {
            return Err(crate::error::MonitorError::delivery(
                "email",
                format!("SMTP server {} refused the connection", self.config.smtp_server),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn create_test_config() -> EmailConfig {
        EmailConfig {
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            from_address: "sentinel@example.com".to_string(),
            to_addresses: vec!["secops@example.com".to_string()],
            username: "user".to_string(),
            password: "pass".to_string(),
            use_tls: true,
        }
    }

    fn finding() -> Finding {
        Finding {
            check_name: "health".to_string(),
            severity: Severity::Critical,
            title: "Vault is sealed".to_string(),
            message: "Vault at https://127.0.0.1:8200 is sealed".to_string(),
            timestamp: Utc::now(),
            source_host: "monitor-1".to_string(),
        }
    }

    #[test]
    fn test_email_channel_new() {
        let channel = EmailChannel::new(create_test_config(), Duration::from_secs(5));
        assert!(channel.is_ok());
        assert_eq!(channel.unwrap().channel_name(), "email");
    }

    #[test]
    fn test_invalid_recipient_rejected() {
        let mut config = create_test_config();
        config.to_addresses = vec!["not an address".to_string()];
        assert!(EmailChannel::new(config, Duration::from_secs(5)).is_err());
    }

    #[test]
    fn test_subject_carries_severity_and_title() {
        let subject = EmailChannel::subject(&finding());
        assert_eq!(subject, "[Vault Sentinel] CRITICAL - Vault is sealed (monitor-1)");
    }

    #[test]
    fn test_format_bodies() {
        let channel = EmailChannel::new(create_test_config(), Duration::from_secs(5)).unwrap();

        let text = channel.format_text_body(&finding());
        assert!(text.contains("Check: health"));
        assert!(text.contains("is sealed"));

        let html = channel.format_html_body(&finding());
        assert!(html.contains("<!DOCTYPE html>"));
        assert!(html.contains("#dc3545"));
        assert!(html.contains("monitor-1"));
    }

    #[test]
    fn test_html_body_escapes_finding_text() {
        let channel = EmailChannel::new(create_test_config(), Duration::from_secs(5)).unwrap();
        let mut finding = finding();
        finding.title = "Suspicious authentication pattern from <img src=x onerror=alert(1)>".to_string();
        finding.message = "path \"sys/<script>\" & more".to_string();

        let html = channel.format_html_body(&finding);

        assert!(!html.contains("<img"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;img src&#x3D;x onerror&#x3D;alert(1)&gt;"));
        assert!(html.contains("&amp; more"));

        // Plain text part stays verbatim
        assert!(channel.format_text_body(&finding).contains("<img src=x"));
    }

    #[test]
    fn test_build_message() {
        let channel = EmailChannel::new(create_test_config(), Duration::from_secs(5)).unwrap();
        assert!(channel.build_message(&finding()).is_ok());
    }
}
