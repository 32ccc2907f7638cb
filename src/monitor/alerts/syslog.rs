// Syslog Alert Channel - local syslog daemon over the Unix socket

use crate::Result;
use crate::error::MonitorError;
use crate::monitor::alerts::AlertChannel;
use crate::monitor::types::{Finding, Severity};
use async_trait::async_trait;
use syslog::{Facility, Formatter3164};

/// Process tag attached to every syslog message
pub const SYSLOG_TAG: &str = "vault-sentinel";

/// Syslog alert channel
pub struct SyslogChannel {
    facility: Facility,
}

impl SyslogChannel {
    pub fn new() -> Self {
        Self {
            facility: Facility::LOG_AUTH,
        }
    }

    fn formatter(&self) -> Formatter3164 {
        Formatter3164 {
            facility: self.facility,
            hostname: None,
            process: SYSLOG_TAG.to_string(),
            pid: std::process::id(),
        }
    }

    /// One-line message body; the JSON form keeps it parseable by a SIEM
    fn format_line(finding: &Finding) -> Result<String> {
        Ok(serde_json::to_string(finding)?)
    }
}

impl Default for SyslogChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AlertChannel for SyslogChannel {
    async fn send_alert(&self, finding: &Finding) -> Result<()> {
        let line = Self::format_line(finding)?;
        let formatter = self.formatter();
        let severity = finding.severity;

        tokio::task::spawn_blocking(move || -> Result<()> {
            let mut writer = syslog::unix(formatter)
                .map_err(|e| MonitorError::delivery("syslog", format!("connect: {}", e)))?;

            let sent = match severity {
                Severity::Critical => writer.crit(&line),
                Severity::High => writer.err(&line),
                Severity::Medium => writer.warning(&line),
                Severity::Low => writer.notice(&line),
                Severity::Info => writer.info(&line),
            };

            sent.map_err(|e| MonitorError::delivery("syslog", e))
        })
        .await??;

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "syslog"
    }

    async fn test_connection(&self) -> Result<()> {
        let formatter = self.formatter();

        tokio::task::spawn_blocking(move || {
            syslog::unix(formatter)
                .map(|_| ())
                .map_err(|e| MonitorError::delivery("syslog", format!("connect: {}", e)))
        })
        .await?
    }
}
