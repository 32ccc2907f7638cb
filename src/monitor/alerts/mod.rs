// Alert System - Multi-channel alerting
//
// Every finding is recorded in the local alert log. External channels are
// attempted concurrently, each bounded by the request timeout, and a failing
// channel never prevents delivery through the others.

pub mod channels;
pub mod email;
pub mod syslog;
pub mod webhook;

use crate::Result;
use crate::monitor::config::MonitorConfig;
use crate::monitor::store::{AppendLog, MonitorStore};
use crate::monitor::types::{Finding, Severity};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub use channels::AlertChannel;

/// A dispatched finding as recorded in the alert log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub finding: Finding,
    pub channels_attempted: Vec<String>,
    pub channels_succeeded: Vec<String>,
    #[serde(default)]
    pub suppressed: bool,
}

impl Alert {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.finding.timestamp
    }
}

/// Outcome of dispatching one finding
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub alert: Alert,
    /// `(channel, reason)` for every channel that failed
    pub failures: Vec<(String, String)>,
}

impl DispatchResult {
    pub fn all_delivered(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Alert dispatcher - records findings and fans them out to channels
pub struct AlertDispatcher {
    channels: Vec<Box<dyn AlertChannel>>,
    alert_log: AppendLog<Alert>,
    recent_alerts: Arc<Mutex<HashMap<String, DateTime<Utc>>>>,
    suppression_window: Duration,
    channel_timeout: std::time::Duration,
}

impl AlertDispatcher {
    /// Create a dispatcher with no external channels
    pub fn new(
        store: &MonitorStore,
        suppression_window_secs: u64,
        channel_timeout: std::time::Duration,
    ) -> Self {
        Self {
            channels: Vec::new(),
            alert_log: AppendLog::new(store.alert_log_path()),
            recent_alerts: Arc::new(Mutex::new(HashMap::new())),
            suppression_window: Duration::seconds(suppression_window_secs as i64),
            channel_timeout,
        }
    }

    /// Create from configuration
    pub fn from_config(config: &MonitorConfig, store: &MonitorStore) -> Result<Self> {
        let timeout = config.request_timeout();
        let mut dispatcher =
            Self::new(store, config.monitoring.suppression_window_secs, timeout);

        if let Some(ref email_config) = config.alert_channels.email {
            let channel = email::EmailChannel::new(email_config.clone(), timeout)?;
            dispatcher.add_channel(Box::new(channel));
        }

        if let Some(ref webhook_config) = config.alert_channels.webhook {
            let channel = webhook::WebhookChannel::new(webhook_config.clone(), timeout)?;
            dispatcher.add_channel(Box::new(channel));
        }

        if config.alert_channels.syslog {
            dispatcher.add_channel(Box::new(syslog::SyslogChannel::new()));
        }

        Ok(dispatcher)
    }

    /// Add an alert channel
    pub fn add_channel(&mut self, channel: Box<dyn AlertChannel>) {
        self.channels.push(channel);
    }

    /// Get channel count
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn alert_log(&self) -> &AppendLog<Alert> {
        &self.alert_log
    }

    /// Dispatch one finding. Only a failure to append the alert log is an error.
    pub async fn dispatch(&self, finding: &Finding) -> Result<DispatchResult> {
        if self.is_suppressed(finding).await {
            tracing::debug!("Alert suppressed: {}", finding.suppression_key());

            let alert = Alert {
                finding: finding.clone(),
                channels_attempted: Vec::new(),
                channels_succeeded: Vec::new(),
                suppressed: true,
            };
            self.alert_log.append(&alert).await?;

            return Ok(DispatchResult {
                alert,
                failures: Vec::new(),
            });
        }

        self.record_alert(finding).await;

        let tasks = self.channels.iter().map(|channel| async move {
            let name = channel.channel_name().to_string();
            let outcome =
                match tokio::time::timeout(self.channel_timeout, channel.send_alert(finding)).await
                {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(_) => Err(format!("timed out after {:?}", self.channel_timeout)),
                };

            match &outcome {
                Ok(()) => tracing::info!("Alert sent via {}: {}", name, finding.title),
                Err(reason) => tracing::error!("Failed to send alert via {}: {}", name, reason),
            }

            (name, outcome)
        });

        // Wait for all channels (but don't fail if some fail)
        let results = futures::future::join_all(tasks).await;

        let mut alert = Alert {
            finding: finding.clone(),
            channels_attempted: Vec::with_capacity(results.len()),
            channels_succeeded: Vec::new(),
            suppressed: false,
        };
        let mut failures = Vec::new();

        for (name, outcome) in results {
            alert.channels_attempted.push(name.clone());
            match outcome {
                Ok(()) => alert.channels_succeeded.push(name),
                Err(reason) => failures.push((name, reason)),
            }
        }

        self.alert_log.append(&alert).await?;

        Ok(DispatchResult { alert, failures })
    }

    /// Check if a finding repeats one dispatched within the suppression window
    async fn is_suppressed(&self, finding: &Finding) -> bool {
        if self.suppression_window <= Duration::zero() {
            return false;
        }

        let recent = self.recent_alerts.lock().await;
        match recent.get(&finding.suppression_key()) {
            Some(last_sent) => finding.timestamp - *last_sent < self.suppression_window,
            None => false,
        }
    }

    /// Record a dispatched finding for suppression
    async fn record_alert(&self, finding: &Finding) {
        if self.suppression_window <= Duration::zero() {
            return;
        }

        let mut recent = self.recent_alerts.lock().await;
        recent.insert(finding.suppression_key(), finding.timestamp);

        // Clean old entries
        let cutoff = finding.timestamp - self.suppression_window;
        recent.retain(|_, &mut time| time > cutoff);
    }

    /// Send a synthetic INFO finding through every external channel
    pub async fn test_channels(&self, host: &str) -> Vec<(String, Result<()>)> {
        let test_finding = Finding {
            check_name: "test".to_string(),
            severity: Severity::Info,
            title: "Test alert".to_string(),
            message: "Test alert from Vault Sentinel monitoring".to_string(),
            timestamp: Utc::now(),
            source_host: host.to_string(),
        };

        let tasks = self.channels.iter().map(|channel| {
            let finding = &test_finding;
            async move {
                let result =
                    match tokio::time::timeout(self.channel_timeout, channel.send_alert(finding))
                        .await
                    {
                        Ok(result) => result,
                        Err(elapsed) => Err(elapsed.into()),
                    };
                (channel.channel_name().to_string(), result)
            }
        });

        futures::future::join_all(tasks).await
    }
}
