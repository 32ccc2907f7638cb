// Monitoring configuration

use crate::Result;
use crate::error::MonitorError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main monitoring configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub monitoring: MonitorSettings,
    pub thresholds: ThresholdsConfig,
    #[serde(default)]
    pub expected: ExpectedInventory,
    #[serde(default)]
    pub alert_channels: AlertChannelsConfig,
}

/// Monitor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSettings {
    /// Seconds between cycles
    pub interval: u64,
    /// Failures from one source identity above which a suspicious pattern is reported
    #[serde(default = "default_threat_threshold")]
    pub threat_threshold: u64,
    #[serde(default = "default_vault_addr")]
    pub vault_addr: String,
    /// Token for the metrics endpoint; falls back to `VAULT_TOKEN`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_token: Option<String>,
    #[serde(default = "default_audit_log")]
    pub audit_log: PathBuf,
    #[serde(default = "default_tls_cert_path")]
    pub tls_cert_path: PathBuf,
    #[serde(default = "default_data_volume")]
    pub data_volume: PathBuf,
    #[serde(default = "default_process_name")]
    pub process_name: String,
    #[serde(default = "default_log_tail_lines")]
    pub log_tail_lines: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_certificate_warning_days")]
    pub certificate_warning_days: i64,
    /// Zero disables suppression: every breach is re-alerted every cycle
    #[serde(default)]
    pub suppression_window_secs: u64,
    #[serde(default = "default_storage_root")]
    pub storage_root: PathBuf,
}

fn default_threat_threshold() -> u64 {
    5
}

fn default_vault_addr() -> String {
    "https://127.0.0.1:8200".to_string()
}

fn default_audit_log() -> PathBuf {
    PathBuf::from("/var/log/vault/audit.log")
}

fn default_tls_cert_path() -> PathBuf {
    PathBuf::from("/etc/vault/tls/vault.crt")
}

fn default_data_volume() -> PathBuf {
    PathBuf::from("/var/lib/vault")
}

fn default_process_name() -> String {
    "vault".to_string()
}

fn default_log_tail_lines() -> usize {
    2000
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_certificate_warning_days() -> i64 {
    30
}

fn default_storage_root() -> PathBuf {
    PathBuf::from("/var/lib/vault-sentinel")
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            interval: 60,
            threat_threshold: default_threat_threshold(),
            vault_addr: default_vault_addr(),
            vault_token: None,
            audit_log: default_audit_log(),
            tls_cert_path: default_tls_cert_path(),
            data_volume: default_data_volume(),
            process_name: default_process_name(),
            log_tail_lines: default_log_tail_lines(),
            request_timeout_secs: default_request_timeout_secs(),
            certificate_warning_days: default_certificate_warning_days(),
            suppression_window_secs: 0,
            storage_root: default_storage_root(),
        }
    }
}

/// Numeric limits every check is evaluated against. All keys are required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    pub failed_auth_per_minute: u64,
    pub token_creation_per_minute: u64,
    pub high_privilege_operations_per_hour: u64,
    pub response_time_ms: u64,
    pub cpu_usage_percent: f64,
    pub memory_usage_percent: f64,
    pub disk_usage_percent: f64,
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            failed_auth_per_minute: 10,
            token_creation_per_minute: 50,
            high_privilege_operations_per_hour: 5,
            response_time_ms: 1000,
            cpu_usage_percent: 80.0,
            memory_usage_percent: 85.0,
            disk_usage_percent: 90.0,
        }
    }
}

/// Secret engines, policies and auth methods the cluster must have.
/// Mount paths match with or without their trailing `/`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpectedInventory {
    #[serde(default)]
    pub secret_engines: Vec<String>,
    #[serde(default)]
    pub policies: Vec<String>,
    #[serde(default)]
    pub auth_methods: Vec<String>,
}

impl ExpectedInventory {
    pub fn is_empty(&self) -> bool {
        self.secret_engines.is_empty() && self.policies.is_empty() && self.auth_methods.is_empty()
    }
}

/// Alert destinations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AlertChannelsConfig {
    /// Forward alerts to the local syslog daemon
    #[serde(default)]
    pub syslog: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook: Option<WebhookConfig>,
}

/// Email configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub from_address: String,
    pub to_addresses: Vec<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub use_tls: bool,
}

fn default_smtp_port() -> u16 {
    587
}

/// Chat webhook configuration (Slack-compatible incoming webhook)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    pub url: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            monitoring: MonitorSettings::default(),
            thresholds: ThresholdsConfig::default(),
            expected: ExpectedInventory::default(),
            alert_channels: AlertChannelsConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| {
            MonitorError::config(format!(
                "Failed to read config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: MonitorConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_str = toml::to_string_pretty(self)?;

        fs::write(path.as_ref(), toml_str).map_err(|e| MonitorError::FileSystem {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;

        Ok(())
    }

    /// Reject values no check can run meaningfully with
    pub fn validate(&self) -> Result<()> {
        let monitoring = &self.monitoring;

        if monitoring.interval == 0 {
            return Err(MonitorError::config("monitoring.interval must be > 0"));
        }

        if monitoring.vault_addr.trim().is_empty() {
            return Err(MonitorError::config("monitoring.vault_addr is empty"));
        }

        if monitoring.log_tail_lines == 0 {
            return Err(MonitorError::config("monitoring.log_tail_lines must be > 0"));
        }

        if monitoring.request_timeout_secs == 0 {
            return Err(MonitorError::config(
                "monitoring.request_timeout_secs must be > 0",
            ));
        }

        let percentages = [
            ("cpu_usage_percent", self.thresholds.cpu_usage_percent),
            ("memory_usage_percent", self.thresholds.memory_usage_percent),
            ("disk_usage_percent", self.thresholds.disk_usage_percent),
        ];
        for (key, value) in percentages {
            if !(0.0..=100.0).contains(&value) {
                return Err(MonitorError::config(format!(
                    "thresholds.{} must be within 0..=100 (got {})",
                    key, value
                )));
            }
        }

        let expected = [
            ("secret_engines", &self.expected.secret_engines),
            ("policies", &self.expected.policies),
            ("auth_methods", &self.expected.auth_methods),
        ];
        for (key, names) in expected {
            if names.iter().any(|name| name.trim_matches('/').trim().is_empty()) {
                return Err(MonitorError::config(format!(
                    "expected.{} contains an empty name",
                    key
                )));
            }
        }

        if let Some(ref email) = self.alert_channels.email
            && email.to_addresses.is_empty()
        {
            return Err(MonitorError::config(
                "alert_channels.email.to_addresses is empty",
            ));
        }

        if let Some(ref webhook) = self.alert_channels.webhook
            && webhook.url.trim().is_empty()
        {
            return Err(MonitorError::config("alert_channels.webhook.url is empty"));
        }

        Ok(())
    }

    /// Timeout applied to every network call and source read
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.monitoring.request_timeout_secs)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.monitoring.interval)
    }

    /// Token for authenticated endpoints
    pub fn vault_token(&self) -> Option<String> {
        self.monitoring
            .vault_token
            .clone()
            .or_else(|| std::env::var("VAULT_TOKEN").ok())
            .filter(|t| !t.is_empty())
    }

    /// Whether the health check should read the cluster's configuration inventory
    pub fn wants_inventory(&self) -> bool {
        !self.expected.is_empty() || self.vault_token().is_some()
    }

    /// Get list of enabled alert channels (the local alert log is always on)
    pub fn enabled_channels(&self) -> Vec<String> {
        let mut channels = vec!["alert-log".to_string()];

        if self.alert_channels.email.is_some() {
            channels.push("email".to_string());
        }

        if self.alert_channels.webhook.is_some() {
            channels.push("webhook".to_string());
        }

        if self.alert_channels.syslog {
            channels.push("syslog".to_string());
        }

        channels
    }
}
