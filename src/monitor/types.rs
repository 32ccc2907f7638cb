// Core types for Vault security monitoring

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of audit log record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Request,
    Response,
    Other(String),
}

impl From<&str> for EntryKind {
    fn from(value: &str) -> Self {
        match value {
            "request" => EntryKind::Request,
            "response" => EntryKind::Response,
            other => EntryKind::Other(other.to_string()),
        }
    }
}

/// Outcome of an audited operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Error,
}

/// One decoded audit log line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub kind: EntryKind,
    pub path: String,
    pub operation: String,
    pub outcome: Outcome,
    pub source_identity: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    /// Attribute key holding the token policies attached to the request
    pub const POLICIES: &'static str = "policies";
    /// Attribute key holding the error text of a failed operation
    pub const ERROR: &'static str = "error";
    /// Attribute key holding the request id
    pub const REQUEST_ID: &'static str = "request_id";

    /// Whether this record describes a completed operation.
    ///
    /// Vault writes a request record and a response record for every call;
    /// checks count only the latter so an operation is never counted twice.
    pub fn is_completed(&self) -> bool {
        self.kind != EntryKind::Request
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Error
    }

    /// Token policies recorded for this operation
    pub fn policies(&self) -> Vec<&str> {
        self.attributes
            .get(Self::POLICIES)
            .and_then(|v| v.as_array())
            .map(|items| items.iter().filter_map(|p| p.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn has_policy(&self, policy: &str) -> bool {
        self.policies().contains(&policy)
    }

    /// Source identity or a placeholder for display
    pub fn source_label(&self) -> &str {
        self.source_identity.as_deref().unwrap_or("unknown")
    }
}

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities from most to least severe
    pub const ALL: [Severity; 5] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
        Severity::Info,
    ];
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// A single detected condition produced by one check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub check_name: String,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub source_host: String,
}

impl Finding {
    /// Key used by the optional suppression window
    pub fn suppression_key(&self) -> String {
        format!("{}:{}", self.check_name, self.title)
    }
}

/// One structured metrics record per check per cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub timestamp: DateTime<Utc>,
    pub check_name: String,
    pub payload: serde_json::Value,
}

/// Outcome of one scheduler cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub checks_passed: usize,
    pub checks_failed: usize,
    pub total_checks: usize,
    #[serde(default)]
    pub findings: usize,
    #[serde(default)]
    pub critical_findings: usize,
}

impl CycleSummary {
    pub fn has_critical(&self) -> bool {
        self.critical_findings > 0
    }
}
