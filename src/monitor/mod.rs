// Vault Security Monitoring System
//
// This module provides the monitoring daemon that:
// - Tails the audit log and probes the health/status endpoints
// - Evaluates authentication, token, policy, performance and certificate checks
// - Sends alerts through multiple channels (alert log, Email, chat webhook, syslog)
// - Appends metrics and cycle summaries to JSONL logs for reporting
// - Supports graceful shutdown on SIGINT/SIGTERM

pub mod aggregator;
pub mod alerts;
pub mod certificate;
pub mod checks;
pub mod config;
pub mod daemon;
pub mod probe;
pub mod resources;
pub mod scheduler;
pub mod source;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use alerts::{Alert, AlertChannel, AlertDispatcher, DispatchResult};
pub use checks::{CheckEngine, CheckKind, CheckReport, EvaluationContext};
pub use config::MonitorConfig;
pub use daemon::MonitorDaemon;
pub use scheduler::{CycleReport, CycleRunner};
pub use store::{AppendLog, MetricsRecorder, MonitorStore};
pub use types::{CycleSummary, Finding, LogEntry, MetricRecord, Severity};
