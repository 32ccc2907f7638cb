// Check Engine - one pure evaluator per monitored concern
//
// Evaluators take already-fetched inputs plus an `EvaluationContext` and
// return a `CheckReport`. The engine owns the sources, fetches each check's
// inputs independently and turns an unreachable source into a single
// CRITICAL finding so one failing dependency never aborts a cycle.

pub mod authentication;
pub mod expiry;
pub mod health;
pub mod performance;
pub mod policy;
pub mod tokens;

use crate::Result;
use crate::error::MonitorError;
use crate::monitor::certificate::{CertificateSource, PemFileCertificate};
use crate::monitor::config::MonitorConfig;
use crate::monitor::probe::{HttpStatusProbe, StatusProbe};
use crate::monitor::resources::{ResourceSampler, SystemResourceSampler};
use crate::monitor::source::{FileLogSource, LogBatch, LogSource};
use crate::monitor::types::{Finding, MetricRecord, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

/// The monitored concerns, in cycle order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    Health,
    Authentication,
    TokenUsage,
    PolicyChanges,
    Performance,
    Certificate,
}

impl CheckKind {
    /// Every check, in the order a cycle runs them
    pub const ALL: [CheckKind; 6] = [
        CheckKind::Health,
        CheckKind::Authentication,
        CheckKind::TokenUsage,
        CheckKind::PolicyChanges,
        CheckKind::Performance,
        CheckKind::Certificate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CheckKind::Health => "health",
            CheckKind::Authentication => "authentication",
            CheckKind::TokenUsage => "token_usage",
            CheckKind::PolicyChanges => "policy_changes",
            CheckKind::Performance => "performance",
            CheckKind::Certificate => "certificate",
        }
    }
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Inputs shared by every evaluator
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<'a> {
    pub now: DateTime<Utc>,
    pub host: &'a str,
    pub config: &'a MonitorConfig,
}

impl<'a> EvaluationContext<'a> {
    pub fn new(now: DateTime<Utc>, host: &'a str, config: &'a MonitorConfig) -> Self {
        Self { now, host, config }
    }

    pub fn finding(
        &self,
        check: CheckKind,
        severity: Severity,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Finding {
        Finding {
            check_name: check.name().to_string(),
            severity,
            title: title.into(),
            message: message.into(),
            timestamp: self.now,
            source_host: self.host.to_string(),
        }
    }
}

/// Findings plus the metrics payload of one check run
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    pub check: CheckKind,
    pub findings: Vec<Finding>,
    pub metrics: serde_json::Value,
}

impl CheckReport {
    pub fn new(check: CheckKind, findings: Vec<Finding>, metrics: serde_json::Value) -> Self {
        Self {
            check,
            findings,
            metrics,
        }
    }

    /// Single CRITICAL finding for a source that could not be read
    pub fn source_unavailable(
        check: CheckKind,
        ctx: &EvaluationContext<'_>,
        source_name: &str,
        error: &MonitorError,
    ) -> Self {
        let finding = ctx.finding(
            check,
            Severity::Critical,
            format!("{} unavailable", source_name),
            format!("{} check could not run: {}", check.name(), error),
        );

        Self::new(
            check,
            vec![finding],
            json!({
                "status": "unavailable",
                "source": source_name,
                "error": error.to_string(),
            }),
        )
    }

    /// A check passes when it produced no findings
    pub fn passed(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn has_critical(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Critical)
    }

    pub fn metric_record(&self, timestamp: DateTime<Utc>) -> MetricRecord {
        MetricRecord {
            timestamp,
            check_name: self.check.name().to_string(),
            payload: self.metrics.clone(),
        }
    }
}

/// Name of the machine running the monitor
pub fn local_hostname() -> String {
    nix::unistd::gethostname()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "localhost".to_string())
}

/// Runs checks against live sources
pub struct CheckEngine {
    config: Arc<MonitorConfig>,
    host: String,
    log_source: Arc<dyn LogSource>,
    probe: Arc<dyn StatusProbe>,
    resources: Arc<dyn ResourceSampler>,
    certificate: Arc<dyn CertificateSource>,
}

impl CheckEngine {
    pub fn new(
        config: Arc<MonitorConfig>,
        log_source: Arc<dyn LogSource>,
        probe: Arc<dyn StatusProbe>,
        resources: Arc<dyn ResourceSampler>,
        certificate: Arc<dyn CertificateSource>,
    ) -> Self {
        Self {
            config,
            host: local_hostname(),
            log_source,
            probe,
            resources,
            certificate,
        }
    }

    /// Create with the file, HTTP, sysinfo and PEM sources named in the configuration
    pub fn from_config(config: Arc<MonitorConfig>) -> Result<Self> {
        let settings = &config.monitoring;
        let timeout = config.request_timeout();

        let log_source = Arc::new(FileLogSource::new(settings.audit_log.clone(), timeout));
        let probe = Arc::new(HttpStatusProbe::from_config(&config)?);
        let resources = Arc::new(SystemResourceSampler::new(
            settings.process_name.clone(),
            settings.data_volume.clone(),
            timeout,
        ));
        let certificate = Arc::new(PemFileCertificate::new(settings.tls_cert_path.clone()));

        Ok(Self::new(config, log_source, probe, resources, certificate))
    }

    /// Override the host name stamped on findings
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Run one check. Never fails: source errors become findings.
    pub async fn run(&self, check: CheckKind, now: DateTime<Utc>) -> CheckReport {
        let ctx = EvaluationContext::new(now, &self.host, &self.config);

        let report = match check {
            CheckKind::Health => self.run_health(&ctx).await,
            CheckKind::Authentication => self.run_log_check(check, &ctx, authentication::evaluate).await,
            CheckKind::TokenUsage => self.run_log_check(check, &ctx, tokens::evaluate).await,
            CheckKind::PolicyChanges => self.run_log_check(check, &ctx, policy::evaluate).await,
            CheckKind::Performance => self.run_performance(&ctx).await,
            CheckKind::Certificate => self.run_certificate(&ctx).await,
        };

        tracing::debug!(
            "Check {} produced {} findings",
            check,
            report.findings.len()
        );

        report
    }

    async fn run_health(&self, ctx: &EvaluationContext<'_>) -> CheckReport {
        let health = match self.probe.health().await {
            Ok(health) => health,
            Err(e) => {
                tracing::warn!("Health probe failed: {}", e);
                return CheckReport::source_unavailable(
                    CheckKind::Health,
                    ctx,
                    self.probe.source_name(),
                    &e,
                );
            }
        };

        // Leader data only enriches metrics
        let leader = match self.probe.leader().await {
            Ok(leader) => Some(leader),
            Err(e) => {
                tracing::debug!("Leader lookup failed: {}", e);
                None
            }
        };

        let inventory = if health.snapshot.initialized
            && !health.snapshot.sealed
            && self.config.wants_inventory()
        {
            match self.probe.inventory().await {
                Ok(inventory) => health::InventoryStatus::Fetched(inventory),
                Err(e) => {
                    tracing::warn!("Configuration inventory unavailable: {}", e);
                    health::InventoryStatus::Failed(e.to_string())
                }
            }
        } else {
            health::InventoryStatus::Skipped
        };

        health::evaluate(&health, leader.as_ref(), &inventory, ctx)
    }

    async fn run_log_check<F>(
        &self,
        check: CheckKind,
        ctx: &EvaluationContext<'_>,
        evaluate: F,
    ) -> CheckReport
    where
        F: Fn(&LogBatch, &EvaluationContext<'_>) -> CheckReport,
    {
        match self
            .log_source
            .tail(self.config.monitoring.log_tail_lines)
            .await
        {
            Ok(batch) => evaluate(&batch, ctx),
            Err(e) => {
                tracing::warn!("Audit log read failed for {} check: {}", check, e);
                CheckReport::source_unavailable(check, ctx, self.log_source.source_name(), &e)
            }
        }
    }

    async fn run_performance(&self, ctx: &EvaluationContext<'_>) -> CheckReport {
        let check = CheckKind::Performance;

        // An unreachable endpoint is reported by the health check; resources are sampled regardless
        let latency_ms = match self.probe.health().await {
            Ok(health) => Some(health.latency.as_millis() as u64),
            Err(e) => {
                tracing::debug!("Latency unavailable for performance check: {}", e);
                None
            }
        };

        let sample = match self.resources.sample().await {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!("Resource sampling failed: {}", e);
                return CheckReport::source_unavailable(
                    check,
                    ctx,
                    self.resources.source_name(),
                    &e,
                );
            }
        };

        let telemetry = match latency_ms {
            Some(_) => match self.probe.telemetry().await {
                Ok(telemetry) => Some(telemetry),
                Err(e) => {
                    tracing::debug!("Telemetry unavailable: {}", e);
                    None
                }
            },
            None => None,
        };

        let inputs = performance::PerformanceInputs {
            resources: sample,
            latency_ms,
            telemetry,
        };

        performance::evaluate(&inputs, ctx)
    }

    async fn run_certificate(&self, ctx: &EvaluationContext<'_>) -> CheckReport {
        match self.certificate.expiry().await {
            Ok(expiry) => expiry::evaluate(&expiry, ctx),
            Err(e) => {
                tracing::warn!("Certificate lookup failed: {}", e);
                CheckReport::source_unavailable(
                    CheckKind::Certificate,
                    ctx,
                    self.certificate.source_name(),
                    &e,
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_names_are_unique() {
        let mut names: Vec<&str> = CheckKind::ALL.iter().map(|c| c.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), CheckKind::ALL.len());
    }

    #[test]
    fn test_source_unavailable_report() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);
        let err = MonitorError::unavailable("Status endpoint", "connection refused");

        let report =
            CheckReport::source_unavailable(CheckKind::Health, &ctx, "Status endpoint", &err);

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::Critical);
        assert_eq!(report.findings[0].title, "Status endpoint unavailable");
        assert_eq!(report.findings[0].source_host, "monitor-1");
        assert!(!report.passed());
        assert!(report.has_critical());
        assert_eq!(report.metrics["status"], "unavailable");
    }

    #[test]
    fn test_metric_record_carries_check_name() {
        let report = CheckReport::new(CheckKind::TokenUsage, vec![], json!({"created": 3}));
        let record = report.metric_record(Utc::now());
        assert_eq!(record.check_name, "token_usage");
        assert_eq!(record.payload["created"], 3);
        assert!(report.passed());
    }
}
