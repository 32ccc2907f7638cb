// Cycle Runner - one pass over every check

use crate::Result;
use crate::monitor::alerts::AlertDispatcher;
use crate::monitor::checks::{CheckEngine, CheckKind, CheckReport};
use crate::monitor::config::MonitorConfig;
use crate::monitor::store::{MetricsRecorder, MonitorStore};
use crate::monitor::types::{CycleSummary, Finding, Severity};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;

/// Result of one cycle
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub summary: CycleSummary,
    pub findings: Vec<Finding>,
    /// Channel deliveries that failed across all dispatched findings
    pub delivery_failures: usize,
}

impl CycleReport {
    pub fn has_critical(&self) -> bool {
        self.summary.has_critical()
    }
}

/// Runs checks, records metrics and dispatches findings
pub struct CycleRunner {
    engine: CheckEngine,
    dispatcher: AlertDispatcher,
    recorder: MetricsRecorder,
}

impl CycleRunner {
    pub fn new(engine: CheckEngine, dispatcher: AlertDispatcher, store: &MonitorStore) -> Self {
        Self {
            engine,
            dispatcher,
            recorder: MetricsRecorder::new(store),
        }
    }

    /// Build the live engine and dispatcher; creates the monitoring root
    pub async fn from_config(config: Arc<MonitorConfig>, store: &MonitorStore) -> Result<Self> {
        store.init().await?;

        let engine = CheckEngine::from_config(Arc::clone(&config))?;
        let dispatcher = AlertDispatcher::from_config(&config, store)?;
        Ok(Self::new(engine, dispatcher, store))
    }

    pub fn engine(&self) -> &CheckEngine {
        &self.engine
    }

    pub fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    pub fn recorder(&self) -> &MetricsRecorder {
        &self.recorder
    }

    /// Run every check once and append the cycle summary
    pub async fn run_cycle(&self) -> Result<CycleReport> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run a cycle evaluated at `now`
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleReport> {
        let started = Instant::now();
        tracing::info!("Starting monitoring cycle");

        let mut findings = Vec::new();
        let mut delivery_failures = 0;
        let mut checks_passed = 0;

        for check in CheckKind::ALL {
            let (report, failures) = self.execute(check, now).await?;

            if report.passed() {
                checks_passed += 1;
            }
            delivery_failures += failures;
            findings.extend(report.findings);
        }

        let total_checks = CheckKind::ALL.len();
        let summary = CycleSummary {
            started_at: now,
            duration_ms: started.elapsed().as_millis() as u64,
            checks_passed,
            checks_failed: total_checks - checks_passed,
            total_checks,
            findings: findings.len(),
            critical_findings: findings
                .iter()
                .filter(|f| f.severity == Severity::Critical)
                .count(),
        };

        self.recorder.record_cycle(&summary).await?;

        tracing::info!(
            "Cycle complete: {}/{} checks passed, {} findings ({} critical) in {}ms",
            summary.checks_passed,
            summary.total_checks,
            summary.findings,
            summary.critical_findings,
            summary.duration_ms
        );

        Ok(CycleReport {
            summary,
            findings,
            delivery_failures,
        })
    }

    /// Run one check with the same recording and dispatch as a cycle
    pub async fn run_check(&self, check: CheckKind) -> Result<CheckReport> {
        let (report, _) = self.execute(check, Utc::now()).await?;
        Ok(report)
    }

    async fn execute(&self, check: CheckKind, now: DateTime<Utc>) -> Result<(CheckReport, usize)> {
        let report = self.engine.run(check, now).await;

        self.recorder.record_metric(&report.metric_record(now)).await?;

        let mut failures = 0;
        for finding in &report.findings {
            let result = self.dispatcher.dispatch(finding).await?;
            failures += result.failures.len();
        }

        if report.passed() {
            tracing::info!("Check {} passed", check);
        } else {
            tracing::warn!(
                "Check {} failed with {} findings",
                check,
                report.findings.len()
            );
        }

        Ok((report, failures))
    }
}
