// Authentication check - login failure rate and per-source failure patterns

use super::{CheckKind, CheckReport, EvaluationContext};
use crate::monitor::aggregator::{Window, aggregate, count};
use crate::monitor::source::LogBatch;
use crate::monitor::types::{LogEntry, Severity};
use chrono::Duration;
use serde_json::json;

/// Seconds of log history the failure rate is computed over
pub const WINDOW_SECONDS: i64 = 60;

/// `auth/<mount...>/login[/<user>]`
pub fn is_login(entry: &LogEntry) -> bool {
    let mut segments = entry.path.split('/');
    segments.next() == Some("auth") && segments.skip(1).any(|s| s == "login")
}

fn is_failed_login(entry: &LogEntry) -> bool {
    entry.is_completed() && is_login(entry) && entry.is_failure()
}

fn is_successful_login(entry: &LogEntry) -> bool {
    entry.is_completed() && is_login(entry) && !entry.is_failure()
}

pub fn evaluate(batch: &LogBatch, ctx: &EvaluationContext<'_>) -> CheckReport {
    let check = CheckKind::Authentication;
    let threshold = ctx.config.thresholds.failed_auth_per_minute;
    let mut findings = Vec::new();

    let window = Window::trailing(batch, ctx.now, Duration::seconds(WINDOW_SECONDS));
    let failed = count(&window, is_failed_login);
    let successful = count(&window, is_successful_login);

    if failed as u64 > threshold {
        findings.push(ctx.finding(
            check,
            Severity::High,
            "High authentication failure rate",
            format!(
                "{} failed logins in the last {}s (threshold {})",
                failed, WINDOW_SECONDS, threshold
            ),
        ));
    }

    // Per-source patterns look at the whole tail, not just the last minute
    let history = Window::history(batch, ctx.now);
    let by_source = aggregate(&history, is_failed_login, |e| e.source_label().to_string());
    let suspicious = by_source.groups_above(ctx.config.monitoring.threat_threshold);

    for &(source, failures) in &suspicious {
        findings.push(ctx.finding(
            check,
            Severity::Medium,
            format!("Suspicious authentication pattern from {}", source),
            format!(
                "{} failed authentication {} times in recent audit history",
                source, failures
            ),
        ));
    }

    let metrics = json!({
        "window_seconds": WINDOW_SECONDS,
        "failed": failed,
        "successful": successful,
        "threshold": threshold,
        "suspicious_sources": suspicious
            .iter()
            .map(|&(source, failures)| (source.to_string(), json!(failures)))
            .collect::<serde_json::Map<_, _>>(),
        "malformed_lines": by_source.malformed,
    });

    CheckReport::new(check, findings, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::config::MonitorConfig;
    use crate::monitor::types::{EntryKind, Outcome};
    use chrono::{DateTime, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn login(seconds_ago: i64, source: &str, outcome: Outcome) -> LogEntry {
        LogEntry {
            timestamp: now() - Duration::seconds(seconds_ago),
            kind: EntryKind::Response,
            path: "auth/userpass/login/alice".to_string(),
            operation: "update".to_string(),
            outcome,
            source_identity: Some(source.to_string()),
            attributes: BTreeMap::new(),
        }
    }

    #[test]
    fn test_is_login_paths() {
        let mut entry = login(0, "10.0.0.1", Outcome::Error);
        assert!(is_login(&entry));
        entry.path = "auth/approle/login".to_string();
        assert!(is_login(&entry));
        entry.path = "auth/token/create".to_string();
        assert!(!is_login(&entry));
        entry.path = "secret/data/login".to_string();
        assert!(!is_login(&entry));
    }

    #[test]
    fn test_auth_flood_from_distinct_sources() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(now(), "monitor-1", &config);
        let entries = (0..11)
            .map(|i| login(i * 5, &format!("10.0.1.{}", i), Outcome::Error))
            .collect();

        let report = evaluate(&LogBatch::from_entries(entries), &ctx);

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::High);
        assert_eq!(report.findings[0].title, "High authentication failure rate");
        assert!(report.findings[0].message.starts_with("11 failed logins"));
        assert_eq!(report.metrics["failed"], 11);
    }

    #[test]
    fn test_repeated_failures_from_single_source() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(now(), "monitor-1", &config);
        let entries = (0..6)
            .map(|i| login(i * 5, "10.0.0.5", Outcome::Error))
            .collect();

        let report = evaluate(&LogBatch::from_entries(entries), &ctx);

        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0];
        assert_eq!(finding.severity, Severity::Medium);
        assert!(finding.title.contains("10.0.0.5"));
        assert!(finding.message.contains("10.0.0.5 failed authentication 6 times"));
        assert_eq!(report.metrics["suspicious_sources"]["10.0.0.5"], 6);
    }

    #[test]
    fn test_per_source_uses_history_beyond_window() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(now(), "monitor-1", &config);
        let entries = (0..6)
            .map(|i| login(600 + i * 60, "10.0.0.7", Outcome::Error))
            .collect();

        let report = evaluate(&LogBatch::from_entries(entries), &ctx);

        assert_eq!(report.metrics["failed"], 0);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::Medium);
    }

    #[test]
    fn test_threshold_is_strictly_exceeded() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(now(), "monitor-1", &config);
        let entries = (0..10)
            .map(|i| login(i, &format!("10.0.2.{}", i), Outcome::Error))
            .collect();

        let report = evaluate(&LogBatch::from_entries(entries), &ctx);
        assert!(report.passed());
    }

    #[test]
    fn test_request_records_and_successes_not_counted_as_failures() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(now(), "monitor-1", &config);
        let mut entries: Vec<LogEntry> = (0..20)
            .map(|i| {
                let mut entry = login(i, "10.0.0.8", Outcome::Error);
                entry.kind = EntryKind::Request;
                entry
            })
            .collect();
        entries.push(login(1, "10.0.0.8", Outcome::Success));

        let report = evaluate(&LogBatch::from_entries(entries), &ctx);

        assert!(report.passed());
        assert_eq!(report.metrics["successful"], 1);
    }

    #[test]
    fn test_threat_threshold_is_configurable() {
        let mut config = MonitorConfig::default();
        config.monitoring.threat_threshold = 2;
        let ctx = EvaluationContext::new(now(), "monitor-1", &config);
        let entries = (0..3)
            .map(|i| login(i, "10.0.0.9", Outcome::Error))
            .collect();

        let report = evaluate(&LogBatch::from_entries(entries), &ctx);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::Medium);
    }
}
