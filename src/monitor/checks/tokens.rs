// Token usage check - creation rate and root-policy activity

use super::{CheckKind, CheckReport, EvaluationContext};
use crate::monitor::aggregator::{Window, count};
use crate::monitor::source::LogBatch;
use crate::monitor::types::{LogEntry, Severity};
use chrono::Duration;
use serde_json::json;

pub const WINDOW_SECONDS: i64 = 60;

/// Policy that marks a privileged token
pub const ROOT_POLICY: &str = "root";

/// Read-only status paths routinely polled with privileged tokens
pub const READ_ONLY_PATHS: [&str; 3] = ["sys/health", "sys/seal-status", "sys/leader"];

fn is_token_create(entry: &LogEntry) -> bool {
    entry.is_completed() && entry.path.starts_with("auth/token/create")
}

fn is_token_revoke(entry: &LogEntry) -> bool {
    entry.is_completed() && entry.path.starts_with("auth/token/revoke")
}

fn is_root_operation(entry: &LogEntry) -> bool {
    entry.is_completed()
        && entry.has_policy(ROOT_POLICY)
        && !READ_ONLY_PATHS.contains(&entry.path.as_str())
}

pub fn evaluate(batch: &LogBatch, ctx: &EvaluationContext<'_>) -> CheckReport {
    let check = CheckKind::TokenUsage;
    let threshold = ctx.config.thresholds.token_creation_per_minute;
    let mut findings = Vec::new();

    let window = Window::trailing(batch, ctx.now, Duration::seconds(WINDOW_SECONDS));
    let created = count(&window, is_token_create);
    let revoked = count(&window, is_token_revoke);

    let root_operations: Vec<&LogEntry> = window
        .entries()
        .iter()
        .filter(|e| is_root_operation(e))
        .collect();

    for entry in &root_operations {
        findings.push(ctx.finding(
            check,
            Severity::High,
            "Root token usage",
            format!(
                "Root-policy token performed '{}' on {} from {}",
                entry.operation,
                entry.path,
                entry.source_label()
            ),
        ));
    }

    if created as u64 > threshold {
        findings.push(ctx.finding(
            check,
            Severity::Medium,
            "High token creation rate",
            format!(
                "{} tokens created in the last {}s (threshold {})",
                created, WINDOW_SECONDS, threshold
            ),
        ));
    }

    let metrics = json!({
        "window_seconds": WINDOW_SECONDS,
        "created": created,
        "revoked": revoked,
        "root_operations": root_operations.len(),
        "threshold": threshold,
        "malformed_lines": window.malformed(),
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

    fn op(seconds_ago: i64, path: &str, policies: &[&str]) -> LogEntry {
        let mut attributes = BTreeMap::new();
        attributes.insert(LogEntry::POLICIES.to_string(), json!(policies));
        LogEntry {
            timestamp: now() - Duration::seconds(seconds_ago),
            kind: EntryKind::Response,
            path: path.to_string(),
            operation: "update".to_string(),
            outcome: Outcome::Success,
            source_identity: Some("10.0.0.3".to_string()),
            attributes,
        }
    }

    #[test]
    fn test_root_operations_reported_except_read_only_paths() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(now(), "monitor-1", &config);
        let batch = LogBatch::from_entries(vec![
            op(5, "sys/health", &["root"]),
            op(6, "sys/seal-status", &["root"]),
            op(7, "sys/leader", &["root"]),
            op(8, "secret/data/payments", &["root"]),
            op(9, "secret/data/payments", &["default"]),
        ]);

        let report = evaluate(&batch, &ctx);

        assert_eq!(report.findings.len(), 1);
        let finding = &report.findings[0];
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.title, "Root token usage");
        assert!(finding.message.contains("update"));
        assert!(finding.message.contains("secret/data/payments"));
        assert!(finding.message.contains("10.0.0.3"));
    }

    #[test]
    fn test_creation_rate_over_threshold() {
        let mut config = MonitorConfig::default();
        config.thresholds.token_creation_per_minute = 3;
        let ctx = EvaluationContext::new(now(), "monitor-1", &config);
        let mut entries: Vec<LogEntry> = (0..4)
            .map(|i| op(i, "auth/token/create", &["default"]))
            .collect();
        entries.push(op(2, "auth/token/revoke-accessor", &["default"]));
        entries.push(op(120, "auth/token/create", &["default"]));

        let report = evaluate(&LogBatch::from_entries(entries), &ctx);

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::Medium);
        assert_eq!(report.findings[0].title, "High token creation rate");
        assert_eq!(report.metrics["created"], 4);
        assert_eq!(report.metrics["revoked"], 1);
    }

    #[test]
    fn test_root_operations_outside_window_ignored() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(now(), "monitor-1", &config);
        let batch = LogBatch::from_entries(vec![op(61, "sys/mounts/kv", &["root"])]);

        let report = evaluate(&batch, &ctx);
        assert!(report.passed());
        assert_eq!(report.metrics["root_operations"], 0);
    }
}
