// Policy/config-change check - writes to policies, auth methods and mounts

use super::{CheckKind, CheckReport, EvaluationContext};
use crate::monitor::aggregator::{Window, aggregate};
use crate::monitor::source::LogBatch;
use crate::monitor::types::{LogEntry, Severity};
use chrono::Duration;
use serde_json::json;

pub const WINDOW_SECONDS: i64 = 3600;

const CHANGE_OPERATIONS: [&str; 3] = ["create", "update", "delete"];

/// Management path prefixes and the category they belong to
const MANAGED_PREFIXES: [(&str, &str); 4] = [
    ("sys/policy/", "policy"),
    ("sys/policies/", "policy"),
    ("sys/auth/", "auth_method"),
    ("sys/mounts/", "secret_mount"),
];

/// Category of a configuration-changing entry, if it is one
pub fn change_category(entry: &LogEntry) -> Option<&'static str> {
    if !entry.is_completed() || !CHANGE_OPERATIONS.contains(&entry.operation.as_str()) {
        return None;
    }

    MANAGED_PREFIXES
        .iter()
        .find(|(prefix, _)| entry.path.starts_with(prefix))
        .map(|&(_, category)| category)
}

pub fn evaluate(batch: &LogBatch, ctx: &EvaluationContext<'_>) -> CheckReport {
    let check = CheckKind::PolicyChanges;
    let threshold = ctx.config.thresholds.high_privilege_operations_per_hour;
    let mut findings = Vec::new();

    let window = Window::trailing(batch, ctx.now, Duration::seconds(WINDOW_SECONDS));
    let is_change = |e: &LogEntry| change_category(e).is_some();

    let by_category = aggregate(&window, is_change, |e| {
        change_category(e).unwrap_or_default().to_string()
    });
    let by_operation = aggregate(&window, is_change, |e| e.operation.clone());

    for entry in window.entries().iter().filter(|e| is_change(e)) {
        let category = change_category(entry).unwrap_or_default();
        let outcome = if entry.is_failure() { "failed" } else { "succeeded" };

        findings.push(ctx.finding(
            check,
            Severity::High,
            format!("Configuration change: {} {}", entry.operation, entry.path),
            format!(
                "{} {} on {} from {} ({}) at {}",
                category.replace('_', " "),
                entry.operation,
                entry.path,
                entry.source_label(),
                outcome,
                entry.timestamp.to_rfc3339()
            ),
        ));
    }

    if by_category.total as u64 > threshold {
        findings.push(ctx.finding(
            check,
            Severity::High,
            "High privilege operation rate",
            format!(
                "{} configuration changes in the last hour (threshold {})",
                by_category.total, threshold
            ),
        ));
    }

    let metrics = json!({
        "window_seconds": WINDOW_SECONDS,
        "total": by_category.total,
        "by_category": by_category.counts,
        "by_operation": by_operation.counts,
        "threshold": threshold,
        "malformed_lines": by_category.malformed,
    });

    CheckReport::new(check, findings, metrics)
}
