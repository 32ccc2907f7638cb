// Certificate check - days until the serving certificate expires

use super::{CheckKind, CheckReport, EvaluationContext};
use crate::monitor::certificate::CertificateExpiry;
use crate::monitor::types::Severity;
use serde_json::json;

pub fn evaluate(expiry: &CertificateExpiry, ctx: &EvaluationContext<'_>) -> CheckReport {
    let days = expiry.days_until_expiry(ctx.now);
    let mut report = evaluate_days(days, &expiry.subject, ctx);

    if let Some(metrics) = report.metrics.as_object_mut() {
        metrics.insert("not_after".to_string(), json!(expiry.not_after.to_rfc3339()));
    }

    report
}

/// Classify a remaining lifetime in days
pub fn evaluate_days(days: i64, subject: &str, ctx: &EvaluationContext<'_>) -> CheckReport {
    let check = CheckKind::Certificate;
    let warning_days = ctx.config.monitoring.certificate_warning_days;
    let mut findings = Vec::new();

    let (status, severity) = if days <= 0 {
        findings.push(ctx.finding(
            check,
            Severity::Critical,
            "TLS certificate expired",
            format!("Certificate {} expired {} days ago", subject, -days),
        ));
        ("expired", Severity::Critical)
    } else if days <= warning_days {
        findings.push(ctx.finding(
            check,
            Severity::High,
            "TLS certificate expiring soon",
            format!(
                "Certificate {} expires in {} days (warning at {} days)",
                subject, days, warning_days
            ),
        ));
        ("expiring", Severity::High)
    } else {
        ("valid", Severity::Info)
    };

    let metrics = json!({
        "subject": subject,
        "days_remaining": days,
        "warning_days": warning_days,
        "status": status,
        "severity": severity,
    });

    CheckReport::new(check, findings, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::config::MonitorConfig;
    use chrono::{Duration, Utc};

    #[test]
    fn test_expiring_today_is_critical() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);

        let report = evaluate_days(0, "CN=vault.example.com", &ctx);

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::Critical);
        assert_eq!(report.metrics["status"], "expired");
    }

    #[test]
    fn test_within_warning_period_is_high() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);

        let report = evaluate_days(15, "CN=vault.example.com", &ctx);

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::High);
        assert!(report.findings[0].message.contains("15 days"));
    }

    #[test]
    fn test_far_from_expiry_passes() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);

        let report = evaluate_days(90, "CN=vault.example.com", &ctx);

        assert!(report.passed());
        assert_eq!(report.metrics["status"], "valid");
        assert_eq!(report.metrics["days_remaining"], 90);
        assert_eq!(report.metrics["severity"], "INFO");
    }

    #[test]
    fn test_evaluate_records_not_after() {
        let config = MonitorConfig::default();
        let now = Utc::now();
        let ctx = EvaluationContext::new(now, "monitor-1", &config);
        let expiry = CertificateExpiry {
            subject: "CN=vault.example.com".to_string(),
            not_after: now + Duration::days(45) + Duration::hours(1),
        };

        let report = evaluate(&expiry, &ctx);

        assert!(report.passed());
        assert_eq!(report.metrics["days_remaining"], 45);
        assert!(report.metrics["not_after"].is_string());
    }
}
