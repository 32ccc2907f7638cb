// Performance check - host resources and endpoint latency

use super::{CheckKind, CheckReport, EvaluationContext};
use crate::monitor::probe::TelemetrySnapshot;
use crate::monitor::resources::ResourceSample;
use crate::monitor::types::Severity;
use serde_json::json;

/// Server gauges copied into the metrics record when telemetry is available
pub const RECORDED_GAUGES: [&str; 4] = [
    "vault.core.unsealed",
    "vault.expire.num_leases",
    "vault.token.count",
    "vault.runtime.num_goroutines",
];

/// Everything the performance evaluator looks at
#[derive(Debug, Clone, Default)]
pub struct PerformanceInputs {
    pub resources: ResourceSample,
    /// Health endpoint round trip; `None` when the endpoint did not answer
    pub latency_ms: Option<u64>,
    pub telemetry: Option<TelemetrySnapshot>,
}

pub fn evaluate(inputs: &PerformanceInputs, ctx: &EvaluationContext<'_>) -> CheckReport {
    let check = CheckKind::Performance;
    let thresholds = &ctx.config.thresholds;
    let resources = &inputs.resources;
    let mut findings = Vec::new();

    if resources.cpu_percent > thresholds.cpu_usage_percent {
        findings.push(ctx.finding(
            check,
            Severity::Medium,
            "High CPU usage",
            format!(
                "{} process CPU usage is {:.1}% (threshold {:.1}%)",
                ctx.config.monitoring.process_name,
                resources.cpu_percent,
                thresholds.cpu_usage_percent
            ),
        ));
    }

    if resources.memory_percent > thresholds.memory_usage_percent {
        findings.push(ctx.finding(
            check,
            Severity::Medium,
            "High memory usage",
            format!(
                "{} process memory usage is {:.1}% (threshold {:.1}%)",
                ctx.config.monitoring.process_name,
                resources.memory_percent,
                thresholds.memory_usage_percent
            ),
        ));
    }

    // A full data volume stops the storage backend, so it ranks above the rest
    if resources.disk_percent > thresholds.disk_usage_percent {
        findings.push(ctx.finding(
            check,
            Severity::High,
            "High disk usage",
            format!(
                "Data volume {} is {:.1}% full (threshold {:.1}%)",
                ctx.config.monitoring.data_volume.display(),
                resources.disk_percent,
                thresholds.disk_usage_percent
            ),
        ));
    }

    if let Some(latency_ms) = inputs.latency_ms
        && latency_ms > thresholds.response_time_ms
    {
        findings.push(ctx.finding(
            check,
            Severity::Medium,
            "Slow response time",
            format!(
                "Health endpoint answered in {}ms (threshold {}ms)",
                latency_ms, thresholds.response_time_ms
            ),
        ));
    }

    let gauges = inputs
        .telemetry
        .as_ref()
        .map(|telemetry| {
            RECORDED_GAUGES
                .iter()
                .filter_map(|name| telemetry.gauge(name).map(|v| (name.to_string(), json!(v))))
                .collect::<serde_json::Map<_, _>>()
        })
        .unwrap_or_default();

    let metrics = json!({
        "cpu_percent": resources.cpu_percent,
        "memory_percent": resources.memory_percent,
        "disk_percent": resources.disk_percent,
        "response_time_ms": inputs.latency_ms,
        "telemetry_available": inputs.telemetry.is_some(),
        "gauges": gauges,
    });

    CheckReport::new(check, findings, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::config::MonitorConfig;
    use crate::monitor::probe::Gauge;
    use chrono::Utc;

    fn inputs(cpu: f64, memory: f64, disk: f64, latency_ms: u64) -> PerformanceInputs {
        PerformanceInputs {
            resources: ResourceSample {
                cpu_percent: cpu,
                memory_percent: memory,
                disk_percent: disk,
            },
            latency_ms: Some(latency_ms),
            telemetry: None,
        }
    }

    #[test]
    fn test_within_thresholds_passes() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);

        let report = evaluate(&inputs(10.0, 20.0, 30.0, 50), &ctx);

        assert!(report.passed());
        assert_eq!(report.metrics["response_time_ms"], 50);
        assert_eq!(report.metrics["telemetry_available"], false);
    }

    #[test]
    fn test_each_breach_has_its_severity() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);

        let report = evaluate(&inputs(95.0, 90.0, 97.5, 2500), &ctx);

        let severities: Vec<(&str, Severity)> = report
            .findings
            .iter()
            .map(|f| (f.title.as_str(), f.severity))
            .collect();
        assert_eq!(
            severities,
            vec![
                ("High CPU usage", Severity::Medium),
                ("High memory usage", Severity::Medium),
                ("High disk usage", Severity::High),
                ("Slow response time", Severity::Medium),
            ]
        );
        assert!(report.findings[2].message.contains("97.5%"));
    }

    #[test]
    fn test_values_equal_to_threshold_do_not_fire() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);

        let report = evaluate(&inputs(80.0, 85.0, 90.0, 1000), &ctx);
        assert!(report.passed());
    }

    #[test]
    fn test_unanswered_endpoint_still_reports_resources() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);
        let mut input = inputs(10.0, 20.0, 99.0, 0);
        input.latency_ms = None;

        let report = evaluate(&input, &ctx);

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].title, "High disk usage");
        assert_eq!(report.findings[0].severity, Severity::High);
        assert!(report.metrics["response_time_ms"].is_null());
    }

    #[test]
    fn test_known_gauges_recorded() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);
        let mut input = inputs(1.0, 1.0, 1.0, 5);
        input.telemetry = Some(TelemetrySnapshot {
            gauges: vec![
                Gauge {
                    name: "vault.token.count".to_string(),
                    value: 42.0,
                },
                Gauge {
                    name: "vault.some.other".to_string(),
                    value: 1.0,
                },
            ],
        });

        let report = evaluate(&input, &ctx);

        assert_eq!(report.metrics["gauges"]["vault.token.count"], 42.0);
        assert!(report.metrics["gauges"].get("vault.some.other").is_none());
    }
}
