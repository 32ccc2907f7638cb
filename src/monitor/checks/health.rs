// Health check - initialization, seal state and configuration inventory

use super::{CheckKind, CheckReport, EvaluationContext};
use crate::monitor::config::ExpectedInventory;
use crate::monitor::probe::{Inventory, LeaderSnapshot, MountEntry, TimedHealth};
use crate::monitor::types::Severity;
use serde_json::json;

/// Outcome of the configuration inventory lookup
#[derive(Debug, Clone, PartialEq)]
pub enum InventoryStatus {
    /// Not attempted: cluster sealed or uninitialized, or nothing asked for it
    Skipped,
    Fetched(Inventory),
    Failed(String),
}

/// Expected items absent from the inventory, per category
#[derive(Debug, Default, PartialEq)]
pub struct MissingItems {
    pub secret_engines: Vec<String>,
    pub policies: Vec<String>,
    pub auth_methods: Vec<String>,
}

impl MissingItems {
    pub fn is_empty(&self) -> bool {
        self.secret_engines.is_empty() && self.policies.is_empty() && self.auth_methods.is_empty()
    }

    fn describe(&self) -> String {
        [
            ("secret engines", &self.secret_engines),
            ("policies", &self.policies),
            ("auth methods", &self.auth_methods),
        ]
        .iter()
        .filter(|(_, names)| !names.is_empty())
        .map(|(label, names)| format!("missing {}: {}", label, names.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
    }
}

fn mount_key(path: &str) -> &str {
    path.trim().trim_matches('/')
}

fn missing_mounts(expected: &[String], present: &[MountEntry]) -> Vec<String> {
    expected
        .iter()
        .filter(|want| !present.iter().any(|m| mount_key(&m.path) == mount_key(want)))
        .cloned()
        .collect()
}

/// Compare the inventory against what the configuration expects
pub fn missing_items(expected: &ExpectedInventory, inventory: &Inventory) -> MissingItems {
    MissingItems {
        secret_engines: missing_mounts(&expected.secret_engines, &inventory.secret_engines),
        policies: expected
            .policies
            .iter()
            .filter(|want| !inventory.policies.iter().any(|p| p == want.trim()))
            .cloned()
            .collect(),
        auth_methods: missing_mounts(&expected.auth_methods, &inventory.auth_methods),
    }
}

/// Evaluate a health snapshot. Metrics are recorded whatever the outcome.
pub fn evaluate(
    health: &TimedHealth,
    leader: Option<&LeaderSnapshot>,
    inventory: &InventoryStatus,
    ctx: &EvaluationContext<'_>,
) -> CheckReport {
    let check = CheckKind::Health;
    let snapshot = &health.snapshot;
    let mut findings = Vec::new();

    // Seal state is meaningless before initialization
    if !snapshot.initialized {
        findings.push(ctx.finding(
            check,
            Severity::Critical,
            "Vault is not initialized",
            format!(
                "Vault at {} reports initialized=false; no secrets can be served",
                ctx.config.monitoring.vault_addr
            ),
        ));
    } else if snapshot.sealed {
        findings.push(ctx.finding(
            check,
            Severity::Critical,
            "Vault is sealed",
            format!(
                "Vault at {} is sealed; unseal keys are required before it can serve requests",
                ctx.config.monitoring.vault_addr
            ),
        ));
    }

    let expected = &ctx.config.expected;
    match inventory {
        InventoryStatus::Fetched(found) => {
            let missing = missing_items(expected, found);
            if !missing.is_empty() {
                findings.push(ctx.finding(
                    check,
                    Severity::High,
                    "Vault configuration degraded",
                    format!(
                        "Vault at {} is {}",
                        ctx.config.monitoring.vault_addr,
                        missing.describe()
                    ),
                ));
            }
        }
        InventoryStatus::Failed(reason) if !expected.is_empty() => {
            findings.push(ctx.finding(
                check,
                Severity::Medium,
                "Vault configuration inventory unavailable",
                format!(
                    "Expected secret engines, policies and auth methods could not be verified: {}",
                    reason
                ),
            ));
        }
        _ => {}
    }

    let overall_health = if findings.iter().any(|f| f.severity == Severity::Critical) {
        "unhealthy"
    } else if findings.is_empty() {
        "healthy"
    } else {
        "degraded"
    };

    let inventory_metric = match inventory {
        InventoryStatus::Fetched(found) => json!(found),
        _ => serde_json::Value::Null,
    };

    let metrics = json!({
        "overall_health": overall_health,
        "initialized": snapshot.initialized,
        "sealed": snapshot.sealed,
        "standby": snapshot.standby,
        "performance_standby": snapshot.performance_standby,
        "version": snapshot.version,
        "cluster_id": snapshot.cluster_id,
        "cluster_name": snapshot.cluster_name,
        "replication_dr_mode": snapshot.replication_dr_mode,
        "replication_performance_mode": snapshot.replication_performance_mode,
        "response_time_ms": health.latency.as_millis() as u64,
        "ha_enabled": leader.map(|l| l.ha_enabled),
        "is_leader": leader.map(|l| l.is_self),
        "leader_address": leader.and_then(|l| l.leader_address.clone()),
        "inventory": inventory_metric,
    });

    CheckReport::new(check, findings, metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::config::{ExpectedInventory, MonitorConfig};
    use crate::monitor::probe::HealthSnapshot;
    use chrono::Utc;
    use std::time::Duration;

    fn timed(snapshot: HealthSnapshot) -> TimedHealth {
        TimedHealth {
            snapshot,
            latency: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_uninitialized_emits_single_critical() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);
        let snapshot: HealthSnapshot = serde_json::from_str(r#"{"initialized": false}"#).unwrap();

        let report = evaluate(&timed(snapshot), None, &InventoryStatus::Skipped, &ctx);

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::Critical);
        assert!(report.findings[0].title.contains("initialized"));
    }

    #[test]
    fn test_uninitialized_and_sealed_reports_only_initialization() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);
        let snapshot = HealthSnapshot {
            initialized: false,
            sealed: true,
            ..Default::default()
        };

        let report = evaluate(&timed(snapshot), None, &InventoryStatus::Skipped, &ctx);
        assert_eq!(report.findings.len(), 1);
        assert!(report.findings[0].title.contains("not initialized"));
    }

    #[test]
    fn test_sealed_emits_critical() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);
        let snapshot = HealthSnapshot {
            initialized: true,
            sealed: true,
            ..Default::default()
        };

        let report = evaluate(&timed(snapshot), None, &InventoryStatus::Skipped, &ctx);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].title, "Vault is sealed");
    }

    #[test]
    fn test_healthy_records_metrics_without_findings() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);
        let snapshot = HealthSnapshot {
            initialized: true,
            sealed: false,
            version: Some("1.15.2".to_string()),
            cluster_id: Some("c-1".to_string()),
            ..Default::default()
        };
        let leader = LeaderSnapshot {
            ha_enabled: true,
            is_self: true,
            leader_address: Some("https://10.0.0.2:8200".to_string()),
        };

        let report = evaluate(&timed(snapshot), Some(&leader), &InventoryStatus::Skipped, &ctx);

        assert!(report.passed());
        assert_eq!(report.metrics["initialized"], true);
        assert_eq!(report.metrics["sealed"], false);
        assert_eq!(report.metrics["version"], "1.15.2");
        assert_eq!(report.metrics["cluster_id"], "c-1");
        assert_eq!(report.metrics["is_leader"], true);
        assert_eq!(report.metrics["response_time_ms"], 12);
        assert_eq!(report.metrics["overall_health"], "healthy");
        assert!(report.metrics["inventory"].is_null());
    }

    fn unsealed() -> HealthSnapshot {
        HealthSnapshot {
            initialized: true,
            sealed: false,
            ..Default::default()
        }
    }

    fn mount(path: &str, kind: &str) -> MountEntry {
        MountEntry {
            path: path.to_string(),
            kind: kind.to_string(),
            description: String::new(),
        }
    }

    fn inventory() -> Inventory {
        Inventory {
            secret_engines: vec![mount("secret/", "kv"), mount("pki/", "pki")],
            policies: vec!["default".to_string(), "app".to_string()],
            auth_methods: vec![mount("token/", "token")],
        }
    }

    fn expecting(engines: &[&str], policies: &[&str], auth: &[&str]) -> MonitorConfig {
        let mut config = MonitorConfig::default();
        config.expected = ExpectedInventory {
            secret_engines: engines.iter().map(|s| s.to_string()).collect(),
            policies: policies.iter().map(|s| s.to_string()).collect(),
            auth_methods: auth.iter().map(|s| s.to_string()).collect(),
        };
        config
    }

    #[test]
    fn test_missing_items_ignores_trailing_slash() {
        let config = expecting(&["pki", "transit/"], &["app", "admin"], &["token", "userpass/"]);

        let missing = missing_items(&config.expected, &inventory());

        assert_eq!(missing.secret_engines, vec!["transit/"]);
        assert_eq!(missing.policies, vec!["admin"]);
        assert_eq!(missing.auth_methods, vec!["userpass/"]);
        assert_eq!(
            missing.describe(),
            "missing secret engines: transit/; missing policies: admin; missing auth methods: userpass/"
        );
    }

    #[test]
    fn test_missing_expected_items_degrade_health() {
        let config = expecting(&["secret/", "database/"], &["app"], &[]);
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);

        let report = evaluate(
            &timed(unsealed()),
            None,
            &InventoryStatus::Fetched(inventory()),
            &ctx,
        );

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::High);
        assert_eq!(report.findings[0].title, "Vault configuration degraded");
        assert!(report.findings[0].message.contains("missing secret engines: database/"));
        assert!(!report.findings[0].message.contains("policies"));
        assert_eq!(report.metrics["overall_health"], "degraded");
        assert_eq!(report.metrics["inventory"]["policies"][1], "app");
        assert_eq!(report.metrics["inventory"]["secret_engines"][1]["type"], "pki");
    }

    #[test]
    fn test_complete_inventory_is_healthy() {
        let config = expecting(&["secret"], &["app"], &["token/"]);
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);

        let report = evaluate(
            &timed(unsealed()),
            None,
            &InventoryStatus::Fetched(inventory()),
            &ctx,
        );

        assert!(report.passed());
        assert_eq!(report.metrics["overall_health"], "healthy");
        assert_eq!(report.metrics["inventory"]["auth_methods"][0]["path"], "token/");
    }

    #[test]
    fn test_unreadable_inventory_only_matters_with_expectations() {
        let failed = InventoryStatus::Failed("sys/mounts returned status 403 Forbidden".to_string());

        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);
        assert!(evaluate(&timed(unsealed()), None, &failed, &ctx).passed());

        let config = expecting(&[], &["app"], &[]);
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);
        let report = evaluate(&timed(unsealed()), None, &failed, &ctx);

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].severity, Severity::Medium);
        assert!(report.findings[0].message.contains("403"));
        assert_eq!(report.metrics["overall_health"], "degraded");
    }

    #[test]
    fn test_sealed_cluster_is_unhealthy() {
        let config = MonitorConfig::default();
        let ctx = EvaluationContext::new(Utc::now(), "monitor-1", &config);
        let snapshot = HealthSnapshot {
            initialized: true,
            sealed: true,
            ..Default::default()
        };

        let report = evaluate(&timed(snapshot), None, &InventoryStatus::Skipped, &ctx);
        assert_eq!(report.metrics["overall_health"], "unhealthy");
    }
}
