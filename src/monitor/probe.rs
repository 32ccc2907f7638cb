// Status Probe - health, leader and telemetry endpoints of the monitored cluster

use crate::Result;
use crate::error::MonitorError;
use crate::monitor::config::MonitorConfig;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Query string that makes `sys/health` answer 200 in every state so the body can be read
const HEALTH_QUERY: &str = "standbyok=true&perfstandbyok=true&sealedcode=200&uninitcode=200";

/// Parsed `sys/health` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    #[serde(default)]
    pub initialized: bool,
    #[serde(default)]
    pub sealed: bool,
    #[serde(default)]
    pub standby: bool,
    #[serde(default)]
    pub performance_standby: bool,
    #[serde(default)]
    pub replication_dr_mode: Option<String>,
    #[serde(default)]
    pub replication_performance_mode: Option<String>,
    #[serde(default)]
    pub server_time_utc: Option<i64>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub cluster_id: Option<String>,
}

/// Parsed `sys/leader` response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderSnapshot {
    #[serde(default)]
    pub ha_enabled: bool,
    #[serde(default)]
    pub is_self: bool,
    #[serde(default)]
    pub leader_address: Option<String>,
}

/// One gauge from `sys/metrics`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gauge {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: f64,
}

/// Parsed `sys/metrics` (JSON format) response; only gauges are kept
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(rename = "Gauges", default)]
    pub gauges: Vec<Gauge>,
}

impl TelemetrySnapshot {
    pub fn gauge(&self, name: &str) -> Option<f64> {
        self.gauges.iter().find(|g| g.name == name).map(|g| g.value)
    }
}

/// A mounted secret engine or auth method
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MountEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Secret engines, policies and auth methods configured on the cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    pub secret_engines: Vec<MountEntry>,
    pub policies: Vec<String>,
    pub auth_methods: Vec<MountEntry>,
}

#[derive(Debug, Deserialize)]
struct MountInfo {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    description: String,
}

/// `sys/mounts` and `sys/auth` wrap the path map in `data`
#[derive(Debug, Deserialize)]
struct MountTable {
    data: BTreeMap<String, MountInfo>,
}

impl MountTable {
    fn into_entries(self) -> Vec<MountEntry> {
        self.data
            .into_iter()
            .map(|(path, info)| MountEntry {
                path,
                kind: info.kind,
                description: info.description,
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct PolicyList {
    policies: Vec<String>,
}

/// Health snapshot plus the measured round trip
#[derive(Debug, Clone)]
pub struct TimedHealth {
    pub snapshot: HealthSnapshot,
    pub latency: Duration,
}

/// Access to the monitored cluster's status interfaces
#[async_trait]
pub trait StatusProbe: Send + Sync {
    /// Fetch the health snapshot and time the round trip
    async fn health(&self) -> Result<TimedHealth>;

    /// Fetch HA leader information
    async fn leader(&self) -> Result<LeaderSnapshot>;

    /// Fetch telemetry gauges
    async fn telemetry(&self) -> Result<TelemetrySnapshot>;

    /// List secret engines, policies and auth methods (requires a token)
    async fn inventory(&self) -> Result<Inventory>;

    /// Name used in findings and logs
    fn source_name(&self) -> &str {
        "Status endpoint"
    }
}

/// Status probe speaking the Vault HTTP API
pub struct HttpStatusProbe {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpStatusProbe {
    /// Create a probe whose every request is bounded by `timeout`
    pub fn new(base_url: impl Into<String>, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &MonitorConfig) -> Result<Self> {
        Self::new(
            config.monitoring.vault_addr.clone(),
            config.vault_token(),
            config.request_timeout(),
        )
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}/v1/{}", self.base_url, endpoint)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let mut request = self.client.get(self.url(endpoint));
        if let Some(ref token) = self.token {
            request = request.header("X-Vault-Token", token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MonitorError::unavailable(self.source_name(), e))?;

        if !response.status().is_success() {
            return Err(MonitorError::unavailable(
                self.source_name(),
                format!("{} returned status {}", endpoint, response.status()),
            ));
        }

        response.json::<T>().await.map_err(|e| MonitorError::Parse {
            message: format!("Invalid {} response: {}", endpoint, e),
        })
    }
}

#[async_trait]
impl StatusProbe for HttpStatusProbe {
    async fn health(&self) -> Result<TimedHealth> {
        let started = Instant::now();
        let snapshot: HealthSnapshot = self
            .get_json(&format!("sys/health?{}", HEALTH_QUERY))
            .await?;

        Ok(TimedHealth {
            snapshot,
            latency: started.elapsed(),
        })
    }

    async fn leader(&self) -> Result<LeaderSnapshot> {
        self.get_json("sys/leader").await
    }

    async fn telemetry(&self) -> Result<TelemetrySnapshot> {
        self.get_json("sys/metrics?format=json").await
    }

    async fn inventory(&self) -> Result<Inventory> {
        let mounts: MountTable = self.get_json("sys/mounts").await?;
        let policies: PolicyList = self.get_json("sys/policy").await?;
        let auth: MountTable = self.get_json("sys/auth").await?;

        Ok(Inventory {
            secret_engines: mounts.into_entries(),
            policies: policies.policies,
            auth_methods: auth.into_entries(),
        })
    }
}
