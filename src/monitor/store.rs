// Persisted monitoring state - append-only JSONL logs under the storage root

use crate::Result;
use crate::error::MonitorError;
use crate::monitor::types::{CycleSummary, MetricRecord};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

pub const ALERT_LOG: &str = "alerts.jsonl";
pub const METRICS_LOG: &str = "metrics.jsonl";
pub const CYCLE_LOG: &str = "cycles.jsonl";
pub const REPORTS_DIR: &str = "reports";

/// Append-only log of one record type, one JSON document per line.
///
/// Writes within the process are serialized through a mutex; records are
/// never rewritten or removed.
pub struct AppendLog<T> {
    path: PathBuf,
    write_lock: Mutex<()>,
    _record: PhantomData<fn() -> T>,
}

impl<T> AppendLog<T>
where
    T: Serialize + DeserializeOwned,
{
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record as a single line
    pub async fn append(&self, record: &T) -> Result<()> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.fs_error(e))?;

        file.write_all(line.as_bytes())
            .await
            .map_err(|e| self.fs_error(e))?;
        file.flush().await.map_err(|e| self.fs_error(e))?;

        Ok(())
    }

    /// Read every well-formed record. A missing log reads as empty and
    /// undecodable lines are skipped.
    pub async fn read_all(&self) -> Result<Vec<T>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(self.fs_error(e)),
        };

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for line in contents.lines().filter(|l| !l.trim().is_empty()) {
            match serde_json::from_str(line) {
                Ok(record) => records.push(record),
                Err(_) => skipped += 1,
            }
        }

        if skipped > 0 {
            tracing::warn!(
                "Skipped {} malformed lines in {}",
                skipped,
                self.path.display()
            );
        }

        Ok(records)
    }

    fn fs_error(&self, source: std::io::Error) -> MonitorError {
        MonitorError::FileSystem {
            path: self.path.display().to_string(),
            source,
        }
    }
}

/// Layout of the monitoring root directory
#[derive(Debug, Clone)]
pub struct MonitorStore {
    root: PathBuf,
}

impl MonitorStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn alert_log_path(&self) -> PathBuf {
        self.root.join(ALERT_LOG)
    }

    pub fn metrics_log_path(&self) -> PathBuf {
        self.root.join(METRICS_LOG)
    }

    pub fn cycle_log_path(&self) -> PathBuf {
        self.root.join(CYCLE_LOG)
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join(REPORTS_DIR)
    }

    /// Create the root and reports directories. Safe to call repeatedly.
    pub async fn init(&self) -> Result<()> {
        for dir in [self.root.clone(), self.reports_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .map_err(|e| MonitorError::FileSystem {
                    path: dir.display().to_string(),
                    source: e,
                })?;
        }

        tracing::debug!("Monitoring root ready at {}", self.root.display());
        Ok(())
    }
}

/// Writes per-check metric records and per-cycle summaries
pub struct MetricsRecorder {
    metrics: AppendLog<MetricRecord>,
    cycles: AppendLog<CycleSummary>,
}

impl MetricsRecorder {
    pub fn new(store: &MonitorStore) -> Self {
        Self {
            metrics: AppendLog::new(store.metrics_log_path()),
            cycles: AppendLog::new(store.cycle_log_path()),
        }
    }

    pub async fn record_metric(&self, record: &MetricRecord) -> Result<()> {
        self.metrics.append(record).await
    }

    pub async fn record_cycle(&self, summary: &CycleSummary) -> Result<()> {
        self.cycles.append(summary).await
    }

    pub fn metrics(&self) -> &AppendLog<MetricRecord> {
        &self.metrics
    }

    pub fn cycles(&self) -> &AppendLog<CycleSummary> {
        &self.cycles
    }
}
