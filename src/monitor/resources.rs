// Host resource sampling for the performance check
//
// CPU and memory are measured for the monitored server process through
// sysinfo; disk usage is measured on the volume holding its data directory.

use crate::Result;
use crate::error::MonitorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

const CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(500);

/// Resource utilisation in percent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
}

/// Source of resource utilisation figures
#[async_trait]
pub trait ResourceSampler: Send + Sync {
    async fn sample(&self) -> Result<ResourceSample>;

    fn source_name(&self) -> &str {
        "Host metrics"
    }
}

/// sysinfo/statvfs sampler
pub struct SystemResourceSampler {
    process_name: String,
    data_volume: PathBuf,
    timeout: Duration,
}

impl SystemResourceSampler {
    pub fn new(process_name: impl Into<String>, data_volume: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            process_name: process_name.into(),
            data_volume: data_volume.into(),
            timeout,
        }
    }

    async fn sample_inner(&self) -> Result<ResourceSample> {
        let name = self.process_name.clone();
        let usage = tokio::task::spawn_blocking(move || sample_process(&name)).await?;
        let (cpu_percent, memory_percent) = usage.ok_or_else(|| {
            MonitorError::unavailable(
                self.source_name(),
                format!("process '{}' not found", self.process_name),
            )
        })?;

        let volume = self.data_volume.clone();
        let disk_percent = tokio::task::spawn_blocking(move || disk_usage_percent(&volume)).await??;

        Ok(ResourceSample {
            cpu_percent,
            memory_percent,
            disk_percent,
        })
    }
}

#[async_trait]
impl ResourceSampler for SystemResourceSampler {
    async fn sample(&self) -> Result<ResourceSample> {
        match tokio::time::timeout(self.timeout, self.sample_inner()).await {
            Ok(Ok(sample)) => Ok(sample),
            Ok(Err(e @ MonitorError::SourceUnavailable { .. })) => Err(e),
            Ok(Err(e)) => Err(MonitorError::unavailable(self.source_name(), e)),
            Err(_) => Err(MonitorError::unavailable(
                self.source_name(),
                format!("sampling exceeded {:?}", self.timeout),
            )),
        }
    }
}

fn process_refresh() -> ProcessRefreshKind {
    ProcessRefreshKind::nothing().with_cpu().with_memory()
}

/// CPU and memory percent of the first process named `name`, lowest pid first.
/// Blocks for the CPU sampling interval.
fn sample_process(name: &str) -> Option<(f64, f64)> {
    let mut system = System::new();
    system.refresh_memory();
    system.refresh_processes_specifics(ProcessesToUpdate::All, true, process_refresh());

    let pid = find_process(&system, name)?;

    // cpu_usage is a delta between two refreshes of the same process
    std::thread::sleep(CPU_SAMPLE_INTERVAL.max(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL));
    system.refresh_processes_specifics(ProcessesToUpdate::Some(&[pid]), true, process_refresh());

    process_usage(&system, pid)
}

fn find_process(system: &System, name: &str) -> Option<Pid> {
    system
        .processes_by_exact_name(OsStr::new(name))
        .map(|process| process.pid())
        .min()
}

fn process_usage(system: &System, pid: Pid) -> Option<(f64, f64)> {
    let process = system.process(pid)?;
    let cpu_percent = f64::from(process.cpu_usage());
    let memory_percent = percent(process.memory(), system.total_memory());
    Some((cpu_percent, memory_percent))
}

fn disk_usage_percent(volume: &Path) -> Result<f64> {
    let stat = nix::sys::statvfs::statvfs(volume)?;
    let used = (stat.blocks() as u64).saturating_sub(stat.blocks_free() as u64);
    let usable = used + stat.blocks_available() as u64;
    Ok(percent(used, usable))
}

fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
