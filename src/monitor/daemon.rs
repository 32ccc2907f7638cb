// Monitoring Daemon - Main orchestration

use crate::Result;
use crate::monitor::config::MonitorConfig;
use crate::monitor::scheduler::{CycleReport, CycleRunner};
use crate::monitor::store::MonitorStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Notify;

/// Main monitoring daemon
pub struct MonitorDaemon {
    runner: Arc<CycleRunner>,
    interval: Duration,
    channels: Vec<String>,
    running: Arc<AtomicBool>,
    wake: Arc<Notify>,
    cycles_run: AtomicU64,
}

impl MonitorDaemon {
    /// Create new monitoring daemon
    pub fn new(runner: CycleRunner, interval: Duration) -> Self {
        Self {
            runner: Arc::new(runner),
            interval,
            channels: Vec::new(),
            running: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
            cycles_run: AtomicU64::new(0),
        }
    }

    /// Build the live engine, dispatcher and store from configuration
    pub async fn from_config(config: MonitorConfig, store: MonitorStore) -> Result<Self> {
        let config = Arc::new(config);
        let runner = CycleRunner::from_config(Arc::clone(&config), &store).await?;

        let mut daemon = Self::new(runner, config.interval());
        daemon.channels = config.enabled_channels();
        Ok(daemon)
    }

    pub fn runner(&self) -> &CycleRunner {
        &self.runner
    }

    /// Start the monitoring daemon; returns once stopped
    pub async fn start(&self) -> Result<()> {
        tracing::info!("Starting vault-sentinel monitoring daemon");

        self.running.store(true, Ordering::SeqCst);

        // Setup signal handlers
        self.setup_signal_handlers()?;

        tracing::info!("Cycle interval: {}s", self.interval.as_secs());
        if !self.channels.is_empty() {
            tracing::info!("Alert channels: {}", self.channels.join(", "));
        }

        while self.running.load(Ordering::SeqCst) {
            // A started cycle always runs to completion
            match self.runner.run_cycle().await {
                Ok(report) => self.log_cycle(&report),
                Err(e) if e.is_fatal() => {
                    tracing::error!("Fatal error in monitoring cycle: {}", e);
                    self.running.store(false, Ordering::SeqCst);
                    return Err(e);
                }
                Err(e) => tracing::error!("Error in monitoring cycle: {}", e),
            }
            self.cycles_run.fetch_add(1, Ordering::SeqCst);

            if !self.running.load(Ordering::SeqCst) {
                break;
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.wake.notified() => {}
            }
        }

        tracing::info!("Monitoring daemon stopped");
        Ok(())
    }

    /// Stop the daemon after the current cycle
    pub fn stop(&self) {
        tracing::info!("Stopping monitoring daemon...");
        self.running.store(false, Ordering::SeqCst);
        self.wake.notify_one();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycles_run.load(Ordering::SeqCst)
    }

    fn log_cycle(&self, report: &CycleReport) {
        if report.delivery_failures > 0 {
            tracing::warn!(
                "{} alert deliveries failed this cycle",
                report.delivery_failures
            );
        }
    }

    /// Setup signal handlers for graceful shutdown
    fn setup_signal_handlers(&self) -> Result<()> {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let running = Arc::clone(&self.running);
        let wake = Arc::clone(&self.wake);

        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT");
                }
            }

            running.store(false, Ordering::SeqCst);
            wake.notify_one();
        });

        Ok(())
    }
}
