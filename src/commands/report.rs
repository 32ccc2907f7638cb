// ReportCommand - Daily/weekly/monthly report generation
// Copyright (C) 2025 The Vault Sentinel Authors
// Licensed under GPL-3.0

use super::{Command, CommandStatus};
use crate::Result;
use crate::cli::MonitoringArgs;
use crate::output::report::{ReportFormat, ReportGenerator, ReportPeriod};
use crate::output::terminal;
use async_trait::async_trait;
use chrono::Utc;

/// ReportCommand renders the persisted logs for one period
pub struct ReportCommand {
    args: MonitoringArgs,
    period: ReportPeriod,
    format: ReportFormat,
}

impl ReportCommand {
    pub fn new(args: MonitoringArgs, period: ReportPeriod, format: ReportFormat) -> Self {
        Self {
            args,
            period,
            format,
        }
    }
}

#[async_trait]
impl Command for ReportCommand {
    async fn execute(&self) -> Result<CommandStatus> {
        let config = self.args.load_config()?;
        let store = self.args.store(&config);
        store.init().await?;

        let generator = ReportGenerator::new(store);
        let paths = generator.generate(self.period, self.format, Utc::now()).await?;
        terminal::print_written_files(&paths);

        Ok(CommandStatus::Clean)
    }

    fn name(&self) -> &'static str {
        "ReportCommand"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_report_on_empty_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.toml");
        crate::monitor::MonitorConfig::default().save_to_file(&path).unwrap();
        let args = MonitoringArgs {
            config: path,
            root: Some(dir.path().join("state")),
        };

        let status = ReportCommand::new(args, ReportPeriod::Daily, ReportFormat::Both)
            .execute()
            .await
            .unwrap();

        assert_eq!(status, CommandStatus::Clean);
        let written: Vec<_> = std::fs::read_dir(dir.path().join("state").join("reports"))
            .unwrap()
            .collect();
        assert_eq!(written.len(), 2);
    }
}
