// CycleCommand - Single monitoring cycle
// Copyright (C) 2025 The Vault Sentinel Authors
// Licensed under GPL-3.0

use super::{Command, CommandStatus};
use crate::Result;
use crate::cli::MonitoringArgs;
use crate::monitor::CycleRunner;
use crate::output::terminal;
use async_trait::async_trait;
use std::sync::Arc;

/// CycleCommand runs every check once, exactly as one daemon iteration
pub struct CycleCommand {
    args: MonitoringArgs,
}

impl CycleCommand {
    pub fn new(args: MonitoringArgs) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Command for CycleCommand {
    async fn execute(&self) -> Result<CommandStatus> {
        let config = self.args.load_config()?;
        let store = self.args.store(&config);
        let runner = CycleRunner::from_config(Arc::new(config), &store).await?;

        let report = runner.run_cycle().await?;
        terminal::print_cycle_report(&report);

        Ok(CommandStatus::from_critical(report.has_critical()))
    }

    fn name(&self) -> &'static str {
        "CycleCommand"
    }
}
