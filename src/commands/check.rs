// CheckCommand - Run a single check on demand
// Copyright (C) 2025 The Vault Sentinel Authors
// Licensed under GPL-3.0

use super::{Command, CommandStatus};
use crate::Result;
use crate::cli::MonitoringArgs;
use crate::monitor::{CheckKind, CycleRunner};
use crate::output::terminal;
use async_trait::async_trait;
use std::sync::Arc;

/// CheckCommand runs one check with the same metric recording and alert
/// dispatch a cycle applies, without writing a cycle summary
pub struct CheckCommand {
    args: MonitoringArgs,
    check: CheckKind,
}

impl CheckCommand {
    pub fn new(args: MonitoringArgs, check: CheckKind) -> Self {
        Self { args, check }
    }

    pub fn check(&self) -> CheckKind {
        self.check
    }
}

#[async_trait]
impl Command for CheckCommand {
    async fn execute(&self) -> Result<CommandStatus> {
        let config = self.args.load_config()?;
        let store = self.args.store(&config);
        let runner = CycleRunner::from_config(Arc::new(config), &store).await?;

        let report = runner.run_check(self.check).await?;
        terminal::print_check_report(&report);

        Ok(CommandStatus::from_critical(report.has_critical()))
    }

    fn name(&self) -> &'static str {
        "CheckCommand"
    }
}
