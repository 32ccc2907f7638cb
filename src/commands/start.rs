// StartCommand - Long-running monitoring daemon
// Copyright (C) 2025 The Vault Sentinel Authors
// Licensed under GPL-3.0

use super::{Command, CommandStatus};
use crate::Result;
use crate::cli::MonitoringArgs;
use crate::monitor::MonitorDaemon;
use async_trait::async_trait;
use tracing::info;

/// StartCommand runs cycles at the configured interval until SIGINT/SIGTERM
pub struct StartCommand {
    args: MonitoringArgs,
}

impl StartCommand {
    pub fn new(args: MonitoringArgs) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Command for StartCommand {
    async fn execute(&self) -> Result<CommandStatus> {
        let config = self.args.load_config()?;
        let store = self.args.store(&config);

        info!("Monitoring root: {}", store.root().display());
        let daemon = MonitorDaemon::from_config(config, store).await?;
        daemon.start().await?;

        Ok(CommandStatus::Clean)
    }

    fn name(&self) -> &'static str {
        "StartCommand"
    }
}
