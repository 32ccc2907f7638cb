// TestAlertCommand - Alert channel connectivity test
// Copyright (C) 2025 The Vault Sentinel Authors
// Licensed under GPL-3.0

use super::{Command, CommandStatus};
use crate::Result;
use crate::cli::MonitoringArgs;
use crate::error::MonitorError;
use crate::monitor::AlertDispatcher;
use crate::monitor::checks::local_hostname;
use crate::output::terminal;
use async_trait::async_trait;
use tracing::info;

/// TestAlertCommand sends a test alert through every configured channel
pub struct TestAlertCommand {
    args: MonitoringArgs,
}

impl TestAlertCommand {
    pub fn new(args: MonitoringArgs) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Command for TestAlertCommand {
    async fn execute(&self) -> Result<CommandStatus> {
        let config = self.args.load_config()?;
        let store = self.args.store(&config);

        info!("Testing alert channels...");
        let dispatcher = AlertDispatcher::from_config(&config, &store)?;
        let results = dispatcher.test_channels(&local_hostname()).await;
        terminal::print_channel_results(&results);

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        if failed > 0 {
            return Err(MonitorError::delivery(
                "test-alert",
                format!("{} of {} channels failed", failed, results.len()),
            ));
        }

        Ok(CommandStatus::Clean)
    }

    fn name(&self) -> &'static str {
        "TestAlertCommand"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_channels_configured() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.toml");
        crate::monitor::MonitorConfig::default().save_to_file(&path).unwrap();
        let args = MonitoringArgs {
            config: path,
            root: Some(dir.path().join("state")),
        };

        let status = TestAlertCommand::new(args).execute().await.unwrap();

        assert_eq!(status, CommandStatus::Clean);
    }
}
