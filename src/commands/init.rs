// InitCommand - Default configuration and monitoring root setup
// Copyright (C) 2025 The Vault Sentinel Authors
// Licensed under GPL-3.0

use super::{Command, CommandStatus};
use crate::Result;
use crate::cli::MonitoringArgs;
use crate::monitor::MonitorConfig;
use async_trait::async_trait;
use colored::*;
use tracing::info;

/// InitCommand writes a default configuration file when none exists and
/// creates the monitoring root. Running it twice changes nothing.
pub struct InitCommand {
    args: MonitoringArgs,
}

impl InitCommand {
    pub fn new(args: MonitoringArgs) -> Self {
        Self { args }
    }
}

#[async_trait]
impl Command for InitCommand {
    async fn execute(&self) -> Result<CommandStatus> {
        if self.args.config.exists() {
            info!("Keeping existing config {}", self.args.config.display());
        } else {
            MonitorConfig::default().save_to_file(&self.args.config)?;
            println!(
                "{} Default config written to: {}",
                "✓".green(),
                self.args.config.display()
            );
        }

        let config = self.args.load_config()?;
        let store = self.args.store(&config);
        store.init().await?;

        println!(
            "{} Monitoring root ready: {}",
            "✓".green(),
            store.root().display()
        );

        Ok(CommandStatus::Clean)
    }

    fn name(&self) -> &'static str {
        "InitCommand"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let args = MonitoringArgs {
            config: dir.path().join("sentinel.toml"),
            root: Some(dir.path().join("state")),
        };
        let command = InitCommand::new(args.clone());

        assert_eq!(command.execute().await.unwrap(), CommandStatus::Clean);
        let written = std::fs::read_to_string(&args.config).unwrap();

        assert_eq!(command.execute().await.unwrap(), CommandStatus::Clean);
        assert_eq!(std::fs::read_to_string(&args.config).unwrap(), written);
        assert!(dir.path().join("state").join("reports").is_dir());
        assert!(MonitorConfig::from_file(&args.config).is_ok());
    }

    #[tokio::test]
    async fn test_init_keeps_existing_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.toml");
        let mut config = MonitorConfig::default();
        config.monitoring.interval = 42;
        config.save_to_file(&path).unwrap();

        let args = MonitoringArgs {
            config: path.clone(),
            root: Some(dir.path().join("state")),
        };
        InitCommand::new(args).execute().await.unwrap();

        assert_eq!(MonitorConfig::from_file(&path).unwrap().monitoring.interval, 42);
    }
}
