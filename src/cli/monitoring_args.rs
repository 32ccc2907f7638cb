// Monitoring configuration arguments
// Copyright (C) 2025 The Vault Sentinel Authors
// Licensed under GPL-3.0

use crate::Result;
use crate::error::MonitorError;
use crate::monitor::{MonitorConfig, MonitorStore};
use clap::Args;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_FILE: &str = "vault-sentinel.toml";

/// Options shared by every subcommand
#[derive(Args, Debug, Clone)]
pub struct MonitoringArgs {
    /// Monitoring configuration file (TOML format)
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        global = true,
        default_value = DEFAULT_CONFIG_FILE
    )]
    pub config: PathBuf,

    /// Monitoring root for alert, metric and cycle logs (overrides storage_root)
    #[arg(long = "root", value_name = "DIR", global = true)]
    pub root: Option<PathBuf>,
}

impl Default for MonitoringArgs {
    fn default() -> Self {
        Self {
            config: PathBuf::from(DEFAULT_CONFIG_FILE),
            root: None,
        }
    }
}

impl MonitoringArgs {
    /// Load the configuration file. A missing file is a configuration error;
    /// only `init` creates one.
    pub fn load_config(&self) -> Result<MonitorConfig> {
        if !self.config.exists() {
            return Err(MonitorError::config(format!(
                "Config file {} not found (run `vault-sentinel init` to create one)",
                self.config.display()
            )));
        }

        let mut config = MonitorConfig::from_file(&self.config)?;

        if let Some(root) = &self.root {
            config.monitoring.storage_root = root.clone();
        }

        Ok(config)
    }

    pub fn store(&self, config: &MonitorConfig) -> MonitorStore {
        MonitorStore::new(&config.monitoring.storage_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let args = MonitoringArgs {
            config: dir.path().join("absent.toml"),
            root: Some(dir.path().join("state")),
        };

        let err = args.load_config().unwrap_err();

        assert!(err.is_fatal());
        assert!(err.to_string().contains("absent.toml"));
        assert!(!dir.path().join("state").exists());
    }

    #[test]
    fn test_root_overrides_storage_root() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sentinel.toml");
        MonitorConfig::default().save_to_file(&path).unwrap();

        let args = MonitoringArgs {
            config: path,
            root: Some(dir.path().join("state")),
        };
        let config = args.load_config().unwrap();

        assert_eq!(config.monitoring.storage_root, dir.path().join("state"));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[monitoring]\ninterval = 0\n").unwrap();

        let args = MonitoringArgs {
            config: path,
            root: None,
        };

        assert!(args.load_config().unwrap_err().is_fatal());
    }
}
