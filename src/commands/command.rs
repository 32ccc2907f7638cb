// Command trait - Defines the interface for all command implementations
// Copyright (C) 2025 The Vault Sentinel Authors
// Licensed under GPL-3.0

use crate::Result;
use async_trait::async_trait;

/// Outcome of a successful command run, mapped to the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    /// Completed without a CRITICAL finding
    Clean,
    /// Completed and produced at least one CRITICAL finding
    Critical,
}

impl CommandStatus {
    pub fn from_critical(has_critical: bool) -> Self {
        if has_critical {
            CommandStatus::Critical
        } else {
            CommandStatus::Clean
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            CommandStatus::Clean => 0,
            CommandStatus::Critical => 2,
        }
    }
}

/// Command trait - Defines the interface for all command implementations
///
/// Each subcommand is encapsulated as an independent, testable command
/// object. A command loads what it needs from its arguments, runs, and
/// reports whether the run produced a CRITICAL finding.
#[async_trait]
pub trait Command: Send + Sync {
    /// Execute the command asynchronously
    ///
    /// # Errors
    /// Fatal conditions (invalid configuration, unwritable monitoring root)
    /// are returned as `MonitorError` and end the process with exit code 1
    async fn execute(&self) -> Result<CommandStatus>;

    /// Get a human-readable name for this command (for logging/debugging)
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CommandStatus::Clean.exit_code(), 0);
        assert_eq!(CommandStatus::Critical.exit_code(), 2);
        assert_eq!(CommandStatus::from_critical(true), CommandStatus::Critical);
        assert_eq!(CommandStatus::from_critical(false), CommandStatus::Clean);
    }
}
