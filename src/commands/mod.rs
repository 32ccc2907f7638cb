// Commands module - Command Pattern implementation
// Copyright (C) 2025 The Vault Sentinel Authors
// Licensed under GPL-3.0

mod command;
mod router;

// Individual command implementations
mod check;
mod cycle;
mod init;
mod report;
mod start;
mod test_alert;

pub use command::{Command, CommandStatus};
pub use router::CommandRouter;

// Re-export individual commands for testing purposes
pub use check::CheckCommand;
pub use cycle::CycleCommand;
pub use init::InitCommand;
pub use report::ReportCommand;
pub use start::StartCommand;
pub use test_alert::TestAlertCommand;
