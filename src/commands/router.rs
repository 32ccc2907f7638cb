// CommandRouter - Routes CLI arguments to appropriate Command
// Copyright (C) 2025 The Vault Sentinel Authors
// Licensed under GPL-3.0

use super::{
    CheckCommand, Command, CycleCommand, InitCommand, ReportCommand, StartCommand,
    TestAlertCommand,
};
use crate::cli::{Args, Commands};
use crate::monitor::CheckKind;

/// CommandRouter determines which Command to execute based on CLI arguments
pub struct CommandRouter;

impl CommandRouter {
    /// Route CLI arguments to the appropriate Command
    ///
    /// Every subcommand maps to exactly one command; the single-check
    /// subcommands share `CheckCommand`.
    pub fn route(args: Args) -> Box<dyn Command> {
        let monitoring = args.monitoring;

        let check = match args.command {
            Commands::Init => return Box::new(InitCommand::new(monitoring)),
            Commands::Start => return Box::new(StartCommand::new(monitoring)),
            Commands::Cycle => return Box::new(CycleCommand::new(monitoring)),
            Commands::Report { period, format } => {
                return Box::new(ReportCommand::new(monitoring, period, format));
            }
            Commands::TestAlert => return Box::new(TestAlertCommand::new(monitoring)),
            Commands::Health => CheckKind::Health,
            Commands::Auth => CheckKind::Authentication,
            Commands::Tokens => CheckKind::TokenUsage,
            Commands::Policy => CheckKind::PolicyChanges,
            Commands::Performance => CheckKind::Performance,
            Commands::Certificate => CheckKind::Certificate,
        };

        Box::new(CheckCommand::new(monitoring, check))
    }
}
