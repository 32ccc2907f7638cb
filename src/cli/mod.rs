// CLI module - Command line interface and argument parsing
// Copyright (C) 2025 The Vault Sentinel Authors
// Licensed under GPL-3.0

mod monitoring_args;

pub use monitoring_args::{DEFAULT_CONFIG_FILE, MonitoringArgs};

use crate::output::report::{ReportFormat, ReportPeriod};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Command-line arguments for vault-sentinel
#[derive(Parser, Debug, Clone)]
#[command(name = "vault-sentinel", author, version)]
#[command(about = "Security monitoring daemon for Vault clusters", long_about = None)]
pub struct Args {
    #[command(flatten)]
    pub monitoring: MonitoringArgs,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Write a default config (if absent) and create the monitoring root
    Init,

    /// Run monitoring cycles until SIGINT/SIGTERM
    Start,

    /// Run a single monitoring cycle
    Cycle,

    /// Generate a report over the persisted logs
    Report {
        #[arg(value_enum)]
        period: ReportPeriod,

        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
    },

    /// Run only the health check
    Health,

    /// Run only the authentication check
    Auth,

    /// Run only the token usage check
    Tokens,

    /// Run only the policy change check
    Policy,

    /// Run only the performance check
    Performance,

    /// Run only the certificate check
    Certificate,

    /// Send a test alert through every configured channel
    TestAlert,
}

impl Args {
    /// Log level selected by `-v`, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        match self.verbose {
            0 => None,
            1 => Some(tracing::Level::DEBUG),
            _ => Some(tracing::Level::TRACE),
        }
    }

    /// Log filter: a valid `RUST_LOG` value wins over `-v`, INFO otherwise
    pub fn log_filter(&self, rust_log: Option<&str>) -> EnvFilter {
        if let Some(directives) = rust_log.filter(|s| !s.trim().is_empty()) {
            match EnvFilter::try_new(directives) {
                Ok(filter) => return filter,
                Err(e) => eprintln!("Ignoring invalid RUST_LOG {:?}: {}", directives, e),
            }
        }

        let level = self.log_level().unwrap_or(tracing::Level::INFO);
        EnvFilter::default().add_directive(level.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["vault-sentinel", "cycle"]).unwrap();

        assert_eq!(args.command, Commands::Cycle);
        assert_eq!(args.monitoring.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert!(args.monitoring.root.is_none());
        assert!(args.log_level().is_none());
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = Args::try_parse_from([
            "vault-sentinel",
            "health",
            "--config",
            "/etc/sentinel.toml",
            "--root",
            "/var/lib/sentinel",
            "-vv",
        ])
        .unwrap();

        assert_eq!(args.monitoring.config, PathBuf::from("/etc/sentinel.toml"));
        assert_eq!(args.monitoring.root, Some(PathBuf::from("/var/lib/sentinel")));
        assert_eq!(args.log_level(), Some(tracing::Level::TRACE));
        assert_eq!(args.command, Commands::Health);
    }

    #[test]
    fn test_log_filter_prefers_rust_log() {
        use tracing_subscriber::filter::LevelFilter;

        let args = Args::try_parse_from(["vault-sentinel", "cycle", "-v"]).unwrap();

        assert_eq!(args.log_filter(None).max_level_hint(), Some(LevelFilter::DEBUG));
        assert_eq!(args.log_filter(Some("  ")).max_level_hint(), Some(LevelFilter::DEBUG));

        let filter = args.log_filter(Some("vault_sentinel=trace,reqwest=warn"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
        assert!(filter.to_string().contains("reqwest=warn"));

        let quiet = Args::try_parse_from(["vault-sentinel", "cycle"]).unwrap();
        assert_eq!(
            quiet.log_filter(Some("vault_sentinel=loud")).max_level_hint(),
            Some(LevelFilter::INFO)
        );
    }

    #[test]
    fn test_report_period_and_format() {
        let args =
            Args::try_parse_from(["vault-sentinel", "report", "weekly", "--format", "both"])
                .unwrap();

        assert_eq!(
            args.command,
            Commands::Report {
                period: ReportPeriod::Weekly,
                format: ReportFormat::Both,
            }
        );
    }

    #[test]
    fn test_report_requires_known_period() {
        assert!(Args::try_parse_from(["vault-sentinel", "report", "yearly"]).is_err());
        assert!(Args::try_parse_from(["vault-sentinel", "report"]).is_err());
    }

    #[test]
    fn test_author_attribution() {
        use clap::CommandFactory;
        assert_eq!(Args::command().get_author(), Some("The Vault Sentinel Authors"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Args::try_parse_from(["vault-sentinel"]).is_err());
    }

    #[test]
    fn test_single_check_subcommands() {
        let cases = [
            ("auth", Commands::Auth),
            ("tokens", Commands::Tokens),
            ("policy", Commands::Policy),
            ("performance", Commands::Performance),
            ("certificate", Commands::Certificate),
            ("test-alert", Commands::TestAlert),
        ];
        for (name, expected) in cases {
            let args = Args::try_parse_from(["vault-sentinel", name]).unwrap();
            assert_eq!(args.command, expected);
        }
    }
}
