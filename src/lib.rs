// Vault Sentinel - Security monitoring daemon for Vault clusters
// Copyright (C) 2025 The Vault Sentinel Authors
// Licensed under GPL-3.0

//! Vault Sentinel watches a Vault deployment: it tails the audit log,
//! probes the health, leader and metrics endpoints, evaluates health,
//! authentication, token, policy, performance and certificate checks,
//! and fans findings out to an alert log, email, a chat webhook and syslog.

pub mod cli;
pub mod commands;
pub mod error;
pub mod monitor;
pub mod output;

// Re-export commonly used types
pub use crate::cli::Args;
pub use crate::error::MonitorError;

/// Result type for monitoring operations
pub type Result<T> = std::result::Result<T, MonitorError>;
