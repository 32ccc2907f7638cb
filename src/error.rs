// Error types for vault-sentinel
//
// Structured error taxonomy using thiserror. Only `ConfigInvalid` and local
// storage failures are fatal; everything else is turned into findings or log
// lines by the caller.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Main error type for monitoring operations
#[derive(Debug, Error)]
pub enum MonitorError {
    /// A monitored dependency (status endpoint, audit log, host metrics) could not be reached
    #[error("{source_name} unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// Malformed log line, snapshot or document
    #[error("Parse error: {message}")]
    Parse { message: String },

    /// An alert channel failed to deliver
    #[error("Delivery via {channel} failed: {reason}")]
    ChannelDelivery { channel: String, reason: String },

    /// Missing or invalid configuration, fatal at startup
    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    /// Operation exceeded its time bound
    #[error("Operation timed out after {duration:?}")]
    Timeout { duration: Duration },

    /// Generic I/O error
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// File system error with the offending path
    #[error("File system error: {path}: {source}")]
    FileSystem {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Reqwest HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Report template errors
    #[error("Template render error: {0}")]
    Template(String),

    /// Email construction or SMTP errors
    #[error("Email error: {0}")]
    Email(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl MonitorError {
    /// Build a `SourceUnavailable` error
    pub fn unavailable(source_name: impl Into<String>, reason: impl ToString) -> Self {
        MonitorError::SourceUnavailable {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    /// Build a `ConfigInvalid` error
    pub fn config(message: impl Into<String>) -> Self {
        MonitorError::ConfigInvalid {
            message: message.into(),
        }
    }

    /// Build a `ChannelDelivery` error
    pub fn delivery(channel: impl Into<String>, reason: impl ToString) -> Self {
        MonitorError::ChannelDelivery {
            channel: channel.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error must stop the process before the scheduler starts
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MonitorError::ConfigInvalid { .. } | MonitorError::FileSystem { .. }
        )
    }
}

/// Conversion from anyhow::Error for command-level glue
impl From<anyhow::Error> for MonitorError {
    fn from(err: anyhow::Error) -> Self {
        MonitorError::Other(err.to_string())
    }
}

impl From<toml::de::Error> for MonitorError {
    fn from(err: toml::de::Error) -> Self {
        MonitorError::ConfigInvalid {
            message: format!("Failed to parse TOML config: {}", err),
        }
    }
}

impl From<toml::ser::Error> for MonitorError {
    fn from(err: toml::ser::Error) -> Self {
        MonitorError::Other(format!("Failed to serialize config: {}", err))
    }
}

impl From<tokio::time::error::Elapsed> for MonitorError {
    fn from(_err: tokio::time::error::Elapsed) -> Self {
        MonitorError::Timeout {
            duration: Duration::from_secs(0), // Timeout duration unknown
        }
    }
}

impl From<tokio::task::JoinError> for MonitorError {
    fn from(err: tokio::task::JoinError) -> Self {
        MonitorError::Io {
            source: io::Error::other(format!("Task join error: {}", err)),
        }
    }
}

impl From<handlebars::RenderError> for MonitorError {
    fn from(err: handlebars::RenderError) -> Self {
        MonitorError::Template(err.to_string())
    }
}

impl From<lettre::address::AddressError> for MonitorError {
    fn from(err: lettre::address::AddressError) -> Self {
        MonitorError::Email(format!("Email address error: {}", err))
    }
}

impl From<lettre::error::Error> for MonitorError {
    fn from(err: lettre::error::Error) -> Self {
        MonitorError::Email(err.to_string())
    }
}

impl From<lettre::transport::smtp::Error> for MonitorError {
    fn from(err: lettre::transport::smtp::Error) -> Self {
        MonitorError::Email(format!("SMTP error: {}", err))
    }
}

impl From<nix::Error> for MonitorError {
    fn from(err: nix::Error) -> Self {
        MonitorError::Io {
            source: io::Error::from(err),
        }
    }
}

/// Helper macro for bailing out with a formatted `MonitorError::Other`
#[macro_export]
macro_rules! monitor_bail {
    ($msg:literal $(,)?) => {
        return Err($crate::error::MonitorError::Other($msg.to_string()))
    };
    ($fmt:expr, $($arg:tt)*) => {
        return Err($crate::error::MonitorError::Other(format!($fmt, $($arg)*)))
    };
}
