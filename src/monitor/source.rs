// Log Source Adapter - bounded tail reads of the Vault audit log

use crate::Result;
use crate::error::MonitorError;
use crate::monitor::types::{EntryKind, LogEntry, Outcome};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::Duration;

const TAIL_CHUNK_BYTES: u64 = 64 * 1024;

/// A line that could not be decoded into a [`LogEntry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedLine {
    pub reason: String,
}

/// Result of decoding one audit log line
pub type ParsedLine = std::result::Result<LogEntry, MalformedLine>;

/// The most recent lines of the audit log, decoded
#[derive(Debug, Clone, Default)]
pub struct LogBatch {
    pub lines: Vec<ParsedLine>,
}

impl LogBatch {
    pub fn new(lines: Vec<ParsedLine>) -> Self {
        Self { lines }
    }

    /// Build a batch of well-formed entries
    pub fn from_entries(entries: Vec<LogEntry>) -> Self {
        Self {
            lines: entries.into_iter().map(Ok).collect(),
        }
    }

    pub fn malformed_count(&self) -> usize {
        self.lines.iter().filter(|l| l.is_err()).count()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Source of audit log entries
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Read and decode at most `max_lines` of the most recent entries
    async fn tail(&self, max_lines: usize) -> Result<LogBatch>;

    /// Name used in findings and logs
    fn source_name(&self) -> &str {
        "Audit log"
    }
}

/// Audit log stored in a local append-only file
pub struct FileLogSource {
    path: PathBuf,
    timeout: Duration,
}

impl FileLogSource {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LogSource for FileLogSource {
    async fn tail(&self, max_lines: usize) -> Result<LogBatch> {
        let path = self.path.clone();
        let read = tokio::task::spawn_blocking(move || read_tail_lines(&path, max_lines));

        let lines = tokio::time::timeout(self.timeout, read)
            .await
            .map_err(|_| {
                MonitorError::unavailable(
                    self.source_name(),
                    format!("read of {} timed out", self.path.display()),
                )
            })??
            .map_err(|e| {
                MonitorError::unavailable(
                    self.source_name(),
                    format!("{}: {}", self.path.display(), e),
                )
            })?;

        let batch = LogBatch::new(lines.iter().map(|l| parse_audit_line(l)).collect());

        let malformed = batch.malformed_count();
        if malformed > 0 {
            tracing::debug!(
                "Skipped {} malformed audit lines in {}",
                malformed,
                self.path.display()
            );
        }

        Ok(batch)
    }
}

/// Read the last `max_lines` non-empty lines of a file, seeking from the end
pub fn read_tail_lines(path: &Path, max_lines: usize) -> std::io::Result<Vec<String>> {
    let mut file = File::open(path)?;
    let len = file.metadata()?.len();

    let mut buffer: Vec<u8> = Vec::new();
    let mut pos = len;

    // Walk backwards until we have one more non-empty line than requested
    // (the extra one may be a partial first line) or hit the start.
    while pos > 0 {
        let chunk = TAIL_CHUNK_BYTES.min(pos);
        pos -= chunk;
        file.seek(SeekFrom::Start(pos))?;

        let mut chunk_buf = vec![0u8; chunk as usize];
        file.read_exact(&mut chunk_buf)?;
        chunk_buf.extend_from_slice(&buffer);
        buffer = chunk_buf;

        if count_non_empty(&buffer) > max_lines {
            break;
        }
    }

    let text = String::from_utf8_lossy(&buffer);

    // A cut mid-file leaves a fragment in front of the first newline
    let text = match (pos > 0, text.find('\n')) {
        (true, Some(first_newline)) => &text[first_newline + 1..],
        (true, None) => "",
        (false, _) => &text[..],
    };
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();

    let skip = lines.len().saturating_sub(max_lines);
    Ok(lines[skip..].iter().map(|l| l.to_string()).collect())
}

fn count_non_empty(buffer: &[u8]) -> usize {
    buffer
        .split(|&b| b == b'\n')
        .filter(|segment| !segment.iter().all(u8::is_ascii_whitespace))
        .count()
}

#[derive(Debug, Deserialize)]
struct AuditRecord {
    time: DateTime<Utc>,
    #[serde(rename = "type")]
    record_type: String,
    #[serde(default)]
    auth: Option<AuditAuth>,
    request: Option<AuditRequest>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuditAuth {
    #[serde(default)]
    policies: Vec<String>,
    #[serde(default)]
    token_policies: Vec<String>,
    #[serde(default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuditRequest {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    operation: String,
    path: String,
    #[serde(default)]
    remote_address: Option<String>,
}

/// Decode one audit device line into a [`LogEntry`]
pub fn parse_audit_line(line: &str) -> ParsedLine {
    let record: AuditRecord = serde_json::from_str(line).map_err(|e| MalformedLine {
        reason: e.to_string(),
    })?;

    let request = record.request.ok_or_else(|| MalformedLine {
        reason: "missing request section".to_string(),
    })?;

    let mut attributes = BTreeMap::new();

    if let Some(auth) = record.auth {
        let mut policies = auth.policies;
        for policy in auth.token_policies {
            if !policies.contains(&policy) {
                policies.push(policy);
            }
        }
        attributes.insert(
            LogEntry::POLICIES.to_string(),
            serde_json::Value::from(policies),
        );
        if let Some(name) = auth.display_name {
            attributes.insert("display_name".to_string(), serde_json::Value::from(name));
        }
    }

    if let Some(id) = request.id {
        attributes.insert(LogEntry::REQUEST_ID.to_string(), serde_json::Value::from(id));
    }

    let error = record.error.filter(|e| !e.is_empty());
    let outcome = if error.is_some() {
        Outcome::Error
    } else {
        Outcome::Success
    };
    if let Some(error) = error {
        attributes.insert(LogEntry::ERROR.to_string(), serde_json::Value::from(error));
    }

    Ok(LogEntry {
        timestamp: record.time,
        kind: EntryKind::from(record.record_type.as_str()),
        path: request.path,
        operation: request.operation,
        outcome,
        source_identity: request.remote_address.filter(|a| !a.is_empty()),
        attributes,
    })
}
