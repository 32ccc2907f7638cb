// Window Aggregator - time-bounded counting over audit log entries
//
// Every check builds its own window from a fresh tail read; the aggregator
// never looks at the clock, callers pass `now - window_length` as the start.

use crate::monitor::source::{LogBatch, ParsedLine};
use crate::monitor::types::LogEntry;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;

/// Group key used when no grouping function is given
pub const GLOBAL_GROUP: &str = "*";

/// Entries confined to `[start, end]`, both ends inclusive
#[derive(Debug, Clone)]
pub struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    entries: Vec<LogEntry>,
    malformed: usize,
}

impl Window {
    /// Keep the well-formed lines whose timestamp lies within `[start, end]`.
    /// Malformed lines are skipped and counted.
    pub fn confine<'a, I>(lines: I, start: DateTime<Utc>, end: DateTime<Utc>) -> Self
    where
        I: IntoIterator<Item = &'a ParsedLine>,
    {
        let mut entries = Vec::new();
        let mut malformed = 0;

        for line in lines {
            match line {
                Ok(entry) if entry.timestamp >= start && entry.timestamp <= end => {
                    entries.push(entry.clone())
                }
                Ok(_) => {}
                Err(_) => malformed += 1,
            }
        }

        Self {
            start,
            end,
            entries,
            malformed,
        }
    }

    /// Window of `length` ending at `now`
    pub fn trailing(batch: &LogBatch, now: DateTime<Utc>, length: Duration) -> Self {
        Self::confine(&batch.lines, now - length, now)
    }

    /// Window covering everything in the batch up to `now`
    pub fn history(batch: &LogBatch, now: DateTime<Utc>) -> Self {
        Self::confine(&batch.lines, DateTime::<Utc>::MIN_UTC, now)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn malformed(&self) -> usize {
        self.malformed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counts produced by [`aggregate`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Aggregation {
    pub counts: BTreeMap<String, usize>,
    pub total: usize,
    /// Lines that failed to decode, reported for diagnostics only
    pub malformed: usize,
}

impl Aggregation {
    pub fn get(&self, group: &str) -> usize {
        self.counts.get(group).copied().unwrap_or(0)
    }

    /// Groups whose count is strictly greater than `limit`, in key order
    pub fn groups_above(&self, limit: u64) -> Vec<(&str, usize)> {
        self.counts
            .iter()
            .filter(|&(_, &count)| count as u64 > limit)
            .map(|(group, &count)| (group.as_str(), count))
            .collect()
    }
}

/// Count window entries matching `predicate`, keyed by `group_by`
pub fn aggregate<P, G>(window: &Window, predicate: P, group_by: G) -> Aggregation
where
    P: Fn(&LogEntry) -> bool,
    G: Fn(&LogEntry) -> String,
{
    let mut aggregation = Aggregation {
        malformed: window.malformed,
        ..Default::default()
    };

    for entry in window.entries.iter().filter(|e| predicate(e)) {
        *aggregation.counts.entry(group_by(entry)).or_insert(0) += 1;
        aggregation.total += 1;
    }

    aggregation
}

/// Count window entries matching `predicate` in a single global group
pub fn count<P>(window: &Window, predicate: P) -> usize
where
    P: Fn(&LogEntry) -> bool,
{
    aggregate(window, predicate, |_| GLOBAL_GROUP.to_string()).total
}
