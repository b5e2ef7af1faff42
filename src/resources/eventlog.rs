//! User-facing event log shown under the overlay.
//!
//! Every entry is also mirrored to the `log` facade so headless runs see it.

use std::collections::VecDeque;

use bevy_ecs::prelude::Resource;
use log::info;

/// Entries kept before the oldest one is dropped.
pub const EVENT_LOG_CAPACITY: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Overlay time in seconds when the entry was pushed.
    pub at: f64,
    pub message: String,
}

impl LogEntry {
    /// `[mm:ss] message`
    pub fn formatted(&self) -> String {
        let total = self.at.max(0.0) as u64;
        format!("[{:02}:{:02}] {}", total / 60, total % 60, self.message)
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct EventLog {
    entries: VecDeque<LogEntry>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, at: f64, message: impl Into<String>) {
        let entry = LogEntry {
            at,
            message: message.into(),
        };
        info!("{}", entry.formatted());
        self.entries.push_back(entry);
        while self.entries.len() > EVENT_LOG_CAPACITY {
            self.entries.pop_front();
        }
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries whose message contains `needle`.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.message.contains(needle))
            .count()
    }
}
