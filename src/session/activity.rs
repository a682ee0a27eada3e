use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityLogEntry {
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub is_error: bool,
}

/// Append-only, newest-first activity log. Entries are mirrored to `tracing`.
#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: VecDeque<ActivityLogEntry>,
}

impl ActivityLog {
    pub fn push(&mut self, message: impl Into<String>, is_error: bool) {
        let message = message.into();
        if is_error {
            tracing::warn!(target: "grabby::activity", "{message}");
        } else {
            tracing::info!(target: "grabby::activity", "{message}");
        }
        self.entries.push_front(ActivityLogEntry {
            message,
            timestamp: Utc::now(),
            is_error,
        });
    }

    /// Newest first.
    pub fn entries(&self) -> impl Iterator<Item = &ActivityLogEntry> {
        self.entries.iter()
    }
}
