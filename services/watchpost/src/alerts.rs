//! Bounded, most-recent-first feed of detection alerts

use std::collections::VecDeque;

use serde::Serialize;

use crate::models::Alert;

/// An alert together with its arrival bookkeeping
#[derive(Debug, Clone, Serialize)]
pub struct AlertEntry {
    /// Arrival sequence number, unique within a feed
    pub seq: u64,
    pub received_at_epoch_ms: u64,
    pub alert: Alert,
}

/// Alerts ordered by arrival, newest first, never longer than `capacity`
#[derive(Debug, Clone)]
pub struct AlertFeed {
    entries: VecDeque<AlertEntry>,
    capacity: usize,
    next_seq: u64,
    selected: Option<u64>,
}

impl AlertFeed {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_seq: 1,
            selected: None,
        }
    }

    /// Prepend an alert, dropping the oldest entries beyond capacity.
    ///
    /// Returns the sequence number assigned to the alert.
    pub fn push(&mut self, alert: Alert, now_ms: u64) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_front(AlertEntry {
            seq,
            received_at_epoch_ms: now_ms,
            alert,
        });
        self.entries.truncate(self.capacity);

        if let Some(selected) = self.selected {
            if !self.contains(selected) {
                self.selected = None;
            }
        }
        seq
    }

    /// Expand `seq`, or collapse it if it is already expanded.
    ///
    /// Returns whether `seq` is expanded afterwards. Unknown entries are ignored.
    pub fn toggle_selection(&mut self, seq: u64) -> bool {
        if !self.contains(seq) {
            return false;
        }
        if self.selected == Some(seq) {
            self.selected = None;
            false
        } else {
            self.selected = Some(seq);
            true
        }
    }

    pub fn selected(&self) -> Option<u64> {
        self.selected
    }

    pub fn newest_seq(&self) -> Option<u64> {
        self.entries.front().map(|e| e.seq)
    }

    pub fn contains(&self, seq: u64) -> bool {
        self.entries.iter().any(|e| e.seq == seq)
    }

    /// Entries, newest first
    pub fn iter(&self) -> impl Iterator<Item = &AlertEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.selected = None;
    }
}
