//! Debouncing of raw file-system events into change batches.
//!
//! Editors and archive tools touch the same entry several times per save.
//! The debouncer folds those bursts into one change per path and releases
//! it once the path has been quiet for the configured duration.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Which leg of a change triple a path belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl ChangeKind {
    /// Fold a newer event into the pending one.
    ///
    /// Returns `None` when the two cancel out (created then removed).
    fn merge(self, newer: ChangeKind) -> Option<ChangeKind> {
        use ChangeKind::*;
        match (self, newer) {
            (Added, Removed) => None,
            (Added, _) => Some(Added),
            (Removed, Added) => Some(Modified),
            (Removed, _) => Some(Removed),
            (Modified, kind) => Some(kind),
        }
    }
}

/// Debounces change events by path.
#[derive(Debug)]
pub struct Debouncer {
    /// Pending changes: path -> (folded kind, last event timestamp).
    pending: HashMap<String, (ChangeKind, Instant)>,
    /// How long a path must be quiet before it is released.
    duration: Duration,
}

impl Debouncer {
    /// Create a new debouncer with the given duration in milliseconds.
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            duration: Duration::from_millis(debounce_ms),
        }
    }

    /// Record a change event, resetting the timer for this path.
    pub fn record(&mut self, path: String, kind: ChangeKind) {
        let now = Instant::now();
        match self.pending.remove(&path) {
            Some((previous, _)) => {
                if let Some(folded) = previous.merge(kind) {
                    self.pending.insert(path, (folded, now));
                }
            }
            None => {
                self.pending.insert(path, (kind, now));
            }
        }
    }

    /// Take every change that has been quiet for the debounce duration.
    pub fn take_ready(&mut self) -> Vec<(String, ChangeKind)> {
        let now = Instant::now();
        let mut ready = Vec::new();

        self.pending.retain(|path, (kind, last_change)| {
            if now.duration_since(*last_change) >= self.duration {
                ready.push((path.clone(), *kind));
                false
            } else {
                true
            }
        });

        ready
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
