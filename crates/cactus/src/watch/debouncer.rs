//! Change debouncing.
//!
//! Editors and site builds emit bursts of events for a single save. Events
//! are coalesced per path and only released once the path has been quiet
//! for the debounce window.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Kind of filesystem change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

/// A settled change to one path.
#[derive(Clone, Debug)]
pub(crate) struct Change {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

struct Pending {
    kind: ChangeKind,
    deadline: Instant,
}

/// Per-path event debouncer.
///
/// Owned by the watcher thread, so no locking is needed.
pub(crate) struct Debouncer {
    pending: HashMap<PathBuf, Pending>,
    window: Duration,
}

impl Debouncer {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            window,
        }
    }

    /// Record a change, restarting the quiet window for its path.
    pub(crate) fn record(&mut self, path: PathBuf, kind: ChangeKind) {
        let deadline = Instant::now() + self.window;

        match self.pending.entry(path) {
            Entry::Vacant(entry) => {
                entry.insert(Pending { kind, deadline });
            }
            Entry::Occupied(mut entry) => match Self::coalesce(entry.get().kind, kind) {
                Some(kind) => {
                    *entry.get_mut() = Pending { kind, deadline };
                }
                // A file created and removed within one window never existed
                None => {
                    entry.remove();
                }
            },
        }
    }

    /// Combine a pending change with a newer one for the same path.
    fn coalesce(existing: ChangeKind, new: ChangeKind) -> Option<ChangeKind> {
        use ChangeKind::{Created, Modified, Removed};

        match (existing, new) {
            (Created, Removed) => None,
            (Created, _) => Some(Created),
            (Modified, kind) => Some(kind),
            (Removed, Created) => Some(Modified),
            (Removed, _) => Some(Removed),
        }
    }

    /// Take every change whose quiet window has elapsed.
    pub(crate) fn drain_ready(&mut self) -> Vec<Change> {
        let now = Instant::now();
        let mut ready = Vec::new();

        self.pending.retain(|path, pending| {
            if pending.deadline <= now {
                ready.push(Change {
                    path: path.clone(),
                    kind: pending.kind,
                });
                false
            } else {
                true
            }
        });

        ready
    }

    /// Time left until the earliest pending change settles.
    pub(crate) fn next_timeout(&self) -> Option<Duration> {
        let now = Instant::now();
        self.pending
            .values()
            .map(|p| p.deadline.saturating_duration_since(now))
            .min()
    }
}
