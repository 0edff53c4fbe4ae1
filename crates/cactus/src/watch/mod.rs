//! File watching for live reload.
//!
//! A dedicated thread drains `notify` events, debounces them, and tells the
//! server which kind of reload the settled changes need.

mod debouncer;

use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use cactus_config::LiveReloadConfig;
use cactus_server::{ReloadMessage, ServerHandle};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use debouncer::{Change, ChangeKind, Debouncer};

/// Watcher settings derived from the live reload configuration.
pub(crate) struct WatchSettings {
    debounce: Duration,
    css_patterns: Vec<glob::Pattern>,
}

impl WatchSettings {
    pub(crate) fn from_config(config: &LiveReloadConfig) -> Result<Self, glob::PatternError> {
        let css_patterns = config
            .css_patterns
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            debounce: Duration::from_millis(config.debounce_ms),
            css_patterns,
        })
    }

    /// Reload needed for a batch of settled changes.
    ///
    /// Stylesheet-only batches refresh CSS in place; anything else reloads
    /// the page.
    fn reload_for(&self, root: &Path, changes: &[Change]) -> Option<ReloadMessage> {
        if changes.is_empty() {
            return None;
        }

        let css_only = changes.iter().all(|c| self.is_stylesheet(root, &c.path));
        Some(if css_only {
            ReloadMessage::Css
        } else {
            ReloadMessage::Page
        })
    }

    fn is_stylesheet(&self, root: &Path, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };
        self.css_patterns.iter().any(|p| p.matches_path(relative))
    }
}

/// Watches a directory and reloads connected browsers on change.
///
/// Watching stops when this value is dropped.
pub(crate) struct SiteWatcher {
    _watcher: RecommendedWatcher,
}

impl SiteWatcher {
    /// Start watching `dir` recursively.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be watched.
    pub(crate) fn start(
        dir: &Path,
        settings: WatchSettings,
        handle: ServerHandle,
    ) -> Result<Self, notify::Error> {
        let root = dir.canonicalize()?;
        let (tx, rx) = mpsc::channel();

        let mut watcher = notify::recommended_watcher(tx)?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        // Exits once the watcher is dropped and the channel disconnects
        thread::Builder::new()
            .name("cactus-watch".to_owned())
            .spawn(move || run(&rx, &root, &settings, &handle))?;

        Ok(Self { _watcher: watcher })
    }
}

/// Watcher thread loop.
fn run(
    events: &Receiver<notify::Result<Event>>,
    root: &Path,
    settings: &WatchSettings,
    handle: &ServerHandle,
) {
    let mut debouncer = Debouncer::new(settings.debounce);

    loop {
        let received = match debouncer.next_timeout() {
            Some(timeout) => events.recv_timeout(timeout),
            None => events.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(Ok(event)) => record_event(&event, &mut debouncer),
            Ok(Err(err)) => tracing::warn!(error = %err, "File watcher error"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }

        let changes = debouncer.drain_ready();
        for change in &changes {
            tracing::debug!(path = %change.path.display(), kind = ?change.kind, "File changed");
        }

        match settings.reload_for(root, &changes) {
            Some(ReloadMessage::Css) => handle.reload_css(),
            Some(ReloadMessage::Page) => handle.reload_page(),
            None => {}
        }
    }

    tracing::debug!("File watcher stopped");
}

/// Record a raw filesystem event into the debouncer.
fn record_event(event: &Event, debouncer: &mut Debouncer) {
    let Some(kind) = change_kind(event.kind) else {
        return;
    };

    for path in &event.paths {
        debouncer.record(path.clone(), kind);
    }
}

fn change_kind(kind: EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}
