//! Application state.
//!
//! Shared state for all request handlers.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;

use crate::forced_html::ForcedHtmlPaths;
use crate::live_reload::ConnectionRegistry;

/// Application state shared across all handlers.
pub(crate) struct AppState {
    /// Canonical served root directory.
    pub(crate) root: PathBuf,
    /// Top-level pages always served as HTML.
    pub(crate) forced_html: ForcedHtmlPaths,
    /// Open live reload connections.
    pub(crate) registry: Arc<ConnectionRegistry>,
    /// Flips to `true` when the server is asked to stop.
    pub(crate) shutdown: watch::Receiver<bool>,
}
