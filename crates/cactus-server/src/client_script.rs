//! Live reload client script.
//!
//! The script is appended to every HTML response and opens the live reload
//! socket. It reacts to the two [`ReloadMessage`](crate::ReloadMessage)
//! literals: `reloadPage` reloads the tab, `reloadCSS` re-fetches local
//! stylesheets by rewriting their `href` with a `cactus.reload` timestamp.

use std::path::Path;

use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::ServerError;
use crate::mime;

/// Path the client script is served from.
pub const SCRIPT_PATH: &str = "/_cactus/cactus.js";

/// Path of the live reload WebSocket endpoint.
pub const SOCKET_PATH: &str = "/_cactus/ws";

/// Markup appended to HTML responses.
pub const SCRIPT_TAG: &str = "\n\n<!-- Inserted by the Cactus development server for live reload -->\n\
                              <script src=\"/_cactus/cactus.js\"></script>\n";

/// Client script body.
pub(crate) const CLIENT_SCRIPT: &str = include_str!("../assets/cactus.js");

/// Handle GET /_cactus/cactus.js.
pub(crate) async fn get_client_script() -> Result<Response, ServerError> {
    let content_type = mime::guess(Path::new("cactus.js"))?;
    Ok(([(header::CONTENT_TYPE, content_type)], CLIENT_SCRIPT).into_response())
}
