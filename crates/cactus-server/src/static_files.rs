//! Static file serving.
//!
//! Serves the built site from the root directory. Differences from a plain
//! file server:
//!
//! - directories serve their `index.html`
//! - top-level extensionless pages are served as `text/html`
//! - HTML responses get the live reload [`SCRIPT_TAG`] appended
//! - files are re-read on every request; conditional requests are ignored
//! - missing files render the site's own `error.html`

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::{Path as UrlPath, State};
use axum::http::{Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tracing::Level;

use crate::client_script::SCRIPT_TAG;
use crate::error::ServerError;
use crate::mime;
use crate::state::AppState;

/// File served for directory requests.
const INDEX_FILE: &str = "index.html";

/// Page rendered for missing files, relative to the root.
const ERROR_PAGE: &str = "error.html";

const HTML: &str = "text/html";

/// Create router for static file serving.
pub(crate) fn static_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(get_root))
        .route("/{*path}", get(get_path))
}

/// Handle GET /.
async fn get_root(State(state): State<Arc<AppState>>, method: Method, uri: Uri) -> Response {
    respond(&state, "", &method, &uri).await
}

/// Handle GET /{path}.
async fn get_path(
    UrlPath(path): UrlPath<String>,
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
) -> Response {
    respond(&state, &path, &method, &uri).await
}

/// Serve a request path and log the outcome.
async fn respond(state: &AppState, request_path: &str, method: &Method, uri: &Uri) -> Response {
    let response = match serve_file(state, request_path, uri).await {
        Ok(response) => response,
        Err(ServerError::NotFound(_)) => not_found(&state.root).await,
        Err(err) => err.into_response(),
    };

    log_request(response.status(), method, uri);
    response
}

/// Resolve a request path and build the file response.
async fn serve_file(state: &AppState, request_path: &str, uri: &Uri) -> Result<Response, ServerError> {
    let mut path = resolve(&state.root, request_path)?;

    let metadata = tokio::fs::metadata(&path)
        .await
        .map_err(|e| lookup_error(e, request_path))?;
    if metadata.is_dir() {
        if !request_path.is_empty() && !request_path.ends_with('/') {
            return Ok(redirect_with_slash(uri));
        }
        path.push(INDEX_FILE);
    }

    // Symlinks may point anywhere; only targets under the root are served
    let path = tokio::fs::canonicalize(&path)
        .await
        .map_err(|e| lookup_error(e, request_path))?;
    if !path.starts_with(&state.root) {
        return Err(ServerError::Forbidden(request_path.to_owned()));
    }
    if !tokio::fs::metadata(&path).await?.is_file() {
        return Err(ServerError::Forbidden(request_path.to_owned()));
    }

    let content_type = content_type(state, request_path, &path)?;
    let mut body = tokio::fs::read(&path).await?;
    if content_type == HTML {
        body.extend_from_slice(SCRIPT_TAG.as_bytes());
    }

    Ok(([(header::CONTENT_TYPE, content_type)], body).into_response())
}

/// Join a request path onto the root, rejecting anything that climbs out.
fn resolve(root: &Path, request_path: &str) -> Result<PathBuf, ServerError> {
    let relative = Path::new(request_path);
    let escapes = relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(ServerError::Forbidden(request_path.to_owned()));
    }
    Ok(root.join(relative))
}

/// Content type for a resolved file.
///
/// The forced-HTML check uses the request path, not the resolved file.
fn content_type(state: &AppState, request_path: &str, file: &Path) -> Result<String, ServerError> {
    if state.forced_html.contains(request_path) {
        return Ok(HTML.to_owned());
    }
    Ok(mime::guess(file)?)
}

/// Map a filesystem lookup failure to a response error.
fn lookup_error(err: io::Error, request_path: &str) -> ServerError {
    match err.kind() {
        // InvalidInput covers paths the OS cannot represent, such as embedded NULs
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory | io::ErrorKind::InvalidInput => {
            ServerError::NotFound(request_path.to_owned())
        }
        io::ErrorKind::PermissionDenied => ServerError::Forbidden(request_path.to_owned()),
        _ => ServerError::Io(err),
    }
}

/// Redirect a directory request to its canonical form with a trailing slash.
fn redirect_with_slash(uri: &Uri) -> Response {
    let location = match uri.query() {
        Some(query) => format!("{}/?{query}", uri.path()),
        None => format!("{}/", uri.path()),
    };
    (StatusCode::MOVED_PERMANENTLY, [(header::LOCATION, location)]).into_response()
}

/// Render the site's error page, or a plain 404 when it has none.
async fn not_found(root: &Path) -> Response {
    match tokio::fs::read(root.join(ERROR_PAGE)).await {
        Ok(mut body) => {
            body.extend_from_slice(SCRIPT_TAG.as_bytes());
            (StatusCode::NOT_FOUND, [(header::CONTENT_TYPE, HTML)], body).into_response()
        }
        Err(err) => {
            tracing::debug!(error = %err, "No custom error page");
            (StatusCode::NOT_FOUND, "404: Not Found").into_response()
        }
    }
}

/// Log level for a served request.
fn level_for(status: StatusCode) -> Level {
    if status.is_server_error() {
        Level::ERROR
    } else if status.is_client_error() {
        Level::WARN
    } else {
        Level::INFO
    }
}

/// Log a served request at a level matching its status.
fn log_request(status: StatusCode, method: &Method, uri: &Uri) {
    let code = status.as_u16();
    match level_for(status) {
        Level::ERROR => tracing::error!(status = code, %method, %uri, "Served request"),
        Level::WARN => tracing::warn!(status = code, %method, %uri, "Served request"),
        _ => tracing::info!(status = code, %method, %uri, "Served request"),
    }
}
