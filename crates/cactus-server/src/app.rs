//! Router construction.
//!
//! Builds the axum router with all routes and middleware.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower::ServiceBuilder;

use crate::client_script::{self, SCRIPT_PATH, SOCKET_PATH};
use crate::live_reload;
use crate::middleware::cache;
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
///
/// # Arguments
///
/// * `state` - Shared application state
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(SOCKET_PATH, get(live_reload::ws_handler))
        .route(SCRIPT_PATH, get(client_script::get_client_script))
        .merge(static_files::static_router())
        .layer(
            ServiceBuilder::new()
                .layer(cache::no_cache_layer())
                .layer(cache::expires_layer()),
        )
        .with_state(state)
}
