//! Live-reloading development server for Cactus sites.
//!
//! This crate serves a built site directory over HTTP and pushes reload
//! notifications to connected browsers:
//!
//! - Static files from the site root, with HTML responses carrying the
//!   live reload client script
//! - The client script itself at [`SCRIPT_PATH`]
//! - A WebSocket endpoint at [`SOCKET_PATH`] for reload notifications
//!
//! # Quick Start
//!
//! ```ignore
//! use std::path::PathBuf;
//! use cactus_server::{Server, ServerConfig};
//!
//! let server = Server::new(ServerConfig {
//!     root: PathBuf::from(".build"),
//!     ..ServerConfig::default()
//! })?;
//!
//! // Hand the handle to whatever notices source changes
//! let handle = server.handle();
//! std::thread::spawn(move || {
//!     // ...after a rebuild:
//!     handle.reload_page();
//! });
//!
//! // Blocks until `ServerHandle::stop` or Ctrl-C
//! server.start()?;
//! ```
//!
//! # Architecture
//!
//! ```text
//! Browser ──HTTP──► axum server (current-thread runtime)
//!    ▲                   │
//!    │                   ├─► /_cactus/cactus.js  (client script)
//!    │                   ├─► /_cactus/ws         (WebSocket, ConnectionRegistry)
//!    │                   └─► /*                  (static files + script injection)
//!    │
//!    └── reloadPage / reloadCSS ◄── ConnectionRegistry ◄── ServerHandle ◄── watcher thread
//! ```

mod app;
mod client_script;
mod error;
mod forced_html;
mod live_reload;
mod middleware;
mod mime;
mod state;
mod static_files;

use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::watch;

use forced_html::ForcedHtmlPaths;
use live_reload::ConnectionRegistry;
use state::AppState;

pub use client_script::{SCRIPT_PATH, SCRIPT_TAG, SOCKET_PATH};
pub use error::ServerError;
pub use live_reload::{ReloadMessage, UnknownMessage};
pub use mime::MimeError;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host address to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Directory to serve.
    pub root: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8000,
            root: PathBuf::from(".build"),
        }
    }
}

/// Development server.
///
/// Construction inspects the root directory; serving starts with
/// [`Server::start`] or [`Server::serve`].
pub struct Server {
    config: ServerConfig,
    state: Arc<AppState>,
    handle: ServerHandle,
}

impl Server {
    /// Create a server for the configured root directory.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Root`] if the root directory cannot be read.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let root_error = |source| ServerError::Root {
            path: config.root.clone(),
            source,
        };
        let root = config.root.canonicalize().map_err(root_error)?;
        let forced_html = ForcedHtmlPaths::scan(&root).map_err(root_error)?;
        tracing::debug!(root = %root.display(), forced_html = forced_html.len(), "Scanned site root");

        let registry = Arc::new(ConnectionRegistry::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let state = Arc::new(AppState {
            root,
            forced_html,
            registry: Arc::clone(&registry),
            shutdown: shutdown_rx,
        });

        Ok(Self {
            config,
            state,
            handle: ServerHandle {
                registry,
                shutdown: Arc::new(shutdown_tx),
            },
        })
    }

    /// Handle for reloading browsers and stopping the server from any thread.
    #[must_use]
    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    /// The application router.
    #[must_use]
    pub fn router(&self) -> Router {
        app::create_router(Arc::clone(&self.state))
    }

    /// Bind and serve on a new current-thread runtime.
    ///
    /// Blocks the calling thread until the server stops.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the port cannot be bound.
    pub fn start(self) -> Result<(), ServerError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.serve())
    }

    /// Bind and serve on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the port cannot be bound.
    pub async fn serve(self) -> Result<(), ServerError> {
        let host = self.config.host.as_str();
        let port = self.config.port;
        let listener = TcpListener::bind((host, port))
            .await
            .map_err(|source| ServerError::Bind {
                addr: format!("{host}:{port}"),
                source,
            })?;

        self.serve_on(listener).await
    }

    /// Serve on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting connections fails.
    pub async fn serve_on(self, listener: TcpListener) -> Result<(), ServerError> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, root = %self.state.root.display(), "Starting server");

        let app = self.router();
        let stopped = self.handle.shutdown.subscribe();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal(stopped))
            .await?;

        tracing::info!("Server stopped");
        Ok(())
    }
}

/// Wait for [`ServerHandle::stop`] or Ctrl-C.
async fn shutdown_signal(mut stopped: watch::Receiver<bool>) {
    let stop = async {
        while !*stopped.borrow_and_update() {
            if stopped.changed().await.is_err() {
                break;
            }
        }
    };

    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler available; rely on `stop` alone
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = stop => {}
        () = ctrl_c => {}
    }
    tracing::info!("Shutdown requested, stopping server...");
}

/// Cloneable handle to a [`Server`].
///
/// All methods may be called from any thread, before, during, or after
/// serving.
#[derive(Clone, Debug)]
pub struct ServerHandle {
    registry: Arc<ConnectionRegistry>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl ServerHandle {
    /// Tell every connected browser to reload the page.
    pub fn reload_page(&self) {
        self.registry.broadcast(ReloadMessage::Page);
    }

    /// Tell every connected browser to refresh its stylesheets.
    pub fn reload_css(&self) {
        self.registry.broadcast(ReloadMessage::Css);
    }

    /// Ask the server to stop.
    ///
    /// Best effort: the listener stops accepting and live reload sockets
    /// close, but in-flight requests are not awaited by the caller.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    /// Number of open live reload connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::net::SocketAddr;
    use std::time::Duration;

    use futures::{SinkExt, StreamExt};
    use tokio::net::TcpStream;
    use tokio_tungstenite::tungstenite;
    use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn site() -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        fs::write(temp_dir.path().join("index.html"), "<h1>Home</h1>").unwrap();
        temp_dir
    }

    /// Serve `root` on an ephemeral port.
    async fn spawn_server(
        root: &std::path::Path,
    ) -> (
        SocketAddr,
        ServerHandle,
        tokio::task::JoinHandle<Result<(), ServerError>>,
    ) {
        let server = Server::new(ServerConfig {
            root: root.to_path_buf(),
            ..ServerConfig::default()
        })
        .unwrap();
        let handle = server.handle();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(server.serve_on(listener));
        (addr, handle, task)
    }

    async fn connect(addr: SocketAddr) -> Client {
        let url = format!("ws://{addr}{SOCKET_PATH}");
        let (client, _) = tokio_tungstenite::connect_async(url).await.unwrap();
        client
    }

    /// Wait until the registry holds exactly `count` connections.
    async fn wait_for_connections(handle: &ServerHandle, count: usize) {
        tokio::time::timeout(TIMEOUT, async {
            while handle.connection_count() != count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    async fn next_text(client: &mut Client) -> String {
        let message = tokio::time::timeout(TIMEOUT, client.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        message.to_text().unwrap().to_owned()
    }

    #[tokio::test]
    async fn test_reload_reaches_open_connections_only() {
        let site = site();
        let (addr, handle, task) = spawn_server(site.path()).await;

        let mut first = connect(addr).await;
        let mut second = connect(addr).await;
        wait_for_connections(&handle, 2).await;

        handle.reload_css();
        assert_eq!(next_text(&mut first).await, "reloadCSS");
        assert_eq!(next_text(&mut second).await, "reloadCSS");

        first.close(None).await.unwrap();
        wait_for_connections(&handle, 1).await;

        handle.reload_page();
        assert_eq!(next_text(&mut second).await, "reloadPage");

        handle.stop();
        tokio::time::timeout(TIMEOUT, task).await.unwrap().unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_client_messages_are_ignored() {
        let site = site();
        let (addr, handle, task) = spawn_server(site.path()).await;

        let mut client = connect(addr).await;
        wait_for_connections(&handle, 1).await;

        client
            .send(tungstenite::Message::text("reloadPage"))
            .await
            .unwrap();
        handle.reload_css();
        assert_eq!(next_text(&mut client).await, "reloadCSS");
        assert_eq!(handle.connection_count(), 1);

        handle.stop();
        tokio::time::timeout(TIMEOUT, task).await.unwrap().unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_stop_closes_live_reload_connections() {
        let site = site();
        let (addr, handle, task) = spawn_server(site.path()).await;

        let mut client = connect(addr).await;
        wait_for_connections(&handle, 1).await;

        handle.stop();
        tokio::time::timeout(TIMEOUT, task).await.unwrap().unwrap().unwrap();

        let closed = tokio::time::timeout(TIMEOUT, async {
            loop {
                match client.next().await {
                    Some(Ok(tungstenite::Message::Close(_)) | Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        })
        .await;
        assert!(closed.is_ok());
        wait_for_connections(&handle, 0).await;
    }

    #[tokio::test]
    async fn test_stop_before_serving() {
        let site = site();
        let server = Server::new(ServerConfig {
            root: site.path().to_path_buf(),
            ..ServerConfig::default()
        })
        .unwrap();
        server.handle().stop();

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        tokio::time::timeout(TIMEOUT, server.serve_on(listener))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_reload_without_connections() {
        let site = site();
        let server = Server::new(ServerConfig {
            root: site.path().to_path_buf(),
            ..ServerConfig::default()
        })
        .unwrap();
        let handle = server.handle();

        handle.reload_page();
        handle.reload_css();

        assert_eq!(handle.connection_count(), 0);
    }

    #[tokio::test]
    async fn test_bind_failure_is_reported() {
        let site = site();
        let occupied = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = occupied.local_addr().unwrap().port();

        let server = Server::new(ServerConfig {
            host: "127.0.0.1".to_owned(),
            port,
            root: site.path().to_path_buf(),
        })
        .unwrap();

        let err = server.serve().await.unwrap_err();
        assert!(matches!(err, ServerError::Bind { .. }), "got {err:?}");
    }

    #[test]
    fn test_missing_root_is_reported() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = Server::new(ServerConfig {
            root: temp_dir.path().join("missing"),
            ..ServerConfig::default()
        });

        assert!(matches!(result, Err(ServerError::Root { .. })));
    }

    #[test]
    fn test_handle_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ServerHandle>();
    }
}
