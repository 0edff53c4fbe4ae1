//! Live reload over WebSocket.
//!
//! Browsers connect to [`SOCKET_PATH`](crate::SOCKET_PATH) through the
//! injected client script. Rebuild drivers push [`ReloadMessage`]s to every
//! open connection through the [`ConnectionRegistry`].

mod message;
mod registry;
mod websocket;

pub use message::{ReloadMessage, UnknownMessage};
pub(crate) use registry::ConnectionRegistry;
pub(crate) use websocket::ws_handler;
