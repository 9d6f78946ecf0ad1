//! Loopback HTTP server for packaged app content.
//!
//! The embedded engine loads the app from `http://127.0.0.1:<port>` as if it were a
//! normal origin. The server:
//!
//! - Binds an ephemeral port on `127.0.0.1` only
//! - Rejects non-loopback peers
//! - Accepts one `GET` per connection (no keep-alive)
//! - Resolves paths through the [`VirtualPathResolver`](crate::virtual_path::VirtualPathResolver)
//! - Streams the resource in 16 KiB chunks with `Access-Control-Allow-Origin: *`
//!
//! # Lifecycle
//!
//! `Stopped -> Starting -> Running -> Stopping -> Stopped`. [`LocalAssetServer::start`]
//! is a no-op while running; a restart produces a fresh binding on a new port.

mod binding;
mod connection;
mod request;
mod response;
pub(crate) mod rewrite;
mod state;

pub use binding::ServerBinding;
pub use request::{RequestLine, RequestLineError};
pub use response::ResponseHead;
pub use rewrite::{rewrite_file_uri, rewrite_uri};
pub use state::{LocalAssetServer, ServerState};
