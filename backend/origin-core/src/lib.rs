pub mod bridge;
pub mod config;
pub mod context;
pub mod error;
pub mod interceptor;
pub mod locator;
pub mod mime;
pub mod server;
pub mod session;
pub mod virtual_path;

#[cfg(test)]
mod tests;

pub const LOOPBACK_HOST: &str = "127.0.0.1";
pub const LOOPBACK_BASE_URL: &str = const_format::concatcp!("http://", LOOPBACK_HOST);

/// Resource namespace every app-relative path is resolved under.
pub const DEFAULT_APP_BASE: &str = "bundled-app-root/";
pub const DEFAULT_DOCUMENT: &str = "index.html";
pub const DEFAULT_PASSTHROUGH_SCHEME: &str = "cdvfile";

pub const APP_FILE_PREFIX: &str = "/_app_file_";
pub const PASSTHROUGH_PREFIX: &str = "/_cdvfile_/";

pub const STREAM_CHUNK_SIZE: usize = 16 * 1024;
pub const EARLY_QUEUE_CAPACITY: usize = 256;
pub const OCTET_STREAM: &str = "application/octet-stream";
