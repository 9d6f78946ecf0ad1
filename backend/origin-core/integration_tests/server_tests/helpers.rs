//! Test helpers for asset server integration tests.
//!
//! - Building a site on disk and a server over it
//! - Sending raw request bytes and reading the whole response
//! - Building an HTTP client that never goes through a proxy

use origin_core::DEFAULT_APP_BASE;
use origin_core::config::CoreConfig;
use origin_core::context::CoreContext;
use origin_core::locator::FsResourceLocator;
use origin_core::server::{LocalAssetServer, ServerBinding};

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// A running server over a scratch directory. The directory lives as long as this does.
pub struct TestSite {
    pub dir: TempDir,
    pub server: LocalAssetServer,
    pub binding: ServerBinding,
}

/// Write `files` (relative path, contents) under a fresh directory.
pub fn write_site(files: &[(&str, &[u8])]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (relative, contents) in files {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, contents).expect("Failed to write site file");
    }
    dir
}

pub fn server_over(root: &Path, config: CoreConfig) -> LocalAssetServer {
    let locator = FsResourceLocator::new(root, config.paths.app_base.clone());
    let context = Arc::new(CoreContext::new(config, Arc::new(locator)));
    LocalAssetServer::new(context)
}

/// Start a server on an ephemeral port over `files`.
pub async fn start_site(files: &[(&str, &[u8])]) -> TestSite {
    let dir = write_site(files);
    let mut config = CoreConfig::default();
    config.paths.app_base = DEFAULT_APP_BASE.to_string();
    let server = server_over(dir.path(), config);
    let binding = server.start().await.expect("Failed to start asset server");
    TestSite {
        dir,
        server,
        binding,
    }
}

/// Send `request` verbatim and read until the server closes the connection.
pub async fn raw_request(port: u16, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(("127.0.0.1", port))
        .await
        .expect("Failed to connect to asset server");
    stream
        .write_all(request)
        .await
        .expect("Failed to write request");

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .await
        .expect("Failed to read response");
    response
}

/// `raw_request` for a `GET` of `path`, as text.
pub async fn get_text(port: u16, path: &str) -> String {
    let request = format!("GET {path} HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n");
    String::from_utf8_lossy(&raw_request(port, request.as_bytes()).await).into_owned()
}

/// Status code from the first line of a raw response.
pub fn status_of(response: &str) -> u16 {
    response
        .split(' ')
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or_else(|| panic!("No status line in response: {response:?}"))
}

/// Value of `name` in a raw response head, matched case-insensitively.
pub fn header_of<'a>(response: &'a str, name: &str) -> Option<&'a str> {
    let head = response.split("\r\n\r\n").next()?;
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim())
    })
}

/// Body of a raw response.
pub fn body_of(response: &str) -> &str {
    response
        .split_once("\r\n\r\n")
        .map(|(_, body)| body)
        .unwrap_or_default()
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("Failed to build HTTP client")
}
