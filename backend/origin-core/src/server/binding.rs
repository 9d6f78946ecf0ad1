//! Address of a running asset server.

use crate::{LOOPBACK_BASE_URL, LOOPBACK_HOST};

/// Host, port and base URL of one server lifetime.
///
/// Created by [`LocalAssetServer::start`](crate::server::LocalAssetServer::start) and
/// never modified afterwards. A restart produces a new binding; callers must not
/// assume the port survives a `stop`/`start` cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerBinding {
    host: &'static str,
    port: u16,
    base_url: String,
}

impl ServerBinding {
    pub(crate) fn new(port: u16) -> Self {
        Self {
            host: LOOPBACK_HOST,
            port,
            base_url: format!("{LOOPBACK_BASE_URL}:{port}"),
        }
    }

    pub fn host(&self) -> &str {
        self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `http://127.0.0.1:<port>`, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Join a path onto the base URL with exactly one separating `/`.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}
