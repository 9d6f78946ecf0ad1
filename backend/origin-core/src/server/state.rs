use crate::LOOPBACK_HOST;
use crate::context::CoreContext;
use crate::error::server::ServerError;
use crate::server::binding::ServerBinding;
use crate::server::connection::accept_loop;
use crate::server::rewrite;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::{Arc, PoisonError, RwLock};

use log::{info, warn};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

/// Lifecycle states of the asset server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

/// Resources owned while the server is running.
struct Running {
    binding: ServerBinding,
    shutdown_tx: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
}

/// Loopback HTTP server for packaged content.
///
/// `start` and `stop` are serialized by an async mutex; `state`, `binding` and the
/// rewrite helpers read lock-free snapshots and never wait on a transition.
pub struct LocalAssetServer {
    context: Arc<CoreContext>,
    lifecycle: Mutex<Option<Running>>,
    state: RwLock<ServerState>,
    binding: RwLock<Option<ServerBinding>>,
}

impl LocalAssetServer {
    pub fn new(context: Arc<CoreContext>) -> Self {
        Self {
            context,
            lifecycle: Mutex::new(None),
            state: RwLock::new(ServerState::Stopped),
            binding: RwLock::new(None),
        }
    }

    pub fn context(&self) -> &Arc<CoreContext> {
        &self.context
    }

    /// Bind the loopback listener and start accepting connections.
    ///
    /// Calling this while already running returns the existing binding.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the listener cannot be bound, and
    /// [`ServerError::Io`] if the bound address cannot be read back. The server is
    /// left `Stopped` in both cases.
    pub async fn start(&self) -> Result<ServerBinding, ServerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        if let Some(running) = lifecycle.as_ref() {
            return Ok(running.binding.clone());
        }

        self.set_state(ServerState::Starting);

        let port = self.context.config().server.port;
        let listener = match TcpListener::bind((LOOPBACK_HOST, port)).await {
            Ok(listener) => listener,
            Err(e) => {
                self.set_state(ServerState::Stopped);
                return Err(ServerError::Bind {
                    message: format!("Failed to bind {LOOPBACK_HOST}:{port}: {e}"),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let local_addr = match listener.local_addr() {
            Ok(addr) => addr,
            Err(e) => {
                self.set_state(ServerState::Stopped);
                return Err(ServerError::from(e));
            }
        };

        let binding = ServerBinding::new(local_addr.port());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let accept_task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&self.context),
            shutdown_rx,
        ));

        *lifecycle = Some(Running {
            binding: binding.clone(),
            shutdown_tx,
            accept_task,
        });
        *self.binding.write().unwrap_or_else(PoisonError::into_inner) = Some(binding.clone());
        self.set_state(ServerState::Running);

        info!("Asset server listening on {}", binding.base_url());
        Ok(binding)
    }

    /// Close the listener and cancel in-flight connections.
    ///
    /// Stopping a server that is not running is a no-op.
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        let Some(running) = lifecycle.take() else {
            return;
        };

        self.set_state(ServerState::Stopping);
        *self.binding.write().unwrap_or_else(PoisonError::into_inner) = None;

        let _ = running.shutdown_tx.send(true);
        if let Err(e) = running.accept_task.await {
            warn!("Accept loop ended abnormally: {}", e);
        }

        self.set_state(ServerState::Stopped);
        info!("Asset server on {} stopped", running.binding.base_url());
    }

    pub fn state(&self) -> ServerState {
        *self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn binding(&self) -> Option<ServerBinding> {
        self.binding
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn base_url(&self) -> Option<String> {
        self.binding().map(|binding| binding.base_url().to_string())
    }

    /// The current binding, or [`ServerError::NotRunning`] when stopped.
    pub fn running_binding(&self) -> Result<ServerBinding, ServerError> {
        self.binding().ok_or_else(|| ServerError::NotRunning {
            message: "Asset server is not running".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }

    /// Replace the default document served for `/`.
    pub fn set_default_document(&self, path: &str) {
        self.context.resolver().set_default_document(path);
    }

    /// Rewrite a location under the app base onto this server; identity otherwise.
    pub fn rewrite_file_uri(&self, uri: &str) -> String {
        match self.binding() {
            Some(binding) => rewrite::rewrite_file_uri(uri, &binding, self.context.resolver()),
            None => uri.to_string(),
        }
    }

    /// Rewrite a navigation target onto this server; identity while stopped.
    pub fn rewrite_uri(&self, url: &str) -> String {
        match self.binding() {
            Some(binding) => rewrite::rewrite_uri(
                url,
                &binding,
                self.context.resolver(),
                &self.context.config().paths.passthrough_scheme,
            ),
            None => url.to_string(),
        }
    }

    /// Like [`rewrite_uri`](Self::rewrite_uri), but loopback root requests go to the
    /// current default document so the address reflects the real start page.
    pub fn rewrite_start_url(&self, url: &str) -> String {
        let Some(binding) = self.binding() else {
            return url.to_string();
        };

        if rewrite::is_loopback_root(url) {
            let start = self.context.resolver().default_location();
            return rewrite::rewrite_file_uri(start.as_str(), &binding, self.context.resolver());
        }

        self.rewrite_uri(url)
    }

    fn set_state(&self, state: ServerState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = state;
    }
}
