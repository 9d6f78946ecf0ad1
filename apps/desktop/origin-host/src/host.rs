//! Wiring of the asset server, the load interceptor and the bridge for one app.

use crate::error::HostError;
use crate::host_config::HostConfig;
use crate::session::LoggingSession;

use origin_core::bridge::BridgeChannel;
use origin_core::config::CoreConfig;
use origin_core::context::CoreContext;
use origin_core::interceptor::{LoadInterceptor, PendingDecision};
use origin_core::locator::FsResourceLocator;
use origin_core::server::LocalAssetServer;
use origin_core::session::EngineSession;

use std::sync::Arc;

use log::{info, warn};
use tokio::runtime::Handle;

/// Address apps conventionally start from before the real port is known.
pub const DEFAULT_START_URL: &str = "http://localhost/";

/// Build the core context over the host's serve root.
pub fn build_context(config: CoreConfig, host_config: &HostConfig) -> CoreContext {
    let serve_root = host_config.serve_root();
    if !serve_root.is_dir() {
        warn!("Serve root {} is not a directory", serve_root.display());
    }

    let locator = FsResourceLocator::new(serve_root, config.paths.app_base.clone());
    locator.log_tree();
    CoreContext::new(config, Arc::new(locator))
}

/// Map `url` onto the running server, routing root requests to `start_page` when set.
///
/// `start_page` may be relative to the app base or an absolute location under it.
pub fn resolve_start_url(server: &LocalAssetServer, url: &str, start_page: Option<&str>) -> String {
    if let Some(start_page) = start_page {
        server.set_default_document(start_page);
    }
    server.rewrite_start_url(url)
}

/// One app's worth of local serving and page bridging.
pub struct OriginHost {
    server: LocalAssetServer,
    interceptor: LoadInterceptor,
    bridge: BridgeChannel,
    session: Arc<LoggingSession>,
}

impl OriginHost {
    pub fn new(context: Arc<CoreContext>, runtime: Handle) -> Self {
        let session = Arc::new(LoggingSession::new());
        let engine: Arc<dyn EngineSession> = session.clone();
        let bridge = BridgeChannel::from_config(&context.config().bridge);
        let interceptor = LoadInterceptor::new(Arc::clone(&context), engine, runtime);
        let server = LocalAssetServer::new(context);

        Self {
            server,
            interceptor,
            bridge,
            session,
        }
    }

    /// Start serving and return the URL the engine should open first.
    ///
    /// # Errors
    ///
    /// Returns [`HostError::Core`] if the asset server cannot bind.
    pub async fn start(&self, start_url: &str) -> Result<String, HostError> {
        let binding = self.server.start().await?;
        let start_page = self.server.context().config().paths.start_page.clone();
        let resolved = resolve_start_url(&self.server, start_url, start_page.as_deref());

        info!("Serving app from {}", binding.base_url());
        info!("Start URL {} -> {}", start_url, resolved);
        Ok(resolved)
    }

    /// Offer a navigation to the interceptor; `None` means let the engine handle it.
    pub fn navigate(&self, uri: &str) -> Option<PendingDecision> {
        let rewritten = self.server.rewrite_uri(uri);
        self.interceptor.on_load_request(&rewritten)
    }

    /// Stop serving and drop all bridge state.
    pub async fn shutdown(&self) {
        self.server.stop().await;
        self.bridge.teardown();
        info!(
            "Host shut down after {} local loads",
            self.session.load_count()
        );
    }

    pub fn server(&self) -> &LocalAssetServer {
        &self.server
    }

    pub fn bridge(&self) -> &BridgeChannel {
        &self.bridge
    }

    pub fn session(&self) -> &Arc<LoggingSession> {
        &self.session
    }
}
