use origin_host::host::{DEFAULT_START_URL, OriginHost, build_context};
use origin_host::host_config::HostConfig;

use origin_core::config::CoreConfig;
use origin_core::context::ContextCell;
use origin_core::interceptor::NavigationDecision;
use origin_core::server::ServerState;

use std::fs;
use std::sync::Arc;

use tempfile::TempDir;
use tokio::runtime::Handle;

fn write_app(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    for (relative, contents) in files {
        let path = dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(path, contents).expect("Failed to write app file");
    }
    dir
}

fn host_over(dir: &TempDir, core_config: CoreConfig) -> OriginHost {
    let host_config = HostConfig {
        serve_root: Some(dir.path().display().to_string()),
        ..HostConfig::default()
    };
    let cell = ContextCell::new();
    let context = cell.get_or_init(|| build_context(core_config, &host_config));
    OriginHost::new(context, Handle::current())
}

/// **VALUE**: Verifies the host serves the configured start page at the URL it reports.
///
/// **WHY THIS MATTERS**: This is the whole startup path: config, context, server bind,
/// start-page routing. If the reported URL does not serve the start page, the app
/// opens on a 404.
///
/// **BUG THIS CATCHES**: Would catch:
/// - `start_page` from config not reaching the resolver
/// - The start URL pointing at `/index.html` while a different page is configured
/// - A reported base URL that does not match the bound port
#[tokio::test]
async fn given_configured_start_page_when_host_starts_then_start_url_serves_it() {
    // GIVEN: An app whose start page is not index.html
    let dir = write_app(&[("index.html", "index"), ("app/main.html", "main page")]);
    let mut core_config = CoreConfig::default();
    core_config.paths.start_page = Some("app/main.html".to_string());
    let host = host_over(&dir, core_config);

    // WHEN: Starting the host
    let start_url = host
        .start(DEFAULT_START_URL)
        .await
        .expect("Host failed to start");

    // THEN: The start URL points at the start page and serves it
    let binding = host.server().binding().expect("Server should be bound");
    assert_eq!(start_url, format!("{}/app/main.html", binding.base_url()));

    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("Failed to build HTTP client");
    let body = client
        .get(&start_url)
        .send()
        .await
        .expect("Request failed")
        .text()
        .await
        .expect("Failed to read body");
    assert_eq!(body, "main page");

    // AND: The root also serves it
    let root = client
        .get(format!("{}/", binding.base_url()))
        .send()
        .await
        .expect("Request failed")
        .text()
        .await
        .expect("Failed to read body");
    assert_eq!(root, "main page");

    host.shutdown().await;
    assert_eq!(host.server().state(), ServerState::Stopped);
}

/// **VALUE**: `file:` navigations inside the app are streamed into the engine session.
///
/// **BUG THIS CATCHES**: Would catch the host rewriting `file:` URIs it cannot serve,
/// or the interceptor not being wired to the host's session.
#[tokio::test]
async fn given_file_navigation_when_host_navigates_then_session_loads_it() {
    let dir = write_app(&[("index.html", "<p>index</p>")]);
    let host = host_over(&dir, CoreConfig::default());
    host.start(DEFAULT_START_URL).await.expect("Host failed to start");
    let uri = format!("file://{}", dir.path().join("index.html").display());

    let decision = host
        .navigate(&uri)
        .expect("file: navigation should be intercepted")
        .wait()
        .await;

    assert_eq!(decision, NavigationDecision::Deny);
    assert_eq!(host.session().load_count(), 1);
    assert_eq!(host.session().current_uri().as_deref(), Some(uri.as_str()));

    host.shutdown().await;
}

#[tokio::test]
async fn given_loopback_navigation_when_host_navigates_then_engine_handles_it() {
    let dir = write_app(&[("index.html", "<p>index</p>")]);
    let host = host_over(&dir, CoreConfig::default());
    host.start(DEFAULT_START_URL).await.expect("Host failed to start");

    let pending = host.navigate("http://localhost/index.html");

    assert!(pending.is_none());
    assert_eq!(host.session().load_count(), 0);

    host.shutdown().await;
}

/// **VALUE**: Bootstrap bridge commands survive until a port attaches and are dropped on
/// shutdown.
///
/// **BUG THIS CATCHES**: Would catch the host's bridge ignoring the configured early
/// queue capacity, or shutdown leaving state behind for the next session.
#[tokio::test]
async fn given_bridge_commands_before_attach_when_port_attaches_then_flushed() {
    let dir = write_app(&[("index.html", "<p>index</p>")]);
    let mut core_config = CoreConfig::default();
    core_config.bridge.early_queue_capacity = 2;
    let host = host_over(&dir, core_config);

    for index in 0..3 {
        host.bridge().send(format!("boot({index})"), |_| {});
    }
    assert_eq!(host.bridge().queued_len(), 2);

    let port = Arc::new(origin_host::session::LoggingPort::new());
    host.bridge().on_channel_attached(port.clone());

    assert_eq!(port.posted(), 2);
    assert_eq!(host.bridge().queued_len(), 0);

    host.shutdown().await;
    assert!(!host.bridge().is_attached());
}
