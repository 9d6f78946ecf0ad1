use crate::server_tests::helpers::{
    body_of, get_text, server_over, start_site, status_of, write_site,
};

use origin_core::config::CoreConfig;
use origin_core::error::server::ServerError;
use origin_core::server::ServerState;

use tokio::net::TcpStream;

/// **VALUE**: Verifies a started server reports a loopback binding on an ephemeral port.
///
/// **BUG THIS CATCHES**: Would catch binding to `0.0.0.0` or reporting the configured
/// port (0) instead of the bound one.
#[tokio::test]
async fn given_default_config_when_started_then_running_on_loopback() {
    let site = start_site(&[("index.html", b"hi")]).await;

    assert_eq!(site.server.state(), ServerState::Running);
    assert_eq!(site.binding.host(), "127.0.0.1");
    assert_ne!(site.binding.port(), 0);
    assert_eq!(
        site.binding.base_url(),
        format!("http://127.0.0.1:{}", site.binding.port())
    );
    assert_eq!(site.server.base_url().as_deref(), Some(site.binding.base_url()));

    site.server.stop().await;
}

/// **VALUE**: `start` while running is a no-op returning the same binding.
///
/// **BUG THIS CATCHES**: Would catch a second listener being bound, which would change
/// the origin under a page that is already loaded.
#[tokio::test]
async fn given_running_server_when_started_again_then_same_binding() {
    let site = start_site(&[("index.html", b"hi")]).await;

    let again = site.server.start().await.expect("Second start failed");

    assert_eq!(again, site.binding);
    assert_eq!(site.server.state(), ServerState::Running);

    site.server.stop().await;
}

/// **VALUE**: `stop` closes the listener and a later `start` serves again.
///
/// **WHY THIS MATTERS**: Hosts stop the server when the app is backgrounded and start it
/// on resume. Callers must re-read the base URL since the port may change.
///
/// **BUG THIS CATCHES**: Would catch a listener that survives `stop`, or a restart that
/// reuses stale shutdown state and refuses connections.
#[tokio::test]
async fn given_stopped_server_when_restarted_then_new_binding_serves() {
    // GIVEN: A running server
    let site = start_site(&[("index.html", b"hello")]).await;
    let old_port = site.binding.port();

    // WHEN: Stopping it
    site.server.stop().await;

    // THEN: It is stopped, has no binding, and refuses connections
    assert_eq!(site.server.state(), ServerState::Stopped);
    assert!(site.server.binding().is_none());
    assert!(matches!(
        site.server.running_binding(),
        Err(ServerError::NotRunning { .. })
    ));
    assert!(TcpStream::connect(("127.0.0.1", old_port)).await.is_err());

    // WHEN: Starting again
    let binding = site.server.start().await.expect("Restart failed");

    // THEN: The new binding serves content
    let response = get_text(binding.port(), "/").await;
    assert_eq!(status_of(&response), 200);
    assert_eq!(body_of(&response), "hello");

    site.server.stop().await;
}

#[tokio::test]
async fn given_stopped_server_when_stopped_again_then_no_op() {
    let site = start_site(&[("index.html", b"hi")]).await;

    site.server.stop().await;
    site.server.stop().await;

    assert_eq!(site.server.state(), ServerState::Stopped);
}

/// **VALUE**: A bind failure surfaces from `start` and leaves the server stopped.
///
/// **BUG THIS CATCHES**: Would catch a server stuck in `Starting` after a failed bind,
/// which would make every later `start` look like a no-op.
#[tokio::test]
async fn given_port_in_use_when_starting_then_bind_error_and_stopped() {
    // GIVEN: A port already taken by another listener
    let occupied = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to occupy a port");
    let port = occupied.local_addr().expect("No local addr").port();
    let dir = write_site(&[("index.html", b"hi")]);
    let mut config = CoreConfig::default();
    config.server.port = port;
    let server = server_over(dir.path(), config);

    // WHEN: Starting on that port
    let result = server.start().await;

    // THEN: Bind error, and the server is stopped with no binding
    assert!(matches!(result, Err(ServerError::Bind { .. })));
    assert_eq!(server.state(), ServerState::Stopped);
    assert!(server.binding().is_none());
}

#[tokio::test]
async fn given_stopped_server_when_rewriting_then_identity() {
    let dir = write_site(&[("index.html", b"hi")]);
    let server = server_over(dir.path(), CoreConfig::default());

    assert_eq!(
        server.rewrite_uri("http://localhost/index.html"),
        "http://localhost/index.html"
    );
    assert_eq!(
        server.rewrite_file_uri("bundled-app-root/a.html"),
        "bundled-app-root/a.html"
    );
    assert_eq!(server.rewrite_start_url("http://localhost/"), "http://localhost/");
}

/// **VALUE**: The start URL follows the configured start page once running.
///
/// **BUG THIS CATCHES**: Would catch the address bar showing `/index.html` while the
/// server actually serves a different start page.
#[tokio::test]
async fn given_start_page_when_rewriting_start_url_then_points_at_it() {
    let site = start_site(&[("index.html", b"index"), ("www/home.html", b"home")]).await;
    site.server.set_default_document("www/home.html");

    let start = site.server.rewrite_start_url("http://localhost/");
    let other = site.server.rewrite_start_url("http://localhost/about.html?tab=2");

    assert_eq!(start, format!("{}/www/home.html", site.binding.base_url()));
    assert_eq!(
        other,
        format!("{}/about.html?tab=2", site.binding.base_url())
    );
    let response = get_text(site.binding.port(), "/www/home.html").await;
    assert_eq!(body_of(&response), "home");

    site.server.stop().await;
}
