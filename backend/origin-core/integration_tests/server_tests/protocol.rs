use crate::server_tests::helpers::{
    body_of, get_text, header_of, http_client, raw_request, start_site, status_of,
};

use futures_util::future::join_all;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};

/// **VALUE**: Verifies a payload served through the asset server arrives byte-identical
/// with an exact `Content-Length`.
///
/// **WHY THIS MATTERS**: Every script, stylesheet and image of the app travels this
/// path. A short or corrupted body breaks the app in ways that are hard to trace.
///
/// **BUG THIS CATCHES**: Would catch:
/// - Chunk boundaries dropping or repeating bytes (the payload spans several 16 KiB chunks)
/// - `Content-Length` disagreeing with the bytes actually streamed
/// - The CORS header going missing
#[tokio::test]
async fn given_binary_payload_when_fetched_over_http_then_bytes_and_length_match() {
    // GIVEN: A 100 000 byte payload with a non-repeating pattern
    let payload: Vec<u8> = (0..100_000u32).map(|i| (i * 31 % 251) as u8).collect();
    let site = start_site(&[("data/blob.bin", &payload)]).await;

    // WHEN: Fetching it with an HTTP client
    let response = http_client()
        .get(format!("{}/data/blob.bin", site.binding.base_url()))
        .send()
        .await
        .expect("Request failed");

    // THEN: Status, headers and body all agree with the payload
    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.content_length(), Some(payload.len() as u64));
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|value| value.to_str().ok()),
        Some("*")
    );
    let body = response.bytes().await.expect("Failed to read body");
    assert_eq!(body.as_ref(), payload.as_slice());

    site.server.stop().await;
}

/// **VALUE**: Non-GET requests are answered with 405.
///
/// **BUG THIS CATCHES**: Would catch POST being served like GET, or the connection
/// being dropped without a status.
#[tokio::test]
async fn given_post_request_when_sent_then_405() {
    let site = start_site(&[("index.html", b"<html></html>")]).await;

    let response = raw_request(
        site.binding.port(),
        b"POST / HTTP/1.1\r\nHost: 127.0.0.1\r\nContent-Length: 0\r\n\r\n",
    )
    .await;
    let response = String::from_utf8_lossy(&response);

    assert_eq!(status_of(&response), 405);
    assert_eq!(header_of(&response, "Connection"), Some("close"));

    site.server.stop().await;
}

#[tokio::test]
async fn given_blank_request_line_when_sent_then_400() {
    let site = start_site(&[("index.html", b"<html></html>")]).await;

    let response = raw_request(site.binding.port(), b"\r\n\r\n").await;

    assert_eq!(status_of(&String::from_utf8_lossy(&response)), 400);

    site.server.stop().await;
}

#[tokio::test]
async fn given_single_token_request_line_when_sent_then_400() {
    let site = start_site(&[("index.html", b"<html></html>")]).await;

    let response = raw_request(site.binding.port(), b"GARBAGE\r\n\r\n").await;

    assert_eq!(status_of(&String::from_utf8_lossy(&response)), 400);

    site.server.stop().await;
}

#[tokio::test]
async fn given_missing_asset_when_requested_then_404() {
    let site = start_site(&[("index.html", b"<html></html>")]).await;

    let response = get_text(site.binding.port(), "/js/missing.js").await;

    assert_eq!(status_of(&response), 404);
    assert_eq!(header_of(&response, "Access-Control-Allow-Origin"), Some("*"));

    site.server.stop().await;
}

/// **VALUE**: A script with no declared type is served as JavaScript.
///
/// **WHY THIS MATTERS**: Engines refuse to run module scripts served as
/// `application/octet-stream`.
///
/// **BUG THIS CATCHES**: Would catch the MIME correction being skipped on the server path.
#[tokio::test]
async fn given_app_file_script_when_requested_then_javascript_content_type() {
    let site = start_site(&[("js/app.js", b"console.log('ready');")]).await;

    let response = get_text(site.binding.port(), "/_app_file_js/app.js").await;

    assert_eq!(status_of(&response), 200);
    let content_type = header_of(&response, "Content-Type").unwrap_or_default();
    assert!(
        content_type.contains("javascript"),
        "Expected a JavaScript type, got {content_type:?}"
    );
    assert_ne!(content_type, "application/octet-stream");
    assert_eq!(body_of(&response), "console.log('ready');");

    site.server.stop().await;
}

/// **VALUE**: Root and directory requests fall back to the current default document.
///
/// **WHY THIS MATTERS**: Single-page apps route client-side; reloading on `/` or a
/// directory-like route must still serve the app shell.
///
/// **BUG THIS CATCHES**: Would catch the fallback ignoring `set_default_document`, or
/// firing for ordinary missing assets.
#[tokio::test]
async fn given_spa_routes_when_requested_then_default_document_served() {
    // GIVEN: A site with two candidate start pages
    let site = start_site(&[
        ("index.html", b"index page"),
        ("main.html", b"main page"),
    ])
    .await;
    let port = site.binding.port();

    // THEN: Root serves index.html initially
    assert_eq!(body_of(&get_text(port, "/").await), "index page");

    // WHEN: The host switches the start page
    site.server.set_default_document("main.html");

    // THEN: Root, /index.html and directory routes serve it
    assert_eq!(body_of(&get_text(port, "/").await), "main page");
    assert_eq!(body_of(&get_text(port, "/index.html").await), "main page");
    let directory = get_text(port, "/settings/").await;
    assert_eq!(status_of(&directory), 200);
    assert_eq!(body_of(&directory), "main page");

    // AND: Ordinary missing assets still 404
    assert_eq!(status_of(&get_text(port, "/settings/app.css").await), 404);

    site.server.stop().await;
}

#[tokio::test]
async fn given_passthrough_file_uri_when_requested_then_served() {
    let site = start_site(&[("media/clip.txt", b"passthrough body")]).await;
    let uri = format!("file://{}", site.dir.path().join("media/clip.txt").display());
    let path = format!("/_cdvfile_/{}", utf8_percent_encode(&uri, NON_ALPHANUMERIC));

    let response = get_text(site.binding.port(), &path).await;

    assert_eq!(status_of(&response), 200);
    assert_eq!(body_of(&response), "passthrough body");
    assert_eq!(header_of(&response, "Content-Type"), Some("text/plain"));

    site.server.stop().await;
}

#[tokio::test]
async fn given_traversal_path_when_requested_then_404() {
    let site = start_site(&[("index.html", b"<html></html>")]).await;

    let response = get_text(site.binding.port(), "/../../etc/passwd").await;

    assert_eq!(status_of(&response), 404);

    site.server.stop().await;
}

/// **VALUE**: One misbehaving client does not affect others.
///
/// **BUG THIS CATCHES**: Would catch a handler that serializes connections, so an idle
/// client blocks everyone behind it.
#[tokio::test]
async fn given_idle_client_when_others_request_concurrently_then_all_served() {
    // GIVEN: A client that connects and never sends anything
    let site = start_site(&[("index.html", b"shell")]).await;
    let port = site.binding.port();
    let _idle = tokio::net::TcpStream::connect(("127.0.0.1", port))
        .await
        .expect("Failed to connect idle client");

    // WHEN: Ten clients request at once
    let responses = join_all((0..10).map(|_| get_text(port, "/index.html"))).await;

    // THEN: All of them succeed
    for response in responses {
        assert_eq!(status_of(&response), 200);
        assert_eq!(body_of(&response), "shell");
    }

    site.server.stop().await;
}
