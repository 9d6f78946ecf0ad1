use crate::interceptor::{
    LoadIntent, LoadIntentClassifier, LoadInterceptor, NavigationDecision, SchemeClassifier,
};
use crate::session::EngineSession;
use crate::tests::support::{MemoryLocator, RecordingSession, context_with};

use std::sync::Arc;

use tokio::runtime::Handle;

fn interceptor(locator: MemoryLocator, session: Arc<RecordingSession>) -> LoadInterceptor {
    let session: Arc<dyn EngineSession> = session;
    LoadInterceptor::new(context_with(locator), session, Handle::current())
}

#[test]
fn given_uris_when_classifying_then_only_private_file_schemes_are_intercepted() {
    let classifier = SchemeClassifier::default();

    assert_eq!(
        classifier.classify("cdvfile://localhost/persistent/a.html"),
        LoadIntent::InterceptAndStream
    );
    assert_eq!(
        classifier.classify("CDVFILE://localhost/persistent/a.html"),
        LoadIntent::InterceptAndStream
    );
    assert_eq!(
        classifier.classify("file:///android_asset/www/index.html"),
        LoadIntent::InterceptAndStream
    );
    assert_eq!(
        classifier.classify("http://127.0.0.1:8080/index.html"),
        LoadIntent::Ignore
    );
    assert_eq!(classifier.classify("http://localhost/"), LoadIntent::Ignore);
    assert_eq!(classifier.classify("https://example.com/"), LoadIntent::Ignore);
    assert_eq!(classifier.classify("about:blank"), LoadIntent::Ignore);
    assert_eq!(classifier.classify(""), LoadIntent::Ignore);
}

#[test]
fn given_unparseable_uri_with_marker_when_classifying_then_intercepted() {
    let classifier = SchemeClassifier::default();

    assert_eq!(
        classifier.classify("cdvfile://[broken/a.html"),
        LoadIntent::InterceptAndStream
    );
    assert_eq!(classifier.classify("/relative/a.html"), LoadIntent::Ignore);
}

/// **VALUE**: Loopback navigations are left to the asset server.
///
/// **BUG THIS CATCHES**: Would catch the interceptor double-serving pages that already
/// come from `http://127.0.0.1`.
#[tokio::test]
async fn given_loopback_navigation_when_requested_then_not_intercepted() {
    let session = RecordingSession::new();
    let interceptor = interceptor(MemoryLocator::new(), session.clone());

    let pending = interceptor.on_load_request("http://127.0.0.1:4000/index.html");

    assert!(pending.is_none());
    assert!(session.loads().is_empty());
}

/// **VALUE**: An intercepted file is pushed to the session under the requested URI and
/// the navigation is denied.
///
/// **WHY THIS MATTERS**: The address shown by the engine must stay the one the app
/// asked for, and the original navigation must not also run.
///
/// **BUG THIS CATCHES**: Would catch the resolved location leaking into the load
/// command, a generic content type, or a missing marshal onto the engine thread.
#[tokio::test]
async fn given_readable_file_when_intercepted_then_loaded_and_denied() {
    // GIVEN: A file the locator can serve without a declared type
    let uri = "file:///app/www/index.html";
    let locator = MemoryLocator::new().with_file(uri, b"<h1>hi</h1>", None);
    let session = RecordingSession::new();
    let interceptor = interceptor(locator, session.clone());

    // WHEN: The engine navigates to it
    let decision = interceptor.on_load_request(uri).unwrap().wait().await;

    // THEN: The navigation is denied and the bytes were loaded under the original URI
    assert_eq!(decision, NavigationDecision::Deny);
    let loads = session.loads();
    assert_eq!(loads.len(), 1);
    assert_eq!(loads[0].uri, uri);
    assert_eq!(loads[0].data, b"<h1>hi</h1>");
    assert_eq!(loads[0].mime_type, "text/html");
    assert_eq!(session.marshalled(), 1);
}

#[tokio::test]
async fn given_declared_type_when_intercepted_then_declared_type_is_used() {
    let uri = "cdvfile://localhost/persistent/page";
    let locator = MemoryLocator::new().with_file(uri, b"{}", Some("application/json"));
    let session = RecordingSession::new();
    let interceptor = interceptor(locator, session.clone());

    let decision = interceptor.on_load_request(uri).unwrap().wait().await;

    assert_eq!(decision, NavigationDecision::Deny);
    assert_eq!(session.loads()[0].mime_type, "application/json");
}

/// **VALUE**: The content type comes from the URI's path, not its query.
///
/// **BUG THIS CATCHES**: Would catch a cache-busting `?v=2` hiding the `.js`
/// extension and the script arriving as `application/octet-stream`.
#[tokio::test]
async fn given_uri_with_query_when_intercepted_then_type_from_path() {
    let uri = "file:///app/www/js/app.js?v=2";
    let locator = MemoryLocator::new().with_file(uri, b"run();", None);
    let session = RecordingSession::new();
    let interceptor = interceptor(locator, session.clone());

    let decision = interceptor.on_load_request(uri).unwrap().wait().await;

    assert_eq!(decision, NavigationDecision::Deny);
    assert_eq!(session.loads()[0].uri, uri);
    assert_eq!(session.loads()[0].mime_type, "application/javascript");
}

/// **VALUE**: A missing file lets the original navigation proceed.
///
/// **WHY THIS MATTERS**: Denying here would leave a silent blank page; allowing lets the
/// engine show its own error page.
///
/// **BUG THIS CATCHES**: Would catch a decision that defaults to `Deny`.
#[tokio::test]
async fn given_missing_file_when_intercepted_then_allowed_and_nothing_loaded() {
    let session = RecordingSession::new();
    let interceptor = interceptor(MemoryLocator::new(), session.clone());

    let decision = interceptor
        .on_load_request("file:///app/www/missing.html")
        .unwrap()
        .wait()
        .await;

    assert_eq!(decision, NavigationDecision::Allow);
    assert!(session.loads().is_empty());
    assert_eq!(session.marshalled(), 0);
}

#[tokio::test]
async fn given_read_failure_when_intercepted_then_allowed() {
    let uri = "file:///app/www/locked.html";
    let locator = MemoryLocator::new().with_broken(uri, "permission denied");
    let session = RecordingSession::new();
    let interceptor = interceptor(locator, session.clone());

    let decision = interceptor.on_load_request(uri).unwrap().wait().await;

    assert_eq!(decision, NavigationDecision::Allow);
    assert!(session.loads().is_empty());
}

struct EverythingClassifier;

impl LoadIntentClassifier for EverythingClassifier {
    fn classify(&self, _uri: &str) -> LoadIntent {
        LoadIntent::InterceptAndStream
    }
}

#[tokio::test]
async fn given_custom_classifier_when_requested_then_it_decides() {
    let uri = "https://cdn.example.com/lib.js";
    let locator = MemoryLocator::new().with_file(uri, b"void 0;", None);
    let session = RecordingSession::new();
    let engine: Arc<dyn EngineSession> = session.clone();
    let interceptor = LoadInterceptor::with_classifier(
        context_with(locator),
        engine,
        Arc::new(EverythingClassifier),
        Handle::current(),
    );

    let decision = interceptor.on_load_request(uri).unwrap().wait().await;

    assert_eq!(decision, NavigationDecision::Deny);
    assert_eq!(session.loads()[0].mime_type, "application/javascript");
}
