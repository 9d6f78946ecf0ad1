use crate::server_tests::helpers::{start_site, write_site};

use origin_core::config::CoreConfig;
use origin_core::context::CoreContext;
use origin_core::interceptor::{LoadInterceptor, NavigationDecision};
use origin_core::locator::FsResourceLocator;
use origin_core::session::{EngineSession, EngineTask, LoadCommand};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use tokio::runtime::Handle;

/// Session whose engine thread is a real OS thread, as in an embedded browser.
struct ThreadedSession {
    loads: Mutex<Vec<(LoadCommand, bool)>>,
    on_engine_thread: AtomicBool,
}

impl EngineSession for ThreadedSession {
    fn load(&self, command: LoadCommand) {
        let on_engine_thread = self.on_engine_thread.load(Ordering::SeqCst);
        self.loads
            .lock()
            .expect("loads lock poisoned")
            .push((command, on_engine_thread));
    }

    fn marshal(&self, task: EngineTask) {
        let flag = &self.on_engine_thread;
        thread::scope(|scope| {
            scope.spawn(|| {
                flag.store(true, Ordering::SeqCst);
                task();
                flag.store(false, Ordering::SeqCst);
            });
        });
    }
}

/// **VALUE**: Verifies a `file:` navigation is streamed from disk into the session on
/// the engine thread and the original navigation is denied.
///
/// **WHY THIS MATTERS**: Engines require session mutation on their own thread and must
/// show the address the app requested, not the resolved one.
///
/// **BUG THIS CATCHES**: Would catch `load` being called directly from the runtime
/// worker, or the resolved location replacing the requested URI.
#[tokio::test]
async fn given_file_navigation_when_intercepted_then_streamed_on_engine_thread() {
    // GIVEN: A file on disk and an interceptor over it
    let dir = write_site(&[("pages/about.html", b"<p>about</p>")]);
    let config = CoreConfig::default();
    let locator = FsResourceLocator::new(dir.path(), config.paths.app_base.clone());
    let context = Arc::new(CoreContext::new(config, Arc::new(locator)));
    let session = Arc::new(ThreadedSession {
        loads: Mutex::new(Vec::new()),
        on_engine_thread: AtomicBool::new(false),
    });
    let engine: Arc<dyn EngineSession> = session.clone();
    let interceptor = LoadInterceptor::new(context, engine, Handle::current());
    let uri = format!("file://{}", dir.path().join("pages/about.html").display());

    // WHEN: Navigating to it
    let decision = interceptor
        .on_load_request(&uri)
        .expect("file: navigation should be intercepted")
        .wait()
        .await;

    // THEN: Denied, loaded once under the requested URI, on the engine thread
    assert_eq!(decision, NavigationDecision::Deny);
    let loads = session.loads.lock().expect("loads lock poisoned");
    assert_eq!(loads.len(), 1);
    let (command, on_engine_thread) = &loads[0];
    assert_eq!(command.uri, uri);
    assert_eq!(command.data, b"<p>about</p>");
    assert_eq!(command.mime_type, "text/html");
    assert!(on_engine_thread);
}

/// **VALUE**: The interceptor and the server share one context, so pages it ignores are
/// still served.
///
/// **BUG THIS CATCHES**: Would catch loopback URLs being intercepted and double-loaded.
#[tokio::test]
async fn given_running_server_when_navigating_to_its_origin_then_not_intercepted() {
    let site = start_site(&[("index.html", b"shell")]).await;
    let session = Arc::new(ThreadedSession {
        loads: Mutex::new(Vec::new()),
        on_engine_thread: AtomicBool::new(false),
    });
    let engine: Arc<dyn EngineSession> = session.clone();
    let interceptor = LoadInterceptor::new(
        Arc::clone(site.server.context()),
        engine,
        Handle::current(),
    );

    let pending = interceptor.on_load_request(&format!("{}/index.html", site.binding.base_url()));

    assert!(pending.is_none());
    assert!(session.loads.lock().expect("loads lock poisoned").is_empty());

    site.server.stop().await;
}
