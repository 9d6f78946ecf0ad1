//! Navigation interception for locally packaged content.
//!
//! When the engine is about to navigate to a `file:` or passthrough-scheme URI the
//! interceptor reads the resource off the navigation thread, hands the bytes to the
//! [`EngineSession`] under the *original* URI, and settles the navigation:
//!
//! - [`NavigationDecision::Deny`] once the bytes were dispatched (they arrive via the load command)
//! - [`NavigationDecision::Allow`] when the resource could not be read, so the engine
//!   shows its own error page instead of a blank one

mod classifier;

pub use classifier::{LoadIntent, LoadIntentClassifier, SchemeClassifier};

use crate::context::CoreContext;
use crate::error::locator::LocatorError;
use crate::mime::ensure_mime_type;
use crate::session::{EngineSession, LoadCommand};
use crate::virtual_path::ResourceLocation;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::Arc;

use log::{debug, error, warn};
use tokio::io::AsyncReadExt;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use url::Url;

/// Upper bound on the up-front buffer reservation for a declared length.
const MAX_PREALLOCATION: u64 = 4 * 1024 * 1024;

/// Outcome for an intercepted navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    Allow,
    Deny,
}

/// A navigation decision that settles when the background read finishes.
#[derive(Debug)]
pub struct PendingDecision {
    receiver: oneshot::Receiver<NavigationDecision>,
}

impl PendingDecision {
    /// Wait for the decision.
    ///
    /// A read task that vanished without answering counts as `Allow`.
    pub async fn wait(self) -> NavigationDecision {
        self.receiver.await.unwrap_or(NavigationDecision::Allow)
    }
}

/// Streams intercepted navigations into the engine session.
pub struct LoadInterceptor {
    context: Arc<CoreContext>,
    session: Arc<dyn EngineSession>,
    classifier: Arc<dyn LoadIntentClassifier>,
    runtime: Handle,
}

impl LoadInterceptor {
    /// Build an interceptor using a [`SchemeClassifier`] for the configured passthrough scheme.
    pub fn new(context: Arc<CoreContext>, session: Arc<dyn EngineSession>, runtime: Handle) -> Self {
        let classifier = SchemeClassifier::new(context.config().paths.passthrough_scheme.clone());
        Self::with_classifier(context, session, Arc::new(classifier), runtime)
    }

    pub fn with_classifier(
        context: Arc<CoreContext>,
        session: Arc<dyn EngineSession>,
        classifier: Arc<dyn LoadIntentClassifier>,
        runtime: Handle,
    ) -> Self {
        Self {
            context,
            session,
            classifier,
            runtime,
        }
    }

    pub fn classify(&self, uri: &str) -> LoadIntent {
        self.classifier.classify(uri)
    }

    /// React to an outgoing navigation.
    ///
    /// Returns `None` when the navigation should proceed untouched. Otherwise the
    /// read is spawned on the runtime and this returns immediately; the returned
    /// [`PendingDecision`] settles exactly once.
    pub fn on_load_request(&self, uri: &str) -> Option<PendingDecision> {
        if self.classify(uri) == LoadIntent::Ignore {
            return None;
        }

        debug!("Intercepting load of {}", uri);
        let (sender, receiver) = oneshot::channel();
        let context = Arc::clone(&self.context);
        let session = Arc::clone(&self.session);
        let original_uri = uri.to_string();

        self.runtime.spawn(async move {
            let decision = match stream_to_session(&context, session, original_uri.clone()).await {
                Ok(()) => NavigationDecision::Deny,
                Err(e) => {
                    warn!("Local load failed for {}: {}", original_uri, e);
                    NavigationDecision::Allow
                }
            };
            if sender.send(decision).is_err() {
                debug!("Navigation for {} was abandoned before it settled", original_uri);
            }
        });

        Some(PendingDecision { receiver })
    }
}

async fn stream_to_session(
    context: &CoreContext,
    session: Arc<dyn EngineSession>,
    original_uri: String,
) -> Result<(), LocatorError> {
    let location = ResourceLocation::new(original_uri.as_str());
    let mut resource = context.locator().open(&location).await?;

    let capacity = resource.length.unwrap_or(0).min(MAX_PREALLOCATION) as usize;
    let mut data = Vec::with_capacity(capacity);
    resource
        .reader
        .read_to_end(&mut data)
        .await
        .map_err(|e| {
            error!("Failed to read local resource {}: {}", original_uri, e);
            LocatorError::Io {
                resource: original_uri.clone(),
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            }
        })?;

    let mime_type = ensure_mime_type(
        &path_of(&original_uri),
        resource.content_type.as_deref(),
    );
    debug!(
        "Streaming {} bytes for {} as {}",
        data.len(),
        original_uri,
        mime_type
    );

    let command = LoadCommand {
        uri: original_uri,
        data,
        mime_type,
    };
    let target = Arc::clone(&session);
    session.marshal(Box::new(move || target.load(command)));
    Ok(())
}

/// Path component of `uri` without query or fragment, or `uri` itself when it does not parse.
fn path_of(uri: &str) -> String {
    Url::parse(uri).map_or_else(|_| uri.to_string(), |url| url.path().to_string())
}
