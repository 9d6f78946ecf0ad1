use crate::DEFAULT_PASSTHROUGH_SCHEME;

use url::Url;

const FILE_SCHEME: &str = "file";

/// What the interceptor should do with a navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadIntent {
    /// Let the engine fetch it normally.
    Ignore,
    /// Read it locally and hand the bytes to the engine session.
    InterceptAndStream,
}

/// Decides whether a navigation target must be served locally.
///
/// Called on the navigation thread, so implementations must not block.
pub trait LoadIntentClassifier: Send + Sync + 'static {
    fn classify(&self, uri: &str) -> LoadIntent;
}

/// Intercepts `file:` and passthrough-scheme URIs; everything else, including
/// loopback `http(s)` already served by the asset server, is ignored.
#[derive(Debug, Clone)]
pub struct SchemeClassifier {
    passthrough_scheme: String,
}

impl SchemeClassifier {
    pub fn new(passthrough_scheme: impl Into<String>) -> Self {
        Self {
            passthrough_scheme: passthrough_scheme.into(),
        }
    }

    pub fn passthrough_scheme(&self) -> &str {
        &self.passthrough_scheme
    }
}

impl Default for SchemeClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_PASSTHROUGH_SCHEME)
    }
}

impl LoadIntentClassifier for SchemeClassifier {
    fn classify(&self, uri: &str) -> LoadIntent {
        let uri = uri.trim();
        if uri.is_empty() {
            return LoadIntent::Ignore;
        }

        let Ok(parsed) = Url::parse(uri) else {
            // No parseable scheme: only the bare passthrough marker is ours.
            let marker = format!("{}://", self.passthrough_scheme);
            return if uri.starts_with(&marker) {
                LoadIntent::InterceptAndStream
            } else {
                LoadIntent::Ignore
            };
        };

        let scheme = parsed.scheme();
        if scheme.eq_ignore_ascii_case(&self.passthrough_scheme)
            || scheme.eq_ignore_ascii_case(FILE_SCHEME)
        {
            LoadIntent::InterceptAndStream
        } else {
            LoadIntent::Ignore
        }
    }
}
