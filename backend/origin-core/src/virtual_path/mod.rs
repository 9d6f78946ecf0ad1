//! Mapping from request paths to packaged resource locations.
//!
//! Three path shapes are recognized, in priority order:
//!
//! 1. `/_cdvfile_/<percent-encoded-uri>` - opaque passthrough, decoded and returned verbatim
//! 2. `/_app_file_<relative>` - app-relative, resolved under the configured base
//! 3. anything else - the whole path, resolved under the configured base
//!
//! Empty, `/` and root `index.html` relative paths resolve to the current default
//! document, which the host may replace at any time via
//! [`VirtualPathResolver::set_default_document`].

mod location;

pub use location::ResourceLocation;

use crate::config::PathConfig;
use crate::{APP_FILE_PREFIX, DEFAULT_DOCUMENT, PASSTHROUGH_PREFIX};

use std::sync::{PoisonError, RwLock};

use log::{debug, warn};
use percent_encoding::percent_decode_str;

/// Resolves virtual request paths against a base prefix and a mutable default document.
///
/// The default document is single-writer (the host) and many-reader (connection
/// handlers and the interceptor), so it sits behind an `RwLock`.
#[derive(Debug)]
pub struct VirtualPathResolver {
    app_base: String,
    default_document: RwLock<String>,
}

impl VirtualPathResolver {
    /// Create a resolver for `app_base` (a `/` is appended when missing).
    pub fn new(app_base: impl Into<String>, default_document: impl Into<String>) -> Self {
        let mut app_base = app_base.into();
        if !app_base.ends_with('/') {
            app_base.push('/');
        }

        let default_document = normalize_relative(&default_document.into())
            .unwrap_or_else(|| DEFAULT_DOCUMENT.to_string());

        Self {
            app_base,
            default_document: RwLock::new(default_document),
        }
    }

    pub fn from_config(paths: &PathConfig) -> Self {
        let resolver = Self::new(paths.app_base.clone(), paths.default_document.clone());
        if let Some(start_page) = paths.start_page.as_deref() {
            resolver.set_default_document(start_page);
        }
        resolver
    }

    pub fn app_base(&self) -> &str {
        &self.app_base
    }

    /// Current default relative path.
    pub fn default_document(&self) -> String {
        self.default_document
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Location of the current default document.
    pub fn default_location(&self) -> ResourceLocation {
        ResourceLocation::new(format!("{}{}", self.app_base, self.default_document()))
    }

    /// Replace the default document.
    ///
    /// Accepts either a path relative to the base or an absolute location under the
    /// base. Empty input and absolute locations outside the base are ignored.
    pub fn set_default_document(&self, path: &str) {
        let path = path.trim();
        if path.is_empty() {
            return;
        }

        let relative = if let Some(rest) = path.strip_prefix(self.app_base.as_str()) {
            rest
        } else if path.contains("://") {
            warn!(
                "Ignoring default document outside {}: {}",
                self.app_base, path
            );
            return;
        } else {
            path
        };

        let relative = normalize_relative(relative).unwrap_or_else(|| DEFAULT_DOCUMENT.to_string());
        debug!("Default document set to {}", relative);

        *self
            .default_document
            .write()
            .unwrap_or_else(PoisonError::into_inner) = relative;
    }

    /// Resolve a request path (or the path part of an intercepted URI).
    ///
    /// The query is stripped before percent-decoding, so the returned location is
    /// never split again.
    ///
    /// Returns `None` when a passthrough payload is empty or not valid UTF-8 once
    /// decoded, or when a relative path fails to decode.
    pub fn resolve(&self, request_path: &str) -> Option<ResourceLocation> {
        let path = request_path
            .split_once('?')
            .map_or(request_path, |(path, _)| path);

        if let Some(encoded) = path.strip_prefix(PASSTHROUGH_PREFIX) {
            let decoded = percent_decode_str(encoded).decode_utf8().ok()?;
            if decoded.is_empty() {
                return None;
            }
            debug!("Decoding {} -> {}", path, decoded);
            return Some(ResourceLocation::new(decoded.into_owned()));
        }

        let relative = path.strip_prefix(APP_FILE_PREFIX).unwrap_or(path);
        let relative = percent_decode_str(relative).decode_utf8().ok()?;

        match normalize_relative(&relative) {
            Some(relative) if relative != DEFAULT_DOCUMENT => Some(ResourceLocation::new(
                format!("{}{}", self.app_base, relative),
            )),
            _ => Some(self.default_location()),
        }
    }

    /// Whether a failed lookup for `location` should retry against the default document.
    ///
    /// Matches the file name of the default document current at call time.
    pub fn is_default_document_request(&self, location: &ResourceLocation) -> bool {
        let segment = location.last_segment();
        segment.is_empty()
            || segment == DEFAULT_DOCUMENT
            || segment == last_segment(&self.default_document())
    }

    /// Inverse of [`resolve`](Self::resolve) for locations under the base.
    ///
    /// Returns the virtual request path (always starting with `/`), or `None` when
    /// `absolute` is outside the base.
    pub fn rewrite_absolute_to_virtual(&self, absolute: &str) -> Option<String> {
        let relative = absolute.strip_prefix(self.app_base.as_str())?;
        Some(format!("/{}", relative.trim_start_matches('/')))
    }
}

fn normalize_relative(path: &str) -> Option<String> {
    let trimmed = path.trim_start_matches('/');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
