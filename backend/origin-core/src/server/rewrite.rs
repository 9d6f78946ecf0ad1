//! Navigation URL rewriting onto a running server's origin.

use crate::server::binding::ServerBinding;
use crate::virtual_path::VirtualPathResolver;
use crate::{DEFAULT_DOCUMENT, PASSTHROUGH_PREFIX};

use log::debug;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

/// Everything except the characters a URI component may carry unescaped.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Rewrite a location under the app base onto `binding`; other input is returned unchanged.
pub fn rewrite_file_uri(
    uri: &str,
    binding: &ServerBinding,
    resolver: &VirtualPathResolver,
) -> String {
    match resolver.rewrite_absolute_to_virtual(uri) {
        Some(virtual_path) => {
            let rewritten = binding.url_for(&virtual_path);
            debug!("Rewrote {} -> {}", uri, rewritten);
            rewritten
        }
        None => uri.to_string(),
    }
}

/// Rewrite a navigation target onto `binding`.
///
/// - `javascript:` URLs are never touched
/// - loopback `http(s)` URLs move onto the server's port, `/` becoming `/index.html`
/// - `<passthrough_scheme>://` URIs are percent-encoded under `/_cdvfile_/`
/// - locations under the app base go through [`rewrite_file_uri`]
///
/// Anything else is returned unchanged.
pub fn rewrite_uri(
    url: &str,
    binding: &ServerBinding,
    resolver: &VirtualPathResolver,
    passthrough_scheme: &str,
) -> String {
    if url.is_empty() || has_scheme(url, "javascript:") {
        return url.to_string();
    }

    if let Some(parsed) = parse_loopback(url) {
        let path = match parsed.path() {
            "" | "/" => DEFAULT_DOCUMENT,
            path => path,
        };
        let mut rewritten = binding.url_for(path);
        if let Some(query) = parsed.query() {
            rewritten.push('?');
            rewritten.push_str(query);
        }
        debug!("Rewrote loopback {} -> {}", url, rewritten);
        return rewritten;
    }

    if has_scheme(url, &format!("{passthrough_scheme}://")) {
        let encoded = utf8_percent_encode(url, COMPONENT).to_string();
        let rewritten = format!("{}{}{}", binding.base_url(), PASSTHROUGH_PREFIX, encoded);
        debug!("Rewrote passthrough {} -> {}", url, rewritten);
        return rewritten;
    }

    rewrite_file_uri(url, binding, resolver)
}

/// Whether `url` addresses the root document of a loopback origin.
pub(crate) fn is_loopback_root(url: &str) -> bool {
    parse_loopback(url).is_some_and(|parsed| {
        matches!(parsed.path(), "" | "/") || parsed.path() == format!("/{DEFAULT_DOCUMENT}")
    })
}

fn parse_loopback(url: &str) -> Option<Url> {
    let parsed = Url::parse(url).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    match parsed.host_str()? {
        "localhost" | "127.0.0.1" => Some(parsed),
        _ => None,
    }
}

fn has_scheme(url: &str, prefix: &str) -> bool {
    url.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
