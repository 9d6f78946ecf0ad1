//! Content-type correction for packaged assets.
//!
//! Resource layers frequently report `application/octet-stream` for scripts and
//! stylesheets, and engines refuse to execute a script served with a binary type.
//! [`ensure_mime_type`] replaces missing or generic types with one guessed from
//! the file extension.

use crate::OCTET_STREAM;

/// Types that must win over the generic extension database for web content.
const WEB_MIME_TYPES: &[(&str, &str)] = &[
    ("js", "application/javascript"),
    ("mjs", "application/javascript"),
    ("cjs", "application/javascript"),
    ("ts", "application/javascript"),
    ("tsx", "application/javascript"),
    ("css", "text/css"),
    ("json", "application/json"),
    ("map", "application/json"),
    ("wasm", "application/wasm"),
    ("svg", "image/svg+xml"),
    ("woff", "font/woff"),
    ("woff2", "font/woff2"),
    ("ttf", "font/ttf"),
    ("otf", "font/otf"),
];

/// Whether `candidate` carries no usable information.
pub fn is_generic(candidate: Option<&str>) -> bool {
    match candidate.map(str::trim) {
        None | Some("") => true,
        Some(value) => value.eq_ignore_ascii_case(OCTET_STREAM),
    }
}

/// Lower-cased extension of the final segment of a decoded path.
///
/// `path` must already be free of query and fragment; `?` and `#` are treated as
/// ordinary file name characters.
pub fn extension_of(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (_, extension) = segment.rsplit_once('.')?;
    if extension.is_empty() {
        return None;
    }
    Some(extension.to_ascii_lowercase())
}

/// Guess a content type from an extension alone.
pub fn guess_from_extension(extension: &str) -> Option<String> {
    let extension = extension.to_ascii_lowercase();
    if let Some((_, mime)) = WEB_MIME_TYPES.iter().find(|(ext, _)| *ext == extension) {
        return Some((*mime).to_string());
    }
    mime_guess::from_ext(&extension)
        .first()
        .map(|mime| mime.essence_str().to_string())
}

/// Resolve the content type to serve for `path`.
///
/// A declared type that is neither missing nor `application/octet-stream` is kept.
/// Otherwise the extension decides; when it cannot, the declared type is returned
/// as-is, falling back to `application/octet-stream`.
pub fn ensure_mime_type(path: &str, declared: Option<&str>) -> String {
    if !is_generic(declared) {
        if let Some(declared) = declared {
            return declared.trim().to_string();
        }
    }

    if let Some(guessed) = extension_of(path).and_then(|ext| guess_from_extension(&ext)) {
        return guessed;
    }

    match declared.map(str::trim) {
        Some(value) if !value.is_empty() => value.to_string(),
        _ => OCTET_STREAM.to_string(),
    }
}
