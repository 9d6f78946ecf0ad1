//! Request line parsing.

use thiserror::Error as ThisError;

/// Errors that produce `400 Bad Request`.
#[derive(Debug, Clone, PartialEq, Eq, ThisError)]
pub enum RequestLineError {
    #[error("empty request line")]
    Empty,

    #[error("malformed request line: {0}")]
    Malformed(String),
}

/// `METHOD SP PATH SP VERSION`; the version is kept but never used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    pub method: String,
    pub path: String,
    pub version: Option<String>,
}

impl RequestLine {
    pub fn parse(line: &str) -> Result<Self, RequestLineError> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Err(RequestLineError::Empty);
        }

        let mut parts = line.splitn(3, ' ');
        let method = parts.next().unwrap_or_default();
        let path = parts.next().unwrap_or_default();

        if method.is_empty() || path.is_empty() {
            return Err(RequestLineError::Malformed(line.to_string()));
        }

        Ok(Self {
            method: method.to_string(),
            path: path.to_string(),
            version: parts.next().map(str::to_string),
        })
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}
