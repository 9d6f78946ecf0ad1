//! Response head serialization.

use common::HttpStatusCode;

/// Status line plus headers, serialized with CRLF line endings.
///
/// Every head carries `Access-Control-Allow-Origin: *` and `Connection: close`: the
/// engine treats the loopback server as its own origin, and each connection serves
/// exactly one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    status: HttpStatusCode,
    content_type: String,
    content_length: Option<u64>,
}

impl ResponseHead {
    pub fn new(status: HttpStatusCode, content_type: impl Into<String>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            content_length: None,
        }
    }

    pub fn with_content_length(mut self, length: Option<u64>) -> Self {
        self.content_length = length;
        self
    }

    pub fn status(&self) -> HttpStatusCode {
        self.status
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut head = String::with_capacity(160);
        head.push_str(&self.status.status_line());
        head.push_str("\r\n");
        head.push_str(&format!("Content-Type: {}\r\n", self.content_type));
        if let Some(length) = self.content_length {
            head.push_str(&format!("Content-Length: {length}\r\n"));
        }
        head.push_str("Access-Control-Allow-Origin: *\r\n");
        head.push_str("Connection: close\r\n\r\n");
        head.into_bytes()
    }
}
