//! Resource locator seam.
//!
//! The locator is owned by the host: it turns a [`ResourceLocation`] into a byte
//! stream plus whatever length and content type it knows up front. The asset server
//! and the load interceptor only ever talk to it through [`ResourceLocator`].

mod fs;

pub use fs::FsResourceLocator;

use crate::error::locator::LocatorError;
use crate::virtual_path::ResourceLocation;

use std::fmt;

use futures_util::future::BoxFuture;
use tokio::io::AsyncRead;

/// An opened resource ready to be streamed.
pub struct OpenedResource {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    /// Byte length when known before streaming.
    pub length: Option<u64>,
    /// Content type declared by the locator, possibly generic or wrong.
    pub content_type: Option<String>,
}

impl OpenedResource {
    pub fn new(reader: Box<dyn AsyncRead + Send + Unpin>) -> Self {
        Self {
            reader,
            length: None,
            content_type: None,
        }
    }

    pub fn with_length(mut self, length: u64) -> Self {
        self.length = Some(length);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Wrap an in-memory payload; the length is always known.
    pub fn from_bytes(data: Vec<u8>) -> Self {
        let length = data.len() as u64;
        Self::new(Box::new(std::io::Cursor::new(data))).with_length(length)
    }
}

impl fmt::Debug for OpenedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenedResource")
            .field("length", &self.length)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// Opens packaged resources by location.
///
/// Implementations must distinguish "not found" ([`LocatorError::NotFound`]) from
/// read failures ([`LocatorError::Io`]); the server maps them to 404 and 500.
pub trait ResourceLocator: Send + Sync + 'static {
    fn open<'a>(
        &'a self,
        location: &'a ResourceLocation,
    ) -> BoxFuture<'a, Result<OpenedResource, LocatorError>>;
}
