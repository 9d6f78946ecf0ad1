use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum LocatorError {
    #[error("Not Found Error: {resource} {location}")]
    NotFound {
        resource: String,
        location: ErrorLocation,
    },

    #[error("IO Error: {resource}: {message} {location}")]
    Io {
        resource: String,
        message: String,
        location: ErrorLocation,
    },
}

impl LocatorError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LocatorError::NotFound { .. })
    }
}
