use common::ErrorLocation;

use origin_core::error::CoreError;
use origin_core::error::config::ConfigError;
use origin_core::error::server::ServerError;

use std::panic::Location;

use thiserror::Error;

/// Errors surfaced by the host binary.
///
/// Core failures are flattened to a message so the host can report them alongside its
/// own, while keeping the location where the host observed them.
#[derive(Debug, Error)]
pub enum HostError {
    /// Error from this app
    #[error("Host Error: {message} {location}")]
    Host {
        message: String,
        location: ErrorLocation,
    },

    /// Error from origin-core (config, server, locator, bridge)
    #[error("Core Error: {message} {location}")]
    Core {
        message: String,
        location: ErrorLocation,
    },
}

impl From<CoreError> for HostError {
    #[track_caller]
    fn from(error: CoreError) -> Self {
        HostError::Core {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<ServerError> for HostError {
    #[track_caller]
    fn from(error: ServerError) -> Self {
        HostError::from(CoreError::from(error))
    }
}

impl From<ConfigError> for HostError {
    #[track_caller]
    fn from(error: ConfigError) -> Self {
        HostError::from(CoreError::from(error))
    }
}
