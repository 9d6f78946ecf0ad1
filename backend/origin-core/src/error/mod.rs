pub mod bridge;
pub mod config;
pub mod locator;
pub mod server;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Server(#[from] server::ServerError),

    #[error(transparent)]
    Locator(#[from] locator::LocatorError),

    #[error(transparent)]
    Bridge(#[from] bridge::BridgeError),

    #[error(transparent)]
    Config(#[from] config::ConfigError),
}
