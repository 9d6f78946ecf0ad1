//! Shared leaf types for the loopback origin workspace.
//!
//! ## Architecture
//!
//! - **common** (this crate): Error locations and HTTP status codes
//! - **origin-core**: Asset server, load interception and the page bridge
//! - **origin-host**: Host binary wiring everything together
//!
//! Nothing here depends on tokio or on the engine, so every crate can use it.

pub mod error;
pub mod http_status;

pub use error::error_location::ErrorLocation;
pub use http_status::HttpStatusCode;
