use crate::bridge::message::OutboundMessage;
use crate::error::bridge::BridgeError;

use std::fmt::{Display, Formatter, Result as FormatResult};

use uuid::Uuid;

/// Identity of one port connection, compared on detach and on inbound messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PortId(Uuid);

impl PortId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PortId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PortId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        write!(formatter, "{}", self.0)
    }
}

/// A duplex channel to the content script inside the page.
pub trait BridgePort: Send + Sync + 'static {
    fn id(&self) -> PortId;

    /// Hand `message` to the engine for delivery; must not block on the page.
    fn post_message(&self, message: &OutboundMessage) -> Result<(), BridgeError>;
}
