//! Command/result channel between native code and the page's content script.
//!
//! Commands travel as `{"kind":"execute","id":N,"code":"..."}`. The page answers
//! with `{"kind":"result","id":N}` and announces itself with `{"kind":"ready"}`.
//!
//! Commands issued before a port exists go to a bounded early queue (drop-oldest)
//! and are flushed with id `0` once a port attaches or reports ready. Sequence ids
//! start at 1 and are never reused, even across reconnects.

mod channel;
mod early_queue;
mod message;
mod port;

pub use channel::{BridgeChannel, ResultCallback};
pub use early_queue::EarlyQueue;
pub use message::{InboundMessage, OutboundMessage, UNCORRELATED_ID};
pub use port::{BridgePort, PortId};
