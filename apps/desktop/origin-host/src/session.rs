//! Engine stand-ins for running the host without an embedded browser.
//!
//! [`LoggingSession`] records what would have been displayed; [`LoggingPort`] logs
//! outbound bridge commands. Both are what a real engine integration replaces.

use origin_core::bridge::{BridgePort, OutboundMessage, PortId};
use origin_core::error::bridge::BridgeError;
use origin_core::session::{EngineSession, LoadCommand};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use log::info;

/// Logs every load and remembers the last address displayed.
#[derive(Debug, Default)]
pub struct LoggingSession {
    loads: AtomicUsize,
    current_uri: Mutex<Option<String>>,
}

impl LoggingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn current_uri(&self) -> Option<String> {
        self.current_uri
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl EngineSession for LoggingSession {
    fn load(&self, command: LoadCommand) {
        info!(
            "Engine load: {} ({} bytes, {})",
            command.uri,
            command.data.len(),
            command.mime_type
        );
        self.loads.fetch_add(1, Ordering::SeqCst);
        *self
            .current_uri
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(command.uri);
    }
}

/// Bridge port that logs each command as the JSON the page would receive.
#[derive(Debug, Default)]
pub struct LoggingPort {
    id: PortId,
    posted: AtomicUsize,
}

impl LoggingPort {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn posted(&self) -> usize {
        self.posted.load(Ordering::SeqCst)
    }
}

impl BridgePort for LoggingPort {
    fn id(&self) -> PortId {
        self.id
    }

    fn post_message(&self, message: &OutboundMessage) -> Result<(), BridgeError> {
        let json = message.to_json()?;
        info!("Bridge -> page [{}]: {}", self.id, json);
        self.posted.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
