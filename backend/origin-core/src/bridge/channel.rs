use crate::EARLY_QUEUE_CAPACITY;
use crate::bridge::early_queue::EarlyQueue;
use crate::bridge::message::{InboundMessage, OutboundMessage, UNCORRELATED_ID};
use crate::bridge::port::{BridgePort, PortId};
use crate::config::BridgeConfig;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use serde_json::Value;

/// Invoked at most once with the command's result. The value is always `None`:
/// the page reports success or failure but no payload.
pub type ResultCallback = Box<dyn FnOnce(Option<String>) + Send + 'static>;

/// Correlated command channel to the page.
///
/// Lock order is early queue, then current port. The correlation map is never held
/// together with either, and callbacks always run with no lock held.
pub struct BridgeChannel {
    current: Mutex<Option<Arc<dyn BridgePort>>>,
    pending: Mutex<HashMap<u64, ResultCallback>>,
    early: Mutex<EarlyQueue>,
    next_id: AtomicU64,
}

impl BridgeChannel {
    pub fn new(early_queue_capacity: usize) -> Self {
        Self {
            current: Mutex::new(None),
            pending: Mutex::new(HashMap::new()),
            early: Mutex::new(EarlyQueue::new(early_queue_capacity)),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(config.early_queue_capacity)
    }

    /// Execute `code` in the page.
    ///
    /// Never blocks on the page. Without an attached port the code is queued and
    /// `on_result` fires immediately with `None`; a failed transmission also fires
    /// `on_result` with `None` and leaves no correlation entry behind.
    pub fn send<F>(&self, code: impl Into<String>, on_result: F)
    where
        F: FnOnce(Option<String>) + Send + 'static,
    {
        let code = code.into();

        let port = {
            let mut early = self.early.lock().unwrap_or_else(PoisonError::into_inner);
            match self.current_port() {
                Some(port) => port,
                None => {
                    if let Some(evicted) = early.push(code) {
                        debug!(
                            "Early queue full, dropped oldest command ({} bytes)",
                            evicted.len()
                        );
                    }
                    drop(early);
                    on_result(None);
                    return;
                }
            }
        };

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.pending_map().insert(id, Box::new(on_result));

        let message = OutboundMessage::execute(id, code);
        if let Err(e) = port.post_message(&message) {
            warn!("Failed to send command {} to port {}: {}", id, port.id(), e);
            let callback = self.pending_map().remove(&id);
            if let Some(callback) = callback {
                callback(None);
            }
        }
    }

    /// Make `port` current and flush anything queued before it existed.
    pub fn on_channel_attached(&self, port: Arc<dyn BridgePort>) {
        let id = port.id();
        let previous = self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(port);

        match previous {
            Some(previous) => info!("Bridge port {} replaced {}", id, previous.id()),
            None => info!("Bridge port {} attached", id),
        }

        self.flush_early_queue();
    }

    /// Clear the current port if it is still `port_id`.
    ///
    /// Returns `false` for a stale detach from a port that was already superseded.
    /// Outstanding callbacks are left in place and will not fire unless a result
    /// with their id arrives from the current port.
    pub fn on_channel_detached(&self, port_id: &PortId) -> bool {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        match current.as_ref() {
            Some(port) if port.id() == *port_id => {
                *current = None;
                info!("Bridge port {} detached", port_id);
                true
            }
            _ => {
                warn!("Ignoring detach from stale bridge port {}", port_id);
                false
            }
        }
    }

    /// Handle a message posted by the page through port `from`.
    ///
    /// Messages from a port other than the current one are discarded, as are
    /// results whose id has no pending callback.
    pub fn on_message(&self, from: &PortId, message: &Value) {
        if self.current_port_id().as_ref() != Some(from) {
            debug!("Discarding message from stale bridge port {}", from);
            return;
        }

        let inbound = match InboundMessage::parse(message) {
            Ok(Some(inbound)) => inbound,
            Ok(None) => {
                debug!("Ignoring bridge message: {}", message);
                return;
            }
            Err(e) => {
                warn!("Malformed bridge message: {}", e);
                return;
            }
        };

        match inbound {
            InboundMessage::Ready => {
                debug!("Bridge port {} ready", from);
                self.flush_early_queue();
            }
            InboundMessage::Result { id, ok, error } => {
                if let Some(error) = error {
                    debug!("Command {} failed in page: {}", id, error);
                } else {
                    debug!("Command {} completed (ok: {:?})", id, ok);
                }

                let callback = self.pending_map().remove(&id);
                match callback {
                    Some(callback) => callback(None),
                    None => debug!("No pending command for result id {}", id),
                }
            }
        }
    }

    /// Deliver queued commands to the current port, uncorrelated, in order.
    ///
    /// Returns how many were handed to the port.
    pub fn flush_early_queue(&self) -> usize {
        let (port, queued) = {
            let mut early = self.early.lock().unwrap_or_else(PoisonError::into_inner);
            let Some(port) = self.current_port() else {
                return 0;
            };
            (port, early.drain())
        };

        if queued.is_empty() {
            return 0;
        }

        debug!("Flushing {} early commands to port {}", queued.len(), port.id());
        let mut delivered = 0;
        for code in queued {
            match port.post_message(&OutboundMessage::execute(UNCORRELATED_ID, code)) {
                Ok(()) => delivered += 1,
                Err(e) => warn!("Failed to flush early command: {}", e),
            }
        }
        delivered
    }

    /// Drop the port, the early queue and every pending callback without invoking them.
    pub fn teardown(&self) {
        self.early
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let dropped = {
            let mut pending = self.pending_map();
            let dropped = pending.len();
            pending.clear();
            dropped
        };
        info!("Bridge torn down, {} pending commands dropped", dropped);
    }

    pub fn pending_count(&self) -> usize {
        self.pending_map().len()
    }

    pub fn queued_len(&self) -> usize {
        self.early
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn current_port_id(&self) -> Option<PortId> {
        self.current_port().map(|port| port.id())
    }

    pub fn is_attached(&self) -> bool {
        self.current_port().is_some()
    }

    fn current_port(&self) -> Option<Arc<dyn BridgePort>> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn pending_map(&self) -> MutexGuard<'_, HashMap<u64, ResultCallback>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for BridgeChannel {
    fn default() -> Self {
        Self::new(EARLY_QUEUE_CAPACITY)
    }
}
