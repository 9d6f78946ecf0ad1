// Shared fakes for the collaborator traits.

use crate::bridge::{BridgePort, OutboundMessage, PortId};
use crate::config::CoreConfig;
use crate::context::CoreContext;
use crate::error::bridge::BridgeError;
use crate::error::locator::LocatorError;
use crate::locator::{OpenedResource, ResourceLocator};
use crate::session::{EngineSession, EngineTask, LoadCommand};
use crate::virtual_path::ResourceLocation;

use common::ErrorLocation;

use std::collections::HashMap;
use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

enum MemoryEntry {
    File {
        data: Vec<u8>,
        content_type: Option<String>,
    },
    Broken(String),
}

/// In-memory locator keyed by exact location string.
#[derive(Default)]
pub(crate) struct MemoryLocator {
    entries: HashMap<String, MemoryEntry>,
}

impl MemoryLocator {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_file(mut self, location: &str, data: &[u8], content_type: Option<&str>) -> Self {
        self.entries.insert(
            location.to_string(),
            MemoryEntry::File {
                data: data.to_vec(),
                content_type: content_type.map(str::to_string),
            },
        );
        self
    }

    pub(crate) fn with_broken(mut self, location: &str, message: &str) -> Self {
        self.entries
            .insert(location.to_string(), MemoryEntry::Broken(message.to_string()));
        self
    }
}

impl ResourceLocator for MemoryLocator {
    fn open<'a>(
        &'a self,
        location: &'a ResourceLocation,
    ) -> BoxFuture<'a, Result<OpenedResource, LocatorError>> {
        async move {
            match self.entries.get(location.as_str()) {
                Some(MemoryEntry::File { data, content_type }) => {
                    let resource = OpenedResource::from_bytes(data.clone());
                    Ok(match content_type {
                        Some(content_type) => resource.with_content_type(content_type.clone()),
                        None => resource,
                    })
                }
                Some(MemoryEntry::Broken(message)) => Err(LocatorError::Io {
                    resource: location.to_string(),
                    message: message.clone(),
                    location: ErrorLocation::from(Location::caller()),
                }),
                None => Err(LocatorError::NotFound {
                    resource: location.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                }),
            }
        }
        .boxed()
    }
}

pub(crate) fn context_with(locator: MemoryLocator) -> Arc<CoreContext> {
    Arc::new(CoreContext::new(CoreConfig::default(), Arc::new(locator)))
}

/// Port that records every message and can be told to fail.
pub(crate) struct RecordingPort {
    id: PortId,
    sent: Mutex<Vec<OutboundMessage>>,
    failing: AtomicBool,
}

impl RecordingPort {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            id: PortId::new(),
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        })
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub(crate) fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn sent_ids(&self) -> Vec<u64> {
        self.sent().iter().map(OutboundMessage::id).collect()
    }

    pub(crate) fn sent_codes(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .map(|message| match message {
                OutboundMessage::Execute { code, .. } => code,
            })
            .collect()
    }
}

impl BridgePort for RecordingPort {
    fn id(&self) -> PortId {
        self.id
    }

    fn post_message(&self, message: &OutboundMessage) -> Result<(), BridgeError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BridgeError::Send {
                message: "port closed".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

/// Session that records loads and counts marshalled tasks.
#[derive(Default)]
pub(crate) struct RecordingSession {
    loads: Mutex<Vec<LoadCommand>>,
    marshalled: AtomicUsize,
}

impl RecordingSession {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn loads(&self) -> Vec<LoadCommand> {
        self.loads.lock().unwrap().clone()
    }

    pub(crate) fn marshalled(&self) -> usize {
        self.marshalled.load(Ordering::SeqCst)
    }
}

impl EngineSession for RecordingSession {
    fn load(&self, command: LoadCommand) {
        self.loads.lock().unwrap().push(command);
    }

    fn marshal(&self, task: EngineTask) {
        self.marshalled.fetch_add(1, Ordering::SeqCst);
        task();
    }
}

/// Records what each result callback received.
#[derive(Clone, Default)]
pub(crate) struct CallbackLog {
    calls: Arc<Mutex<Vec<(usize, Option<String>)>>>,
}

impl CallbackLog {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Callback tagged with `tag` that appends to this log.
    pub(crate) fn callback(&self, tag: usize) -> impl FnOnce(Option<String>) + Send + 'static {
        let calls = Arc::clone(&self.calls);
        move |value| calls.lock().unwrap().push((tag, value))
    }

    pub(crate) fn tags(&self) -> Vec<usize> {
        self.calls.lock().unwrap().iter().map(|(tag, _)| *tag).collect()
    }

    pub(crate) fn values(&self) -> Vec<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, value)| value.clone())
            .collect()
    }
}
