//! Engine session seam used by the load interceptor.

/// Work that must run on the thread the engine requires for session mutation.
pub type EngineTask = Box<dyn FnOnce() + Send + 'static>;

/// Bytes to display under a given address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadCommand {
    /// The URI the navigation originally requested; shown as the page identity.
    pub uri: String,
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// Handle to the embedded engine's session.
pub trait EngineSession: Send + Sync + 'static {
    /// Display `command.data` as the document at `command.uri`.
    fn load(&self, command: LoadCommand);

    /// Run `task` on the engine thread.
    ///
    /// The default runs it inline, which suits engines without thread affinity.
    fn marshal(&self, task: EngineTask) {
        task();
    }
}
