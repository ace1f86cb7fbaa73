//! Configuration for the reactive store.

use tokio::runtime::Handle;

/// Configuration for [`crate::ReactiveStore`].
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Runtime the loader delivers completion callbacks on. `None` means
    /// the worker's own runtime, captured when the loader starts.
    pub completion_handle: Option<Handle>,
}

impl StoreConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver loader completions on the given runtime handle.
    pub fn with_completion_handle(mut self, handle: Handle) -> Self {
        self.completion_handle = Some(handle);
        self
    }
}
