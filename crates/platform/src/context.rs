//! Platform context and the `Platform` handle

use std::sync::Arc;

use vernal_events::{EventEmitter, EventSender};

use crate::process::{HostProcessOperations, ProcessOperations};

/// Context for platform operations, carrying the event channel
#[derive(Clone, Debug, Default)]
pub struct PlatformContext {
    event_sender: Option<EventSender>,
}

impl PlatformContext {
    #[must_use]
    pub fn new(event_sender: Option<EventSender>) -> Self {
        Self { event_sender }
    }
}

impl EventEmitter for PlatformContext {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

/// Main platform abstraction providing access to process execution
#[derive(Clone)]
pub struct Platform {
    process_ops: Arc<dyn ProcessOperations>,
}

impl Platform {
    #[must_use]
    pub fn new(process_ops: Arc<dyn ProcessOperations>) -> Self {
        Self { process_ops }
    }

    /// The platform of the running host
    #[must_use]
    pub fn current() -> Self {
        Self::new(Arc::new(HostProcessOperations::new()))
    }

    /// Access process operations
    #[must_use]
    pub fn process(&self) -> Arc<dyn ProcessOperations> {
        Arc::clone(&self.process_ops)
    }
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}
