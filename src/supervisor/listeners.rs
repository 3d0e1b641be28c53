// src/supervisor/listeners.rs

//! Per-launch lifecycle listeners.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use crate::descriptor::ProcessDescriptor;
use crate::supervisor::ProcessHandle;
use crate::types::LifecycleEvent;

/// Cleanup callback: `(event, descriptor)`. The descriptor is the snapshot
/// taken when the listeners were attached.
pub type CleanupHandler = Arc<dyn Fn(LifecycleEvent, &ProcessDescriptor) + Send + Sync>;

/// A listener set of one launch.
///
/// Lives inside that launch's supervising task, so it is dropped together
/// with the process. Every set of a launch shares the handle's listening
/// flag: `detach` (on `kill`, or once the terminal event has fired)
/// silences all of them.
pub struct ListenerSet {
    events: Vec<LifecycleEvent>,
    handler: CleanupHandler,
    snapshot: ProcessDescriptor,
    handle: ProcessHandle,
}

impl ListenerSet {
    /// The full event set, attached when a launch starts.
    pub fn attach(handle: ProcessHandle, snapshot: ProcessDescriptor, handler: CleanupHandler) -> Self {
        let set = Self::for_events(handle, snapshot, &LifecycleEvent::ALL, handler);
        set.handle.set_listening(true);
        set
    }

    /// A set restricted to `events`, for handlers added to a running launch.
    /// Duplicates are ignored.
    pub fn for_events(
        handle: ProcessHandle,
        snapshot: ProcessDescriptor,
        events: &[LifecycleEvent],
        handler: CleanupHandler,
    ) -> Self {
        let mut unique = Vec::with_capacity(events.len());
        for &event in events {
            if !unique.contains(&event) {
                debug!(name = %snapshot.name, pid = handle.pid(), %event, "listening");
                unique.push(event);
            }
        }
        Self {
            events: unique,
            handler,
            snapshot,
            handle,
        }
    }

    pub fn events(&self) -> &[LifecycleEvent] {
        &self.events
    }

    /// Invoke the cleanup handler for `event`. Returns whether it ran.
    pub fn fire(&self, event: LifecycleEvent) -> bool {
        if !self.handle.is_listening() {
            debug!(name = %self.snapshot.name, %event, "listeners detached; event dropped");
            return false;
        }
        if !self.events.contains(&event) {
            return false;
        }

        info!(
            name = %self.snapshot.name,
            %event,
            pid = ?self.snapshot.pid(),
            "cleanup handler: lifecycle event"
        );
        (self.handler)(event, &self.snapshot);
        true
    }

    pub fn detach(&self) {
        self.handle.set_listening(false);
    }

    pub fn is_attached(&self) -> bool {
        self.handle.is_listening()
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet")
            .field("name", &self.snapshot.name)
            .field("pid", &self.handle.pid())
            .field("events", &self.events)
            .finish()
    }
}
