// src/registry.rs

//! Name-keyed store of process descriptors.
//!
//! The registry is an explicit value handed to the orchestrator and the
//! supervising tasks; cloning it shares the same underlying map. The mutex
//! only keeps the map coherent: a lookup followed by a write is not
//! transactional, so concurrent writers on one name race and the last
//! write wins.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::config::RawProcessDescriptor;
use crate::descriptor::ProcessDescriptor;
use crate::supervisor::ProcessHandle;

#[derive(Debug, Clone, Default)]
pub struct Registry {
    inner: Arc<Mutex<BTreeMap<String, ProcessDescriptor>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, ProcessDescriptor>> {
        // A panicking callback must not take the whole registry down with it.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Upsert by name. Returns `false` if the descriptor has no name.
    pub fn set(&self, descriptor: ProcessDescriptor) -> bool {
        if descriptor.name.trim().is_empty() {
            warn!("refusing to store descriptor without a name");
            return false;
        }
        debug!(name = %descriptor.name, pid = ?descriptor.pid(), "storing descriptor");
        self.lock().insert(descriptor.name.clone(), descriptor);
        true
    }

    /// Validate and upsert a raw descriptor. Returns `false` if the shape is
    /// not a valid descriptor.
    pub fn set_raw(&self, raw: RawProcessDescriptor) -> bool {
        match ProcessDescriptor::try_from(raw) {
            Ok(descriptor) => self.set(descriptor),
            Err(err) => {
                warn!(error = %err, "rejecting invalid descriptor");
                false
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<ProcessDescriptor> {
        self.lock().get(name).cloned()
    }

    /// Batch lookup. Only found names are present in the result; if none
    /// are found the whole batch is `None`.
    pub fn get_many<I, S>(&self, names: I) -> Option<BTreeMap<String, ProcessDescriptor>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let map = self.lock();
        let found: BTreeMap<_, _> = names
            .into_iter()
            .filter_map(|n| {
                map.get(n.as_ref())
                    .map(|d| (n.as_ref().to_string(), d.clone()))
            })
            .collect();

        if found.is_empty() { None } else { Some(found) }
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Clear the runtime pair of `name`, but only while it still refers to
    /// `handle`. A relaunch under the same name keeps its newer handle.
    pub(crate) fn clear_handle_if(&self, name: &str, handle: &ProcessHandle) -> bool {
        let mut map = self.lock();
        match map.get_mut(name) {
            Some(d) if d.handle().is_some_and(|h| h.same_launch(handle)) => {
                d.detach();
                true
            }
            _ => false,
        }
    }
}
