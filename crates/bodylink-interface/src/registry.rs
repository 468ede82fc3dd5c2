//! Process-wide cache of robot interfaces, one per configuration key.
//!
//! Every block that talks to the robot registers its configuration here
//! instead of constructing a [`RobotInterface`] itself. Registering the same
//! configuration twice hands back the same shared instance; registering a
//! *changed* configuration under an existing key rebuilds the interface and
//! replaces the entry.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use bodylink_core::config::Configuration;

use crate::backend::{ModelBackend, TransportBackend};
use crate::error::InterfaceError;
use crate::interface::RobotInterface;

/// Keyed cache of [`RobotInterface`] instances.
///
/// Entries hold strong references: an interface stays registered until
/// [`erase`](Self::erase) removes it, even when no block currently holds it.
/// The host tears an entry down by erasing it after the last holder released
/// its session count.
pub struct InterfaceRegistry {
    model_backend: Arc<dyn ModelBackend>,
    transport: Arc<dyn TransportBackend>,
    entries: Mutex<HashMap<String, Arc<RobotInterface>>>,
}

impl InterfaceRegistry {
    pub fn new(model_backend: Arc<dyn ModelBackend>, transport: Arc<dyn TransportBackend>) -> Self {
        Self {
            model_backend,
            transport,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Arc<RobotInterface>>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `config` and return the shared interface for its key.
    ///
    /// Three outcomes:
    /// - no entry under the key: a new interface is constructed and inserted;
    /// - an entry with an *equal* configuration exists: it is returned as-is;
    /// - an entry with a *different* configuration exists: a replacement is
    ///   constructed and swapped in, and stale handles to the old interface
    ///   keep working until their holders drop them.
    ///
    /// On construction failure nothing is inserted or replaced. The lock is
    /// held across construction, so two threads storing the same key cannot
    /// race each other into duplicate instances.
    pub fn store(&self, config: Configuration) -> Result<Arc<RobotInterface>, InterfaceError> {
        let mut entries = self.entries();

        if let Some(existing) = entries.get(&config.key) {
            if *existing.configuration() == config {
                debug!(key = %config.key, "configuration unchanged, reusing interface");
                return Ok(existing.clone());
            }
            info!(key = %config.key, "configuration changed, rebuilding interface");
        } else {
            debug!(key = %config.key, "registering new interface");
        }

        let key = config.key.clone();
        let interface = Arc::new(RobotInterface::new(
            config,
            self.model_backend.as_ref(),
            self.transport.clone(),
        )?);
        entries.insert(key, interface.clone());
        Ok(interface)
    }

    /// The interface registered under `key`, if any.
    pub fn get(&self, key: &str) -> Option<Arc<RobotInterface>> {
        self.entries().get(key).cloned()
    }

    /// Remove the entry under `key`. Handles already held elsewhere stay
    /// valid; only the registry's reference is dropped.
    pub fn erase(&self, key: &str) -> Option<Arc<RobotInterface>> {
        let removed = self.entries().remove(key);
        if removed.is_some() {
            debug!(key, "interface erased from registry");
        }
        removed
    }

    /// Degrees of freedom of the configuration registered under `key`.
    pub fn number_of_dofs(&self, key: &str) -> Option<usize> {
        self.entries().get(key).map(|i| i.dofs())
    }

    /// A copy of the configuration registered under `key`.
    pub fn configuration(&self, key: &str) -> Option<Configuration> {
        self.entries().get(key).map(|i| i.configuration().clone())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl std::fmt::Debug for InterfaceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries();
        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();
        f.debug_struct("InterfaceRegistry")
            .field("keys", &keys)
            .finish_non_exhaustive()
    }
}
