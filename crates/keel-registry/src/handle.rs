//! Hot-reloadable registry handle.

use crate::{Catalogue, MetricRegistry, error::Result};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

/// Shared handle to the current [`MetricRegistry`].
///
/// Callers take a [`snapshot`](Self::snapshot) at the start of a unit of work
/// and thread it through every call; a concurrent [`reload`](Self::reload)
/// never changes a snapshot already taken.
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    current: Arc<RwLock<Arc<MetricRegistry>>>,
}

impl RegistryHandle {
    /// Wrap an already-built registry.
    pub fn new(registry: MetricRegistry) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(registry))),
        }
    }

    /// Handle over the built-in catalogue.
    pub fn builtin() -> Result<Self> {
        MetricRegistry::builtin().map(Self::new)
    }

    /// The registry in effect right now.
    pub fn snapshot(&self) -> Arc<MetricRegistry> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Version of the registry in effect.
    pub fn version(&self) -> u32 {
        self.snapshot().version()
    }

    /// Swap in a new catalogue if its version is strictly newer.
    ///
    /// Returns whether the swap happened.
    pub fn reload(&self, catalogue: Catalogue) -> bool {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        let current = guard.version();
        let incoming = catalogue.version();

        if incoming <= current {
            debug!(current, incoming, "Ignoring catalogue without a version bump");
            return false;
        }

        *guard = Arc::new(MetricRegistry::from_catalogue(catalogue));
        info!(from = current, to = incoming, "Metric registry reloaded");
        true
    }

    /// Read a catalogue file and [`reload`](Self::reload) it.
    pub fn reload_from_path<P: AsRef<std::path::Path>>(&self, path: P) -> Result<bool> {
        let catalogue = Catalogue::from_path(path)?;
        Ok(self.reload(catalogue))
    }
}
