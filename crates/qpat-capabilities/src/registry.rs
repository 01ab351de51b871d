//! Name-keyed store of capability instances.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::capability::Capability;
use crate::error::{CapabilityError, CapabilityResult};

/// Holds ready-to-run capabilities keyed by their [`Capability::name`].
#[derive(Default)]
pub struct CapabilityRegistry {
    capabilities: FxHashMap<String, Box<dyn Capability>>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability under its own name, replacing any previous one.
    pub fn register(&mut self, capability: Box<dyn Capability>) {
        let name = capability.name().to_string();
        debug!("Registering capability: {}", name);
        self.capabilities.insert(name, capability);
    }

    /// Look up a capability.
    pub fn get(&self, name: &str) -> CapabilityResult<&dyn Capability> {
        self.capabilities
            .get(name)
            .map(|c| c.as_ref())
            .ok_or_else(|| CapabilityError::NotRegistered(name.to_string()))
    }

    /// Look up a capability for running.
    pub fn get_mut(&mut self, name: &str) -> CapabilityResult<&mut (dyn Capability + 'static)> {
        self.capabilities
            .get_mut(name)
            .map(|c| c.as_mut())
            .ok_or_else(|| CapabilityError::NotRegistered(name.to_string()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.capabilities.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered capabilities.
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl std::fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityRegistry")
            .field("capabilities", &self.names())
            .finish()
    }
}
