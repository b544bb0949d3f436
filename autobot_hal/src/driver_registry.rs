//! Transport registry.
//!
//! Maps transport names to the factories that open them. Constructed at
//! startup and queried once to open the link.

use crate::drivers::register_all_transports;
use autobot_common::hal::config::SerialConfig;
use autobot_common::hal::driver::{HalError, Transport, TransportFactory};
use std::collections::HashMap;
use tracing::info;

/// Registry of available transports.
pub struct TransportRegistry {
    factories: HashMap<&'static str, TransportFactory>,
}

impl TransportRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding the built-in transports.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        register_all_transports(&mut registry);
        registry
    }

    /// Register a transport factory.
    ///
    /// # Panics
    /// Panics if a transport with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: TransportFactory) {
        if self.factories.contains_key(name) {
            panic!("Transport '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a transport factory by name.
    pub fn get_factory(&self, name: &str) -> Option<TransportFactory> {
        self.factories.get(name).copied()
    }

    /// Open a transport by name.
    ///
    /// # Errors
    /// - `HalError::DriverNotFound` if no transport with the given name is registered
    /// - whatever the factory returns, typically `HalError::DeviceUnavailable`
    pub fn open(&self, name: &str, config: &SerialConfig) -> Result<Box<dyn Transport>, HalError> {
        let factory = self.get_factory(name).ok_or_else(|| {
            HalError::DriverNotFound(format!("{name} (available: {:?})", self.list()))
        })?;
        let transport = factory(config)?;
        info!("Opened '{}' transport", transport.name());
        Ok(transport)
    }

    /// List all registered transport names, sorted.
    pub fn list(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for TransportRegistry {
    fn default() -> Self {
        Self::new()
    }
}
