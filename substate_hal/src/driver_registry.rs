//! Driver registry for actuators.
//!
//! Maps driver names from configuration to actuator factories. Constructed at
//! startup and passed to whoever builds subsystems; no global state.

use std::collections::HashMap;
use tracing::debug;

use crate::actuator::{Actuator, ActuatorConfig, ActuatorError, ActuatorFactory};
use crate::drivers;

/// Registry of available actuator drivers.
pub struct ActuatorRegistry {
    factories: HashMap<&'static str, ActuatorFactory>,
}

impl ActuatorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Create a registry holding every built-in driver.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        drivers::register_all_drivers(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if a driver with the same name is already registered.
    pub fn register(&mut self, name: &'static str, factory: ActuatorFactory) {
        if self.factories.contains_key(name) {
            panic!("Actuator driver '{name}' is already registered");
        }
        self.factories.insert(name, factory);
    }

    /// Get a driver factory by name.
    pub fn get_factory(&self, name: &str) -> Option<ActuatorFactory> {
        self.factories.get(name).copied()
    }

    /// Validate `config` and build an actuator with its driver.
    ///
    /// # Errors
    /// `ActuatorError::Config` if validation fails;
    /// `ActuatorError::DriverNotFound` if the driver is not registered.
    pub fn create(&self, config: &ActuatorConfig) -> Result<Box<dyn Actuator>, ActuatorError> {
        config.validate()?;
        let factory = self
            .get_factory(&config.driver)
            .ok_or_else(|| ActuatorError::DriverNotFound(config.driver.clone()))?;
        debug!("Creating actuator '{}' with driver '{}'", config.name, config.driver);
        Ok(factory(config))
    }

    /// List all registered driver names, sorted.
    pub fn list_drivers(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for ActuatorRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}
