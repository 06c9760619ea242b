//! Actuator driver implementations.
//!
//! - [`simulation`] - Software actuator for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `Actuator` trait from `crate::actuator`
//! 3. Register its factory in [`register_all_drivers`]

pub mod simulation;

use crate::driver_registry::ActuatorRegistry;

/// Register every built-in driver.
pub fn register_all_drivers(registry: &mut ActuatorRegistry) {
    registry.register(simulation::DRIVER_NAME, simulation::create_actuator);
}
