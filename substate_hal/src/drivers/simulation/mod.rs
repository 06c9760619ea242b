//! Simulation driver module.
//!
//! Software-emulated actuators for development and testing without
//! physical hardware.

mod actuator;

pub use actuator::{SimulatedActuator, SimulatedHandle};

use crate::actuator::{Actuator, ActuatorConfig};

/// Driver name used in configuration.
pub const DRIVER_NAME: &str = "simulation";

/// Factory function to create a simulated actuator.
pub fn create_actuator(config: &ActuatorConfig) -> Box<dyn Actuator> {
    Box::new(SimulatedActuator::new(config.clone()))
}
