//! # Substate HAL
//!
//! Actuator abstraction with a pluggable driver architecture.
//!
//! Subsystems talk to motors only through the [`Actuator`] trait. Concrete
//! actuators are built from [`ActuatorConfig`] entries by the
//! [`ActuatorRegistry`], which maps driver names to factory functions.
//!
//! # Module Structure
//!
//! - [`actuator`] - `Actuator` trait, control modes, configuration, errors
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations (`simulation`)
//!
//! ```text
//!   [[*.actuators]] ──► ActuatorRegistry ──► Box<dyn Actuator>
//!                           │
//!                           └── "simulation" ─► SimulatedActuator
//! ```

pub mod actuator;
pub mod driver_registry;
pub mod drivers;

pub use crate::actuator::{
    Actuator, ActuatorCommand, ActuatorConfig, ActuatorError, ActuatorFactory, ActuatorReading,
    ControlMode,
};
pub use crate::driver_registry::ActuatorRegistry;
pub use crate::drivers::simulation::{SimulatedActuator, SimulatedHandle};
