//! Actuator capability interface and error types.
//!
//! This module defines:
//! - `Actuator` trait - The minimal contract a subsystem needs from a motor
//! - `ControlMode` - How a written output is interpreted
//! - `ActuatorReading` - Feedback sampled from the actuator
//! - `ActuatorConfig` - Per-actuator TOML configuration
//! - `ActuatorError` - Error types for actuator operations
//! - `ActuatorFactory` - Factory function type

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use substate_common::consts::{AT_TARGET_THRESHOLD, BUS_VOLTAGE};

/// Error types for actuator operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ActuatorError {
    /// No factory registered under the requested driver name
    #[error("Actuator driver not found: {0}")]
    DriverNotFound(String),

    /// Output is not a finite number
    #[error("Invalid output for '{name}': {output}")]
    InvalidOutput { name: String, output: f64 },

    /// Configuration error
    #[error("Actuator configuration error: {0}")]
    Config(String),

    /// Hardware communication error
    #[error("Actuator communication error: {0}")]
    Communication(String),
}

/// Interpretation of a written output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// Duty cycle in [-1, 1].
    Power,
    /// Closed-loop position reference.
    Position,
    /// Closed-loop velocity reference.
    Velocity,
    /// Open-loop voltage.
    Voltage,
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Power => "power",
            Self::Position => "position",
            Self::Velocity => "velocity",
            Self::Voltage => "voltage",
        };
        f.write_str(name)
    }
}

/// One output written to an actuator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorCommand {
    pub output: f64,
    pub mode: ControlMode,
}

/// Feedback sampled from an actuator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ActuatorReading {
    /// Position in user units
    pub position: f64,
    /// Velocity in user units/second
    pub velocity: f64,
    /// Applied voltage
    pub voltage: f64,
}

/// Capability interface between a subsystem and its motor hardware.
///
/// A subsystem writes each actuator once per control cycle. Implementations
/// must not block: `write` forwards the reference to the controller and
/// returns.
pub trait Actuator: Send {
    /// Configured actuator name (e.g. "intake", "pivot").
    fn name(&self) -> &str;

    /// Driver identifier (e.g. "simulation").
    fn driver(&self) -> &'static str;

    /// Command an output in the given mode.
    ///
    /// # Errors
    /// `ActuatorError::InvalidOutput` for non-finite outputs;
    /// `ActuatorError::Communication` if the controller cannot be reached.
    fn write(&mut self, output: f64, mode: ControlMode) -> Result<(), ActuatorError>;

    /// Sample current feedback.
    fn read(&self) -> ActuatorReading;

    /// Zero all outputs.
    fn stop(&mut self);

    /// Whether the position is within the configured threshold of `target`.
    fn is_at_target(&self, target: f64) -> bool;
}

/// Factory function type for creating actuators from configuration.
pub type ActuatorFactory = fn(&ActuatorConfig) -> Box<dyn Actuator>;

/// Per-actuator configuration.
///
/// # TOML Example
///
/// ```toml
/// [[intake.actuators]]
/// name = "pivot"
/// driver = "simulation"
/// threshold = 0.1
/// max_velocity = 40.0
/// reverse_limit = 0.0
/// forward_limit = 90.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActuatorConfig {
    pub name: String,

    #[serde(default = "default_driver")]
    pub driver: String,

    /// Flip the sign of power/velocity/voltage outputs.
    #[serde(default)]
    pub inverted: bool,

    /// Tolerance for `is_at_target`.
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Velocity at full power [units/s].
    #[serde(default = "default_max_velocity")]
    pub max_velocity: f64,

    /// Acceleration limit [units/s²].
    #[serde(default = "default_max_acceleration")]
    pub max_acceleration: f64,

    #[serde(default = "default_bus_voltage")]
    pub bus_voltage: f64,

    /// Soft limit, positive direction.
    #[serde(default)]
    pub forward_limit: Option<f64>,

    /// Soft limit, negative direction.
    #[serde(default)]
    pub reverse_limit: Option<f64>,
}

fn default_driver() -> String {
    "simulation".to_string()
}

fn default_threshold() -> f64 {
    AT_TARGET_THRESHOLD
}

fn default_max_velocity() -> f64 {
    100.0
}

fn default_max_acceleration() -> f64 {
    1000.0
}

fn default_bus_voltage() -> f64 {
    BUS_VOLTAGE
}

impl ActuatorConfig {
    /// Configuration with defaults for everything but the name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: default_driver(),
            inverted: false,
            threshold: default_threshold(),
            max_velocity: default_max_velocity(),
            max_acceleration: default_max_acceleration(),
            bus_voltage: default_bus_voltage(),
            forward_limit: None,
            reverse_limit: None,
        }
    }

    /// Check numeric bounds.
    ///
    /// # Errors
    /// `ActuatorError::Config` if the name or driver is empty, a rate or
    /// threshold is not positive, or the soft limits are inverted.
    pub fn validate(&self) -> Result<(), ActuatorError> {
        if self.name.trim().is_empty() {
            return Err(ActuatorError::Config("actuator name cannot be empty".to_string()));
        }
        if self.driver.trim().is_empty() {
            return Err(ActuatorError::Config(format!(
                "actuator '{}': driver cannot be empty",
                self.name
            )));
        }
        for (label, value) in [
            ("threshold", self.threshold),
            ("max_velocity", self.max_velocity),
            ("max_acceleration", self.max_acceleration),
            ("bus_voltage", self.bus_voltage),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ActuatorError::Config(format!(
                    "actuator '{}': {label} must be positive, got {value}",
                    self.name
                )));
            }
        }
        if let (Some(fwd), Some(rev)) = (self.forward_limit, self.reverse_limit) {
            if fwd <= rev {
                return Err(ActuatorError::Config(format!(
                    "actuator '{}': forward_limit {fwd} must exceed reverse_limit {rev}",
                    self.name
                )));
            }
        }
        Ok(())
    }
}
