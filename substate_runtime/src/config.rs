//! Runtime configuration loader with validation.
//!
//! One TOML file describes the shared settings, the control period, each
//! subsystem's actuators, startup value overrides and an optional state
//! script.
//!
//! ```toml
//! cycle_time_us = 20000
//! max_cycles = 500
//!
//! [shared]
//! service_name = "practice-bot"
//!
//! [intake]
//! pivot_down = 42.0
//!
//! [[intake.actuators]]
//! name = "pivot"
//! max_velocity = 60.0
//!
//! [[overrides]]
//! subsystem = "shooter"
//! dimension = "AngleState"
//! instance = "UP"
//! field = "position"
//! value = 38.5
//!
//! [[script]]
//! cycle = 10
//! subsystem = "intake"
//! dimension = "IntakeState"
//! state = "INTAKE"
//! ```

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use substate_common::config::{ConfigError, ConfigLoader, SharedConfig};
use substate_common::consts::CYCLE_TIME_US;
use substate_common::value::FieldValue;
use substate_hal::ActuatorConfig;

use crate::subsystems::{deflector, intake, shooter};

// ─── Subsystem sections ─────────────────────────────────────────────

/// `[intake]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Pivot position for the `"up"` named position.
    #[serde(default)]
    pub pivot_up: f64,

    /// Pivot position for the `"down"` named position.
    #[serde(default = "default_pivot_down")]
    pub pivot_down: f64,

    #[serde(default)]
    pub actuators: Vec<ActuatorConfig>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            pivot_up: 0.0,
            pivot_down: default_pivot_down(),
            actuators: Vec::new(),
        }
    }
}

/// `[shooter]` and `[deflector]` sections.
#[derive(Debug, Clone, Deserialize)]
pub struct MechanismConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default)]
    pub actuators: Vec<ActuatorConfig>,
}

impl Default for MechanismConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            actuators: Vec::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_pivot_down() -> f64 {
    42.0
}

fn default_cycle_time_us() -> u64 {
    u64::from(CYCLE_TIME_US)
}

/// Configured actuator `name`, or the defaults if it is not listed.
pub fn actuator_config(actuators: &[ActuatorConfig], name: &str) -> ActuatorConfig {
    actuators
        .iter()
        .find(|a| a.name == name)
        .cloned()
        .unwrap_or_else(|| ActuatorConfig::named(name))
}

// ─── Overrides & script ─────────────────────────────────────────────

/// Field value written once after the subsystems are built.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateOverride {
    pub subsystem: String,
    pub dimension: String,
    /// Record to write; the active state's record when omitted.
    #[serde(default)]
    pub instance: Option<String>,
    pub field: String,
    pub value: FieldValue,
}

/// State selection at a given cycle number.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ScriptStep {
    pub cycle: u64,
    pub subsystem: String,
    pub dimension: String,
    pub state: String,
}

// ─── RuntimeConfig ──────────────────────────────────────────────────

/// Complete runtime configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub shared: SharedConfig,

    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u64,

    /// Stop after this many cycles; run until interrupted when absent.
    #[serde(default)]
    pub max_cycles: Option<u64>,

    #[serde(default)]
    pub intake: IntakeConfig,

    #[serde(default)]
    pub shooter: MechanismConfig,

    #[serde(default)]
    pub deflector: MechanismConfig,

    #[serde(default)]
    pub overrides: Vec<StateOverride>,

    #[serde(default)]
    pub script: Vec<ScriptStep>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            shared: SharedConfig::default(),
            cycle_time_us: default_cycle_time_us(),
            max_cycles: None,
            intake: IntakeConfig::default(),
            shooter: MechanismConfig::default(),
            deflector: MechanismConfig::default(),
            overrides: Vec::new(),
            script: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Load from `path` and validate.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML string and validate.
    pub fn from_toml_validated(content: &str) -> Result<Self, ConfigError> {
        let config = Self::from_toml(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn cycle_time(&self) -> Duration {
        Duration::from_micros(self.cycle_time_us)
    }

    /// Names of enabled subsystems.
    pub fn enabled_subsystems(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.intake.enabled {
            names.push(intake::NAME);
        }
        if self.shooter.enabled {
            names.push(shooter::NAME);
        }
        if self.deflector.enabled {
            names.push(deflector::NAME);
        }
        names
    }

    /// Check bounds and cross references.
    ///
    /// Rejects a zero cycle time, invalid or unknown actuators, non-finite
    /// pivot positions, and overrides or script steps naming a subsystem
    /// that is unknown or disabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.cycle_time_us == 0 {
            return Err(ConfigError::ValidationError(
                "cycle_time_us must be > 0".to_string(),
            ));
        }
        if self.max_cycles == Some(0) {
            return Err(ConfigError::ValidationError(
                "max_cycles must be > 0 when set".to_string(),
            ));
        }
        if !(self.intake.pivot_up.is_finite() && self.intake.pivot_down.is_finite()) {
            return Err(ConfigError::ValidationError(
                "intake pivot positions must be finite".to_string(),
            ));
        }

        validate_actuators(intake::NAME, &self.intake.actuators, &intake::ACTUATORS)?;
        validate_actuators(shooter::NAME, &self.shooter.actuators, &shooter::ACTUATORS)?;
        validate_actuators(deflector::NAME, &self.deflector.actuators, &deflector::ACTUATORS)?;

        let enabled = self.enabled_subsystems();
        for o in &self.overrides {
            check_subsystem(&enabled, &o.subsystem, "override")?;
        }
        for step in &self.script {
            check_subsystem(&enabled, &step.subsystem, "script step")?;
        }
        Ok(())
    }
}

fn validate_actuators(
    subsystem: &str,
    actuators: &[ActuatorConfig],
    known: &[&str],
) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for act in actuators {
        act.validate()
            .map_err(|e| ConfigError::ValidationError(format!("{subsystem}: {e}")))?;
        if !known.contains(&act.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "{subsystem}: unknown actuator '{}' (expected one of {known:?})",
                act.name
            )));
        }
        if !seen.insert(act.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "{subsystem}: duplicate actuator '{}'",
                act.name
            )));
        }
    }
    Ok(())
}

fn check_subsystem(enabled: &[&str], name: &str, what: &str) -> Result<(), ConfigError> {
    if enabled.contains(&name) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{what} names unknown or disabled subsystem '{name}'"
        )))
    }
}
