//! Robot subsystems built on [`SubsystemCore`](crate::subsystem::SubsystemCore).
//!
//! - [`intake`] - Rollers and pivot, one dimension
//! - [`shooter`] - Flywheels and angle, two dimensions
//! - [`deflector`] - Flap position, one dimension

pub mod deflector;
pub mod intake;
pub mod shooter;

use std::sync::Arc;
use tracing::{error, info};

use substate_hal::{Actuator, ActuatorConfig, ActuatorError, ActuatorRegistry};

use crate::config::{RuntimeConfig, StateOverride, actuator_config};
use crate::subsystem::Subsystem;
use crate::telemetry::TelemetrySink;

pub use deflector::{Deflector, DeflectorState};
pub use intake::{Intake, IntakeState};
pub use shooter::{AngleState, Shooter, ShooterState};

/// Build every enabled subsystem, then apply the configured overrides.
pub fn build_subsystems(
    config: &RuntimeConfig,
    registry: &ActuatorRegistry,
    telemetry: Arc<dyn TelemetrySink>,
) -> Result<Vec<Box<dyn Subsystem>>, ActuatorError> {
    let mut subsystems: Vec<Box<dyn Subsystem>> = Vec::new();
    if config.intake.enabled {
        subsystems.push(Box::new(Intake::new(&config.intake, registry, Arc::clone(&telemetry))?));
    }
    if config.shooter.enabled {
        subsystems.push(Box::new(Shooter::new(&config.shooter, registry, Arc::clone(&telemetry))?));
    }
    if config.deflector.enabled {
        subsystems.push(Box::new(Deflector::new(&config.deflector, registry, telemetry)?));
    }

    let applied = apply_overrides(&subsystems, &config.overrides);
    info!(
        "Built {} subsystems, {}/{} overrides applied",
        subsystems.len(),
        applied,
        config.overrides.len()
    );
    Ok(subsystems)
}

/// Write each override into its subsystem. Failures are logged and skipped.
pub fn apply_overrides(subsystems: &[Box<dyn Subsystem>], overrides: &[StateOverride]) -> usize {
    let mut applied = 0;
    for o in overrides {
        let Some(target) = subsystems.iter().find(|s| s.name() == o.subsystem) else {
            error!("Override for unknown subsystem '{}'", o.subsystem);
            continue;
        };
        match target.core().try_modify_state_value_named(
            &o.dimension,
            o.instance.as_deref(),
            &o.field,
            o.value.clone(),
        ) {
            Ok(()) => applied += 1,
            Err(e) => error!("{}: override {}.{} failed: {}", o.subsystem, o.dimension, o.field, e),
        }
    }
    applied
}

/// Create one actuator per required name, using its configuration entry if present.
pub(crate) fn create_actuators(
    registry: &ActuatorRegistry,
    configured: &[ActuatorConfig],
    names: &[&str],
) -> Result<Vec<Box<dyn Actuator>>, ActuatorError> {
    names
        .iter()
        .map(|name| registry.create(&actuator_config(configured, name)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemoryTelemetry;
    use substate_common::registry::StateQuery;
    use substate_common::value::FieldValue;

    fn build(
        config: &RuntimeConfig,
    ) -> Result<Vec<Box<dyn crate::subsystem::Subsystem>>, ActuatorError> {
        build_subsystems(config, &ActuatorRegistry::default(), Arc::new(MemoryTelemetry::new()))
    }

    #[test]
    fn builds_enabled_subsystems_in_order() {
        let mut config = RuntimeConfig::default();
        config.shooter.enabled = false;
        let subsystems = build(&config).unwrap();
        let names: Vec<&str> = subsystems.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["intake", "deflector"]);
    }

    #[test]
    fn overrides_write_named_instances() {
        let mut config = RuntimeConfig::default();
        config.overrides = vec![
            StateOverride {
                subsystem: "shooter".to_string(),
                dimension: "AngleState".to_string(),
                instance: Some("UP".to_string()),
                field: "position".to_string(),
                value: FieldValue::Number(38.5),
            },
            StateOverride {
                subsystem: "shooter".to_string(),
                dimension: "Turret".to_string(),
                instance: None,
                field: "position".to_string(),
                value: FieldValue::Number(1.0),
            },
        ];
        let subsystems = build(&config).unwrap();
        assert_eq!(apply_overrides(&subsystems, &config.overrides), 1);

        let shooter = subsystems.iter().find(|s| s.name() == "shooter").unwrap();
        let q = StateQuery::variant(AngleState::Up);
        assert_eq!(shooter.core().get_number(&q), Some(38.5));
    }

    #[test]
    fn unknown_driver_fails_build() {
        let mut config = RuntimeConfig::default();
        let mut feeder = ActuatorConfig::named("feeder");
        feeder.driver = "canbus".to_string();
        config.intake.actuators.push(feeder);
        let result = build(&config);
        assert!(matches!(result, Err(ActuatorError::DriverNotFound(_))));
    }
}
