//! Intake: two rollers and a pivot.
//!
//! Rollers run open-loop at the active state's speeds. The pivot field holds a
//! named position (`"up"` / `"down"`) that is mapped to an angle from the
//! `[intake]` config section.

use std::sync::Arc;
use tracing::error;

use substate_common::declare_dimension;
use substate_common::registry::StateQuery;
use substate_hal::{Actuator, ActuatorError, ActuatorRegistry, ControlMode};

use crate::config::IntakeConfig;
use crate::subsystem::{Subsystem, SubsystemCore};
use crate::telemetry::TelemetrySink;

pub const NAME: &str = "intake";

pub const INTAKE: &str = "intake";
pub const FEEDER: &str = "feeder";
pub const PIVOT: &str = "pivot";
pub const ACTUATORS: [&str; 3] = [INTAKE, FEEDER, PIVOT];

declare_dimension! {
    /// Intake operating states.
    pub enum IntakeState: "IntakeState" {
        Idle = "IDLE" { "intakeSpeed" => 0.0, "feederSpeed" => 0.0, "pivot" => "up" },
        Intake = "INTAKE" { "intakeSpeed" => 0.8, "feederSpeed" => 0.4, "pivot" => "down" },
        Outtake = "OUTTAKE" { "intakeSpeed" => -0.8, "feederSpeed" => -0.4, "pivot" => "down" },
    }
}

pub struct Intake {
    core: SubsystemCore,
    pivot_up: f64,
    pivot_down: f64,
}

impl Intake {
    /// Build with actuators from `registry`.
    pub fn new(
        config: &IntakeConfig,
        registry: &ActuatorRegistry,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Result<Self, ActuatorError> {
        let actuators = super::create_actuators(registry, &config.actuators, &ACTUATORS)?;
        Ok(Self::from_parts(config, actuators, telemetry))
    }

    /// Build around already constructed actuators.
    pub fn from_parts(
        config: &IntakeConfig,
        actuators: impl IntoIterator<Item = Box<dyn Actuator>>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        let mut core = SubsystemCore::new(NAME, telemetry);
        core.register::<IntakeState>();
        for act in actuators {
            core.add_actuator(act);
        }
        Self {
            core,
            pivot_up: config.pivot_up,
            pivot_down: config.pivot_down,
        }
    }

    /// Angle for a named pivot position.
    pub fn pivot_position(&self, named: &str) -> Option<f64> {
        match named {
            "up" => Some(self.pivot_up),
            "down" => Some(self.pivot_down),
            other => {
                error!("{}: unknown pivot position '{}'", NAME, other);
                None
            }
        }
    }

    /// Pivot angle of the active state.
    pub fn pivot_target(&self) -> Option<f64> {
        let named = self
            .core
            .get_text(&StateQuery::of::<IntakeState>().field("pivot"))?;
        self.pivot_position(&named)
    }
}

impl Subsystem for Intake {
    fn core(&self) -> &SubsystemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SubsystemCore {
        &mut self.core
    }

    fn update_motors(&mut self) {
        let q = StateQuery::of::<IntakeState>();
        if let Some(speed) = self.core.get_number(&q.clone().field("intakeSpeed")) {
            self.core.drive(INTAKE, speed, ControlMode::Power);
        }
        if let Some(speed) = self.core.get_number(&q.field("feederSpeed")) {
            self.core.drive(FEEDER, speed, ControlMode::Power);
        }
        if let Some(angle) = self.pivot_target() {
            self.core.drive(PIVOT, angle, ControlMode::Position);
        }
    }

    fn is_at_target(&self) -> bool {
        self.pivot_target()
            .is_some_and(|angle| self.core.actuator_at_target(PIVOT, angle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::MemoryTelemetry;
    use substate_hal::{ActuatorConfig, SimulatedActuator, SimulatedHandle};

    fn intake() -> (Intake, Vec<SimulatedHandle>) {
        let sims: Vec<SimulatedActuator> = ACTUATORS
            .iter()
            .map(|n| SimulatedActuator::new(ActuatorConfig::named(*n)))
            .collect();
        let handles = sims.iter().map(SimulatedActuator::handle).collect();
        let boxed = sims
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn Actuator>);
        let intake = Intake::from_parts(
            &IntakeConfig::default(),
            boxed,
            Arc::new(MemoryTelemetry::new()),
        );
        (intake, handles)
    }

    #[test]
    fn pivot_named_positions() {
        let (intake, _) = intake();
        assert_eq!(intake.pivot_position("up"), Some(0.0));
        assert_eq!(intake.pivot_position("down"), Some(42.0));
        assert_eq!(intake.pivot_position("sideways"), None);
        assert_eq!(intake.pivot_target(), Some(0.0));
    }

    #[test]
    fn outtake_reverses_rollers() {
        let (mut intake, handles) = intake();
        intake.set_state(IntakeState::Outtake);
        intake.advance();
        assert_eq!(handles[0].last_command().map(|c| c.output), Some(-0.8));
        assert_eq!(handles[1].last_command().map(|c| c.output), Some(-0.4));
        let pivot = handles[2].last_command().unwrap();
        assert_eq!(pivot.mode, ControlMode::Position);
        assert_eq!(pivot.output, 42.0);
    }

    #[test]
    fn unknown_pivot_name_skips_pivot_only() {
        let (mut intake, handles) = intake();
        intake
            .core()
            .modify_state_value(&StateQuery::of::<IntakeState>().field("pivot"), "sideways");
        intake.advance();
        assert!(handles[0].last_command().is_some());
        assert!(handles[2].last_command().is_none());
        assert!(!intake.is_at_target());
    }
}
