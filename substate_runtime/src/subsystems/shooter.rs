//! Shooter: two flywheels and an angle joint, each with its own dimension.

use std::sync::Arc;

use substate_common::declare_dimension;
use substate_common::registry::StateQuery;
use substate_hal::{Actuator, ActuatorError, ActuatorRegistry, ControlMode};

use crate::config::MechanismConfig;
use crate::subsystem::{Subsystem, SubsystemCore};
use crate::telemetry::TelemetrySink;

pub const NAME: &str = "shooter";

pub const TOP: &str = "top";
pub const BOTTOM: &str = "bottom";
pub const ANGLE: &str = "angle";
pub const ACTUATORS: [&str; 3] = [TOP, BOTTOM, ANGLE];

const SHOOTER_SPEED: f64 = 1.0;

declare_dimension! {
    /// Flywheel states.
    pub enum ShooterState: "ShooterState" {
        Idle = "IDLE" { "topSpeed" => 0.0, "bottomSpeed" => 0.0 },
        Shooting = "SHOOTING" { "topSpeed" => SHOOTER_SPEED, "bottomSpeed" => -SHOOTER_SPEED },
        Inverse = "INVERSE" { "topSpeed" => -SHOOTER_SPEED, "bottomSpeed" => SHOOTER_SPEED },
        Reverse = "REVERSE" { "topSpeed" => -0.25, "bottomSpeed" => -0.25 },
    }
}

declare_dimension! {
    /// Shooter angle positions.
    pub enum AngleState: "AngleState" {
        Resting = "RESTING" { "position" => 0.0 },
        Up = "UP" { "position" => 35.0 },
    }
}

pub struct Shooter {
    core: SubsystemCore,
}

impl Shooter {
    pub fn new(
        config: &MechanismConfig,
        registry: &ActuatorRegistry,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Result<Self, ActuatorError> {
        let actuators = super::create_actuators(registry, &config.actuators, &ACTUATORS)?;
        Ok(Self::from_parts(actuators, telemetry))
    }

    pub fn from_parts(
        actuators: impl IntoIterator<Item = Box<dyn Actuator>>,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        let mut core = SubsystemCore::new(NAME, telemetry);
        core.register::<ShooterState>();
        core.register::<AngleState>();
        for act in actuators {
            core.add_actuator(act);
        }
        Self { core }
    }

    /// Angle of the active `AngleState`.
    pub fn angle_target(&self) -> Option<f64> {
        self.core
            .get_number(&StateQuery::of::<AngleState>().field("position"))
    }
}

impl Subsystem for Shooter {
    fn core(&self) -> &SubsystemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SubsystemCore {
        &mut self.core
    }

    fn update_motors(&mut self) {
        let wheels = StateQuery::of::<ShooterState>();
        if let Some(speed) = self.core.get_number(&wheels.clone().field("topSpeed")) {
            self.core.drive(TOP, speed, ControlMode::Power);
        }
        if let Some(speed) = self.core.get_number(&wheels.field("bottomSpeed")) {
            self.core.drive(BOTTOM, speed, ControlMode::Power);
        }
        if let Some(angle) = self.angle_target() {
            self.core.drive(ANGLE, angle, ControlMode::Position);
        }
    }

    fn is_at_target(&self) -> bool {
        self.angle_target()
            .is_some_and(|angle| self.core.actuator_at_target(ANGLE, angle))
    }
}
