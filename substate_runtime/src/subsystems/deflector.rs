//! Deflector: a single positioned flap.

use std::sync::Arc;

use substate_common::declare_dimension;
use substate_common::registry::StateQuery;
use substate_hal::{Actuator, ActuatorError, ActuatorRegistry, ControlMode};

use crate::config::MechanismConfig;
use crate::subsystem::{Subsystem, SubsystemCore};
use crate::telemetry::TelemetrySink;

pub const NAME: &str = "deflector";

pub const FLAP: &str = "deflectorAngle";
pub const ACTUATORS: [&str; 1] = [FLAP];

declare_dimension! {
    pub enum DeflectorState: "DeflectorState" {
        Up = "UP" { "position" => 25.0 },
        Down = "DOWN" { "position" => 0.0 },
    }
}

pub struct Deflector {
    core: SubsystemCore,
}

impl Deflector {
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
        core.register::<DeflectorState>();
        for act in actuators {
            core.add_actuator(act);
        }
        Self { core }
    }

    fn target(&self) -> Option<f64> {
        // Single dimension, single field: no query parts needed.
        self.core.get_number(&StateQuery::new())
    }
}

impl Subsystem for Deflector {
    fn core(&self) -> &SubsystemCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SubsystemCore {
        &mut self.core
    }

    fn update_motors(&mut self) {
        if let Some(position) = self.target() {
            self.core.drive(FLAP, position, ControlMode::Position);
        }
    }

    fn is_at_target(&self) -> bool {
        self.target()
            .is_some_and(|position| self.core.actuator_at_target(FLAP, position))
    }
}
