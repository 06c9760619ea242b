//! Integration test: intake from construction to actuator commands.

use std::sync::Arc;

use substate_common::registry::StateQuery;
use substate_hal::{Actuator, ActuatorConfig, ControlMode, SimulatedActuator, SimulatedHandle};
use substate_runtime::config::IntakeConfig;
use substate_runtime::subsystem::Subsystem;
use substate_runtime::subsystems::intake::{self, Intake, IntakeState};
use substate_runtime::telemetry::MemoryTelemetry;

struct Rig {
    intake: Intake,
    roller: SimulatedHandle,
    feeder: SimulatedHandle,
    pivot: SimulatedHandle,
    telemetry: MemoryTelemetry,
}

fn rig() -> Rig {
    let roller = SimulatedActuator::new(ActuatorConfig::named(intake::INTAKE));
    let feeder = SimulatedActuator::new(ActuatorConfig::named(intake::FEEDER));
    let pivot = SimulatedActuator::new(ActuatorConfig::named(intake::PIVOT));
    let handles = (roller.handle(), feeder.handle(), pivot.handle());
    let telemetry = MemoryTelemetry::new();

    let actuators: Vec<Box<dyn Actuator>> =
        vec![Box::new(roller), Box::new(feeder), Box::new(pivot)];
    let intake = Intake::from_parts(
        &IntakeConfig::default(),
        actuators,
        Arc::new(telemetry.clone()),
    );

    Rig {
        intake,
        roller: handles.0,
        feeder: handles.1,
        pivot: handles.2,
        telemetry,
    }
}

#[test]
fn starts_idle() {
    let rig = rig();
    assert_eq!(rig.intake.get_state::<IntakeState>(), Some(IntakeState::Idle));
    assert!(rig.roller.last_command().is_none());
}

#[test]
fn intake_state_commands_rollers() {
    let mut rig = rig();
    rig.intake.set_state(IntakeState::Intake);

    let q = StateQuery::of::<IntakeState>();
    let core = rig.intake.core();
    assert_eq!(core.get_number(&q.clone().field("intakeSpeed")), Some(0.8));
    assert_eq!(core.get_number(&q.field("feederSpeed")), Some(0.4));

    rig.intake.advance();

    let roller = rig.roller.last_command().expect("roller written");
    assert_eq!(roller.output, 0.8);
    assert_eq!(roller.mode, ControlMode::Power);
    assert_eq!(rig.feeder.last_command().map(|c| c.output), Some(0.4));
    assert_eq!(rig.pivot.last_command().map(|c| c.output), Some(42.0));

    assert_eq!(rig.telemetry.text("intake IntakeState").as_deref(), Some("INTAKE"));
    assert_eq!(rig.telemetry.number("intake IntakeState/intakeSpeed"), Some(0.8));
}

#[test]
fn pivot_reaches_down_position() {
    let mut rig = rig();
    rig.intake.set_state(IntakeState::Intake);
    let mut cycles = 0;
    loop {
        rig.intake.advance();
        cycles += 1;
        if rig.intake.is_at_target() {
            break;
        }
        assert!(cycles < 500, "pivot never settled");
    }
    assert!(rig.pivot.is_at_target(42.0));

    rig.intake.set_state(IntakeState::Idle);
    assert!(!rig.intake.is_at_target());
}

#[test]
fn back_to_idle_zeroes_rollers() {
    let mut rig = rig();
    rig.intake.set_state(IntakeState::Outtake);
    rig.intake.advance();
    assert_eq!(rig.roller.last_command().map(|c| c.output), Some(-0.8));

    rig.intake.set_state(IntakeState::Idle);
    rig.intake.advance();
    assert_eq!(rig.roller.last_command().map(|c| c.output), Some(0.0));
    assert_eq!(rig.feeder.last_command().map(|c| c.output), Some(0.0));
}
