//! Integration test: stopping preserves registry state and hooks.

use std::sync::Arc;

use substate_common::hook::NumericCell;
use substate_common::registry::StateQuery;
use substate_hal::{Actuator, ActuatorConfig, SimulatedActuator};
use substate_runtime::lifecycle::Lifecycle;
use substate_runtime::subsystem::Subsystem;
use substate_runtime::subsystems::shooter::{self, AngleState, Shooter, ShooterState};
use substate_runtime::telemetry::MemoryTelemetry;

#[test]
fn stop_then_resume_continues_where_it_left_off() {
    let names = [shooter::TOP, shooter::BOTTOM, shooter::ANGLE];
    let sims: Vec<SimulatedActuator> = names
        .iter()
        .map(|n| SimulatedActuator::new(ActuatorConfig::named(*n)))
        .collect();
    let handles: Vec<_> = sims.iter().map(SimulatedActuator::handle).collect();
    let actuators = sims.into_iter().map(|s| Box::new(s) as Box<dyn Actuator>);
    let mut s = Shooter::from_parts(actuators, Arc::new(MemoryTelemetry::new()));

    s.set_state(ShooterState::Reverse);
    s.set_state(AngleState::Up);
    s.core().modify_state_value(&StateQuery::of::<AngleState>(), 30.0);
    s.core().modify_state_value(&StateQuery::variant(AngleState::Up).field("UP"), 0.0);
    s.core_mut().set_hook(AngleState::Up, NumericCell::new(1.5), 0);
    s.advance();
    assert_eq!(handles[0].last_command().map(|c| c.output), Some(-0.25));

    s.stop();
    assert_eq!(s.lifecycle(), Lifecycle::Stopped);
    assert!(handles.iter().all(|h| h.stop_count() == 1));
    assert!(handles.iter().all(|h| h.reading().velocity == 0.0));

    // Stopped: ticks are ignored.
    let writes = handles[2].write_count();
    s.advance();
    assert_eq!(handles[2].write_count(), writes);

    // Registry and hooks survived the stop.
    assert_eq!(s.get_state::<ShooterState>(), Some(ShooterState::Reverse));
    assert_eq!(s.get_state::<AngleState>(), Some(AngleState::Up));
    assert_eq!(s.core().hooks().len(), 1);
    let up = StateQuery::variant(AngleState::Up);
    assert_eq!(s.core().get_number(&up.clone().field("position")), Some(30.0));
    assert_eq!(s.core().get_number(&up.field("UP")), Some(1.5));

    s.resume();
    s.advance();
    assert_eq!(s.lifecycle(), Lifecycle::Running);
    assert_eq!(handles[2].last_command().map(|c| c.output), Some(30.0));
}
