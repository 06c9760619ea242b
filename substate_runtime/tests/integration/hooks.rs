//! Integration test: hooks bound through a subsystem.

use std::sync::Arc;

use substate_common::consts::DEFAULT_HOOK_SLOT;
use substate_common::hook::{HookSource, NumericCell};
use substate_common::registry::StateQuery;
use substate_common::value::FieldValue;
use substate_hal::{Actuator, ActuatorConfig, SimulatedActuator};
use substate_runtime::subsystem::Subsystem;
use substate_runtime::subsystems::deflector::{self, Deflector, DeflectorState};
use substate_runtime::telemetry::MemoryTelemetry;

fn deflector() -> Deflector {
    let flap = SimulatedActuator::new(ActuatorConfig::named(deflector::FLAP));
    Deflector::from_parts(
        [Box::new(flap) as Box<dyn Actuator>],
        Arc::new(MemoryTelemetry::new()),
    )
}

#[test]
fn hook_without_matching_field_changes_nothing() {
    let mut d = deflector();
    let cell = NumericCell::new(9.0);
    let report = d.core_mut().set_hook(DeflectorState::Up, &cell, 0);
    assert_eq!(report.applied, 0);
    assert_eq!(report.skipped, 1);

    let up = StateQuery::variant(DeflectorState::Up).field("position");
    assert_eq!(d.core().get_number(&up), Some(25.0));
    let fields = d
        .core()
        .registry()
        .active_record(substate_common::variant::DimensionId::of::<DeflectorState>())
        .map(|r| r.field_names());
    assert_eq!(fields, Some(vec!["position".to_string()]));
}

#[test]
fn introduced_field_receives_hook_updates() {
    let mut d = deflector();
    // A write may introduce the field a hook targets.
    d.core().modify_state_value(&StateQuery::variant(DeflectorState::Up).field("UP"), 0.0);

    let cell = NumericCell::new(0.6);
    let report = d.core_mut().set_hook_default(DeflectorState::Up, &cell);
    assert_eq!(report.applied, 1);
    let q = StateQuery::new().field("UP");
    assert_eq!(d.core().get_number(&q), Some(0.6));

    cell.set(0.8);
    d.core().apply_hooks();
    assert_eq!(d.core().get_number(&q), Some(0.8));

    d.core_mut().remove_hook(DeflectorState::Up, DEFAULT_HOOK_SLOT);
    cell.set(0.1);
    d.core().apply_hooks();
    assert_eq!(d.core().get_number(&q), Some(0.8));
}

#[test]
fn rejected_provider_leaves_other_slots_working() {
    let mut d = deflector();
    d.core().modify_state_value(&StateQuery::new().field("UP"), 0.0);

    d.core_mut()
        .set_hook(DeflectorState::Up, HookSource::provider(|| FieldValue::from("high")), 0);
    let report = d
        .core_mut()
        .set_hook(DeflectorState::Up, HookSource::provider(|| FieldValue::Number(3.5)), 1);

    assert_eq!(report.rejected, 1);
    assert_eq!(report.applied, 1);
    assert_eq!(d.core().get_number(&StateQuery::new().field("UP")), Some(3.5));
    assert_eq!(d.core().hooks().len(), 2);
}
