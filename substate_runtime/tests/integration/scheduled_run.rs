//! Integration test: configuration → subsystems → scheduler → telemetry.

use std::sync::Arc;

use substate_common::registry::StateQuery;
use substate_hal::ActuatorRegistry;
use substate_runtime::config::RuntimeConfig;
use substate_runtime::cycle::Scheduler;
use substate_runtime::subsystems::{AngleState, ShooterState, build_subsystems};
use substate_runtime::telemetry::MemoryTelemetry;

const ROBOT_TOML: &str = r#"
cycle_time_us = 1000

[shared]
service_name = "practice-bot"

[intake]
pivot_down = 30.0

[[shooter.actuators]]
name = "bottom"
inverted = true

[[overrides]]
subsystem = "shooter"
dimension = "AngleState"
instance = "UP"
field = "position"
value = 20.0

[[script]]
cycle = 1
subsystem = "intake"
dimension = "IntakeState"
state = "INTAKE"

[[script]]
cycle = 3
subsystem = "shooter"
dimension = "ShooterState"
state = "SHOOTING"

[[script]]
cycle = 3
subsystem = "shooter"
dimension = "AngleState"
state = "UP"

[[script]]
cycle = 4
subsystem = "deflector"
dimension = "DeflectorState"
state = "SIDEWAYS"
"#;

fn scheduler(telemetry: &MemoryTelemetry) -> Scheduler {
    let config = RuntimeConfig::from_toml_validated(ROBOT_TOML).expect("valid config");
    let subsystems = build_subsystems(
        &config,
        &ActuatorRegistry::with_builtin(),
        Arc::new(telemetry.clone()),
    )
    .expect("build");
    Scheduler::new(config.cycle_time())
        .with_subsystems(subsystems)
        .with_script(config.script.clone())
}

#[test]
fn script_drives_states_over_cycles() {
    let telemetry = MemoryTelemetry::new();
    let mut sched = scheduler(&telemetry);

    assert_eq!(sched.run(Some(6)), 6);
    assert_eq!(sched.stats().cycle_count, 6);

    assert_eq!(telemetry.text("intake IntakeState").as_deref(), Some("INTAKE"));
    assert_eq!(telemetry.text("shooter ShooterState").as_deref(), Some("SHOOTING"));
    assert_eq!(telemetry.text("shooter AngleState").as_deref(), Some("UP"));
    assert_eq!(telemetry.number("shooter AngleState/position"), Some(20.0));
    // Unknown variant name is logged and the prior state kept.
    assert_eq!(telemetry.text("deflector DeflectorState").as_deref(), Some("UP"));

    let shooter = sched.subsystem("shooter").expect("shooter");
    let core = shooter.core();
    assert_eq!(core.get_state::<ShooterState>(), Some(ShooterState::Shooting));
    assert_eq!(core.get_state::<AngleState>(), Some(AngleState::Up));
    assert_eq!(
        core.get_number(&StateQuery::variant(AngleState::Up)),
        Some(20.0)
    );
}

#[test]
fn inverted_flywheel_spins_backwards() {
    let telemetry = MemoryTelemetry::new();
    let mut sched = scheduler(&telemetry);
    sched.run(Some(6));

    // SHOOTING commands bottom -1.0; inversion flips it.
    let bottom = telemetry
        .number("shooter bottom/velocity")
        .expect("bottom velocity");
    assert!(bottom > 0.0);
    let top = telemetry.number("shooter top/velocity").expect("top velocity");
    assert!(top > 0.0);
}

#[test]
fn dump_is_valid_json() {
    let telemetry = MemoryTelemetry::new();
    let mut sched = scheduler(&telemetry);
    sched.run(Some(2));
    sched.stop_all();

    let json: serde_json::Value = serde_json::from_str(&telemetry.to_json().unwrap()).unwrap();
    assert_eq!(json["intake IntakeState"], "INTAKE");
    assert!(json["intake pivot/position"].is_number());
}

#[test]
fn shipped_config_builds() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../config/robot.toml");
    let config = RuntimeConfig::load_validated(&path).expect("config/robot.toml");
    assert_eq!(config.enabled_subsystems(), vec!["intake", "shooter", "deflector"]);

    let telemetry = MemoryTelemetry::new();
    let subsystems = build_subsystems(
        &config,
        &ActuatorRegistry::with_builtin(),
        Arc::new(telemetry.clone()),
    )
    .expect("builtin drivers");
    let mut sched = Scheduler::new(config.cycle_time())
        .with_subsystems(subsystems)
        .with_script(config.script.clone());
    for _ in 0..30 {
        sched.tick();
    }
    assert_eq!(telemetry.text("intake IntakeState").as_deref(), Some("INTAKE"));
}
