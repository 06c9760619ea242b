//! Cycle benchmark: one scheduler tick over the default subsystems.
//!
//! Covers state resolution, actuator writes against the simulation driver
//! and telemetry publishing into an in-memory sink, plus hook application
//! on a hooked record.

use std::sync::Arc;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};

use substate_common::hook::NumericCell;
use substate_common::registry::StateQuery;
use substate_hal::ActuatorRegistry;
use substate_runtime::config::RuntimeConfig;
use substate_runtime::cycle::Scheduler;
use substate_runtime::subsystems::build_subsystems;
use substate_runtime::subsystems::deflector::DeflectorState;
use substate_runtime::telemetry::MemoryTelemetry;

fn scheduler(config: &RuntimeConfig) -> Scheduler {
    let registry = ActuatorRegistry::with_builtin();
    let sink = Arc::new(MemoryTelemetry::new());
    let subsystems = build_subsystems(config, &registry, sink).expect("builtin drivers");
    Scheduler::new(config.cycle_time()).with_subsystems(subsystems)
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    for enabled in [1usize, 2, 3] {
        let mut config = RuntimeConfig::default();
        config.shooter.enabled = enabled >= 2;
        config.deflector.enabled = enabled >= 3;
        let mut sched = scheduler(&config);

        group.bench_with_input(BenchmarkId::new("subsystems", enabled), &enabled, |b, _| {
            b.iter(|| sched.tick());
        });
    }

    group.finish();
}

fn bench_apply_hooks(c: &mut Criterion) {
    let mut sched = scheduler(&RuntimeConfig::default());
    let Some(deflector) = sched.subsystem_mut("deflector") else {
        return;
    };
    let core = deflector.core_mut();
    core.modify_state_value(&StateQuery::variant(DeflectorState::Up).field("UP"), 0.0);
    for slot in 0..4 {
        core.set_hook(DeflectorState::Up, NumericCell::new(f64::from(slot)), slot);
    }

    c.bench_function("apply_hooks", |b| b.iter(|| core.apply_hooks()));
}

criterion_group!(benches, bench_tick, bench_apply_hooks);
criterion_main!(benches);
