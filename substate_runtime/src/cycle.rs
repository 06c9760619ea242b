//! Fixed-period scheduler.
//!
//! Calls `advance()` once per subsystem per period, paced against absolute
//! deadlines on `Instant` so pacing does not drift. A cycle that takes longer
//! than the period is counted as an overrun and the deadline is re-based; the
//! loop keeps running.
//!
//! Script steps from the configuration select states by name when their
//! cycle number comes up, before that cycle's subsystems are advanced.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::ScriptStep;
use crate::subsystem::Subsystem;

// ─── Cycle Statistics ───────────────────────────────────────────────

/// O(1) per-cycle timing statistics.
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// Total cycles executed.
    pub cycle_count: u64,
    /// Last cycle duration [ns].
    pub last_cycle_ns: i64,
    /// Minimum cycle duration [ns].
    pub min_cycle_ns: i64,
    /// Maximum cycle duration [ns].
    pub max_cycle_ns: i64,
    /// Running sum for average computation.
    pub sum_cycle_ns: i64,
    /// Number of cycles longer than the period.
    pub overruns: u64,
    /// Maximum wake-up latency [ns] (actual minus scheduled start).
    pub max_latency_ns: i64,
}

impl CycleStats {
    pub const fn new() -> Self {
        Self {
            cycle_count: 0,
            last_cycle_ns: 0,
            min_cycle_ns: i64::MAX,
            max_cycle_ns: 0,
            sum_cycle_ns: 0,
            overruns: 0,
            max_latency_ns: 0,
        }
    }

    /// Record a cycle duration.
    #[inline]
    pub fn record(&mut self, duration_ns: i64, latency_ns: i64) {
        self.cycle_count += 1;
        self.last_cycle_ns = duration_ns;
        self.min_cycle_ns = self.min_cycle_ns.min(duration_ns);
        self.max_cycle_ns = self.max_cycle_ns.max(duration_ns);
        self.sum_cycle_ns += duration_ns;
        self.max_latency_ns = self.max_latency_ns.max(latency_ns);
    }

    /// Average cycle time [ns] (0 if no cycles).
    #[inline]
    pub fn avg_cycle_ns(&self) -> i64 {
        if self.cycle_count == 0 {
            0
        } else {
            self.sum_cycle_ns / self.cycle_count as i64
        }
    }
}

impl Default for CycleStats {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Scheduler ──────────────────────────────────────────────────────

/// Owns the subsystems and ticks them once per period.
pub struct Scheduler {
    subsystems: Vec<Box<dyn Subsystem>>,
    script: Vec<ScriptStep>,
    cycle_time: Duration,
    stats: CycleStats,
    running: Arc<AtomicBool>,
}

impl Scheduler {
    pub fn new(cycle_time: Duration) -> Self {
        Self {
            subsystems: Vec::new(),
            script: Vec::new(),
            cycle_time,
            stats: CycleStats::new(),
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn with_subsystems(mut self, subsystems: Vec<Box<dyn Subsystem>>) -> Self {
        self.subsystems.extend(subsystems);
        self
    }

    /// Attach script steps; they run in cycle order.
    pub fn with_script(mut self, mut script: Vec<ScriptStep>) -> Self {
        script.sort_by_key(|step| step.cycle);
        self.script = script;
        self
    }

    pub fn add(&mut self, subsystem: Box<dyn Subsystem>) {
        self.subsystems.push(subsystem);
    }

    /// Flag polled by [`run`](Self::run); clearing it ends the loop.
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn stats(&self) -> &CycleStats {
        &self.stats
    }

    pub fn cycle_time(&self) -> Duration {
        self.cycle_time
    }

    pub fn subsystems(&self) -> &[Box<dyn Subsystem>] {
        &self.subsystems
    }

    pub fn subsystem(&self, name: &str) -> Option<&dyn Subsystem> {
        self.subsystems
            .iter()
            .find(|s| s.name() == name)
            .map(|s| s.as_ref())
    }

    pub fn subsystem_mut(&mut self, name: &str) -> Option<&mut (dyn Subsystem + 'static)> {
        self.subsystems
            .iter_mut()
            .find(|s| s.name() == name)
            .map(|s| s.as_mut())
    }

    /// Whether every subsystem reports it is at its target.
    pub fn all_at_target(&self) -> bool {
        self.subsystems.iter().all(|s| s.is_at_target())
    }

    /// Run one cycle immediately.
    pub fn tick(&mut self) {
        self.tick_with_latency(Duration::ZERO);
    }

    fn tick_with_latency(&mut self, latency: Duration) {
        let start = Instant::now();
        self.run_script(self.stats.cycle_count);
        for subsystem in &mut self.subsystems {
            subsystem.advance();
        }
        let elapsed = start.elapsed();

        self.stats.record(as_ns(elapsed), as_ns(latency));
        if elapsed > self.cycle_time {
            self.stats.overruns += 1;
            warn!(
                "Cycle {} overrun: {:?} > {:?}",
                self.stats.cycle_count, elapsed, self.cycle_time
            );
        }
    }

    fn run_script(&mut self, cycle: u64) {
        for step in self.script.iter().filter(|s| s.cycle == cycle) {
            match self
                .subsystems
                .iter_mut()
                .find(|s| s.name() == step.subsystem)
            {
                Some(subsystem) => {
                    debug!(
                        "Cycle {}: {} {} -> {}",
                        cycle, step.subsystem, step.dimension, step.state
                    );
                    subsystem.set_state_named(&step.dimension, &step.state);
                }
                None => warn!("Script step for unknown subsystem '{}'", step.subsystem),
            }
        }
    }

    /// Tick at the configured period until the running flag is cleared or
    /// `max_cycles` cycles have run. Returns the number of cycles run.
    pub fn run(&mut self, max_cycles: Option<u64>) -> u64 {
        info!(
            "Scheduler started: {} subsystems, period {:?}",
            self.subsystems.len(),
            self.cycle_time
        );
        let mut executed = 0;
        let mut deadline = Instant::now();

        while self.running.load(Ordering::SeqCst) {
            if max_cycles.is_some_and(|max| executed >= max) {
                break;
            }
            let latency = Instant::now().saturating_duration_since(deadline);
            self.tick_with_latency(latency);
            executed += 1;

            deadline += self.cycle_time;
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            } else {
                deadline = now;
            }
        }

        info!(
            "Scheduler finished after {} cycles (avg {} ns, max {} ns, {} overruns)",
            executed,
            self.stats.avg_cycle_ns(),
            self.stats.max_cycle_ns,
            self.stats.overruns
        );
        executed
    }

    /// Stop every subsystem.
    pub fn stop_all(&mut self) {
        for subsystem in &mut self.subsystems {
            subsystem.stop();
        }
    }
}

fn as_ns(d: Duration) -> i64 {
    i64::try_from(d.as_nanos()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::Lifecycle;
    use crate::subsystem::SubsystemCore;
    use crate::telemetry::MemoryTelemetry;

    substate_common::declare_dimension! {
        enum Lamp: "Lamp" {
            Off = "OFF" { "level" => 0.0 },
            On = "ON" { "level" => 1.0 },
        }
    }

    struct Light {
        core: SubsystemCore,
        ticks: u32,
    }

    impl Light {
        fn boxed(name: &str) -> Box<dyn Subsystem> {
            let mut core = SubsystemCore::new(name, Arc::new(MemoryTelemetry::new()));
            core.register::<Lamp>();
            Box::new(Self { core, ticks: 0 })
        }
    }

    impl Subsystem for Light {
        fn core(&self) -> &SubsystemCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut SubsystemCore {
            &mut self.core
        }

        fn update_motors(&mut self) {
            self.ticks += 1;
        }
    }

    #[test]
    fn cycle_stats_basic() {
        let mut stats = CycleStats::new();
        assert_eq!(stats.cycle_count, 0);
        assert_eq!(stats.avg_cycle_ns(), 0);

        stats.record(500_000, 1_000);
        assert_eq!(stats.cycle_count, 1);
        assert_eq!(stats.min_cycle_ns, 500_000);
        assert_eq!(stats.max_cycle_ns, 500_000);
        assert_eq!(stats.max_latency_ns, 1_000);

        stats.record(600_000, 500);
        assert_eq!(stats.min_cycle_ns, 500_000);
        assert_eq!(stats.max_cycle_ns, 600_000);
        assert_eq!(stats.max_latency_ns, 1_000);
        assert_eq!(stats.avg_cycle_ns(), 550_000);
    }

    #[test]
    fn tick_advances_every_subsystem() {
        let mut sched = Scheduler::new(Duration::from_millis(1))
            .with_subsystems(vec![Light::boxed("hall"), Light::boxed("porch")]);
        sched.tick();
        sched.tick();
        assert_eq!(sched.stats().cycle_count, 2);
        assert!(sched.subsystems().iter().all(|s| s.lifecycle() == Lifecycle::Running));
        assert!(sched.all_at_target());
    }

    #[test]
    fn script_selects_states_by_cycle() {
        let script = vec![
            ScriptStep {
                cycle: 2,
                subsystem: "porch".to_string(),
                dimension: "Lamp".to_string(),
                state: "ON".to_string(),
            },
            ScriptStep {
                cycle: 1,
                subsystem: "attic".to_string(),
                dimension: "Lamp".to_string(),
                state: "ON".to_string(),
            },
        ];
        let mut sched = Scheduler::new(Duration::from_millis(1))
            .with_subsystems(vec![Light::boxed("porch")])
            .with_script(script);

        sched.tick();
        sched.tick();
        let porch = sched.subsystem("porch").unwrap();
        assert_eq!(porch.core().get_state::<Lamp>(), Some(Lamp::Off));
        sched.tick();
        let porch = sched.subsystem("porch").unwrap();
        assert_eq!(porch.core().get_state::<Lamp>(), Some(Lamp::On));
    }

    #[test]
    fn run_honours_max_cycles_and_flag() {
        let mut sched =
            Scheduler::new(Duration::from_millis(1)).with_subsystems(vec![Light::boxed("hall")]);
        assert_eq!(sched.run(Some(5)), 5);
        assert_eq!(sched.stats().cycle_count, 5);

        sched.running_flag().store(false, Ordering::SeqCst);
        assert_eq!(sched.run(Some(5)), 0);
    }

    #[test]
    fn stop_all_stops_everything() {
        let mut sched = Scheduler::new(Duration::from_millis(1))
            .with_subsystems(vec![Light::boxed("hall"), Light::boxed("porch")]);
        sched.tick();
        sched.stop_all();
        assert!(sched.subsystems().iter().all(|s| s.lifecycle() == Lifecycle::Stopped));

        let hall = sched.subsystem_mut("hall").unwrap();
        hall.resume();
        assert_eq!(hall.lifecycle(), Lifecycle::Running);
    }
}
