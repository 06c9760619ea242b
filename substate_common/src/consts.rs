//! Workspace-wide defaults.
//!
//! Single source of truth for timing and tolerance defaults shared by the
//! HAL and runtime crates.

use std::time::Duration;

/// Default control period in microseconds (50 Hz).
pub const CYCLE_TIME_US: u32 = 20_000;

/// Default control period as `Duration`.
pub const CYCLE_TIME: Duration = Duration::from_micros(CYCLE_TIME_US as u64);

/// Default position tolerance for `is_at_target`.
pub const AT_TARGET_THRESHOLD: f64 = 0.05;

/// Nominal actuator bus voltage [V].
pub const BUS_VOLTAGE: f64 = 12.0;

/// Default hook slot.
pub const DEFAULT_HOOK_SLOT: u32 = 0;
