//! Prelude module for common re-exports.
//!
//! ```rust
//! use substate_common::prelude::*;
//! ```

// ─── Declarations ───────────────────────────────────────────────────
pub use crate::declare_dimension;
pub use crate::variant::{DimensionId, Variant, translate};

// ─── Runtime state ──────────────────────────────────────────────────
pub use crate::record::{InstanceTable, Record, RecordBuilder};
pub use crate::registry::{Access, Resolved, StateQuery, StateRegistry};
pub use crate::value::FieldValue;

// ─── Hooks ──────────────────────────────────────────────────────────
pub use crate::hook::{HookKey, HookReport, HookSource, HookTable, NumericCell};

// ─── Errors & configuration ─────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::error::StateError;

// ─── Defaults ───────────────────────────────────────────────────────
pub use crate::consts::{AT_TARGET_THRESHOLD, CYCLE_TIME, CYCLE_TIME_US};
