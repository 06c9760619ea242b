//! State registry error taxonomy.
//!
//! Every variant here is recoverable: the registry facade logs the error and
//! degrades to a no-op or an empty result, so a single misconfigured state
//! never halts the periodic cycle. The `try_*` accessors surface these values
//! to callers that want to react to them.

use thiserror::Error;

/// Errors raised while resolving or mutating registry state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StateError {
    /// No dimension given and more than one is registered.
    #[error("ambiguous dimension: {count} dimensions registered, none specified")]
    AmbiguousDimension { count: usize },

    /// No dimension given and none are registered.
    #[error("no dimensions registered")]
    NoDimensions,

    /// The dimension was never registered with this registry.
    #[error("dimension '{0}' is not registered")]
    UnregisteredDimension(&'static str),

    /// No registered dimension carries that name.
    #[error("no dimension named '{0}'")]
    UnknownDimension(String),

    /// No record with that instance name exists in the dimension.
    #[error("no instance '{instance}' in dimension '{dimension}'")]
    UnknownInstance {
        dimension: &'static str,
        instance: String,
    },

    /// The record has no such field.
    #[error("instance '{instance}' has no field '{field}'")]
    UnknownField { instance: String, field: String },

    /// Field omitted but the record does not have exactly one field.
    #[error("expected exactly one field in instance '{instance}', found {count}")]
    FieldCount { instance: String, count: usize },

    /// A state assignment carried no variant.
    #[error("attempted to set a null state on '{owner}'")]
    NullState { owner: String },

    /// A variant name that is not declared in the dimension.
    #[error("dimension '{dimension}' has no variant '{variant}'")]
    UnknownVariant { dimension: String, variant: String },

    /// The dimension declares no variants.
    #[error("dimension '{0}' declares no variants")]
    EmptyDimension(&'static str),

    /// The dimension has no active state (only possible when it is empty).
    #[error("dimension '{0}' has no active state")]
    NoActiveState(&'static str),

    /// A hook produced a value that is not a finite number.
    #[error("hook {variant}[{slot}] produced non-numeric value ({found})")]
    NonNumericHook {
        variant: &'static str,
        slot: u32,
        found: String,
    },

    /// A field held a different value kind than requested.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}
