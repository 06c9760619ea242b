//! substate common library
//!
//! Named operating states for robot subsystems: declare variants grouped into
//! independent dimensions, switch the active variant per dimension, read and
//! write the values attached to each variant, and bind values to live
//! external cells.
//!
//! # Module Structure
//!
//! - [`value`] - Tagged field values with checked conversions
//! - [`record`] - Records and the named-instance table
//! - [`variant`] - Variant declarations, dimension tokens, translator
//! - [`registry`] - Active-state tracking and the value resolver
//! - [`hook`] - Hook bindings to external numeric cells
//! - [`error`] - Error taxonomy
//! - [`config`] - TOML configuration loading
//! - [`consts`] - Workspace-wide defaults
//! - [`prelude`] - Common re-exports
//!
//! # Usage
//!
//! ```rust
//! use substate_common::prelude::*;
//!
//! declare_dimension! {
//!     pub enum ArmState: "ArmState" {
//!         Stow = "STOW" { "position" => 0.0 },
//!         Score = "SCORE" { "position" => 42.0 },
//!     }
//! }
//!
//! let mut registry = StateRegistry::new("arm");
//! registry.register::<ArmState>();
//! registry.set_state(ArmState::Score);
//! assert_eq!(registry.get_number(&StateQuery::of::<ArmState>()), Some(42.0));
//! ```

pub mod config;
pub mod consts;
pub mod error;
pub mod hook;
pub mod prelude;
pub mod record;
pub mod registry;
pub mod value;
pub mod variant;
