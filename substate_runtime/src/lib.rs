//! # Substate Runtime
//!
//! Subsystem drivers on top of the state registry, a fixed-period scheduler,
//! telemetry sinks, and the demo robot subsystems.
//!
//! ## Cycle
//!
//! ```text
//!   Scheduler::tick
//!     ├── script steps due this cycle  (select states by name)
//!     └── for each subsystem: advance()
//!           ├── Constructed → Running on first tick
//!           ├── update_motors()      registry → Actuator::write
//!           └── publish_telemetry()  active names + numeric fields
//! ```
//!
//! Nothing in the cycle returns an error: bad queries and actuator failures
//! are logged and the cycle carries on.

pub mod config;
pub mod cycle;
pub mod lifecycle;
pub mod subsystem;
pub mod subsystems;
pub mod telemetry;
