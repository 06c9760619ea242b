//! Simulated actuator.
//!
//! Each `write` advances the simulation by one step (`CYCLE_TIME` unless set
//! with [`SimulatedActuator::with_step`]):
//! - Power / Velocity / Voltage: the output sets a desired velocity
//! - Position: trapezoidal approach to the target, no overshoot
//!
//! Velocity changes are limited by `max_acceleration`, positions are clamped
//! to the soft limits, and inversion flips the sign of open-loop outputs.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use substate_common::consts::CYCLE_TIME;

use crate::actuator::{
    Actuator, ActuatorCommand, ActuatorConfig, ActuatorError, ActuatorReading, ControlMode,
};

/// Velocities below this are treated as standstill.
const STANDSTILL: f64 = 1e-9;

#[derive(Debug, Default)]
struct SimState {
    position: f64,
    velocity: f64,
    voltage: f64,
    last_command: Option<ActuatorCommand>,
    write_count: u64,
    stop_count: u64,
}

/// Software actuator implementing the `Actuator` trait.
pub struct SimulatedActuator {
    config: ActuatorConfig,
    step: Duration,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedActuator {
    pub fn new(config: ActuatorConfig) -> Self {
        Self {
            config,
            step: CYCLE_TIME,
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    /// Override the simulated time per `write`.
    pub fn with_step(mut self, step: Duration) -> Self {
        self.step = step;
        self
    }

    /// Handle sharing this actuator's state, for inspection from tests or
    /// diagnostics after the actuator has been moved into a subsystem.
    pub fn handle(&self) -> SimulatedHandle {
        SimulatedHandle {
            name: self.config.name.clone(),
            threshold: self.config.threshold,
            state: Arc::clone(&self.state),
        }
    }

    fn clamp_to_limits(&self, position: f64) -> f64 {
        let mut p = position;
        if let Some(fwd) = self.config.forward_limit {
            p = p.min(fwd);
        }
        if let Some(rev) = self.config.reverse_limit {
            p = p.max(rev);
        }
        p
    }

    /// Desired velocity for an open-loop or velocity command.
    fn open_loop_velocity(&self, output: f64, mode: ControlMode) -> f64 {
        let sign = if self.config.inverted { -1.0 } else { 1.0 };
        let max_vel = self.config.max_velocity;
        match mode {
            ControlMode::Power => (sign * output).clamp(-1.0, 1.0) * max_vel,
            ControlMode::Velocity => (sign * output).clamp(-max_vel, max_vel),
            ControlMode::Voltage => {
                let bus = self.config.bus_voltage;
                (sign * output).clamp(-bus, bus) / bus * max_vel
            }
            ControlMode::Position => 0.0,
        }
    }

    /// Desired velocity on a trapezoidal profile towards `target`.
    fn profile_velocity(&self, state: &SimState, target: f64) -> f64 {
        let error = target - state.position;
        if error.abs() < STANDSTILL {
            return 0.0;
        }
        let max_vel = self.config.max_velocity;
        let max_acc = self.config.max_acceleration;
        let stopping_distance = state.velocity * state.velocity / (2.0 * max_acc);
        if error.abs() <= stopping_distance {
            error.signum() * (2.0 * max_acc * error.abs()).sqrt().min(max_vel)
        } else {
            error.signum() * max_vel
        }
    }
}

impl Actuator for SimulatedActuator {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn driver(&self) -> &'static str {
        super::DRIVER_NAME
    }

    fn write(&mut self, output: f64, mode: ControlMode) -> Result<(), ActuatorError> {
        if !output.is_finite() {
            return Err(ActuatorError::InvalidOutput {
                name: self.config.name.clone(),
                output,
            });
        }

        let dt = self.step.as_secs_f64();
        let mut state = self.state.lock();

        let (desired, target) = match mode {
            ControlMode::Position => {
                let target = self.clamp_to_limits(output);
                (self.profile_velocity(&state, target), Some(target))
            }
            other => (self.open_loop_velocity(output, other), None),
        };

        let max_change = self.config.max_acceleration * dt;
        state.velocity += (desired - state.velocity).clamp(-max_change, max_change);

        let mut next = state.position + state.velocity * dt;
        if let Some(target) = target {
            let overshoot = (target - state.position).signum() != (target - next).signum();
            if overshoot || (target - next).abs() < STANDSTILL {
                next = target;
                state.velocity = 0.0;
            }
        }

        let clamped = self.clamp_to_limits(next);
        if clamped != next {
            state.velocity = 0.0;
        }
        state.position = clamped;
        state.voltage = match mode {
            ControlMode::Voltage => {
                let sign = if self.config.inverted { -1.0 } else { 1.0 };
                (sign * output).clamp(-self.config.bus_voltage, self.config.bus_voltage)
            }
            _ => state.velocity / self.config.max_velocity * self.config.bus_voltage,
        };
        state.last_command = Some(ActuatorCommand { output, mode });
        state.write_count += 1;

        trace!(
            "Actuator {}: {} {:.3} -> pos={:.3}, vel={:.3}",
            self.config.name, mode, output, state.position, state.velocity
        );
        Ok(())
    }

    fn read(&self) -> ActuatorReading {
        let state = self.state.lock();
        ActuatorReading {
            position: state.position,
            velocity: state.velocity,
            voltage: state.voltage,
        }
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.velocity = 0.0;
        state.voltage = 0.0;
        state.last_command = Some(ActuatorCommand {
            output: 0.0,
            mode: ControlMode::Power,
        });
        state.stop_count += 1;
    }

    fn is_at_target(&self, target: f64) -> bool {
        (self.state.lock().position - target).abs() <= self.config.threshold
    }
}

/// Shared view of a `SimulatedActuator`.
#[derive(Clone)]
pub struct SimulatedHandle {
    name: String,
    threshold: f64,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Last output written (a stop records zero power).
    pub fn last_command(&self) -> Option<ActuatorCommand> {
        self.state.lock().last_command
    }

    pub fn reading(&self) -> ActuatorReading {
        let state = self.state.lock();
        ActuatorReading {
            position: state.position,
            velocity: state.velocity,
            voltage: state.voltage,
        }
    }

    pub fn write_count(&self) -> u64 {
        self.state.lock().write_count
    }

    pub fn stop_count(&self) -> u64 {
        self.state.lock().stop_count
    }

    /// Teleport the simulated mechanism (e.g. to seed a starting position).
    pub fn set_position(&self, position: f64) {
        let mut state = self.state.lock();
        state.position = position;
        state.velocity = 0.0;
    }

    pub fn is_at_target(&self, target: f64) -> bool {
        (self.state.lock().position - target).abs() <= self.threshold
    }
}
