//! Subsystem driver: registry, hooks, actuators and telemetry in one place.
//!
//! [`SubsystemCore`] owns everything a subsystem needs and forwards the
//! state operations to its [`StateRegistry`] and [`HookTable`]. Concrete
//! subsystems embed a core, implement [`Subsystem::update_motors`], and get
//! the lifecycle (`advance`, `stop`, `resume`) from the trait's provided
//! methods.
//!
//! A cycle (`advance`) never fails: unresolvable queries and actuator errors
//! are logged and the cycle carries on with the next actuator.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

use substate_common::error::StateError;
use substate_common::hook::{HookReport, HookSource, HookTable};
use substate_common::registry::{StateQuery, StateRegistry};
use substate_common::value::FieldValue;
use substate_common::variant::Variant;
use substate_hal::{Actuator, ControlMode};

use crate::lifecycle::{Lifecycle, LifecycleEvent, LifecycleMachine, TransitionResult};
use crate::telemetry::TelemetrySink;

// ─── SubsystemCore ──────────────────────────────────────────────────

/// State, hooks and hardware of one subsystem.
pub struct SubsystemCore {
    name: String,
    registry: StateRegistry,
    hooks: HookTable,
    actuators: BTreeMap<String, Box<dyn Actuator>>,
    telemetry: Arc<dyn TelemetrySink>,
    lifecycle: LifecycleMachine,
}

impl SubsystemCore {
    pub fn new(name: impl Into<String>, telemetry: Arc<dyn TelemetrySink>) -> Self {
        let name = name.into();
        Self {
            registry: StateRegistry::new(name.clone()),
            name,
            hooks: HookTable::new(),
            actuators: BTreeMap::new(),
            telemetry,
            lifecycle: LifecycleMachine::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &StateRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut StateRegistry {
        &mut self.registry
    }

    /// Register dimension `V`; its first variant becomes active.
    pub fn register<V: Variant>(&mut self) {
        self.registry.register::<V>();
    }

    // ─── Actuators ──────────────────────────────────────────────────

    /// Attach an actuator under its configured name.
    pub fn add_actuator(&mut self, actuator: Box<dyn Actuator>) {
        let name = actuator.name().to_string();
        debug!("{}: actuator '{}' ({})", self.name, name, actuator.driver());
        if self.actuators.insert(name.clone(), actuator).is_some() {
            warn!("{}: actuator '{}' replaced", self.name, name);
        }
    }

    pub fn actuator(&self, name: &str) -> Option<&dyn Actuator> {
        self.actuators.get(name).map(|a| a.as_ref())
    }

    pub fn actuator_names(&self) -> impl Iterator<Item = &str> {
        self.actuators.keys().map(String::as_str)
    }

    /// Write `output` to the named actuator. Returns whether the write went through.
    pub fn drive(&mut self, actuator: &str, output: f64, mode: ControlMode) -> bool {
        let Some(act) = self.actuators.get_mut(actuator) else {
            error!("{}: no actuator named '{}'", self.name, actuator);
            return false;
        };
        match act.write(output, mode) {
            Ok(()) => true,
            Err(e) => {
                error!("{}: {}", self.name, e);
                false
            }
        }
    }

    /// Whether the named actuator is within its threshold of `target`.
    pub fn actuator_at_target(&self, actuator: &str, target: f64) -> bool {
        match self.actuators.get(actuator) {
            Some(act) => act.is_at_target(target),
            None => {
                error!("{}: no actuator named '{}'", self.name, actuator);
                false
            }
        }
    }

    fn stop_actuators(&mut self) {
        for act in self.actuators.values_mut() {
            act.stop();
        }
    }

    // ─── State ──────────────────────────────────────────────────────

    pub fn set_state<V: Variant>(&mut self, state: V) {
        self.registry.set_state(state);
    }

    /// A `None` state is logged and the prior state kept.
    pub fn set_state_opt<V: Variant>(&mut self, state: Option<V>) {
        self.registry.set_state_opt(state);
    }

    pub fn try_set_state<V: Variant>(&mut self, state: V) -> Result<(), StateError> {
        self.registry.try_set_state(state)
    }

    pub fn try_set_state_opt<V: Variant>(&mut self, state: Option<V>) -> Result<(), StateError> {
        self.registry.try_set_state_opt(state)
    }

    pub fn set_state_named(&mut self, dimension: &str, variant: &str) {
        self.registry.set_state_named(dimension, variant);
    }

    pub fn get_state<V: Variant>(&self) -> Option<V> {
        self.registry.get_state::<V>()
    }

    pub fn get_state_value(&self, query: &StateQuery) -> Option<FieldValue> {
        self.registry.get_state_value(query)
    }

    pub fn get_number(&self, query: &StateQuery) -> Option<f64> {
        self.registry.get_number(query)
    }

    pub fn get_text(&self, query: &StateQuery) -> Option<String> {
        self.registry.get_text(query)
    }

    pub fn get_flag(&self, query: &StateQuery) -> Option<bool> {
        self.registry.get_flag(query)
    }

    pub fn modify_state_value(&self, query: &StateQuery, value: impl Into<FieldValue>) {
        self.registry.modify_state_value(query, value);
    }

    /// Write a field addressed by dimension name (used for config overrides).
    pub fn try_modify_state_value_named(
        &self,
        dimension: &str,
        instance: Option<&str>,
        field: &str,
        value: impl Into<FieldValue>,
    ) -> Result<(), StateError> {
        let id = self
            .registry
            .dimension_by_name(dimension)
            .ok_or_else(|| StateError::UnknownDimension(dimension.to_string()))?;
        let mut query = StateQuery::new().dimension_id(id).field(field);
        if let Some(instance) = instance {
            query = query.instance(instance);
        }
        self.registry.try_modify_state_value(&query, value)
    }

    // ─── Hooks ──────────────────────────────────────────────────────

    /// Bind a hook and re-apply the table.
    pub fn set_hook<V: Variant>(
        &mut self,
        variant: V,
        source: impl Into<HookSource>,
        slot: u32,
    ) -> HookReport {
        self.hooks.set_hook(variant, source, slot);
        self.apply_hooks()
    }

    /// Bind a hook at the default slot and re-apply the table.
    pub fn set_hook_default<V: Variant>(
        &mut self,
        variant: V,
        source: impl Into<HookSource>,
    ) -> HookReport {
        self.hooks.set_hook_default(variant, source);
        self.apply_hooks()
    }

    /// Remove one hook and re-apply the table.
    pub fn remove_hook<V: Variant>(&mut self, variant: V, slot: u32) -> HookReport {
        self.hooks.remove_hook(variant, slot);
        self.apply_hooks()
    }

    /// Remove every slot on `variant` and re-apply the table.
    pub fn remove_hooks<V: Variant>(&mut self, variant: V) -> HookReport {
        self.hooks.remove_hooks(variant);
        self.apply_hooks()
    }

    pub fn apply_hooks(&self) -> HookReport {
        let report = self.hooks.apply(&self.registry);
        trace!("{}: hooks applied {:?}", self.name, report);
        report
    }

    pub fn hooks(&self) -> &HookTable {
        &self.hooks
    }

    // ─── Lifecycle ──────────────────────────────────────────────────

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle.state()
    }

    /// Apply a lifecycle event; returns whether the cycle body should run.
    pub fn handle_event(&mut self, event: LifecycleEvent) -> bool {
        let before = self.lifecycle.state();
        match self.lifecycle.handle_event(event) {
            TransitionResult::Ok(after) => {
                if before != after {
                    info!("{}: {} -> {}", self.name, before, after);
                }
                if event == LifecycleEvent::Stop {
                    self.stop_actuators();
                }
                after == Lifecycle::Running
            }
            TransitionResult::Rejected(reason) => {
                trace!("{}: {:?} ignored ({})", self.name, event, reason);
                false
            }
        }
    }

    /// Mirror every dimension's active name and numeric fields, then
    /// actuator feedback.
    pub fn publish_telemetry(&self) {
        for &id in self.registry.dimensions() {
            let key = format!("{} {}", self.name, id);
            match self.registry.active_name(id) {
                Some(active) => self.telemetry.put_string(&key, active),
                None => continue,
            }
            if let Some(record) = self.registry.active_record(id) {
                for (field, value) in record.entries() {
                    if let Some(number) = value.as_f64() {
                        self.telemetry.put_number(&format!("{key}/{field}"), number);
                    }
                }
            }
        }
        for (name, act) in &self.actuators {
            let reading = act.read();
            self.telemetry
                .put_number(&format!("{} {}/position", self.name, name), reading.position);
            self.telemetry
                .put_number(&format!("{} {}/velocity", self.name, name), reading.velocity);
        }
    }
}

impl std::fmt::Debug for SubsystemCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubsystemCore")
            .field("name", &self.name)
            .field("lifecycle", &self.lifecycle.state())
            .field("states", &self.registry)
            .field("actuators", &self.actuators.keys().collect::<Vec<_>>())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

// ─── Subsystem ──────────────────────────────────────────────────────

/// A periodically driven robot subsystem.
pub trait Subsystem: Send {
    fn core(&self) -> &SubsystemCore;

    fn core_mut(&mut self) -> &mut SubsystemCore;

    /// Push the active records' values to the actuators.
    fn update_motors(&mut self);

    /// Whether every positioned mechanism has reached its active target.
    fn is_at_target(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn lifecycle(&self) -> Lifecycle {
        self.core().lifecycle()
    }

    /// One control period: drive the actuators and mirror state to telemetry.
    /// Does nothing while stopped.
    fn advance(&mut self) {
        if !self.core_mut().handle_event(LifecycleEvent::Tick) {
            return;
        }
        self.update_motors();
        self.core().publish_telemetry();
    }

    /// Zero every actuator. Registry state and hooks are kept.
    fn stop(&mut self) {
        self.core_mut().handle_event(LifecycleEvent::Stop);
    }

    /// Resume cycling after [`stop`](Self::stop).
    fn resume(&mut self) {
        self.core_mut().handle_event(LifecycleEvent::Resume);
    }

    /// Select a state by dimension and variant name.
    fn set_state_named(&mut self, dimension: &str, variant: &str) {
        self.core_mut().set_state_named(dimension, variant);
    }

    fn set_state<V: Variant>(&mut self, state: V)
    where
        Self: Sized,
    {
        self.core_mut().set_state(state);
    }

    fn set_state_opt<V: Variant>(&mut self, state: Option<V>)
    where
        Self: Sized,
    {
        self.core_mut().set_state_opt(state);
    }

    fn get_state<V: Variant>(&self) -> Option<V>
    where
        Self: Sized,
    {
        self.core().get_state::<V>()
    }
}
