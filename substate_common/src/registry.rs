//! State dimension registry.
//!
//! Owns one [`InstanceTable`] and one active-state pointer per registered
//! dimension. All value access goes through one resolver: a [`StateQuery`]
//! may leave the dimension, field, or instance unspecified, and each omitted
//! part must resolve unambiguously:
//!
//! | Omitted    | Resolves to                                        |
//! |------------|----------------------------------------------------|
//! | dimension  | the only registered dimension                      |
//! | instance   | the dimension's active state                       |
//! | field      | the record's only field                            |
//!
//! The `try_*` methods return the [`StateError`]; the plain methods log it
//! and return `None` or do nothing, so the periodic cycle never stops on a
//! bad query.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::error::StateError;
use crate::record::{InstanceTable, Record};
use crate::value::FieldValue;
use crate::variant::{DimensionId, Variant, translate};

// ─── StateQuery ─────────────────────────────────────────────────────

/// Partially specified address of a record field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateQuery {
    dimension: Option<DimensionId>,
    field: Option<String>,
    instance: Option<String>,
}

impl StateQuery {
    /// Query with every part left to defaulting.
    pub fn new() -> Self {
        Self::default()
    }

    /// Query on dimension `V`.
    pub fn of<V: Variant>() -> Self {
        Self::new().dimension::<V>()
    }

    /// Query on the record of a specific variant.
    pub fn variant<V: Variant>(variant: V) -> Self {
        Self::of::<V>().instance(variant.name())
    }

    pub fn dimension<V: Variant>(self) -> Self {
        self.dimension_id(DimensionId::of::<V>())
    }

    pub fn dimension_id(mut self, id: DimensionId) -> Self {
        self.dimension = Some(id);
        self
    }

    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn instance(mut self, instance: impl Into<String>) -> Self {
        self.instance = Some(instance.into());
        self
    }
}

/// Whether a resolved field will be read or written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// The field must already exist.
    Read,
    /// An explicitly named field may be introduced.
    Write,
}

/// Fully resolved field address.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub dimension: DimensionId,
    pub record: Arc<Record>,
    pub field: String,
}

// ─── StateRegistry ──────────────────────────────────────────────────

struct DimensionEntry {
    table: InstanceTable,
    active: Option<&'static str>,
    variants: Vec<&'static str>,
    translate: fn() -> InstanceTable,
}

/// Registry of state dimensions for one subsystem.
pub struct StateRegistry {
    owner: String,
    order: Vec<DimensionId>,
    dimensions: HashMap<DimensionId, DimensionEntry>,
}

impl StateRegistry {
    /// Create an empty registry. `owner` prefixes log messages.
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            order: Vec::new(),
            dimensions: HashMap::new(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    // ─── Registration ───────────────────────────────────────────────

    /// Translate dimension `V`, store its table, and select its first variant.
    ///
    /// Registering the same dimension again replaces its table and resets the
    /// active state.
    pub fn register<V: Variant>(&mut self) {
        let id = DimensionId::of::<V>();
        let active = V::variants().first().map(|v| v.name());
        if active.is_none() {
            error!(
                "{}: {}",
                self.owner,
                StateError::EmptyDimension(V::DIMENSION)
            );
        }

        let entry = DimensionEntry {
            table: translate::<V>(),
            active,
            variants: V::variants().iter().map(|v| v.name()).collect(),
            translate: translate::<V>,
        };

        if self.dimensions.insert(id, entry).is_some() {
            debug!("{}: re-registered dimension {}", self.owner, id);
        } else {
            debug!("{}: registered dimension {}", self.owner, id);
            self.order.push(id);
        }
    }

    /// Restore the declared field values of `V` without touching its active state.
    ///
    /// Values are copied into the existing records, so `Arc<Record>` handles
    /// taken earlier keep seeing the live values.
    pub fn reset_values<V: Variant>(&mut self) -> Result<(), StateError> {
        let entry = self
            .dimensions
            .get(&DimensionId::of::<V>())
            .ok_or(StateError::UnregisteredDimension(V::DIMENSION))?;
        let declared = (entry.translate)();
        for record in declared.records() {
            if let Some(live) = entry.table.get(record.name()) {
                live.restore_from(record);
            }
        }
        debug!("{}: reset values of {}", self.owner, V::DIMENSION);
        Ok(())
    }

    pub fn is_registered<V: Variant>(&self) -> bool {
        self.dimensions.contains_key(&DimensionId::of::<V>())
    }

    /// Registered dimensions in registration order.
    pub fn dimensions(&self) -> &[DimensionId] {
        &self.order
    }

    pub fn registered_count(&self) -> usize {
        self.order.len()
    }

    /// Find a registered dimension by name.
    pub fn dimension_by_name(&self, name: &str) -> Option<DimensionId> {
        self.order.iter().copied().find(|id| id.name() == name)
    }

    // ─── Active state ───────────────────────────────────────────────

    /// Select `state` as the active variant of its dimension.
    pub fn try_set_state<V: Variant>(&mut self, state: V) -> Result<(), StateError> {
        self.try_set_state_opt(Some(state))
    }

    /// Like [`try_set_state`](Self::try_set_state), for a state that may be absent.
    pub fn try_set_state_opt<V: Variant>(&mut self, state: Option<V>) -> Result<(), StateError> {
        let Some(state) = state else {
            return Err(StateError::NullState {
                owner: self.owner.clone(),
            });
        };

        let entry = self
            .dimensions
            .get_mut(&DimensionId::of::<V>())
            .ok_or(StateError::UnregisteredDimension(V::DIMENSION))?;
        if !entry.table.contains(state.name()) {
            return Err(StateError::UnknownInstance {
                dimension: V::DIMENSION,
                instance: state.name().to_string(),
            });
        }
        entry.active = Some(state.name());
        Ok(())
    }

    /// Logging form of [`try_set_state`](Self::try_set_state); failures keep the prior state.
    pub fn set_state<V: Variant>(&mut self, state: V) {
        self.set_state_opt(Some(state));
    }

    /// Logging form of [`try_set_state_opt`](Self::try_set_state_opt).
    pub fn set_state_opt<V: Variant>(&mut self, state: Option<V>) {
        if let Err(e) = self.try_set_state_opt(state) {
            error!("{}: setState failed: {}", self.owner, e);
        }
    }

    /// Select a state by dimension and variant name.
    pub fn try_set_state_named(
        &mut self,
        dimension: &str,
        variant: &str,
    ) -> Result<(), StateError> {
        let id = self
            .dimension_by_name(dimension)
            .ok_or_else(|| StateError::UnknownDimension(dimension.to_string()))?;
        let entry = self
            .dimensions
            .get_mut(&id)
            .ok_or(StateError::UnregisteredDimension(id.name()))?;
        let name = entry
            .variants
            .iter()
            .copied()
            .find(|v| *v == variant)
            .ok_or_else(|| StateError::UnknownVariant {
                dimension: dimension.to_string(),
                variant: variant.to_string(),
            })?;
        entry.active = Some(name);
        Ok(())
    }

    pub fn set_state_named(&mut self, dimension: &str, variant: &str) {
        if let Err(e) = self.try_set_state_named(dimension, variant) {
            error!("{}: setState failed: {}", self.owner, e);
        }
    }

    /// Active variant of dimension `V`.
    ///
    /// An unregistered dimension falls back to its first declared variant
    /// (with a warning). The fallback is not stored.
    pub fn get_state<V: Variant>(&self) -> Option<V> {
        match self.dimensions.get(&DimensionId::of::<V>()) {
            Some(entry) => match entry.active {
                Some(name) => V::from_name(name),
                None => {
                    error!("{}: {}", self.owner, StateError::NoActiveState(V::DIMENSION));
                    None
                }
            },
            None => {
                warn!(
                    "{}: no state found for dimension {}, using first declared variant",
                    self.owner,
                    V::DIMENSION
                );
                let first = V::variants().first().copied();
                if first.is_none() {
                    error!("{}: {}", self.owner, StateError::EmptyDimension(V::DIMENSION));
                }
                first
            }
        }
    }

    /// Active variant name of a registered dimension.
    pub fn active_name(&self, id: DimensionId) -> Option<&'static str> {
        self.dimensions.get(&id).and_then(|e| e.active)
    }

    /// Record of `instance` in dimension `id`.
    pub fn record(&self, id: DimensionId, instance: &str) -> Option<Arc<Record>> {
        self.dimensions.get(&id).and_then(|e| e.table.get(instance))
    }

    /// Record of the active state in dimension `id`.
    pub fn active_record(&self, id: DimensionId) -> Option<Arc<Record>> {
        let entry = self.dimensions.get(&id)?;
        entry.table.get(entry.active?)
    }

    // ─── Resolver ───────────────────────────────────────────────────

    /// Resolve every omitted part of `query`.
    pub fn resolve(&self, query: &StateQuery, access: Access) -> Result<Resolved, StateError> {
        let (dimension, entry) = self.resolve_dimension(query.dimension)?;

        let instance = match query.instance.as_deref() {
            Some(name) => name,
            None => entry.active.ok_or(StateError::NoActiveState(dimension.name()))?,
        };
        let record = entry
            .table
            .get(instance)
            .ok_or_else(|| StateError::UnknownInstance {
                dimension: dimension.name(),
                instance: instance.to_string(),
            })?;

        let field = match query.field.as_deref() {
            Some(field) => {
                if access == Access::Read && !record.contains(field) {
                    return Err(StateError::UnknownField {
                        instance: record.name().to_string(),
                        field: field.to_string(),
                    });
                }
                field.to_string()
            }
            None => record
                .single_field()
                .map_err(|count| StateError::FieldCount {
                    instance: record.name().to_string(),
                    count,
                })?,
        };

        Ok(Resolved {
            dimension,
            record,
            field,
        })
    }

    fn resolve_dimension(
        &self,
        requested: Option<DimensionId>,
    ) -> Result<(DimensionId, &DimensionEntry), StateError> {
        let id = match requested {
            Some(id) => id,
            None => match self.order.as_slice() {
                [] => return Err(StateError::NoDimensions),
                [only] => *only,
                many => {
                    return Err(StateError::AmbiguousDimension { count: many.len() });
                }
            },
        };
        self.dimensions
            .get(&id)
            .map(|entry| (id, entry))
            .ok_or(StateError::UnregisteredDimension(id.name()))
    }

    // ─── Values ─────────────────────────────────────────────────────

    pub fn try_get_state_value(&self, query: &StateQuery) -> Result<FieldValue, StateError> {
        let resolved = self.resolve(query, Access::Read)?;
        resolved
            .record
            .get(&resolved.field)
            .ok_or_else(|| StateError::UnknownField {
                instance: resolved.record.name().to_string(),
                field: resolved.field.clone(),
            })
    }

    /// Read a field value; failures are logged and yield `None`.
    pub fn get_state_value(&self, query: &StateQuery) -> Option<FieldValue> {
        self.try_get_state_value(query)
            .inspect_err(|e| error!("{}: getStateValue failed: {}", self.owner, e))
            .ok()
    }

    /// Read a numeric field.
    pub fn get_number(&self, query: &StateQuery) -> Option<f64> {
        self.get_typed(query)
    }

    /// Read a text field.
    pub fn get_text(&self, query: &StateQuery) -> Option<String> {
        self.get_typed(query)
    }

    /// Read a flag field.
    pub fn get_flag(&self, query: &StateQuery) -> Option<bool> {
        self.get_typed(query)
    }

    fn get_typed<T>(&self, query: &StateQuery) -> Option<T>
    where
        T: TryFrom<FieldValue, Error = StateError>,
    {
        let value = self.get_state_value(query)?;
        T::try_from(value)
            .inspect_err(|e| error!("{}: getStateValue failed: {}", self.owner, e))
            .ok()
    }

    /// Write a field value.
    ///
    /// A write naming a field the record does not have adds that field.
    pub fn try_modify_state_value(
        &self,
        query: &StateQuery,
        value: impl Into<FieldValue>,
    ) -> Result<(), StateError> {
        let resolved = self.resolve(query, Access::Write)?;
        resolved.record.set(&resolved.field, value);
        Ok(())
    }

    /// Logging form of [`try_modify_state_value`](Self::try_modify_state_value).
    pub fn modify_state_value(&self, query: &StateQuery, value: impl Into<FieldValue>) {
        if let Err(e) = self.try_modify_state_value(query, value) {
            error!("{}: modifyStateValue failed: {}", self.owner, e);
        }
    }
}

impl std::fmt::Debug for StateRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for id in &self.order {
            map.entry(&id.name(), &self.active_name(*id));
        }
        map.finish()
    }
}
