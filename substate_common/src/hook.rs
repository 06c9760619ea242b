//! Hook bindings: live external values copied into record fields.
//!
//! A hook is keyed by `(dimension, variant, slot)` and holds a reference to
//! an externally owned value. Applying the table copies each hook's current
//! value into the field named after the hooked variant, in the record of the
//! dimension's active state. Application happens on demand (after every hook
//! change, or when the owner calls [`HookTable::apply`]), never implicitly
//! once per cycle.
//!
//! Only finite numbers are accepted. A provider that yields anything else is
//! logged and skipped; the other hooks are still applied. A hook whose target
//! field does not exist in the active record is also skipped instead of
//! silently creating the field.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, trace, warn};

use crate::consts::DEFAULT_HOOK_SLOT;
use crate::error::StateError;
use crate::registry::{Access, StateQuery, StateRegistry};
use crate::value::FieldValue;
use crate::variant::{DimensionId, Variant};

// ─── NumericCell ────────────────────────────────────────────────────

/// Shared mutable `f64`.
///
/// Clones share the same storage; any holder may update it from any thread.
#[derive(Clone, Default)]
pub struct NumericCell(Arc<AtomicU64>);

impl NumericCell {
    pub fn new(value: f64) -> Self {
        Self(Arc::new(AtomicU64::new(value.to_bits())))
    }

    #[inline]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub fn set(&self, value: f64) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

impl fmt::Debug for NumericCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("NumericCell").field(&self.get()).finish()
    }
}

// ─── HookSource ─────────────────────────────────────────────────────

/// Lazily evaluated hook value.
pub type Provider = Arc<dyn Fn() -> FieldValue + Send + Sync>;

/// External value bound by a hook.
#[derive(Clone)]
pub enum HookSource {
    /// Shared numeric cell.
    Cell(NumericCell),
    /// Closure evaluated at application time.
    Provider(Provider),
}

impl HookSource {
    /// Wrap a closure.
    pub fn provider(f: impl Fn() -> FieldValue + Send + Sync + 'static) -> Self {
        Self::Provider(Arc::new(f))
    }

    /// Current value.
    pub fn current(&self) -> FieldValue {
        match self {
            Self::Cell(cell) => FieldValue::Number(cell.get()),
            Self::Provider(f) => f(),
        }
    }
}

impl From<NumericCell> for HookSource {
    fn from(cell: NumericCell) -> Self {
        Self::Cell(cell)
    }
}

impl From<&NumericCell> for HookSource {
    fn from(cell: &NumericCell) -> Self {
        Self::Cell(cell.clone())
    }
}

impl fmt::Debug for HookSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cell(cell) => cell.fmt(f),
            Self::Provider(_) => f.write_str("Provider(..)"),
        }
    }
}

// ─── HookTable ──────────────────────────────────────────────────────

/// Hook address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HookKey {
    pub dimension: DimensionId,
    pub variant: &'static str,
    pub slot: u32,
}

impl HookKey {
    pub fn new<V: Variant>(variant: V, slot: u32) -> Self {
        Self {
            dimension: DimensionId::of::<V>(),
            variant: variant.name(),
            slot,
        }
    }
}

/// Outcome of one application pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookReport {
    /// Hooks whose value was written.
    pub applied: usize,
    /// Hooks rejected for a non-numeric value.
    pub rejected: usize,
    /// Hooks whose target could not be resolved.
    pub skipped: usize,
}

/// Owned table of hook bindings.
#[derive(Debug, Default)]
pub struct HookTable {
    hooks: BTreeMap<HookKey, HookSource>,
}

impl HookTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `source` to `(variant, slot)`, replacing any previous binding there.
    pub fn set_hook<V: Variant>(&mut self, variant: V, source: impl Into<HookSource>, slot: u32) {
        self.hooks.insert(HookKey::new(variant, slot), source.into());
    }

    /// Bind `source` to `variant` at [`DEFAULT_HOOK_SLOT`].
    pub fn set_hook_default<V: Variant>(&mut self, variant: V, source: impl Into<HookSource>) {
        self.set_hook(variant, source, DEFAULT_HOOK_SLOT);
    }

    /// Remove the hook at `(variant, slot)`. Returns whether one existed.
    pub fn remove_hook<V: Variant>(&mut self, variant: V, slot: u32) -> bool {
        let removed = self.hooks.remove(&HookKey::new(variant, slot)).is_some();
        if !removed {
            warn!(
                "No hook registered for {}::{}[{}]",
                V::DIMENSION,
                variant.name(),
                slot
            );
        }
        removed
    }

    /// Remove every slot hooked on `variant`. Returns how many were removed.
    pub fn remove_hooks<V: Variant>(&mut self, variant: V) -> usize {
        let dimension = DimensionId::of::<V>();
        let before = self.hooks.len();
        self.hooks
            .retain(|key, _| !(key.dimension == dimension && key.variant == variant.name()));
        before - self.hooks.len()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &HookKey> {
        self.hooks.keys()
    }

    /// Copy every hooked value into `registry`.
    pub fn apply(&self, registry: &StateRegistry) -> HookReport {
        let mut report = HookReport::default();
        for (key, source) in &self.hooks {
            let value = source.current();
            let number = match value.as_f64() {
                Some(v) if v.is_finite() => v,
                _ => {
                    error!(
                        "{}: {}",
                        registry.owner(),
                        StateError::NonNumericHook {
                            variant: key.variant,
                            slot: key.slot,
                            found: value.to_string(),
                        }
                    );
                    report.rejected += 1;
                    continue;
                }
            };

            let query = StateQuery::new()
                .dimension_id(key.dimension)
                .field(key.variant);
            match registry.resolve(&query, Access::Read) {
                Ok(target) => {
                    target.record.set(&target.field, number);
                    trace!(
                        "hook {}::{}[{}] -> {}.{} = {}",
                        key.dimension,
                        key.variant,
                        key.slot,
                        target.record.name(),
                        target.field,
                        number
                    );
                    report.applied += 1;
                }
                Err(e) => {
                    error!(
                        "{}: hook {}::{}[{}] has no target: {}",
                        registry.owner(),
                        key.dimension,
                        key.variant,
                        key.slot,
                        e
                    );
                    report.skipped += 1;
                }
            }
        }
        report
    }
}
