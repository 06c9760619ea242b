//! Records and the named-instance table.
//!
//! A `Record` is the mutable runtime copy of one declared variant. Its fields
//! live behind a `parking_lot::RwLock`, so a diagnostics thread holding an
//! `Arc<Record>` may read while the control cycle writes. Each `get`/`set` is
//! atomic on its own; reading several fields while another thread writes
//! several fields can observe a mix of old and new values.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use crate::value::FieldValue;

// ─── Record ─────────────────────────────────────────────────────────

/// Mutable named set of fields.
pub struct Record {
    name: String,
    fields: RwLock<Vec<(String, FieldValue)>>,
}

impl Record {
    /// Instance name (equal to the variant name it was translated from).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read a field.
    pub fn get(&self, field: &str) -> Option<FieldValue> {
        self.fields
            .read()
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.clone())
    }

    /// Overwrite a field, or append it if the record does not have it yet.
    pub fn set(&self, field: &str, value: impl Into<FieldValue>) {
        let value = value.into();
        let mut fields = self.fields.write();
        match fields.iter_mut().find(|(k, _)| k == field) {
            Some((_, slot)) => *slot = value,
            None => fields.push((field.to_string(), value)),
        }
    }

    /// Whether the record has the field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.read().iter().any(|(k, _)| k == field)
    }

    /// Field names in declaration order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.read().iter().map(|(k, _)| k.clone()).collect()
    }

    /// Field values in declaration order.
    pub fn values(&self) -> Vec<FieldValue> {
        self.fields.read().iter().map(|(_, v)| v.clone()).collect()
    }

    /// Snapshot of all `(field, value)` pairs.
    pub fn entries(&self) -> Vec<(String, FieldValue)> {
        self.fields.read().clone()
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.read().is_empty()
    }

    /// Replace every field with the fields of `other`, under one write lock.
    pub fn restore_from(&self, other: &Record) {
        let fresh = other.entries();
        *self.fields.write() = fresh;
    }

    /// Name of the only field, or `Err(count)` when there is not exactly one.
    pub fn single_field(&self) -> Result<String, usize> {
        let fields = self.fields.read();
        match fields.as_slice() {
            [(name, _)] => Ok(name.clone()),
            other => Err(other.len()),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        if self.name != other.name {
            return false;
        }
        let ours = self.entries();
        let theirs = other.entries();
        ours.len() == theirs.len()
            && ours
                .iter()
                .all(|(k, v)| theirs.iter().any(|(tk, tv)| tk == k && tv == v))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("name", &self.name)
            .field("fields", &*self.fields.read())
            .finish()
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{{", self.name)?;
        for (idx, (k, v)) in self.fields.read().iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}={v}")?;
        }
        f.write_str("}")
    }
}

// ─── RecordBuilder ──────────────────────────────────────────────────

/// Builds a `Record` field by field.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    name: String,
    fields: Vec<(String, FieldValue)>,
}

impl RecordBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field. Declaring the same name twice keeps the last value.
    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| k == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field.to_string(), value)),
        }
        self
    }

    /// Add a field whose value may fail to extract.
    ///
    /// A failure is logged and the field is left out; the remaining fields are
    /// still built.
    pub fn try_with<V, E>(self, field: &str, value: Result<V, E>) -> Self
    where
        V: Into<FieldValue>,
        E: fmt::Display,
    {
        match value {
            Ok(v) => self.with(field, v),
            Err(e) => {
                warn!("Error extracting field '{}' of '{}': {}", field, self.name, e);
                self
            }
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build(self) -> Record {
        Record {
            name: self.name,
            fields: RwLock::new(self.fields),
        }
    }
}

// ─── InstanceTable ──────────────────────────────────────────────────

/// All records of one dimension, keyed by instance name.
///
/// Records are handed out as `Arc<Record>` so readers outside the control
/// cycle can keep a handle.
#[derive(Debug, Default, Clone)]
pub struct InstanceTable {
    index: HashMap<String, usize>,
    records: Vec<Arc<Record>>,
}

impl InstanceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, replacing any record with the same name in place.
    pub fn insert(&mut self, record: Record) {
        let record = Arc::new(record);
        match self.index.get(record.name()) {
            Some(&idx) => self.records[idx] = record,
            None => {
                self.index.insert(record.name().to_string(), self.records.len());
                self.records.push(record);
            }
        }
    }

    /// Look up a record by name. Absent names yield `None`.
    pub fn get(&self, name: &str) -> Option<Arc<Record>> {
        self.index.get(name).map(|&idx| Arc::clone(&self.records[idx]))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Instance names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name())
    }

    /// Records in insertion order.
    pub fn records(&self) -> &[Arc<Record>] {
        &self.records
    }
}
