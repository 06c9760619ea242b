//! Telemetry sinks.
//!
//! Subsystems mirror their active state names and numeric fields to a sink
//! once per cycle. [`TracingTelemetry`] turns every entry into a `debug!`
//! event; [`MemoryTelemetry`] keeps the latest value per key and can dump the
//! snapshot as JSON.

use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use substate_common::value::FieldValue;

/// Destination for human-readable strings and numeric dumps.
pub trait TelemetrySink: Send + Sync {
    fn put_string(&self, key: &str, value: &str);
    fn put_number(&self, key: &str, value: f64);
}

/// Emits every entry as a `tracing` event under the `telemetry` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn put_string(&self, key: &str, value: &str) {
        debug!(target: "telemetry", key, value);
    }

    fn put_number(&self, key: &str, value: f64) {
        debug!(target: "telemetry", key, value);
    }
}

/// Latest value per key, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryTelemetry {
    entries: Arc<RwLock<BTreeMap<String, FieldValue>>>,
}

impl MemoryTelemetry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<FieldValue> {
        self.entries.read().get(key).cloned()
    }

    pub fn number(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Copy of every entry, ordered by key.
    pub fn snapshot(&self) -> BTreeMap<String, FieldValue> {
        self.entries.read().clone()
    }

    /// Pretty-printed JSON object of the snapshot.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&*self.entries.read())
    }
}

impl TelemetrySink for MemoryTelemetry {
    fn put_string(&self, key: &str, value: &str) {
        self.entries
            .write()
            .insert(key.to_string(), FieldValue::from(value));
    }

    fn put_number(&self, key: &str, value: f64) {
        self.entries
            .write()
            .insert(key.to_string(), FieldValue::Number(value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_keeps_latest_value() {
        let sink = MemoryTelemetry::new();
        sink.put_string("intake IntakeState", "IDLE");
        sink.put_string("intake IntakeState", "INTAKE");
        sink.put_number("intake IntakeState/intakeSpeed", 0.8);

        assert_eq!(sink.len(), 2);
        assert_eq!(sink.text("intake IntakeState").as_deref(), Some("INTAKE"));
        assert_eq!(sink.number("intake IntakeState/intakeSpeed"), Some(0.8));
        assert_eq!(sink.number("intake IntakeState"), None);
    }

    #[test]
    fn clones_share_entries() {
        let sink = MemoryTelemetry::new();
        let shared: Arc<dyn TelemetrySink> = Arc::new(sink.clone());
        shared.put_number("shooter AngleState/position", 35.0);
        assert_eq!(sink.number("shooter AngleState/position"), Some(35.0));
    }

    #[test]
    fn json_dump_is_flat_object() {
        let sink = MemoryTelemetry::new();
        sink.put_string("deflector DeflectorState", "UP");
        sink.put_number("deflector DeflectorState/position", 30.0);

        let json: serde_json::Value = serde_json::from_str(&sink.to_json().unwrap()).unwrap();
        assert_eq!(json["deflector DeflectorState"], "UP");
        assert_eq!(json["deflector DeflectorState/position"], 30.0);
    }

    #[test]
    fn tracing_sink_accepts_entries() {
        let sink = TracingTelemetry;
        sink.put_string("intake IntakeState", "IDLE");
        sink.put_number("intake IntakeState/feederSpeed", 0.0);
    }
}
