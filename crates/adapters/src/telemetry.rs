//! JSON telemetry adapter (counters and timers).

use crate::log_sink::LogSink;
use addon_forge_ports::{TelemetryPort, TelemetryTags};
use serde_json::Value;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Telemetry adapter that emits JSON lines.
#[derive(Clone)]
pub struct JsonTelemetry {
    sink: Arc<dyn LogSink>,
    base_tags: TelemetryTags,
}

impl JsonTelemetry {
    /// Create a telemetry adapter backed by the provided sink.
    #[must_use]
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            base_tags: TelemetryTags::new(),
        }
    }

    /// Set base tags applied to every metric.
    #[must_use]
    pub fn with_base_tags(mut self, tags: TelemetryTags) -> Self {
        self.base_tags = tags;
        self
    }

    fn emit(&self, metric_type: &str, name: &str, value: u64, unit: Option<&str>, tags: &TelemetryTags) {
        let mut payload = serde_json::Map::new();
        payload.insert("timestampMs".to_string(), Value::from(now_epoch_ms()));
        payload.insert("type".to_string(), Value::String(metric_type.to_string()));
        payload.insert("name".to_string(), Value::String(name.to_string()));
        payload.insert("value".to_string(), Value::from(value));
        if let Some(unit) = unit {
            payload.insert("unit".to_string(), Value::String(unit.to_string()));
        }
        if !tags.is_empty() {
            let mut map = serde_json::Map::new();
            for (key, tag) in tags {
                map.insert(key.to_string(), Value::String(tag.to_string()));
            }
            payload.insert("tags".to_string(), Value::Object(map));
        }

        if let Ok(mut line) = serde_json::to_string(&Value::Object(payload)) {
            line.push('\n');
            self.sink.write_line(&line);
        }
    }

    fn merged_tags(&self, tags: Option<&TelemetryTags>) -> TelemetryTags {
        let mut merged = self.base_tags.clone();
        if let Some(tags) = tags {
            for (key, value) in tags {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged
    }
}

impl TelemetryPort for JsonTelemetry {
    fn increment_counter(&self, name: &str, value: u64, tags: Option<&TelemetryTags>) {
        let tags = self.merged_tags(tags);
        self.emit("counter", name, value, None, &tags);
    }

    fn record_timer_ms(&self, name: &str, duration_ms: u64, tags: Option<&TelemetryTags>) {
        let tags = self.merged_tags(tags);
        self.emit("timer", name, duration_ms, Some("ms"), &tags);
    }
}

fn now_epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .ok()
        .and_then(|duration| u64::try_from(duration.as_millis()).ok())
        .unwrap_or_default()
}
