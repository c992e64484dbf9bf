//! In-memory history capture for an engine.
//!
//! The log is append-only while capture is enabled. Toggling capture, in
//! either direction, discards everything recorded so far, so a caller that
//! needs the previous log must retrieve it before toggling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Who produced a history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistorySource {
    /// Recorded by the engine for a state-changing call.
    Engine,
    /// Pushed by a caller as a diagnostic marker.
    User,
}

/// One entry of the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "type")]
    pub event_type: String,
    pub source: HistorySource,
    pub timestamp: DateTime<Utc>,
    pub properties: Value,
}

/// Serialized form of the whole log.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryLog {
    pub events: Vec<HistoryRecord>,
}

impl HistoryLog {
    /// Parse a log produced by [`HistoryRecorder::to_json`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Records pushed by callers, in push order.
    pub fn user_events(&self) -> impl Iterator<Item = &HistoryRecord> {
        self.events
            .iter()
            .filter(|record| record.source == HistorySource::User)
    }
}

/// Append-only event log with an on/off switch.
#[derive(Debug, Default)]
pub struct HistoryRecorder {
    enabled: bool,
    events: Vec<HistoryRecord>,
}

impl HistoryRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Enable or disable capture. Always clears the log.
    pub fn toggle(&mut self, enabled: bool) {
        self.enabled = enabled;
        self.events.clear();
    }

    /// Record an engine event. Ignored while capture is disabled.
    pub fn record(&mut self, event_type: &str, properties: Value) {
        self.append(event_type, HistorySource::Engine, properties);
    }

    /// Record a caller event. Ignored while capture is disabled.
    ///
    /// `properties_json` that does not parse as JSON is kept verbatim as a
    /// JSON string.
    pub fn push(&mut self, event_type: &str, properties_json: &str) {
        if !self.enabled {
            return;
        }
        let properties = serde_json::from_str(properties_json)
            .unwrap_or_else(|_| Value::String(properties_json.to_string()));
        self.append(event_type, HistorySource::User, properties);
    }

    fn append(&mut self, event_type: &str, source: HistorySource, properties: Value) {
        if !self.enabled {
            return;
        }
        self.events.push(HistoryRecord {
            event_type: event_type.to_string(),
            source,
            timestamp: Utc::now(),
            properties,
        });
    }

    /// Serialize the whole log as `{"events": [...]}`.
    pub fn to_json(&self) -> String {
        #[derive(Serialize)]
        struct Borrowed<'a> {
            events: &'a [HistoryRecord],
        }
        // Serializing plain records into a String cannot fail
        serde_json::to_string(&Borrowed {
            events: &self.events,
        })
        .unwrap_or_else(|_| String::from(r#"{"events":[]}"#))
    }
}
