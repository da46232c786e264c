pub mod logs;

use crate::constants::{DURATION_FIELD, EPOCH_FIELD, EVENT_FIELD, RUN_NAME_FIELD, TIMESTAMP_FIELD};
use crate::types::run_context::RunContext;
use chrono::{DateTime, SecondsFormat, Utc};
use logs::Logs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    TrainBegin,
    EpochBegin,
    BatchBegin,
    BatchEnd,
    EpochEnd,
    TrainEnd,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::TrainBegin,
        EventKind::EpochBegin,
        EventKind::BatchBegin,
        EventKind::BatchEnd,
        EventKind::EpochEnd,
        EventKind::TrainEnd,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::TrainBegin => "train_begin",
            EventKind::EpochBegin => "epoch_begin",
            EventKind::BatchBegin => "batch_begin",
            EventKind::BatchEnd => "batch_end",
            EventKind::EpochEnd => "epoch_end",
            EventKind::TrainEnd => "train_end",
        }
    }

    /// Batch events are the only ones routed through the buffer.
    pub fn is_batch(&self) -> bool {
        matches!(self, EventKind::BatchBegin | EventKind::BatchEnd)
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Event specific keyword fields. Unset fields are left out of the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EventFields {
    pub epoch: Option<u64>,
    /// Whole seconds since the matching begin event.
    pub duration: Option<u64>,
}

impl EventFields {
    pub fn epoch(epoch: u64) -> Self {
        EventFields {
            epoch: Some(epoch),
            ..Default::default()
        }
    }

    fn merge_into(self, body: &mut Map<String, Value>) {
        if let Some(epoch) = self.epoch {
            body.insert(EPOCH_FIELD.to_string(), Value::from(epoch));
        }
        if let Some(duration) = self.duration {
            body.insert(DURATION_FIELD.to_string(), Value::from(duration));
        }
    }
}

/// The JSON object sent downstream for a single lifecycle event.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct EventDocument(Map<String, Value>);

impl EventDocument {
    /// Builds the document from four sources, each overwriting keys set by the
    /// previous one: base fields, converted logs, event fields, then the run's
    /// extra data.
    pub fn new(
        kind: EventKind,
        context: &RunContext,
        timestamp: DateTime<Utc>,
        logs: &Logs,
        fields: EventFields,
    ) -> Self {
        let mut body = Map::new();
        body.insert(
            TIMESTAMP_FIELD.to_string(),
            Value::String(timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
        );
        body.insert(EVENT_FIELD.to_string(), Value::from(kind.as_str()));
        body.insert(RUN_NAME_FIELD.to_string(), Value::from(context.run_name()));

        body.extend(logs.iter().map(|(key, value)| (key.clone(), value.to_json())));

        fields.merge_into(&mut body);

        body.extend(
            context
                .extra_data()
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );

        EventDocument(body)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

}

impl From<EventDocument> for Value {
    fn from(document: EventDocument) -> Self {
        Value::Object(document.0)
    }
}
