// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Conversion of schemaless stream records into [`Event`]s.
//!
//! A record value is a JSON document such as a Filebeat line:
//!
//! ```json
//! {"message": "Test log message", "host": {"name": "server1"}, "log": {"file": {"path": "/var/log/syslog"}}}
//! ```
//!
//! Field names are dotted paths. A flat key (`"host.name"`) wins over a nested
//! lookup (`host` → `name`).

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use serde_json::Value;

use crate::event::Event;

/// Record fields that feed the event message and server level fields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogFieldMapping {
    pub message: String,
    pub server_host: Option<String>,
    pub logfile: Option<String>,
    pub parser: Option<String>,
}

impl Default for LogFieldMapping {
    fn default() -> Self {
        Self {
            message: "message".to_string(),
            server_host: Some("host.name".to_string()),
            logfile: Some("log.file.path".to_string()),
            parser: None,
        }
    }
}

/// A record read from the source stream, with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub value: Value,
}

#[derive(Debug, Clone, Default)]
pub struct EventMapper {
    fields: LogFieldMapping,
}

impl EventMapper {
    #[must_use]
    pub fn new(fields: LogFieldMapping) -> Self {
        EventMapper { fields }
    }

    /// Maps one record, stamping it with the current time.
    #[must_use]
    pub fn map_record(&self, record: &SourceRecord) -> Event {
        self.map_record_at(record, now_nanos())
    }

    /// Maps records in order, all stamped with the same time.
    #[must_use]
    pub fn map_records(&self, records: &[SourceRecord]) -> Vec<Event> {
        let timestamp = now_nanos();
        records
            .iter()
            .map(|record| self.map_record_at(record, timestamp))
            .collect()
    }

    #[must_use]
    pub fn map_record_at(&self, record: &SourceRecord, timestamp_nanos: i64) -> Event {
        let value = &record.value;
        let message = match value {
            Value::Object(_) => lookup(value, &self.fields.message)
                .and_then(render)
                .unwrap_or_default(),
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        let field = |path: &Option<String>| {
            path.as_deref()
                .and_then(|path| lookup(value, path))
                .and_then(render)
        };

        Event {
            stream_id: record.topic.clone(),
            partition: record.partition,
            sequence_offset: record.offset,
            timestamp_nanos,
            message,
            logfile: field(&self.fields.logfile),
            server_host: field(&self.fields.server_host),
            parser: field(&self.fields.parser),
        }
    }
}

fn now_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
        .unwrap_or_default()
}

fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    let object = value.as_object()?;
    if let Some(found) = object.get(path) {
        return Some(found);
    }
    path.split('.')
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(offset: i64, value: Value) -> SourceRecord {
        SourceRecord {
            topic: "test-topic".to_string(),
            partition: 0,
            offset,
            value,
        }
    }

    #[test]
    fn test_flat_keys() {
        let mapper = EventMapper::default();
        let event = mapper.map_record_at(
            &record(
                7,
                json!({
                    "message": "Test log message0",
                    "host.name": "server1",
                    "log.file.path": "/var/log/syslog",
                    "agent.type": "filebeat"
                }),
            ),
            100,
        );

        assert_eq!(event.stream_id, "test-topic");
        assert_eq!(event.sequence_offset, 7);
        assert_eq!(event.timestamp_nanos, 100);
        assert_eq!(event.message, "Test log message0");
        assert_eq!(event.server_host.as_deref(), Some("server1"));
        assert_eq!(event.logfile.as_deref(), Some("/var/log/syslog"));
        assert_eq!(event.parser, None);
    }

    #[test]
    fn test_nested_keys() {
        let mapper = EventMapper::default();
        let event = mapper.map_record_at(
            &record(
                0,
                json!({
                    "message": "hello",
                    "host": {"name": "server2"},
                    "log": {"file": {"path": "/var/log/auth.log"}}
                }),
            ),
            1,
        );

        assert_eq!(event.server_host.as_deref(), Some("server2"));
        assert_eq!(event.logfile.as_deref(), Some("/var/log/auth.log"));
    }

    #[test]
    fn test_custom_fields_and_non_string_values() {
        let mapper = EventMapper::new(LogFieldMapping {
            message: "msg".to_string(),
            server_host: None,
            logfile: Some("file".to_string()),
            parser: Some("parser".to_string()),
        });
        let event = mapper.map_record_at(
            &record(0, json!({"msg": 42, "file": null, "parser": "systemLogPST", "host.name": "ignored"})),
            1,
        );

        assert_eq!(event.message, "42");
        assert_eq!(event.logfile, None);
        assert_eq!(event.server_host, None);
        assert_eq!(event.parser.as_deref(), Some("systemLogPST"));
    }

    #[test]
    fn test_missing_message_and_scalar_records() {
        let mapper = EventMapper::default();
        assert_eq!(mapper.map_record_at(&record(0, json!({"other": 1})), 1).message, "");
        assert_eq!(mapper.map_record_at(&record(0, json!("raw line")), 1).message, "raw line");
        assert_eq!(mapper.map_record_at(&record(0, Value::Null), 1).message, "");
        assert_eq!(mapper.map_record_at(&record(0, json!([1, 2])), 1).message, "[1,2]");
    }

    #[test]
    fn test_map_records_preserves_order() {
        let mapper = EventMapper::default();
        let records: Vec<_> = (0..5)
            .map(|i| record(i, json!({ "message": format!("m{i}") })))
            .collect();
        let events = mapper.map_records(&records);

        let offsets: Vec<_> = events.iter().map(|e| e.sequence_offset).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3, 4]);
        assert!(events.iter().all(|e| e.timestamp_nanos > 0));
        assert!(events.windows(2).all(|w| w[0].timestamp_nanos == w[1].timestamp_nanos));
    }
}
