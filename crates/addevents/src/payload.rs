// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! addEvents request body serialization.
//!
//! The body is streamed straight into an [`std::io::Write`] sink; no
//! intermediate `serde_json::Value` or `String` is built. Layout:
//!
//! ```json
//! {
//!   "token":   "<api key>",
//!   "session": "<session id>",
//!   "events":  [{"ts":100,"si":"topic-0","sn":0,"attrs":{"message":"m1"},"log":"0"}],
//!   "logs":    [{"id":"0","attrs":{"source":"server1","logfile":"/var/log/syslog"}}]
//! }
//! ```
//!
//! [`ChunkedBody`] yields the same bytes piecewise for a streaming HTTP upload.

use std::io::Write;
use std::sync::Arc;

use serde::ser::{Error as _, SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};

use crate::error::PayloadError;
use crate::event::{Event, LogKey};
use crate::log_ids::{LogEntry, LogIds};

/// One addEvents request: the batch plus the credentials it is sent with.
#[derive(Debug, Clone, Copy)]
pub struct AddEventsRequest<'a> {
    token: &'a str,
    session: &'a str,
    events: &'a [Event],
}

impl<'a> AddEventsRequest<'a> {
    #[must_use]
    pub fn new(token: &'a str, session: &'a str, events: &'a [Event]) -> Self {
        AddEventsRequest {
            token,
            session,
            events,
        }
    }

    #[must_use]
    pub fn events(&self) -> &'a [Event] {
        self.events
    }

    /// Assigns log ids for this batch and streams the body into `writer`.
    ///
    /// On success the flushed writer is handed back. On failure the writer
    /// has been dropped before the error is returned.
    pub fn write_json<W: Write>(&self, writer: W) -> Result<W, PayloadError> {
        let log_ids = LogIds::assign(self.events);
        self.write_json_with(&log_ids, writer)
    }

    /// Streams the body using a log id table computed by the caller.
    ///
    /// Every event of the batch must be registered in `log_ids`.
    pub fn write_json_with<W: Write>(
        &self,
        log_ids: &LogIds<'_>,
        writer: W,
    ) -> Result<W, PayloadError> {
        let body = RequestBody {
            request: self,
            log_ids,
        };
        let mut serializer = serde_json::Serializer::new(writer);
        body.serialize(&mut serializer).map_err(|e| {
            if e.is_io() {
                PayloadError::Io(e.into())
            } else {
                PayloadError::Json(e)
            }
        })?;
        let mut writer = serializer.into_inner();
        writer.flush()?;
        Ok(writer)
    }

    /// Serializes the body into a freshly allocated buffer.
    pub fn to_vec(&self) -> Result<Vec<u8>, PayloadError> {
        // Rough per-event overhead of the fixed keys, avoids most regrowth.
        let capacity = self
            .events
            .iter()
            .map(|e| e.message.len() + e.stream_id.len() + 64)
            .sum::<usize>()
            + 128;
        self.write_json(Vec::with_capacity(capacity))
    }
}

struct RequestBody<'r, 'a> {
    request: &'r AddEventsRequest<'a>,
    log_ids: &'r LogIds<'r>,
}

impl Serialize for RequestBody<'_, '_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_struct("AddEventsRequest", 4)?;
        body.serialize_field("token", self.request.token)?;
        body.serialize_field("session", self.request.session)?;
        body.serialize_field(
            "events",
            &Events {
                events: self.request.events,
                log_ids: self.log_ids,
            },
        )?;
        body.serialize_field("logs", &Logs(self.log_ids))?;
        body.end()
    }
}

struct Events<'r> {
    events: &'r [Event],
    log_ids: &'r LogIds<'r>,
}

impl Serialize for Events<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.events.iter().map(|event| EventBody {
            event,
            log_id: self.log_ids.id_of(&event.log_key()),
        }))
    }
}

struct EventBody<'r> {
    event: &'r Event,
    log_id: Option<usize>,
}

impl Serialize for EventBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(log_id) = self.log_id else {
            return Err(S::Error::custom(format!(
                "event {}-{}@{} has no log id",
                self.event.stream_id, self.event.partition, self.event.sequence_offset
            )));
        };

        let mut body = serializer.serialize_struct("Event", 5)?;
        body.serialize_field("ts", &self.event.timestamp_nanos)?;
        body.serialize_field(
            "si",
            &format_args!("{}-{}", self.event.stream_id, self.event.partition),
        )?;
        body.serialize_field("sn", &self.event.sequence_offset)?;
        body.serialize_field("attrs", &MessageAttrs(&self.event.message))?;
        body.serialize_field("log", &format_args!("{log_id}"))?;
        body.end()
    }
}

struct MessageAttrs<'r>(&'r str);

impl Serialize for MessageAttrs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut attrs = serializer.serialize_struct("EventAttrs", 1)?;
        attrs.serialize_field("message", self.0)?;
        attrs.end()
    }
}

struct Logs<'r>(&'r LogIds<'r>);

impl Serialize for Logs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.entries().map(LogBody))
    }
}

struct LogBody<'a>(LogEntry<'a>);

impl Serialize for LogBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut body = serializer.serialize_struct("Log", 2)?;
        body.serialize_field("id", &format_args!("{}", self.0.id))?;
        body.serialize_field("attrs", &LogAttrs(self.0.key))?;
        body.end()
    }
}

struct LogAttrs<'a>(LogKey<'a>);

impl Serialize for LogAttrs<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = [
            ("source", self.0.server_host),
            ("logfile", self.0.logfile),
            ("parser", self.0.parser),
        ];
        let len = fields.iter().filter(|(_, v)| v.is_some()).count();
        let mut attrs = serializer.serialize_map(Some(len))?;
        for (name, value) in fields {
            if let Some(value) = value {
                attrs.serialize_entry(name, value)?;
            }
        }
        attrs.end()
    }
}

/// Owned addEvents body, rendered one piece at a time.
///
/// Yields the head (`{"token":..,"session":..,"events":[`), one chunk per
/// event, one chunk per `logs` entry and the closing brackets. Concatenated,
/// the chunks equal the output of [`AddEventsRequest::write_json`]. Only the
/// log id of each event is kept between chunks.
#[derive(Debug)]
pub struct ChunkedBody {
    token: String,
    session: String,
    events: Arc<[Event]>,
    event_logs: Vec<Option<usize>>,
    // Position of the event that introduced each log id.
    origins: Vec<usize>,
    next: Part,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part {
    Head,
    Event(usize),
    LogsHead,
    Log(usize),
    Tail,
    Done,
}

impl ChunkedBody {
    #[must_use]
    pub fn new(
        token: impl Into<String>,
        session: impl Into<String>,
        events: Arc<[Event]>,
    ) -> Self {
        let log_ids = LogIds::assign(&events);
        let event_logs: Vec<Option<usize>> = events
            .iter()
            .map(|event| log_ids.id_of(&event.log_key()))
            .collect();
        let mut origins = Vec::with_capacity(log_ids.len());
        for (position, id) in event_logs.iter().enumerate() {
            if *id == Some(origins.len()) {
                origins.push(position);
            }
        }

        ChunkedBody {
            token: token.into(),
            session: session.into(),
            events,
            event_logs,
            origins,
            next: Part::Head,
        }
    }

    #[must_use]
    pub fn event_count(&self) -> usize {
        self.events.len()
    }

    /// Number of entries in the `logs` table.
    #[must_use]
    pub fn log_count(&self) -> usize {
        self.origins.len()
    }

    fn after_event(&self, position: usize) -> Part {
        if position < self.events.len() {
            Part::Event(position)
        } else {
            Part::LogsHead
        }
    }

    fn after_log(&self, id: usize) -> Part {
        if id < self.origins.len() {
            Part::Log(id)
        } else {
            Part::Tail
        }
    }

    /// Appends `part` to `chunk` and returns the part that follows it.
    fn render(&self, part: Part, chunk: &mut Vec<u8>) -> Result<Part, PayloadError> {
        let next = match part {
            Part::Head => {
                chunk.extend_from_slice(br#"{"token":"#);
                serde_json::to_writer(&mut *chunk, &self.token)?;
                chunk.extend_from_slice(br#","session":"#);
                serde_json::to_writer(&mut *chunk, &self.session)?;
                chunk.extend_from_slice(br#","events":["#);
                self.after_event(0)
            }
            Part::Event(position) => {
                if position > 0 {
                    chunk.push(b',');
                }
                let body = EventBody {
                    event: &self.events[position],
                    log_id: self.event_logs[position],
                };
                serde_json::to_writer(&mut *chunk, &body)?;
                self.after_event(position + 1)
            }
            Part::LogsHead => {
                chunk.extend_from_slice(br#"],"logs":["#);
                self.after_log(0)
            }
            Part::Log(id) => {
                if id > 0 {
                    chunk.push(b',');
                }
                let entry = LogEntry {
                    id,
                    key: self.events[self.origins[id]].log_key(),
                };
                serde_json::to_writer(&mut *chunk, &LogBody(entry))?;
                self.after_log(id + 1)
            }
            Part::Tail => {
                chunk.extend_from_slice(b"]}");
                Part::Done
            }
            Part::Done => Part::Done,
        };
        Ok(next)
    }
}

impl Iterator for ChunkedBody {
    type Item = Result<Vec<u8>, PayloadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next == Part::Done {
            return None;
        }
        let mut chunk = Vec::new();
        match self.render(self.next, &mut chunk) {
            Ok(next) => {
                self.next = next;
                Some(Ok(chunk))
            }
            Err(e) => {
                self.next = Part::Done;
                Some(Err(e))
            }
        }
    }
}
