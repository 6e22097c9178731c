// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! The addEvents record model.
//!
//! An [`Event`] is one log line plus the stream position it was read from.
//! Its server level fields (`logfile`, `server_host`, `parser`) repeat across
//! many events and are deduplicated into the request's `logs` table, keyed by
//! [`LogKey`].

/// A single log record bound for the addEvents API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    /// Originating topic or queue name.
    pub stream_id: String,
    pub partition: i32,
    /// Monotonic position within `{stream_id, partition}`.
    pub sequence_offset: i64,
    /// Nanoseconds since the Unix epoch.
    pub timestamp_nanos: i64,
    pub message: String,

    // Server level fields
    pub logfile: Option<String>,
    pub server_host: Option<String>,
    pub parser: Option<String>,
}

impl Event {
    #[must_use]
    pub fn new(
        stream_id: impl Into<String>,
        partition: i32,
        sequence_offset: i64,
        timestamp_nanos: i64,
        message: impl Into<String>,
    ) -> Self {
        Event {
            stream_id: stream_id.into(),
            partition,
            sequence_offset,
            timestamp_nanos,
            message: message.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_logfile(mut self, logfile: impl Into<String>) -> Self {
        self.logfile = Some(logfile.into());
        self
    }

    #[must_use]
    pub fn with_server_host(mut self, server_host: impl Into<String>) -> Self {
        self.server_host = Some(server_host.into());
        self
    }

    #[must_use]
    pub fn with_parser(mut self, parser: impl Into<String>) -> Self {
        self.parser = Some(parser.into());
        self
    }

    /// Sequence identifier sent as `si`: `"<stream_id>-<partition>"`.
    #[must_use]
    pub fn sequence_id(&self) -> String {
        format!("{}-{}", self.stream_id, self.partition)
    }

    /// The deduplication key for this event's server level fields.
    ///
    /// Empty strings are treated as absent so that two events which would
    /// render the same `logs` entry always share one id.
    #[must_use]
    pub fn log_key(&self) -> LogKey<'_> {
        LogKey {
            logfile: non_empty(self.logfile.as_deref()),
            server_host: non_empty(self.server_host.as_deref()),
            parser: non_empty(self.parser.as_deref()),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Server level fields of an [`Event`], borrowed from it.
///
/// Equality and hashing cover only these three fields; message, timestamp
/// and stream position never take part in deduplication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LogKey<'a> {
    pub logfile: Option<&'a str>,
    pub server_host: Option<&'a str>,
    pub parser: Option<&'a str>,
}

impl LogKey<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logfile.is_none() && self.server_host.is_none() && self.parser.is_none()
    }
}
