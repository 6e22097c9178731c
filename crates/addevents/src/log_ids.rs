// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Log id assignment for the `logs` side table of an addEvents request.
//!
//! Every distinct [`LogKey`] seen in a batch gets one id. Ids start at 0 and
//! follow first-seen order, so the same batch always produces the same table.
//!
//! ```text
//!   events:  [A, A, B, A, C, B]
//!   keys:    [A, B, C]                 (arena, id = position)
//!   index:   {A:0, B:1, C:2}
//! ```

use std::collections::HashMap;

use crate::event::{Event, LogKey};

/// One row of the `logs` table: an id and the server level fields it stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogEntry<'a> {
    pub id: usize,
    pub key: LogKey<'a>,
}

/// Batch-local mapping from server level fields to log ids.
///
/// Built fresh for every request; nothing is shared between batches.
#[derive(Debug, Default)]
pub struct LogIds<'a> {
    keys: Vec<LogKey<'a>>,
    index: HashMap<LogKey<'a>, usize>,
}

impl<'a> LogIds<'a> {
    /// Scans `events` front to back and assigns ids in first-seen order.
    #[must_use]
    pub fn assign(events: &'a [Event]) -> Self {
        let mut log_ids = LogIds::default();
        for event in events {
            log_ids.register(event.log_key());
        }
        log_ids
    }

    fn register(&mut self, key: LogKey<'a>) -> usize {
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        let id = self.keys.len();
        self.keys.push(key);
        self.index.insert(key, id);
        id
    }

    /// Id of an already registered key.
    #[must_use]
    pub fn id_of(&self, key: &LogKey<'_>) -> Option<usize> {
        self.index.get(key).copied()
    }

    /// Entries in ascending id order.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = LogEntry<'a>> + '_ {
        self.keys
            .iter()
            .enumerate()
            .map(|(id, key)| LogEntry { id, key: *key })
    }

    /// Number of distinct log entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
