// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Client for the addEvents log ingestion API.
//!
//! A batch of [`Event`]s is sent as one POST. Server level fields shared by
//! many events (`logfile`, `serverHost`, `parser`) are written once into the
//! request's `logs` table and referenced from each event by id.
//!
//! - [`event`]: the record model and its deduplication key
//! - [`log_ids`]: batch-local log id assignment
//! - [`payload`]: streaming JSON request body, whole or chunked
//! - [`client`]: URL validation, session, request and response classification
//! - [`mapper`]: schemaless record to event conversion
//!
//! ```rust,ignore
//! use addevents::{AddEventsClient, Event};
//!
//! let client = AddEventsClient::new("https://app.scalyr.com", api_key)?;
//! let events = vec![Event::new("logs", 0, 42, ts, "hello").with_server_host("server1")];
//! client.log(events).await?;
//! client.close();
//! ```

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod client;
pub mod config;
pub mod error;
pub mod event;
pub mod http;
pub mod log_ids;
pub mod mapper;
pub mod payload;

pub use client::{AddEventsClient, AddEventsResponse};
pub use config::AddEventsConfig;
pub use error::{AddEventsError, PayloadError};
pub use event::Event;
