// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP client for the addEvents API.
//!
//! One [`AddEventsClient`] owns one connection pool and one session id. Each
//! [`AddEventsClient::log`] call is a single POST:
//!
//! ```text
//!   events ──► ChunkedBody ──► chunked POST <server>/addEvents
//!                                                   │
//!        Ok(AddEventsResponse) ◄── 200 + "success" ─┤
//!        Err(Protocol { .. })  ◄── anything else  ──┘
//! ```
//!
//! No retry happens here. The owning task decides what to do with an error.

use std::fmt;
use std::sync::Arc;

use futures::stream;
use reqwest::{Body, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::config::AddEventsConfig;
use crate::error::AddEventsError;
use crate::event::Event;
use crate::http::{build_client, HttpOptions};
use crate::payload::ChunkedBody;

/// Path of the ingestion endpoint, replacing any path of the base URL.
pub const ADD_EVENTS_PATH: &str = "addEvents";

/// `status` value of an accepted request.
pub const SUCCESS_STATUS: &str = "success";

/// Body of an addEvents response. Unknown fields such as `bytesCharged` are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AddEventsResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl AddEventsResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(SUCCESS_STATUS)
    }
}

/// Client for one addEvents session.
///
/// Requests are built fresh on every call, so a client can be shared behind
/// an `Arc` if needed. Calls are still independent single attempts.
pub struct AddEventsClient {
    client: reqwest::Client,
    url: Url,
    api_key: String,
    session_id: String,
}

impl AddEventsClient {
    /// Creates a client for `server_url` (e.g. `https://app.scalyr.com`).
    ///
    /// Fails with [`AddEventsError::Configuration`] when the URL is invalid.
    pub fn new(server_url: &str, api_key: impl Into<String>) -> Result<Self, AddEventsError> {
        Self::with_options(server_url, api_key, &HttpOptions::default())
    }

    pub fn from_config(config: &AddEventsConfig) -> Result<Self, AddEventsError> {
        config.validate()?;
        Self::with_options(
            &config.server_url,
            config.api_key.clone(),
            &config.http_options(),
        )
    }

    pub fn with_options(
        server_url: &str,
        api_key: impl Into<String>,
        options: &HttpOptions,
    ) -> Result<Self, AddEventsError> {
        let url = build_add_events_url(server_url)?;
        let client =
            build_client(options).map_err(|e| AddEventsError::configuration(server_url, e))?;
        let session_id = Uuid::new_v4().to_string();

        debug!(url = %url, session = %session_id, "addEvents client created");

        Ok(AddEventsClient {
            client,
            url,
            api_key: api_key.into(),
            session_id,
        })
    }

    /// The validated endpoint URL requests are posted to.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Session id sent with every request from this client.
    #[must_use]
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Sends `events` in one addEvents request.
    ///
    /// The body is streamed with chunked transfer encoding, one event per
    /// chunk. A `Vec` or an `Arc<[Event]>` is moved in; a slice is cloned.
    /// Succeeds only when the service answers HTTP 200 with status `"success"`.
    pub async fn log(
        &self,
        events: impl Into<Arc<[Event]>>,
    ) -> Result<AddEventsResponse, AddEventsError> {
        let body = ChunkedBody::new(
            self.api_key.as_str(),
            self.session_id.as_str(),
            events.into(),
        );

        debug!(
            events = body.event_count(),
            logs = body.log_count(),
            "Calling addEvents"
        );

        // A chunk that fails to render aborts the upload, surfacing as Transport.
        let response = self
            .client
            .post(self.url.clone())
            .body(Body::wrap_stream(stream::iter(body)))
            .send()
            .await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        let result = classify_response(status, &bytes);
        match &result {
            Ok(parsed) => debug!(status = %status, response = ?parsed, "addEvents succeeded"),
            Err(e) => warn!(status = %status, "{e}"),
        }
        result
    }

    /// Releases the connection pool. The client cannot be used afterwards.
    pub fn close(self) {
        debug!(session = %self.session_id, "Closing addEvents client");
        drop(self.client);
    }
}

impl fmt::Debug for AddEventsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddEventsClient")
            .field("url", &self.url.as_str())
            .field("api_key", &"<redacted>")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

/// Validates `server_url` and points it at the addEvents endpoint.
///
/// The URL needs a scheme and a host, and must use https unless the host is
/// `localhost`. Any existing path is replaced.
pub fn build_add_events_url(server_url: &str) -> Result<Url, AddEventsError> {
    let mut url =
        Url::parse(server_url).map_err(|e| AddEventsError::configuration(server_url, e))?;

    let Some(host) = url.host_str() else {
        return Err(AddEventsError::configuration(server_url, "url has no host"));
    };
    if host != "localhost" && url.scheme() != "https" {
        return Err(AddEventsError::configuration(
            server_url,
            "https is required for non-local hosts",
        ));
    }

    url.set_path(ADD_EVENTS_PATH);
    Ok(url)
}

fn classify_response(status: StatusCode, body: &[u8]) -> Result<AddEventsResponse, AddEventsError> {
    match serde_json::from_slice::<AddEventsResponse>(body) {
        Ok(parsed) if status == StatusCode::OK && parsed.is_success() => Ok(parsed),
        Ok(parsed) => Err(AddEventsError::Protocol {
            status: status.as_u16(),
            response_status: parsed.status,
            response_message: parsed.message,
            body: None,
        }),
        Err(e) => {
            debug!(status = %status, "Unable to parse addEvents response: {e}");
            Err(AddEventsError::Protocol {
                status: status.as_u16(),
                response_status: None,
                response_message: None,
                body: Some(String::from_utf8_lossy(body).into_owned()),
            })
        }
    }
}
