// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use thiserror::Error;

/// Failure while streaming an addEvents request body.
///
/// The output sink has already been dropped when this is returned.
#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("failed to serialize addEvents payload: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write addEvents payload: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by [`crate::client::AddEventsClient`].
#[derive(Debug, Error)]
pub enum AddEventsError {
    /// The client could not be constructed from the given settings.
    #[error("invalid addEvents configuration for {url}: {reason}")]
    Configuration { url: String, reason: String },

    /// Connection, timeout or I/O failure while sending or receiving.
    #[error("addEvents transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered but did not accept the events.
    #[error(
        "addEvents failed with http code {status}, status {}, message {}",
        .response_status.as_deref().unwrap_or("<none>"),
        .response_message.as_deref().unwrap_or("<none>")
    )]
    Protocol {
        status: u16,
        response_status: Option<String>,
        response_message: Option<String>,
        /// Raw response body, kept when it could not be parsed.
        body: Option<String>,
    },

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

impl AddEventsError {
    pub(crate) fn configuration(url: impl Into<String>, reason: impl ToString) -> Self {
        AddEventsError::Configuration {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    /// HTTP status of the response, when one was received.
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AddEventsError::Protocol { status, .. } => Some(*status),
            AddEventsError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, AddEventsError::Configuration { .. })
    }

    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, AddEventsError::Transport(_))
    }

    #[must_use]
    pub fn is_protocol(&self) -> bool {
        matches!(self, AddEventsError::Protocol { .. })
    }
}
