// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! reqwest client construction for the addEvents endpoint.
//!
//! The fixed request headers are installed as client default headers, so
//! they are attached once at construction and sent with every request.

use core::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONNECTION, CONTENT_TYPE, USER_AGENT};
use reqwest::ClientBuilder;

/// Identifies this client to the ingestion service.
pub const USER_AGENT_VALUE: &str = concat!("addevents-rust/", env!("CARGO_PKG_VERSION"));

const JSON_CONTENT_TYPE: &str = "application/json";

/// Transport settings for the underlying HTTP client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpOptions {
    /// HTTPS proxy URL. Without one, requests go direct.
    pub https_proxy: Option<String>,
    /// Whole-request timeout. `None` leaves latency bounding to the caller.
    pub timeout: Option<Duration>,
}

/// Headers sent with every addEvents request.
#[must_use]
pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers.insert(ACCEPT, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers.insert(CONNECTION, HeaderValue::from_static("Keep-Alive"));
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers
}

fn create_client_builder() -> ClientBuilder {
    reqwest::Client::builder().use_rustls_tls()
}

/// Builds the HTTP client used for the lifetime of one addEvents client.
pub(crate) fn build_client(options: &HttpOptions) -> Result<reqwest::Client, reqwest::Error> {
    // Proxying is decided by `options` alone, not by ambient proxy variables.
    // HTTP/1.1 only: h2 forbids the `Connection` header sent by default_headers.
    let mut builder = create_client_builder()
        .http1_only()
        .no_proxy()
        .default_headers(default_headers())
        .pool_idle_timeout(Some(Duration::from_secs(270)))
        .tcp_keepalive(Some(Duration::from_secs(120)));

    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }

    if let Some(https_uri) = &options.https_proxy {
        builder = builder.proxy(reqwest::Proxy::https(https_uri.as_str())?);
    }

    builder.build()
}
