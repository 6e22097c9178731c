// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::error::AddEventsError;
use crate::http::HttpOptions;
use crate::mapper::LogFieldMapping;

pub const DEFAULT_SERVER_URL: &str = "https://app.scalyr.com";

/// Configuration for an addEvents client and the record mapping that feeds it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AddEventsConfig {
    /// Base URL of the ingestion service.
    pub server_url: String,
    /// Write logs API key, sent as the request `token`.
    pub api_key: String,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
    /// Request timeout in seconds. Unset means no timeout.
    pub timeout_secs: Option<u64>,
    /// Record fields the event mapper reads.
    pub log_fields: LogFieldMapping,
}

impl Default for AddEventsConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            api_key: String::new(),
            https_proxy: None,
            timeout_secs: None,
            log_fields: LogFieldMapping::default(),
        }
    }
}

impl AddEventsConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, AddEventsError> {
        let defaults = Self::default();
        let server_url = env::var("SCALYR_SERVER").unwrap_or(defaults.server_url);
        let api_key = env::var("SCALYR_API_KEY").unwrap_or_default();
        let https_proxy = env::var("SCALYR_PROXY_HTTPS")
            .or_else(|_| env::var("HTTPS_PROXY"))
            .ok();
        let timeout_secs = match env::var("SCALYR_TIMEOUT_SECS") {
            Ok(val) => Some(val.trim().parse::<u64>().map_err(|e| {
                AddEventsError::configuration(&server_url, format!("SCALYR_TIMEOUT_SECS: {e}"))
            })?),
            Err(_) => None,
        };

        let config = Self {
            server_url,
            api_key,
            https_proxy,
            timeout_secs,
            log_fields: defaults.log_fields,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AddEventsError> {
        if self.api_key.trim().is_empty() {
            return Err(AddEventsError::configuration(
                &self.server_url,
                "api key cannot be empty",
            ));
        }

        if self.timeout_secs == Some(0) {
            return Err(AddEventsError::configuration(
                &self.server_url,
                "timeout must be greater than 0",
            ));
        }

        if self.log_fields.message.trim().is_empty() {
            return Err(AddEventsError::configuration(
                &self.server_url,
                "message field name cannot be empty",
            ));
        }

        Ok(())
    }

    #[must_use]
    pub fn http_options(&self) -> HttpOptions {
        HttpOptions {
            https_proxy: self.https_proxy.clone(),
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const ENV_VARS: [&str; 5] = [
        "SCALYR_SERVER",
        "SCALYR_API_KEY",
        "SCALYR_PROXY_HTTPS",
        "HTTPS_PROXY",
        "SCALYR_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            env::remove_var(var);
        }
    }

    fn valid_config() -> AddEventsConfig {
        AddEventsConfig {
            api_key: "abc123".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_needs_api_key() {
        let config = AddEventsConfig::default();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert!(config.validate().is_err());
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_zero_timeout() {
        let config = AddEventsConfig {
            timeout_secs: Some(0),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_blank_message_field() {
        let mut config = valid_config();
        config.log_fields.message = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_http_options() {
        let config = AddEventsConfig {
            timeout_secs: Some(30),
            https_proxy: Some("http://proxy:3128".to_string()),
            ..valid_config()
        };
        let options = config.http_options();
        assert_eq!(options.timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.https_proxy.as_deref(), Some("http://proxy:3128"));
    }

    #[test]
    fn test_deserialize_partial_config() {
        let config: AddEventsConfig = serde_json::from_str(
            r#"{"api_key":"abc123","log_fields":{"message":"msg","parser":"parser"}}"#,
        )
        .unwrap();
        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.log_fields.message, "msg");
        assert_eq!(config.log_fields.parser.as_deref(), Some("parser"));
        assert_eq!(config.log_fields.server_host.as_deref(), Some("host.name"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        env::set_var("SCALYR_SERVER", "https://eu.scalyr.com");
        env::set_var("SCALYR_API_KEY", "abc123");
        env::set_var("HTTPS_PROXY", "http://proxy:3128");
        env::set_var("SCALYR_TIMEOUT_SECS", "15");

        let config = AddEventsConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.server_url, "https://eu.scalyr.com");
        assert_eq!(config.api_key, "abc123");
        assert_eq!(config.https_proxy.as_deref(), Some("http://proxy:3128"));
        assert_eq!(config.timeout_secs, Some(15));
    }

    #[test]
    #[serial]
    fn test_from_env_prefers_scalyr_proxy() {
        clear_env();
        env::set_var("SCALYR_API_KEY", "abc123");
        env::set_var("SCALYR_PROXY_HTTPS", "http://scalyr-proxy:3128");
        env::set_var("HTTPS_PROXY", "http://proxy:3128");

        let config = AddEventsConfig::from_env().unwrap();
        clear_env();

        assert_eq!(config.server_url, DEFAULT_SERVER_URL);
        assert_eq!(config.https_proxy.as_deref(), Some("http://scalyr-proxy:3128"));
    }

    #[test]
    #[serial]
    fn test_from_env_missing_api_key() {
        clear_env();
        assert!(AddEventsConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_bad_timeout() {
        clear_env();
        env::set_var("SCALYR_API_KEY", "abc123");
        env::set_var("SCALYR_TIMEOUT_SECS", "soon");

        let result = AddEventsConfig::from_env();
        clear_env();

        assert!(result.unwrap_err().is_configuration());
    }
}
