use std::time::Duration;

use crate::errors::ConfigError;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000/agentic";

/// What a session does with a frame that fails to decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DecodeFailurePolicy {
    /// End the session with `SessionError::EventProcessing`.
    #[default]
    Terminate,
    /// Report `SessionStep::Skipped` and keep reading.
    Skip,
}

/// Configuration for the stream client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Full URL of the run endpoint.
    pub endpoint: String,
    pub connect_timeout: Duration,
    /// Longest gap allowed between two received chunks.
    pub read_timeout: Duration,
    /// Capacity of the frame queue between the reader task and the session.
    pub buffer_size: usize,
    pub auth_header: String,
    pub auth_scheme: String,
    /// Sent as `<auth_header>: <auth_scheme> <token>` when set.
    pub auth_token: Option<String>,
    pub decode_failure: DecodeFailurePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(5 * 60),
            buffer_size: 100,
            auth_header: "Authorization".to_string(),
            auth_scheme: "Bearer".to_string(),
            auth_token: None,
            decode_failure: DecodeFailurePolicy::Terminate,
        }
    }
}

impl ClientConfig {
    /// Builds a config from `AGENTIC_*` environment variables over the defaults.
    ///
    /// - `AGENTIC_ENDPOINT`
    /// - `AGENTIC_CONNECT_TIMEOUT_SECS` / `AGENTIC_READ_TIMEOUT_SECS`
    /// - `AGENTIC_BUFFER_SIZE`
    /// - `AGENTIC_AUTH_TOKEN`
    /// - `AGENTIC_SKIP_BAD_FRAMES`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        if let Some(endpoint) = var("AGENTIC_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(raw) = var("AGENTIC_CONNECT_TIMEOUT_SECS") {
            config.connect_timeout =
                Duration::from_secs(parse_number("AGENTIC_CONNECT_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = var("AGENTIC_READ_TIMEOUT_SECS") {
            config.read_timeout =
                Duration::from_secs(parse_number("AGENTIC_READ_TIMEOUT_SECS", &raw)?);
        }
        if let Some(raw) = var("AGENTIC_BUFFER_SIZE") {
            config.buffer_size = parse_number("AGENTIC_BUFFER_SIZE", &raw)?;
        }
        config.auth_token = var("AGENTIC_AUTH_TOKEN");
        if let Some(raw) = var("AGENTIC_SKIP_BAD_FRAMES") {
            config.decode_failure = match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => DecodeFailurePolicy::Skip,
                "0" | "false" | "no" | "off" => DecodeFailurePolicy::Terminate,
                _ => {
                    return Err(ConfigError {
                        key: "AGENTIC_SKIP_BAD_FRAMES",
                        value: raw,
                        reason: "expected a boolean".into(),
                    });
                }
            };
        }
        config.validate()?;
        Ok(config)
    }

    /// Overrides the run endpoint URL.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    pub fn auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn decode_failure(mut self, policy: DecodeFailurePolicy) -> Self {
        self.decode_failure = policy;
        self
    }

    /// Checks values a bounded channel or HTTP client would reject.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError {
                key: "buffer_size",
                value: "0".into(),
                reason: "must be greater than 0".into(),
            });
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError {
                key: "endpoint",
                value: self.endpoint.clone(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError {
        key,
        value: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_env() {
        let config = ClientConfig::from_lookup(lookup(&[])).expect("config");
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.endpoint, "http://localhost:8000/agentic");
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.read_timeout, Duration::from_secs(300));
        assert_eq!(config.buffer_size, 100);
        assert_eq!(config.decode_failure, DecodeFailurePolicy::Terminate);
    }

    #[test]
    fn env_values_override_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("AGENTIC_ENDPOINT", "http://example.test/run"),
            ("AGENTIC_READ_TIMEOUT_SECS", "7"),
            ("AGENTIC_BUFFER_SIZE", "4"),
            ("AGENTIC_AUTH_TOKEN", "secret"),
            ("AGENTIC_SKIP_BAD_FRAMES", "yes"),
        ]))
        .expect("config");
        assert_eq!(config.endpoint, "http://example.test/run");
        assert_eq!(config.read_timeout, Duration::from_secs(7));
        assert_eq!(config.buffer_size, 4);
        assert_eq!(config.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.decode_failure, DecodeFailurePolicy::Skip);
    }

    #[test]
    fn rejects_bad_numbers_and_zero_buffer() {
        let err = ClientConfig::from_lookup(lookup(&[("AGENTIC_BUFFER_SIZE", "lots")]))
            .expect_err("not a number");
        assert_eq!(err.key, "AGENTIC_BUFFER_SIZE");
        let err = ClientConfig::from_lookup(lookup(&[("AGENTIC_BUFFER_SIZE", "0")]))
            .expect_err("zero");
        assert_eq!(err.key, "buffer_size");
    }
}
