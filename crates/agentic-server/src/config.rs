use std::time::Duration;

use crate::errors::ConfigError;

/// Configuration for the run server.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Pause between orchestrator steps.
    pub step_delay: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            step_delay: Duration::from_millis(100),
        }
    }
}

impl ServerConfig {
    /// Builds a config from `AGENTIC_HOST`, `AGENTIC_PORT` and
    /// `AGENTIC_STEP_DELAY_MS` over the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();
        if let Some(host) = var("AGENTIC_HOST") {
            config.host = host;
        }
        if let Some(raw) = var("AGENTIC_PORT") {
            config.port = raw.trim().parse().map_err(|e| ConfigError {
                key: "AGENTIC_PORT",
                value: raw.clone(),
                reason: format!("{e}"),
            })?;
        }
        if let Some(raw) = var("AGENTIC_STEP_DELAY_MS") {
            let millis: u64 = raw.trim().parse().map_err(|e| ConfigError {
                key: "AGENTIC_STEP_DELAY_MS",
                value: raw.clone(),
                reason: format!("{e}"),
            })?;
            config.step_delay = Duration::from_millis(millis);
        }
        Ok(config)
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// `host:port` for binding.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
