//! Client configuration shared by the library and the CLI.
//!
//! Values come from environment variables, falling back to built-in defaults:
//!
//! | variable                      | default                 |
//! |-------------------------------|-------------------------|
//! | `SMISHGUARD_API_BASE`         | `http://localhost:8000` |
//! | `SMISHGUARD_TIMEOUT_SECS`     | `30` (`0` disables)     |
//! | `SMISHGUARD_REQUEST_DELAY_MS` | `800`                   |

use std::time::Duration;

use thiserror::Error;

pub const ENV_API_BASE: &str = "SMISHGUARD_API_BASE";
pub const ENV_TIMEOUT_SECS: &str = "SMISHGUARD_TIMEOUT_SECS";
pub const ENV_REQUEST_DELAY_MS: &str = "SMISHGUARD_REQUEST_DELAY_MS";

pub const DEFAULT_API_BASE: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REQUEST_DELAY_MS: u64 = 800;

pub const ANALYZE_PATH: &str = "/api/v1/analyze";
pub const HEALTH_PATH: &str = "/health";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Endpoint and timing settings for classification requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_base: String,
    /// Cosmetic pause before dispatch so a loading indicator can render.
    pub request_delay: Duration,
    /// Upper bound on the whole request; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

impl ClientConfig {
    /// Create a config for the given base URL with default timings.
    ///
    /// A trailing slash on `api_base` is dropped.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: trim_base(api_base.into()),
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Read the `SMISHGUARD_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    ///
    /// Unset or blank variables take their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let mut config = Self::default();

        if let Some(base) = get(ENV_API_BASE) {
            config = config.with_api_base(&base);
        }

        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            config = config.with_timeout_secs(parse_u64(ENV_TIMEOUT_SECS, &raw)?);
        }

        if let Some(raw) = get(ENV_REQUEST_DELAY_MS) {
            config.request_delay = Duration::from_millis(parse_u64(ENV_REQUEST_DELAY_MS, &raw)?);
        }

        Ok(config)
    }

    /// Replace the base URL. A blank value keeps the current one.
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        let base = api_base.trim();
        if !base.is_empty() {
            self.api_base = trim_base(base.to_string());
        }
        self
    }

    /// Set the request timeout in whole seconds; `0` disables it.
    pub fn with_timeout_secs(self, secs: u64) -> Self {
        self.with_timeout((secs > 0).then(|| Duration::from_secs(secs)))
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Full URL of the classification endpoint.
    pub fn analyze_url(&self) -> String {
        format!("{}{ANALYZE_PATH}", self.api_base)
    }

    /// Full URL of the liveness endpoint.
    pub fn health_url(&self) -> String {
        format!("{}{HEALTH_PATH}", self.api_base)
    }
}

fn trim_base(base: String) -> String {
    base.trim_end_matches('/').to_string()
}

fn parse_u64(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
            var,
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| map.get(var).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_base(), "http://localhost:8000");
        assert_eq!(config.analyze_url(), "http://localhost:8000/api/v1/analyze");
        assert_eq!(config.request_delay, Duration::from_millis(800));
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn api_base_trailing_slash_trimmed() {
        let config = ClientConfig::new("https://guard.example.com/");
        assert_eq!(config.analyze_url(), "https://guard.example.com/api/v1/analyze");
        assert_eq!(config.health_url(), "https://guard.example.com/health");
    }

    #[test]
    fn env_values_override_defaults() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_BASE, "http://10.0.0.2:9000/"),
            (ENV_TIMEOUT_SECS, "5"),
            (ENV_REQUEST_DELAY_MS, "0"),
        ]))
        .unwrap();
        assert_eq!(config.api_base(), "http://10.0.0.2:9000");
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.request_delay, Duration::ZERO);
    }

    #[test]
    fn zero_timeout_disables_it() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "0")])).unwrap();
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn blank_api_base_uses_default() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_API_BASE, "  ")])).unwrap();
        assert_eq!(config.api_base(), DEFAULT_API_BASE);
    }

    #[test]
    fn overrides_share_env_rules() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_API_BASE, "http://env.test")]))
            .unwrap()
            .with_api_base("   ")
            .with_timeout_secs(0);
        assert_eq!(config.api_base(), "http://env.test");
        assert_eq!(config.timeout, None);

        let config = config.with_api_base(" http://flag.test/ ").with_timeout_secs(7);
        assert_eq!(config.api_base(), "http://flag.test");
        assert_eq!(config.timeout, Some(Duration::from_secs(7)));
    }

    #[test]
    fn invalid_number_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[(ENV_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_SECS));
    }
}
