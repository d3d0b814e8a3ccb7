//! Client configuration.
//!
//! The client reads its configuration from environment variables:
//!
//! - `TAIGA_API_URL` (required) - service root, e.g. `https://api.taiga.io`
//! - `TAIGA_AUTH_TOKEN` (optional) - bearer token issued by a prior login
//! - `TAIGA_TIMEOUT_SECS` (optional) - request timeout, defaults to 30

use std::time::Duration;

use crate::error::ConfigError;

pub const ENV_API_URL: &str = "TAIGA_API_URL";
pub const ENV_AUTH_TOKEN: &str = "TAIGA_AUTH_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "TAIGA_TIMEOUT_SECS";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable source. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let base_url = get(ENV_API_URL).ok_or(ConfigError::Missing(ENV_API_URL))?;
        let mut config = Self::new(base_url);
        config.auth_token = get(ENV_AUTH_TOKEN);

        if let Some(raw) = get(ENV_TIMEOUT_SECS) {
            // A zero timeout would fail every request immediately.
            let secs = raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|&secs| secs > 0)
                .ok_or_else(|| ConfigError::Invalid {
                    name: ENV_TIMEOUT_SECS,
                    value: raw.clone(),
                })?;
            config.timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn url_is_required() {
        let err = ClientConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ENV_API_URL)));
    }

    #[test]
    fn defaults_apply_when_optional_vars_unset() {
        let config = ClientConfig::from_lookup(lookup(&[(ENV_API_URL, "http://taiga")])).unwrap();
        assert_eq!(config.base_url, "http://taiga");
        assert_eq!(config.auth_token, None);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn reads_token_and_timeout() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, "http://taiga"),
            (ENV_AUTH_TOKEN, "abc"),
            (ENV_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();
        assert_eq!(config.auth_token.as_deref(), Some("abc"));
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn empty_token_counts_as_unset() {
        let config = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, "http://taiga"),
            (ENV_AUTH_TOKEN, ""),
        ]))
        .unwrap();
        assert_eq!(config.auth_token, None);
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, "http://taiga"),
            (ENV_TIMEOUT_SECS, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: ENV_TIMEOUT_SECS, .. }));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ClientConfig::from_lookup(lookup(&[
            (ENV_API_URL, "http://taiga"),
            (ENV_TIMEOUT_SECS, "0"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { name: ENV_TIMEOUT_SECS, ref value } if value == "0"
        ));
    }
}
