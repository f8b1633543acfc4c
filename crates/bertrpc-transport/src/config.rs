use std::fmt;
use std::time::Duration;

use bertrpc_berp::DEFAULT_MAX_PAYLOAD;

use crate::error::{Result, TransportError};

/// Environment variable holding the default endpoint.
pub const ENV_ENDPOINT: &str = "BERTRPC_ENDPOINT";
/// Environment variable holding the bearer token.
pub const ENV_TOKEN: &str = "BERTRPC_TOKEN";
/// Environment variable holding the round-trip timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "BERTRPC_TIMEOUT_MS";

/// Default round-trip timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings shared by all transports.
#[derive(Clone)]
pub struct TransportConfig {
    /// `http://host:port/path` for HTTP, `tcp://host:port` or `host:port`
    /// for raw BERP over TCP.
    pub endpoint: String,
    /// Bearer token sent with HTTP requests.
    /// Treated as opaque credential material and redacted in debug output.
    pub token: Option<String>,
    /// Limit on one full round trip.
    pub timeout: Duration,
    /// Maximum accepted reply payload in bytes.
    pub max_reply_size: usize,
}

impl TransportConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build a config from `BERTRPC_ENDPOINT`, `BERTRPC_TOKEN` and
    /// `BERTRPC_TIMEOUT_MS`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();
        if let Some(endpoint) = lookup(ENV_ENDPOINT) {
            config.endpoint = endpoint;
        }
        config.token = lookup(ENV_TOKEN).filter(|token| !token.is_empty());
        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            let millis = raw
                .trim()
                .parse::<u64>()
                .map_err(|err| TransportError::InvalidConfig {
                    key: ENV_TIMEOUT_MS,
                    reason: format!("{raw:?} is not a number of milliseconds: {err}"),
                })?;
            config.timeout = Duration::from_millis(millis);
        }
        Ok(config)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            max_reply_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl fmt::Debug for TransportConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg = f.debug_struct("TransportConfig");
        dbg.field("endpoint", &self.endpoint);
        if let Some(token) = &self.token {
            dbg.field("token", &format_args!("<redacted:{} bytes>", token.len()));
        } else {
            dbg.field("token", &Option::<String>::None);
        }
        dbg.field("timeout", &self.timeout)
            .field("max_reply_size", &self.max_reply_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = TransportConfig::default();
        assert!(config.endpoint.is_empty());
        assert_eq!(config.token, None);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_reply_size, 16 * 1024 * 1024);
    }

    #[test]
    fn reads_environment() {
        let config = TransportConfig::from_lookup(lookup(&[
            (ENV_ENDPOINT, "http://localhost:5281/rpc"),
            (ENV_TOKEN, "s3cret"),
            (ENV_TIMEOUT_MS, "1500"),
        ]))
        .unwrap();
        assert_eq!(config.endpoint, "http://localhost:5281/rpc");
        assert_eq!(config.token.as_deref(), Some("s3cret"));
        assert_eq!(config.timeout, Duration::from_millis(1500));
    }

    #[test]
    fn empty_token_is_none() {
        let config = TransportConfig::from_lookup(lookup(&[(ENV_TOKEN, "")])).unwrap();
        assert_eq!(config.token, None);
    }

    #[test]
    fn bad_timeout_is_rejected() {
        let err = TransportConfig::from_lookup(lookup(&[(ENV_TIMEOUT_MS, "soon")])).unwrap_err();
        assert!(err.to_string().contains("BERTRPC_TIMEOUT_MS"));
    }

    #[test]
    fn debug_output_redacts_token() {
        let config = TransportConfig::new("http://h/rpc").with_token("hunter2-token");
        let debug = format!("{config:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted:13 bytes>"));
    }
}
