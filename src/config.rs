// Gateway configuration.
// Base URL comes from the environment; the request timeout is fixed.

use std::time::Duration;

/// Environment variable holding the base URL prefixed to every path.
pub const BASE_URL_VAR: &str = "API_BASE_URL";

/// Timeout applied to every request unless a call overrides it.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Immutable client configuration shared by every request of a gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    /// Prefix concatenated with each request path. Empty means paths are used as-is.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    /// Configuration with the given base URL and the default timeout.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Read the configuration from the process environment, loading `.env` first.
    pub fn from_env() -> Self {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "loaded .env");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup(BASE_URL_VAR)
            .filter(|url| !url.is_empty())
            .unwrap_or_default();

        Self::new(base_url)
    }

    /// Effective URL for a request path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GatewayConfig::default();
        assert_eq!(config.base_url, "");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_from_lookup_reads_base_url() {
        let config = GatewayConfig::from_lookup(|key| {
            (key == BASE_URL_VAR).then(|| "https://api.example.com".to_string())
        });
        assert_eq!(config.base_url, "https://api.example.com");
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_from_lookup_missing_or_empty() {
        assert_eq!(GatewayConfig::from_lookup(|_| None).base_url, "");
        assert_eq!(
            GatewayConfig::from_lookup(|_| Some(String::new())).base_url,
            ""
        );
    }

    #[test]
    fn test_url_concatenates() {
        let config = GatewayConfig::new("http://localhost:8080/api");
        assert_eq!(config.url("/items"), "http://localhost:8080/api/items");

        let bare = GatewayConfig::default();
        assert_eq!(bare.url("http://other/x"), "http://other/x");
    }
}
