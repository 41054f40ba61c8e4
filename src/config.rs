//! Client configuration.
//!
//! A [`ClientConfig`] holds the three things every request needs: the API
//! key, the base URL and the per-request timeout. It is built once, through
//! [`ClientConfigBuilder`], and is read-only afterwards. Each
//! [`crate::ToolsClient`] owns its own copy, so two clients pointed at
//! different accounts or environments never share state.

use crate::error::MiddlemanError;
use std::fmt;

/// Production endpoint of the Middleman.ai API.
pub const DEFAULT_BASE_URL: &str = "https://middleman-ai.com";

/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "MIDDLEMAN_API_KEY";

/// Environment variable overriding [`DEFAULT_BASE_URL`].
pub const BASE_URL_ENV: &str = "MIDDLEMAN_BASE_URL";

/// Connection settings for a [`crate::ToolsClient`].
///
/// # Example
/// ```rust
/// use middleman_tools::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .api_key("sk-test")
///     .base_url("http://localhost:8080/")
///     .timeout_secs(10)
///     .build()
///     .unwrap();
/// assert_eq!(config.base_url(), "http://localhost:8080");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_key: String,
    base_url: String,
    timeout_secs: u64,
    user_agent: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl ClientConfig {
    /// Create a new builder for `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: concat!("middleman-tools/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }

    /// Config with default base URL and timeout for the given key.
    pub fn new(api_key: impl Into<String>) -> Result<Self, MiddlemanError> {
        Self::builder().api_key(api_key).build()
    }

    /// Read the API key from `MIDDLEMAN_API_KEY` and, when set, the base URL
    /// from `MIDDLEMAN_BASE_URL`.
    ///
    /// Fails with [`MiddlemanError::InvalidConfig`] when the key is missing or
    /// empty, before any network activity.
    pub fn from_env() -> Result<Self, MiddlemanError> {
        let mut builder = Self::builder().api_key(api_key_from_env()?);
        if let Some(url) = non_empty_env(BASE_URL_ENV) {
            builder = builder.base_url(url);
        }
        builder.build()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Base URL without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Absolute URL for an API path such as `/api/v1/tools`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug)]
pub struct ClientConfigBuilder {
    api_key: Option<String>,
    base_url: String,
    timeout_secs: u64,
    user_agent: String,
}

impl ClientConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Trailing slashes are stripped.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ClientConfig, MiddlemanError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| MiddlemanError::InvalidConfig("API key must not be empty".into()))?;

        if self.base_url.is_empty() {
            return Err(MiddlemanError::InvalidConfig(
                "Base URL must not be empty".into(),
            ));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(MiddlemanError::InvalidConfig(format!(
                "Base URL must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(MiddlemanError::InvalidConfig(
                "Timeout must be ≥ 1 second".into(),
            ));
        }

        Ok(ClientConfig {
            api_key,
            base_url: self.base_url,
            timeout_secs: self.timeout_secs,
            user_agent: self.user_agent,
        })
    }
}

/// Read `MIDDLEMAN_API_KEY`, failing when it is unset or blank.
pub fn api_key_from_env() -> Result<String, MiddlemanError> {
    non_empty_env(API_KEY_ENV).ok_or_else(|| {
        MiddlemanError::InvalidConfig(format!("{API_KEY_ENV} environment variable is required"))
    })
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = ClientConfig::new("test_api_key").unwrap();
        assert_eq!(c.api_key(), "test_api_key");
        assert_eq!(c.base_url(), "https://middleman-ai.com");
        assert_eq!(c.timeout_secs(), 30);
        assert!(c.user_agent().starts_with("middleman-tools/"));
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        let c = ClientConfig::builder()
            .api_key("k")
            .base_url("https://middleman-ai.com///")
            .build()
            .unwrap();
        assert_eq!(c.base_url(), "https://middleman-ai.com");
        assert_eq!(
            c.url("/api/v1/tools/md-to-pdf"),
            "https://middleman-ai.com/api/v1/tools/md-to-pdf"
        );
        assert_eq!(c.url("api/v1/tools"), "https://middleman-ai.com/api/v1/tools");
    }

    #[test]
    fn rejects_empty_key() {
        let err = ClientConfig::builder().api_key("  ").build().unwrap_err();
        assert!(matches!(err, MiddlemanError::InvalidConfig(_)));

        let err = ClientConfig::builder().build().unwrap_err();
        assert!(matches!(err, MiddlemanError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_bad_base_url_and_timeout() {
        let err = ClientConfig::builder()
            .api_key("k")
            .base_url("ftp://example.com")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("ftp://example.com"));

        let err = ClientConfig::builder()
            .api_key("k")
            .timeout_secs(0)
            .build()
            .unwrap_err();
        assert!(matches!(err, MiddlemanError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_api_key() {
        let c = ClientConfig::new("super-secret").unwrap();
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("super-secret"), "got: {dbg}");
        assert!(dbg.contains("<redacted>"));
    }
}
