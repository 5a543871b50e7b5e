//! Backend configuration shared by calls and sessions.

use crate::{Error, Result};
use std::time::Duration;
use url::Url;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Where requests go and how they are sent.
///
/// Immutable once built; share it as `Arc<Configuration>`.
#[derive(Debug, Clone)]
pub struct Configuration {
    base_url: Url,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
    user_agent: Option<String>,
}

impl Configuration {
    /// Configuration with defaults for everything but the base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::builder(base_url).build()
    }

    pub fn builder(base_url: impl Into<String>) -> ConfigurationBuilder {
        ConfigurationBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Headers added to every request built from this configuration.
    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
}

/// Builder for [`Configuration`].
///
/// Keep this surface area small and predictable.
pub struct ConfigurationBuilder {
    base_url: String,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
    user_agent: Option<String>,
}

impl ConfigurationBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: Vec::new(),
            user_agent: None,
        }
    }

    /// Per-request timeout enforced by the HTTP session. Zero is clamped to one millisecond.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout.max(Duration::from_millis(1));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the configuration. The base URL must be absolute and able to carry paths.
    pub fn build(self) -> Result<Configuration> {
        let base_url =
            Url::parse(self.base_url.trim()).map_err(|e| Error::InvalidUrl(format!("{}: {}", self.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(self.base_url));
        }
        Ok(Configuration {
            base_url,
            timeout: self.timeout,
            default_headers: self.default_headers,
            user_agent: self.user_agent,
        })
    }
}
