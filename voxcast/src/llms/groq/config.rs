//! Groq client configuration.

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigResult};

/// Configuration for the Groq client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroqConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Base URL for the OpenAI-compatible API.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
}

impl GroqConfig {
    /// Default Groq API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.groq.com/openai/v1";
    /// Environment variable holding the API key.
    pub const API_KEY_ENV: &'static str = "GROQ_API_KEY";
    /// Environment variable overriding the base URL.
    pub const BASE_URL_ENV: &'static str = "GROQ_BASE_URL";

    /// Creates a new configuration with the given API key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Overlay the API key and base URL variables found by `lookup`.
    pub fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(Self::API_KEY_ENV) {
            self.api_key = key;
        }
        if let Some(url) = lookup(Self::BASE_URL_ENV) {
            self.base_url = url;
        }
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] if the API key is empty.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "groq.api_key (or {})",
                Self::API_KEY_ENV
            )));
        }
        Ok(())
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
            timeout_secs: Some(120),
        }
    }
}

impl std::fmt::Debug for GroqConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroqConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
