//! Process-wide configuration threaded into the request executor.
//!
//! `ContractConfig` is immutable once built. The executor holds it behind an
//! `Arc`, so several executors with different credentials (sandbox vs.
//! production keys) can run the same catalog concurrently.

use std::time::Duration;

use reqwest::Url;

use crate::error::{ContractError, Result};

/// Production base URL of the upstream API.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Query parameter the upstream reads the credential from.
pub const CREDENTIAL_PARAM: &str = "appid";

/// Environment variable holding the credential.
pub const API_KEY_ENV: &str = "APIKEY";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "OWM_BASE_URL";

/// Overall per-request timeout. A fixture can never block longer than this.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Connect timeout (TCP + TLS handshake only).
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable configuration shared by every fixture execution.
#[derive(Clone)]
pub struct ContractConfig {
    base_url: Url,
    api_key: Option<String>,
    timeout: Duration,
    connect_timeout: Duration,
}

impl ContractConfig {
    /// Configuration for `base_url` with no credential and default timeouts.
    ///
    /// # Errors
    ///
    /// - `ContractError::Config` if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ContractError::config(format!("invalid base URL {base_url:?}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ContractError::config(format!(
                "base URL must use http or https, got {}",
                base_url.scheme()
            )));
        }
        Ok(ContractConfig {
            base_url,
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    /// Reads `APIKEY` and `OWM_BASE_URL` from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup. Empty values
    /// are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let base_url = non_empty(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let mut config = Self::new(&base_url)?;
        config.api_key = non_empty(API_KEY_ENV);
        Ok(config)
    }

    /// Sets the credential injected into every fixture that does not opt out.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Sets the per-request timeout.
    ///
    /// # Errors
    ///
    /// - `ContractError::Config` for a zero duration; a request without a
    ///   timeout could block a fixture forever.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(ContractError::config("request timeout must be non-zero"));
        }
        self.timeout = timeout;
        self.connect_timeout = self.connect_timeout.min(timeout);
        Ok(self)
    }

    /// Base URL every resolved path is appended to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The credential, if one was configured.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Per-request timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }
}

impl std::fmt::Debug for ContractConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the credential itself.
        f.debug_struct("ContractConfig")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
