//! Infrastructure error hierarchy for the owm-contract crate.
//!
//! `ContractError` covers every way a fixture can fail to produce a response
//! at all. It deliberately has no variant for "the API answered wrongly":
//! those outcomes are `Verdict::Fail` values produced by the validator, so a
//! flaky network is never reported as a contract regression and vice versa.
//!
//! Variants map to real failure boundaries:
//! - `UnknownEndpoint` is a catalog/programming mistake (a fixture names an
//!   endpoint the registry does not know).
//! - `Transport` wraps `reqwest::Error` for DNS, TCP, TLS, timeout and body
//!   read failures. No HTTP status is available for these.
//! - `Config` covers invalid process-wide configuration detected before any
//!   request is sent.

/// Unified infrastructure error type for owm-contract operations.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// A fixture referenced a logical endpoint name that is not registered.
    ///
    /// Fatal for the affected fixture only: the runner records the abort
    /// and continues with the rest of the catalog.
    #[error("unknown endpoint: {name}")]
    UnknownEndpoint {
        /// The logical name that failed to resolve.
        name: String,
    },

    /// The HTTP exchange could not be completed (DNS resolution, connection
    /// refused, TLS handshake, per-request timeout, body read failure).
    ///
    /// The underlying `reqwest::Error` is chained via `source()` so callers
    /// can distinguish `is_timeout()` from `is_connect()`.
    #[error("transport error")]
    Transport(#[from] reqwest::Error),

    /// The process-wide configuration is unusable.
    #[error("invalid configuration: {message}")]
    Config {
        /// Human-readable description of the problem.
        message: String,
    },
}

impl ContractError {
    /// Shorthand for building a `Config` error from any displayable message.
    pub fn config(message: impl Into<String>) -> Self {
        ContractError::Config {
            message: message.into(),
        }
    }

    /// Returns `true` when the failure was a per-request timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ContractError::Transport(err) if err.is_timeout())
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, ContractError>;
