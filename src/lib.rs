//! Contract verification for the OpenWeatherMap current weather API.
//!
//! Sends a curated catalog of normal and adversarial lookups (malformed city
//! names, injection payloads, boundary-length strings, a missing credential,
//! digit-only names that may collide with city ids) to the upstream API and
//! judges each response against the documented error/success contract.
//!
//! # Modules
//!
//! - [`catalog`]: Named fixtures grouped by intent, with expected outcomes.
//! - [`config`]: Immutable process-wide configuration (base URL, credential).
//! - [`endpoints`]: Logical endpoint names mapped to URL paths.
//! - [`error`]: Infrastructure error type (`ContractError`).
//! - [`executor`]: Issues one GET per fixture and captures the raw response.
//! - [`outcome`]: Expected-outcome descriptors and `cod` canonicalization.
//! - [`response`]: Raw response (status + parsed body).
//! - [`runner`]: Concurrent catalog runs and the run summary.
//! - [`validator`]: Response classification into a `Verdict`.
//!
//! # Quick Start
//!
//! ```ignore
//! use owm_contract::catalog::Catalog;
//! use owm_contract::config::ContractConfig;
//! use owm_contract::executor::RequestExecutor;
//! use owm_contract::runner::run_fixtures;
//!
//! let config = ContractConfig::from_env()?;
//! let executor = RequestExecutor::new(config)?;
//! let fixtures: Vec<_> = Catalog::standard().iter().cloned().collect();
//! let summary = run_fixtures(&executor, &fixtures, 4).await;
//! println!("{summary}");
//! ```
//!
//! # Observability
//!
//! Library code emits `tracing` events and never installs a subscriber; the
//! `owm-contract` binary initializes `tracing_subscriber` once at startup.

#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod executor;
pub mod outcome;
pub mod response;
pub mod runner;
pub mod validator;
