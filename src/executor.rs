//! Request execution: one fixture in, one raw upstream response out.
//!
//! `RequestExecutor` wraps a `reqwest::Client` together with the immutable
//! [`ContractConfig`] and the [`EndpointRegistry`]. For each fixture it:
//!
//! 1. Resolves the fixture's logical endpoint to a path.
//! 2. Appends the fixture's query parameters in declared order, then the
//!    credential (`appid`) unless the fixture opts out.
//! 3. Issues exactly one GET and captures status + body.
//!
//! The executor never interprets the response. A 4xx or 5xx answer is
//! ordinary data handed to the validator; only a failure to complete the
//! exchange (DNS, connect, timeout) becomes `ContractError::Transport`.
//! Nothing is retried.

use std::sync::Arc;

use reqwest::{Client, Url};
use tracing::{debug, warn};

use crate::catalog::{CredentialPolicy, Fixture};
use crate::config::{CREDENTIAL_PARAM, ContractConfig};
use crate::endpoints::EndpointRegistry;
use crate::error::{ContractError, Result};
use crate::response::RawResponse;

/// Builds a `reqwest::Client` whose timeouts come from the configuration.
///
/// Both timeouts are always set, so no request can block indefinitely.
fn build_http_client(config: &ContractConfig) -> Result<Client> {
    let client = Client::builder()
        .connect_timeout(config.connect_timeout())
        .timeout(config.timeout())
        .build()?;
    Ok(client)
}

/// Issues fixture requests against one configured upstream.
///
/// Cloning is cheap: the HTTP client, configuration and registry are all
/// shared. Executors hold no mutable state, so one instance can serve any
/// number of concurrent fixture executions.
#[derive(Clone)]
pub struct RequestExecutor {
    client: Client,
    config: Arc<ContractConfig>,
    registry: Arc<EndpointRegistry>,
}

impl RequestExecutor {
    /// Executor over the built-in endpoint registry.
    ///
    /// # Errors
    ///
    /// - `ContractError::Transport` if the HTTP client cannot be built
    ///   (e.g. the TLS backend fails to initialize).
    pub fn new(config: ContractConfig) -> Result<Self> {
        Self::with_registry(config, EndpointRegistry::builtin())
    }

    /// Executor over a caller-supplied registry.
    pub fn with_registry(config: ContractConfig, registry: EndpointRegistry) -> Result<Self> {
        Ok(RequestExecutor {
            client: build_http_client(&config)?,
            config: Arc::new(config),
            registry: Arc::new(registry),
        })
    }

    /// The configuration this executor was built with.
    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    /// Builds the full request URL for `fixture`, credential included.
    ///
    /// # Errors
    ///
    /// - `ContractError::UnknownEndpoint` if the fixture names an endpoint
    ///   the registry does not know.
    pub fn request_url(&self, fixture: &Fixture) -> Result<Url> {
        let path = self.registry.resolve(fixture.endpoint)?;

        // Concatenate rather than `Url::join`, so a base URL with a path
        // prefix (e.g. behind a proxy) keeps that prefix.
        let raw = format!(
            "{}{}",
            self.config.base_url().as_str().trim_end_matches('/'),
            path
        );
        let mut url = Url::parse(&raw)
            .map_err(|e| ContractError::config(format!("cannot build URL {raw:?}: {e}")))?;

        let credential = match fixture.credential {
            CredentialPolicy::Inject => {
                let key = self.config.api_key();
                if key.is_none() {
                    warn!(
                        fixture = %fixture.id,
                        "no credential configured; sending request without {CREDENTIAL_PARAM}"
                    );
                }
                key
            }
            CredentialPolicy::Omit => None,
        };

        // Only touch the query when there is something to add; an empty
        // `query_pairs_mut` still leaves a trailing `?`.
        if !fixture.params.is_empty() || credential.is_some() {
            let mut query = url.query_pairs_mut();
            for (key, value) in &fixture.params {
                query.append_pair(key, value);
            }
            if let Some(key) = credential {
                query.append_pair(CREDENTIAL_PARAM, key);
            }
        }
        Ok(url)
    }

    /// Executes `fixture` and returns the raw response.
    ///
    /// # Errors
    ///
    /// - `ContractError::UnknownEndpoint`: the fixture's endpoint is not
    ///   registered; no request is sent.
    /// - `ContractError::Transport`: the exchange could not complete
    ///   (including the per-request timeout).
    pub async fn execute(&self, fixture: &Fixture) -> Result<RawResponse> {
        let url = self.request_url(fixture)?;
        debug!(fixture = %fixture.id, url = %redact(&url), "sending request");

        // Transport errors carry the request URL, credential included.
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ContractError::Transport(e.without_url()))?;
        let status = resp.status().as_u16();
        // Read the body regardless of status: error bodies carry the
        // upstream's `cod` and `message`, which are what gets validated.
        let body = resp
            .bytes()
            .await
            .map_err(|e| ContractError::Transport(e.without_url()))?;

        debug!(fixture = %fixture.id, status, bytes = body.len(), "received response");
        Ok(RawResponse::from_bytes(status, &body))
    }
}

/// Renders `url` with the credential value masked, for logs.
pub fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(k, _)| k == CREDENTIAL_PARAM) {
        return url.to_string();
    }
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == CREDENTIAL_PARAM {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    let mut masked = url.clone();
    masked.query_pairs_mut().clear().extend_pairs(pairs);
    masked.to_string()
}
