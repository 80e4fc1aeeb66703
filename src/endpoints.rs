//! Logical endpoint names mapped to upstream URL paths.
//!
//! Fixtures never carry raw paths. They name an operation (for example
//! [`CURRENT_WEATHER`]) and the executor resolves it here, so adding an
//! endpoint (geocoding, forecast) does not touch the catalog or executor.
//!
//! The same table is documented in `manifest/endpoints.toml`; an
//! integration test keeps the two in sync.

use crate::error::{ContractError, Result};

/// Current weather lookup by `q`, `zip` or `id`.
pub const CURRENT_WEATHER: &str = "current_weather";
/// 5 day / 3 hour forecast lookup.
pub const FORECAST: &str = "forecast";
/// Direct geocoding by place name.
pub const GEOCODING_DIRECT: &str = "geocoding_direct";
/// Geocoding by zip/post code.
pub const GEOCODING_ZIP: &str = "geocoding_zip";

/// One registered upstream operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    /// Logical operation name used by fixtures.
    pub name: &'static str,
    /// Path relative to the configured base URL, with a leading slash.
    pub path: &'static str,
}

const BUILTIN: &[Endpoint] = &[
    Endpoint {
        name: CURRENT_WEATHER,
        path: "/data/2.5/weather",
    },
    Endpoint {
        name: FORECAST,
        path: "/data/2.5/forecast",
    },
    Endpoint {
        name: GEOCODING_DIRECT,
        path: "/geo/1.0/direct",
    },
    Endpoint {
        name: GEOCODING_ZIP,
        path: "/geo/1.0/zip",
    },
];

/// Read-only lookup table from logical name to path.
#[derive(Debug, Clone)]
pub struct EndpointRegistry {
    entries: Vec<Endpoint>,
}

impl EndpointRegistry {
    /// Registry containing the built-in OpenWeatherMap endpoints.
    pub fn builtin() -> Self {
        EndpointRegistry {
            entries: BUILTIN.to_vec(),
        }
    }

    /// Returns a registry with `endpoint` added. A later entry with the same
    /// name replaces the earlier one.
    pub fn with_endpoint(mut self, endpoint: Endpoint) -> Self {
        self.entries.retain(|e| e.name != endpoint.name);
        self.entries.push(endpoint);
        self
    }

    /// Resolves a logical name to its path template.
    ///
    /// # Errors
    ///
    /// - `ContractError::UnknownEndpoint` if `name` is not registered.
    pub fn resolve(&self, name: &str) -> Result<&'static str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.path)
            .ok_or_else(|| ContractError::UnknownEndpoint {
                name: name.to_string(),
            })
    }

    /// All registered endpoints in registration order.
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.entries
    }
}

impl Default for EndpointRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_current_weather() {
        let registry = EndpointRegistry::builtin();
        assert_eq!(
            registry.resolve(CURRENT_WEATHER).unwrap(),
            "/data/2.5/weather"
        );
    }

    #[test]
    fn unknown_name_is_rejected() {
        let registry = EndpointRegistry::builtin();
        let err = registry.resolve("air_pollution").unwrap_err();
        assert!(
            matches!(err, ContractError::UnknownEndpoint { ref name } if name == "air_pollution"),
            "expected UnknownEndpoint, got {err:?}"
        );
    }

    #[test]
    fn with_endpoint_extends_registry() {
        let registry = EndpointRegistry::builtin().with_endpoint(Endpoint {
            name: "air_pollution",
            path: "/data/2.5/air_pollution",
        });
        assert_eq!(
            registry.resolve("air_pollution").unwrap(),
            "/data/2.5/air_pollution"
        );
        // Built-ins remain resolvable.
        assert!(registry.resolve(CURRENT_WEATHER).is_ok());
    }

    #[test]
    fn with_endpoint_replaces_same_name() {
        let registry = EndpointRegistry::builtin().with_endpoint(Endpoint {
            name: CURRENT_WEATHER,
            path: "/data/3.0/weather",
        });
        assert_eq!(
            registry.resolve(CURRENT_WEATHER).unwrap(),
            "/data/3.0/weather"
        );
        let count = registry
            .endpoints()
            .iter()
            .filter(|e| e.name == CURRENT_WEATHER)
            .count();
        assert_eq!(count, 1, "replacement must not duplicate the entry");
    }

    #[test]
    fn builtin_paths_start_with_slash() {
        for ep in EndpointRegistry::builtin().endpoints() {
            assert!(ep.path.starts_with('/'), "{} has a relative path", ep.name);
        }
    }
}
