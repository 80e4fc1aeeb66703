//! CI validation for the endpoint manifest (manifest/endpoints.toml).
//!
//! The manifest is the human-readable record of the upstream endpoints the
//! verifier knows about. These tests keep it syntactically valid and in sync
//! with the compiled-in `EndpointRegistry` and the standard catalog.

use std::collections::HashSet;

use owm_contract::catalog::Catalog;
use owm_contract::config::CREDENTIAL_PARAM;
use owm_contract::endpoints::EndpointRegistry;
use serde::Deserialize;

/// Top-level manifest structure matching the TOML schema.
#[derive(Debug, Deserialize)]
struct Manifest {
    meta: Meta,
    endpoints: Vec<Endpoint>,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Meta {
    schema_version: u32,
    last_validated: String,
    credential_param: String,
}

/// A single endpoint entry in the manifest.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Endpoint {
    name: String,
    method: String,
    path: String,
    lookup_params: Vec<String>,
    covered_by_catalog: bool,
    #[serde(default)]
    notes: String,
}

fn load_manifest() -> Manifest {
    let content = std::fs::read_to_string("manifest/endpoints.toml")
        .expect("manifest/endpoints.toml should exist and be readable");
    toml::from_str(&content).expect("manifest/endpoints.toml should be valid TOML")
}

#[test]
fn manifest_endpoints_toml_is_valid() {
    let manifest = load_manifest();

    assert!(
        manifest.meta.schema_version >= 1,
        "schema_version must be at least 1"
    );
    assert!(
        !manifest.endpoints.is_empty(),
        "manifest should contain at least one endpoint"
    );

    let mut seen = HashSet::new();
    for ep in &manifest.endpoints {
        assert!(!ep.name.is_empty(), "endpoint name must not be empty");
        assert!(seen.insert(ep.name.as_str()), "duplicate endpoint {}", ep.name);
        assert_eq!(ep.method, "GET", "{} must be a GET endpoint", ep.name);
        assert!(ep.path.starts_with('/'), "{} path must be absolute", ep.name);
        assert!(
            !ep.lookup_params.is_empty(),
            "{} must declare at least one lookup parameter",
            ep.name
        );
    }
}

#[test]
fn manifest_credential_param_matches_executor() {
    let manifest = load_manifest();
    assert_eq!(manifest.meta.credential_param, CREDENTIAL_PARAM);
}

#[test]
fn manifest_matches_builtin_registry() {
    let manifest = load_manifest();
    let registry = EndpointRegistry::builtin();

    for ep in &manifest.endpoints {
        let path = registry
            .resolve(&ep.name)
            .unwrap_or_else(|e| panic!("manifest endpoint {} not in registry: {e}", ep.name));
        assert_eq!(path, ep.path, "path mismatch for {}", ep.name);
    }

    let manifest_names: HashSet<&str> = manifest.endpoints.iter().map(|e| e.name.as_str()).collect();
    for ep in registry.endpoints() {
        assert!(
            manifest_names.contains(ep.name),
            "registry endpoint {} missing from manifest",
            ep.name
        );
    }
}

#[test]
fn catalog_coverage_flags_are_accurate() {
    // Flipping covered_by_catalog without adding (or removing) fixtures is
    // caught here.
    let manifest = load_manifest();
    let used: HashSet<&str> = Catalog::standard().iter().map(|f| f.endpoint).collect();

    for ep in &manifest.endpoints {
        assert_eq!(
            ep.covered_by_catalog,
            used.contains(ep.name.as_str()),
            "covered_by_catalog is wrong for {}",
            ep.name
        );
    }
}

#[test]
fn catalog_lookup_params_are_declared_in_manifest() {
    let manifest = load_manifest();
    let catalog = Catalog::standard();

    for fixture in catalog.iter() {
        let ep = manifest
            .endpoints
            .iter()
            .find(|e| e.name == fixture.endpoint)
            .unwrap_or_else(|| panic!("fixture {} uses unlisted endpoint", fixture.id));
        for (key, _) in &fixture.params {
            assert!(
                ep.lookup_params.contains(key),
                "fixture {} sends undeclared parameter {key}",
                fixture.id
            );
        }
    }
}
