//! The fixture catalog: every input scenario the verifier sends upstream,
//! each paired with the outcome the upstream contract promises for it.
//!
//! Fixtures are grouped by intent so a runner can select subsets:
//!
//! - [`FixtureGroup::ValidLookup`]: real places by city name, zip and id.
//! - [`FixtureGroup::MalformedInput`]: city names with symbols, control
//!   characters, unicode, or digits only.
//! - [`FixtureGroup::SecurityProbe`]: SQL-injection and markup payloads.
//!   These carry reflection markers: the validator fails the fixture if any
//!   marker appears verbatim in the response message.
//! - [`FixtureGroup::Boundary`]: empty and extremely long input.
//! - [`FixtureGroup::CredentialFailure`]: the only fixture that suppresses
//!   the injected credential.
//!
//! ## Message matching
//!
//! Error messages are compared exactly by default. Pattern tolerance
//! (`(?i)city not found|not found`) applies only to the special-character
//! combination fixtures (`malformed/combo-*`), and the boundary length probe
//! only requires a non-empty message.
//!
//! The standard catalog is deterministic: [`Catalog::standard`] always yields
//! the same fixtures in the same order.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::endpoints::CURRENT_WEATHER;
use crate::error::{ContractError, Result};
use crate::outcome::{
    CITY_NOT_FOUND, Candidate, ClientErrorOutcome, INVALID_API_KEY, MessageMatch,
    NOTHING_TO_GEOCODE, Outcome, SuccessOutcome,
};

/// Length of the boundary "extremely long city name" probe.
pub const LONG_INPUT_LEN: usize = 1001;

static NOT_FOUND_TOLERANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("(?i)city not found|not found").expect("static pattern compiles")
});

// ── Fixture types ──────────────────────────────────────────────────────

/// Intent group a fixture belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FixtureGroup {
    /// Lookups that must succeed.
    ValidLookup,
    /// Garbage city names that must miss cleanly.
    MalformedInput,
    /// Injection-shaped payloads that must miss without reflection.
    SecurityProbe,
    /// Empty and oversized input.
    Boundary,
    /// Requests sent without a credential.
    CredentialFailure,
}

impl FixtureGroup {
    /// Every group in catalog order.
    pub const ALL: [FixtureGroup; 5] = [
        FixtureGroup::ValidLookup,
        FixtureGroup::MalformedInput,
        FixtureGroup::SecurityProbe,
        FixtureGroup::Boundary,
        FixtureGroup::CredentialFailure,
    ];

    /// Stable kebab-case name, as accepted by [`FromStr`].
    pub fn as_str(self) -> &'static str {
        match self {
            FixtureGroup::ValidLookup => "valid-lookup",
            FixtureGroup::MalformedInput => "malformed-input",
            FixtureGroup::SecurityProbe => "security-probe",
            FixtureGroup::Boundary => "boundary",
            FixtureGroup::CredentialFailure => "credential-failure",
        }
    }
}

impl fmt::Display for FixtureGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for FixtureGroup {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FixtureGroup::ALL
            .into_iter()
            .find(|g| g.as_str() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = FixtureGroup::ALL.iter().map(|g| g.as_str()).collect();
                format!("unknown fixture group {s:?}, expected one of {names:?}")
            })
    }
}

/// Whether the executor injects the configured credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialPolicy {
    /// Append the configured credential to the query.
    Inject,
    /// Send the request without any credential.
    Omit,
}

/// One named input scenario with its declared expected outcome.
#[derive(Debug, Clone, Serialize)]
pub struct Fixture {
    /// Unique identifier within the catalog.
    pub id: String,
    /// Intent group.
    pub group: FixtureGroup,
    /// Logical endpoint name, resolved through the registry.
    pub endpoint: &'static str,
    /// Query parameters in send order.
    pub params: Vec<(String, String)>,
    /// Credential injection policy.
    pub credential: CredentialPolicy,
    /// The outcome the upstream contract promises.
    pub expected: Outcome,
    /// Substrings that must never appear in the response message.
    pub reflection_markers: Vec<String>,
}

impl Fixture {
    /// Current-weather lookup with a single query parameter and the
    /// credential injected.
    pub fn lookup(
        id: &str,
        group: FixtureGroup,
        param: &str,
        value: &str,
        expected: Outcome,
    ) -> Self {
        Fixture {
            id: id.to_string(),
            group,
            endpoint: CURRENT_WEATHER,
            params: vec![(param.to_string(), value.to_string())],
            credential: CredentialPolicy::Inject,
            expected,
            reflection_markers: Vec::new(),
        }
    }

    /// Adds reflection markers. The injected value itself is always a
    /// marker, followed by `extra` in the given order.
    pub fn guarded(mut self, extra: &[&str]) -> Self {
        let payloads: Vec<String> = self.params.iter().map(|(_, v)| v.clone()).collect();
        self.reflection_markers.extend(payloads);
        self.reflection_markers
            .extend(extra.iter().map(|m| m.to_string()));
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// ── Catalog ────────────────────────────────────────────────────────────

/// An ordered set of fixtures with unique identifiers.
#[derive(Debug, Clone)]
pub struct Catalog {
    fixtures: Vec<Fixture>,
}

impl Catalog {
    /// Builds a catalog from arbitrary fixtures.
    ///
    /// # Errors
    ///
    /// - `ContractError::Config` if two fixtures share an identifier, or if a
    ///   fixture without parameters injects the credential (only the
    ///   credential-failure scenario may send an empty query).
    pub fn new(fixtures: Vec<Fixture>) -> Result<Self> {
        for (i, fixture) in fixtures.iter().enumerate() {
            if fixtures[..i].iter().any(|f| f.id == fixture.id) {
                return Err(ContractError::config(format!(
                    "duplicate fixture id {:?}",
                    fixture.id
                )));
            }
            if fixture.params.is_empty() && fixture.credential == CredentialPolicy::Inject {
                return Err(ContractError::config(format!(
                    "fixture {:?} has no lookup parameters",
                    fixture.id
                )));
            }
        }
        Ok(Catalog { fixtures })
    }

    /// The built-in catalog for the current weather endpoint.
    pub fn standard() -> Self {
        let mut fixtures = Vec::new();
        fixtures.extend(valid_lookups());
        fixtures.extend(malformed_inputs());
        fixtures.extend(security_probes());
        fixtures.extend(boundaries());
        fixtures.push(missing_credential());
        Catalog { fixtures }
    }

    /// All fixtures in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter()
    }

    /// Fixtures of one group, in catalog order.
    pub fn group(&self, group: FixtureGroup) -> impl Iterator<Item = &Fixture> {
        self.fixtures.iter().filter(move |f| f.group == group)
    }

    /// Looks up a fixture by identifier.
    pub fn get(&self, id: &str) -> Option<&Fixture> {
        self.fixtures.iter().find(|f| f.id == id)
    }

    /// Narrows the catalog to the given groups and identifiers. Empty
    /// selections mean "everything"; catalog order is preserved.
    pub fn select(&self, groups: &[FixtureGroup], ids: &[String]) -> Vec<Fixture> {
        self.fixtures
            .iter()
            .filter(|f| groups.is_empty() || groups.contains(&f.group))
            .filter(|f| ids.is_empty() || ids.iter().any(|id| *id == f.id))
            .cloned()
            .collect()
    }

    /// Number of fixtures.
    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    /// `true` if the catalog has no fixtures.
    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::standard()
    }
}

// ── Standard fixtures ──────────────────────────────────────────────────

fn city_not_found() -> Outcome {
    Outcome::ClientError(ClientErrorOutcome::new(404, "404", CITY_NOT_FOUND))
}

fn city_not_found_tolerant() -> Outcome {
    Outcome::ClientError(
        ClientErrorOutcome::new(404, "404", CITY_NOT_FOUND)
            .with_message(MessageMatch::Pattern(NOT_FOUND_TOLERANT.clone())),
    )
}

fn valid_lookups() -> Vec<Fixture> {
    use FixtureGroup::ValidLookup;
    vec![
        Fixture::lookup(
            "valid/city-kyiv",
            ValidLookup,
            "q",
            "Kyiv",
            Outcome::Success(SuccessOutcome::exact("UA", "Kyiv")),
        ),
        Fixture::lookup(
            "valid/zip-mountain-view",
            ValidLookup,
            "zip",
            "94040,us",
            Outcome::Success(SuccessOutcome::exact("US", "Mountain View")),
        ),
        Fixture::lookup(
            "valid/id-cairns",
            ValidLookup,
            "id",
            "2172797",
            Outcome::Success(SuccessOutcome::exact("AU", "Cairns")),
        ),
    ]
}

fn malformed_inputs() -> Vec<Fixture> {
    use FixtureGroup::MalformedInput;

    let exact = [
        ("malformed/special-chars-suffix", "Kyiv@#$%^&*()"),
        ("malformed/special-chars-only", "!@#$%^&*()"),
        ("malformed/special-chars-only-short", "@#$%^&*()"),
        ("malformed/known-city-with-symbols", "London@#$"),
        ("malformed/mixed-symbols-digits", "City123!@#"),
        ("malformed/control-characters", "Kyiv\u{0}\u{1}\u{2}"),
    ];
    let tolerant = [
        ("malformed/combo-symbols", "City!@#$%"),
        ("malformed/combo-markup-chars", "Test<>\"':;|\\"),
        ("malformed/combo-digits-symbols", "123@City&*"),
        ("malformed/combo-spaces-only", "    "),
        ("malformed/combo-unicode", "Город№123"),
    ];

    let mut fixtures: Vec<Fixture> = exact
        .iter()
        .map(|(id, q)| Fixture::lookup(id, MalformedInput, "q", q, city_not_found()))
        .collect();
    fixtures.extend(
        tolerant
            .iter()
            .map(|(id, q)| Fixture::lookup(id, MalformedInput, "q", q, city_not_found_tolerant())),
    );

    // A digits-only name may coincide with a real city id upstream, in
    // which case the lookup legitimately succeeds.
    fixtures.push(Fixture::lookup(
        "malformed/digits-only",
        MalformedInput,
        "q",
        "12345",
        Outcome::Ambiguous(vec![
            Candidate::Success(SuccessOutcome::any_place()),
            Candidate::ClientError(ClientErrorOutcome::new(404, "404", CITY_NOT_FOUND)),
        ]),
    ));
    fixtures
}

fn security_probes() -> Vec<Fixture> {
    use FixtureGroup::SecurityProbe;

    let probes: [(&str, &str, &[&str]); 5] = [
        (
            "security/sql-drop-table",
            "'; DROP TABLE cities; --",
            &["DROP TABLE"],
        ),
        (
            "security/xss-script-tag",
            "<script>alert('xss')</script>",
            &["<script>"],
        ),
        ("security/sql-tautology", "City' OR '1'='1", &["' OR '"]),
        (
            "security/sql-delete-from",
            "City\"; DELETE FROM weather; --",
            &["DELETE FROM"],
        ),
        (
            "security/xss-img-onerror",
            "<img src=x onerror=alert(1)>",
            &["<img", "onerror"],
        ),
    ];

    probes
        .iter()
        .map(|(id, q, markers)| {
            Fixture::lookup(id, SecurityProbe, "q", q, city_not_found()).guarded(markers)
        })
        .collect()
}

fn boundaries() -> Vec<Fixture> {
    use FixtureGroup::Boundary;

    let long_name = "A".repeat(LONG_INPUT_LEN);
    vec![
        Fixture::lookup(
            "boundary/empty-city",
            Boundary,
            "q",
            "",
            Outcome::ClientError(ClientErrorOutcome::new(400, "400", NOTHING_TO_GEOCODE)),
        ),
        Fixture::lookup(
            "boundary/extremely-long-city",
            Boundary,
            "q",
            &long_name,
            Outcome::Ambiguous(vec![
                Candidate::ClientError(ClientErrorOutcome::status_only(400)),
                Candidate::ClientError(ClientErrorOutcome::status_only(404)),
            ]),
        ),
    ]
}

fn missing_credential() -> Fixture {
    Fixture {
        id: "credential/missing-api-key".to_string(),
        group: FixtureGroup::CredentialFailure,
        endpoint: CURRENT_WEATHER,
        params: Vec::new(),
        credential: CredentialPolicy::Omit,
        expected: Outcome::ClientError(ClientErrorOutcome::new(401, 401u16, INVALID_API_KEY)),
        reflection_markers: Vec::new(),
    }
}
