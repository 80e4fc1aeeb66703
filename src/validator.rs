//! Response validation: classifies a raw response against a declared outcome
//! and produces a [`Verdict`].
//!
//! Matching rules, applied per candidate:
//!
//! - **Success**: status must be 200; `sys.country` and `name` must equal the
//!   declared values exactly (or be non-empty when the declaration leaves
//!   them open).
//! - **ClientError**: status must equal the declared status; `cod` must equal
//!   the declared code after canonicalization (see [`Cod::canonical`]); the
//!   message must satisfy the declared [`MessageMatch`](crate::outcome::MessageMatch).
//! - In both cases, a `cod` present in the body must agree with the HTTP
//!   status. A body claiming `"404"` on a 200 response is a violation even
//!   when every other field matches.
//!
//! `Ambiguous` outcomes try their candidates in declared order and the first
//! full match wins; fields are never mixed across candidates. If none
//! matches, the verdict is `AmbiguityExhausted` with every attempt listed.
//!
//! Two guards apply on top of candidate matching:
//!
//! - reflection: the message must not contain any of the fixture's
//!   reflection markers verbatim. This is checked whether or not a
//!   candidate matched, and a hit is reported as `ReflectedInput`;
//! - credential echo: once a candidate matched, the body must not carry a
//!   top-level `appid` or `apikey` field.

use std::fmt;

use serde::Serialize;

use crate::catalog::Fixture;
use crate::outcome::{Candidate, ClientErrorOutcome, Cod, Outcome, SuccessOutcome};
use crate::response::RawResponse;

/// Body fields that would reveal the caller's credential.
const CREDENTIAL_FIELDS: [&str; 2] = ["appid", "apikey"];

// ── Verdict types ──────────────────────────────────────────────────────

/// The pass/fail judgment for one response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// The response matched a candidate in full.
    Pass {
        /// Zero-based index of the selected candidate in declared order.
        candidate: usize,
        /// The candidate that matched.
        matched: Candidate,
    },
    /// The response violated the contract.
    Fail(Violation),
}

impl Verdict {
    /// `true` for `Pass`.
    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass { .. })
    }

    /// The violation, if the verdict failed.
    pub fn violation(&self) -> Option<&Violation> {
        match self {
            Verdict::Fail(v) => Some(v),
            Verdict::Pass { .. } => None,
        }
    }

    /// Zero-based index of the matched candidate, if the verdict passed.
    pub fn selected_candidate(&self) -> Option<usize> {
        match self {
            Verdict::Pass { candidate, .. } => Some(*candidate),
            Verdict::Fail(_) => None,
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass { candidate, matched } => {
                write!(f, "pass (candidate {}: {matched})", candidate + 1)
            }
            Verdict::Fail(v) => write!(f, "fail: {v}"),
        }
    }
}

/// Why a verdict failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViolationKind {
    /// The single declared outcome did not match.
    ContractViolation,
    /// No candidate of an `Ambiguous` outcome matched.
    AmbiguityExhausted,
    /// The response message echoed an injected payload.
    ReflectedInput {
        /// The marker found in the message.
        marker: String,
    },
    /// The response body carried a credential field.
    CredentialEcho {
        /// The offending top-level field name.
        field: String,
    },
}

/// A contract violation with full diagnostics: expected outcome, actual
/// response, and the mismatches found for each attempted candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    /// Failure category.
    pub kind: ViolationKind,
    /// The declared outcome.
    pub expected: Outcome,
    /// The response as received.
    pub actual: RawResponse,
    /// Every candidate tried, in order.
    pub attempts: Vec<CandidateAttempt>,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ViolationKind::ContractViolation => f.write_str("contract violation")?,
            ViolationKind::AmbiguityExhausted => f.write_str("no candidate matched")?,
            ViolationKind::ReflectedInput { marker } => {
                write!(f, "response message reflects injected input {marker:?}")?
            }
            ViolationKind::CredentialEcho { field } => {
                write!(f, "response body echoes credential field {field:?}")?
            }
        }
        write!(f, "; expected {}", self.expected)?;
        write!(f, "; actual status {} body {}", self.actual.status, self.actual.body)?;
        for attempt in &self.attempts {
            if attempt.mismatches.is_empty() {
                continue;
            }
            write!(f, "; candidate {}:", attempt.candidate + 1)?;
            for m in &attempt.mismatches {
                write!(f, " {m};")?;
            }
        }
        Ok(())
    }
}

/// The result of matching one candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateAttempt {
    /// Zero-based index in declared order.
    pub candidate: usize,
    /// The candidate that was tried.
    pub expected: Candidate,
    /// Empty when the candidate matched in full.
    pub mismatches: Vec<Mismatch>,
}

/// One field-level disagreement between a candidate and the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "field", rename_all = "snake_case")]
pub enum Mismatch {
    /// HTTP status differs.
    Status {
        /// Declared status.
        expected: u16,
        /// Received status.
        actual: u16,
    },
    /// Canonical `cod` differs or is missing.
    Code {
        /// Declared canonical code.
        expected: String,
        /// Canonical code in the body, if any.
        actual: Option<String>,
    },
    /// Message does not satisfy the matcher.
    Message {
        /// Rendered matcher.
        expected: String,
        /// Message in the body, if any.
        actual: Option<String>,
    },
    /// A success field (`name`, `sys.country`) differs or is missing.
    Place {
        /// Field path in the body.
        name: &'static str,
        /// Declared value; `None` accepts any non-empty value.
        expected: Option<String>,
        /// Value in the body, if any.
        actual: Option<String>,
    },
    /// The body's `cod` disagrees with the HTTP status.
    Inconsistent {
        /// Received status.
        status: u16,
        /// Canonical code in the body.
        code: String,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Status { expected, actual } => {
                write!(f, "status expected {expected}, got {actual}")
            }
            Mismatch::Code { expected, actual } => {
                write!(f, "cod expected {expected}, got {}", show(actual))
            }
            Mismatch::Message { expected, actual } => {
                write!(f, "message expected {expected}, got {}", show(actual))
            }
            Mismatch::Place {
                name,
                expected,
                actual,
            } => write!(
                f,
                "{name} expected {}, got {}",
                expected.as_deref().unwrap_or("<any non-empty>"),
                show(actual)
            ),
            Mismatch::Inconsistent { status, code } => {
                write!(f, "cod {code} disagrees with HTTP status {status}")
            }
        }
    }
}

fn show(value: &Option<String>) -> String {
    match value {
        Some(v) => format!("{v:?}"),
        None => "<missing>".to_string(),
    }
}

// ── Validation ─────────────────────────────────────────────────────────

/// Validates `response` against `expected` without reflection markers.
pub fn validate(response: &RawResponse, expected: &Outcome) -> Verdict {
    validate_guarded(response, expected, &[])
}

/// Validates `response` against the fixture's declared outcome and its
/// reflection markers.
pub fn validate_fixture(fixture: &Fixture, response: &RawResponse) -> Verdict {
    validate_guarded(response, &fixture.expected, &fixture.reflection_markers)
}

/// Validates `response` against `expected`, failing additionally if the
/// message contains any of `markers` verbatim. Empty markers are ignored.
///
/// A reflected marker takes precedence over candidate mismatches: the
/// verdict is `ReflectedInput`, with every attempted candidate attached.
pub fn validate_guarded(response: &RawResponse, expected: &Outcome, markers: &[String]) -> Verdict {
    let candidates = expected.candidates();
    let mut attempts = Vec::with_capacity(candidates.len());
    let mut selected = None;

    for (i, candidate) in candidates.into_iter().enumerate() {
        let mismatches = match &candidate {
            Candidate::Success(s) => check_success(s, response),
            Candidate::ClientError(e) => check_client_error(e, response),
        };
        let matched = mismatches.is_empty();
        attempts.push(CandidateAttempt {
            candidate: i,
            expected: candidate,
            mismatches,
        });
        if matched {
            selected = Some(i);
            break;
        }
    }

    let fail = |kind: ViolationKind, attempts: Vec<CandidateAttempt>| {
        Verdict::Fail(Violation {
            kind,
            expected: expected.clone(),
            actual: response.clone(),
            attempts,
        })
    };

    // Reflection is judged on the message alone, so it is reported even when
    // the echoed payload also broke an exact message match.
    if let Some(message) = response.message() {
        if let Some(marker) = markers
            .iter()
            .find(|m| !m.is_empty() && message.contains(m.as_str()))
        {
            let kind = ViolationKind::ReflectedInput {
                marker: marker.clone(),
            };
            return fail(kind, attempts);
        }
    }

    let Some(index) = selected else {
        let kind = if expected.is_ambiguous() {
            ViolationKind::AmbiguityExhausted
        } else {
            ViolationKind::ContractViolation
        };
        return fail(kind, attempts);
    };

    if let Some(field) = CREDENTIAL_FIELDS
        .iter()
        .find(|field| response.has_top_level_field(field))
    {
        let kind = ViolationKind::CredentialEcho {
            field: field.to_string(),
        };
        return fail(kind, attempts);
    }

    let matched = attempts[index].expected.clone();
    Verdict::Pass {
        candidate: index,
        matched,
    }
}

fn check_success(expected: &SuccessOutcome, response: &RawResponse) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    if response.status != 200 {
        mismatches.push(Mismatch::Status {
            expected: 200,
            actual: response.status,
        });
        // Field checks against an error body only add noise.
        return mismatches;
    }

    let fields = [
        ("sys.country", &expected.country, response.country()),
        ("name", &expected.name, response.place_name()),
    ];
    for (name, want, got) in fields {
        let ok = match (want, got) {
            (Some(want), Some(got)) => want == got,
            (None, Some(got)) => !got.is_empty(),
            (_, None) => false,
        };
        if !ok {
            mismatches.push(Mismatch::Place {
                name,
                expected: want.clone(),
                actual: got.map(str::to_string),
            });
        }
    }

    check_consistency(response, &mut mismatches);
    mismatches
}

fn check_client_error(expected: &ClientErrorOutcome, response: &RawResponse) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();
    if response.status != expected.status {
        mismatches.push(Mismatch::Status {
            expected: expected.status,
            actual: response.status,
        });
    }

    let actual_code = response.cod();
    let code_ok = match (&expected.code, &actual_code) {
        (Some(want), Some(got)) => want.same_code(got),
        (None, Some(_)) => true,
        (_, None) => false,
    };
    if !code_ok {
        let want = expected
            .code
            .as_ref()
            .map_or_else(|| expected.status.to_string(), Cod::canonical);
        mismatches.push(Mismatch::Code {
            expected: want,
            actual: actual_code.as_ref().map(Cod::canonical),
        });
    }

    if !expected.message.matches(response.message()) {
        mismatches.push(Mismatch::Message {
            expected: expected.message.to_string(),
            actual: response.message().map(str::to_string),
        });
    }

    // Consistency only means something once the status itself agreed.
    if response.status == expected.status {
        check_consistency(response, &mut mismatches);
    }
    mismatches
}

/// A `cod` present in the body must canonicalize to the HTTP status.
fn check_consistency(response: &RawResponse, mismatches: &mut Vec<Mismatch>) {
    if let Some(code) = response.cod() {
        let code = code.canonical();
        if code != response.status.to_string() {
            mismatches.push(Mismatch::Inconsistent {
                status: response.status,
                code,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::outcome::{CITY_NOT_FOUND, INVALID_API_KEY, MessageMatch, NOTHING_TO_GEOCODE};
    use serde_json::json;

    fn not_found() -> Outcome {
        Outcome::ClientError(ClientErrorOutcome::new(404, "404", CITY_NOT_FOUND))
    }

    fn not_found_response() -> RawResponse {
        RawResponse::new(404, json!({"cod": "404", "message": "city not found"}))
    }

    fn fixture(id: &str) -> Fixture {
        Catalog::standard().get(id).cloned().unwrap()
    }

    // ── Success ──────────────────────────────────────────────────────

    #[test]
    fn kyiv_success_passes() {
        let resp = RawResponse::new(200, json!({"sys": {"country": "UA"}, "name": "Kyiv"}));
        let verdict = validate(&resp, &Outcome::Success(SuccessOutcome::exact("UA", "Kyiv")));
        assert!(verdict.is_pass(), "{verdict}");
        assert_eq!(verdict.selected_candidate(), Some(0));
    }

    #[test]
    fn success_fields_are_case_sensitive() {
        let resp = RawResponse::new(200, json!({"sys": {"country": "ua"}, "name": "Kyiv"}));
        let verdict = validate(&resp, &Outcome::Success(SuccessOutcome::exact("UA", "Kyiv")));
        let violation = verdict.violation().unwrap();
        assert_eq!(violation.kind, ViolationKind::ContractViolation);
        assert!(matches!(
            violation.attempts[0].mismatches[0],
            Mismatch::Place { name: "sys.country", .. }
        ));
    }

    #[test]
    fn success_rejects_non_200() {
        let verdict = validate(
            &not_found_response(),
            &Outcome::Success(SuccessOutcome::exact("UA", "Kyiv")),
        );
        let violation = verdict.violation().unwrap();
        assert_eq!(
            violation.attempts[0].mismatches,
            vec![Mismatch::Status {
                expected: 200,
                actual: 404
            }]
        );
    }

    #[test]
    fn success_with_contradicting_cod_fails() {
        let resp = RawResponse::new(
            200,
            json!({"cod": "404", "sys": {"country": "UA"}, "name": "Kyiv"}),
        );
        let verdict = validate(&resp, &Outcome::Success(SuccessOutcome::exact("UA", "Kyiv")));
        assert!(matches!(
            verdict.violation().unwrap().attempts[0].mismatches[0],
            Mismatch::Inconsistent { status: 200, .. }
        ));
    }

    #[test]
    fn any_place_requires_non_empty_name() {
        let outcome = Outcome::Success(SuccessOutcome::any_place());
        let ok = RawResponse::new(200, json!({"cod": 200, "name": "Somewhere", "sys": {"country": "DE"}}));
        assert!(validate(&ok, &outcome).is_pass());
        let empty = RawResponse::new(200, json!({"cod": 200, "name": "", "sys": {"country": "DE"}}));
        assert!(!validate(&empty, &outcome).is_pass());
    }

    // ── ClientError ──────────────────────────────────────────────────

    #[test]
    fn empty_city_scenario_passes() {
        let resp = RawResponse::new(400, json!({"cod": "400", "message": "Nothing to geocode"}));
        let outcome = Outcome::ClientError(ClientErrorOutcome::new(400, "400", NOTHING_TO_GEOCODE));
        assert!(validate(&resp, &outcome).is_pass());
    }

    #[test]
    fn numeric_and_string_cod_are_interchangeable() {
        let numeric = RawResponse::new(404, json!({"cod": 404, "message": "city not found"}));
        assert!(validate(&numeric, &not_found()).is_pass());

        let declared_numeric =
            Outcome::ClientError(ClientErrorOutcome::new(404, 404u16, CITY_NOT_FOUND));
        assert!(validate(&not_found_response(), &declared_numeric).is_pass());
    }

    #[test]
    fn not_found_fixture_fails_on_200() {
        let resp = RawResponse::new(200, json!({"cod": 200, "name": "Kyiv", "sys": {"country": "UA"}}));
        let verdict = validate(&resp, &not_found());
        assert!(!verdict.is_pass(), "a hit must never satisfy a declared miss");
    }

    #[test]
    fn wrong_message_is_reported() {
        let resp = RawResponse::new(404, json!({"cod": "404", "message": "City not found"}));
        let verdict = validate(&resp, &not_found());
        let mismatches = &verdict.violation().unwrap().attempts[0].mismatches;
        assert_eq!(mismatches.len(), 1);
        assert!(matches!(mismatches[0], Mismatch::Message { .. }));
    }

    #[test]
    fn missing_cod_fails_even_for_open_code() {
        let resp = RawResponse::new(404, json!({"message": "city not found"}));
        let outcome = Outcome::ClientError(ClientErrorOutcome::status_only(404));
        let verdict = validate(&resp, &outcome);
        assert!(matches!(
            verdict.violation().unwrap().attempts[0].mismatches[0],
            Mismatch::Code { actual: None, .. }
        ));
    }

    #[test]
    fn open_code_must_agree_with_status() {
        let resp = RawResponse::new(404, json!({"cod": "400", "message": "bad"}));
        let outcome = Outcome::ClientError(ClientErrorOutcome::status_only(404));
        let verdict = validate(&resp, &outcome);
        assert!(matches!(
            verdict.violation().unwrap().attempts[0].mismatches[0],
            Mismatch::Inconsistent { status: 404, .. }
        ));
    }

    #[test]
    fn credential_failure_outcome() {
        let fixture = fixture("credential/missing-api-key");
        let resp = RawResponse::new(401, json!({"cod": 401, "message": INVALID_API_KEY}));
        assert!(validate_fixture(&fixture, &resp).is_pass());

        // A successful lookup (credential supplied) never satisfies it.
        let ok = RawResponse::new(200, json!({"cod": 200, "name": "Kyiv", "sys": {"country": "UA"}}));
        assert!(!validate_fixture(&fixture, &ok).is_pass());
    }

    #[test]
    fn pattern_tolerant_fixture_accepts_variant_wording() {
        let fixture = fixture("malformed/combo-unicode");
        let resp = RawResponse::new(404, json!({"cod": "404", "message": "Not Found"}));
        assert!(validate_fixture(&fixture, &resp).is_pass());
        assert!(matches!(
            fixture.expected,
            Outcome::ClientError(ClientErrorOutcome {
                message: MessageMatch::Pattern(_),
                ..
            })
        ));
    }

    // ── Ambiguous ────────────────────────────────────────────────────

    #[test]
    fn digits_only_selects_second_candidate_on_404() {
        let fixture = fixture("malformed/digits-only");
        let verdict = validate_fixture(&fixture, &not_found_response());
        assert_eq!(verdict.selected_candidate(), Some(1));
        assert!(verdict.to_string().contains("candidate 2"));
    }

    #[test]
    fn digits_only_selects_first_candidate_on_200() {
        let fixture = fixture("malformed/digits-only");
        let resp = RawResponse::new(200, json!({"cod": 200, "name": "Some Town", "sys": {"country": "RU"}}));
        assert_eq!(validate_fixture(&fixture, &resp).selected_candidate(), Some(0));
    }

    #[test]
    fn first_full_match_wins() {
        // Both candidates would match; declared order decides.
        let outcome = Outcome::Ambiguous(vec![
            Candidate::ClientError(ClientErrorOutcome::status_only(404)),
            Candidate::ClientError(ClientErrorOutcome::new(404, "404", CITY_NOT_FOUND)),
        ]);
        let verdict = validate(&not_found_response(), &outcome);
        assert_eq!(verdict.selected_candidate(), Some(0));
    }

    #[test]
    fn fields_are_not_mixed_across_candidates() {
        // Status matches candidate 1, message matches candidate 2: no match.
        let outcome = Outcome::Ambiguous(vec![
            Candidate::ClientError(ClientErrorOutcome::new(400, "400", NOTHING_TO_GEOCODE)),
            Candidate::ClientError(ClientErrorOutcome::new(404, "404", CITY_NOT_FOUND)),
        ]);
        let resp = RawResponse::new(400, json!({"cod": "400", "message": "city not found"}));
        let verdict = validate(&resp, &outcome);
        let violation = verdict.violation().unwrap();
        assert_eq!(violation.kind, ViolationKind::AmbiguityExhausted);
        assert_eq!(violation.attempts.len(), 2, "every candidate is reported");
        assert!(violation.attempts.iter().all(|a| !a.mismatches.is_empty()));
    }

    #[test]
    fn long_input_accepts_either_status() {
        let fixture = fixture("boundary/extremely-long-city");
        let bad_request = RawResponse::new(400, json!({"cod": "400", "message": "bad query"}));
        assert_eq!(validate_fixture(&fixture, &bad_request).selected_candidate(), Some(0));
        assert_eq!(
            validate_fixture(&fixture, &not_found_response()).selected_candidate(),
            Some(1)
        );
        let server_error = RawResponse::new(500, json!({"cod": "500", "message": "oops"}));
        assert!(!validate_fixture(&fixture, &server_error).is_pass());
    }

    #[test]
    fn empty_ambiguous_outcome_never_passes() {
        let verdict = validate(&not_found_response(), &Outcome::Ambiguous(Vec::new()));
        assert_eq!(
            verdict.violation().unwrap().kind,
            ViolationKind::AmbiguityExhausted
        );
    }

    // ── Guards ───────────────────────────────────────────────────────

    #[test]
    fn xss_probe_passes_without_reflection() {
        let fixture = fixture("security/xss-script-tag");
        assert!(validate_fixture(&fixture, &not_found_response()).is_pass());
    }

    #[test]
    fn xss_probe_fails_when_tag_is_echoed() {
        let fixture = fixture("security/xss-script-tag");
        let resp = RawResponse::new(
            404,
            json!({"cod": "404", "message": "city not found: <script>alert('xss')</script>"}),
        );
        let verdict = validate_fixture(&fixture, &resp);
        assert!(matches!(
            verdict.violation().unwrap().kind,
            ViolationKind::ReflectedInput { .. }
        ));
    }

    #[test]
    fn partial_reflection_is_caught_by_token_marker() {
        let fixture = fixture("security/sql-drop-table");
        let resp = RawResponse::new(
            404,
            json!({"cod": "404", "message": "city not found near DROP TABLE"}),
        );
        let verdict = validate_fixture(&fixture, &resp);
        assert_eq!(
            verdict.violation().unwrap().kind,
            ViolationKind::ReflectedInput {
                marker: "DROP TABLE".to_string()
            }
        );
    }

    #[test]
    fn reflection_keeps_candidate_diagnostics() {
        let fixture = fixture("security/sql-tautology");
        let resp = RawResponse::new(
            404,
            json!({"cod": "404", "message": "city not found: City' OR '1'='1"}),
        );
        let violation = validate_fixture(&fixture, &resp).violation().cloned().unwrap();
        assert_eq!(
            violation.kind,
            ViolationKind::ReflectedInput {
                marker: "City' OR '1'='1".to_string()
            }
        );
        assert_eq!(violation.attempts.len(), 1);
        assert!(matches!(
            violation.attempts[0].mismatches.as_slice(),
            [Mismatch::Message { .. }]
        ));
    }

    #[test]
    fn reflection_wins_over_status_mismatch() {
        let fixture = fixture("security/xss-img-onerror");
        let resp = RawResponse::new(
            400,
            json!({"cod": "400", "message": "bad value <img src=x onerror=alert(1)>"}),
        );
        assert!(matches!(
            validate_fixture(&fixture, &resp).violation().unwrap().kind,
            ViolationKind::ReflectedInput { .. }
        ));
    }

    #[test]
    fn empty_marker_is_ignored() {
        let verdict = validate_guarded(&not_found_response(), &not_found(), &[String::new()]);
        assert!(verdict.is_pass());
    }

    #[test]
    fn credential_echo_fails_matching_response() {
        let resp = RawResponse::new(
            404,
            json!({"cod": "404", "message": "city not found", "appid": "abc"}),
        );
        let verdict = validate(&resp, &not_found());
        assert_eq!(
            verdict.violation().unwrap().kind,
            ViolationKind::CredentialEcho {
                field: "appid".to_string()
            }
        );
    }

    #[test]
    fn violation_display_includes_expected_and_actual() {
        let resp = RawResponse::new(200, json!({"cod": 200}));
        let text = validate(&resp, &not_found()).to_string();
        assert!(text.contains("contract violation"));
        assert!(text.contains("status: 404"));
        assert!(text.contains("actual status 200"));
        assert!(text.contains("status expected 404, got 200"));
    }
}
