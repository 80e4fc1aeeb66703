//! Expected-outcome descriptors: what a fixture declares the upstream API
//! must answer.
//!
//! An [`Outcome`] is either a single concrete expectation (`Success` or
//! `ClientError`) or an ordered list of acceptable candidates (`Ambiguous`)
//! for inputs whose correct classification depends on data the fixture does
//! not control, such as a numeric string that may coincide with a city id.
//!
//! ## The `cod` field
//!
//! The upstream API reports its status code in the body as `cod`, sometimes
//! as a JSON string (`"404"`) and sometimes as a number (`401`, `200`).
//! [`Cod`] accepts both, and all comparisons go through [`Cod::canonical`],
//! which renders either form as its decimal string. This silently accepts the
//! upstream inconsistency: a fixture declaring `"404"` passes against `404`
//! and vice versa.

use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

/// Body message for an unknown city (404).
pub const CITY_NOT_FOUND: &str = "city not found";

/// Body message for an empty lookup value (400).
pub const NOTHING_TO_GEOCODE: &str = "Nothing to geocode";

/// Body message for a missing or invalid credential (401).
pub const INVALID_API_KEY: &str =
    "Invalid API key. Please see https://openweathermap.org/faq#error401 for more info.";

// ── Status code field ──────────────────────────────────────────────────

/// The upstream's dual-typed `cod` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cod {
    /// Numeric form, e.g. `401`.
    Number(i64),
    /// String form, e.g. `"404"`.
    Text(String),
}

impl Cod {
    /// Canonical comparison form: the decimal string of the code.
    ///
    /// `Number(404)` and `Text("404")` both canonicalize to `"404"`. Strings
    /// are not trimmed or otherwise cleaned up; `" 404"` stays distinct.
    pub fn canonical(&self) -> String {
        match self {
            Cod::Number(n) => n.to_string(),
            Cod::Text(s) => s.clone(),
        }
    }

    /// Type-tolerant equality through the canonical form.
    pub fn same_code(&self, other: &Cod) -> bool {
        self.canonical() == other.canonical()
    }
}

impl From<u16> for Cod {
    fn from(code: u16) -> Self {
        Cod::Number(i64::from(code))
    }
}

impl From<&str> for Cod {
    fn from(code: &str) -> Self {
        Cod::Text(code.to_string())
    }
}

impl fmt::Display for Cod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cod::Number(n) => write!(f, "{n}"),
            Cod::Text(s) => write!(f, "\"{s}\""),
        }
    }
}

// ── Message matching ───────────────────────────────────────────────────

/// How a declared error message is compared with the body's `message`.
///
/// Error messages default to `Exact`. `Pattern` is reserved for fixtures
/// whose upstream wording is known to vary, and `NonEmpty` for boundary
/// inputs where only the presence of a diagnostic is guaranteed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum MessageMatch {
    /// Case-sensitive string equality.
    Exact(String),
    /// Regular-expression search anywhere in the message.
    Pattern(#[serde(serialize_with = "serialize_regex")] Regex),
    /// Any non-empty message.
    NonEmpty,
}

fn serialize_regex<S: Serializer>(re: &Regex, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(re.as_str())
}

impl MessageMatch {
    /// Exact match against `message`.
    pub fn exact(message: impl Into<String>) -> Self {
        MessageMatch::Exact(message.into())
    }

    /// Returns `true` if `actual` satisfies this matcher. A missing message
    /// never matches.
    pub fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match self {
            MessageMatch::Exact(expected) => actual == expected,
            MessageMatch::Pattern(re) => re.is_match(actual),
            MessageMatch::NonEmpty => !actual.is_empty(),
        }
    }
}

impl PartialEq for MessageMatch {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MessageMatch::Exact(a), MessageMatch::Exact(b)) => a == b,
            (MessageMatch::Pattern(a), MessageMatch::Pattern(b)) => a.as_str() == b.as_str(),
            (MessageMatch::NonEmpty, MessageMatch::NonEmpty) => true,
            _ => false,
        }
    }
}

impl fmt::Display for MessageMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageMatch::Exact(s) => write!(f, "{s:?}"),
            MessageMatch::Pattern(re) => write!(f, "/{}/", re.as_str()),
            MessageMatch::NonEmpty => f.write_str("<any non-empty message>"),
        }
    }
}

// ── Expectations ───────────────────────────────────────────────────────

/// A 200 response for a known place. `None` fields accept any non-empty
/// value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuccessOutcome {
    /// Expected `sys.country`, compared case-sensitively.
    pub country: Option<String>,
    /// Expected `name`, compared case-sensitively.
    pub name: Option<String>,
}

impl SuccessOutcome {
    /// Success with both fields pinned.
    pub fn exact(country: &str, name: &str) -> Self {
        SuccessOutcome {
            country: Some(country.to_string()),
            name: Some(name.to_string()),
        }
    }

    /// Success for whatever place the upstream resolved.
    pub fn any_place() -> Self {
        SuccessOutcome {
            country: None,
            name: None,
        }
    }
}

/// A 4xx response with a declared error code and message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientErrorOutcome {
    /// Expected HTTP status.
    pub status: u16,
    /// Expected `cod`. `None` accepts any code consistent with `status`.
    pub code: Option<Cod>,
    /// Expected `message`.
    pub message: MessageMatch,
}

impl ClientErrorOutcome {
    /// Error outcome with a pinned code and exact message.
    pub fn new(status: u16, code: impl Into<Cod>, message: &str) -> Self {
        ClientErrorOutcome {
            status,
            code: Some(code.into()),
            message: MessageMatch::exact(message),
        }
    }

    /// Error outcome that only pins the status; code and message just have
    /// to be present and consistent.
    pub fn status_only(status: u16) -> Self {
        ClientErrorOutcome {
            status,
            code: None,
            message: MessageMatch::NonEmpty,
        }
    }

    /// Replaces the message matcher.
    pub fn with_message(mut self, message: MessageMatch) -> Self {
        self.message = message;
        self
    }
}

/// One concrete alternative inside an `Ambiguous` outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Candidate {
    /// See [`SuccessOutcome`].
    Success(SuccessOutcome),
    /// See [`ClientErrorOutcome`].
    ClientError(ClientErrorOutcome),
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Success(s) => write!(
                f,
                "Success{{country: {}, name: {}}}",
                s.country.as_deref().unwrap_or("*"),
                s.name.as_deref().unwrap_or("*"),
            ),
            Candidate::ClientError(e) => {
                let code = e.code.as_ref().map_or("*".to_string(), Cod::to_string);
                write!(
                    f,
                    "ClientError{{status: {}, cod: {}, message: {}}}",
                    e.status, code, e.message
                )
            }
        }
    }
}

/// The expected outcome declared by a fixture.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "expect", rename_all = "snake_case")]
pub enum Outcome {
    /// Exactly a successful lookup.
    Success(SuccessOutcome),
    /// Exactly a client error.
    ClientError(ClientErrorOutcome),
    /// Any one of the candidates, tried in declared order.
    Ambiguous(Vec<Candidate>),
}

impl Outcome {
    /// The outcome as an ordered candidate list. Single outcomes yield one
    /// candidate.
    pub fn candidates(&self) -> Vec<Candidate> {
        match self {
            Outcome::Success(s) => vec![Candidate::Success(s.clone())],
            Outcome::ClientError(e) => vec![Candidate::ClientError(e.clone())],
            Outcome::Ambiguous(candidates) => candidates.clone(),
        }
    }

    /// `true` for `Ambiguous` outcomes.
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Outcome::Ambiguous(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Ambiguous(candidates) => {
                f.write_str("one of [")?;
                for (i, c) in candidates.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{c}")?;
                }
                f.write_str("]")
            }
            other => {
                // Single outcomes always have exactly one candidate.
                match other.candidates().first() {
                    Some(c) => write!(f, "{c}"),
                    None => Ok(()),
                }
            }
        }
    }
}
