//! Raw upstream responses, captured without interpretation.
//!
//! A [`RawResponse`] is created once per fixture execution and consumed by
//! exactly one validation. The body is kept as a `serde_json::Value` rather
//! than a typed struct so that unexpected shapes are reported verbatim in
//! diagnostics instead of failing deserialization.

use serde::Serialize;
use serde_json::Value;

use crate::outcome::Cod;

/// Status code and parsed body of one upstream response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawResponse {
    /// HTTP status code.
    pub status: u16,
    /// Parsed JSON body. A body that is not valid JSON is stored as a JSON
    /// string holding the raw text, so it still shows up in reports.
    pub body: Value,
}

impl RawResponse {
    /// Builds a response from already-parsed parts.
    pub fn new(status: u16, body: Value) -> Self {
        RawResponse { status, body }
    }

    /// Builds a response from the raw body bytes as received on the wire.
    pub fn from_bytes(status: u16, bytes: &[u8]) -> Self {
        let body = match serde_json::from_slice(bytes) {
            Ok(value) => value,
            Err(_) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        };
        RawResponse { status, body }
    }

    /// The body's `cod` field in either representation.
    pub fn cod(&self) -> Option<Cod> {
        match self.body.get("cod")? {
            Value::Number(n) => n.as_i64().map(Cod::Number),
            Value::String(s) => Some(Cod::Text(s.clone())),
            _ => None,
        }
    }

    /// The body's `message` field.
    pub fn message(&self) -> Option<&str> {
        self.body.get("message")?.as_str()
    }

    /// The resolved place name (`name`).
    pub fn place_name(&self) -> Option<&str> {
        self.body.get("name")?.as_str()
    }

    /// The resolved country code (`sys.country`).
    pub fn country(&self) -> Option<&str> {
        self.body.get("sys")?.get("country")?.as_str()
    }

    /// `true` if the top-level body object carries `key`.
    pub fn has_top_level_field(&self, key: &str) -> bool {
        self.body.as_object().is_some_and(|obj| obj.contains_key(key))
    }
}
