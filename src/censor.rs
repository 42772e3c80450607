//! Field censorship for logged payloads.
//!
//! Only top-level keys of a JSON object are inspected. A key is censored when
//! its lowercase form contains any denylisted substring; its value, whatever
//! its type, becomes [`CENSORED_FIELD_TEXT`]. Nested objects and arrays under
//! other keys pass through untouched, sensitive or not.
//!
//! Output is re-serialized with `serde_json`, whose default map is ordered by
//! key, so the same input always renders the same string.

use serde::Serialize;
use serde_json::{Map, Value};

/// Placeholder written in place of a censored value.
pub const CENSORED_FIELD_TEXT: &str = "[HIDDEN_FIELD]";

/// Denylist used when the host supplies none.
pub const DEFAULT_CENSORED_FIELDS: [&str; 5] =
    ["password", "privatekey", "secretkey", "file", "phoneNumber"];

/// Case-insensitive substring denylist.
///
/// Entries are lowercased on the way in, so `phoneNumber` matches
/// `userPhoneNumber`. Immutable once built; share it behind an `Arc` or clone
/// it into each middleware.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CensorPolicy {
    fields: Vec<String>,
}

impl CensorPolicy {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self { fields: Vec::new() }.extend(fields)
    }

    /// A policy that censors nothing.
    pub fn none() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds entries, keeping order and skipping blanks and duplicates.
    pub fn extend<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for field in fields {
            let field = field.as_ref().trim().to_lowercase();
            if !field.is_empty() && !self.fields.contains(&field) {
                self.fields.push(field);
            }
        }
        self
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn should_censor(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.fields.iter().any(|field| key.contains(field.as_str()))
    }

    /// Replaces the values of denylisted top-level keys in place.
    pub fn censor(&self, object: &mut Map<String, Value>) {
        for (key, value) in object.iter_mut() {
            if self.should_censor(key) {
                *value = Value::String(CENSORED_FIELD_TEXT.to_owned());
            }
        }
    }

    /// Summary of a raw HTTP body for the access log.
    ///
    /// An empty body renders as `{}`. A JSON object is censored and
    /// re-serialized. Anything else (other JSON values, undecodable bytes) is
    /// shown as raw text on a single line.
    pub fn summarize_body(&self, body: &[u8]) -> String {
        if body.is_empty() {
            return "{}".to_owned();
        }
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(mut object)) => {
                self.censor(&mut object);
                Value::Object(object).to_string()
            }
            Ok(_) | Err(_) => opaque(body),
        }
    }

    /// Summary of an RPC message for the access log.
    ///
    /// Objects are censored; any other JSON shape renders as its JSON text. A
    /// message that cannot be serialized renders as `-`.
    pub fn summarize_message<T>(&self, message: &T) -> String
    where
        T: Serialize + ?Sized,
    {
        match serde_json::to_value(message) {
            Ok(value) => self.summarize_value(value),
            Err(e) => {
                tracing::debug!(error = %e, "rpc message is not serializable");
                "-".to_owned()
            }
        }
    }

    pub(crate) fn summarize_value(&self, value: Value) -> String {
        match value {
            Value::Object(mut object) => {
                self.censor(&mut object);
                Value::Object(object).to_string()
            }
            other => other.to_string(),
        }
    }
}

impl Default for CensorPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CENSORED_FIELDS)
    }
}

fn opaque(body: &[u8]) -> String {
    String::from_utf8_lossy(body)
        .replace('\r', "\\r")
        .replace('\n', "\\n")
}
