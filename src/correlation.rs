//! Correlation identifiers.
//!
//! One opaque token per logical request, carried as the `X-Correlation-ID`
//! HTTP header and as `x-correlation-id` gRPC metadata (metadata keys are
//! lowercase on the wire).

use std::fmt;

use uuid::Uuid;

/// HTTP header carrying the correlation id, as written in messages.
pub const CORRELATION_ID_HEADER: &str = "X-Correlation-ID";

/// gRPC metadata key carrying the correlation id.
pub const CORRELATION_ID_METADATA_KEY: &str = "x-correlation-id";

pub(crate) const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// A correlation token. Never blank.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// A fresh random id (UUID v4, hyphenated).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Accepts any value that is not empty or whitespace-only. No other
    /// format is enforced.
    pub fn parse(raw: &str) -> Option<Self> {
        if is_blank(raw) { None } else { Some(Self(raw.to_owned())) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CorrelationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
