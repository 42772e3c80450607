//! Error types.

use crate::context::ContextKey;

/// The error type returned by tether's fallible operations.
///
/// Application-level failures (a missing correlation id, a 404) are expressed
/// as HTTP [`Response`](crate::Response) values or gRPC
/// [`Status`](tonic::Status) values, not as `Error`s. This type surfaces
/// infrastructure failures: binding a port, accepting a connection, or an
/// outbound call that never produced a response.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The outbound HTTP client failed before a response arrived. Passed
    /// through unchanged and never retried.
    #[error("outbound: {0}")]
    Outbound(#[from] reqwest::Error),
}

/// A value could not be read back out of a [`Context`](crate::Context).
///
/// Both variants are recoverable. Callers treat either one as "no native
/// request available" and carry on without it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    #[error("no value stored under context key `{key}`")]
    NotFound { key: ContextKey },

    #[error("value under context key `{key}` is not a `{expected}`")]
    WrongType { key: ContextKey, expected: &'static str },
}
