//! Operations that never reach the access log.

use std::collections::HashSet;
use std::sync::Arc;

use crate::health::{LIVENESS_PATH, READINESS_PATH};

/// Exact-match set of paths (HTTP) or full method names (gRPC) whose calls
/// are not logged. Immutable after construction and cheap to clone.
#[derive(Clone, Debug, Default)]
pub struct IgnoreSet {
    names: Arc<HashSet<String>>,
}

impl IgnoreSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { names: Arc::new(names.into_iter().map(Into::into).collect()) }
    }

    /// The built-in health probe paths.
    pub fn probes() -> Self {
        Self::new([LIVENESS_PATH, READINESS_PATH])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
