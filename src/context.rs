//! Request-scoped context.
//!
//! A [`Context`] is an immutable bag of values keyed by [`ContextKey`]. Adding a
//! value never mutates the receiver: [`Context::with_value`] returns a new
//! layer and leaves every clone of the old one untouched, so a context can be
//! handed to spawned tasks and outbound calls without locking.
//!
//! Reads are typed. [`Context::get`] names the type it expects and reports a
//! [`ContextError::WrongType`] when something else sits under the key, instead
//! of pretending the key was empty.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ContextError;

/// Name of a slot in a [`Context`].
///
/// Keys are plain static strings. Crates that store private values should
/// keep their key constants private so nothing else can overwrite them.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct ContextKey(&'static str);

impl ContextKey {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

type Value = Arc<dyn Any + Send + Sync>;

/// Immutable, cheaply clonable request-scoped values.
#[derive(Clone, Default)]
pub struct Context {
    values: Arc<HashMap<ContextKey, Value>>,
}

impl Context {
    /// An empty context, the root every request starts from.
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a new context holding everything in `self` plus `value` under
    /// `key`. An existing value under the same key is shadowed in the new
    /// layer only.
    pub fn with_value<V>(&self, key: ContextKey, value: V) -> Self
    where
        V: Any + Send + Sync,
    {
        let mut values = self.values.as_ref().clone();
        values.insert(key, Arc::new(value));
        Self { values: Arc::new(values) }
    }

    pub fn contains(&self, key: ContextKey) -> bool {
        self.values.contains_key(&key)
    }

    /// Typed read. Fails with `NotFound` when the key is absent and with
    /// `WrongType` when it holds a value of another type.
    pub fn get<V>(&self, key: ContextKey) -> Result<&V, ContextError>
    where
        V: Any + Send + Sync,
    {
        let value = self.values.get(&key).ok_or(ContextError::NotFound { key })?;
        value.downcast_ref::<V>().ok_or(ContextError::WrongType {
            key,
            expected: type_name::<V>(),
        })
    }

    /// Like [`get`](Context::get), collapsing both failures into `None`.
    pub fn lookup<V>(&self, key: ContextKey) -> Option<&V>
    where
        V: Any + Send + Sync,
    {
        self.get(key).ok()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}
