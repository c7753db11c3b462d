//! # Request Locals
//!
//! Per-request key-value storage owned by a single [`Ctx`](crate::ctx::Ctx).
//!
//! The store is never shared between requests: each context owns one, and it
//! is emptied when the context goes back to the pool. Because of that no
//! locking is needed, unlike application-wide state.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

/// Typed values keyed by name, ordered by key
#[derive(Default)]
pub struct Locals {
    data: BTreeMap<String, Box<dyn Any + Send + Sync>>,
}

impl Locals {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous value under `key`
    pub fn set<T: Send + Sync + 'static>(&mut self, key: impl Into<String>, value: T) {
        self.data.insert(key.into(), Box::new(value));
    }

    /// Borrow a value by key
    ///
    /// Returns `None` if the key is absent or holds another type.
    #[must_use]
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.data.get(key).and_then(|boxed| boxed.downcast_ref::<T>())
    }

    /// Check if a key exists
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Remove a value by key
    pub fn remove(&mut self, key: &str) -> bool {
        self.data.remove(key).is_some()
    }

    /// Stored keys in order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Get the number of stored items
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the store is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.data.clear();
    }
}

impl fmt::Debug for Locals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Locals")
            .field("keys", &self.data.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locals_set_get() {
        let mut locals = Locals::new();
        locals.set("count", 42i32);
        locals.set("user", "alice".to_string());

        assert_eq!(locals.get::<i32>("count"), Some(&42));
        assert_eq!(locals.get::<String>("user").map(String::as_str), Some("alice"));
    }

    #[test]
    fn test_locals_missing_and_mismatch() {
        let mut locals = Locals::new();
        assert_eq!(locals.get::<i32>("missing"), None);

        locals.set("count", 42i32);
        assert_eq!(locals.get::<String>("count"), None);
    }

    #[test]
    fn test_locals_overwrite_and_remove() {
        let mut locals = Locals::new();
        locals.set("value", 1i32);
        locals.set("value", 2i32);
        assert_eq!(locals.get::<i32>("value"), Some(&2));
        assert_eq!(locals.len(), 1);

        assert!(locals.remove("value"));
        assert!(!locals.contains("value"));
        assert!(locals.is_empty());
    }

    #[test]
    fn test_locals_keys_ordered() {
        let mut locals = Locals::new();
        locals.set("b", 1u8);
        locals.set("a", 2u8);
        assert_eq!(locals.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
