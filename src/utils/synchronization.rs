//! Synchronization utilities for multi-threaded loading.
//!
//! This module provides the [`SingleFlight`] gate used by every cache in this crate:
//! the file cache (one mapping per path), and the module cache (one parse per
//! assembly identity and per file path).
//!
//! # Design Principles
//!
//! - **One execution per key**: concurrent callers asking for the same missing key block on
//!   the in-flight computation instead of starting a redundant one
//! - **Independent keys**: a slow load for one key never blocks callers of another key
//! - **Shared outcome**: every waiter observes the identical value, or the identical failure
//! - **No sticky failures**: a failed computation is evicted once it completes, so the next
//!   request retries from scratch

use std::{
    hash::Hash,
    sync::{Arc, OnceLock},
};

use dashmap::DashMap;

use crate::Error;

/// Outcome of a single-flight computation, shared between all waiters.
pub type SharedResult<V> = std::result::Result<V, Arc<Error>>;

/// Takes a shared failure back into an owned [`Error`].
///
/// A failure only one caller observed is returned as is; one shared with concurrent waiters
/// is wrapped into [`Error::LoadFailed`], naming `subject`.
pub(crate) fn unshare(source: Arc<Error>, subject: impl FnOnce() -> String) -> Error {
    match Arc::try_unwrap(source) {
        Ok(error) => error,
        Err(source) => Error::LoadFailed {
            assembly: subject(),
            source,
        },
    }
}

/// A keyed gate guaranteeing at most one in-progress computation per key.
///
/// Each key maps to a slot (`Arc<OnceLock<..>>`). The slot is cloned out of the map before
/// blocking on it, so the `DashMap` shard lock is never held while a loader runs. The first
/// caller to reach [`OnceLock::get_or_init`] executes the loader, and every concurrent caller
/// of the same key waits for and receives that caller's outcome.
///
/// # Examples
///
/// ```rust, ignore
/// use crate::utils::SingleFlight;
///
/// let gate: SingleFlight<String, usize> = SingleFlight::new();
///
/// let first = gate.get_or_load("mscorlib".to_string(), || Ok(42));
/// let second = gate.get_or_load("mscorlib".to_string(), || unreachable!());
///
/// assert_eq!(first.unwrap(), 42);
/// assert_eq!(second.unwrap(), 42);
/// ```
pub struct SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    slots: DashMap<K, Arc<OnceLock<SharedResult<V>>>>,
}

impl<K, V> SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Creates an empty gate.
    #[must_use]
    pub fn new() -> Self {
        SingleFlight {
            slots: DashMap::new(),
        }
    }

    /// Returns the value for `key`, computing it with `loader` if no computation has
    /// happened yet.
    ///
    /// If another thread is currently computing the value for `key`, this call blocks until
    /// that computation finishes and returns its outcome; `loader` is not invoked.
    ///
    /// # Arguments
    /// * `key` - The key to look up or compute
    /// * `loader` - Computation executed at most once per key while the key is absent
    ///
    /// # Errors
    /// Returns the loader's error, shared between all callers that waited on it.
    pub fn get_or_load<F>(&self, key: K, loader: F) -> SharedResult<V>
    where
        F: FnOnce() -> crate::Result<V>,
    {
        let slot = self
            .slots
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceLock::new()))
            .clone();

        let result = slot.get_or_init(|| loader().map_err(Arc::new)).clone();
        if result.is_err() {
            // Only evict the slot we waited on; a retry may already have replaced it.
            self.slots
                .remove_if(&key, |_, current| Arc::ptr_eq(current, &slot));
        }

        result
    }

    /// Returns the completed, successful value for `key` without triggering a computation.
    pub fn get(&self, key: &K) -> Option<V> {
        let slot = self.slots.get(key)?.clone();
        match slot.get() {
            Some(Ok(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Stores an already computed value for `key`, unless a value or computation exists.
    ///
    /// Returns the value that is stored for `key` after the call.
    pub fn insert(&self, key: K, value: V) -> SharedResult<V> {
        self.get_or_load(key, || Ok(value))
    }

    /// Removes the entry for `key`, returning its value if one was successfully computed.
    ///
    /// Threads already waiting on an in-flight computation still receive its outcome;
    /// subsequent calls start a fresh computation.
    pub fn remove(&self, key: &K) -> Option<V> {
        let (_, slot) = self.slots.remove(key)?;
        match slot.get() {
            Some(Ok(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Returns `true` if a successful value is stored for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Returns all keys with a successfully computed value.
    pub fn keys(&self) -> Vec<K> {
        self.slots
            .iter()
            .filter(|entry| matches!(entry.value().get(), Some(Ok(_))))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Returns all successfully computed values.
    pub fn values(&self) -> Vec<V> {
        self.slots
            .iter()
            .filter_map(|entry| match entry.value().get() {
                Some(Ok(value)) => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.slots.clear();
    }
}

impl<K, V> Default for SingleFlight<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
