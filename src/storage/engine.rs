//! Storage Engine
//!
//! This module implements the core of TrellisKV: a concurrent map from UTF-8
//! keys to entries with optional absolute expirations, kept in lockstep with
//! the prefix trie that indexes the key hierarchy.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                    Store                     │
//! │  ┌────────────────────────────────────────┐  │
//! │  │              Mutex<State>              │  │
//! │  │   HashMap<String, Entry>  PrefixTrie   │  │
//! │  └────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────┘
//!                        ▲
//!                        │ coalesced background sweeps
//!              (scheduled by every mutator)
//! ```
//!
//! One mutex guards both the map and the trie, so every operation observes
//! them in a consistent state and a key is in the map exactly when the trie
//! holds it as a key.
//!
//! ## Expiration Model
//!
//! Expiry is lazy plus asynchronous. Reads check the expiration themselves
//! and report expired entries as absent without mutating anything; mutators
//! schedule a background sweep that physically removes expired entries and
//! their trie nodes. `count` deliberately reports the raw map size, which may
//! include expired entries the sweep has not reached yet.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use super::sweep;
use super::trie::PrefixTrie;

/// The value stored under a single key, plus its optional expiration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The stored value. The empty string is a valid, distinct value.
    pub value: String,
    /// Absolute wall-clock expiration. `None` means the key never expires.
    pub expires_at: Option<SystemTime>,
}

impl Entry {
    fn new(value: String) -> Self {
        Self {
            value,
            expires_at: None,
        }
    }

    /// An entry is live until the first instant `now >= expires_at`.
    #[inline]
    pub fn is_live(&self, now: SystemTime) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// The map and its index, mutated together under one lock.
#[derive(Debug, Default)]
pub(crate) struct State {
    pub(crate) entries: HashMap<String, Entry>,
    pub(crate) index: PrefixTrie,
}

/// State shared between `Store` handles and in-flight sweep tasks.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) state: Mutex<State>,
    pub(crate) sweep_in_flight: AtomicBool,
    read_count: AtomicU64,
    write_count: AtomicU64,
    delete_count: AtomicU64,
    expired_count: AtomicU64,
}

impl Shared {
    /// Physically removes every expired entry and its trie node. This is the
    /// body of the background sweep; it is also callable directly.
    pub(crate) fn remove_expired(&self) -> usize {
        let now = SystemTime::now();
        let mut state = self.state.lock().unwrap();

        let expired: Vec<String> = state
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            state.entries.remove(key);
            state.index.delete(key);
        }

        if !expired.is_empty() {
            self.expired_count
                .fetch_add(expired.len() as u64, Ordering::Relaxed);
        }

        expired.len()
    }
}

/// Point-in-time operation counters for the store.
#[derive(Debug, Clone, Copy)]
pub struct StoreStats {
    /// Raw number of entries in the map, expired stragglers included.
    pub keys: usize,
    /// Total read-path operations served.
    pub reads: u64,
    /// Total insert/update/upsert operations served.
    pub writes: u64,
    /// Total delete operations served.
    pub deletes: u64,
    /// Total entries physically removed by sweeps.
    pub expired: u64,
}

/// The TrellisKV storage engine.
///
/// Cloning a `Store` produces another handle to the same keyspace; handles
/// are cheap to clone and safe to share across tasks.
///
/// # Example
///
/// ```
/// use trelliskv::storage::Store;
///
/// let store = Store::new();
///
/// let (_, inserted) = store.insert("region:1:manager", "alice");
/// assert!(inserted);
///
/// let entry = store.read("region:1:manager").unwrap();
/// assert_eq!(entry.value, "alice");
/// assert!(entry.expires_at.is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Store {
    shared: Arc<Shared>,
}

impl Store {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the entry under `key`.
    ///
    /// Returns `None` when the key is absent or its expiration has passed.
    /// Reading never mutates state; expired entries are left for the sweep.
    pub fn read(&self, key: &str) -> Option<Entry> {
        self.shared.read_count.fetch_add(1, Ordering::Relaxed);

        let entry = {
            let state = self.shared.state.lock().unwrap();
            state.entries.get(key).cloned()
        };

        // The expiry check runs outside the lock. A concurrent sweep can only
        // remove entries, never revive one, so this cannot report a stale
        // value as live.
        entry.filter(|entry| entry.is_live(SystemTime::now()))
    }

    /// Reads the expiration of `key`.
    ///
    /// Returns `None` when the key is absent, already expired, or carries no
    /// expiration.
    pub fn read_expiration(&self, key: &str) -> Option<SystemTime> {
        self.read(key).and_then(|entry| entry.expires_at)
    }

    /// True when `read` would find the key.
    pub fn present(&self, key: &str) -> bool {
        self.read(key).is_some()
    }

    /// Inserts `value` under `key` if the key is not live.
    ///
    /// A key whose previous entry has already expired counts as absent: the
    /// new entry starts with no expiration regardless of what the old one
    /// carried.
    ///
    /// Returns the value now stored under the key and whether the insert took
    /// effect. On a collision the existing value comes back untouched.
    pub fn insert(&self, key: &str, value: &str) -> (String, bool) {
        self.shared.write_count.fetch_add(1, Ordering::Relaxed);
        let now = SystemTime::now();

        let result = {
            let mut state = self.shared.state.lock().unwrap();
            let existing = state
                .entries
                .get(key)
                .filter(|entry| entry.is_live(now))
                .map(|entry| entry.value.clone());

            match existing {
                Some(current) => (current, false),
                None => {
                    state
                        .entries
                        .insert(key.to_owned(), Entry::new(value.to_owned()));
                    state.index.add(key);
                    (value.to_owned(), true)
                }
            }
        };

        sweep::schedule(&self.shared);
        result
    }

    /// Replaces the value under `key` if the key is live, preserving any
    /// expiration already attached to it.
    ///
    /// Returns whether the update took effect.
    pub fn update(&self, key: &str, value: &str) -> bool {
        self.shared.write_count.fetch_add(1, Ordering::Relaxed);
        let now = SystemTime::now();

        let updated = {
            let mut state = self.shared.state.lock().unwrap();
            match state.entries.get_mut(key) {
                Some(entry) if entry.is_live(now) => {
                    entry.value = value.to_owned();
                    true
                }
                _ => false,
            }
        };

        sweep::schedule(&self.shared);
        updated
    }

    /// Inserts or replaces the value under `key`.
    ///
    /// A live key keeps its expiration; an absent or expired key is created
    /// fresh with no expiration.
    ///
    /// Returns the new value of the key.
    pub fn upsert(&self, key: &str, value: &str) -> String {
        self.shared.write_count.fetch_add(1, Ordering::Relaxed);
        let now = SystemTime::now();

        {
            let mut state = self.shared.state.lock().unwrap();
            let live = state
                .entries
                .get(key)
                .is_some_and(|entry| entry.is_live(now));

            if live {
                if let Some(entry) = state.entries.get_mut(key) {
                    entry.value = value.to_owned();
                }
            } else {
                state
                    .entries
                    .insert(key.to_owned(), Entry::new(value.to_owned()));
                state.index.add(key);
            }
        }

        sweep::schedule(&self.shared);
        value.to_owned()
    }

    /// Removes `key` and its trie node.
    ///
    /// Returns whether a live entry was removed. An expired straggler is
    /// removed too, but reported as absent.
    pub fn delete(&self, key: &str) -> bool {
        self.shared.delete_count.fetch_add(1, Ordering::Relaxed);
        let now = SystemTime::now();

        let existed = {
            let mut state = self.shared.state.lock().unwrap();
            let removed = state.entries.remove(key);
            state.index.delete(key);
            removed.is_some_and(|entry| entry.is_live(now))
        };

        sweep::schedule(&self.shared);
        existed
    }

    /// Attaches an absolute expiration to a live key.
    ///
    /// Timestamps in the past are accepted; the key simply becomes absent to
    /// every subsequent read. Returns whether the expiration was set.
    pub fn expire(&self, key: &str, at: SystemTime) -> bool {
        let now = SystemTime::now();
        let mut state = self.shared.state.lock().unwrap();

        match state.entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.expires_at = Some(at);
                true
            }
            _ => false,
        }
    }

    /// The raw size of the map.
    ///
    /// This may overcount by entries that have expired but not yet been
    /// swept. That imprecision is part of the contract; callers wanting an
    /// exact live count should measure `keys_by("")`.
    pub fn count(&self) -> usize {
        self.shared.state.lock().unwrap().entries.len()
    }

    /// Empties the map and the trie.
    pub fn truncate(&self) {
        let mut state = self.shared.state.lock().unwrap();
        state.entries.clear();
        state.index.clear();
    }

    /// Every live key matching `prefix` at a component boundary.
    ///
    /// The empty prefix enumerates all live keys. Expired entries are
    /// filtered out even when the sweep has not removed them yet.
    pub fn keys_by(&self, prefix: &str) -> Vec<String> {
        self.shared.read_count.fetch_add(1, Ordering::Relaxed);
        let now = SystemTime::now();
        let state = self.shared.state.lock().unwrap();

        state
            .index
            .find(prefix)
            .into_iter()
            .filter(|key| {
                state
                    .entries
                    .get(key)
                    .is_some_and(|entry| entry.is_live(now))
            })
            .collect()
    }

    /// Removes every key matching `prefix` and drops the whole subtree from
    /// the trie.
    ///
    /// Returns the number of live keys removed; expired stragglers under the
    /// prefix are cleaned up but not counted.
    pub fn delete_by(&self, prefix: &str) -> usize {
        self.shared.delete_count.fetch_add(1, Ordering::Relaxed);
        let now = SystemTime::now();
        let mut state = self.shared.state.lock().unwrap();

        let matches = state.index.find(prefix);
        state.index.delete_all(prefix);

        let mut removed = 0;
        for key in &matches {
            if let Some(entry) = state.entries.remove(key) {
                if entry.is_live(now) {
                    removed += 1;
                }
            }
        }

        removed
    }

    /// Applies `expire` to every live key matching `prefix`.
    ///
    /// Returns the number of keys targeted.
    pub fn expire_by(&self, prefix: &str, at: SystemTime) -> usize {
        let now = SystemTime::now();
        let mut state = self.shared.state.lock().unwrap();

        let matches = state.index.find(prefix);
        let mut expired = 0;
        for key in matches {
            if let Some(entry) = state.entries.get_mut(&key) {
                if entry.is_live(now) {
                    entry.expires_at = Some(at);
                    expired += 1;
                }
            }
        }

        expired
    }

    /// Runs one expiration sweep synchronously.
    ///
    /// Returns the number of entries removed. Mutators schedule this in the
    /// background; exposing it directly lets embedders and tests force a
    /// deterministic cleanup point.
    pub fn sweep_expired(&self) -> usize {
        self.shared.remove_expired()
    }

    /// A snapshot of the operation counters.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            keys: self.count(),
            reads: self.shared.read_count.load(Ordering::Relaxed),
            writes: self.shared.write_count.load(Ordering::Relaxed),
            deletes: self.shared.delete_count.load(Ordering::Relaxed),
            expired: self.shared.expired_count.load(Ordering::Relaxed),
        }
    }
}
