//! Storage Module
//!
//! The in-memory heart of TrellisKV: a keyed map with per-entry expirations
//! and a prefix trie kept in lockstep with it, both guarded by a single
//! engine-wide lock.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                   Store                     │
//! │                                             │
//! │   HashMap<String, Entry>  ◄──►  PrefixTrie  │
//! │          (values)               (hierarchy) │
//! └─────────────────────────────────────────────┘
//!                       ▲
//!                       │
//!         coalesced background sweeps
//!        (scheduled by every mutator)
//! ```
//!
//! ## Features
//!
//! - **Prefix queries**: keys segment on `:` and whole subtrees of the
//!   hierarchy can be listed, deleted, or expired in one call
//! - **Lazy expiry**: expired entries read as absent immediately
//! - **Async sweeps**: mutations schedule background cleanup of expired
//!   entries, coalesced to one in-flight sweep
//! - **Approximate count**: the raw map size, by contract
//!
//! ## Example
//!
//! ```
//! use trelliskv::storage::Store;
//!
//! let store = Store::new();
//! store.insert("region:1:store:1:employee:1", "alice");
//! store.insert("region:1:store:1:employee:2", "bob");
//! store.insert("region:1:manager", "carol");
//!
//! assert_eq!(store.keys_by("region:1:store:1").len(), 2);
//! assert_eq!(store.delete_by("region:1"), 3);
//! ```

pub mod engine;
pub mod sweep;
pub mod trie;

// Re-export commonly used types
pub use engine::{Entry, Store, StoreStats};
pub use trie::{PrefixTrie, DELIMITER};
