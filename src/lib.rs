//! # TrellisKV - An In-Memory Key-Value Store with Hierarchical Prefix Queries
//!
//! TrellisKV is a single-node, in-memory key-value store addressable over a
//! framed TCP protocol. Keys are UTF-8 strings segmented on `:` into a
//! hierarchy, so whole subtrees of the keyspace can be listed, deleted, or
//! expired in one command.
//!
//! ## Features
//!
//! - **Prefix queries**: a trie indexes the key hierarchy; `KEYSBY`,
//!   `DELETEBY`, and `EXPIREBY` visit exactly the matching subtree
//! - **Expirations**: keys carry optional absolute expirations with
//!   millisecond resolution, enforced lazily on reads and reclaimed by
//!   background sweeps
//! - **One-shot protocol**: length-prefixed binary frames, one request per
//!   connection, `ACK`/`NULL`/`ERR` response discipline
//! - **Async I/O**: built on Tokio, one task per connection
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          TrellisKV                           │
//! │                                                              │
//! │  ┌────────────┐    ┌────────────┐    ┌─────────────┐         │
//! │  │   Server   │───>│ Connection │───>│   Command   │         │
//! │  │ (listener) │    │  handler   │    │   handler   │         │
//! │  └────────────┘    └────────────┘    └──────┬──────┘         │
//! │                                             │                │
//! │  ┌────────────┐                             ▼                │
//! │  │    Wire    │              ┌────────────────────────────┐  │
//! │  │   codec    │              │           Store            │  │
//! │  └────────────┘              │  ┌───────────┐ ┌─────────┐ │  │
//! │                              │  │ key → val │ │ prefix  │ │  │
//! │  ┌────────────┐              │  │    map    │ │  trie   │ │  │
//! │  │   Client   │              │  └───────────┘ └─────────┘ │  │
//! │  └────────────┘              └────────────────────────────┘  │
//! │                                             ▲                │
//! │                              ┌──────────────┴─────────────┐  │
//! │                              │   background sweeps        │  │
//! │                              │ (scheduled by mutations)   │  │
//! │                              └────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```no_run
//! use trelliskv::client::Client;
//! use trelliskv::server::Server;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut server = Server::new("localhost:8888");
//!     server.start().await?;
//!
//!     let client = Client::new("localhost:8888");
//!     client.insert("region:1:manager", "alice").await?;
//!     client.insert("region:1:store:1:employee:1", "bob").await?;
//!
//!     assert_eq!(client.keys_by("region:1").await?.len(), 2);
//!
//!     server.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: the engine: keyed map, prefix trie, expiration sweeps
//! - [`protocol`]: the framed binary wire format
//! - [`commands`]: request dispatch from frames to engine calls
//! - [`connection`]: the one-shot per-connection request cycle
//! - [`server`]: listener lifecycle (bind, accept, stop)
//! - [`client`]: the typed client, one connection per call
//!
//! ## Design Highlights
//!
//! ### One Lock, Two Structures
//!
//! The map and the trie mutate together under a single mutex, so the trie
//! always enumerates exactly the keys in the map. Count is the one reading
//! that stays deliberately loose: it reports the raw map size, expired
//! stragglers included, until a sweep catches up.
//!
//! ### Lazy + Asynchronous Expiry
//!
//! Reads shadow expired entries by themselves and never block on cleanup;
//! every mutation schedules a coalesced background sweep that does the
//! physical removal. Nothing in the contract depends on sweep timing.

pub mod client;
pub mod commands;
pub mod connection;
pub mod protocol;
pub mod server;
pub mod storage;

// Re-export commonly used types for convenience
pub use client::{Client, ClientError};
pub use commands::CommandHandler;
pub use connection::{handle_connection, ConnectionStats};
pub use protocol::{Command, WireError};
pub use server::{Server, ServerError};
pub use storage::{Entry, PrefixTrie, Store};

/// The default host the server binds to
pub const DEFAULT_HOST: &str = "localhost";

/// The default port the server listens on
pub const DEFAULT_PORT: u16 = 8888;

/// Version of TrellisKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
