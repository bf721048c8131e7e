//! Connection Handling Module
//!
//! One async task per accepted connection, one request per connection.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                TCP Listener                 │
//! │               (server module)               │
//! └──────────────────────┬──────────────────────┘
//!                        │ accept()
//!                        ▼
//!          ┌──────────────────────────┐
//!          │  spawn handle_connection │
//!          └────────────┬─────────────┘
//!                       │
//!                       ▼
//! ┌─────────────────────────────────────────────┐
//! │  read frame ──► dispatch ──► write response │
//! │              (10 s deadline)                │
//! └─────────────────────────────────────────────┘
//!                       │
//!                       ▼
//!                  close socket
//! ```
//!
//! Transport failures end the connection without a response; decode failures
//! are answered with an `ERR` frame first. Either way the socket closes after
//! one cycle.

pub mod handler;

// Re-export commonly used types
pub use handler::{handle_connection, ConnectionStats, CONNECTION_DEADLINE};
