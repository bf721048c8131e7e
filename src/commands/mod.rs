//! Command Dispatch Module
//!
//! Turns decoded request frames into storage engine calls and engine results
//! into response frames.
//!
//! ## Request/Response Mapping
//!
//! | Request | Success response |
//! |---|---|
//! | `READ key` | `READ value` or `NULL` |
//! | `READEXPIRATION key` | `READEXPIRATION ms` or `NULL` |
//! | `INSERT key value` | `ACK` or `NULL` |
//! | `UPDATE key value` | `ACK` or `NULL` |
//! | `UPSERT key value` | `ACK` |
//! | `DELETE key` | `ACK` or `NULL` |
//! | `PRESENT key` | `ACK` or `NULL` |
//! | `EXPIRE key ms` | `ACK` or `NULL` |
//! | `TRUNCATE` | `ACK` |
//! | `COUNT` | `COUNT n` |
//! | `KEYSBY prefix` | `KEYSBY k1 k2 …` |
//! | `DELETEBY prefix` | `DELETEBY n` |
//! | `EXPIREBY prefix ms` | `EXPIREBY n` |
//!
//! Any decoding failure produces an `ERR message` frame instead.

pub mod handler;

// Re-export the main command handler
pub use handler::CommandHandler;
