//! Wire Protocol Implementation
//!
//! This module implements the framed binary protocol TrellisKV speaks over
//! TCP: length-prefixed, separator-delimited messages carrying an ASCII
//! command token and length-prefixed arguments.
//!
//! ## Overview
//!
//! Every message, request or response, is one frame:
//!
//! ```text
//! <u32 LE total length, including itself> 0x7C <COMMAND> (0x7C <u32 LE len> 0x7C <arg>)*
//! ```
//!
//! The leading length makes framing O(1) for the reader; the separator byte
//! `0x7C` and the per-argument length words make the argument walk strict and
//! unambiguous. The canonical `ACK` and `NULL` responses are fixed byte
//! sequences that compatibility depends on.
//!
//! ## Modules
//!
//! - `types`: the `Command` set, frame encoding, canonical responses, and
//!   the unix-millisecond timestamp codec
//! - `parser`: strict frame decoding and the `WireError` taxonomy
//!
//! ## Example
//!
//! ```
//! use trelliskv::protocol::{parser, types, Command};
//!
//! let frame = types::encode_message(Command::Insert, &["region:1:manager", "alice"]);
//!
//! assert_eq!(parser::command(&frame).unwrap(), Command::Insert);
//! assert_eq!(
//!     parser::arguments(Command::Insert, &frame).unwrap(),
//!     vec!["region:1:manager", "alice"]
//! );
//! ```

pub mod parser;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::WireError;
pub use types::Command;
