//! Wire Protocol Types and Frame Encoding
//!
//! This module defines the command set and the binary frame layout shared by
//! the server and the client.
//!
//! ## Frame Layout
//!
//! ```text
//! ┌────────────────┬──────┬─────────┬──────────────────────────────────┐
//! │ total len (u32 │ 0x7C │ command │ ( 0x7C │ arg len (u32 LE) │ 0x7C │
//! │ LE, incl. self)│      │  ASCII  │        │ arg bytes        )*     │
//! └────────────────┴──────┴─────────┴──────────────────────────────────┘
//! ```
//!
//! The total length includes its own four bytes, so a reader can frame a
//! message after peeking the first word. There is no trailing separator.
//!
//! ## Canonical Responses
//!
//! The boolean responses are fixed byte sequences:
//!
//! ```text
//! ACK:  {0x08, 0x00, 0x00, 0x00, 0x7C, 'A', 'C', 'K'}
//! NULL: {0x09, 0x00, 0x00, 0x00, 0x7C, 'N', 'U', 'L', 'L'}
//! ```
//!
//! Both fall out of the general encoder for a zero-argument message; the
//! constants exist because they are part of the compatibility contract.

use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// The byte that separates the frame sections.
pub const SEPARATOR: u8 = 0x7C;

/// Size of the leading total-length word.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// No structurally valid frame is shorter than the length word, a separator,
/// and one command byte.
pub const MIN_FRAME_SIZE: usize = LENGTH_PREFIX_LEN + 2;

/// Upper bound on a single frame (16 MiB). Frames claiming more are rejected
/// before any allocation happens.
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// The closed set of wire commands.
///
/// The first thirteen are requests; `Ack`, `Null`, and `Err` only ever
/// appear in responses. Read-family requests are echoed back as the response
/// command carrying the result payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Read,
    ReadExpiration,
    Insert,
    Update,
    Upsert,
    Delete,
    Present,
    Expire,
    Truncate,
    Count,
    KeysBy,
    DeleteBy,
    ExpireBy,
    Ack,
    Null,
    Err,
}

impl Command {
    /// The ASCII token this command is spelled as on the wire.
    pub const fn token(&self) -> &'static str {
        match self {
            Command::Read => "READ",
            Command::ReadExpiration => "READEXPIRATION",
            Command::Insert => "INSERT",
            Command::Update => "UPDATE",
            Command::Upsert => "UPSERT",
            Command::Delete => "DELETE",
            Command::Present => "PRESENT",
            Command::Expire => "EXPIRE",
            Command::Truncate => "TRUNCATE",
            Command::Count => "COUNT",
            Command::KeysBy => "KEYSBY",
            Command::DeleteBy => "DELETEBY",
            Command::ExpireBy => "EXPIREBY",
            Command::Ack => "ACK",
            Command::Null => "NULL",
            Command::Err => "ERR",
        }
    }

    /// Looks a command up by its wire token.
    pub fn from_token(token: &[u8]) -> Option<Command> {
        match token {
            b"READ" => Some(Command::Read),
            b"READEXPIRATION" => Some(Command::ReadExpiration),
            b"INSERT" => Some(Command::Insert),
            b"UPDATE" => Some(Command::Update),
            b"UPSERT" => Some(Command::Upsert),
            b"DELETE" => Some(Command::Delete),
            b"PRESENT" => Some(Command::Present),
            b"EXPIRE" => Some(Command::Expire),
            b"TRUNCATE" => Some(Command::Truncate),
            b"COUNT" => Some(Command::Count),
            b"KEYSBY" => Some(Command::KeysBy),
            b"DELETEBY" => Some(Command::DeleteBy),
            b"EXPIREBY" => Some(Command::ExpireBy),
            b"ACK" => Some(Command::Ack),
            b"NULL" => Some(Command::Null),
            b"ERR" => Some(Command::Err),
            _ => None,
        }
    }

    /// True for tokens a client may send; `ACK`/`NULL`/`ERR` are responses.
    pub const fn is_request(&self) -> bool {
        !matches!(self, Command::Ack | Command::Null | Command::Err)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Encodes one frame: the command followed by its arguments, with the total
/// length prepended.
pub fn encode_message(command: Command, args: &[&str]) -> Vec<u8> {
    let token = command.token().as_bytes();
    let body_len: usize = 1 + token.len() + args.iter().map(|arg| 6 + arg.len()).sum::<usize>();

    let mut frame = Vec::with_capacity(LENGTH_PREFIX_LEN + body_len);
    frame.extend_from_slice(&((LENGTH_PREFIX_LEN + body_len) as u32).to_le_bytes());
    frame.push(SEPARATOR);
    frame.extend_from_slice(token);

    for arg in args {
        frame.push(SEPARATOR);
        frame.extend_from_slice(&(arg.len() as u32).to_le_bytes());
        frame.push(SEPARATOR);
        frame.extend_from_slice(arg.as_bytes());
    }

    frame
}

/// The canonical boolean-true response.
pub fn ack_frame() -> Vec<u8> {
    encode_message(Command::Ack, &[])
}

/// The canonical boolean-false / absent response.
pub fn null_frame() -> Vec<u8> {
    encode_message(Command::Null, &[])
}

/// An `ERR` response carrying the server's diagnostic message.
pub fn err_frame(message: &str) -> Vec<u8> {
    encode_message(Command::Err, &[message])
}

/// Maps a boolean result onto the canonical `ACK`/`NULL` frames.
pub fn ack_or_null(flag: bool) -> Vec<u8> {
    if flag {
        ack_frame()
    } else {
        null_frame()
    }
}

/// Renders a timestamp as it travels on the wire: ASCII decimal unix
/// milliseconds.
pub fn encode_timestamp(at: SystemTime) -> String {
    unix_millis(at).to_string()
}

/// Milliseconds since the unix epoch, negative for pre-epoch instants.
pub fn unix_millis(at: SystemTime) -> i64 {
    match at.duration_since(UNIX_EPOCH) {
        Ok(since) => since.as_millis() as i64,
        Err(before) => -(before.duration().as_millis() as i64),
    }
}

/// The inverse of [`unix_millis`].
pub fn from_unix_millis(ms: i64) -> SystemTime {
    if ms >= 0 {
        UNIX_EPOCH + Duration::from_millis(ms as u64)
    } else {
        UNIX_EPOCH - Duration::from_millis(ms.unsigned_abs())
    }
}
