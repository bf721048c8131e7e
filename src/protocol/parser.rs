//! Wire Frame Decoding
//!
//! The decoding half of the protocol: extracting the command token from a
//! frame and walking its argument list with a strict cursor.
//!
//! ## Cursor Discipline
//!
//! The argument walk starts right after the command token. Each argument is
//! introduced by a separator, four little-endian length bytes, and another
//! separator; the declared length must be fully present, and after the last
//! argument the cursor must land exactly on the end of the frame. Anything
//! else (a dangling separator, surplus bytes, a truncated argument) is a
//! [`WireError`] and the whole frame is rejected. A frame is parsed at most
//! twice (once for the token, once for the arguments), so decoding stays
//! linear in the frame size.
//!
//! Decoding never panics on hostile input; every malformed shape maps to an
//! error variant the server can echo back inside an `ERR` frame.

use std::time::SystemTime;

use thiserror::Error;

use super::types::{self, Command, LENGTH_PREFIX_LEN, MIN_FRAME_SIZE, SEPARATOR};

/// Errors produced while decoding a frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// The frame ends before the mandatory header.
    #[error("frame of {0} bytes is too short to decode")]
    Truncated(usize),

    /// The frame claims a length beyond the protocol limit.
    #[error("frame length {0} exceeds the protocol limit")]
    FrameTooLarge(usize),

    /// The embedded total length disagrees with the byte count on hand.
    #[error("frame length field says {declared} bytes but frame has {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    /// The command token is not one of the known commands.
    #[error("{0:?} is not a valid command")]
    UnknownCommand(String),

    /// The argument section does not follow the separator/length layout.
    #[error("malformed message, could not decode arguments")]
    Malformed,

    /// The command came with the wrong number of arguments.
    #[error("expected {expected} argument(s) for a {command} command but found {found}")]
    ArgumentCount {
        command: Command,
        expected: usize,
        found: usize,
    },

    /// An argument is not valid UTF-8.
    #[error("argument is not valid UTF-8")]
    InvalidUtf8,

    /// A timestamp argument is not a decimal unix-millisecond value.
    #[error("expected a unix millisecond timestamp but found {0:?}")]
    InvalidTimestamp(String),

    /// A count payload is not a decimal number.
    #[error("expected a decimal count but found {0:?}")]
    InvalidCount(String),
}

/// Extracts and validates the command token of a frame.
pub fn command(frame: &[u8]) -> Result<Command, WireError> {
    if frame.len() < MIN_FRAME_SIZE {
        return Err(WireError::Truncated(frame.len()));
    }

    let declared = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]) as usize;
    if declared != frame.len() {
        return Err(WireError::LengthMismatch {
            declared,
            actual: frame.len(),
        });
    }

    if frame[LENGTH_PREFIX_LEN] != SEPARATOR {
        return Err(WireError::Malformed);
    }

    let token_start = LENGTH_PREFIX_LEN + 1;
    let token_end = frame[token_start..]
        .iter()
        .position(|&byte| byte == SEPARATOR)
        .map_or(frame.len(), |pos| token_start + pos);
    let token = &frame[token_start..token_end];

    Command::from_token(token)
        .ok_or_else(|| WireError::UnknownCommand(String::from_utf8_lossy(token).into_owned()))
}

/// Walks the argument section of a frame whose command is already known.
///
/// Returns the decoded arguments in order. The cursor must consume the frame
/// exactly; leftovers of any kind are malformed.
pub fn arguments(command: Command, frame: &[u8]) -> Result<Vec<String>, WireError> {
    let mut args = Vec::new();
    let mut cursor = LENGTH_PREFIX_LEN + 1 + command.token().len();

    while cursor < frame.len() && frame[cursor] == SEPARATOR {
        // Separator, four length bytes, separator: six bytes of preamble.
        if cursor + 6 > frame.len() {
            return Err(WireError::Malformed);
        }

        let size = u32::from_le_bytes([
            frame[cursor + 1],
            frame[cursor + 2],
            frame[cursor + 3],
            frame[cursor + 4],
        ]) as usize;

        if frame[cursor + 5] != SEPARATOR {
            return Err(WireError::Malformed);
        }

        let start = cursor + 6;
        let end = start.checked_add(size).ok_or(WireError::Malformed)?;
        if end > frame.len() {
            return Err(WireError::Malformed);
        }

        let arg = std::str::from_utf8(&frame[start..end])
            .map_err(|_| WireError::InvalidUtf8)?
            .to_owned();
        args.push(arg);
        cursor = end;
    }

    if cursor != frame.len() {
        return Err(WireError::Malformed);
    }

    Ok(args)
}

/// Decodes a frame that must carry exactly one argument (a key, a prefix, or
/// an error message).
pub fn one_argument(command: Command, frame: &[u8]) -> Result<String, WireError> {
    let mut args = arguments(command, frame)?;
    if args.len() != 1 {
        return Err(WireError::ArgumentCount {
            command,
            expected: 1,
            found: args.len(),
        });
    }
    Ok(args.remove(0))
}

/// Decodes a frame that must carry exactly two arguments (key/value or
/// key/timestamp pairs).
pub fn two_arguments(command: Command, frame: &[u8]) -> Result<(String, String), WireError> {
    let mut args = arguments(command, frame)?;
    if args.len() != 2 {
        return Err(WireError::ArgumentCount {
            command,
            expected: 2,
            found: args.len(),
        });
    }
    let second = args.remove(1);
    let first = args.remove(0);
    Ok((first, second))
}

/// Decodes a frame that must carry no arguments at all.
pub fn no_arguments(command: Command, frame: &[u8]) -> Result<(), WireError> {
    let args = arguments(command, frame)?;
    if !args.is_empty() {
        return Err(WireError::ArgumentCount {
            command,
            expected: 0,
            found: args.len(),
        });
    }
    Ok(())
}

/// Parses a wire timestamp argument into a [`SystemTime`].
pub fn decode_timestamp(text: &str) -> Result<SystemTime, WireError> {
    text.parse::<i64>()
        .map(types::from_unix_millis)
        .map_err(|_| WireError::InvalidTimestamp(text.to_owned()))
}

/// Parses an ASCII decimal count payload.
pub fn decode_count(text: &str) -> Result<u64, WireError> {
    text.parse::<u64>()
        .map_err(|_| WireError::InvalidCount(text.to_owned()))
}
