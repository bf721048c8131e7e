//! Command Handler
//!
//! The bridge between the wire protocol and the storage engine: one decoded
//! request frame in, one encoded response frame out.
//!
//! ## Architecture
//!
//! ```text
//! request frame
//!       │
//!       ▼
//! ┌─────────────────┐
//! │ CommandHandler  │
//! │                 │
//! │  - decode token │
//! │  - decode args  │
//! │  - dispatch     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │      Store      │
//! └────────┬────────┘
//!          │
//!          ▼
//!   response frame
//! ```
//!
//! Decoding failures never propagate: every [`WireError`] is rendered into an
//! `ERR` frame carrying its message, because the client is owed exactly one
//! response per request. Absent keys and collisions are not failures; they
//! come back as the canonical `NULL` frame.

use crate::protocol::parser::{self, WireError};
use crate::protocol::types::{self, Command};
use crate::storage::Store;

/// Executes decoded wire commands against a shared [`Store`].
#[derive(Debug, Clone)]
pub struct CommandHandler {
    store: Store,
}

impl CommandHandler {
    /// Creates a handler over the given store.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Decodes `frame`, runs the matching engine operation, and encodes the
    /// response. Always produces a frame to send back.
    pub fn execute(&self, frame: &[u8]) -> Vec<u8> {
        let command = match parser::command(frame) {
            Ok(command) => command,
            Err(error) => return types::err_frame(&error.to_string()),
        };

        match self.dispatch(command, frame) {
            Ok(response) => response,
            Err(error) => types::err_frame(&error.to_string()),
        }
    }

    fn dispatch(&self, command: Command, frame: &[u8]) -> Result<Vec<u8>, WireError> {
        let response = match command {
            Command::Read => {
                let key = parser::one_argument(command, frame)?;
                match self.store.read(&key) {
                    Some(entry) => types::encode_message(Command::Read, &[&entry.value]),
                    None => types::null_frame(),
                }
            }
            Command::ReadExpiration => {
                let key = parser::one_argument(command, frame)?;
                match self.store.read_expiration(&key) {
                    Some(at) => types::encode_message(
                        Command::ReadExpiration,
                        &[&types::encode_timestamp(at)],
                    ),
                    None => types::null_frame(),
                }
            }
            Command::Insert => {
                let (key, value) = parser::two_arguments(command, frame)?;
                let (_, inserted) = self.store.insert(&key, &value);
                types::ack_or_null(inserted)
            }
            Command::Update => {
                let (key, value) = parser::two_arguments(command, frame)?;
                types::ack_or_null(self.store.update(&key, &value))
            }
            Command::Upsert => {
                let (key, value) = parser::two_arguments(command, frame)?;
                self.store.upsert(&key, &value);
                types::ack_frame()
            }
            Command::Delete => {
                let key = parser::one_argument(command, frame)?;
                types::ack_or_null(self.store.delete(&key))
            }
            Command::Present => {
                let key = parser::one_argument(command, frame)?;
                types::ack_or_null(self.store.present(&key))
            }
            Command::Expire => {
                let (key, timestamp) = parser::two_arguments(command, frame)?;
                let at = parser::decode_timestamp(&timestamp)?;
                types::ack_or_null(self.store.expire(&key, at))
            }
            Command::Truncate => {
                parser::no_arguments(command, frame)?;
                self.store.truncate();
                types::ack_frame()
            }
            Command::Count => {
                parser::no_arguments(command, frame)?;
                types::encode_message(Command::Count, &[&self.store.count().to_string()])
            }
            Command::KeysBy => {
                let prefix = parser::one_argument(command, frame)?;
                let keys = self.store.keys_by(&prefix);
                let args: Vec<&str> = keys.iter().map(String::as_str).collect();
                types::encode_message(Command::KeysBy, &args)
            }
            Command::DeleteBy => {
                let prefix = parser::one_argument(command, frame)?;
                let removed = self.store.delete_by(&prefix);
                types::encode_message(Command::DeleteBy, &[&removed.to_string()])
            }
            Command::ExpireBy => {
                let (prefix, timestamp) = parser::two_arguments(command, frame)?;
                let at = parser::decode_timestamp(&timestamp)?;
                let expired = self.store.expire_by(&prefix, at);
                types::encode_message(Command::ExpireBy, &[&expired.to_string()])
            }
            Command::Ack | Command::Null | Command::Err => {
                types::err_frame(&format!("{command} is a response, not a request"))
            }
        };

        Ok(response)
    }
}
