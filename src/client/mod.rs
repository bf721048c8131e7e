//! TrellisKV Client
//!
//! A thin, stateless client for the wire protocol. Every call opens one TCP
//! connection, writes one request frame, reads one response frame, and
//! closes, mirroring the server's one-shot connection model. There is no
//! pooling and no shared connection state, so a `Client` is freely cloneable
//! and usable from any number of tasks.
//!
//! ## Result Mapping
//!
//! - `NULL` responses surface as `None` or `false`, never as errors
//! - `ERR` responses surface as [`ClientError::Server`] with the server's
//!   diagnostic text
//! - any other unexpected token is a [`ClientError::UnexpectedResponse`]
//! - transport failures and the 10-second deadline surface as
//!   [`ClientError::Io`] and [`ClientError::Timeout`]
//!
//! ## Example
//!
//! ```no_run
//! use trelliskv::client::Client;
//!
//! # async fn run() -> Result<(), trelliskv::client::ClientError> {
//! let client = Client::new("localhost:8888");
//!
//! client.insert("region:1:manager", "alice").await?;
//! let value = client.read("region:1:manager").await?;
//! assert_eq!(value.as_deref(), Some("alice"));
//! # Ok(())
//! # }
//! ```

use std::time::{Duration, SystemTime};

use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::protocol::parser::{self, WireError};
use crate::protocol::types::{self, Command, LENGTH_PREFIX_LEN, MAX_FRAME_SIZE, MIN_FRAME_SIZE};

/// How long one request may take, connect included.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors a client call can produce.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The connection failed or died mid-exchange.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The response frame could not be decoded.
    #[error(transparent)]
    Wire(#[from] WireError),

    /// The server answered with an `ERR` frame; this carries its message.
    #[error("server error: {0}")]
    Server(String),

    /// The server answered with a token that does not belong to the request.
    #[error("unexpected {response} response for a {request} request")]
    UnexpectedResponse { request: Command, response: Command },

    /// The request deadline elapsed.
    #[error("request timed out")]
    Timeout,
}

/// A stateless TrellisKV client: one connection per call.
#[derive(Debug, Clone)]
pub struct Client {
    addr: String,
}

impl Client {
    /// Creates a client that talks to the server at `addr`.
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    /// Reads the value under `key`. `None` when the key is absent or expired.
    pub async fn read(&self, key: &str) -> Result<Option<String>, ClientError> {
        let request = types::encode_message(Command::Read, &[key]);
        let (response, frame) = self.round_trip(request).await?;

        match response {
            Command::Read => Ok(Some(parser::one_argument(Command::Read, &frame)?)),
            Command::Null => Ok(None),
            other => Err(self.unexpected(Command::Read, other, &frame)),
        }
    }

    /// Reads the expiration of `key`. `None` when the key is absent, expired,
    /// or has no expiration attached.
    pub async fn read_expiration(&self, key: &str) -> Result<Option<SystemTime>, ClientError> {
        let request = types::encode_message(Command::ReadExpiration, &[key]);
        let (response, frame) = self.round_trip(request).await?;

        match response {
            Command::ReadExpiration => {
                let timestamp = parser::one_argument(Command::ReadExpiration, &frame)?;
                Ok(Some(parser::decode_timestamp(&timestamp)?))
            }
            Command::Null => Ok(None),
            other => Err(self.unexpected(Command::ReadExpiration, other, &frame)),
        }
    }

    /// True when the key is present and live.
    pub async fn present(&self, key: &str) -> Result<bool, ClientError> {
        let request = types::encode_message(Command::Present, &[key]);
        self.boolean(Command::Present, request).await
    }

    /// Inserts `value` under `key`. `false` means the key already existed and
    /// kept its old value.
    pub async fn insert(&self, key: &str, value: &str) -> Result<bool, ClientError> {
        let request = types::encode_message(Command::Insert, &[key, value]);
        self.boolean(Command::Insert, request).await
    }

    /// Replaces the value of an existing key. `false` means there was nothing
    /// to update.
    pub async fn update(&self, key: &str, value: &str) -> Result<bool, ClientError> {
        let request = types::encode_message(Command::Update, &[key, value]);
        self.boolean(Command::Update, request).await
    }

    /// Inserts or replaces the value under `key`.
    pub async fn upsert(&self, key: &str, value: &str) -> Result<(), ClientError> {
        let request = types::encode_message(Command::Upsert, &[key, value]);
        self.boolean(Command::Upsert, request).await.map(|_| ())
    }

    /// Deletes `key`. `false` means it was not present.
    pub async fn delete(&self, key: &str) -> Result<bool, ClientError> {
        let request = types::encode_message(Command::Delete, &[key]);
        self.boolean(Command::Delete, request).await
    }

    /// Attaches an absolute expiration to `key`. `false` means the key was
    /// not present.
    pub async fn expire(&self, key: &str, at: SystemTime) -> Result<bool, ClientError> {
        let request =
            types::encode_message(Command::Expire, &[key, &types::encode_timestamp(at)]);
        self.boolean(Command::Expire, request).await
    }

    /// Deletes every key in the store.
    pub async fn truncate(&self) -> Result<(), ClientError> {
        let request = types::encode_message(Command::Truncate, &[]);
        self.boolean(Command::Truncate, request).await.map(|_| ())
    }

    /// The raw number of keys in the store, expired stragglers included.
    pub async fn count(&self) -> Result<u64, ClientError> {
        let request = types::encode_message(Command::Count, &[]);
        self.counted(Command::Count, request).await
    }

    /// Every live key matching `prefix` at a component boundary. The empty
    /// prefix lists all live keys.
    pub async fn keys_by(&self, prefix: &str) -> Result<Vec<String>, ClientError> {
        let request = types::encode_message(Command::KeysBy, &[prefix]);
        let (response, frame) = self.round_trip(request).await?;

        match response {
            Command::KeysBy => Ok(parser::arguments(Command::KeysBy, &frame)?),
            other => Err(self.unexpected(Command::KeysBy, other, &frame)),
        }
    }

    /// Deletes every live key matching `prefix`; returns how many went away.
    pub async fn delete_by(&self, prefix: &str) -> Result<u64, ClientError> {
        let request = types::encode_message(Command::DeleteBy, &[prefix]);
        self.counted(Command::DeleteBy, request).await
    }

    /// Expires every live key matching `prefix`; returns how many were
    /// targeted.
    pub async fn expire_by(&self, prefix: &str, at: SystemTime) -> Result<u64, ClientError> {
        let request =
            types::encode_message(Command::ExpireBy, &[prefix, &types::encode_timestamp(at)]);
        self.counted(Command::ExpireBy, request).await
    }

    // Sends a request whose answer is the ACK/NULL boolean pair.
    async fn boolean(&self, request: Command, frame: Vec<u8>) -> Result<bool, ClientError> {
        let (response, frame) = self.round_trip(frame).await?;
        match response {
            Command::Ack => Ok(true),
            Command::Null => Ok(false),
            other => Err(self.unexpected(request, other, &frame)),
        }
    }

    // Sends a request whose answer echoes the command with an ASCII count.
    async fn counted(&self, request: Command, frame: Vec<u8>) -> Result<u64, ClientError> {
        let (response, frame) = self.round_trip(frame).await?;
        if response != request {
            return Err(self.unexpected(request, response, &frame));
        }

        let count = parser::one_argument(request, &frame)?;
        Ok(parser::decode_count(&count)?)
    }

    async fn round_trip(&self, request: Vec<u8>) -> Result<(Command, Vec<u8>), ClientError> {
        tokio::time::timeout(REQUEST_TIMEOUT, self.exchange(request))
            .await
            .map_err(|_| ClientError::Timeout)?
    }

    async fn exchange(&self, request: Vec<u8>) -> Result<(Command, Vec<u8>), ClientError> {
        let mut stream = TcpStream::connect(&self.addr).await?;
        stream.write_all(&request).await?;

        let mut length = [0u8; LENGTH_PREFIX_LEN];
        stream.read_exact(&mut length).await?;

        let total = u32::from_le_bytes(length) as usize;
        if total < MIN_FRAME_SIZE {
            return Err(ClientError::Wire(WireError::Truncated(total)));
        }
        if total > MAX_FRAME_SIZE {
            return Err(ClientError::Wire(WireError::FrameTooLarge(total)));
        }

        let mut frame = vec![0u8; total];
        frame[..LENGTH_PREFIX_LEN].copy_from_slice(&length);
        stream.read_exact(&mut frame[LENGTH_PREFIX_LEN..]).await?;

        let command = parser::command(&frame)?;
        Ok((command, frame))
    }

    // ERR frames become Server errors; anything else off-script is a
    // protocol violation.
    fn unexpected(&self, request: Command, response: Command, frame: &[u8]) -> ClientError {
        if response == Command::Err {
            return match parser::one_argument(Command::Err, frame) {
                Ok(message) => ClientError::Server(message),
                Err(error) => ClientError::Wire(error),
            };
        }

        ClientError::UnexpectedResponse { request, response }
    }
}
