//! Connection Handler
//!
//! Serves one accepted TCP connection. TrellisKV connections are one-shot:
//! each carries exactly one request frame and receives exactly one response
//! frame, then the connection closes. There is no session and no pipelining;
//! every command is a fresh connection.
//!
//! ## Per-Connection Protocol
//!
//! ```text
//! 1. Read the 4-byte total length
//!        │
//!        ▼
//! 2. Read the rest of the frame
//!        │
//!        ▼
//! 3. Decode + dispatch (commands module)
//!        │
//!        ▼
//! 4. Write the single response
//!        │
//!        ▼
//! 5. Close
//! ```
//!
//! The whole cycle runs under one deadline. A connection that blows the
//! deadline is dropped without a response, which the client observes as a
//! network error. Frames with an absurd length field are answered with an
//! `ERR` frame before any allocation happens.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::commands::CommandHandler;
use crate::protocol::types::{self, LENGTH_PREFIX_LEN, MAX_FRAME_SIZE, MIN_FRAME_SIZE};

/// How long one request/response cycle may take end to end.
pub const CONNECTION_DEADLINE: Duration = Duration::from_secs(10);

/// Statistics for connection handling, shared across all connections.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total number of connections accepted
    pub connections_accepted: AtomicU64,
    /// Total requests answered (including `ERR` answers)
    pub requests_served: AtomicU64,
    /// Total bytes read off the wire
    pub bytes_read: AtomicU64,
    /// Total bytes written to the wire
    pub bytes_written: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn request_served(&self) {
        self.requests_served.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_bytes_read(&self, count: usize) {
        self.bytes_read.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn add_bytes_written(&self, count: usize) {
        self.bytes_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }
}

/// Handles one accepted connection to completion.
///
/// Runs the one-shot request cycle under [`CONNECTION_DEADLINE`] and logs
/// how the connection ended. Never panics and never leaves the caller an
/// error to handle; a dead client is routine, not exceptional.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    handler: CommandHandler,
    stats: Arc<ConnectionStats>,
) {
    stats.connection_opened();

    match tokio::time::timeout(CONNECTION_DEADLINE, serve_request(stream, &handler, &stats)).await
    {
        Ok(Ok(())) => debug!(client = %addr, "request served"),
        Ok(Err(error)) => debug!(client = %addr, error = %error, "connection ended with error"),
        Err(_) => warn!(client = %addr, "connection deadline exceeded"),
    }
}

/// Reads one frame, dispatches it, and writes the response.
async fn serve_request(
    mut stream: TcpStream,
    handler: &CommandHandler,
    stats: &ConnectionStats,
) -> std::io::Result<()> {
    let mut length = [0u8; LENGTH_PREFIX_LEN];
    stream.read_exact(&mut length).await?;

    let total = u32::from_le_bytes(length) as usize;
    if !(MIN_FRAME_SIZE..=MAX_FRAME_SIZE).contains(&total) {
        let response = types::err_frame(&format!("invalid frame length {total}"));
        stream.write_all(&response).await?;
        stats.add_bytes_written(response.len());
        return Ok(());
    }

    let mut frame = BytesMut::with_capacity(total);
    frame.extend_from_slice(&length);
    frame.resize(total, 0);
    stream.read_exact(&mut frame[LENGTH_PREFIX_LEN..]).await?;
    stats.add_bytes_read(total);

    let response = handler.execute(&frame);
    stats.request_served();

    stream.write_all(&response).await?;
    stats.add_bytes_written(response.len());

    Ok(())
}
