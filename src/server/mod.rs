//! TCP Server
//!
//! The listener lifecycle around the connection handler: bind, accept in a
//! background task, spawn one handler task per connection, and stop on
//! demand.
//!
//! ## Lifecycle
//!
//! [`Server::start`] binds the configured address and returns once the
//! accept loop is running; a bind failure is the only startup error.
//! [`Server::stop`] flips a shutdown signal, which wakes the accept loop out
//! of `accept()`, and waits for the loop task to exit. Connections already
//! in flight finish their one-shot cycle or hit their own deadline; no drain
//! is attempted. Once those connections are gone nothing schedules further
//! work: sweeps only ever start from mutations.
//!
//! ## Example
//!
//! ```no_run
//! use trelliskv::server::Server;
//!
//! # async fn run() -> Result<(), trelliskv::server::ServerError> {
//! let mut server = Server::new("localhost:8888");
//! server.start().await?;
//! // ... serve until told otherwise ...
//! server.stop().await;
//! # Ok(())
//! # }
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::commands::CommandHandler;
use crate::connection::{handle_connection, ConnectionStats};
use crate::storage::Store;

/// Errors surfaced by the server lifecycle.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listen address could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// `start` was called while the accept loop is already running.
    #[error("server is already running")]
    AlreadyRunning,
}

/// A TrellisKV server: one listener, one store, one task per connection.
pub struct Server {
    addr: String,
    store: Store,
    stats: Arc<ConnectionStats>,
    shutdown_tx: watch::Sender<bool>,
    accept_task: Option<JoinHandle<()>>,
    local_addr: Option<SocketAddr>,
}

impl Server {
    /// Creates a server that will listen on `addr` with a fresh, empty store.
    pub fn new(addr: impl Into<String>) -> Self {
        Self::with_store(addr, Store::new())
    }

    /// Creates a server over an existing store, for embedding the engine and
    /// the server in the same process.
    pub fn with_store(addr: impl Into<String>, store: Store) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            addr: addr.into(),
            store,
            stats: Arc::new(ConnectionStats::new()),
            shutdown_tx,
            accept_task: None,
            local_addr: None,
        }
    }

    /// Binds the listener and launches the accept loop.
    ///
    /// Returns once the loop is running; the server keeps accepting in the
    /// background until [`stop`](Server::stop) is called.
    pub async fn start(&mut self) -> Result<(), ServerError> {
        if self.accept_task.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        let listener = TcpListener::bind(&self.addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.addr.clone(),
                source,
            })?;
        self.local_addr = listener.local_addr().ok();

        // Reset the signal so a stopped server can be started again.
        self.shutdown_tx.send_replace(false);
        let shutdown_rx = self.shutdown_tx.subscribe();

        info!(addr = %self.addr, "server listening");

        let store = self.store.clone();
        let stats = Arc::clone(&self.stats);
        self.accept_task = Some(tokio::spawn(accept_loop(
            listener,
            store,
            stats,
            shutdown_rx,
        )));

        Ok(())
    }

    /// Signals shutdown and waits for the accept loop to exit.
    ///
    /// Idempotent; stopping a server that is not running does nothing.
    pub async fn stop(&mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.accept_task.take() {
            let _ = task.await;
            info!(addr = %self.addr, "server stopped");
        }
    }

    /// True while the accept loop is running.
    pub fn is_running(&self) -> bool {
        self.accept_task.is_some()
    }

    /// The bound address, once [`start`](Server::start) has succeeded. Useful
    /// when listening on port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    /// A handle to the store this server serves.
    pub fn store(&self) -> Store {
        self.store.clone()
    }

    /// The shared connection statistics.
    pub fn stats(&self) -> Arc<ConnectionStats> {
        Arc::clone(&self.stats)
    }
}

async fn accept_loop(
    listener: TcpListener,
    store: Store,
    stats: Arc<ConnectionStats>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    debug!("accept loop shutting down");
                    break;
                }
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    debug!(client = %addr, "accepted connection");
                    let handler = CommandHandler::new(store.clone());
                    tokio::spawn(handle_connection(stream, addr, handler, Arc::clone(&stats)));
                }
                Err(e) => error!(error = %e, "failed to accept connection"),
            }
        }
    }
}
