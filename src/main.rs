//! TrellisKV Server Binary
//!
//! Starts the TCP server on `localhost:8888` (overridable with `--host` and
//! `--port`), serves until SIGINT or SIGTERM arrives, then stops the
//! listener and exits. Exit code 0 on graceful shutdown; non-zero when the
//! port cannot be bound.

use anyhow::Context;
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use trelliskv::server::Server;
use trelliskv::{DEFAULT_HOST, DEFAULT_PORT};

/// Server configuration
struct Config {
    /// Host to bind to
    host: String,
    /// Port to listen on
    port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => {
                    if i + 1 < args.len() {
                        config.host = args[i + 1].clone();
                        i += 2;
                    } else {
                        eprintln!("Error: --host requires a value");
                        std::process::exit(1);
                    }
                }
                "--port" | "-p" => {
                    if i + 1 < args.len() {
                        config.port = args[i + 1].parse().unwrap_or_else(|_| {
                            eprintln!("Error: invalid port number");
                            std::process::exit(1);
                        });
                        i += 2;
                    } else {
                        eprintln!("Error: --port requires a value");
                        std::process::exit(1);
                    }
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                "--version" | "-v" => {
                    println!("TrellisKV version {}", trelliskv::VERSION);
                    std::process::exit(0);
                }
                _ => {
                    eprintln!("Unknown argument: {}", args[i]);
                    print_help();
                    std::process::exit(1);
                }
            }
        }

        config
    }

    /// Returns the bind address as a string
    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn print_help() {
    println!(
        r#"
TrellisKV - An In-Memory Key-Value Store with Hierarchical Prefix Queries

USAGE:
    trelliskv [OPTIONS]

OPTIONS:
    -h, --host <HOST>    Host to bind to (default: localhost)
    -p, --port <PORT>    Port to listen on (default: 8888)
    -v, --version        Print version information
        --help           Print this help message

EXAMPLES:
    trelliskv                      # Start on localhost:8888
    trelliskv --port 9000          # Start on port 9000
    trelliskv --host 0.0.0.0       # Listen on all interfaces

The server answers one command per connection and shuts down cleanly on
SIGINT or SIGTERM.
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    println!(
        "TrellisKV v{} listening on {}. Use Ctrl+C to shut down.",
        trelliskv::VERSION,
        config.bind_address()
    );

    let mut server = Server::new(config.bind_address());
    server
        .start()
        .await
        .with_context(|| format!("could not start server on {}", config.bind_address()))?;

    wait_for_shutdown().await;

    server.stop().await;
    info!("shutdown complete");
    Ok(())
}

/// Resolves when SIGINT or SIGTERM arrives.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");

        tokio::select! {
            _ = signal::ctrl_c() => info!("received SIGINT, shutting down"),
            _ = terminate.recv() => info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        let _ = signal::ctrl_c().await;
        info!("received Ctrl+C, shutting down");
    }
}
