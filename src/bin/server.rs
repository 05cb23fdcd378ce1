//! luakv Server Binary
//!
//! Serves an in-memory store over RESP.

use clap::Parser;
use luakv::network::Server;
use luakv::MemoryStore;
use tracing_subscriber::{fmt, EnvFilter};

/// luakv in-memory server
#[derive(Parser, Debug)]
#[command(name = "luakv-server")]
#[command(about = "In-memory Redis-compatible store for luakv")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:6379")]
    listen: String,

    /// Require AUTH with this password
    #[arg(long, env = "REDIS_PSW")]
    password: Option<String>,

    /// ACL user name expected with the password
    #[arg(long, env = "REDIS_USERNAME", requires = "password")]
    username: Option<String>,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,luakv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("luakv server v{}", luakv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let store = match (args.username, args.password) {
        (Some(user), Some(password)) => MemoryStore::with_user(user, password),
        (None, Some(password)) => MemoryStore::with_password(password),
        _ => MemoryStore::new(),
    };

    let server = match Server::bind(&args.listen, store) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
