//! Network Module
//!
//! Client connections to the store and a small RESP server.
//!
//! ## Architecture
//! - `Transport`: one request/response channel (redis-rs connection or
//!   in-process session)
//! - `Connector`: opens new transports on demand
//! - `ConnectionPool`: r2d2 pool capped at `max_connections`, scoped
//!   checkout per operation
//! - `Server`: single acceptor thread, one worker thread per session,
//!   serving a `MemoryStore`

mod connection;
mod pool;
mod server;
mod session;

pub use connection::{Connection, TcpConnector};
pub use pool::ConnectionPool;
pub use server::{Server, ServerHandle};
pub use session::Session;

use crate::error::Result;
use crate::protocol::{Command, Reply};

/// A blocking request/response channel to a store
pub trait Transport: Send {
    /// Send one command and wait for its reply.
    ///
    /// Error replies come back as `Ok(Reply::Error(..))`; `Err` is reserved
    /// for failures of the channel itself.
    fn request(&mut self, command: &Command) -> Result<Reply>;

    /// True once the channel can no longer be trusted (I/O or framing error)
    fn is_broken(&self) -> bool {
        false
    }
}

/// Opens transports for a pool
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Box<dyn Transport>>;

    /// Human readable target for log lines
    fn describe(&self) -> String;
}
