//! Connection Pool
//!
//! An `r2d2` pool of transports. Every operation checks one out for the
//! duration of a closure; the guard hands it back on every exit path and
//! r2d2 discards it if it reports itself broken. At most
//! `max_connections` transports are open at once; further callers wait up
//! to the checkout timeout.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use r2d2::{HandleError, ManageConnection, Pool};

use crate::error::{LuaKvError, Result};
use crate::protocol::{Command, Reply};

use super::{Connector, Transport};

/// Checkout wait when no socket timeout is configured
const DEFAULT_CHECKOUT_TIMEOUT: Duration = Duration::from_secs(30);

/// Commands that may be resent after a timeout without side effects
const READ_ONLY_COMMANDS: [&str; 12] = [
    "PING", "INFO", "GET", "MGET", "EXISTS", "TYPE", "TTL", "PTTL", "LRANGE", "LLEN", "MEMORY",
    "DBSIZE",
];

// =============================================================================
// r2d2 Glue
// =============================================================================

struct TransportManager {
    connector: Arc<dyn Connector>,
}

impl ManageConnection for TransportManager {
    type Connection = Box<dyn Transport>;
    type Error = LuaKvError;

    fn connect(&self) -> Result<Box<dyn Transport>> {
        tracing::debug!("Opening connection to {}", self.connector.describe());
        self.connector.connect()
    }

    fn is_valid(&self, conn: &mut Box<dyn Transport>) -> Result<()> {
        conn.request(&Command::new("PING"))?.into_result().map(|_| ())
    }

    fn has_broken(&self, conn: &mut Box<dyn Transport>) -> bool {
        let broken = conn.is_broken();
        if broken {
            tracing::debug!("Dropping broken connection to {}", self.connector.describe());
        }
        broken
    }
}

/// Keeps the most recent connect failure so checkout errors stay typed
#[derive(Debug, Default)]
struct LastError {
    error: Arc<Mutex<Option<LuaKvError>>>,
}

impl HandleError<LuaKvError> for LastError {
    fn handle_error(&self, error: LuaKvError) {
        tracing::warn!("Connection attempt failed: {}", error);
        *self.error.lock() = Some(error);
    }
}

// =============================================================================
// Pool
// =============================================================================

/// Pool of transports to one store
pub struct ConnectionPool {
    pool: Pool<TransportManager>,

    target: String,

    last_error: Arc<Mutex<Option<LuaKvError>>>,

    /// Retry a timed out idempotent closure once on another transport
    retry_on_timeout: bool,
}

impl ConnectionPool {
    /// Create an empty pool; transports are opened lazily
    pub fn new(
        connector: Arc<dyn Connector>,
        max_connections: usize,
        checkout_timeout: Option<Duration>,
        retry_on_timeout: bool,
    ) -> Self {
        let target = connector.describe();
        let handler = LastError::default();
        let last_error = Arc::clone(&handler.error);

        let pool = Pool::builder()
            .max_size(max_connections.clamp(1, u32::MAX as usize) as u32)
            .min_idle(Some(0))
            .connection_timeout(checkout_timeout.unwrap_or(DEFAULT_CHECKOUT_TIMEOUT))
            .test_on_check_out(false)
            .error_handler(Box::new(handler))
            .build_unchecked(TransportManager { connector });

        Self {
            pool,
            target,
            last_error,
            retry_on_timeout,
        }
    }

    /// Run `f` with a checked out transport.
    ///
    /// With `retry_on_timeout`, an `idempotent` closure that times out runs
    /// once more on another connection. Non-idempotent work is never resent.
    pub fn with_transport<T, F>(&self, idempotent: bool, mut f: F) -> Result<T>
    where
        F: FnMut(&mut dyn Transport) -> Result<T>,
    {
        match self.run_once(&mut f) {
            Err(e) if idempotent && self.retry_on_timeout && e.is_timeout() => {
                tracing::debug!("Retrying after timeout on {}: {}", self.target, e);
                self.run_once(&mut f)
            }
            other => other,
        }
    }

    /// Send one command, turning error replies into `Err`
    pub fn execute(&self, command: &Command) -> Result<Reply> {
        let idempotent = READ_ONLY_COMMANDS.contains(&command.name().as_str());
        self.with_transport(idempotent, |conn| conn.request(command)?.into_result())
    }

    fn run_once<T, F>(&self, f: &mut F) -> Result<T>
    where
        F: FnMut(&mut dyn Transport) -> Result<T>,
    {
        let mut conn = self.pool.get().map_err(|e| self.checkout_error(e))?;
        self.last_error.lock().take();
        f(&mut **conn)
    }

    fn checkout_error(&self, err: r2d2::Error) -> LuaKvError {
        match self.last_error.lock().take() {
            Some(cause) => cause,
            None => LuaKvError::Connection(format!(
                "no connection to {} available: {}",
                self.target, err
            )),
        }
    }

    /// Number of idle transports currently held
    pub fn idle_count(&self) -> usize {
        self.pool.state().idle_connections as usize
    }

    /// Number of transports currently open, idle or checked out
    pub fn open_count(&self) -> usize {
        self.pool.state().connections as usize
    }

    /// Target description of the underlying connector
    pub fn describe(&self) -> String {
        self.target.clone()
    }
}
