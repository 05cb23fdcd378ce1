//! Client Module
//!
//! The typed public surface. Every keyed operation marshals its value into
//! string arguments, runs one server-side procedure, and decodes the reply
//! through the type converter.
//!
//! ## Request Path
//! ```text
//! Client::set(key, Data, &SetOptions)
//!     │  scalar ──► set_not_array_helper
//!     │  list/set ──► rpush_helper
//!     ▼
//! ConnectionPool::with_transport ──► ProcedureRegistry::invoke ──► store
//!     │
//!     ▼
//! Reply ──► Data (strings) ──► convert(spec) ──► Data (typed)
//! ```
//!
//! Empty keys are no-ops: each operation returns its empty result without
//! contacting the store.

mod helpers;
mod keys;
mod mass;
mod options;
mod ttl;

pub use options::{MassDeleteOptions, MassDeleteOutcome, SetOptions};

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::network::{ConnectionPool, Connector, TcpConnector};
use crate::procedure::{Procedure, ProcedureRegistry};
use crate::protocol::{Command, Reply};

/// Typed client for a Redis-compatible store
pub struct Client {
    config: Config,
    pool: ConnectionPool,
    procedures: ProcedureRegistry,
}

impl Client {
    /// Connect over TCP and verify the store answers
    pub fn open(config: Config) -> Result<Self> {
        let connector = TcpConnector::new(config.clone());
        let client = Self::with_connector(config, connector)?;
        client.pool.execute(&Command::new("PING"))?;

        tracing::info!("Connected to {}", client.pool.describe());
        Ok(client)
    }

    /// Build a client over any transport, e.g. `MemoryStore::connector`
    pub fn with_connector<C>(config: Config, connector: C) -> Result<Self>
    where
        C: Connector + 'static,
    {
        config.validate()?;
        let pool = ConnectionPool::new(
            Arc::new(connector),
            config.max_connections,
            config.socket_timeout(),
            config.retry_on_timeout,
        );
        Ok(Self {
            config,
            pool,
            procedures: ProcedureRegistry::new(),
        })
    }

    /// Close every pooled connection
    pub fn close(self) {
        tracing::debug!("Closing client for {}", self.pool.describe());
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Liveness check; any failure reads as `false`
    pub fn ping(&self) -> bool {
        match self.pool.execute(&Command::new("PING")) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!("Ping to {} failed: {}", self.pool.describe(), e);
                false
            }
        }
    }

    /// Forget every loaded procedure, on the store and in this client
    pub fn flush_procedures(&self) -> Result<()> {
        self.pool.execute(&Command::new("SCRIPT").arg("FLUSH"))?;
        self.procedures.forget_all();
        Ok(())
    }

    /// Number of procedure handles this client has cached
    pub fn registered_procedures(&self) -> usize {
        self.procedures.len()
    }

    /// Store `INFO`, parsed into `field -> value`
    pub fn info(&self, section: Option<&str>) -> Result<HashMap<String, String>> {
        let mut command = Command::new("INFO");
        if let Some(section) = section {
            command = command.arg(section);
        }
        let text = self.pool.execute(&command)?.into_string()?;
        Ok(helpers::parse_info(&text))
    }

    /// Bytes the store attributes to a key, `None` when absent
    pub fn key_memory_usage(&self, key: &str) -> Result<Option<u64>> {
        if key.is_empty() {
            return Ok(None);
        }
        let command = Command::new("MEMORY").arg("USAGE").arg(key);
        let usage = self
            .pool
            .execute(&command)
            .and_then(Reply::into_opt_integer)
            .map_err(|e| e.context("key_memory_usage", key))?;
        Ok(usage.map(|n| n.max(0) as u64))
    }

    fn invoke<K, A>(&self, procedure: Procedure, keys: &[K], args: &[A]) -> Result<Reply>
    where
        K: AsRef<[u8]>,
        A: AsRef<[u8]>,
    {
        self.pool.with_transport(procedure.is_read_only(), |conn| {
            self.procedures.invoke(conn, procedure, keys, args)
        })
    }
}
