//! Client Connection
//!
//! A single blocking connection to the store, opened through the `redis`
//! crate. AUTH and SELECT happen while connecting. Error replies from the
//! store come back as `Reply::Error`; only link failures become `Err`.

use std::time::Duration;

use redis::{ConnectionAddr, ConnectionInfo, ConnectionLike, RedisConnectionInfo, RedisError, Value};

use crate::config::Config;
use crate::error::{LuaKvError, Result};
use crate::protocol::{Command, Reply};

use super::{Connector, Transport};

/// A connected, authenticated channel to the store
pub struct Connection {
    inner: redis::Connection,

    /// Peer address for logging
    peer_addr: String,

    /// Socket timeout reported in timeout errors (milliseconds)
    timeout_ms: u64,

    /// Set after an I/O failure; the stream may be out of sync
    broken: bool,
}

impl Connection {
    /// Connect, authenticate and select the configured database
    pub fn connect(config: &Config) -> Result<Self> {
        let peer_addr = config.address();
        let client = redis::Client::open(connection_info(config))
            .map_err(|e| LuaKvError::Config(format!("invalid address {}: {}", peer_addr, e)))?;

        let opened = match config.socket_timeout() {
            Some(timeout) => client.get_connection_with_timeout(timeout),
            None => client.get_connection(),
        };
        let inner = opened.map_err(|e| connect_error(&peer_addr, config.socket_timeout_ms, e))?;

        let mut conn = Self {
            inner,
            peer_addr,
            timeout_ms: config.socket_timeout_ms,
            broken: false,
        };
        conn.set_timeouts(config.socket_timeout_ms)?;

        tracing::debug!("Connected to {} (db {})", conn.peer_addr, config.db);
        Ok(conn)
    }

    /// Configure read and write timeouts (0 disables them)
    pub fn set_timeouts(&mut self, timeout_ms: u64) -> Result<()> {
        let timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        self.inner
            .set_read_timeout(timeout)
            .and_then(|_| self.inner.set_write_timeout(timeout))
            .map_err(|e| LuaKvError::Connection(format!("{}: {}", self.peer_addr, e)))?;

        self.timeout_ms = timeout_ms;
        Ok(())
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }

    fn classify(&mut self, err: RedisError) -> Result<Reply> {
        if let Some(code) = err.code() {
            return Ok(Reply::Error(server_message(code, &err)));
        }

        self.broken = true;
        tracing::warn!("Request to {} failed: {}", self.peer_addr, err);
        if err.is_timeout() {
            Err(LuaKvError::Timeout(self.timeout_ms))
        } else {
            Err(LuaKvError::Connection(format!(
                "request to {} failed: {}",
                self.peer_addr, err
            )))
        }
    }
}

impl Transport for Connection {
    fn request(&mut self, command: &Command) -> Result<Reply> {
        if self.broken {
            return Err(LuaKvError::Connection(format!(
                "connection to {} is no longer usable",
                self.peer_addr
            )));
        }

        let mut cmd = redis::Cmd::new();
        for part in command.parts() {
            cmd.arg(part.as_slice());
        }

        tracing::trace!("-> {} {}", self.peer_addr, command.name());
        match cmd.query::<Value>(&mut self.inner) {
            Ok(value) => Ok(reply_from_value(value)),
            Err(e) => self.classify(e),
        }
    }

    fn is_broken(&self) -> bool {
        self.broken || !self.inner.is_open()
    }
}

fn connection_info(config: &Config) -> ConnectionInfo {
    ConnectionInfo {
        addr: ConnectionAddr::Tcp(config.host.clone(), config.port),
        redis: RedisConnectionInfo {
            db: i64::from(config.db),
            username: config.username.clone(),
            password: config.password.clone(),
            ..Default::default()
        },
    }
}

fn connect_error(addr: &str, timeout_ms: u64, err: RedisError) -> LuaKvError {
    if err.kind() == redis::ErrorKind::AuthenticationFailed {
        LuaKvError::Connection(format!("authentication with {} failed: {}", addr, err))
    } else if err.is_timeout() {
        LuaKvError::Timeout(timeout_ms)
    } else if let Some(code) = err.code() {
        LuaKvError::Connection(format!(
            "handshake with {} failed: {}",
            addr,
            server_message(code, &err)
        ))
    } else {
        LuaKvError::Connection(format!("cannot connect to {}: {}", addr, err))
    }
}

/// Rebuild the error line the store sent, e.g. `NOSCRIPT No matching script`
fn server_message(code: &str, err: &RedisError) -> String {
    match err.detail() {
        Some(detail) => format!("{} {}", code, detail),
        None => code.to_string(),
    }
}

fn reply_from_value(value: Value) -> Reply {
    match value {
        Value::Nil => Reply::Bulk(None),
        Value::Int(i) => Reply::Integer(i),
        Value::Data(bytes) => Reply::Bulk(Some(bytes)),
        Value::Bulk(items) => Reply::Array(Some(items.into_iter().map(reply_from_value).collect())),
        Value::Status(status) => Reply::Status(status),
        Value::Okay => Reply::ok(),
    }
}

/// Opens TCP connections from a `Config`
#[derive(Debug, Clone)]
pub struct TcpConnector {
    config: Config,
}

impl TcpConnector {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl Connector for TcpConnector {
    fn connect(&self) -> Result<Box<dyn Transport>> {
        Ok(Box::new(Connection::connect(&self.config)?))
    }

    fn describe(&self) -> String {
        format!("tcp://{}/{}", self.config.address(), self.config.db)
    }
}
