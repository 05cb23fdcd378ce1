//! Error types for luakv
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using LuaKvError
pub type Result<T> = std::result::Result<T, LuaKvError>;

/// Unified error type for luakv operations
#[derive(Debug, Error)]
pub enum LuaKvError {
    // -------------------------------------------------------------------------
    // Connectivity Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out waiting for the store after {0} ms")]
    Timeout(u64),

    #[error("Connection error: {0}")]
    Connection(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply { expected: &'static str, got: String },

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    /// Error reply sent back by the store
    #[error("Store error: {0}")]
    Server(String),

    /// The store no longer knows a procedure handle this client cached
    #[error("Procedure '{name}' is no longer loaded on the store")]
    StaleProcedure { name: String },

    #[error("Unknown procedure: {0}")]
    UnknownProcedure(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Operation Context
    // -------------------------------------------------------------------------
    #[error("{op} failed for key '{key}': {source}")]
    Operation {
        op: &'static str,
        key: String,
        #[source]
        source: Box<LuaKvError>,
    },
}

impl LuaKvError {
    /// True for failures caused by the link to the store rather than by the request.
    pub fn is_connectivity(&self) -> bool {
        match self {
            LuaKvError::Io(_) | LuaKvError::Timeout(_) | LuaKvError::Connection(_) => true,
            LuaKvError::Operation { source, .. } => source.is_connectivity(),
            _ => false,
        }
    }

    /// True when the error is a socket read/write timeout
    pub fn is_timeout(&self) -> bool {
        match self {
            LuaKvError::Timeout(_) => true,
            LuaKvError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
            ),
            LuaKvError::Operation { source, .. } => source.is_timeout(),
            _ => false,
        }
    }

    /// Attach the failing operation and key
    pub fn context(self, op: &'static str, key: impl Into<String>) -> Self {
        LuaKvError::Operation {
            op,
            key: key.into(),
            source: Box::new(self),
        }
    }
}
