//! Reply definitions
//!
//! Represents values sent back by the store.

use crate::error::{LuaKvError, Result};

/// A RESP2 reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Simple status line such as `OK` or `PONG`
    Status(String),

    /// Error line, including its code prefix (`ERR`, `NOSCRIPT`, ...)
    Error(String),

    /// Signed 64-bit integer
    Integer(i64),

    /// Binary-safe string, `None` is the nil bulk string
    Bulk(Option<Vec<u8>>),

    /// Array of replies, `None` is the nil array
    Array(Option<Vec<Reply>>),
}

impl Reply {
    /// `+OK`
    pub fn ok() -> Self {
        Reply::Status("OK".to_string())
    }

    /// Nil bulk string
    pub fn nil() -> Self {
        Reply::Bulk(None)
    }

    /// Error reply
    pub fn error(message: impl Into<String>) -> Self {
        Reply::Error(message.into())
    }

    /// Bulk string from text
    pub fn bulk(data: impl AsRef<[u8]>) -> Self {
        Reply::Bulk(Some(data.as_ref().to_vec()))
    }

    /// Array of bulk strings
    pub fn bulk_array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Reply::Array(Some(items.into_iter().map(Reply::bulk).collect()))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Bulk(None) | Reply::Array(None))
    }

    /// Short description for error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Reply::Status(_) => "status",
            Reply::Error(_) => "error",
            Reply::Integer(_) => "integer",
            Reply::Bulk(None) | Reply::Array(None) => "nil",
            Reply::Bulk(Some(_)) => "bulk string",
            Reply::Array(Some(_)) => "array",
        }
    }

    /// Turn an error reply into `Err`, pass everything else through
    pub fn into_result(self) -> Result<Reply> {
        match self {
            Reply::Error(message) => Err(LuaKvError::Server(message)),
            other => Ok(other),
        }
    }

    /// Integer reply
    pub fn into_integer(self) -> Result<i64> {
        match self {
            Reply::Integer(i) => Ok(i),
            other => Err(unexpected("integer", &other)),
        }
    }

    /// Integer reply or nil
    pub fn into_opt_integer(self) -> Result<Option<i64>> {
        match self {
            Reply::Integer(i) => Ok(Some(i)),
            r if r.is_nil() => Ok(None),
            other => Err(unexpected("integer or nil", &other)),
        }
    }

    /// Bulk or status reply as UTF-8 text, `None` for nil
    pub fn into_opt_string(self) -> Result<Option<String>> {
        match self {
            Reply::Bulk(Some(data)) => Ok(Some(utf8(data)?)),
            Reply::Status(s) => Ok(Some(s)),
            r if r.is_nil() => Ok(None),
            other => Err(unexpected("string", &other)),
        }
    }

    /// Non-nil string reply
    pub fn into_string(self) -> Result<String> {
        match self.into_opt_string()? {
            Some(s) => Ok(s),
            None => Err(LuaKvError::UnexpectedReply {
                expected: "string",
                got: "nil".to_string(),
            }),
        }
    }

    /// Array of bulk strings, nil elements kept as `None`
    pub fn into_opt_string_array(self) -> Result<Vec<Option<String>>> {
        match self {
            Reply::Array(Some(items)) => items
                .into_iter()
                .map(Reply::into_opt_string)
                .collect(),
            Reply::Array(None) => Ok(Vec::new()),
            other => Err(unexpected("array", &other)),
        }
    }
}

fn utf8(data: Vec<u8>) -> Result<String> {
    String::from_utf8(data)
        .map_err(|e| LuaKvError::Protocol(format!("reply is not valid UTF-8: {}", e)))
}

fn unexpected(expected: &'static str, got: &Reply) -> LuaKvError {
    LuaKvError::UnexpectedReply {
        expected,
        got: got.kind().to_string(),
    }
}
