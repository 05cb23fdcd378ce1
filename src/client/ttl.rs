//! Expiry operations

use crate::error::Result;
use crate::procedure::Procedure;
use crate::protocol::{Command, Reply};

use super::helpers::{normalize_ttl, remove_duplicates};
use super::Client;

impl Client {
    /// Expire `key` after the given time. False when the key is absent or
    /// no positive time was given.
    pub fn set_key_ttl(&self, key: &str, ttl_seconds: Option<u64>, ttl_ms: Option<u64>) -> Result<bool> {
        let Some(ttl) = normalize_ttl(ttl_seconds, ttl_ms) else {
            return Ok(false);
        };
        if key.is_empty() {
            return Ok(false);
        }
        let command = Command::new("PEXPIRE").arg(key).arg(ttl.to_string());
        let applied = self
            .pool
            .execute(&command)
            .and_then(Reply::into_integer)
            .map_err(|e| e.context("set_key_ttl", key))?;
        Ok(applied == 1)
    }

    /// Expire many keys in one atomic step; returns how many existed
    pub fn set_keys_ttl<I, K>(&self, keys: I, ttl_seconds: Option<u64>, ttl_ms: Option<u64>) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let Some(ttl) = normalize_ttl(ttl_seconds, ttl_ms) else {
            return Ok(0);
        };
        let keys = remove_duplicates(keys);
        if keys.is_empty() {
            return Ok(0);
        }
        let applied = self
            .invoke(Procedure::SetKeysTtl, &keys, &[ttl.to_string()])?
            .into_integer()?;
        Ok(applied.max(0) as u64)
    }

    /// Remaining time to live in milliseconds.
    ///
    /// `None` when the key is absent, `Some(0)` when it exists without
    /// expiry. A key about to expire reports at least 1.
    pub fn get_key_ttl(&self, key: &str) -> Result<Option<u64>> {
        if key.is_empty() {
            return Ok(None);
        }
        let ttl = self
            .pool
            .execute(&Command::new("PTTL").arg(key))
            .and_then(Reply::into_integer)
            .map_err(|e| e.context("get_key_ttl", key))?;
        Ok(match ttl {
            -2 => None,
            -1 => Some(0),
            ms => Some(ms.max(1) as u64),
        })
    }

    /// Remove the expiry of `key`; false when it had none or is absent
    pub fn drop_key_ttl(&self, key: &str) -> Result<bool> {
        if key.is_empty() {
            return Ok(false);
        }
        let dropped = self
            .pool
            .execute(&Command::new("PERSIST").arg(key))
            .and_then(Reply::into_integer)
            .map_err(|e| e.context("drop_key_ttl", key))?;
        Ok(dropped == 1)
    }

    /// Remove the expiry of many keys in one atomic step; returns how many had one
    pub fn drop_keys_ttl<I, K>(&self, keys: I) -> Result<u64>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys = remove_duplicates(keys);
        if keys.is_empty() {
            return Ok(0);
        }
        let no_args: [&str; 0] = [];
        let dropped = self
            .invoke(Procedure::DropKeysTtl, &keys, &no_args)?
            .into_integer()?;
        Ok(dropped.max(0) as u64)
    }
}
