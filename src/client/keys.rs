//! Single-key operations

use crate::error::Result;
use crate::procedure::Procedure;
use crate::value::{Data, Scalar};

use super::helpers::{flag, maybe_convert, normalize_ttl, reply_to_data};
use super::{Client, SetOptions};

impl Client {
    /// Store `value` under `key`.
    ///
    /// Scalars are stored as strings, lists and sets as store lists,
    /// replacing whatever shape the key held. Returns the previous value
    /// only when `options.get_old_value` is set.
    pub fn set(&self, key: &str, value: impl Into<Data>, options: &SetOptions) -> Result<Option<Data>> {
        if key.is_empty() {
            return Ok(None);
        }
        let value = value.into();

        let ttl_ms = normalize_ttl(options.ttl_seconds, options.ttl_ms).unwrap_or(0);
        let mut args = vec![
            flag(options.get_old_value).to_string(),
            ttl_ms.to_string(),
            flag(options.if_exists).to_string(),
            flag(options.if_not_exists).to_string(),
            flag(options.keep_ttl).to_string(),
        ];
        args.extend(value.to_wire_elements());

        let procedure = if value.is_collection() {
            Procedure::RpushHelper
        } else {
            Procedure::SetNotArrayHelper
        };

        tracing::debug!("set {} via {} (ttl {} ms)", key, procedure, ttl_ms);
        let reply = self
            .invoke(procedure, &[key], &args)
            .map_err(|e| e.context("set", key))?;

        if !options.get_old_value {
            return Ok(None);
        }
        let old = reply_to_data(reply).map_err(|e| e.context("set", key))?;
        Ok(old.map(|v| maybe_convert(v, options.convert_old_value_to.as_deref())))
    }

    /// Value under `key`: a string, or a list for collection storage
    pub fn get(&self, key: &str, convert_to: Option<&str>) -> Result<Option<Data>> {
        if key.is_empty() {
            return Ok(None);
        }
        let no_args: [&str; 0] = [];
        let reply = self
            .invoke(Procedure::GetHelper, &[key], &no_args)
            .map_err(|e| e.context("get", key))?;
        let value = reply_to_data(reply).map_err(|e| e.context("get", key))?;
        Ok(value.map(|v| maybe_convert(v, convert_to)))
    }

    /// Value under `key`, or `default` when empty or absent
    pub fn get_or(&self, key: &str, default: impl Into<Data>, convert_to: Option<&str>) -> Result<Data> {
        Ok(self.get(key, convert_to)?.unwrap_or_else(|| default.into()))
    }

    /// Remove `key`; with `returning`, hand back its previous value
    pub fn delete(&self, key: &str, returning: bool, convert_to: Option<&str>) -> Result<Option<Data>> {
        self.remove(Procedure::DeleteWithReturning, "delete", key, returning, convert_to)
    }

    /// Like `delete`, but the store reclaims memory asynchronously
    pub fn unlink(&self, key: &str, returning: bool, convert_to: Option<&str>) -> Result<Option<Data>> {
        self.remove(Procedure::UnlinkWithReturning, "unlink", key, returning, convert_to)
    }

    fn remove(
        &self,
        procedure: Procedure,
        op: &'static str,
        key: &str,
        returning: bool,
        convert_to: Option<&str>,
    ) -> Result<Option<Data>> {
        if key.is_empty() {
            return Ok(None);
        }
        let reply = self
            .invoke(procedure, &[key], &[flag(returning)])
            .map_err(|e| e.context(op, key))?;
        if !returning {
            return Ok(None);
        }
        let old = reply_to_data(reply).map_err(|e| e.context(op, key))?;
        Ok(old.map(|v| maybe_convert(v, convert_to)))
    }

    /// Rename `key` to `new_key`. A missing `key` is not an error; with
    /// `want_status` the result tells whether a rename happened.
    pub fn rename_key(&self, key: &str, new_key: &str, want_status: bool) -> Result<Option<bool>> {
        if key.is_empty() || new_key.is_empty() {
            return Ok(None);
        }
        let no_args: [&str; 0] = [];
        let renamed = self
            .invoke(Procedure::RenameKey, &[key, new_key], &no_args)
            .and_then(|r| r.into_integer())
            .map_err(|e| e.context("rename_key", key))?;
        Ok(want_status.then_some(renamed == 1))
    }

    /// Insert `value` into the list under `key` at `index`; `None`, a
    /// negative index or one past the end appends. Returns the new length.
    pub fn append_value_to_array(
        &self,
        key: &str,
        value: impl Into<Scalar>,
        index: Option<i64>,
    ) -> Result<Option<u64>> {
        if key.is_empty() {
            return Ok(None);
        }
        let args = [index.unwrap_or(-1).to_string(), value.into().to_wire()];
        let len = self
            .invoke(Procedure::AppendValueToArray, &[key], &args)
            .and_then(|r| r.into_integer())
            .map_err(|e| e.context("append_value_to_array", key))?;
        Ok(Some(len.max(0) as u64))
    }

    /// Wipe the selected database; with `want_count`, report how many keys it held
    pub fn remove_all_keys(&self, want_count: bool) -> Result<Option<u64>> {
        let no_keys: [&str; 0] = [];
        let count = self
            .invoke(Procedure::RemoveAllKeys, &no_keys, &[flag(want_count)])
            .and_then(|r| r.into_opt_integer())?;
        tracing::debug!("Removed all keys from db {}", self.config.db);
        Ok(count.map(|n| n.max(0) as u64))
    }
}
