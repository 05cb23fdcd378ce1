//! Client helpers
//!
//! Pure functions shared by the client operations.

use std::collections::HashSet;

use crate::error::{LuaKvError, Result};
use crate::protocol::Reply;
use crate::value::{Data, Scalar};

/// Combine a TTL given in seconds and/or milliseconds into milliseconds.
///
/// Zero counts as absent. When both are present the shorter one wins.
pub(crate) fn normalize_ttl(seconds: Option<u64>, millis: Option<u64>) -> Option<u64> {
    let seconds = seconds.filter(|&s| s > 0).map(|s| s.saturating_mul(1000));
    let millis = millis.filter(|&ms| ms > 0);
    match (seconds, millis) {
        (Some(s), Some(ms)) => Some(s.min(ms)),
        (s, ms) => s.or(ms),
    }
}

/// Drop repeated keys, keeping the first occurrence of each
pub(crate) fn remove_duplicates<I, K>(keys: I) -> Vec<String>
where
    I: IntoIterator<Item = K>,
    K: AsRef<str>,
{
    let mut seen = HashSet::new();
    keys.into_iter()
        .filter(|k| seen.insert(k.as_ref().to_string()))
        .map(|k| k.as_ref().to_string())
        .collect()
}

/// Procedure flag argument
pub(crate) fn flag(on: bool) -> &'static str {
    if on {
        "1"
    } else {
        "0"
    }
}

/// Decode a value reply: nil, bulk string or array of bulk strings
pub(crate) fn reply_to_data(reply: Reply) -> Result<Option<Data>> {
    match reply {
        Reply::Bulk(None) | Reply::Array(None) => Ok(None),
        Reply::Bulk(Some(_)) | Reply::Status(_) => Ok(reply.into_opt_string()?.map(Data::string)),
        Reply::Array(Some(items)) => {
            let items = items
                .into_iter()
                .map(|item| item.into_string().map(Scalar::Str))
                .collect::<Result<Vec<_>>>()?;
            Ok(Some(Data::List(items)))
        }
        other => Err(LuaKvError::UnexpectedReply {
            expected: "string, list or nil",
            got: other.kind().to_string(),
        }),
    }
}

/// Decode a removal report: one `[key]` or `[key, value]` array per key
pub(crate) fn parse_key_report(reply: Reply) -> Result<Vec<(String, Option<Data>)>> {
    let entries = match reply {
        Reply::Array(Some(entries)) => entries,
        Reply::Array(None) => return Ok(Vec::new()),
        other => {
            return Err(LuaKvError::UnexpectedReply {
                expected: "array of key entries",
                got: other.kind().to_string(),
            })
        }
    };

    entries
        .into_iter()
        .map(|entry| {
            let mut parts = match entry {
                Reply::Array(Some(parts)) if !parts.is_empty() => parts.into_iter(),
                other => {
                    return Err(LuaKvError::UnexpectedReply {
                        expected: "key entry",
                        got: other.kind().to_string(),
                    })
                }
            };
            let key = parts.next().map(Reply::into_string).transpose()?.unwrap_or_default();
            let value = match parts.next() {
                Some(value) => reply_to_data(value)?,
                None => None,
            };
            Ok((key, value))
        })
        .collect()
}

/// Apply an optional type spec
pub(crate) fn maybe_convert(value: Data, convert_to: Option<&str>) -> Data {
    match convert_to {
        Some(spec) => crate::convert::convert(value, spec),
        None => value,
    }
}

/// Parse `INFO` text into `field -> value`
pub(crate) fn parse_info(text: &str) -> std::collections::HashMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once(':'))
        .map(|(field, value)| (field.to_string(), value.to_string()))
        .collect()
}
