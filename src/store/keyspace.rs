//! Keyspace
//!
//! One logical database: keys mapped to strings or lists, each with an
//! optional deadline. Expired entries are removed lazily, on first access.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use crate::protocol::Reply;

pub(crate) const WRONGTYPE: &str =
    "WRONGTYPE Operation against a key holding the wrong kind of value";

/// An error reply produced while executing a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandError(pub String);

impl CommandError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn wrong_type() -> Self {
        Self::new(WRONGTYPE)
    }

    pub fn syntax() -> Self {
        Self::new("ERR syntax error")
    }

    pub fn not_integer() -> Self {
        Self::new("ERR value is not an integer or out of range")
    }

    pub fn arity(command: &str) -> Self {
        Self(format!(
            "ERR wrong number of arguments for '{}' command",
            command.to_ascii_lowercase()
        ))
    }
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Self {
        Reply::Error(err.0)
    }
}

pub(crate) type CommandResult<T> = std::result::Result<T, CommandError>;

/// Stored value
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Value {
    Str(Vec<u8>),
    List(VecDeque<Vec<u8>>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "string",
            Value::List(_) => "list",
        }
    }

    /// The value as a reply: bulk string or array of bulk strings
    pub fn to_reply(&self) -> Reply {
        match self {
            Value::Str(data) => Reply::bulk(data),
            Value::List(items) => Reply::bulk_array(items),
        }
    }

    fn footprint(&self) -> usize {
        match self {
            Value::Str(data) => data.len(),
            Value::List(items) => items.iter().map(|i| i.len() + 16).sum(),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expire_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expire_at.map_or(false, |t| now >= t)
    }
}

/// One database
#[derive(Debug, Default)]
pub(crate) struct Keyspace {
    entries: HashMap<Vec<u8>, Entry>,
}

impl Keyspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live entry, removing it first if it has expired
    fn live(&mut self, key: &[u8]) -> Option<&mut Entry> {
        let now = Instant::now();
        if self.entries.get(key).map_or(false, |e| e.is_expired(now)) {
            self.entries.remove(key);
            return None;
        }
        self.entries.get_mut(key)
    }

    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.entries.retain(|_, e| !e.is_expired(now));
    }

    // =========================================================================
    // Generic key operations
    // =========================================================================

    pub fn exists(&mut self, key: &[u8]) -> bool {
        self.live(key).is_some()
    }

    /// `"none"`, `"string"` or `"list"`
    pub fn type_name(&mut self, key: &[u8]) -> &'static str {
        self.live(key).map_or("none", |e| e.value.type_name())
    }

    pub fn value(&mut self, key: &[u8]) -> Option<&Value> {
        self.live(key).map(|e| &e.value)
    }

    /// Store `value`, replacing whatever the key held
    pub fn insert(&mut self, key: &[u8], value: Value, expire_at: Option<Instant>) {
        self.entries.insert(key.to_vec(), Entry { value, expire_at });
    }

    pub fn remove(&mut self, key: &[u8]) -> bool {
        self.live(key).is_some() && self.entries.remove(key).is_some()
    }

    /// Move `from` to `to`, keeping its deadline. False if `from` is absent.
    pub fn rename(&mut self, from: &[u8], to: &[u8]) -> bool {
        if self.live(from).is_none() {
            return false;
        }
        match self.entries.remove(from) {
            Some(entry) => {
                self.entries.insert(to.to_vec(), entry);
                true
            }
            None => false,
        }
    }

    /// Number of live keys
    pub fn len(&mut self) -> usize {
        self.purge_expired();
        self.entries.len()
    }

    /// Number of live keys carrying a deadline
    pub fn expiring_len(&mut self) -> usize {
        self.purge_expired();
        self.entries.values().filter(|e| e.expire_at.is_some()).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Rough byte footprint of a key and its value
    pub fn memory_usage(&mut self, key: &[u8]) -> Option<usize> {
        let key_len = key.len();
        self.live(key).map(|e| 48 + key_len + e.value.footprint())
    }

    // =========================================================================
    // Expiry
    // =========================================================================

    pub fn expire_at(&mut self, key: &[u8]) -> Option<Instant> {
        self.live(key).and_then(|e| e.expire_at)
    }

    /// Remaining time to live in ms; -2 when absent, -1 without deadline
    pub fn pttl(&mut self, key: &[u8]) -> i64 {
        match self.live(key) {
            None => -2,
            Some(Entry { expire_at: None, .. }) => -1,
            Some(Entry {
                expire_at: Some(t), ..
            }) => t.saturating_duration_since(Instant::now()).as_millis() as i64,
        }
    }

    /// Set a deadline `ms` from now; a non-positive `ms` deletes the key
    pub fn pexpire(&mut self, key: &[u8], ms: i64) -> bool {
        if ms <= 0 {
            return self.remove(key);
        }
        match self.live(key) {
            Some(entry) => {
                entry.expire_at = Some(Instant::now() + Duration::from_millis(ms as u64));
                true
            }
            None => false,
        }
    }

    /// Remove the deadline; true only if there was one
    pub fn persist(&mut self, key: &[u8]) -> bool {
        match self.live(key) {
            Some(entry) => entry.expire_at.take().is_some(),
            None => false,
        }
    }

    // =========================================================================
    // Strings
    // =========================================================================

    pub fn get(&mut self, key: &[u8]) -> CommandResult<Option<Vec<u8>>> {
        match self.value(key) {
            None => Ok(None),
            Some(Value::Str(data)) => Ok(Some(data.clone())),
            Some(_) => Err(CommandError::wrong_type()),
        }
    }

    // =========================================================================
    // Lists
    // =========================================================================

    fn list_mut(&mut self, key: &[u8]) -> CommandResult<Option<&mut VecDeque<Vec<u8>>>> {
        match self.live(key) {
            None => Ok(None),
            Some(Entry {
                value: Value::List(items),
                ..
            }) => Ok(Some(items)),
            Some(_) => Err(CommandError::wrong_type()),
        }
    }

    /// Append values, creating the list if needed. Returns the new length.
    pub fn rpush<I>(&mut self, key: &[u8], values: I) -> CommandResult<usize>
    where
        I: IntoIterator<Item = Vec<u8>>,
    {
        if let Some(items) = self.list_mut(key)? {
            items.extend(values);
            return Ok(items.len());
        }
        let items: VecDeque<Vec<u8>> = values.into_iter().collect();
        let len = items.len();
        if len > 0 {
            self.insert(key, Value::List(items), None);
        }
        Ok(len)
    }

    /// Insert at `index`; a negative index or one past the end appends
    pub fn list_insert(&mut self, key: &[u8], index: i64, value: Vec<u8>) -> CommandResult<usize> {
        match self.list_mut(key)? {
            Some(items) => {
                if index < 0 || index as usize >= items.len() {
                    items.push_back(value);
                } else {
                    items.insert(index as usize, value);
                }
                Ok(items.len())
            }
            None => self.rpush(key, [value]),
        }
    }

    pub fn llen(&mut self, key: &[u8]) -> CommandResult<usize> {
        Ok(self.list_mut(key)?.map_or(0, |items| items.len()))
    }

    /// Elements between `start` and `stop` inclusive, negative indexes
    /// counting from the end
    pub fn lrange(&mut self, key: &[u8], start: i64, stop: i64) -> CommandResult<Vec<Vec<u8>>> {
        let Some(items) = self.list_mut(key)? else {
            return Ok(Vec::new());
        };
        Ok(match normalize_range(items.len(), start, stop) {
            Some((from, to)) => items.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }
}

fn normalize_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
    if start > stop || start >= len {
        None
    } else {
        Some((start as usize, stop as usize))
    }
}
