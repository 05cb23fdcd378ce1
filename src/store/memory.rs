//! Memory store
//!
//! An in-process keyspace speaking the command subset the client uses.
//! Sixteen databases, lazy expiry, optional password, and a script cache
//! that runs catalog procedures natively.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};

use crate::config::MAX_DB_INDEX;
use crate::error::{LuaKvError, Result};
use crate::network::{Connector, Transport};
use crate::procedure::Procedure;
use crate::protocol::{Command, Reply};

use super::keyspace::{CommandError, CommandResult, Keyspace, Value};
use super::scripts;

/// Number of logical databases
pub const DATABASES: usize = MAX_DB_INDEX as usize + 1;

const DEFAULT_USER: &str = "default";

/// Per-connection state: selected database and authentication
#[derive(Debug, Clone)]
pub struct SessionState {
    db: usize,
    authenticated: bool,
}

impl SessionState {
    pub fn db(&self) -> usize {
        self.db
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

struct Shared {
    dbs: Vec<Mutex<Keyspace>>,

    /// Digest -> procedure
    scripts: RwLock<HashMap<String, Procedure>>,

    username: String,
    password: Option<String>,

    started: Instant,
    commands_processed: AtomicU64,
}

/// Shared handle to an in-memory store
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Shared>,
}

impl MemoryStore {
    /// Store without authentication
    pub fn new() -> Self {
        Self::build(DEFAULT_USER.to_string(), None)
    }

    /// Store that requires `AUTH <password>` before other commands
    pub fn with_password(password: impl Into<String>) -> Self {
        Self::build(DEFAULT_USER.to_string(), Some(password.into()))
    }

    /// Store that requires `AUTH <username> <password>`
    pub fn with_user(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self::build(username.into(), Some(password.into()))
    }

    fn build(username: String, password: Option<String>) -> Self {
        Self {
            inner: Arc::new(Shared {
                dbs: (0..DATABASES).map(|_| Mutex::new(Keyspace::new())).collect(),
                scripts: RwLock::new(HashMap::new()),
                username,
                password,
                started: Instant::now(),
                commands_processed: AtomicU64::new(0),
            }),
        }
    }

    /// Fresh session on database 0
    pub fn session(&self) -> SessionState {
        SessionState {
            db: 0,
            authenticated: self.inner.password.is_none(),
        }
    }

    /// Connector for in-process clients, already authenticated, on `db`
    pub fn connector(&self, db: u32) -> MemoryConnector {
        MemoryConnector {
            store: self.clone(),
            db,
        }
    }

    /// Live keys in `db`
    pub fn key_count(&self, db: usize) -> usize {
        self.inner.dbs.get(db).map_or(0, |ks| ks.lock().len())
    }

    /// Number of cached scripts
    pub fn script_count(&self) -> usize {
        self.inner.scripts.read().len()
    }

    /// Forget every cached script, as `SCRIPT FLUSH` does
    pub fn flush_scripts(&self) {
        self.inner.scripts.write().clear();
    }

    /// Digest assigned to a script source
    pub fn digest(source: &str) -> String {
        format!("{:08x}", crc32fast::hash(source.as_bytes()))
    }

    /// Execute one command for a session
    pub fn execute(&self, state: &mut SessionState, command: &Command) -> Reply {
        self.inner.commands_processed.fetch_add(1, Ordering::Relaxed);

        let name = command.name();
        tracing::trace!("Executing {} on db {}", name, state.db);

        match self.dispatch(state, &name, command.arguments()) {
            Ok(reply) => reply,
            Err(err) => Reply::from(err),
        }
    }

    fn dispatch(&self, state: &mut SessionState, name: &str, args: &[Vec<u8>]) -> CommandResult<Reply> {
        if name.is_empty() {
            return Err(CommandError::new("ERR empty command"));
        }
        if !state.authenticated && name != "AUTH" && name != "QUIT" {
            return Err(CommandError::new("NOAUTH Authentication required."));
        }

        match name {
            // -----------------------------------------------------------------
            // Connection
            // -----------------------------------------------------------------
            "PING" => match args {
                [] => Ok(Reply::Status("PONG".to_string())),
                [message] => Ok(Reply::bulk(message)),
                _ => Err(CommandError::arity(name)),
            },
            "ECHO" => match args {
                [message] => Ok(Reply::bulk(message)),
                _ => Err(CommandError::arity(name)),
            },
            "QUIT" => Ok(Reply::ok()),
            "AUTH" => self.auth(state, args),
            "SELECT" => {
                let [index] = args else {
                    return Err(CommandError::arity(name));
                };
                let index = int(index)?;
                if !(0..DATABASES as i64).contains(&index) {
                    return Err(CommandError::new("ERR DB index is out of range"));
                }
                state.db = index as usize;
                Ok(Reply::ok())
            }

            // -----------------------------------------------------------------
            // Strings and keys
            // -----------------------------------------------------------------
            "GET" => {
                let [key] = args else {
                    return Err(CommandError::arity(name));
                };
                Ok(Reply::Bulk(self.db(state).get(key)?))
            }
            "SET" => self.set(state, args),
            "MGET" => {
                if args.is_empty() {
                    return Err(CommandError::arity(name));
                }
                let mut ks = self.db(state);
                // non-string values read as nil
                let values = args
                    .iter()
                    .map(|key| Reply::Bulk(ks.get(key).ok().flatten()))
                    .collect();
                Ok(Reply::Array(Some(values)))
            }
            "DEL" | "UNLINK" => {
                if args.is_empty() {
                    return Err(CommandError::arity(name));
                }
                let mut ks = self.db(state);
                Ok(count(args.iter().filter(|key| ks.remove(key))))
            }
            "EXISTS" => {
                if args.is_empty() {
                    return Err(CommandError::arity(name));
                }
                let mut ks = self.db(state);
                Ok(count(args.iter().filter(|key| ks.exists(key))))
            }
            "TYPE" => {
                let [key] = args else {
                    return Err(CommandError::arity(name));
                };
                Ok(Reply::Status(self.db(state).type_name(key).to_string()))
            }
            "RENAME" => {
                let [from, to] = args else {
                    return Err(CommandError::arity(name));
                };
                if self.db(state).rename(from, to) {
                    Ok(Reply::ok())
                } else {
                    Err(CommandError::new("ERR no such key"))
                }
            }
            "MEMORY" => match args {
                [sub, key, ..] if sub.eq_ignore_ascii_case(b"USAGE") => Ok(self
                    .db(state)
                    .memory_usage(key)
                    .map_or_else(Reply::nil, |n| Reply::Integer(n as i64))),
                _ => Err(CommandError::new("ERR unknown MEMORY subcommand")),
            },

            // -----------------------------------------------------------------
            // Lists
            // -----------------------------------------------------------------
            "RPUSH" => {
                let [key, values @ ..] = args else {
                    return Err(CommandError::arity(name));
                };
                if values.is_empty() {
                    return Err(CommandError::arity(name));
                }
                let len = self.db(state).rpush(key, values.iter().cloned())?;
                Ok(Reply::Integer(len as i64))
            }
            "LRANGE" => {
                let [key, start, stop] = args else {
                    return Err(CommandError::arity(name));
                };
                let items = self.db(state).lrange(key, int(start)?, int(stop)?)?;
                Ok(Reply::bulk_array(items))
            }
            "LLEN" => {
                let [key] = args else {
                    return Err(CommandError::arity(name));
                };
                Ok(Reply::Integer(self.db(state).llen(key)? as i64))
            }

            // -----------------------------------------------------------------
            // Expiry
            // -----------------------------------------------------------------
            "PEXPIRE" | "EXPIRE" => {
                let [key, amount] = args else {
                    return Err(CommandError::arity(name));
                };
                let amount = int(amount)?;
                let ms = if name == "EXPIRE" {
                    amount.saturating_mul(1000)
                } else {
                    amount
                };
                Ok(Reply::Integer(self.db(state).pexpire(key, ms) as i64))
            }
            "PTTL" | "TTL" => {
                let [key] = args else {
                    return Err(CommandError::arity(name));
                };
                let ttl = self.db(state).pttl(key);
                Ok(Reply::Integer(if name == "TTL" && ttl > 0 {
                    (ttl + 999) / 1000
                } else {
                    ttl
                }))
            }
            "PERSIST" => {
                let [key] = args else {
                    return Err(CommandError::arity(name));
                };
                Ok(Reply::Integer(self.db(state).persist(key) as i64))
            }

            // -----------------------------------------------------------------
            // Server
            // -----------------------------------------------------------------
            "DBSIZE" => Ok(Reply::Integer(self.db(state).len() as i64)),
            "FLUSHDB" => {
                self.db(state).clear();
                Ok(Reply::ok())
            }
            "FLUSHALL" => {
                for ks in &self.inner.dbs {
                    ks.lock().clear();
                }
                Ok(Reply::ok())
            }
            "INFO" => {
                let section = args.first().map(|s| String::from_utf8_lossy(s).to_ascii_lowercase());
                Ok(Reply::bulk(self.info(section.as_deref())))
            }

            // -----------------------------------------------------------------
            // Scripting
            // -----------------------------------------------------------------
            "SCRIPT" => self.script(args),
            "EVALSHA" => {
                let [digest, rest @ ..] = args else {
                    return Err(CommandError::arity(name));
                };
                let digest = String::from_utf8_lossy(digest).to_ascii_lowercase();
                let procedure = self.inner.scripts.read().get(&digest).copied();
                match procedure {
                    Some(p) => self.eval(state, p, rest),
                    None => Err(CommandError::new("NOSCRIPT No matching script. Please use EVAL.")),
                }
            }
            "EVAL" => {
                let [source, rest @ ..] = args else {
                    return Err(CommandError::arity(name));
                };
                let procedure = unsupported_script(source)?;
                self.eval(state, procedure, rest)
            }

            other => Err(CommandError(format!("ERR unknown command '{}'", other.to_ascii_lowercase()))),
        }
    }

    fn db(&self, state: &SessionState) -> parking_lot::MutexGuard<'_, Keyspace> {
        self.inner.dbs[state.db].lock()
    }

    fn auth(&self, state: &mut SessionState, args: &[Vec<u8>]) -> CommandResult<Reply> {
        let (username, password) = match args {
            [password] => (DEFAULT_USER.as_bytes(), password),
            [username, password] => (username.as_slice(), password),
            _ => return Err(CommandError::arity("AUTH")),
        };

        let Some(expected) = &self.inner.password else {
            return Err(CommandError::new(
                "ERR AUTH <password> called without any password configured for the default user.",
            ));
        };

        if username == self.inner.username.as_bytes() && password.as_slice() == expected.as_bytes() {
            state.authenticated = true;
            Ok(Reply::ok())
        } else {
            Err(CommandError::new(
                "WRONGPASS invalid username-password pair or user is disabled.",
            ))
        }
    }

    /// `SET key value [EX s | PX ms | KEEPTTL] [NX | XX]`
    fn set(&self, state: &SessionState, args: &[Vec<u8>]) -> CommandResult<Reply> {
        let [key, value, options @ ..] = args else {
            return Err(CommandError::arity("SET"));
        };

        let mut ttl_ms: Option<i64> = None;
        let mut keep_ttl = false;
        let mut only_if_absent = false;
        let mut only_if_present = false;

        let mut iter = options.iter();
        while let Some(option) = iter.next() {
            let option = String::from_utf8_lossy(option).to_ascii_uppercase();
            match option.as_str() {
                "EX" | "PX" => {
                    let amount = int(iter.next().ok_or_else(CommandError::syntax)?)?;
                    if amount <= 0 {
                        return Err(CommandError::new("ERR invalid expire time in 'set' command"));
                    }
                    ttl_ms = Some(if option == "EX" {
                        amount.saturating_mul(1000)
                    } else {
                        amount
                    });
                }
                "KEEPTTL" => keep_ttl = true,
                "NX" => only_if_absent = true,
                "XX" => only_if_present = true,
                _ => return Err(CommandError::syntax()),
            }
        }
        if (keep_ttl && ttl_ms.is_some()) || (only_if_absent && only_if_present) {
            return Err(CommandError::syntax());
        }

        let mut ks = self.db(state);
        let exists = ks.exists(key);
        if (only_if_absent && exists) || (only_if_present && !exists) {
            return Ok(Reply::nil());
        }

        let expire_at = match ttl_ms {
            Some(ms) => Some(Instant::now() + Duration::from_millis(ms as u64)),
            None if keep_ttl => ks.expire_at(key),
            None => None,
        };
        ks.insert(key, Value::Str(value.clone()), expire_at);
        Ok(Reply::ok())
    }

    fn script(&self, args: &[Vec<u8>]) -> CommandResult<Reply> {
        let Some((sub, rest)) = args.split_first() else {
            return Err(CommandError::arity("SCRIPT"));
        };

        match String::from_utf8_lossy(sub).to_ascii_uppercase().as_str() {
            "LOAD" => {
                let [source] = rest else {
                    return Err(CommandError::arity("SCRIPT|LOAD"));
                };
                let procedure = unsupported_script(source)?;
                let digest = Self::digest(procedure.source());
                self.inner.scripts.write().insert(digest.clone(), procedure);
                tracing::debug!("Loaded script {} as {}", procedure, digest);
                Ok(Reply::bulk(digest))
            }
            "EXISTS" => {
                let scripts = self.inner.scripts.read();
                Ok(Reply::Array(Some(
                    rest.iter()
                        .map(|d| {
                            let digest = String::from_utf8_lossy(d).to_ascii_lowercase();
                            Reply::Integer(scripts.contains_key(&digest) as i64)
                        })
                        .collect(),
                )))
            }
            "FLUSH" => {
                self.flush_scripts();
                Ok(Reply::ok())
            }
            other => Err(CommandError(format!("ERR unknown SCRIPT subcommand '{}'", other))),
        }
    }

    /// Run a procedure: `numkeys key... arg...`
    fn eval(&self, state: &SessionState, procedure: Procedure, rest: &[Vec<u8>]) -> CommandResult<Reply> {
        let Some((numkeys, rest)) = rest.split_first() else {
            return Err(CommandError::arity("EVALSHA"));
        };
        let numkeys = int(numkeys)?;
        if numkeys < 0 || numkeys as usize > rest.len() {
            return Err(CommandError::new(
                "ERR Number of keys can't be greater than number of args",
            ));
        }
        let (keys, args) = rest.split_at(numkeys as usize);

        let mut ks = self.db(state);
        scripts::run(procedure, &mut ks, keys, args)
    }

    fn info(&self, section: Option<&str>) -> String {
        let everything = matches!(section, None | Some("all" | "default" | "everything"));
        let wants = |name: &str| everything || section == Some(name);
        let mut out = String::new();

        if wants("server") {
            out.push_str("# Server\r\n");
            out.push_str("redis_version:7.0.0\r\n");
            out.push_str(&format!("luakv_version:{}\r\n", crate::VERSION));
            out.push_str(&format!(
                "uptime_in_seconds:{}\r\n\r\n",
                self.inner.started.elapsed().as_secs()
            ));
        }
        if wants("stats") {
            out.push_str("# Stats\r\n");
            out.push_str(&format!(
                "total_commands_processed:{}\r\n\r\n",
                self.inner.commands_processed.load(Ordering::Relaxed)
            ));
        }
        if wants("keyspace") {
            out.push_str("# Keyspace\r\n");
            for (index, db) in self.inner.dbs.iter().enumerate() {
                let mut ks = db.lock();
                let keys = ks.len();
                if keys > 0 {
                    out.push_str(&format!(
                        "db{}:keys={},expires={},avg_ttl=0\r\n",
                        index,
                        keys,
                        ks.expiring_len()
                    ));
                }
            }
        }
        out
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn int(arg: &[u8]) -> CommandResult<i64> {
    std::str::from_utf8(arg)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(CommandError::not_integer)
}

fn count<I: Iterator>(iter: I) -> Reply {
    Reply::Integer(iter.count() as i64)
}

/// Only catalog procedures can run here
fn unsupported_script(source: &[u8]) -> CommandResult<Procedure> {
    std::str::from_utf8(source)
        .ok()
        .and_then(Procedure::from_source)
        .ok_or_else(|| CommandError::new("ERR only catalog procedures can run on the memory store"))
}

// =============================================================================
// In-process transport
// =============================================================================

/// Opens in-process transports to a `MemoryStore`
#[derive(Clone)]
pub struct MemoryConnector {
    store: MemoryStore,
    db: u32,
}

impl Connector for MemoryConnector {
    fn connect(&self) -> Result<Box<dyn Transport>> {
        if self.db > MAX_DB_INDEX {
            return Err(LuaKvError::Config(format!(
                "db index {} out of range (0..={})",
                self.db, MAX_DB_INDEX
            )));
        }
        Ok(Box::new(MemoryTransport {
            store: self.store.clone(),
            state: SessionState {
                db: self.db as usize,
                authenticated: true,
            },
        }))
    }

    fn describe(&self) -> String {
        format!("memory://{}", self.db)
    }
}

struct MemoryTransport {
    store: MemoryStore,
    state: SessionState,
}

impl Transport for MemoryTransport {
    fn request(&mut self, command: &Command) -> Result<Reply> {
        Ok(self.store.execute(&mut self.state, command))
    }
}
