//! Native procedure execution
//!
//! The memory store cannot run Lua. Instead each catalog procedure is
//! executed here with the same observable behavior, while the caller holds
//! the database lock, so every procedure is atomic.

use std::time::{Duration, Instant};

use crate::procedure::Procedure;
use crate::protocol::Reply;

use super::keyspace::{CommandError, CommandResult, Keyspace, Value};

/// Run `procedure` against one database
pub(crate) fn run(
    procedure: Procedure,
    ks: &mut Keyspace,
    keys: &[Vec<u8>],
    args: &[Vec<u8>],
) -> CommandResult<Reply> {
    match procedure {
        Procedure::SetNotArrayHelper => write_value(ks, single_key(keys)?, args, Shape::Scalar),
        Procedure::RpushHelper => write_value(ks, single_key(keys)?, args, Shape::List),
        Procedure::GetHelper => Ok(snapshot(ks, single_key(keys)?)),
        Procedure::DeleteWithReturning | Procedure::UnlinkWithReturning => {
            let key = single_key(keys)?;
            let old = if flag(args.first())? {
                snapshot(ks, key)
            } else {
                Reply::nil()
            };
            ks.remove(key);
            Ok(old)
        }
        Procedure::RenameKey => {
            let [from, to] = keys else {
                return Err(malformed());
            };
            Ok(Reply::Integer(ks.rename(from, to) as i64))
        }
        Procedure::RemoveAllKeys => {
            let want_count = flag(args.first())?;
            let count = ks.len();
            ks.clear();
            Ok(if want_count {
                Reply::Integer(count as i64)
            } else {
                Reply::nil()
            })
        }
        Procedure::SetKeysTtl => {
            let ttl_ms = int_arg(args.first())?;
            if ttl_ms <= 0 {
                return Err(malformed());
            }
            let applied = keys.iter().filter(|k| ks.pexpire(k, ttl_ms)).count();
            Ok(Reply::Integer(applied as i64))
        }
        Procedure::DropKeysTtl => {
            let dropped = keys.iter().filter(|k| ks.persist(k)).count();
            Ok(Reply::Integer(dropped as i64))
        }
        Procedure::AppendValueToArray => {
            let key = single_key(keys)?;
            let index = int_arg(args.first())?;
            let value = args.get(1).ok_or_else(malformed)?;
            let len = ks.list_insert(key, index, value.clone())?;
            Ok(Reply::Integer(len as i64))
        }
        Procedure::MassRemoveWithReport => {
            // unlink and delete reclaim the same way here
            flag(args.first())?;
            let want_values = flag(args.get(1))?;
            let mut report = Vec::new();
            for key in keys {
                let Some(value) = ks.value(key) else {
                    continue;
                };
                let mut entry = vec![Reply::bulk(key)];
                if want_values {
                    entry.push(value.to_reply());
                }
                report.push(Reply::Array(Some(entry)));
            }
            for key in keys {
                ks.remove(key);
            }
            Ok(Reply::Array(Some(report)))
        }
        Procedure::ExistingKeys => {
            let found: Vec<&Vec<u8>> = keys.iter().filter(|k| ks.exists(k)).collect();
            Ok(Reply::bulk_array(found))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Scalar,
    List,
}

/// Leading arguments shared by the two write procedures
struct WriteArgs {
    want_old: bool,
    ttl_ms: i64,
    if_exists: bool,
    if_not_exists: bool,
    keep_ttl: bool,
}

impl WriteArgs {
    const COUNT: usize = 5;

    fn parse(args: &[Vec<u8>]) -> CommandResult<Self> {
        Ok(Self {
            want_old: flag(args.first())?,
            ttl_ms: int_arg(args.get(1))?,
            if_exists: flag(args.get(2))?,
            if_not_exists: flag(args.get(3))?,
            keep_ttl: flag(args.get(4))?,
        })
    }

    fn allows(&self, exists: bool) -> bool {
        !(self.if_exists && !exists || self.if_not_exists && exists)
    }
}

fn write_value(
    ks: &mut Keyspace,
    key: &[u8],
    args: &[Vec<u8>],
    shape: Shape,
) -> CommandResult<Reply> {
    let opts = WriteArgs::parse(args)?;
    let payload = &args[WriteArgs::COUNT..];

    let exists = ks.exists(key);
    let old = if opts.want_old {
        snapshot(ks, key)
    } else {
        Reply::nil()
    };

    if !opts.allows(exists) {
        return Ok(old);
    }

    let expire_at = if opts.keep_ttl && exists {
        ks.expire_at(key)
    } else if opts.ttl_ms > 0 {
        Some(Instant::now() + Duration::from_millis(opts.ttl_ms as u64))
    } else {
        None
    };

    match shape {
        Shape::Scalar => {
            let value = payload.first().ok_or_else(malformed)?;
            ks.insert(key, Value::Str(value.clone()), expire_at);
        }
        Shape::List => {
            ks.remove(key);
            if !payload.is_empty() {
                ks.insert(key, Value::List(payload.iter().cloned().collect()), expire_at);
            }
        }
    }

    Ok(old)
}

/// Current value as a reply, nil when absent
fn snapshot(ks: &mut Keyspace, key: &[u8]) -> Reply {
    ks.value(key).map_or_else(Reply::nil, Value::to_reply)
}

fn single_key(keys: &[Vec<u8>]) -> CommandResult<&[u8]> {
    match keys {
        [key] => Ok(key.as_slice()),
        _ => Err(malformed()),
    }
}

fn flag(arg: Option<&Vec<u8>>) -> CommandResult<bool> {
    match arg.map(Vec::as_slice) {
        Some(b"1") => Ok(true),
        Some(b"0") => Ok(false),
        _ => Err(CommandError::new("ERR malformed flag")),
    }
}

fn int_arg(arg: Option<&Vec<u8>>) -> CommandResult<i64> {
    arg.and_then(|a| std::str::from_utf8(a).ok())
        .and_then(|s| s.parse().ok())
        .ok_or_else(malformed)
}

fn malformed() -> CommandError {
    CommandError::new("ERR malformed arguments")
}
