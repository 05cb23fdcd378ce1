//! Protocol codec
//!
//! Encoding and decoding functions for RESP2 frames. The client side talks
//! through redis-rs; these serve `network::Server` and its tests, from
//! complete byte buffers and from blocking streams.

use std::io::{BufRead, Read, Write};

use bytes::BufMut;

use crate::error::{LuaKvError, Result};
use super::{Command, Reply};

/// Maximum bulk string size (512 MB, the Redis limit)
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Maximum number of elements in one array
pub const MAX_ARRAY_LEN: usize = 1 << 24;

/// Maximum nesting depth of arrays
pub const MAX_NESTING_DEPTH: usize = 32;

const CRLF: &[u8] = b"\r\n";

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command as an array of bulk strings
pub fn encode_command(command: &Command) -> Vec<u8> {
    let parts = command.parts();
    let payload: usize = parts.iter().map(|p| p.len() + 16).sum();

    let mut buf = Vec::with_capacity(16 + payload);
    put_header(&mut buf, b'*', parts.len() as i64);
    for part in parts {
        put_bulk(&mut buf, part);
    }
    buf
}

/// Decode a command from bytes
///
/// Returns `None` while the buffer holds an incomplete frame
pub fn decode_command(bytes: &[u8]) -> Result<Option<(Command, usize)>> {
    match decode_reply(bytes)? {
        Some((frame, consumed)) => Ok(Some((command_from_frame(frame)?, consumed))),
        None => Ok(None),
    }
}

fn command_from_frame(frame: Reply) -> Result<Command> {
    let items = match frame {
        Reply::Array(Some(items)) if !items.is_empty() => items,
        other => {
            return Err(LuaKvError::Protocol(format!(
                "command must be a non-empty array, got {}",
                other.kind()
            )))
        }
    };

    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Reply::Bulk(Some(data)) => parts.push(data),
            Reply::Status(s) => parts.push(s.into_bytes()),
            other => {
                return Err(LuaKvError::Protocol(format!(
                    "command arguments must be bulk strings, got {}",
                    other.kind()
                )))
            }
        }
    }

    Ok(Command::from_parts(parts))
}

// =============================================================================
// Reply Encoding/Decoding
// =============================================================================

/// Encode a reply to bytes
pub fn encode_reply(reply: &Reply) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_reply_to(reply, &mut buf);
    buf
}

fn encode_reply_to(reply: &Reply, buf: &mut Vec<u8>) {
    match reply {
        Reply::Status(s) => put_line(buf, b'+', s.as_bytes()),
        Reply::Error(e) => put_line(buf, b'-', e.as_bytes()),
        Reply::Integer(i) => put_header(buf, b':', *i),
        Reply::Bulk(None) => put_header(buf, b'$', -1),
        Reply::Bulk(Some(data)) => put_bulk(buf, data),
        Reply::Array(None) => put_header(buf, b'*', -1),
        Reply::Array(Some(items)) => {
            put_header(buf, b'*', items.len() as i64);
            for item in items {
                encode_reply_to(item, buf);
            }
        }
    }
}

/// Decode one reply from the front of `bytes`
///
/// Returns the reply and the number of bytes consumed, or `None` if the
/// buffer does not yet hold a complete frame.
pub fn decode_reply(bytes: &[u8]) -> Result<Option<(Reply, usize)>> {
    let mut pos = 0;
    match parse_frame(bytes, &mut pos, 0)? {
        Some(reply) => Ok(Some((reply, pos))),
        None => Ok(None),
    }
}

fn parse_frame(buf: &[u8], pos: &mut usize, depth: usize) -> Result<Option<Reply>> {
    if depth > MAX_NESTING_DEPTH {
        return Err(LuaKvError::Protocol("maximum nesting depth exceeded".to_string()));
    }

    let Some(&type_byte) = buf.get(*pos) else {
        return Ok(None);
    };
    let Some(line) = find_line(buf, *pos + 1) else {
        return Ok(None);
    };
    let line_text = &buf[*pos + 1..line];
    let after_line = line + CRLF.len();

    match type_byte {
        b'+' => {
            *pos = after_line;
            Ok(Some(Reply::Status(String::from_utf8_lossy(line_text).into_owned())))
        }
        b'-' => {
            *pos = after_line;
            Ok(Some(Reply::Error(String::from_utf8_lossy(line_text).into_owned())))
        }
        b':' => {
            *pos = after_line;
            Ok(Some(Reply::Integer(parse_int(line_text)?)))
        }
        b'$' => {
            let len = parse_int(line_text)?;
            if len == -1 {
                *pos = after_line;
                return Ok(Some(Reply::Bulk(None)));
            }
            let len = checked_len(len, MAX_BULK_SIZE, "bulk string")?;
            let end = after_line + len;
            if buf.len() < end + CRLF.len() {
                return Ok(None);
            }
            if &buf[end..end + CRLF.len()] != CRLF {
                return Err(LuaKvError::Protocol("bulk string missing CRLF".to_string()));
            }
            *pos = end + CRLF.len();
            Ok(Some(Reply::Bulk(Some(buf[after_line..end].to_vec()))))
        }
        b'*' => {
            let count = parse_int(line_text)?;
            if count == -1 {
                *pos = after_line;
                return Ok(Some(Reply::Array(None)));
            }
            let count = checked_len(count, MAX_ARRAY_LEN, "array")?;
            let mut cursor = after_line;
            let mut items = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                match parse_frame(buf, &mut cursor, depth + 1)? {
                    Some(item) => items.push(item),
                    None => return Ok(None),
                }
            }
            *pos = cursor;
            Ok(Some(Reply::Array(Some(items))))
        }
        other => Err(LuaKvError::Protocol(format!(
            "unknown frame type byte: 0x{:02x}",
            other
        ))),
    }
}

/// Index of the `\r` ending the line that starts at `start`
fn find_line(buf: &[u8], start: usize) -> Option<usize> {
    if start > buf.len() {
        return None;
    }
    buf[start..]
        .windows(2)
        .position(|w| w == CRLF)
        .map(|offset| start + offset)
}

fn parse_int(text: &[u8]) -> Result<i64> {
    std::str::from_utf8(text)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or_else(|| {
            LuaKvError::Protocol(format!(
                "invalid integer: {:?}",
                String::from_utf8_lossy(text)
            ))
        })
}

fn checked_len(len: i64, max: usize, what: &str) -> Result<usize> {
    if len < 0 || len as u64 > max as u64 {
        return Err(LuaKvError::Protocol(format!(
            "invalid {} length: {} (max {})",
            what, len, max
        )));
    }
    Ok(len as usize)
}

fn put_header(buf: &mut Vec<u8>, prefix: u8, n: i64) {
    buf.put_u8(prefix);
    buf.put_slice(n.to_string().as_bytes());
    buf.put_slice(CRLF);
}

fn put_line(buf: &mut Vec<u8>, prefix: u8, text: &[u8]) {
    buf.put_u8(prefix);
    // status and error lines cannot carry line breaks
    buf.extend(text.iter().map(|&b| if b == b'\r' || b == b'\n' { b' ' } else { b }));
    buf.put_slice(CRLF);
}

fn put_bulk(buf: &mut Vec<u8>, data: &[u8]) {
    put_header(buf, b'$', data.len() as i64);
    buf.put_slice(data);
    buf.put_slice(CRLF);
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

fn read_frame<R: BufRead>(reader: &mut R, depth: usize) -> Result<Reply> {
    if depth > MAX_NESTING_DEPTH {
        return Err(LuaKvError::Protocol("maximum nesting depth exceeded".to_string()));
    }

    let line = read_line(reader)?;
    let (&type_byte, text) = line
        .split_first()
        .ok_or_else(|| LuaKvError::Protocol("empty frame line".to_string()))?;

    match type_byte {
        b'+' => Ok(Reply::Status(String::from_utf8_lossy(text).into_owned())),
        b'-' => Ok(Reply::Error(String::from_utf8_lossy(text).into_owned())),
        b':' => Ok(Reply::Integer(parse_int(text)?)),
        b'$' => {
            let len = parse_int(text)?;
            if len == -1 {
                return Ok(Reply::Bulk(None));
            }
            let len = checked_len(len, MAX_BULK_SIZE, "bulk string")?;
            let mut data = vec![0u8; len + CRLF.len()];
            reader.read_exact(&mut data)?;
            if &data[len..] != CRLF {
                return Err(LuaKvError::Protocol("bulk string missing CRLF".to_string()));
            }
            data.truncate(len);
            Ok(Reply::Bulk(Some(data)))
        }
        b'*' => {
            let count = parse_int(text)?;
            if count == -1 {
                return Ok(Reply::Array(None));
            }
            let count = checked_len(count, MAX_ARRAY_LEN, "array")?;
            let mut items = Vec::with_capacity(count.min(1024));
            for _ in 0..count {
                items.push(read_frame(reader, depth + 1)?);
            }
            Ok(Reply::Array(Some(items)))
        }
        other => Err(LuaKvError::Protocol(format!(
            "unknown frame type byte: 0x{:02x}",
            other
        ))),
    }
}

/// Read one CRLF-terminated line, without the terminator
fn read_line<R: BufRead>(reader: &mut R) -> Result<Vec<u8>> {
    let mut line = Vec::new();
    let n = reader.read_until(b'\n', &mut line)?;
    if n == 0 {
        return Err(LuaKvError::Io(std::io::Error::from(
            std::io::ErrorKind::UnexpectedEof,
        )));
    }
    if !line.ends_with(CRLF) {
        return Err(LuaKvError::Protocol("line not terminated by CRLF".to_string()));
    }
    line.truncate(line.len() - CRLF.len());
    Ok(line)
}

/// Read a complete command from a stream
///
/// Blocks until a complete frame is received or an error occurs
pub fn read_command<R: BufRead>(reader: &mut R) -> Result<Command> {
    let frame = read_frame(reader, 0)?;
    command_from_frame(frame)
}

/// Write a reply to a stream
pub fn write_reply<W: Write>(writer: &mut W, reply: &Reply) -> Result<()> {
    let bytes = encode_reply(reply);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
