//! Codec Tests
//!
//! Tests for RESP command and reply encoding/decoding.

use std::io::Cursor;

use luakv::protocol::{
    decode_command, decode_reply, encode_command, encode_reply, read_command, write_reply,
    Command, Reply,
};

// =============================================================================
// Command Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_command_layout() {
    let cmd = Command::new("GET").arg("hello");
    assert_eq!(encode_command(&cmd), b"*2\r\n$3\r\nGET\r\n$5\r\nhello\r\n");
}

#[test]
fn test_encode_decode_command() {
    let cmd = Command::new("EVALSHA").arg("abc").arg("1").arg("key").arg("");
    let encoded = encode_command(&cmd);
    let (decoded, consumed) = decode_command(&encoded).unwrap().unwrap();

    assert_eq!(decoded, cmd);
    assert_eq!(consumed, encoded.len());
    assert_eq!(decoded.arguments()[3], b"");
}

#[test]
fn test_binary_safe_arguments() {
    let cmd = Command::new("SET").arg("k").arg(b"a\r\nb\x00c");
    let encoded = encode_command(&cmd);
    let (decoded, _) = decode_command(&encoded).unwrap().unwrap();
    assert_eq!(decoded.arguments()[1], b"a\r\nb\x00c");
}

#[test]
fn test_decode_command_rejects_non_array() {
    assert!(decode_command(b"+PING\r\n").is_err());
    assert!(decode_command(b"*0\r\n").is_err());
    assert!(decode_command(b"*1\r\n:5\r\n").is_err());
}

#[test]
fn test_decode_command_incomplete() {
    let encoded = encode_command(&Command::new("PING"));
    assert!(decode_command(&encoded[..encoded.len() - 1]).unwrap().is_none());
}

// =============================================================================
// Reply Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_reply_kinds() {
    assert_eq!(encode_reply(&Reply::ok()), b"+OK\r\n");
    assert_eq!(encode_reply(&Reply::error("ERR x")), b"-ERR x\r\n");
    assert_eq!(encode_reply(&Reply::Integer(-3)), b":-3\r\n");
    assert_eq!(encode_reply(&Reply::nil()), b"$-1\r\n");
    assert_eq!(encode_reply(&Reply::Array(None)), b"*-1\r\n");
    assert_eq!(encode_reply(&Reply::bulk("")), b"$0\r\n\r\n");
}

#[test]
fn test_decode_nested_array() {
    let reply = Reply::Array(Some(vec![
        Reply::bulk("a"),
        Reply::nil(),
        Reply::Integer(7),
        Reply::Array(Some(vec![Reply::Status("OK".into())])),
    ]));
    let encoded = encode_reply(&reply);
    let (decoded, consumed) = decode_reply(&encoded).unwrap().unwrap();
    assert_eq!(decoded, reply);
    assert_eq!(consumed, encoded.len());
}

#[test]
fn test_decode_two_frames_back_to_back() {
    let mut buf = encode_reply(&Reply::Integer(1));
    buf.extend(encode_reply(&Reply::bulk("next")));

    let (first, used) = decode_reply(&buf).unwrap().unwrap();
    assert_eq!(first, Reply::Integer(1));
    let (second, _) = decode_reply(&buf[used..]).unwrap().unwrap();
    assert_eq!(second, Reply::bulk("next"));
}

#[test]
fn test_decode_rejects_garbage() {
    assert!(decode_reply(b"?what\r\n").is_err());
    assert!(decode_reply(b":12x\r\n").is_err());
    assert!(decode_reply(b"$3\r\nabcd\r\n").is_err());
}

#[test]
fn test_nesting_limit() {
    let mut buf = Vec::new();
    for _ in 0..40 {
        buf.extend_from_slice(b"*1\r\n");
    }
    buf.extend_from_slice(b":1\r\n");
    assert!(decode_reply(&buf).is_err());
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_reads_pipelined_commands() {
    let first = Command::new("RPUSH").args(["list", "a", "b"]);
    let second = Command::new("PING");
    let mut buf = encode_command(&first);
    buf.extend(encode_command(&second));

    let mut cursor = Cursor::new(buf);
    assert_eq!(read_command(&mut cursor).unwrap(), first);
    assert_eq!(read_command(&mut cursor).unwrap(), second);
}

#[test]
fn test_stream_reply_writes_whole_frames() {
    let replies = vec![
        Reply::ok(),
        Reply::bulk_array(["x", "y"]),
        Reply::error("NOSCRIPT No matching script"),
        Reply::nil(),
    ];
    let mut buf = Vec::new();
    for reply in &replies {
        write_reply(&mut buf, reply).unwrap();
    }

    let mut rest = buf.as_slice();
    for reply in replies {
        let (decoded, used) = decode_reply(rest).unwrap().unwrap();
        assert_eq!(decoded, reply);
        rest = &rest[used..];
    }
    assert!(rest.is_empty());
}

#[test]
fn test_stream_eof_is_io_error() {
    let mut cursor = Cursor::new(Vec::new());
    let err = read_command(&mut cursor).unwrap_err();
    assert!(matches!(err, luakv::LuaKvError::Io(ref e) if e.kind() == std::io::ErrorKind::UnexpectedEof));
}

#[test]
fn test_stream_truncated_bulk() {
    let mut cursor = Cursor::new(b"*1\r\n$10\r\nabc".to_vec());
    assert!(read_command(&mut cursor).is_err());
}
