//! Protocol Module
//!
//! RESP2 (REdis Serialization Protocol) as spoken by Redis-compatible stores.
//! `Command` and `Reply` are the request and response types on both sides;
//! the codec is what `network::Server` frames them with.
//!
//! ## Frame Types
//! ```text
//! ┌──────┬──────────────────┬────────────────────────────────────┐
//! │ Byte │ Type             │ Example                            │
//! ├──────┼──────────────────┼────────────────────────────────────┤
//! │  +   │ Status           │ +OK\r\n                            │
//! │  -   │ Error            │ -ERR unknown command\r\n           │
//! │  :   │ Integer          │ :1000\r\n                          │
//! │  $   │ Bulk string      │ $5\r\nhello\r\n   ($-1 = nil)      │
//! │  *   │ Array            │ *2\r\n$1\r\na\r\n$1\r\nb\r\n (*-1) │
//! └──────┴──────────────────┴────────────────────────────────────┘
//! ```
//!
//! ### Requests
//! A command is always an array of bulk strings: `*3 $3 SET $1 k $1 v`.

mod command;
mod reply;
mod codec;

pub use command::Command;
pub use reply::Reply;
pub use codec::{
    encode_command, decode_command, encode_reply, decode_reply,
    read_command, write_reply,
    MAX_BULK_SIZE, MAX_ARRAY_LEN, MAX_NESTING_DEPTH,
};
