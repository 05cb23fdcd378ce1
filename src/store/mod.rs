//! Store Module
//!
//! In-memory store compatible with the command subset the client needs.
//!
//! ## Layout
//! ```text
//! MemoryStore ──► [Keyspace; 16]   (one Mutex each, lazy expiry)
//!      │
//!      └──► script cache: digest ──► Procedure ──► scripts::run
//! ```
//!
//! Used in-process through `MemoryStore::connector`, or over TCP through
//! `network::Server`.

mod keyspace;
mod memory;
mod scripts;

pub use memory::{MemoryConnector, MemoryStore, SessionState, DATABASES};
