//! # luakv
//!
//! A typed client for Redis-compatible stores:
//! - Round-trips integers, floats, booleans, strings and collections of them
//! - Multi-step operations run atomically as server-side Lua procedures
//! - Lenient type conversion on the way back (never fails, falls back to text)
//! - Pooled blocking connections with timeouts
//! - An in-memory store and RESP server for tests and local use
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Client                                │
//! │        (set / get / delete / rename / mass ops / TTL)        │
//! └──────────┬──────────────────────────────────┬───────────────┘
//!            │                                  │
//!            ▼                                  ▼
//!   ┌─────────────────┐                ┌─────────────────┐
//!   │   Procedure     │                │  TypeConverter  │
//!   │   Registry      │                │    (convert)    │
//!   └────────┬────────┘                └─────────────────┘
//!            │ SCRIPT LOAD / EVALSHA
//!            ▼
//!   ┌─────────────────┐   RESP2/TCP    ┌─────────────────┐
//!   │ ConnectionPool  │ ── redis-rs ─► │  Redis / Server │
//!   │  (r2d2)         │ ── in-proc ──► │  MemoryStore    │
//!   └─────────────────┘                └─────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;
pub mod value;

pub mod convert;
pub mod procedure;
pub mod protocol;
pub mod network;
pub mod store;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LuaKvError, Result};
pub use config::Config;
pub use value::{Data, Scalar};
pub use convert::convert;
pub use client::{Client, MassDeleteOptions, MassDeleteOutcome, SetOptions};
pub use store::MemoryStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of luakv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
