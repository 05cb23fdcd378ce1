//! Procedure Module
//!
//! Server-side Lua procedures and the per-client handle cache.
//!
//! ## Invocation
//! ```text
//! Client ──► ProcedureRegistry::invoke(procedure, keys, args)
//!               │
//!               ├─ cached handle?  no ──► SCRIPT LOAD <source> ──► cache digest
//!               │
//!               └─ EVALSHA <digest> <numkeys> keys... args...
//!                     │
//!                     └─ NOSCRIPT ──► LuaKvError::StaleProcedure
//! ```

mod catalog;
mod registry;

pub use catalog::Procedure;
pub use registry::{load_source, ProcedureRegistry};
