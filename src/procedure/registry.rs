//! Procedure registry
//!
//! Loads procedures into the store on first use and remembers the handle
//! the store assigned. Each client owns its own registry.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{LuaKvError, Result};
use crate::network::Transport;
use crate::protocol::{Command, Reply};

use super::Procedure;

/// Source text of a procedure by catalog name
pub fn load_source(name: &str) -> Result<&'static str> {
    Procedure::from_name(name)
        .map(Procedure::source)
        .ok_or_else(|| LuaKvError::UnknownProcedure(name.to_string()))
}

/// Per-client cache of procedure handles
#[derive(Debug, Default)]
pub struct ProcedureRegistry {
    handles: RwLock<HashMap<Procedure, String>>,
}

impl ProcedureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached handle, if the procedure was registered through this registry
    pub fn cached(&self, procedure: Procedure) -> Option<String> {
        self.handles.read().get(&procedure).cloned()
    }

    /// Cached handle, registering the procedure with `SCRIPT LOAD` first if needed
    pub fn handle(&self, transport: &mut dyn Transport, procedure: Procedure) -> Result<String> {
        if let Some(handle) = self.cached(procedure) {
            return Ok(handle);
        }

        let load = Command::new("SCRIPT").arg("LOAD").arg(procedure.source());
        let handle = transport.request(&load)?.into_result()?.into_string()?;

        tracing::debug!("Registered procedure {} as {}", procedure, handle);
        self.handles.write().insert(procedure, handle.clone());
        Ok(handle)
    }

    /// Run a procedure with `EVALSHA`
    ///
    /// Error replies become `Err`. `NOSCRIPT` means the store dropped its
    /// script cache after this registry learned the handle; it surfaces as
    /// `StaleProcedure` and is not retried.
    pub fn invoke<K, A>(
        &self,
        transport: &mut dyn Transport,
        procedure: Procedure,
        keys: &[K],
        args: &[A],
    ) -> Result<Reply>
    where
        K: AsRef<[u8]>,
        A: AsRef<[u8]>,
    {
        let handle = self.handle(transport, procedure)?;

        let command = Command::new("EVALSHA")
            .arg(&handle)
            .arg(keys.len().to_string())
            .args(keys)
            .args(args);

        tracing::trace!("Invoking {} ({} keys, {} args)", procedure, keys.len(), args.len());
        match transport.request(&command)? {
            Reply::Error(message) if message.starts_with("NOSCRIPT") => {
                tracing::warn!("Procedure {} ({}) vanished from the store", procedure, handle);
                Err(LuaKvError::StaleProcedure {
                    name: procedure.name().to_string(),
                })
            }
            reply => reply.into_result(),
        }
    }

    /// Drop every cached handle
    pub fn forget_all(&self) {
        self.handles.write().clear();
    }

    /// Number of cached handles
    pub fn len(&self) -> usize {
        self.handles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.read().is_empty()
    }
}
