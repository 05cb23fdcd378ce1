//! TCP Server
//!
//! Accepts connections and runs one session thread per client.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{LuaKvError, Result};
use crate::store::MemoryStore;

use super::Session;

/// How often the accept loop checks for shutdown
const ACCEPT_POLL: Duration = Duration::from_millis(20);

/// TCP server for a `MemoryStore`
pub struct Server {
    listener: TcpListener,
    local_addr: SocketAddr,
    store: MemoryStore,
    shutdown: Arc<AtomicBool>,

    /// Open client streams, closed on shutdown to unblock their sessions
    sessions: Arc<Mutex<HashMap<u64, TcpStream>>>,
    next_session: AtomicU64,
}

impl Server {
    /// Bind a listener; port 0 picks a free port
    pub fn bind(addr: impl ToSocketAddrs, store: MemoryStore) -> Result<Self> {
        let listener = TcpListener::bind(addr)?;
        let local_addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        tracing::info!("Listening on {}", local_addr);
        Ok(Self {
            listener,
            local_addr,
            store,
            shutdown: Arc::new(AtomicBool::new(false)),
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_session: AtomicU64::new(0),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Start the server (blocking until `shutdown`)
    pub fn run(&self) -> Result<()> {
        let mut workers: Vec<JoinHandle<()>> = Vec::new();

        while !self.shutdown.load(Ordering::Acquire) {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    tracing::debug!("Accepted {}", peer);
                    match self.spawn_session(stream) {
                        Ok(worker) => workers.push(worker),
                        Err(e) => tracing::warn!("Failed to start session for {}: {}", peer, e),
                    }
                    workers.retain(|w| !w.is_finished());
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        tracing::info!("Shutting down, closing {} sessions", self.sessions.lock().len());
        for stream in self.sessions.lock().values() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        for worker in workers {
            let _ = worker.join();
        }
        Ok(())
    }

    fn spawn_session(&self, stream: TcpStream) -> Result<JoinHandle<()>> {
        stream.set_nonblocking(false)?;
        let id = self.next_session.fetch_add(1, Ordering::Relaxed);
        self.sessions.lock().insert(id, stream.try_clone()?);

        let mut session = Session::new(stream, self.store.clone())?;
        let sessions = Arc::clone(&self.sessions);

        let worker = thread::Builder::new()
            .name(format!("luakv-session-{}", id))
            .spawn(move || {
                if let Err(e) = session.handle() {
                    tracing::warn!("Session {} ended with error: {}", session.peer_addr(), e);
                }
                sessions.lock().remove(&id);
            })?;
        Ok(worker)
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Run on a background thread
    pub fn spawn(self) -> Result<ServerHandle> {
        let local_addr = self.local_addr;
        let shutdown = Arc::clone(&self.shutdown);
        let thread = thread::Builder::new()
            .name("luakv-acceptor".to_string())
            .spawn(move || self.run())?;

        Ok(ServerHandle {
            local_addr,
            shutdown,
            thread: Some(thread),
        })
    }
}

/// A server running on a background thread; stops when dropped
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting, close every session and wait for the acceptor
    pub fn stop(mut self) -> Result<()> {
        self.stop_inner()
    }

    fn stop_inner(&mut self) -> Result<()> {
        self.shutdown.store(true, Ordering::Release);
        match self.thread.take() {
            Some(thread) => thread
                .join()
                .map_err(|_| LuaKvError::Connection("server thread panicked".to_string()))?,
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop_inner() {
            tracing::warn!("Server stopped with error: {}", e);
        }
    }
}
