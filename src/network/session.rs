//! Server Session
//!
//! Serves one client connection against a `MemoryStore`.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;

use crate::error::{LuaKvError, Result};
use crate::protocol::{read_command, write_reply, Command, Reply};
use crate::store::{MemoryStore, SessionState};

/// Handles a single client connection
pub struct Session {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    store: MemoryStore,

    /// Selected database and authentication for this client
    state: SessionState,

    /// Peer address for logging
    peer_addr: String,
}

impl Session {
    /// Create a new session handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, store: MemoryStore) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        let state = store.session();
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            store,
            state,
            peer_addr,
        })
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends replies.
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let command = match read_command(&mut self.reader) {
                Ok(cmd) => cmd,
                Err(LuaKvError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(LuaKvError::Io(ref e))
                    if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
                {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // Send error reply if possible
                    let _ = self.send_reply(&Reply::error(format!("ERR {}", e)));
                    return Err(e);
                }
            };

            tracing::trace!("Received {} from {}", command.name(), self.peer_addr);

            let reply = self.store.execute(&mut self.state, &command);
            let quit = is_quit(&command);

            if let Err(e) = self.send_reply(&reply) {
                // The client went away before the reply could be sent
                if let LuaKvError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) || io_err.kind() == ErrorKind::BrokenPipe {
                        tracing::debug!(
                            "Client {} disconnected before reply could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }

            if quit {
                tracing::debug!("Client {} quit", self.peer_addr);
                return Ok(());
            }
        }
    }

    fn send_reply(&mut self, reply: &Reply) -> Result<()> {
        write_reply(&mut self.writer, reply)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof | ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted
    )
}

fn is_quit(command: &Command) -> bool {
    command.name() == "QUIT"
}
