//! Session registry
//!
//! The boundary the reactor talks to: it opens a session per connection,
//! hands over received bytes and reports closed connections.

use std::collections::HashMap;

use tracing::info;

use super::session::{OutputSink, Session, SessionId};
use super::terminal::Terminal;
use crate::error::RegistryError;

/// What the reactor should do with a connection after delivering input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Open,
    /// A command asked for the connection to be closed
    CloseRequested,
}

/// Active sessions keyed by connection id
pub struct SessionRegistry {
    terminal: Terminal,
    sessions: HashMap<SessionId, Session>,
    next_id: u64,
}

impl SessionRegistry {
    pub fn new(terminal: Terminal) -> Self {
        Self {
            terminal,
            sessions: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    /// Register a new connection and greet it
    pub fn open(&mut self, sink: Box<dyn OutputSink>) -> SessionId {
        let id = SessionId(self.next_id);
        self.next_id += 1;

        let mut session = self.terminal.new_session(id, sink);
        self.terminal.start(&mut session);
        self.sessions.insert(id, session);
        info!("Session {} opened ({} active)", id, self.sessions.len());
        id
    }

    /// Feed bytes received on a connection
    pub fn deliver_bytes(&mut self, id: SessionId, bytes: &[u8]) -> Result<SessionStatus, RegistryError> {
        let session = self
            .sessions
            .get_mut(&id)
            .ok_or(RegistryError::UnknownSession(id))?;
        self.terminal.handle_bytes(session, bytes);

        if session.close_requested() {
            Ok(SessionStatus::CloseRequested)
        } else {
            Ok(SessionStatus::Open)
        }
    }

    /// Drop the state of a closed connection
    pub fn on_connection_closed(&mut self, id: SessionId) -> Result<(), RegistryError> {
        self.sessions
            .remove(&id)
            .ok_or(RegistryError::UnknownSession(id))?;
        info!("Session {} closed ({} active)", id, self.sessions.len());
        Ok(())
    }

    pub fn session(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
