//! Session state
//!
//! One `Session` per connected client: the line being edited, its history,
//! the position in the command tree and the sink that carries bytes back to
//! the client.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::rc::Rc;

use bitflags::bitflags;

use super::term::{KeyDecoder, LineBuffer};
use crate::history::CommandHistory;

/// Connection identifier assigned by the registry
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Per-session option flags
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SessionOptions: u8 {
        /// Echo edits back to the client
        const ECHO = 0b0001;
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        SessionOptions::ECHO
    }
}

/// What the engine is doing with the session
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EngineState {
    #[default]
    Editing,
    /// A leaf action is running
    Executing,
}

/// Where bytes for the client go.
///
/// Anything implementing `io::Write` (a socket, stdout) is a sink.
pub trait OutputSink {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;
}

impl<W: Write> OutputSink for W {
    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.write_all(bytes)?;
        self.flush()
    }
}

/// In-memory sink whose clones share one buffer
#[derive(Clone, Debug, Default)]
pub struct CaptureSink(Rc<RefCell<Vec<u8>>>);

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything written so far
    pub fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A client session
pub struct Session {
    id: SessionId,
    pub(crate) decoder: KeyDecoder,
    pub(crate) line: LineBuffer,
    pub(crate) history: CommandHistory,
    pub(crate) state: EngineState,
    options: SessionOptions,
    /// Path from the tree root to the current container
    position: Vec<String>,
    close_requested: bool,
    sink: Box<dyn OutputSink>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("line", &self.line)
            .field("state", &self.state)
            .field("options", &self.options)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session with echo on and the default history size
    pub fn new(id: SessionId, sink: Box<dyn OutputSink>) -> Self {
        Self {
            id,
            decoder: KeyDecoder::new(),
            line: LineBuffer::new(),
            history: CommandHistory::new(),
            state: EngineState::Editing,
            options: SessionOptions::default(),
            position: Vec::new(),
            close_requested: false,
            sink,
        }
    }

    pub fn with_options(mut self, options: SessionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = CommandHistory::with_capacity(capacity);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    pub fn echo_enabled(&self) -> bool {
        self.options.contains(SessionOptions::ECHO)
    }

    pub fn set_echo(&mut self, enabled: bool) {
        self.options.set(SessionOptions::ECHO, enabled);
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Line currently being edited
    pub fn line(&self) -> &LineBuffer {
        &self.line
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Current command mode as a path of container names
    pub fn position(&self) -> &[String] {
        &self.position
    }

    /// Move into a command mode; the path is checked when next used
    pub fn enter<S: AsRef<str>>(&mut self, path: &[S]) {
        self.position = path.iter().map(|s| s.as_ref().to_string()).collect();
    }

    /// Leave the current command mode. Returns false at the root.
    pub fn leave(&mut self) -> bool {
        self.position.pop().is_some()
    }

    pub(crate) fn reset_position(&mut self) {
        self.position.clear();
    }

    /// Ask the transport to close this connection
    pub fn request_close(&mut self) {
        self.close_requested = true;
    }

    pub fn close_requested(&self) -> bool {
        self.close_requested
    }

    /// Send raw bytes to the client
    pub fn send(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        if let Err(e) = self.sink.send(bytes) {
            tracing::warn!("Session {}: send failed: {}", self.id, e);
        }
    }

    pub fn write(&mut self, text: &str) {
        self.send(text.as_bytes());
    }

    /// Write text followed by CRLF, turning bare LFs into CRLF
    pub fn write_line(&mut self, text: &str) {
        let text = text.strip_suffix('\n').unwrap_or(text);
        let mut buf = String::with_capacity(text.len() + 2);
        for line in text.split('\n') {
            buf.push_str(line.strip_suffix('\r').unwrap_or(line));
            buf.push_str("\r\n");
        }
        self.send(buf.as_bytes());
    }
}
