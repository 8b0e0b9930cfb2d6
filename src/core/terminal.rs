//! Terminal engine
//!
//! Drives a [`Session`] from decoded keys: edits go to the line buffer,
//! up/down walk the history, tab completes against the command tree and
//! enter resolves and runs the typed command.

use tracing::{debug, warn};

use super::session::{EngineState, OutputSink, Session, SessionId, SessionOptions};
use super::term::Key;
use crate::cmd::{Args, CommandTree, Completion, Container, Resolution};
use crate::error::CommandError;
use crate::history::HISTORY_LIMIT;

/// Settings shared by every session of a terminal
#[derive(Debug, Clone)]
pub struct TerminalSettings {
    /// Prompt prefix
    pub hostname: String,
    /// Printed once when a session starts
    pub banner: Option<String>,
    /// Echo for new sessions
    pub echo: bool,
    /// History capacity for new sessions
    pub history_size: usize,
}

impl Default for TerminalSettings {
    fn default() -> Self {
        Self {
            hostname: "vty".to_string(),
            banner: None,
            echo: true,
            history_size: HISTORY_LIMIT,
        }
    }
}

/// The line-editing and dispatch engine
pub struct Terminal {
    tree: CommandTree,
    settings: TerminalSettings,
}

impl Terminal {
    pub fn new(tree: CommandTree, settings: TerminalSettings) -> Self {
        Self { tree, settings }
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    pub fn settings(&self) -> &TerminalSettings {
        &self.settings
    }

    /// Build a session configured from the terminal settings
    pub fn new_session(&self, id: SessionId, sink: Box<dyn OutputSink>) -> Session {
        let mut options = SessionOptions::empty();
        options.set(SessionOptions::ECHO, self.settings.echo);
        Session::new(id, sink)
            .with_options(options)
            .with_history_capacity(self.settings.history_size)
    }

    /// Greet a freshly opened session
    pub fn start(&self, session: &mut Session) {
        if let Some(banner) = &self.settings.banner {
            session.write_line(banner);
        }
        self.print_prompt(session);
    }

    /// Prompt for the session's current mode, e.g. `router(configure)> `
    pub fn prompt(&self, session: &Session) -> String {
        if session.position().is_empty() {
            format!("{}> ", self.settings.hostname)
        } else {
            format!("{}({})> ", self.settings.hostname, session.position().join("-"))
        }
    }

    fn print_prompt(&self, session: &mut Session) {
        let prompt = self.prompt(session);
        session.write(&prompt);
    }

    /// Decode and process a chunk of client input
    pub fn handle_bytes(&self, session: &mut Session, bytes: &[u8]) {
        let keys = session.decoder.decode(bytes);
        for key in keys {
            if session.close_requested() {
                debug!("Session {}: dropping input after close request", session.id());
                break;
            }
            self.handle_key(session, key);
        }
    }

    /// Apply one key to the session
    pub fn handle_key(&self, session: &mut Session, key: Key) {
        let mut out = Vec::new();
        match key {
            Key::Char(ch) => session.line.insert_char(ch, &mut out),
            Key::Backspace => session.line.delete_backward(&mut out),
            Key::DeleteForward => session.line.delete_forward(&mut out),
            Key::MoveLeft => session.line.move_left(&mut out),
            Key::MoveRight => session.line.move_right(&mut out),
            Key::Home => session.line.move_home(&mut out),
            Key::End => session.line.move_end(&mut out),
            Key::MoveUp => {
                if let Some(entry) = session.history.recall_older() {
                    session.line.replace_all(entry, &mut out);
                }
            }
            Key::MoveDown => {
                if let Some(entry) = session.history.recall_newer() {
                    session.line.replace_all(entry, &mut out);
                }
            }
            Key::Tab => self.complete(session, &mut out),
            Key::Enter => {
                self.submit(session);
                return;
            }
        }
        echo(session, &out);
    }

    /// Container the session's mode points at, falling back to the root
    fn current_node(&self, session: &mut Session) -> &Container {
        match self.tree.node_at(session.position()) {
            Some(node) => node,
            None => {
                warn!(
                    "Session {}: invalid position {:?}, back to root",
                    session.id(),
                    session.position()
                );
                session.reset_position();
                self.tree.root()
            }
        }
    }

    /// Complete the word under the cursor against the current mode
    fn complete(&self, session: &mut Session, out: &mut Vec<u8>) {
        let text = session.line.text();
        let cursor = session.line.cursor();
        let word_start = text[..cursor].rfind(' ').map_or(0, |i| i + 1);
        let word_end = text[cursor..].find(' ').map_or(text.len(), |i| cursor + i);

        let mut tokens: Vec<String> = text[..word_start].split_whitespace().map(str::to_string).collect();
        tokens.push(text[word_start..word_end].to_string());
        let typed = word_end - word_start;

        let start = self.current_node(session);
        match self.tree.complete(start, &tokens) {
            Completion::Unique(name) => {
                while session.line.cursor() < word_end {
                    session.line.move_right(out);
                }
                for ch in name[typed..].chars() {
                    session.line.insert_char(ch, out);
                }
                let cursor = session.line.cursor();
                if session.line.text()[cursor..].starts_with(' ') {
                    session.line.move_right(out);
                } else {
                    session.line.insert_char(' ', out);
                }
            }
            Completion::Candidates(names) => {
                out.extend_from_slice(b"\r\n");
                out.extend_from_slice(names.join("  ").as_bytes());
                out.extend_from_slice(b"\r\n");
                out.extend_from_slice(self.prompt(session).as_bytes());
                session.line.redraw(out);
            }
            Completion::NoMatch => {}
        }
    }

    fn submit(&self, session: &mut Session) {
        if session.echo_enabled() {
            session.send(b"\r\n");
        }

        let line = session.line.text().trim().to_string();
        if !line.is_empty() {
            session.history.record(&line);
            self.dispatch(session, &line);
        }

        session.history.reset_cursor();
        session.line.clear();
        if !session.close_requested() {
            self.print_prompt(session);
        }
    }

    fn dispatch(&self, session: &mut Session, line: &str) {
        let tokens = Args::tokenize(line);
        let start = self.current_node(session);

        let result = match self.tree.resolve(start, &tokens) {
            Resolution::NoCommand => Ok(()),
            Resolution::Leaf { leaf, path, args } => {
                debug!("Session {}: running {:?} {:?}", session.id(), path, &*args);
                session.state = EngineState::Executing;
                let result = self.tree.execute(leaf, session, &args);
                session.state = EngineState::Editing;
                result
            }
            Resolution::Incomplete(_) => Err(CommandError::Incomplete),
            Resolution::NotFound(token) => Err(CommandError::NotFound(token)),
        };

        if let Err(e) = result {
            debug!("Session {}: {:?} -> {}", session.id(), line, e);
            session.write_line(&format!("% {}", e));
        }
    }
}

fn echo(session: &mut Session, out: &[u8]) {
    if session.echo_enabled() {
        session.send(out);
    }
}
