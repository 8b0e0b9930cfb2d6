//! vtyterm - line editing and command dispatch for vty-style shells
//!
//! The engine behind a network appliance management CLI: it decodes the
//! raw bytes of a client connection into keys, keeps an editable line with
//! history, and resolves submitted lines against a tree of commands.
//!
//! The transport is not part of the engine. A reactor opens sessions on a
//! [`SessionRegistry`], hands it received bytes and closes sessions when
//! their connection goes away; everything the engine wants the client to see
//! goes through the session's [`OutputSink`].
//!
//! ```text
//! bytes -> KeyDecoder -> Key -> Terminal -> LineBuffer / CommandHistory
//!                                  │
//!                         Enter    └-> CommandTree::resolve -> Leaf action
//! ```

pub mod cmd;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod history;
pub mod net;
pub mod ui;

pub use crate::cmd::{Args, CommandTree};
pub use crate::core::{OutputSink, Session, SessionId, SessionRegistry, SessionStatus, Terminal, TerminalSettings};
pub use crate::error::{CommandError, RegistryError, TreeError};
