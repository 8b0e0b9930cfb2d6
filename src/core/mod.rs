//! Core session engine components.
//!
//! - **term**: key decoder and editable input line
//! - **session**: per-connection state and output sink
//! - **terminal**: the engine turning keys into edits, recalls and commands
//! - **registry**: session bookkeeping at the transport boundary
//!
//! # Architecture
//!
//! ```text
//! SessionRegistry
//! ├── Terminal (shared CommandTree + settings)
//! └── Session (one per connection)
//!     ├── KeyDecoder (bytes -> keys)
//!     ├── LineBuffer (text + cursor, redraw bytes)
//!     ├── CommandHistory (recall ring)
//!     └── OutputSink (bytes back to the client)
//! ```

pub mod term;
pub mod session;
pub mod terminal;
pub mod registry;

pub use registry::{SessionRegistry, SessionStatus};
pub use session::{CaptureSink, EngineState, OutputSink, Session, SessionId, SessionOptions};
pub use terminal::{Terminal, TerminalSettings};
