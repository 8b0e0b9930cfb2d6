//! Local console input.
//!
//! - **keymapper**: crossterm key events to vty client bytes

pub mod keymapper;

pub use keymapper::{ConsoleInput, KeyMapper};
