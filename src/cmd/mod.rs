//! Command tree and argument handling.
//!
//! - **tree**: containers and leaves, resolution, completion and execution
//! - **args**: tokenized command arguments

pub mod args;
pub mod tree;

pub use args::Args;
pub use tree::{Action, CommandTree, Completion, Container, Leaf, Node, Resolution};
