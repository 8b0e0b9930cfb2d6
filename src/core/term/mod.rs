//! Terminal input handling: the key decoder and the editable line.

pub mod decoder;
pub mod line;

pub use decoder::{DecoderState, Key, KeyDecoder};
pub use line::LineBuffer;
