//! Command arguments

use std::ops::Deref;

/// Whitespace-separated tokens of a submitted line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Args(Vec<String>);

impl Args {
    /// Split a line on whitespace
    pub fn tokenize(line: &str) -> Self {
        Self(line.split_whitespace().map(str::to_string).collect())
    }

    /// Join the tokens back with single spaces
    pub fn joined(&self) -> String {
        self.0.join(" ")
    }
}

impl From<Vec<String>> for Args {
    fn from(tokens: Vec<String>) -> Self {
        Self(tokens)
    }
}

impl Deref for Args {
    type Target = [String];

    fn deref(&self) -> &[String] {
        &self.0
    }
}
