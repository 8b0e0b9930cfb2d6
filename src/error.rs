//! Error types shared across the crate.

use std::io;
use thiserror::Error;

use crate::core::session::SessionId;

/// Errors raised while building the command tree
#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("Invalid command name: {0:?}")]
    InvalidName(String),

    #[error("Duplicate command name: {0}")]
    Duplicate(String),

    #[error("{0} is a command, not a group")]
    NotAContainer(String),
}

/// Errors reported to the user when a submitted line cannot be run
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    NotFound(String),

    #[error("Incomplete command")]
    Incomplete,

    #[error("Error: {0}")]
    Failed(String),
}

/// Errors at the transport boundary
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown session: {0}")]
    UnknownSession(SessionId),
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[source] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[source] toml::ser::Error),

    #[error("Failed to write config: {0}")]
    Write(#[source] io::Error),

    #[error("Could not determine config path")]
    NoPath,
}
