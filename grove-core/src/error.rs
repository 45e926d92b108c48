//! Error types for configuration loading, the host message protocol and
//! starting the simulation thread.
//!
//! Nothing on the per-tick path returns these: a running simulation skips
//! bad input instead of failing.

use thiserror::Error;

/// Errors raised while loading or validating a [`crate::config::Config`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(String),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised while decoding or encoding host messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid canvas size {width}x{height}")]
    InvalidSize { width: f32, height: f32 },
}

/// Top-level error for setting up a simulation.
#[derive(Error, Debug)]
pub enum GroveError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error("failed to start simulation thread: {0}")]
    Thread(#[source] std::io::Error),
}
