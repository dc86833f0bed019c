//! Client error types

use std::path::PathBuf;

use dh_protocol::ProtocolError;
use thiserror::Error;

/// Transport-level failures
#[derive(Error, Debug)]
pub enum TransportError {
    /// Could not reach the server
    #[error("Connection failed: {0}")]
    ConnectFailed(String),

    /// An established connection dropped
    #[error("Connection lost: {0}")]
    ConnectionLost(String),

    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Session-level failures surfaced to callers of the operation surface
#[derive(Error, Debug)]
pub enum SessionError {
    /// No transport is open; the request was dropped, not queued
    #[error("Not connected to the orchestration server")]
    NotConnected,

    /// The session has been torn down
    #[error("Session driver has shut down")]
    DriverGone,

    /// Protocol error
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Transport error
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
