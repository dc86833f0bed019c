//! Protocol error types

use thiserror::Error;

/// Errors that can occur while encoding or decoding wire frames
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Inbound frame is not a conforming envelope
    #[error("Malformed frame: {0}")]
    MalformedFrame(#[source] serde_json::Error),

    /// Envelope payload does not match the shape its kind requires
    #[error("Invalid payload for '{kind}': {source}")]
    InvalidPayload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// Outbound envelope failed to serialize
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
