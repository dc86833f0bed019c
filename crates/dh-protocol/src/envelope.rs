//! Wire envelope and JSON codec

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ProtocolError;
use crate::request::RequestId;

/// Message kind strings for both directions.
pub mod kind {
    // Client -> server requests
    pub const CONFIG_UPLOAD: &str = "config.upload";
    pub const CONFIG_PARSE: &str = "config.parse";
    pub const CONFIG_UPDATE: &str = "config.update";
    pub const CONFIG_DIFF: &str = "config.diff";
    pub const INIT_START: &str = "init.start";
    pub const SERVICE_LIST: &str = "service.list";
    pub const SERVICE_START: &str = "service.start";
    pub const SERVICE_STOP: &str = "service.stop";
    pub const SERVICE_STATUS: &str = "service.status";
    pub const SERVICE_LOGS: &str = "service.logs";

    // Server -> client replies
    pub const SUCCESS: &str = "success";
    pub const ERROR: &str = "error";

    // Server -> client pushes
    pub const INIT_PROGRESS: &str = "init.progress";
    pub const INIT_COMPLETE: &str = "init.complete";
    pub const INIT_ERROR: &str = "init.error";
    pub const SERVICE_LOG: &str = "service.log";
    pub const SERVICE_STARTED: &str = "service.started";
    pub const SERVICE_STOPPED: &str = "service.stopped";
    pub const SERVICE_ERROR: &str = "service.error";
}

/// The structured unit exchanged over the connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Message kind (see [`kind`])
    #[serde(rename = "type")]
    pub kind: String,

    /// Correlation id, present on requests and echoed on their reply;
    /// absent on unsolicited pushes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,

    /// Kind-specific payload
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    /// Create a push-style envelope (no correlation id)
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            id: None,
            payload,
        }
    }

    /// Whether this is a `success` reply
    pub fn is_success(&self) -> bool {
        self.kind == kind::SUCCESS
    }

    /// Whether this is an `error` reply
    pub fn is_error(&self) -> bool {
        self.kind == kind::ERROR
    }

    /// Deserialize the payload into a typed shape
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, ProtocolError> {
        serde_json::from_value(self.payload.clone()).map_err(|source| {
            ProtocolError::InvalidPayload {
                kind: self.kind.clone(),
                source,
            }
        })
    }
}

/// Serialize an envelope to a text frame
pub fn encode(envelope: &Envelope) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(envelope)?)
}

/// Deserialize a text frame into an envelope.
///
/// A non-conforming frame yields an error the caller is expected to log and
/// drop; it must never tear down the connection.
pub fn decode(frame: &str) -> Result<Envelope, ProtocolError> {
    serde_json::from_str(frame).map_err(ProtocolError::MalformedFrame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_request_includes_id() {
        let envelope = Envelope {
            kind: kind::SERVICE_START.to_string(),
            id: Some(RequestId::new("req-1")),
            payload: json!({"service_name": "backend"}),
        };

        let frame = encode(&envelope).unwrap();
        let value: Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value["type"], "service.start");
        assert_eq!(value["id"], "req-1");
        assert_eq!(value["payload"]["service_name"], "backend");
    }

    #[test]
    fn test_encode_push_omits_id() {
        let envelope = Envelope::new(kind::SERVICE_LIST, json!({}));
        let frame = encode(&envelope).unwrap();
        assert!(!frame.contains("\"id\""));
    }

    #[test]
    fn test_decode_reply_roundtrip() {
        let frame = r#"{"type":"success","id":"req-3","payload":{"message":"ok"}}"#;
        let envelope = decode(frame).unwrap();
        assert!(envelope.is_success());
        assert_eq!(envelope.id, Some(RequestId::new("req-3")));
        assert_eq!(envelope.payload["message"], "ok");
    }

    #[test]
    fn test_decode_push_without_payload() {
        // Payload defaults to null when the server omits it
        let envelope = decode(r#"{"type":"service.started"}"#).unwrap();
        assert_eq!(envelope.kind, kind::SERVICE_STARTED);
        assert!(envelope.id.is_none());
        assert!(envelope.payload.is_null());
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        assert!(matches!(
            decode("not json at all"),
            Err(ProtocolError::MalformedFrame(_))
        ));
        // Valid JSON, but not an envelope
        assert!(decode(r#"[1,2,3]"#).is_err());
        assert!(decode(r#"{"payload":{}}"#).is_err());
    }

    #[test]
    fn test_parse_payload_mismatch() {
        let envelope = decode(r#"{"type":"service.log","payload":{"line":42}}"#).unwrap();
        let result = envelope.parse_payload::<crate::payload::ServiceLogPayload>();
        assert!(matches!(
            result,
            Err(ProtocolError::InvalidPayload { ref kind, .. }) if kind == "service.log"
        ));
    }
}
