//! Client-originated requests and correlation id allocation

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::envelope::{kind, Envelope};

/// Correlation id linking a request to its eventual reply.
///
/// Unique within one client session, monotonically assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Allocates request ids for one client session
#[derive(Debug)]
pub struct RequestIdAllocator {
    next: AtomicU64,
}

impl RequestIdAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Allocate the next id
    pub fn allocate(&self) -> RequestId {
        RequestId(format!("req-{}", self.next.fetch_add(1, Ordering::SeqCst)))
    }
}

impl Default for RequestIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// A request the client can issue to the orchestration server.
///
/// Every request expects at most one reply; the client originates no
/// fire-and-forget messages.
#[derive(Debug, Clone)]
pub enum Request {
    /// Upload a configuration; a valid one becomes the server's current config
    ConfigUpload { config_yaml: String },

    /// Validate a configuration without storing it
    ConfigParse { config_yaml: String },

    /// Replace the server's current configuration
    ConfigUpdate { config_yaml: String },

    /// Diff a candidate configuration against the server's current one
    ConfigDiff { new_config_yaml: String },

    /// Start workspace initialization (repository cloning/updating)
    InitStart,

    /// List all services defined in the current configuration
    ServiceList,

    /// Start a service by name
    ServiceStart { service_name: String },

    /// Stop a service by name
    ServiceStop { service_name: String },

    /// Fetch runtime status for all services
    ServiceStatus,

    /// Fetch recent log lines for a service
    ServiceLogs {
        service_name: String,
        follow: bool,
        tail: u32,
    },
}

impl Request {
    /// Wire kind string for this request
    pub fn kind(&self) -> &'static str {
        match self {
            Request::ConfigUpload { .. } => kind::CONFIG_UPLOAD,
            Request::ConfigParse { .. } => kind::CONFIG_PARSE,
            Request::ConfigUpdate { .. } => kind::CONFIG_UPDATE,
            Request::ConfigDiff { .. } => kind::CONFIG_DIFF,
            Request::InitStart => kind::INIT_START,
            Request::ServiceList => kind::SERVICE_LIST,
            Request::ServiceStart { .. } => kind::SERVICE_START,
            Request::ServiceStop { .. } => kind::SERVICE_STOP,
            Request::ServiceStatus => kind::SERVICE_STATUS,
            Request::ServiceLogs { .. } => kind::SERVICE_LOGS,
        }
    }

    /// Wire payload for this request
    pub fn payload(&self) -> Value {
        match self {
            Request::ConfigUpload { config_yaml }
            | Request::ConfigParse { config_yaml }
            | Request::ConfigUpdate { config_yaml } => json!({ "config_yaml": config_yaml }),
            Request::ConfigDiff { new_config_yaml } => {
                json!({ "new_config_yaml": new_config_yaml })
            }
            Request::InitStart | Request::ServiceList | Request::ServiceStatus => json!({}),
            Request::ServiceStart { service_name } | Request::ServiceStop { service_name } => {
                json!({ "service_name": service_name })
            }
            Request::ServiceLogs {
                service_name,
                follow,
                tail,
            } => json!({ "service_name": service_name, "follow": follow, "tail": tail }),
        }
    }

    /// Build the wire envelope carrying this request
    pub fn into_envelope(self, id: RequestId) -> Envelope {
        Envelope {
            kind: self.kind().to_string(),
            id: Some(id),
            payload: self.payload(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_allocation_is_monotonic() {
        let ids = RequestIdAllocator::new();
        assert_eq!(ids.allocate().as_str(), "req-1");
        assert_eq!(ids.allocate().as_str(), "req-2");
        assert_eq!(ids.allocate().as_str(), "req-3");
    }

    #[test]
    fn test_request_payload_shapes() {
        let upload = Request::ConfigUpload {
            config_yaml: "workspace: /tmp".to_string(),
        };
        assert_eq!(upload.kind(), "config.upload");
        assert_eq!(upload.payload()["config_yaml"], "workspace: /tmp");

        let start = Request::ServiceStart {
            service_name: "backend".to_string(),
        };
        assert_eq!(start.kind(), "service.start");
        assert_eq!(start.payload()["service_name"], "backend");

        let logs = Request::ServiceLogs {
            service_name: "backend".to_string(),
            follow: false,
            tail: 50,
        };
        assert_eq!(logs.payload()["tail"], 50);
        assert_eq!(logs.payload()["follow"], false);

        assert_eq!(Request::InitStart.payload(), json!({}));
    }

    #[test]
    fn test_into_envelope_carries_id() {
        let envelope = Request::ServiceList.into_envelope(RequestId::new("req-9"));
        assert_eq!(envelope.kind, "service.list");
        assert_eq!(envelope.id, Some(RequestId::new("req-9")));
    }
}
