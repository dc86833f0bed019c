//! Typed payload shapes for server replies and pushes

use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime state of a managed service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Stopped,
    Starting,
    Running,
    Failed,
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::Stopped
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Stopped => "stopped",
            ServiceState::Starting => "starting",
            ServiceState::Running => "running",
            ServiceState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One service as reported by the server.
///
/// Everything but the name is optional: the same shape serves the wholesale
/// `service.list` reply and the partial per-name records in a
/// `service.status` reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRecord {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_command: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceRecord {
    /// A partial record carrying only a status change for `name`
    pub fn status_only(name: impl Into<String>, status: ServiceState) -> Self {
        Self {
            name: name.into(),
            status: Some(status),
            repository: None,
            run_command: None,
            pid: None,
            uptime_seconds: None,
            error: None,
        }
    }
}

/// Reply payload for `service.list` and `service.status`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceListPayload {
    #[serde(default)]
    pub services: Vec<ServiceRecord>,
}

/// Summary of a validated configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSummary {
    pub valid: bool,
    #[serde(default)]
    pub repositories: usize,
    #[serde(default)]
    pub services: usize,
    #[serde(default)]
    pub workspace_dir: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Reply payload for `config.diff`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigDiffPayload {
    pub has_changes: bool,
    #[serde(default)]
    pub added_repos: Vec<String>,
    #[serde(default)]
    pub removed_repos: Vec<String>,
    #[serde(default)]
    pub modified_repos: Vec<String>,
    #[serde(default)]
    pub added_services: Vec<String>,
    #[serde(default)]
    pub removed_services: Vec<String>,
    #[serde(default)]
    pub modified_services: Vec<String>,
}

/// Push payload for `service.log`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceLogPayload {
    pub service_name: String,
    /// Server-supplied wall-clock timestamp, stored verbatim
    #[serde(default)]
    pub timestamp: String,
    pub line: String,
    /// "stdout" or "stderr"
    #[serde(default)]
    pub stream: String,
}

/// Push payload for `service.started` and `service.stopped`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceEventPayload {
    pub service_name: String,
}

/// Push payload for `init.progress`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitProgressPayload {
    pub repo_name: String,
    #[serde(default)]
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_line: Option<String>,
}

/// Per-repository outcome inside an `init.complete` push
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSummary {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Push payload for `init.complete`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitCompletePayload {
    pub success: u32,
    pub failed: u32,
    #[serde(default)]
    pub total_time_seconds: f64,
    #[serde(default)]
    pub repositories: Vec<RepoSummary>,
}

/// Payload of an `error` reply or push
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// Payload of a generic `success` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessPayload {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_state_wire_names() {
        assert_eq!(
            serde_json::to_string(&ServiceState::Running).unwrap(),
            "\"running\""
        );
        let state: ServiceState = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(state, ServiceState::Failed);
    }

    #[test]
    fn test_partial_service_record() {
        // A status update carries only name + status + pid
        let record: ServiceRecord =
            serde_json::from_str(r#"{"name":"backend","status":"running","pid":4242}"#).unwrap();
        assert_eq!(record.status, Some(ServiceState::Running));
        assert_eq!(record.pid, Some(4242));
        assert!(record.repository.is_none());
        assert!(record.run_command.is_none());
    }

    #[test]
    fn test_config_summary_with_errors() {
        let summary: ConfigSummary = serde_json::from_str(
            r#"{"valid":false,"repositories":0,"services":0,"workspace_dir":"","errors":["bad yaml"]}"#,
        )
        .unwrap();
        assert!(!summary.valid);
        assert_eq!(summary.errors, vec!["bad yaml".to_string()]);
    }

    #[test]
    fn test_init_complete_defaults() {
        let payload: InitCompletePayload =
            serde_json::from_str(r#"{"success":3,"failed":1,"total_time_seconds":12.4}"#).unwrap();
        assert_eq!(payload.success, 3);
        assert_eq!(payload.failed, 1);
        assert!(payload.repositories.is_empty());
    }
}
