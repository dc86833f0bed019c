//! Session state store
//!
//! Process-wide cache of server-reported reality: connection status, the
//! service roster, the running log, and the last validated configuration
//! summary. Only the connection driver and router mutate it; presentation
//! reads cloned snapshots, never references into the store.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Local;
use serde::Serialize;

use dh_protocol::{
    ConfigSummary, InitCompletePayload, InitProgressPayload, ServiceLogPayload, ServiceRecord,
    ServiceState,
};

/// Connection status as presentation sees it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::Disconnected
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
        };
        f.write_str(s)
    }
}

/// One managed service as known to the client
#[derive(Debug, Clone, Serialize)]
pub struct Service {
    pub name: String,
    pub status: ServiceState,
    pub repository: String,
    pub run_command: String,
    /// Present only while the service is running
    pub pid: Option<u32>,
    pub uptime_seconds: Option<f64>,
    pub last_error: Option<String>,
}

impl Service {
    fn from_record(record: ServiceRecord) -> Self {
        Self {
            name: record.name,
            status: record.status.unwrap_or_default(),
            repository: record.repository.unwrap_or_default(),
            run_command: record.run_command.unwrap_or_default(),
            pid: record.pid,
            uptime_seconds: record.uptime_seconds,
            last_error: record.error,
        }
    }

    /// Overlay the fields present in a partial record. Fields the record
    /// omits are left untouched.
    fn merge(&mut self, record: &ServiceRecord) {
        if let Some(status) = record.status {
            self.status = status;
        }
        if let Some(repository) = &record.repository {
            self.repository = repository.clone();
        }
        if let Some(run_command) = &record.run_command {
            self.run_command = run_command.clone();
        }
        if let Some(pid) = record.pid {
            self.pid = Some(pid);
        }
        if let Some(uptime) = record.uptime_seconds {
            self.uptime_seconds = Some(uptime);
        }
        if let Some(error) = &record.error {
            self.last_error = Some(error.clone());
        }
    }
}

/// Category of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogKind {
    System,
    Error,
    ServiceLog,
    InitProgress,
    InitComplete,
}

/// One line in the session log. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub kind: LogKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
    /// "stdout" or "stderr" for service output lines
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<String>,
    pub timestamp: String,
    /// Full init summary, retained for presentation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_summary: Option<InitCompletePayload>,
}

impl LogEntry {
    fn plain(kind: LogKind, text: String) -> Self {
        Self {
            kind,
            text,
            service_name: None,
            repo_name: None,
            stream: None,
            timestamp: local_timestamp(),
            init_summary: None,
        }
    }
}

/// Point-in-time copy of everything presentation renders from
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub status: ConnectionStatus,
    pub services: Vec<Service>,
    pub config: Option<ConfigSummary>,
    pub log: Vec<LogEntry>,
}

#[derive(Default)]
struct Inner {
    status: ConnectionStatus,
    services: Vec<Service>,
    config: Option<ConfigSummary>,
    log: Vec<LogEntry>,
}

/// The state store shared between the connection driver and presentation
#[derive(Default)]
pub struct SessionStore {
    inner: RwLock<Inner>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    // --- read surface ---

    pub fn status(&self) -> ConnectionStatus {
        self.read().status
    }

    pub fn is_connected(&self) -> bool {
        self.read().status == ConnectionStatus::Connected
    }

    pub fn services(&self) -> Vec<Service> {
        self.read().services.clone()
    }

    pub fn service(&self, name: &str) -> Option<Service> {
        self.read().services.iter().find(|s| s.name == name).cloned()
    }

    pub fn config(&self) -> Option<ConfigSummary> {
        self.read().config.clone()
    }

    pub fn log(&self) -> Vec<LogEntry> {
        self.read().log.clone()
    }

    pub fn log_len(&self) -> usize {
        self.read().log.len()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.read();
        SessionSnapshot {
            status: inner.status,
            services: inner.services.clone(),
            config: inner.config.clone(),
            log: inner.log.clone(),
        }
    }

    /// Bulk-clear the log. The one presentation-initiated mutation.
    pub fn clear_log(&self) {
        self.write().log.clear();
    }

    // --- mutators, reachable only from the driver and router ---

    pub(crate) fn set_status(&self, status: ConnectionStatus) {
        self.write().status = status;
    }

    pub(crate) fn push_system(&self, text: impl Into<String>) {
        self.write()
            .log
            .push(LogEntry::plain(LogKind::System, text.into()));
    }

    pub(crate) fn push_error(&self, text: impl Into<String>) {
        self.write()
            .log
            .push(LogEntry::plain(LogKind::Error, text.into()));
    }

    pub(crate) fn push_service_log(&self, payload: &ServiceLogPayload) {
        let mut entry = LogEntry::plain(LogKind::ServiceLog, payload.line.clone());
        entry.service_name = Some(payload.service_name.clone());
        entry.stream = Some(payload.stream.clone());
        // Server-supplied timestamp, stored verbatim
        if !payload.timestamp.is_empty() {
            entry.timestamp = payload.timestamp.clone();
        }
        self.write().log.push(entry);
    }

    pub(crate) fn push_init_progress(&self, payload: &InitProgressPayload) {
        let mut entry = LogEntry::plain(LogKind::InitProgress, payload.message.clone());
        entry.repo_name = Some(payload.repo_name.clone());
        self.write().log.push(entry);
    }

    pub(crate) fn push_init_complete(&self, payload: InitCompletePayload) {
        let text = format!(
            "Init complete: {} succeeded, {} failed",
            payload.success, payload.failed
        );
        let mut entry = LogEntry::plain(LogKind::InitComplete, text);
        entry.init_summary = Some(payload);
        self.write().log.push(entry);
    }

    /// Replace the roster wholesale with a `service.list` reply
    pub(crate) fn replace_roster(&self, records: Vec<ServiceRecord>) {
        self.write().services = records.into_iter().map(Service::from_record).collect();
    }

    /// Merge a partial record into the roster by name. Unknown names are
    /// appended so pushes about services we have not listed yet still land.
    pub(crate) fn merge_service(&self, record: &ServiceRecord) {
        let mut inner = self.write();
        match inner.services.iter().position(|s| s.name == record.name) {
            Some(index) => inner.services[index].merge(record),
            None => inner.services.push(Service::from_record(record.clone())),
        }
    }

    /// Replace the configuration summary atomically
    pub(crate) fn set_config(&self, summary: ConfigSummary) {
        self.write().config = Some(summary);
    }
}

fn local_timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_record(name: &str) -> ServiceRecord {
        ServiceRecord {
            name: name.to_string(),
            status: Some(ServiceState::Stopped),
            repository: Some("main-repo".to_string()),
            run_command: Some("cargo run".to_string()),
            pid: None,
            uptime_seconds: None,
            error: None,
        }
    }

    #[test]
    fn test_list_reply_replaces_roster_wholesale() {
        let store = SessionStore::new();
        store.replace_roster(vec![full_record("old-a"), full_record("old-b")]);

        store.replace_roster(vec![full_record("backend")]);
        let services = store.services();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0].name, "backend");
        assert_eq!(services[0].repository, "main-repo");
    }

    #[test]
    fn test_merge_never_drops_omitted_fields() {
        let store = SessionStore::new();
        store.replace_roster(vec![full_record("backend")]);

        // Partial status update: only name, status, and pid
        store.merge_service(&ServiceRecord {
            pid: Some(4242),
            ..ServiceRecord::status_only("backend", ServiceState::Running)
        });

        let backend = store.service("backend").unwrap();
        assert_eq!(backend.status, ServiceState::Running);
        assert_eq!(backend.pid, Some(4242));
        // Fields absent from the partial are untouched
        assert_eq!(backend.repository, "main-repo");
        assert_eq!(backend.run_command, "cargo run");
    }

    #[test]
    fn test_merge_unknown_name_appends() {
        let store = SessionStore::new();
        store.merge_service(&ServiceRecord::status_only("backend", ServiceState::Running));

        let backend = store.service("backend").unwrap();
        assert_eq!(backend.status, ServiceState::Running);
        assert!(backend.repository.is_empty());
    }

    #[test]
    fn test_log_preserves_append_order() {
        let store = SessionStore::new();
        store.push_system("Connected to orchestrator");
        store.push_service_log(&ServiceLogPayload {
            service_name: "backend".to_string(),
            timestamp: "12:00:01".to_string(),
            line: "listening on :3000".to_string(),
            stream: "stdout".to_string(),
        });
        store.push_error("boom");

        let log = store.log();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].kind, LogKind::System);
        assert_eq!(log[1].kind, LogKind::ServiceLog);
        assert_eq!(log[1].timestamp, "12:00:01");
        assert_eq!(log[1].service_name.as_deref(), Some("backend"));
        assert_eq!(log[2].kind, LogKind::Error);

        store.clear_log();
        assert_eq!(store.log_len(), 0);
    }

    #[test]
    fn test_init_complete_entry_text_and_summary() {
        let store = SessionStore::new();
        store.push_init_complete(InitCompletePayload {
            success: 3,
            failed: 1,
            total_time_seconds: 12.4,
            repositories: vec![],
        });

        let log = store.log();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, LogKind::InitComplete);
        assert_eq!(log[0].text, "Init complete: 3 succeeded, 1 failed");
        let summary = log[0].init_summary.as_ref().unwrap();
        assert_eq!(summary.total_time_seconds, 12.4);
    }

    #[test]
    fn test_config_replaced_atomically() {
        let store = SessionStore::new();
        assert!(store.config().is_none());

        store.set_config(ConfigSummary {
            valid: true,
            repositories: 2,
            services: 3,
            workspace_dir: "/work".to_string(),
            errors: vec![],
        });
        store.set_config(ConfigSummary {
            valid: true,
            repositories: 5,
            services: 7,
            workspace_dir: "/other".to_string(),
            errors: vec![],
        });

        let config = store.config().unwrap();
        assert_eq!(config.repositories, 5);
        assert_eq!(config.workspace_dir, "/other");
    }
}
