//! High-level session handle and operation surface

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use dh_protocol::{
    ConfigSummary, Request, RequestId, RequestIdAllocator, ServiceListPayload,
};

use crate::config::ClientConfig;
use crate::connection::{self, Command};
use crate::error::SessionError;
use crate::pending::ReplyCallback;
use crate::store::{SessionSnapshot, SessionStore};
use crate::transport::{Connector, WsConnector};

/// Handle to a running client session.
///
/// Cloning is cheap; all clones drive the same connection and read the same
/// store. Operations never block: each one allocates a fresh correlation id,
/// registers the completion callback, and hands the serialized request to
/// the connection driver. Completion is observed only through the callback
/// or, for push-driven state, through the store.
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<SessionStore>,
    commands: mpsc::Sender<Command>,
    ids: Arc<RequestIdAllocator>,
    cancel: CancellationToken,
}

impl SessionManager {
    /// Connect to the configured server over WebSocket.
    ///
    /// Returns immediately; watch [`SessionStore::is_connected`] for the
    /// connection to come up. The driver reconnects on its own after drops.
    pub fn connect(config: ClientConfig) -> Self {
        let connector = Box::new(WsConnector::new(config.ws_url()));
        Self::with_connector(config, connector)
    }

    /// Like [`SessionManager::connect`] but with a caller-supplied
    /// connector. This is the seam tests use to script the transport.
    pub fn with_connector(config: ClientConfig, connector: Box<dyn Connector>) -> Self {
        let store = Arc::new(SessionStore::new());
        let (commands, command_rx) = mpsc::channel(64);
        let cancel = CancellationToken::new();

        tokio::spawn(connection::run_driver(
            connector,
            Arc::clone(&store),
            config,
            command_rx,
            cancel.clone(),
        ));

        Self {
            store,
            commands,
            ids: Arc::new(RequestIdAllocator::new()),
            cancel,
        }
    }

    /// Shared handle to the session state store
    pub fn store(&self) -> Arc<SessionStore> {
        Arc::clone(&self.store)
    }

    pub fn is_connected(&self) -> bool {
        self.store.is_connected()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.store.snapshot()
    }

    pub fn clear_log(&self) {
        self.store.clear_log();
    }

    /// Tear the session down: cancels any pending reconnect, closes the
    /// transport, and discards in-flight callbacks. The only path that
    /// permanently halts the state machine.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Upload a configuration. On a `success` reply whose payload is marked
    /// valid, the stored configuration summary is replaced before the
    /// caller's callback runs.
    pub async fn upload_config(
        &self,
        config_yaml: impl Into<String>,
        callback: Option<ReplyCallback>,
    ) -> Result<RequestId, SessionError> {
        let store = Arc::clone(&self.store);
        let wrapped: ReplyCallback = Box::new(move |reply| {
            if reply.is_success() {
                match reply.parse_payload::<ConfigSummary>() {
                    Ok(summary) if summary.valid => store.set_config(summary),
                    Ok(_) => {}
                    Err(e) => tracing::warn!("config.upload reply with bad payload: {e}"),
                }
            }
            if let Some(callback) = callback {
                callback(reply);
            }
        });
        self.send(
            Request::ConfigUpload {
                config_yaml: config_yaml.into(),
            },
            Some(wrapped),
        )
        .await
    }

    /// Validate a configuration without storing it server-side
    pub async fn parse_config(
        &self,
        config_yaml: impl Into<String>,
        callback: Option<ReplyCallback>,
    ) -> Result<RequestId, SessionError> {
        self.send(
            Request::ConfigParse {
                config_yaml: config_yaml.into(),
            },
            callback,
        )
        .await
    }

    /// Replace the server's current configuration
    pub async fn update_config(
        &self,
        config_yaml: impl Into<String>,
        callback: Option<ReplyCallback>,
    ) -> Result<RequestId, SessionError> {
        self.send(
            Request::ConfigUpdate {
                config_yaml: config_yaml.into(),
            },
            callback,
        )
        .await
    }

    /// Diff a candidate configuration against the server's current one
    pub async fn diff_config(
        &self,
        new_config_yaml: impl Into<String>,
        callback: Option<ReplyCallback>,
    ) -> Result<RequestId, SessionError> {
        self.send(
            Request::ConfigDiff {
                new_config_yaml: new_config_yaml.into(),
            },
            callback,
        )
        .await
    }

    /// Start workspace initialization
    pub async fn start_init(
        &self,
        callback: Option<ReplyCallback>,
    ) -> Result<RequestId, SessionError> {
        self.send(Request::InitStart, callback).await
    }

    /// List services. A `success` reply replaces the roster wholesale before
    /// the caller's callback runs.
    pub async fn list_services(
        &self,
        callback: Option<ReplyCallback>,
    ) -> Result<RequestId, SessionError> {
        let store = Arc::clone(&self.store);
        let wrapped: ReplyCallback = Box::new(move |reply| {
            if reply.is_success() {
                match reply.parse_payload::<ServiceListPayload>() {
                    Ok(payload) => store.replace_roster(payload.services),
                    Err(e) => tracing::warn!("service.list reply with bad payload: {e}"),
                }
            }
            if let Some(callback) = callback {
                callback(reply);
            }
        });
        self.send(Request::ServiceList, Some(wrapped)).await
    }

    /// Start a service by name
    pub async fn start_service(
        &self,
        service_name: impl Into<String>,
        callback: Option<ReplyCallback>,
    ) -> Result<RequestId, SessionError> {
        self.send(
            Request::ServiceStart {
                service_name: service_name.into(),
            },
            callback,
        )
        .await
    }

    /// Stop a service by name
    pub async fn stop_service(
        &self,
        service_name: impl Into<String>,
        callback: Option<ReplyCallback>,
    ) -> Result<RequestId, SessionError> {
        self.send(
            Request::ServiceStop {
                service_name: service_name.into(),
            },
            callback,
        )
        .await
    }

    /// Fetch runtime status for all services. A `success` reply is merged
    /// into the roster per-name before the caller's callback runs.
    pub async fn service_status(
        &self,
        callback: Option<ReplyCallback>,
    ) -> Result<RequestId, SessionError> {
        let store = Arc::clone(&self.store);
        let wrapped: ReplyCallback = Box::new(move |reply| {
            if reply.is_success() {
                match reply.parse_payload::<ServiceListPayload>() {
                    Ok(payload) => {
                        for record in &payload.services {
                            store.merge_service(record);
                        }
                    }
                    Err(e) => tracing::warn!("service.status reply with bad payload: {e}"),
                }
            }
            if let Some(callback) = callback {
                callback(reply);
            }
        });
        self.send(Request::ServiceStatus, Some(wrapped)).await
    }

    /// Fetch recent log lines for a service
    pub async fn fetch_service_logs(
        &self,
        service_name: impl Into<String>,
        follow: bool,
        tail: u32,
        callback: Option<ReplyCallback>,
    ) -> Result<RequestId, SessionError> {
        self.send(
            Request::ServiceLogs {
                service_name: service_name.into(),
                follow,
                tail,
            },
            callback,
        )
        .await
    }

    async fn send(
        &self,
        request: Request,
        callback: Option<ReplyCallback>,
    ) -> Result<RequestId, SessionError> {
        // Fail immediately rather than queue when no transport is open
        if !self.store.is_connected() {
            tracing::warn!(kind = request.kind(), "dropping request: not connected");
            return Err(SessionError::NotConnected);
        }

        let id = self.ids.allocate();
        let envelope = request.into_envelope(id.clone());
        self.commands
            .send(Command {
                id: id.clone(),
                envelope,
                callback,
            })
            .await
            .map_err(|_| SessionError::DriverGone)?;
        Ok(id)
    }
}
