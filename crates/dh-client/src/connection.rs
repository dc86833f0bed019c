//! Connection lifecycle driver
//!
//! A background task owns the transport handle, the correlation table, and
//! the command channel. It walks the state machine
//! disconnected -> connecting -> connected -> disconnected, reconnecting
//! after a fixed delay until explicitly torn down via the cancellation
//! token.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use dh_protocol::{decode, encode, Envelope, RequestId};

use crate::config::ClientConfig;
use crate::pending::{PendingReplies, ReplyCallback};
use crate::router;
use crate::store::{ConnectionStatus, SessionStore};
use crate::transport::{Connector, Transport};

/// Outbound request handed from a session handle to the driver
pub(crate) struct Command {
    pub id: RequestId,
    pub envelope: Envelope,
    pub callback: Option<ReplyCallback>,
}

enum ConnectionEnd {
    /// Explicit teardown; the state machine halts
    Teardown,
    /// Transport dropped; reconnect after the fixed delay
    Lost(String),
}

pub(crate) async fn run_driver(
    connector: Box<dyn Connector>,
    store: Arc<SessionStore>,
    config: ClientConfig,
    mut commands: mpsc::Receiver<Command>,
    cancel: CancellationToken,
) {
    let mut pending = PendingReplies::new();

    loop {
        if cancel.is_cancelled() {
            break;
        }

        // Callbacks from a previous transport must never survive into the
        // next one.
        pending.teardown();

        store.set_status(ConnectionStatus::Connecting);
        tracing::debug!(address = %config.server_address, "connecting");

        let attempt = tokio::select! {
            _ = cancel.cancelled() => break,
            result = tokio::time::timeout(config.connect_timeout, connector.connect()) => result,
        };

        match attempt {
            Ok(Ok(mut transport)) => {
                store.set_status(ConnectionStatus::Connected);
                store.push_system("Connected to orchestrator");
                tracing::info!(address = %config.server_address, "connected");

                let end = run_connected(
                    transport.as_mut(),
                    &store,
                    &mut pending,
                    &mut commands,
                    &cancel,
                )
                .await;

                pending.teardown();
                store.set_status(ConnectionStatus::Disconnected);

                match end {
                    ConnectionEnd::Teardown => {
                        transport.close().await;
                        break;
                    }
                    ConnectionEnd::Lost(reason) => {
                        store.push_system("Disconnected from orchestrator");
                        tracing::warn!("connection lost: {reason}");
                    }
                }
            }
            Ok(Err(e)) => {
                store.set_status(ConnectionStatus::Disconnected);
                store.push_error("Connection error occurred");
                tracing::debug!("connect failed: {e}");
            }
            Err(_) => {
                store.set_status(ConnectionStatus::Disconnected);
                store.push_error("Connection error occurred");
                tracing::debug!(
                    "connect attempt timed out after {:?}",
                    config.connect_timeout
                );
            }
        }

        // Fixed delay, then retry the same address. Requests arriving while
        // disconnected fail fast instead of queuing for the next transport.
        let delay = tokio::time::sleep(config.reconnect_delay);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = &mut delay => break,
                cmd = commands.recv() => match cmd {
                    Some(cmd) => {
                        tracing::warn!(id = %cmd.id, kind = %cmd.envelope.kind,
                            "dropping request issued while disconnected");
                    }
                    // Every handle is gone; behave like teardown
                    None => return,
                },
            }
        }
    }

    tracing::debug!("session driver stopped");
}

async fn run_connected(
    transport: &mut dyn Transport,
    store: &SessionStore,
    pending: &mut PendingReplies,
    commands: &mut mpsc::Receiver<Command>,
    cancel: &CancellationToken,
) -> ConnectionEnd {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => return ConnectionEnd::Teardown,

            inbound = transport.recv() => match inbound {
                Some(Ok(frame)) => match decode(&frame) {
                    Ok(envelope) => router::route(store, pending, envelope),
                    // One malformed frame never terminates the connection
                    // or touches the correlation table.
                    Err(e) => tracing::warn!("dropping malformed frame: {e}"),
                },
                Some(Err(e)) => return ConnectionEnd::Lost(e.to_string()),
                None => return ConnectionEnd::Lost("closed by server".to_string()),
            },

            cmd = commands.recv() => match cmd {
                Some(Command { id, envelope, callback }) => {
                    let frame = match encode(&envelope) {
                        Ok(frame) => frame,
                        Err(e) => {
                            // Callback is dropped uninvoked; the caller only
                            // learns via the log, like any orphaned request.
                            tracing::error!(%id, "failed to encode request: {e}");
                            continue;
                        }
                    };
                    if let Some(callback) = callback {
                        pending.register(id.clone(), callback);
                    }
                    if let Err(e) = transport.send(frame).await {
                        return ConnectionEnd::Lost(format!("send failed: {e}"));
                    }
                    tracing::debug!(%id, kind = %envelope.kind, "request sent");
                }
                None => return ConnectionEnd::Teardown,
            },
        }
    }
}
