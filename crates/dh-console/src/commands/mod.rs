//! Console command implementations

mod config;
mod init;
mod logs;
mod services;
mod status;
mod watch;

pub use config::{config_path, config_show, diff_command, parse_command, upload_command};
pub use init::init_command;
pub use logs::logs_command;
pub use services::{services_command, start_command, stop_command};
pub use status::status_command;
pub use watch::watch_command;

use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::oneshot;

use dh_client::{ReplyCallback, SessionManager};
use dh_protocol::{Envelope, ErrorPayload};

/// Wait for the session to reach the connected state
pub async fn wait_connected(session: &SessionManager, wait: Duration) -> Result<()> {
    let deadline = tokio::time::Instant::now() + wait;
    while !session.is_connected() {
        if tokio::time::Instant::now() >= deadline {
            bail!("Timed out connecting to the orchestration server");
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    Ok(())
}

/// Bridge a one-shot completion callback into an awaitable reply
pub(crate) fn oneshot_callback() -> (ReplyCallback, oneshot::Receiver<Envelope>) {
    let (tx, rx) = oneshot::channel();
    (
        Box::new(move |reply| {
            let _ = tx.send(reply);
        }),
        rx,
    )
}

/// Await a bridged reply, bounded by the operator-supplied timeout.
///
/// The sender side is dropped uninvoked when the connection goes down with
/// the request in flight; that surfaces here as a closed channel.
pub(crate) async fn await_reply(
    rx: oneshot::Receiver<Envelope>,
    wait: Duration,
) -> Result<Envelope> {
    match tokio::time::timeout(wait, rx).await {
        Ok(Ok(reply)) => Ok(reply),
        Ok(Err(_)) => bail!("Connection dropped before the reply arrived"),
        Err(_) => bail!("Timed out waiting for a reply from the server"),
    }
}

/// Turn an `error` reply into a command failure
pub(crate) fn fail_on_error(reply: &Envelope) -> Result<()> {
    if reply.is_error() {
        let message = reply
            .parse_payload::<ErrorPayload>()
            .map(|p| p.message)
            .unwrap_or_else(|_| "unknown server error".to_string());
        bail!("Server error: {message}");
    }
    Ok(())
}
