//! Status command implementation

use std::time::Duration;

use anyhow::Result;

use dh_client::SessionManager;

use super::{await_reply, oneshot_callback};
use crate::output::format_status;

/// Show connection state and the cached session summary
pub async fn status_command(session: &SessionManager, wait: Duration) -> Result<()> {
    // Best-effort roster refresh so the summary reflects server reality
    let (callback, rx) = oneshot_callback();
    if session.list_services(Some(callback)).await.is_ok() {
        let _ = await_reply(rx, wait).await;
    }

    println!("{}", format_status(&session.snapshot()));
    Ok(())
}
