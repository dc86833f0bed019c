//! Service log fetch command

use std::time::Duration;

use anyhow::Result;

use dh_client::{LogKind, SessionManager};

use super::{await_reply, fail_on_error, oneshot_callback};
use crate::output::{format_log_entry, print_info};

/// Fetch recent log lines for one service.
///
/// The server acknowledges the request and then streams the lines as
/// `service.log` pushes, so after the ack we briefly drain the session log.
pub async fn logs_command(
    session: &SessionManager,
    wait: Duration,
    service: &str,
    tail: u32,
) -> Result<()> {
    let store = session.store();
    let seen = store.log_len();

    let (callback, rx) = oneshot_callback();
    session
        .fetch_service_logs(service, false, tail, Some(callback))
        .await?;
    let reply = await_reply(rx, wait).await?;
    fail_on_error(&reply)?;

    tokio::time::sleep(Duration::from_millis(300)).await;

    let log = store.log();
    let start = seen.min(log.len());
    let mut printed = 0usize;
    for entry in &log[start..] {
        if entry.kind == LogKind::ServiceLog && entry.service_name.as_deref() == Some(service) {
            println!("{}", format_log_entry(entry));
            printed += 1;
        }
    }
    if printed == 0 {
        print_info(&format!("No recent log lines for '{service}'"));
    }
    Ok(())
}
