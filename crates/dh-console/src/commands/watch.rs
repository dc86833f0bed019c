//! Live session log tail

use std::time::Duration;

use anyhow::Result;

use dh_client::SessionManager;

use crate::output::{format_log_entry, print_info};

/// Print session log entries as they arrive, until Ctrl-C.
///
/// Survives server restarts: the session reconnects on its own and the
/// disconnect/reconnect transitions show up as system entries.
pub async fn watch_command(session: &SessionManager) -> Result<()> {
    print_info("Watching session log (Ctrl-C to stop)");

    let store = session.store();
    let mut seen = store.log_len();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            _ = tokio::time::sleep(Duration::from_millis(250)) => {
                let log = store.log();
                let start = seen.min(log.len());
                for entry in &log[start..] {
                    println!("{}", format_log_entry(entry));
                }
                seen = log.len();
            }
        }
    }

    Ok(())
}
