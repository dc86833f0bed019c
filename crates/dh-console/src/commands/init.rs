//! Workspace initialization command

use std::time::Duration;

use anyhow::Result;

use dh_client::{LogKind, SessionManager};

use super::{await_reply, fail_on_error, oneshot_callback};
use crate::output::{format_log_entry, print_info, print_success, print_warning};

/// Kick off initialization and stream progress until the completion push
pub async fn init_command(session: &SessionManager, wait: Duration) -> Result<()> {
    let store = session.store();
    let mut seen = store.log_len();

    let (callback, rx) = oneshot_callback();
    session.start_init(Some(callback)).await?;
    let reply = await_reply(rx, wait).await?;
    fail_on_error(&reply)?;
    print_info("Initialization started");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                print_warning("Stopped watching; initialization continues server-side");
                return Ok(());
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {}
        }

        let log = store.log();
        let start = seen.min(log.len());
        for entry in &log[start..] {
            match entry.kind {
                LogKind::InitProgress | LogKind::Error => {
                    println!("{}", format_log_entry(entry));
                }
                LogKind::InitComplete => {
                    print_success(&entry.text);
                    if let Some(summary) = &entry.init_summary {
                        print_info(&format!("Total time: {:.1}s", summary.total_time_seconds));
                        for repo in &summary.repositories {
                            match &repo.error {
                                Some(error) => {
                                    print_warning(&format!("  {}: {}", repo.name, error))
                                }
                                None => print_info(&format!(
                                    "  {}: {} ({:.1}s)",
                                    repo.name, repo.status, repo.duration_seconds
                                )),
                            }
                        }
                    }
                    return Ok(());
                }
                _ => {}
            }
        }
        seen = log.len();
    }
}
