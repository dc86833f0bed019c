//! Service roster commands

use std::time::Duration;

use anyhow::Result;

use dh_client::SessionManager;
use dh_protocol::SuccessPayload;

use super::{await_reply, fail_on_error, oneshot_callback};
use crate::output::{format_services, print_success};

/// List services; with `detail`, also fetch runtime status first
pub async fn services_command(
    session: &SessionManager,
    wait: Duration,
    detail: bool,
) -> Result<()> {
    let (callback, rx) = oneshot_callback();
    session.list_services(Some(callback)).await?;
    let reply = await_reply(rx, wait).await?;
    fail_on_error(&reply)?;

    if detail {
        let (callback, rx) = oneshot_callback();
        session.service_status(Some(callback)).await?;
        let reply = await_reply(rx, wait).await?;
        fail_on_error(&reply)?;
    }

    println!("{}", format_services(&session.store().services(), detail));
    Ok(())
}

/// Start a service by name
pub async fn start_command(session: &SessionManager, wait: Duration, name: &str) -> Result<()> {
    let (callback, rx) = oneshot_callback();
    session.start_service(name, Some(callback)).await?;
    let reply = await_reply(rx, wait).await?;
    fail_on_error(&reply)?;

    print_success(&ack_message(&reply, format!("Service '{name}' starting")));
    Ok(())
}

/// Stop a service by name
pub async fn stop_command(session: &SessionManager, wait: Duration, name: &str) -> Result<()> {
    let (callback, rx) = oneshot_callback();
    session.stop_service(name, Some(callback)).await?;
    let reply = await_reply(rx, wait).await?;
    fail_on_error(&reply)?;

    print_success(&ack_message(&reply, format!("Service '{name}' stopping")));
    Ok(())
}

fn ack_message(reply: &dh_protocol::Envelope, fallback: String) -> String {
    match reply.parse_payload::<SuccessPayload>() {
        Ok(payload) if !payload.message.is_empty() => payload.message,
        _ => fallback,
    }
}
