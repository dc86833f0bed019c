//! Configuration commands
//!
//! `upload`/`parse`/`diff` talk to the server about workspace
//! configurations; `config show`/`config path` manage the console's own
//! settings file.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use dh_client::config as client_config;
use dh_client::{ClientConfig, SessionManager};
use dh_protocol::{ConfigDiffPayload, ConfigSummary};

use super::{await_reply, fail_on_error, oneshot_callback};
use crate::output::{print_error, print_info, print_success};

/// Upload a configuration file; a valid one becomes the server's current
pub async fn upload_command(session: &SessionManager, wait: Duration, file: &Path) -> Result<()> {
    let config_yaml = read_config_file(file)?;

    let (callback, rx) = oneshot_callback();
    session.upload_config(config_yaml, Some(callback)).await?;
    let reply = await_reply(rx, wait).await?;
    fail_on_error(&reply)?;

    let summary: ConfigSummary = reply.parse_payload()?;
    report_summary(&summary);
    if !summary.valid {
        bail!("Configuration rejected by the server");
    }
    Ok(())
}

/// Validate a configuration file without storing it server-side
pub async fn parse_command(session: &SessionManager, wait: Duration, file: &Path) -> Result<()> {
    let config_yaml = read_config_file(file)?;

    let (callback, rx) = oneshot_callback();
    session.parse_config(config_yaml, Some(callback)).await?;
    let reply = await_reply(rx, wait).await?;
    fail_on_error(&reply)?;

    let summary: ConfigSummary = reply.parse_payload()?;
    report_summary(&summary);
    if !summary.valid {
        bail!("Configuration is invalid");
    }
    Ok(())
}

/// Diff a configuration file against the server's current one
pub async fn diff_command(session: &SessionManager, wait: Duration, file: &Path) -> Result<()> {
    let config_yaml = read_config_file(file)?;

    let (callback, rx) = oneshot_callback();
    session.diff_config(config_yaml, Some(callback)).await?;
    let reply = await_reply(rx, wait).await?;
    fail_on_error(&reply)?;

    let diff: ConfigDiffPayload = reply.parse_payload()?;
    if !diff.has_changes {
        print_info("No changes");
        return Ok(());
    }

    print_changes("Added repositories", &diff.added_repos);
    print_changes("Removed repositories", &diff.removed_repos);
    print_changes("Modified repositories", &diff.modified_repos);
    print_changes("Added services", &diff.added_services);
    print_changes("Removed services", &diff.removed_services);
    print_changes("Modified services", &diff.modified_services);
    Ok(())
}

/// Show the console's own configuration
pub fn config_show(path: Option<&Path>) -> Result<()> {
    let default_path = client_config::default_config_path();
    let path = path.unwrap_or(&default_path);

    let config: ClientConfig = if path.exists() {
        client_config::load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?
    } else {
        print_info(&format!(
            "No config file at {}; showing defaults",
            path.display()
        ));
        ClientConfig::default()
    };

    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

/// Print the console configuration file path
pub fn config_path() {
    println!("{}", client_config::default_config_path().display());
}

fn read_config_file(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))
}

fn report_summary(summary: &ConfigSummary) {
    if summary.valid {
        print_success(&format!(
            "Valid config: {} repositories, {} services (workspace {})",
            summary.repositories, summary.services, summary.workspace_dir
        ));
    } else {
        print_error("Configuration is invalid:");
        for error in &summary.errors {
            print_error(&format!("  {error}"));
        }
    }
}

fn print_changes(label: &str, names: &[String]) {
    if !names.is_empty() {
        println!("{}: {}", label, names.join(", "));
    }
}
