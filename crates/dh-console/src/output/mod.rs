//! Output formatting utilities for the console
//!
//! Tables for the service roster, a one-line renderer for session log
//! entries, and colored status messages.

use tabled::{
    settings::{Style, Width},
    Table, Tabled,
};

use dh_client::{LogEntry, LogKind, Service, SessionSnapshot};
use dh_protocol::ServiceState;

/// Format the service roster as an ASCII table
pub fn format_services(services: &[Service], detailed: bool) -> String {
    if services.is_empty() {
        return "No services defined".to_string();
    }

    #[derive(Tabled)]
    struct ServiceRow {
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "REPOSITORY")]
        repository: String,
        #[tabled(rename = "STATUS")]
        status: String,
        #[tabled(rename = "COMMAND")]
        command: String,
    }

    #[derive(Tabled)]
    struct ServiceRowDetailed {
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "REPOSITORY")]
        repository: String,
        #[tabled(rename = "STATUS")]
        status: String,
        #[tabled(rename = "PID")]
        pid: String,
        #[tabled(rename = "UPTIME")]
        uptime: String,
        #[tabled(rename = "LAST ERROR")]
        error: String,
    }

    if detailed {
        let rows: Vec<ServiceRowDetailed> = services
            .iter()
            .map(|s| ServiceRowDetailed {
                name: s.name.clone(),
                repository: s.repository.clone(),
                status: s.status.to_string(),
                pid: s
                    .pid
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                uptime: s
                    .uptime_seconds
                    .map(format_uptime)
                    .unwrap_or_else(|| "-".to_string()),
                error: s.last_error.clone().unwrap_or_else(|| "-".to_string()),
            })
            .collect();

        Table::new(rows)
            .with(Style::rounded())
            .with(Width::wrap(110))
            .to_string()
    } else {
        let rows: Vec<ServiceRow> = services
            .iter()
            .map(|s| ServiceRow {
                name: s.name.clone(),
                repository: s.repository.clone(),
                status: s.status.to_string(),
                command: s.run_command.clone(),
            })
            .collect();

        Table::new(rows).with(Style::rounded()).to_string()
    }
}

/// Format the session summary shown by `deckhand status`
pub fn format_status(snapshot: &SessionSnapshot) -> String {
    let mut output = String::new();

    output.push_str(&format!("Connection: {}\n", snapshot.status));
    match &snapshot.config {
        Some(config) => {
            output.push_str(&format!("Workspace: {}\n", config.workspace_dir));
            output.push_str(&format!("Repositories: {}\n", config.repositories));
            output.push_str(&format!("Services configured: {}\n", config.services));
        }
        None => output.push_str("No configuration uploaded yet\n"),
    }

    let running = snapshot
        .services
        .iter()
        .filter(|s| s.status == ServiceState::Running)
        .count();
    output.push_str(&format!(
        "Services known: {} ({} running)\n",
        snapshot.services.len(),
        running
    ));
    output.push_str(&format!("Log entries: {}", snapshot.log.len()));

    output
}

/// Render one session log entry as a single line
pub fn format_log_entry(entry: &LogEntry) -> String {
    let tag = match entry.kind {
        LogKind::System => "system".to_string(),
        LogKind::Error => "error".to_string(),
        LogKind::ServiceLog => entry
            .service_name
            .clone()
            .unwrap_or_else(|| "service".to_string()),
        LogKind::InitProgress => entry.repo_name.clone().unwrap_or_else(|| "init".to_string()),
        LogKind::InitComplete => "init".to_string(),
    };
    format!("[{}] {:<12} {}", entry.timestamp, tag, entry.text)
}

/// Format uptime seconds in human-readable form
fn format_uptime(secs: f64) -> String {
    let secs = secs as u64;
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow with a warning symbol prefix
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_services_empty() {
        assert_eq!(format_services(&[], false), "No services defined");
    }

    #[test]
    fn test_format_uptime() {
        assert_eq!(format_uptime(42.7), "42s");
        assert_eq!(format_uptime(125.0), "2m 5s");
        assert_eq!(format_uptime(7265.0), "2h 1m");
    }
}
