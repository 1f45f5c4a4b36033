// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Output rendering: text and JSON formats, list filtering, humanized
//! sizes and ages.

use bp_core::{ConsoleEntry, ConsoleKind, NetworkEntry};
use bp_wire::StatusData;
use clap::ValueEnum;

use crate::color::{self, codes};

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Pretty-print a JSON payload.
pub fn print_json(data: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Apply `--head` / `--tail` to a listing. Head applies first, then tail
/// within the head slice, so `--head 10 --tail 3` yields entries 8..10.
pub fn head_tail<T>(mut items: Vec<T>, head: Option<usize>, tail: Option<usize>) -> Vec<T> {
    if let Some(n) = head {
        items.truncate(n);
    }
    if let Some(n) = tail {
        if items.len() > n {
            items.drain(..items.len() - n);
        }
    }
    items
}

/// Format a timestamp as relative time (e.g., "5s", "2m", "1h", "3d")
pub fn format_time_ago(epoch_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    let now_ms = bp_core::time::now_ms();
    let elapsed_secs = now_ms.saturating_sub(epoch_ms) / 1000;
    if elapsed_secs < 60 {
        format!("{}s", elapsed_secs)
    } else if elapsed_secs < 3600 {
        format!("{}m", elapsed_secs / 60)
    } else if elapsed_secs < 86400 {
        format!("{}h", elapsed_secs / 3600)
    } else {
        format!("{}d", elapsed_secs / 86400)
    }
}

/// Humanize a byte count.
pub fn format_size(bytes: f64) -> String {
    if bytes <= 0.0 {
        return "-".to_string();
    }
    if bytes < 1024.0 {
        format!("{}B", bytes as u64)
    } else if bytes < 1024.0 * 1024.0 {
        format!("{:.1}KB", bytes / 1024.0)
    } else {
        format!("{:.1}MB", bytes / (1024.0 * 1024.0))
    }
}

pub fn render_console(entries: &[ConsoleEntry]) {
    if entries.is_empty() {
        println!("(no console entries)");
        return;
    }
    for e in entries {
        let kind = match e.kind {
            ConsoleKind::Error => color::paint(codes::ERROR, e.kind.as_str()),
            ConsoleKind::Warn => color::paint(codes::WARN, e.kind.as_str()),
            _ => e.kind.as_str().to_string(),
        };
        let mut line = format!("[{:>4}] {:5} {}", format_time_ago(e.timestamp_ms), kind, e.text);
        if !e.url.is_empty() {
            line.push_str(&color::paint(codes::MUTED, &format!("  ({}:{})", e.url, e.line)));
        }
        println!("{line}");
    }
}

pub fn render_network(entries: &[NetworkEntry]) {
    if entries.is_empty() {
        println!("(no network entries)");
        return;
    }
    for e in entries {
        let status = if e.failed {
            color::paint(codes::ERROR, &format!("FAIL({})", e.error))
        } else if e.status == 0 {
            color::paint(codes::MUTED, "…")
        } else if e.status >= 400 {
            color::paint(codes::ERROR, &e.status.to_string())
        } else {
            e.status.to_string()
        };
        let timing = if e.duration_s > 0.0 {
            format!(" {:.2}s", e.duration_s)
        } else {
            String::new()
        };
        println!(
            "{:>18} {:>4} {:6} {}  {}{}",
            color::paint(codes::MUTED, &e.resource_type),
            status,
            e.method,
            e.url,
            format_size(e.size),
            timing
        );
        if !e.body_path.is_empty() {
            println!("{}", color::paint(codes::MUTED, &format!("        body: {}", e.body_path)));
        }
    }
}

pub fn render_status(status: &StatusData) {
    println!("{}", color::paint(codes::HEADER, "daemon"));
    println!("  running: {} (pid {})", status.running, status.pid);
    if let Some(pid) = status.browser_pid {
        println!("  browser: pid {pid}");
    }
    let conn = &status.connection;
    println!(
        "  connection: {:?} (heartbeat {}, reconnects {})",
        conn.state,
        format_time_ago(conn.last_heartbeat_ms),
        conn.reconnect_count
    );
    if !conn.last_error.is_empty() {
        println!("  last error: {}", color::paint(codes::ERROR, &conn.last_error));
    }

    println!("{}", color::paint(codes::HEADER, "sessions"));
    if status.sessions.is_empty() {
        println!("  (none)");
        return;
    }
    let active_id =
        status.active_session.as_ref().map(|s| s.session_id.clone()).unwrap_or_default();
    for s in &status.sessions {
        let marker = if s.session.session_id == active_id { "*" } else { " " };
        let http = s.http_status.map(|code| format!(" [{code}]")).unwrap_or_default();
        println!(
            "  {marker} {}  {}{}  {}",
            &s.session.session_id[..s.session.session_id.len().min(8)],
            s.session.url,
            http,
            color::paint(codes::MUTED, &s.session.title)
        );
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
