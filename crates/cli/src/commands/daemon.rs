// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle commands: start, stop, status, reconnect.

use anyhow::{bail, Result};
use bp_wire::StatusData;

use super::{send, CommandCtx};
use crate::client::{ClientError, DaemonClient};
use crate::daemon_process::{read_daemon_pid, wait_for_exit};
use crate::env::timeout_exit;
use crate::output::{print_json, render_status, OutputFormat};

pub(crate) async fn status(ctx: &CommandCtx) -> Result<()> {
    let data = match send(ctx, "status", serde_json::json!({})).await {
        Ok(data) => data,
        Err(e) if e.downcast_ref::<ClientError>().is_some_and(is_not_running) => {
            match ctx.output {
                OutputFormat::Text => println!("daemon not running"),
                OutputFormat::Json => print_json(&serde_json::json!({"running": false}))?,
            }
            return Ok(());
        }
        Err(e) => return Err(e),
    };
    match ctx.output {
        OutputFormat::Json => print_json(&data)?,
        OutputFormat::Text => {
            let status: StatusData = serde_json::from_value(data)?;
            render_status(&status);
        }
    }
    Ok(())
}

fn is_not_running(e: &ClientError) -> bool {
    matches!(e, ClientError::DaemonNotRunning)
}

pub(crate) async fn start(ctx: &CommandCtx) -> Result<()> {
    if DaemonClient::connect().is_ok() {
        // A live daemon answers status; a stale socket falls through to
        // connect_or_start
        if let Ok(data) = send(ctx, "status", serde_json::json!({})).await {
            if data["running"] == true {
                println!("daemon already running (pid {})", data["pid"]);
                return Ok(());
            }
        }
    }

    DaemonClient::connect_or_start()?;
    let data = send(ctx, "status", serde_json::json!({})).await?;
    match ctx.output {
        OutputFormat::Json => print_json(&data)?,
        OutputFormat::Text => {
            println!("daemon started (pid {})", data["pid"]);
            if let Some(pid) = data["browserPid"].as_u64() {
                println!("browser running (pid {pid})");
            }
        }
    }
    Ok(())
}

pub(crate) async fn stop(ctx: &CommandCtx) -> Result<()> {
    let client = match DaemonClient::connect() {
        Ok(client) => client,
        Err(ClientError::DaemonNotRunning) => {
            println!("daemon not running");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let pid = read_daemon_pid()?;

    send(ctx, "shutdown", serde_json::json!({})).await?;
    drop(client);

    if let Some(pid) = pid {
        if !wait_for_exit(pid, timeout_exit()).await {
            bail!("daemon (pid {pid}) did not exit within the timeout");
        }
    }
    println!("daemon stopped");
    Ok(())
}

pub(crate) async fn reconnect(ctx: &CommandCtx) -> Result<()> {
    let data = send(ctx, "reconnect", serde_json::json!({})).await?;
    match ctx.output {
        OutputFormat::Json => print_json(&data)?,
        OutputFormat::Text => {
            let state = data["state"].as_str().unwrap_or("unknown");
            match data["message"].as_str() {
                Some(message) => println!("{state}: {message}"),
                None => println!("{state}"),
            }
        }
    }
    Ok(())
}
