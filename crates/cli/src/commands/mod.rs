// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command execution: turns parsed CLI args into IPC requests and renders
//! the responses.

pub(crate) mod daemon;
pub(crate) mod input;
pub(crate) mod obs;
pub(crate) mod page;

use anyhow::{bail, Result};

use crate::args::Commands;
use crate::client::{ClientError, DaemonClient};
use crate::output::OutputFormat;

/// Per-invocation context carrying the global flags.
pub(crate) struct CommandCtx {
    pub output: OutputFormat,
    pub debug: bool,
    pub timeout: Option<u64>,
}

impl CommandCtx {
    /// Inject the global `--timeout` into a params object.
    pub(crate) fn with_timeout(&self, mut params: serde_json::Value) -> serde_json::Value {
        if let Some(timeout) = self.timeout {
            if let Some(map) = params.as_object_mut() {
                map.insert("timeout".to_string(), serde_json::json!(timeout));
            }
        }
        params
    }
}

/// Send one request to a running daemon and return its data payload.
/// Rejections with attached data (ambiguous matches, session lists) print
/// the payload to stderr before failing.
pub(crate) async fn send(
    ctx: &CommandCtx,
    cmd: &str,
    params: serde_json::Value,
) -> Result<serde_json::Value> {
    let client = DaemonClient::connect()?;
    match client.request(cmd, ctx.with_timeout(params), ctx.debug).await {
        Ok(data) => Ok(data),
        Err(ClientError::Rejected { message, data }) => {
            if let Some(data) = data {
                if let Ok(pretty) = serde_json::to_string_pretty(&data) {
                    eprintln!("{pretty}");
                }
            }
            bail!(message)
        }
        Err(e) => Err(e.into()),
    }
}

/// Execute one parsed command. Shared by `main` and the REPL.
pub(crate) async fn execute(ctx: &CommandCtx, command: Commands) -> Result<()> {
    match command {
        Commands::Status => daemon::status(ctx).await,
        Commands::Start => daemon::start(ctx).await,
        Commands::Stop => daemon::stop(ctx).await,
        Commands::Reconnect => daemon::reconnect(ctx).await,

        Commands::Target { query } => obs::target(ctx, query).await,
        Commands::Clear { what } => obs::clear(ctx, &what).await,
        Commands::Console { head, tail } => obs::console(ctx, head, tail).await,
        Commands::Network { head, tail } => obs::network(ctx, head, tail).await,
        Commands::Cookies { action } => obs::cookies(ctx, action).await,

        Commands::Navigate { url, wait } => page::navigate(ctx, &url, wait).await,
        Commands::Reload { wait, ignore_cache } => page::reload(ctx, wait, ignore_cache).await,
        Commands::Back { wait } => page::history(ctx, "back", wait).await,
        Commands::Forward { wait } => page::history(ctx, "forward", wait).await,
        Commands::Ready { selector, eval, network_idle } => {
            page::ready(ctx, selector, eval, network_idle).await
        }
        Commands::Eval { expression } => page::eval(ctx, &expression).await,
        Commands::Html { file, selector } => page::html(ctx, file, selector).await,
        Commands::Css { action } => page::css(ctx, action).await,
        Commands::Screenshot { file, full_page } => page::screenshot(ctx, file, full_page).await,

        Commands::Click { selector } => input::click(ctx, &selector).await,
        Commands::Focus { selector } => input::focus(ctx, &selector).await,
        Commands::Type { text, selector, key, clear } => {
            input::type_text(ctx, &text, selector, key, clear).await
        }
        Commands::Key { key, alt, ctrl, meta, shift } => {
            input::key(ctx, &key, alt, ctrl, meta, shift).await
        }
        Commands::Select { selector, value } => input::select(ctx, &selector, &value).await,
        Commands::Scroll { mode } => input::scroll(ctx, mode).await,

        Commands::Repl => Box::pin(crate::repl::run(ctx)).await,
        Commands::Serve { dir, port } => {
            let dir = dir.unwrap_or_else(|| std::path::PathBuf::from("."));
            crate::serve::run(dir, port).await
        }
        Commands::Find { .. } => {
            bail!("the find command was removed; use 'bp html --select <SELECTOR>' instead")
        }
    }
}
