// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observational commands: console, network, target, clear, cookies.

use anyhow::Result;
use bp_core::{ConsoleEntry, NetworkEntry};
use bp_wire::TargetData;

use super::{send, CommandCtx};
use crate::args::CookieAction;
use crate::color::{self, codes};
use crate::output::{head_tail, print_json, render_console, render_network, OutputFormat};

pub(crate) async fn console(
    ctx: &CommandCtx,
    head: Option<usize>,
    tail: Option<usize>,
) -> Result<()> {
    let data = send(ctx, "console", serde_json::json!({})).await?;
    let entries: Vec<ConsoleEntry> = serde_json::from_value(data)?;
    let entries = head_tail(entries, head, tail);
    match ctx.output {
        OutputFormat::Json => print_json(&serde_json::to_value(&entries)?)?,
        OutputFormat::Text => render_console(&entries),
    }
    Ok(())
}

pub(crate) async fn network(
    ctx: &CommandCtx,
    head: Option<usize>,
    tail: Option<usize>,
) -> Result<()> {
    let data = send(ctx, "network", serde_json::json!({})).await?;
    let entries: Vec<NetworkEntry> = serde_json::from_value(data)?;
    let entries = head_tail(entries, head, tail);
    match ctx.output {
        OutputFormat::Json => print_json(&serde_json::to_value(&entries)?)?,
        OutputFormat::Text => render_network(&entries),
    }
    Ok(())
}

pub(crate) async fn target(ctx: &CommandCtx, query: Option<String>) -> Result<()> {
    let mut request = bp_wire::Request::new("target");
    request.target = query;
    request.debug = ctx.debug;

    let client = crate::client::DaemonClient::connect()?;
    let response = client.send(&request).await?;
    if !response.ok {
        if let Some(data) = &response.data {
            if let Ok(pretty) = serde_json::to_string_pretty(data) {
                eprintln!("{pretty}");
            }
        }
        anyhow::bail!(response.error.unwrap_or_else(|| "target failed".to_string()));
    }

    let data = response.data.unwrap_or_default();
    match ctx.output {
        OutputFormat::Json => print_json(&data)?,
        OutputFormat::Text => {
            let targets: TargetData = serde_json::from_value(data)?;
            let active_id = targets
                .active_session
                .as_ref()
                .map(|s| s.session_id.clone())
                .unwrap_or_default();
            if targets.sessions.is_empty() {
                println!("(no sessions)");
            }
            for s in &targets.sessions {
                let marker = if s.session_id == active_id { "*" } else { " " };
                println!(
                    "{marker} {}  {}  {}",
                    &s.session_id[..s.session_id.len().min(8)],
                    s.url,
                    color::paint(codes::MUTED, &s.title)
                );
            }
        }
    }
    Ok(())
}

pub(crate) async fn clear(ctx: &CommandCtx, what: &str) -> Result<()> {
    send(ctx, "clear", serde_json::json!({"what": what})).await?;
    println!("cleared {what}");
    Ok(())
}

pub(crate) async fn cookies(ctx: &CommandCtx, action: Option<CookieAction>) -> Result<()> {
    let params = match action {
        None | Some(CookieAction::List) => serde_json::json!({"action": "list"}),
        Some(CookieAction::Set {
            name,
            value,
            domain,
            path,
            secure,
            http_only,
            same_site,
            max_age,
        }) => serde_json::json!({
            "action": "set",
            "name": name,
            "value": value,
            "domain": domain.unwrap_or_default(),
            "path": path.unwrap_or_default(),
            "secure": secure,
            "httpOnly": http_only,
            "sameSite": same_site.unwrap_or_default(),
            "maxAge": max_age.unwrap_or_default(),
        }),
        Some(CookieAction::Delete { name, domain }) => serde_json::json!({
            "action": "delete",
            "name": name,
            "domain": domain.unwrap_or_default(),
        }),
    };

    let data = send(ctx, "cookies", params).await?;
    match ctx.output {
        OutputFormat::Json => print_json(&data)?,
        OutputFormat::Text => match data.get("cookies").and_then(|c| c.as_array()) {
            Some(cookies) => {
                if cookies.is_empty() {
                    println!("(no cookies)");
                }
                for c in cookies {
                    println!(
                        "{}={}  {}",
                        c["name"].as_str().unwrap_or("?"),
                        c["value"].as_str().unwrap_or(""),
                        color::paint(
                            codes::MUTED,
                            &format!(
                                "domain={} path={}",
                                c["domain"].as_str().unwrap_or(""),
                                c["path"].as_str().unwrap_or("")
                            )
                        )
                    );
                }
            }
            None => println!("ok"),
        },
    }
    Ok(())
}
