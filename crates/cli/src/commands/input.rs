// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input commands: click, focus, type, key, select, scroll.

use anyhow::Result;

use super::{send, CommandCtx};
use crate::args::ScrollMode;
use crate::color::{self, codes};

pub(crate) async fn click(ctx: &CommandCtx, selector: &str) -> Result<()> {
    let data = send(ctx, "click", serde_json::json!({"selector": selector})).await?;
    if let Some(warning) = data["warning"].as_str() {
        eprintln!("{}", color::paint(codes::WARN, &format!("warning: {warning}")));
    }
    println!("clicked {selector}");
    Ok(())
}

pub(crate) async fn focus(ctx: &CommandCtx, selector: &str) -> Result<()> {
    send(ctx, "focus", serde_json::json!({"selector": selector})).await?;
    println!("focused {selector}");
    Ok(())
}

pub(crate) async fn type_text(
    ctx: &CommandCtx,
    text: &str,
    selector: Option<String>,
    key: Option<String>,
    clear: bool,
) -> Result<()> {
    send(
        ctx,
        "type",
        serde_json::json!({
            "text": text,
            "selector": selector.unwrap_or_default(),
            "key": key.unwrap_or_default(),
            "clear": clear,
        }),
    )
    .await?;
    println!("typed {} chars", text.chars().count());
    Ok(())
}

pub(crate) async fn key(
    ctx: &CommandCtx,
    key: &str,
    alt: bool,
    ctrl: bool,
    meta: bool,
    shift: bool,
) -> Result<()> {
    send(
        ctx,
        "key",
        serde_json::json!({
            "key": key,
            "alt": alt,
            "ctrl": ctrl,
            "meta": meta,
            "shift": shift,
        }),
    )
    .await?;
    println!("pressed {key}");
    Ok(())
}

pub(crate) async fn select(ctx: &CommandCtx, selector: &str, value: &str) -> Result<()> {
    send(ctx, "select", serde_json::json!({"selector": selector, "value": value})).await?;
    println!("selected '{value}'");
    Ok(())
}

pub(crate) async fn scroll(ctx: &CommandCtx, mode: ScrollMode) -> Result<()> {
    let params = match mode {
        ScrollMode::Element { selector } => {
            serde_json::json!({"mode": "element", "selector": selector})
        }
        ScrollMode::To { x, y } => serde_json::json!({"mode": "to", "toX": x, "toY": y}),
        ScrollMode::By { x, y } => serde_json::json!({"mode": "by", "byX": x, "byY": y}),
    };
    send(ctx, "scroll", params).await?;
    println!("scrolled");
    Ok(())
}
