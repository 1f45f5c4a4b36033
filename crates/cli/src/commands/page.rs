// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Page commands: navigation, readiness, evaluation, HTML/CSS extraction,
//! screenshots.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use base64::Engine;

use super::{send, CommandCtx};
use crate::args::CssAction;
use crate::output::{print_json, OutputFormat};

pub(crate) async fn navigate(ctx: &CommandCtx, url: &str, wait: bool) -> Result<()> {
    // Bare hostnames are a common shorthand
    let url = if url.contains("://") { url.to_string() } else { format!("https://{url}") };
    let data = send(ctx, "navigate", serde_json::json!({"url": url, "wait": wait})).await?;
    print_nav_result(ctx, &data)
}

pub(crate) async fn reload(ctx: &CommandCtx, wait: bool, ignore_cache: bool) -> Result<()> {
    let data = send(
        ctx,
        "reload",
        serde_json::json!({"wait": wait, "ignoreCache": ignore_cache}),
    )
    .await?;
    print_nav_result(ctx, &data)
}

pub(crate) async fn history(ctx: &CommandCtx, cmd: &str, wait: bool) -> Result<()> {
    let data = send(ctx, cmd, serde_json::json!({"wait": wait})).await?;
    print_nav_result(ctx, &data)
}

fn print_nav_result(ctx: &CommandCtx, data: &serde_json::Value) -> Result<()> {
    match ctx.output {
        OutputFormat::Json => print_json(data)?,
        OutputFormat::Text => {
            let url = data["url"].as_str().unwrap_or("");
            match data["title"].as_str() {
                Some(title) if !title.is_empty() => println!("{url}  ({title})"),
                _ => println!("{url}"),
            }
        }
    }
    Ok(())
}

pub(crate) async fn ready(
    ctx: &CommandCtx,
    selector: Option<String>,
    eval: Option<String>,
    network_idle: bool,
) -> Result<()> {
    send(
        ctx,
        "ready",
        serde_json::json!({
            "selector": selector.unwrap_or_default(),
            "eval": eval.unwrap_or_default(),
            "networkIdle": network_idle,
        }),
    )
    .await?;
    println!("ready");
    Ok(())
}

pub(crate) async fn eval(ctx: &CommandCtx, expression: &str) -> Result<()> {
    let data = send(ctx, "eval", serde_json::json!({"expression": expression})).await?;
    match ctx.output {
        OutputFormat::Json => print_json(&data)?,
        OutputFormat::Text => {
            if data["hasValue"].as_bool() == Some(true) {
                match &data["value"] {
                    serde_json::Value::String(s) => println!("{s}"),
                    other => println!("{other}"),
                }
            } else {
                println!("undefined");
            }
        }
    }
    Ok(())
}

pub(crate) async fn html(
    ctx: &CommandCtx,
    file: Option<PathBuf>,
    selector: Option<String>,
) -> Result<()> {
    let data = send(
        ctx,
        "html",
        serde_json::json!({"selector": selector.unwrap_or_default()}),
    )
    .await?;

    if let Some(path) = file {
        let html = data["html"].as_str().unwrap_or_default();
        std::fs::write(&path, html)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {} ({} bytes)", path.display(), html.len());
        return Ok(());
    }

    match ctx.output {
        OutputFormat::Json => print_json(&data)?,
        OutputFormat::Text => println!("{}", data["html"].as_str().unwrap_or_default()),
    }
    Ok(())
}

pub(crate) async fn css(ctx: &CommandCtx, action: CssAction) -> Result<()> {
    let (params, file) = match action {
        CssAction::Save { file } => (serde_json::json!({"action": "save"}), file),
        CssAction::Computed { selector } => {
            (serde_json::json!({"action": "computed", "selector": selector}), None)
        }
        CssAction::Get { selector, property } => (
            serde_json::json!({"action": "get", "selector": selector, "property": property}),
            None,
        ),
        CssAction::Inline { selector } => {
            (serde_json::json!({"action": "inline", "selector": selector}), None)
        }
        CssAction::Matched { selector } => {
            (serde_json::json!({"action": "matched", "selector": selector}), None)
        }
    };

    let data = send(ctx, "css", params).await?;

    if let Some(path) = file {
        let css = data["css"].as_str().unwrap_or_default();
        std::fs::write(&path, css)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("wrote {} ({} bytes)", path.display(), css.len());
        return Ok(());
    }

    match ctx.output {
        OutputFormat::Json => print_json(&data)?,
        OutputFormat::Text => match &data {
            serde_json::Value::Object(map) if map.contains_key("css") => {
                println!("{}", data["css"].as_str().unwrap_or_default());
            }
            serde_json::Value::Object(map) if map.contains_key("value") => {
                println!("{}", data["value"].as_str().unwrap_or_default());
            }
            other => print_json(other)?,
        },
    }
    Ok(())
}

pub(crate) async fn screenshot(
    ctx: &CommandCtx,
    file: Option<PathBuf>,
    full_page: bool,
) -> Result<()> {
    let data = send(ctx, "screenshot", serde_json::json!({"fullPage": full_page})).await?;
    let Some(encoded) = data["data"].as_str() else {
        bail!("daemon returned no screenshot data");
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .context("decoding screenshot payload")?;

    let path = file.unwrap_or_else(|| {
        PathBuf::from(format!("screenshot-{}.png", bp_core::time::now_ms()))
    });
    std::fs::write(&path, &bytes).with_context(|| format!("writing {}", path.display()))?;
    println!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
