// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mouse, keyboard, and form input commands.

use std::sync::Arc;

use bp_core::keys;
use serde::Deserialize;
use serde_json::json;

use super::dom::eval_on;
use super::{active_session, guard, live_client, params, HandlerError, DP_TIMEOUT};
use crate::cdp::Client;
use crate::state::Ctx;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SelectorParams {
    selector: String,
}

pub(super) async fn click(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: SelectorParams = params(raw)?;
    if p.selector.is_empty() {
        return Err(HandlerError::InvalidParams("selector is required".to_string()));
    }
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;
    let sid = session.session_id.as_str();

    let selector_json = json!(p.selector).to_string();
    let script = format!(
        r#"(() => {{
            const el = document.querySelector({selector_json});
            if (!el) return {{found: false}};
            el.scrollIntoView({{block: 'center', inline: 'center'}});
            const r = el.getBoundingClientRect();
            const x = r.left + r.width / 2;
            const y = r.top + r.height / 2;
            const top = document.elementFromPoint(x, y);
            const occluded = !!(top && top !== el && !el.contains(top) && !top.contains(el));
            return {{
                found: true, x, y, occluded,
                occluder: occluded ? (top.tagName || '').toLowerCase() : '',
            }};
        }})()"#
    );
    let result = eval_on(ctx, &client, sid, &script, DP_TIMEOUT).await?;
    let value = &result["value"];
    if value["found"].as_bool() != Some(true) {
        return Err(HandlerError::user(format!("element not found: {}", p.selector)));
    }
    let x = value["x"].as_f64().unwrap_or(0.0);
    let y = value["y"].as_f64().unwrap_or(0.0);

    for kind in ["mousePressed", "mouseReleased"] {
        guard(
            ctx,
            client
                .send_to_session(
                    sid,
                    "Input.dispatchMouseEvent",
                    Some(json!({
                        "type": kind,
                        "x": x,
                        "y": y,
                        "button": "left",
                        "clickCount": 1,
                    })),
                    DP_TIMEOUT,
                )
                .await,
        )?;
    }

    if value["occluded"].as_bool() == Some(true) {
        let occluder = value["occluder"].as_str().unwrap_or("another element");
        return Ok(json!({
            "clicked": true,
            "warning": format!("element is covered by <{occluder}>; the click may have landed on it"),
        }));
    }
    Ok(json!({"clicked": true}))
}

pub(super) async fn focus(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: SelectorParams = params(raw)?;
    if p.selector.is_empty() {
        return Err(HandlerError::InvalidParams("selector is required".to_string()));
    }
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;
    focus_element(ctx, &client, &session.session_id, &p.selector).await?;
    Ok(serde_json::Value::Null)
}

async fn focus_element(
    ctx: &Arc<Ctx>,
    client: &Client,
    session_id: &str,
    selector: &str,
) -> Result<(), HandlerError> {
    let selector_json = json!(selector).to_string();
    let script = format!(
        r#"(() => {{
            const el = document.querySelector({selector_json});
            if (!el) return false;
            el.focus();
            return true;
        }})()"#
    );
    let result = eval_on(ctx, client, session_id, &script, DP_TIMEOUT).await?;
    if result["value"].as_bool() != Some(true) {
        return Err(HandlerError::user(format!("element not found: {selector}")));
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TypeParams {
    selector: String,
    text: String,
    key: String,
    clear: bool,
}

pub(super) async fn type_text(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: TypeParams = params(raw)?;
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;
    let sid = session.session_id.as_str();

    if !p.selector.is_empty() {
        focus_element(ctx, &client, sid, &p.selector).await?;
    }

    if p.clear {
        // Select-all + Backspace. The select-all chord is platform-bound to
        // the browser host: Meta on macOS, Ctrl elsewhere.
        let select_all_modifier = if cfg!(target_os = "macos") {
            keys::MODIFIER_META
        } else {
            keys::MODIFIER_CTRL
        };
        let a = keys::lookup("a")
            .ok_or_else(|| HandlerError::Internal("key table missing 'a'".to_string()))?;
        press_key(ctx, &client, sid, &a, select_all_modifier).await?;
        let backspace = keys::lookup("Backspace")
            .ok_or_else(|| HandlerError::Internal("key table missing Backspace".to_string()))?;
        press_key(ctx, &client, sid, &backspace, 0).await?;
    }

    if !p.text.is_empty() {
        guard(
            ctx,
            client
                .send_to_session(sid, "Input.insertText", Some(json!({"text": p.text})), DP_TIMEOUT)
                .await,
        )?;
    }

    if !p.key.is_empty() {
        let k = keys::lookup(&p.key)
            .ok_or_else(|| HandlerError::user(format!("unknown key: {}", p.key)))?;
        press_key(ctx, &client, sid, &k, 0).await?;
    }

    Ok(serde_json::Value::Null)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KeyParams {
    key: String,
    alt: bool,
    ctrl: bool,
    meta: bool,
    shift: bool,
}

pub(super) async fn key(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: KeyParams = params(raw)?;
    if p.key.is_empty() {
        return Err(HandlerError::InvalidParams("key is required".to_string()));
    }
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;

    let k = keys::lookup(&p.key)
        .ok_or_else(|| HandlerError::user(format!("unknown key: {}", p.key)))?;
    let modifiers = keys::modifier_mask(p.alt, p.ctrl, p.meta, p.shift);
    press_key(ctx, &client, &session.session_id, &k, modifiers).await?;
    Ok(serde_json::Value::Null)
}

/// Dispatch a keyDown/keyUp pair. Keys that type text use "keyDown" with a
/// `text` payload so the page sees keydown + keypress + keyup — Enter in a
/// form submits only with its "\r" text attached.
async fn press_key(
    ctx: &Arc<Ctx>,
    client: &Client,
    session_id: &str,
    k: &keys::KeyEvent,
    modifiers: u32,
) -> Result<(), HandlerError> {
    let mut down = json!({
        "type": if k.text.is_some() { "keyDown" } else { "rawKeyDown" },
        "key": k.key,
        "code": k.code,
        "windowsVirtualKeyCode": k.windows_virtual_key_code,
        "nativeVirtualKeyCode": k.windows_virtual_key_code,
        "modifiers": modifiers,
    });
    if let Some(text) = &k.text {
        down["text"] = json!(text);
        down["unmodifiedText"] = json!(text);
    }
    guard(
        ctx,
        client.send_to_session(session_id, "Input.dispatchKeyEvent", Some(down), DP_TIMEOUT).await,
    )?;

    let up = json!({
        "type": "keyUp",
        "key": k.key,
        "code": k.code,
        "windowsVirtualKeyCode": k.windows_virtual_key_code,
        "nativeVirtualKeyCode": k.windows_virtual_key_code,
        "modifiers": modifiers,
    });
    guard(
        ctx,
        client.send_to_session(session_id, "Input.dispatchKeyEvent", Some(up), DP_TIMEOUT).await,
    )?;
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SelectParams {
    selector: String,
    value: String,
}

pub(super) async fn select(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: SelectParams = params(raw)?;
    if p.selector.is_empty() {
        return Err(HandlerError::InvalidParams("selector is required".to_string()));
    }
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;

    let selector_json = json!(p.selector).to_string();
    let value_json = json!(p.value).to_string();
    let script = format!(
        r#"(() => {{
            const el = document.querySelector({selector_json});
            if (!el) return 'notfound';
            if (el.tagName !== 'SELECT') return 'notselect';
            el.value = {value_json};
            el.dispatchEvent(new Event('change', {{bubbles: true}}));
            return 'ok';
        }})()"#
    );
    let result = eval_on(ctx, &client, &session.session_id, &script, DP_TIMEOUT).await?;
    match result["value"].as_str() {
        Some("ok") => Ok(serde_json::Value::Null),
        Some("notfound") => {
            Err(HandlerError::user(format!("element not found: {}", p.selector)))
        }
        Some("notselect") => {
            Err(HandlerError::user(format!("element is not a <select>: {}", p.selector)))
        }
        _ => Err(HandlerError::Internal("unexpected select result".to_string())),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScrollParams {
    mode: String,
    selector: String,
    to_x: f64,
    to_y: f64,
    by_x: f64,
    by_y: f64,
}

pub(super) async fn scroll(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: ScrollParams = params(raw)?;
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;
    let sid = session.session_id.as_str();

    let script = match p.mode.as_str() {
        "element" => {
            if p.selector.is_empty() {
                return Err(HandlerError::InvalidParams(
                    "selector is required for element mode".to_string(),
                ));
            }
            let selector_json = json!(p.selector).to_string();
            format!(
                r#"(() => {{
                    const el = document.querySelector({selector_json});
                    if (!el) return false;
                    el.scrollIntoView({{block: 'center'}});
                    return true;
                }})()"#
            )
        }
        "to" => format!("(() => {{ window.scrollTo({}, {}); return true; }})()", p.to_x, p.to_y),
        "by" => format!("(() => {{ window.scrollBy({}, {}); return true; }})()", p.by_x, p.by_y),
        other => {
            return Err(HandlerError::InvalidParams(format!(
                "unknown scroll mode '{other}' (element, to, by)"
            )))
        }
    };

    let result = eval_on(ctx, &client, sid, &script, DP_TIMEOUT).await?;
    if result["value"].as_bool() != Some(true) {
        return Err(HandlerError::user(format!("element not found: {}", p.selector)));
    }
    Ok(serde_json::Value::Null)
}
