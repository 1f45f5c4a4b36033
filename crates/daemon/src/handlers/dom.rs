// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Script evaluation, HTML/CSS extraction, screenshots.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use serde::Deserialize;
use serde_json::json;

use super::{active_session, guard, live_client, params, wait_timeout, HandlerError, DP_TIMEOUT};
use crate::cdp::Client;
use crate::state::Ctx;

/// Evaluate an expression on a session and return the `result` remote
/// object. JavaScript exceptions surface as `HandlerError::Js` with the
/// exception's description.
pub(super) async fn eval_on(
    ctx: &Arc<Ctx>,
    client: &Client,
    session_id: &str,
    expression: &str,
    timeout: Duration,
) -> Result<serde_json::Value, HandlerError> {
    let result = guard(
        ctx,
        client
            .send_to_session(
                session_id,
                "Runtime.evaluate",
                Some(json!({
                    "expression": expression,
                    "awaitPromise": true,
                    "returnByValue": true,
                })),
                timeout,
            )
            .await,
    )?;
    if let Some(details) = result.get("exceptionDetails") {
        let message = details
            .pointer("/exception/description")
            .and_then(|v| v.as_str())
            .or_else(|| details.get("text").and_then(|v| v.as_str()))
            .unwrap_or("javascript exception");
        return Err(HandlerError::Js(message.to_string()));
    }
    Ok(result.get("result").cloned().unwrap_or(serde_json::Value::Null))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EvalParams {
    expression: String,
    timeout: Option<u64>,
}

pub(super) async fn eval(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: EvalParams = params(raw)?;
    if p.expression.is_empty() {
        return Err(HandlerError::InvalidParams("expression is required".to_string()));
    }
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;

    let result =
        eval_on(ctx, &client, &session.session_id, &p.expression, wait_timeout(p.timeout)).await?;
    if result["type"].as_str() == Some("undefined") {
        return Ok(json!({"hasValue": false}));
    }
    Ok(json!({"value": result["value"], "hasValue": true}))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HtmlParams {
    selector: String,
}

pub(super) async fn html(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: HtmlParams = params(raw)?;
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;
    let sid = session.session_id.as_str();

    if p.selector.is_empty() {
        return full_document_html(ctx, &client, sid).await;
    }

    // Wait for at least an interactive DOM, then collect matches
    let selector_json = json!(p.selector).to_string();
    let script = format!(
        r#"new Promise((resolve) => {{
            const collect = () => {{
                const els = document.querySelectorAll({selector_json});
                if (!els.length) {{ resolve(null); return; }}
                resolve(Array.from(els).map((el) => ({{
                    tag: el.tagName.toLowerCase(),
                    id: el.id,
                    class: el.className,
                    html: el.outerHTML,
                }})));
            }};
            if (document.readyState === 'loading') {{
                document.addEventListener('DOMContentLoaded', collect, {{once: true}});
            }} else {{
                collect();
            }}
        }})"#
    );
    let result = eval_on(ctx, &client, sid, &script, DP_TIMEOUT).await?;
    let value = &result["value"];
    if value.is_null() {
        return Err(HandlerError::user(format!("no elements match selector: {}", p.selector)));
    }
    let multi = value.as_array().cloned().unwrap_or_default();
    let legacy = multi
        .iter()
        .filter_map(|m| m["html"].as_str())
        .collect::<Vec<_>>()
        .join("\n--\n");
    Ok(json!({"html": legacy, "htmlMulti": multi}))
}

/// Full-document extraction goes window → callFunctionOn → DOM.getOuterHTML.
/// A bare `Runtime.evaluate("document.documentElement.outerHTML")` blocks
/// behind network-idle under load; this detour does not.
async fn full_document_html(
    ctx: &Arc<Ctx>,
    client: &Client,
    sid: &str,
) -> Result<serde_json::Value, HandlerError> {
    let window = guard(
        ctx,
        client
            .send_to_session(sid, "Runtime.evaluate", Some(json!({"expression": "window"})), DP_TIMEOUT)
            .await,
    )?;
    let Some(window_id) = window["result"]["objectId"].as_str() else {
        return Err(HandlerError::user("could not resolve window object"));
    };

    let root = guard(
        ctx,
        client
            .send_to_session(
                sid,
                "Runtime.callFunctionOn",
                Some(json!({
                    "objectId": window_id,
                    "functionDeclaration": "function() { return document.documentElement; }",
                })),
                DP_TIMEOUT,
            )
            .await,
    )?;
    let Some(root_id) = root["result"]["objectId"].as_str() else {
        return Err(HandlerError::user("could not resolve document element"));
    };

    let html = guard(
        ctx,
        client
            .send_to_session(sid, "DOM.getOuterHTML", Some(json!({"objectId": root_id})), DP_TIMEOUT)
            .await,
    )?;
    Ok(json!({"html": html["outerHTML"]}))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CssParams {
    action: String,
    selector: String,
    property: String,
}

pub(super) async fn css(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: CssParams = params(raw)?;
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;
    let sid = session.session_id.as_str();

    match p.action.as_str() {
        "save" | "" => {
            let script = r#"(() => {
                let out = '';
                for (const sheet of document.styleSheets) {
                    const href = sheet.href || 'inline';
                    out += '/* ' + href + ' */\n';
                    try {
                        for (const rule of sheet.cssRules) { out += rule.cssText + '\n'; }
                    } catch (e) {
                        out += '/* blocked by CORS */\n';
                    }
                    out += '\n';
                }
                return out;
            })()"#;
            let result = eval_on(ctx, &client, sid, script, DP_TIMEOUT).await?;
            Ok(json!({"css": result["value"]}))
        }
        "computed" => {
            let selector_json = require_selector(&p)?;
            let script = format!(
                r#"(() => {{
                    const els = document.querySelectorAll({selector_json});
                    if (!els.length) return null;
                    return Array.from(els).map((el) => {{
                        const cs = getComputedStyle(el);
                        const styles = {{}};
                        for (let i = 0; i < cs.length; i++) {{
                            styles[cs[i]] = cs.getPropertyValue(cs[i]);
                        }}
                        return {{tag: el.tagName.toLowerCase(), id: el.id, class: el.className, styles}};
                    }});
                }})()"#
            );
            let result = eval_on(ctx, &client, sid, &script, DP_TIMEOUT).await?;
            no_match_if_null(&result, &p.selector)?;
            Ok(json!({"computed": result["value"]}))
        }
        "get" => {
            let selector_json = require_selector(&p)?;
            if p.property.is_empty() {
                return Err(HandlerError::InvalidParams("property is required".to_string()));
            }
            let property_json = json!(p.property).to_string();
            let script = format!(
                r#"(() => {{
                    const el = document.querySelector({selector_json});
                    if (!el) return null;
                    return getComputedStyle(el).getPropertyValue({property_json});
                }})()"#
            );
            let result = eval_on(ctx, &client, sid, &script, DP_TIMEOUT).await?;
            no_match_if_null(&result, &p.selector)?;
            Ok(json!({"value": result["value"]}))
        }
        "inline" => {
            let selector_json = require_selector(&p)?;
            let script = format!(
                r#"(() => {{
                    const els = document.querySelectorAll({selector_json});
                    if (!els.length) return null;
                    return Array.from(els).map((el) => ({{
                        tag: el.tagName.toLowerCase(),
                        id: el.id,
                        class: el.className,
                        style: el.getAttribute('style') || '',
                    }}));
                }})()"#
            );
            let result = eval_on(ctx, &client, sid, &script, DP_TIMEOUT).await?;
            no_match_if_null(&result, &p.selector)?;
            Ok(json!({"inline": result["value"]}))
        }
        "matched" => {
            if p.selector.is_empty() {
                return Err(HandlerError::InvalidParams("selector is required".to_string()));
            }
            guard(
                ctx,
                client.send_to_session(sid, "CSS.enable", Some(json!({})), DP_TIMEOUT).await,
            )?;
            let Some(node_id) = super::nav::query_selector(ctx, &client, sid, &p.selector).await?
            else {
                return Err(HandlerError::user(format!(
                    "no elements match selector: {}",
                    p.selector
                )));
            };
            let matched = guard(
                ctx,
                client
                    .send_to_session(
                        sid,
                        "CSS.getMatchedStylesForNode",
                        Some(json!({"nodeId": node_id})),
                        DP_TIMEOUT,
                    )
                    .await,
            )?;
            let rules: Vec<serde_json::Value> = matched["matchedCSSRules"]
                .as_array()
                .map(|rules| {
                    rules
                        .iter()
                        .filter(|m| m["rule"]["origin"].as_str() != Some("user-agent"))
                        .map(|m| {
                            json!({
                                "selector": m["rule"]["selectorList"]["text"],
                                "origin": m["rule"]["origin"],
                                "cssText": m["rule"]["style"]["cssText"],
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            Ok(json!({"matched": rules}))
        }
        other => Err(HandlerError::InvalidParams(format!(
            "unknown css action '{other}' (save, computed, get, inline, matched)"
        ))),
    }
}

fn require_selector(p: &CssParams) -> Result<String, HandlerError> {
    if p.selector.is_empty() {
        return Err(HandlerError::InvalidParams("selector is required".to_string()));
    }
    Ok(json!(p.selector).to_string())
}

fn no_match_if_null(result: &serde_json::Value, selector: &str) -> Result<(), HandlerError> {
    if result["value"].is_null() {
        return Err(HandlerError::user(format!("no elements match selector: {selector}")));
    }
    Ok(())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ScreenshotParams {
    full_page: bool,
}

pub(super) async fn screenshot(
    ctx: &Arc<Ctx>,
    raw: &serde_json::Value,
) -> Result<serde_json::Value, HandlerError> {
    let p: ScreenshotParams = params(raw)?;
    let session = active_session(ctx)?;
    let client = live_client(ctx)?;

    let result = guard(
        ctx,
        client
            .send_to_session(
                &session.session_id,
                "Page.captureScreenshot",
                Some(json!({"format": "png", "captureBeyondViewport": p.full_page})),
                DP_TIMEOUT,
            )
            .await,
    )?;
    let Some(data) = result["data"].as_str() else {
        return Err(HandlerError::user("screenshot returned no data"));
    };
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(data)
        .map_err(|e| HandlerError::Internal(format!("bad screenshot payload: {e}")))?;
    Ok(json!({"data": data, "size": bytes.len()}))
}
