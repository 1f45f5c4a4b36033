// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Static development server with live reload.
//!
//! Serves a directory, watching it for changes; served HTML gets a small
//! script injected that reconnects to `/__bp_reload` and reloads the page
//! whenever the watcher fires. Purely a front-end convenience — the daemon
//! is not involved.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::body::Body;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use notify::{EventKind, RecursiveMode, Watcher};
use tokio::sync::broadcast;
use tower_http::services::ServeDir;

/// Cap for buffering an HTML response during script injection.
const MAX_INJECT_BYTES: usize = 16 * 1024 * 1024;

const RELOAD_SCRIPT: &str = r#"<script>(() => {
  const ws = new WebSocket(`ws://${location.host}/__bp_reload`);
  ws.onmessage = () => location.reload();
  ws.onclose = () => setTimeout(() => location.reload(), 1000);
})();</script>"#;

pub(crate) async fn run(dir: PathBuf, port: u16) -> Result<()> {
    let dir = dir
        .canonicalize()
        .with_context(|| format!("resolving directory {}", dir.display()))?;

    let (reload_tx, _) = broadcast::channel::<()>(16);
    spawn_watcher(dir.clone(), reload_tx.clone())?;

    let app = Router::new()
        .route("/__bp_reload", get(reload_ws))
        .fallback_service(ServeDir::new(dir.clone()))
        .layer(middleware::from_fn(inject_html))
        .with_state(reload_tx);

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("binding 127.0.0.1:{port}"))?;
    println!("serving {} at http://127.0.0.1:{port}/ (live reload on)", dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}

/// Forward filesystem events into the reload channel, coalescing bursts
/// (editors fire several events per save).
fn spawn_watcher(dir: PathBuf, tx: broadcast::Sender<()>) -> Result<()> {
    let (fs_tx, fs_rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |result| {
        let _ = fs_tx.send(result);
    })?;
    watcher.watch(&dir, RecursiveMode::Recursive)?;

    std::thread::spawn(move || {
        let _watcher = watcher;
        while let Ok(result) = fs_rx.recv() {
            let Ok(event) = result else { continue };
            if matches!(
                event.kind,
                EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
            ) {
                while fs_rx.recv_timeout(Duration::from_millis(100)).is_ok() {}
                let _ = tx.send(());
            }
        }
    });
    Ok(())
}

async fn reload_ws(
    ws: WebSocketUpgrade,
    State(tx): State<broadcast::Sender<()>>,
) -> Response {
    ws.on_upgrade(move |socket| reload_loop(socket, tx.subscribe()))
}

async fn reload_loop(mut socket: WebSocket, mut rx: broadcast::Receiver<()>) {
    while rx.recv().await.is_ok() {
        if socket.send(Message::Text("reload".into())).await.is_err() {
            return;
        }
    }
}

/// Buffer text/html responses and splice in the reload script.
async fn inject_html(request: axum::extract::Request, next: Next) -> Response {
    let response = next.run(request).await;
    let is_html = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("text/html"));
    if !is_html {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, MAX_INJECT_BYTES).await {
        Ok(bytes) => bytes,
        Err(_) => return Response::from_parts(parts, Body::empty()),
    };
    let injected = inject_reload_script(&String::from_utf8_lossy(&bytes));
    parts.headers.insert(CONTENT_LENGTH, injected.len().into());
    Response::from_parts(parts, Body::from(injected))
}

/// Insert the reload script before `</body>`, or append when the document
/// has no closing body tag.
fn inject_reload_script(html: &str) -> String {
    match html.rfind("</body>") {
        Some(at) => format!("{}{}{}", &html[..at], RELOAD_SCRIPT, &html[at..]),
        None => format!("{html}{RELOAD_SCRIPT}"),
    }
}

#[cfg(test)]
#[path = "serve_tests.rs"]
mod tests;
