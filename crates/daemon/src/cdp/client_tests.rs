// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client tests against an in-process WebSocket server.

use super::*;
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::tungstenite::Message;

const T: Duration = Duration::from_secs(5);

/// Bind a loopback server, hand the accepted WebSocket to `serve`.
async fn spawn_server<F, Fut>(serve: F) -> String
where
    F: FnOnce(tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>) -> Fut
        + Send
        + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        if let Ok((stream, _)) = listener.accept().await {
            let ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            serve(ws).await;
        }
    });
    format!("ws://{addr}")
}

/// Echo server: replies to every request with `{"echo": <method>}`.
async fn echo_server() -> String {
    spawn_server(|mut ws| async move {
        while let Some(Ok(msg)) = ws.next().await {
            if let Message::Text(text) = msg {
                let v: serde_json::Value = serde_json::from_str(&text).unwrap();
                let reply = serde_json::json!({
                    "id": v["id"],
                    "result": {"echo": v["method"]},
                });
                if ws.send(Message::Text(reply.to_string().into())).await.is_err() {
                    break;
                }
            }
        }
    })
    .await
}

#[tokio::test]
async fn send_correlates_response_by_id() {
    let url = echo_server().await;
    let client = Client::dial(&url).await.unwrap();

    let result = client.send("Browser.getVersion", None, T).await.unwrap();
    assert_eq!(result["echo"], "Browser.getVersion");
}

#[tokio::test]
async fn concurrent_sends_each_get_their_own_response() {
    let url = spawn_server(|mut ws| async move {
        // Collect both requests, answer in reverse order to prove
        // correlation is by id, not arrival order.
        let mut frames = Vec::new();
        while frames.len() < 2 {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    frames.push(serde_json::from_str::<serde_json::Value>(&text).unwrap());
                }
                _ => return,
            }
        }
        for v in frames.iter().rev() {
            let reply = serde_json::json!({"id": v["id"], "result": {"method": v["method"]}});
            ws.send(Message::Text(reply.to_string().into())).await.unwrap();
        }
    })
    .await;

    let client = Client::dial(&url).await.unwrap();
    let (a, b) = tokio::join!(
        client.send("First.method", None, T),
        client.send("Second.method", None, T),
    );
    assert_eq!(a.unwrap()["method"], "First.method");
    assert_eq!(b.unwrap()["method"], "Second.method");
}

#[tokio::test]
async fn request_ids_are_unique_and_increasing() {
    let url = spawn_server(|mut ws| async move {
        let mut seen = Vec::new();
        while seen.len() < 8 {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => {
                    let v: serde_json::Value = serde_json::from_str(&text).unwrap();
                    seen.push(v["id"].as_u64().unwrap());
                    let reply = serde_json::json!({"id": v["id"], "result": {"ids": seen}});
                    ws.send(Message::Text(reply.to_string().into())).await.unwrap();
                }
                _ => return,
            }
        }
    })
    .await;

    let client = Client::dial(&url).await.unwrap();
    let mut last = Vec::new();
    for _ in 0..8 {
        last = client.send("M", None, T).await.unwrap()["ids"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_u64().unwrap())
            .collect();
    }
    let mut sorted = last.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 8, "ids must be unique: {last:?}");
}

#[tokio::test]
async fn session_id_is_tagged_on_the_frame() {
    let url = spawn_server(|mut ws| async move {
        if let Some(Ok(Message::Text(text))) = ws.next().await {
            let v: serde_json::Value = serde_json::from_str(&text).unwrap();
            let reply = serde_json::json!({
                "id": v["id"],
                "result": {"sessionId": v["sessionId"]},
            });
            ws.send(Message::Text(reply.to_string().into())).await.unwrap();
        }
    })
    .await;

    let client = Client::dial(&url).await.unwrap();
    let result = client.send_to_session("sess-9", "Runtime.evaluate", None, T).await.unwrap();
    assert_eq!(result["sessionId"], "sess-9");
}

#[tokio::test]
async fn protocol_error_payload_surfaces() {
    let url = spawn_server(|mut ws| async move {
        if let Some(Ok(Message::Text(text))) = ws.next().await {
            let v: serde_json::Value = serde_json::from_str(&text).unwrap();
            let reply = serde_json::json!({
                "id": v["id"],
                "error": {"code": -32601, "message": "'No.Such' wasn't found"},
            });
            ws.send(Message::Text(reply.to_string().into())).await.unwrap();
        }
    })
    .await;

    let client = Client::dial(&url).await.unwrap();
    match client.send("No.Such", None, T).await {
        Err(CdpError::Protocol { code, message }) => {
            assert_eq!(code, -32601);
            assert!(message.contains("No.Such"));
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
}

/// Server that waits for one request, emits the given events, then answers
/// the request — so events land strictly before the response completes and
/// after the client has subscribed.
async fn events_then_reply_server(events: Vec<serde_json::Value>) -> String {
    spawn_server(move |mut ws| async move {
        let Some(Ok(Message::Text(text))) = ws.next().await else { return };
        let request: serde_json::Value = serde_json::from_str(&text).unwrap();
        for event in events {
            ws.send(Message::Text(event.to_string().into())).await.unwrap();
        }
        let reply = serde_json::json!({"id": request["id"], "result": {}});
        ws.send(Message::Text(reply.to_string().into())).await.unwrap();
        while ws.next().await.is_some() {}
    })
    .await
}

#[tokio::test]
async fn events_dispatch_in_wire_order() {
    let events = (0..5)
        .map(|i| {
            serde_json::json!({
                "method": "Test.event",
                "params": {"seq": i},
                "sessionId": "s1",
            })
        })
        .collect();
    let url = events_then_reply_server(events).await;

    let client = Client::dial(&url).await.unwrap();
    let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
    {
        let seen = std::sync::Arc::clone(&seen);
        client.subscribe("Test.event", move |event| {
            seen.lock().push(event.params["seq"].as_u64().unwrap());
            assert_eq!(event.session_id.as_deref(), Some("s1"));
        });
    }

    // The response is written after the events, so once it resolves every
    // event has already been dispatched in wire order
    client.send("Start.events", None, T).await.unwrap();
    assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
}

#[tokio::test]
async fn multiple_handlers_run_in_registration_order() {
    let url =
        events_then_reply_server(vec![serde_json::json!({"method": "Test.event", "params": {}})])
            .await;

    let client = Client::dial(&url).await.unwrap();
    let order = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
    for tag in ["first", "second", "third"] {
        let order = std::sync::Arc::clone(&order);
        client.subscribe("Test.event", move |_| order.lock().push(tag));
    }

    client.send("Start.events", None, T).await.unwrap();
    assert_eq!(*order.lock(), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn pending_requests_fail_when_server_disconnects() {
    let url = spawn_server(|mut ws| async move {
        // Read the request, then drop the connection without replying
        let _ = ws.next().await;
    })
    .await;

    let client = Client::dial(&url).await.unwrap();
    match client.send("Never.answered", None, T).await {
        Err(e) => assert!(e.is_connection_lost(), "unexpected error kind: {e}"),
        Ok(v) => panic!("expected failure, got {v}"),
    }
}

#[tokio::test]
async fn close_is_idempotent_and_rejects_later_sends() {
    let url = echo_server().await;
    let client = Client::dial(&url).await.unwrap();

    client.close().await;
    client.close().await;
    assert!(client.is_closed());

    match client.send("After.close", None, T).await {
        Err(CdpError::Closed { .. }) => {}
        other => panic!("expected Closed, got {other:?}"),
    }
}

#[tokio::test]
async fn timed_out_request_is_removed_from_pending() {
    let url = spawn_server(|mut ws| async move {
        // Never reply; keep the socket open
        while ws.next().await.is_some() {}
    })
    .await;

    let client = Client::dial(&url).await.unwrap();
    match client.send("Slow.method", None, Duration::from_millis(50)).await {
        Err(CdpError::Timeout { method }) => assert_eq!(method, "Slow.method"),
        other => panic!("expected timeout, got {other:?}"),
    }
}
