// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use super::error::CdpError;
use super::msg::{CdpEvent, Incoming, OutgoingRequest};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

type PendingMap = HashMap<u64, oneshot::Sender<Result<serde_json::Value, CdpError>>>;
type EventHandler = Box<dyn Fn(&CdpEvent) + Send + Sync>;
type SubscriberMap = HashMap<String, Vec<EventHandler>>;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Protocol client for one WebSocket connection.
///
/// Replaced wholesale on reconnection; request ids restart at 1 on each new
/// client. Subscribers run synchronously on the read task in registration
/// order and must not block — anything that issues a protocol call from an
/// event handler has to spawn, or it would deadlock the read loop its own
/// response arrives on.
pub struct Client {
    next_id: AtomicU64,
    sink: tokio::sync::Mutex<Option<WsSink>>,
    pending: Arc<Mutex<PendingMap>>,
    subscribers: Arc<RwLock<SubscriberMap>>,
    closed: Arc<AtomicBool>,
    close_code: Arc<Mutex<Option<u16>>>,
    read_task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl Client {
    /// Connect to the browser's WebSocket endpoint.
    pub async fn dial(ws_url: &str) -> Result<Arc<Self>, CdpError> {
        let stream = match tokio::time::timeout(
            CONNECT_TIMEOUT,
            tokio_tungstenite::connect_async(ws_url),
        )
        .await
        {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => return Err(CdpError::Connect(e.to_string())),
            Err(_) => return Err(CdpError::Connect("connect timeout".to_string())),
        };

        let (sink, source) = stream.split();
        let pending: Arc<Mutex<PendingMap>> = Arc::new(Mutex::new(HashMap::new()));
        let subscribers: Arc<RwLock<SubscriberMap>> = Arc::new(RwLock::new(HashMap::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let close_code = Arc::new(Mutex::new(None));

        let task = tokio::spawn(read_loop(
            source,
            Arc::clone(&pending),
            Arc::clone(&subscribers),
            Arc::clone(&closed),
            Arc::clone(&close_code),
        ));

        debug!(url = %ws_url, "protocol client connected");

        Ok(Arc::new(Self {
            next_id: AtomicU64::new(1),
            sink: tokio::sync::Mutex::new(Some(sink)),
            pending,
            subscribers,
            closed,
            close_code,
            read_task: Mutex::new(Some(task)),
        }))
    }

    /// Send a browser-scoped request (no session id).
    pub async fn send(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<serde_json::Value, CdpError> {
        self.call(None, method, params, timeout).await
    }

    /// Send a request addressed to a session.
    pub async fn send_to_session(
        &self,
        session_id: &str,
        method: &str,
        params: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<serde_json::Value, CdpError> {
        self.call(Some(session_id), method, params, timeout).await
    }

    async fn call(
        &self,
        session_id: Option<&str>,
        method: &str,
        params: Option<serde_json::Value>,
        timeout: Duration,
    ) -> Result<serde_json::Value, CdpError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(CdpError::Closed { code: self.close_code() });
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let frame = serde_json::to_string(&OutgoingRequest {
            id,
            method,
            params: params.as_ref(),
            session_id,
        })
        .map_err(|e| CdpError::Encode(e.to_string()))?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, tx);

        {
            let mut sink = self.sink.lock().await;
            let Some(sink) = sink.as_mut() else {
                self.pending.lock().remove(&id);
                return Err(CdpError::Closed { code: self.close_code() });
            };
            if let Err(e) = sink.send(Message::Text(frame.into())).await {
                self.pending.lock().remove(&id);
                return Err(CdpError::Send(e.to_string()));
            }
        }

        trace!(id, method, "request sent");

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::ClosedWhileWaiting { code: self.close_code() }),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout { method: method.to_string() })
            }
        }
    }

    /// Register an event handler for a method. Multiple handlers per method
    /// run in registration order on the read task.
    pub fn subscribe(&self, method: &str, handler: impl Fn(&CdpEvent) + Send + Sync + 'static) {
        self.subscribers.write().entry(method.to_string()).or_default().push(Box::new(handler));
    }

    /// Whether the connection is known dead.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Close code received from the peer, if any.
    pub fn close_code(&self) -> Option<u16> {
        *self.close_code.lock()
    }

    /// Close the connection. Idempotent; pending requests complete with a
    /// closed error.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(mut sink) = self.sink.lock().await.take() {
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.flush().await;
        }
        let code = self.close_code();
        let drained: Vec<_> = {
            let mut pending = self.pending.lock();
            pending.drain().collect()
        };
        for (_, tx) in drained {
            let _ = tx.send(Err(CdpError::ClosedWhileWaiting { code }));
        }
        let task = self.read_task.lock().take();
        if let Some(task) = task {
            task.abort();
        }
    }
}

/// Single demultiplexing point for one WebSocket: responses complete their
/// pending promise, events dispatch synchronously to subscribers in wire
/// order.
async fn read_loop(
    mut source: WsSource,
    pending: Arc<Mutex<PendingMap>>,
    subscribers: Arc<RwLock<SubscriberMap>>,
    closed: Arc<AtomicBool>,
    close_code: Arc<Mutex<Option<u16>>>,
) {
    while let Some(msg) = source.next().await {
        match msg {
            Ok(Message::Text(text)) => handle_frame(&text, &pending, &subscribers),
            Ok(Message::Close(frame)) => {
                if let Some(frame) = frame {
                    *close_code.lock() = Some(u16::from(frame.code));
                    debug!(code = u16::from(frame.code), "received close frame");
                }
                break;
            }
            Ok(_) => {} // Ping/Pong/Binary — ignore
            Err(e) => {
                warn!(error = %e, "websocket read error");
                break;
            }
        }
    }

    closed.store(true, Ordering::SeqCst);
    let code = *close_code.lock();
    let drained: Vec<_> = {
        let mut pending = pending.lock();
        pending.drain().collect()
    };
    for (_, tx) in drained {
        let _ = tx.send(Err(CdpError::ClosedWhileWaiting { code }));
    }
}

fn handle_frame(
    text: &str,
    pending: &Arc<Mutex<PendingMap>>,
    subscribers: &Arc<RwLock<SubscriberMap>>,
) {
    let frame: Incoming = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            warn!(error = %e, "unparseable frame");
            return;
        }
    };

    if let Some(id) = frame.id {
        let Some(tx) = pending.lock().remove(&id) else {
            // Response for a timed-out or cancelled request
            trace!(id, "orphan response");
            return;
        };
        let result = match frame.error {
            Some(err) => Err(CdpError::Protocol { code: err.code, message: err.message }),
            None => Ok(frame.result.unwrap_or(serde_json::Value::Null)),
        };
        let _ = tx.send(result);
        return;
    }

    if let Some(method) = frame.method {
        let event =
            CdpEvent { method, params: frame.params, session_id: frame.session_id };
        let subs = subscribers.read();
        if let Some(handlers) = subs.get(&event.method) {
            for handler in handlers {
                handler(&event);
            }
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
