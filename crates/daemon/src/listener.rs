// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! Each accepted connection runs on its own task: framed request in,
//! dispatch, framed response out, repeat until the client hangs up.
//! Connections are tracked so shutdown can drain in-flight requests.

use std::sync::Arc;

use bp_wire::ProtocolError;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info};

use crate::env::{drain_timeout, ipc_timeout};
use crate::handlers;
use crate::state::Ctx;

pub struct Listener {
    unix: UnixListener,
    ctx: Arc<Ctx>,
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<Ctx>) -> Self {
        Self { unix, ctx }
    }

    /// Accept loop. Returns after shutdown once in-flight connections have
    /// drained (bounded by the drain timeout).
    pub async fn run(self) {
        let shutdown = self.ctx.shutdown_token();
        let tracker = TaskTracker::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.unix.accept() => {
                    match result {
                        Ok((stream, _)) => {
                            let ctx = Arc::clone(&self.ctx);
                            tracker.spawn(async move {
                                match handle_connection(stream, ctx).await {
                                    Ok(()) | Err(ProtocolError::ConnectionClosed) => {
                                        debug!("client disconnected");
                                    }
                                    Err(e) => error!(error = %e, "connection error"),
                                }
                            });
                        }
                        Err(e) => error!(error = %e, "accept error"),
                    }
                }
            }
        }

        tracker.close();
        if tokio::time::timeout(drain_timeout(), tracker.wait()).await.is_err() {
            info!("drain timeout; abandoning in-flight connections");
        }
    }
}

/// Serve one connection until EOF. A client may keep its connection open
/// across many requests (the REPL does).
async fn handle_connection(stream: UnixStream, ctx: Arc<Ctx>) -> Result<(), ProtocolError> {
    let (mut reader, mut writer) = stream.into_split();
    loop {
        let request = match bp_wire::read_request(&mut reader).await {
            Ok(request) => request,
            Err(ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };

        let is_shutdown = request.cmd == "shutdown";
        let response = handlers::dispatch(&ctx, &request).await;
        bp_wire::write_response(&mut writer, &response, ipc_timeout()).await?;

        if is_shutdown {
            return Ok(());
        }
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
