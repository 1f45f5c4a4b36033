// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debugging-protocol client.
//!
//! One WebSocket to the browser carries three message kinds: requests we
//! send (correlated by numeric id), their responses, and unsolicited events.
//! The client demultiplexes all of them on a single read task and fans
//! events out to subscribers registered per method name.

mod client;
mod error;
mod msg;

pub use client::Client;
pub use error::CdpError;
pub use msg::CdpEvent;
