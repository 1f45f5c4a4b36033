// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Browser Pilot core types
//!
//! Domain types shared by the daemon and the CLI: the observational ring
//! buffer, the session registry, console/network records, connection health,
//! and keyboard event descriptors. This crate does no I/O and holds no async
//! state so both binaries can depend on it freely.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod console;
pub mod health;
pub mod keys;
pub mod network;
pub mod ring;
pub mod session;
pub mod time;

pub use console::{ConsoleEntry, ConsoleKind};
pub use health::{ConnectionInfo, ConnectionState};
pub use keys::KeyEvent;
pub use network::NetworkEntry;
pub use ring::Ring;
pub use session::{Session, SessionMap};
