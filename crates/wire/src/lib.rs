// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol between the `bp` CLI and the `bpd` daemon.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload.
//!
//! The payload shapes are fixed structs rather than tagged enums because the
//! `cmd` strings are an external contract shared with the CLI verb surface.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod request;
mod response;
mod status;
mod wire;

pub use request::Request;
pub use response::Response;
pub use status::{SessionStatus, StatusData, TargetData};
pub use wire::{
    decode, encode, read_message, read_request, write_message, write_request, write_response,
    ProtocolError, MAX_MESSAGE_SIZE,
};
