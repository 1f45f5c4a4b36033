// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! bp - Browser Pilot CLI

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod args;
mod client;
mod color;
mod commands;
mod daemon_process;
mod env;
mod output;
mod repl;
mod serve;

use clap::Parser;

use crate::args::Cli;
use crate::commands::CommandCtx;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let ctx = CommandCtx { output: cli.output, debug: cli.debug, timeout: cli.timeout };

    if let Err(e) = commands::execute(&ctx, cli.command).await {
        eprintln!("{}", color::paint(color::codes::ERROR, &format!("error: {e}")));
        std::process::exit(1);
    }
}
