// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interactive REPL: reads lines, parses each with the same clap tree the
//! CLI uses, and executes against the running daemon. The prompt shows the
//! active session's title so it's obvious which tab commands will hit.

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::args::{Cli, Commands};
use crate::client::DaemonClient;
use crate::commands::{self, CommandCtx};

pub(crate) async fn run(ctx: &CommandCtx) -> Result<()> {
    println!("bp repl — 'help' for commands, 'quit' to leave");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        print_prompt().await;
        let Some(line) = lines.next_line().await? else {
            // EOF (Ctrl-D)
            println!();
            return Ok(());
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line {
            "quit" | "exit" | "q" => return Ok(()),
            "help" | "?" => {
                print_help();
                continue;
            }
            _ => {}
        }

        let tokens = match tokenize(line) {
            Ok(tokens) => tokens,
            Err(e) => {
                eprintln!("error: {e}");
                continue;
            }
        };

        let parsed = Cli::try_parse_from(std::iter::once("bp".to_string()).chain(tokens));
        let cli = match parsed {
            Ok(cli) => cli,
            Err(e) => {
                // Clap renders its own help/usage output
                eprintln!("{e}");
                continue;
            }
        };

        if matches!(cli.command, Commands::Repl) {
            eprintln!("already in a repl");
            continue;
        }

        let line_ctx = CommandCtx {
            output: cli.output,
            debug: ctx.debug || cli.debug,
            timeout: cli.timeout.or(ctx.timeout),
        };
        if let Err(e) = commands::execute(&line_ctx, cli.command).await {
            eprintln!("error: {e}");
        }
    }
}

/// Best-effort prompt from the active session title; a bare "bp" when the
/// daemon is unreachable.
async fn print_prompt() {
    use std::io::Write;

    let label = active_label().await.unwrap_or_default();
    if label.is_empty() {
        print!("bp> ");
    } else {
        print!("bp ({label})> ");
    }
    let _ = std::io::stdout().flush();
}

async fn active_label() -> Option<String> {
    let client = DaemonClient::connect().ok()?;
    let data = client.request("status", serde_json::json!({}), false).await.ok()?;
    let active = data.get("activeSession")?;
    let title = active["title"].as_str().unwrap_or_default();
    if title.is_empty() {
        active["url"].as_str().map(str::to_string)
    } else {
        Some(title.to_string())
    }
}

fn print_help() {
    println!("commands: status, target, navigate, reload, back, forward, ready,");
    println!("          console, network, html, css, eval, screenshot, cookies,");
    println!("          click, focus, type, key, select, scroll, clear, reconnect,");
    println!("          start, stop, serve");
    println!("any command accepts the same flags as the bp CLI; 'quit' leaves");
}

/// Split a line into tokens, honoring single and double quotes.
fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) => {
                if c == q {
                    quote = None;
                } else {
                    current.push(c);
                }
            }
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_token = true;
                }
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }
    if quote.is_some() {
        return Err("unterminated quote".to_string());
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
#[path = "repl_tests.rs"]
mod tests;
