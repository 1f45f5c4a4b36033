// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command-line argument definitions, shared by `main` and the REPL.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "bp",
    version = crate::env::VERSION,
    about = "Browser Pilot - drive a browser from the command line"
)]
pub struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    pub output: OutputFormat,

    /// Echo request handling details in the daemon log
    #[arg(long, global = true)]
    pub debug: bool,

    /// Timeout in seconds for commands that wait
    #[arg(long, global = true, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show daemon, browser, and session status
    Status,
    /// Start the daemon (launches the browser)
    Start,
    /// Stop the daemon (closes the browser)
    Stop,
    /// Ask the daemon to re-establish its browser connection
    Reconnect,
    /// List sessions, or select one by id prefix / title substring
    Target {
        /// Session query; empty lists all sessions
        query: Option<String>,
    },
    /// Clear observational buffers
    Clear {
        /// What to clear: console, network, or all
        #[arg(default_value = "all")]
        what: String,
    },
    /// Navigate the active session
    Navigate {
        url: String,
        /// Wait for the page load event
        #[arg(long)]
        wait: bool,
    },
    /// Reload the current page
    Reload {
        #[arg(long)]
        wait: bool,
        /// Bypass the browser cache
        #[arg(long = "ignore-cache")]
        ignore_cache: bool,
    },
    /// Go back in the session's history
    Back {
        #[arg(long)]
        wait: bool,
    },
    /// Go forward in the session's history
    Forward {
        #[arg(long)]
        wait: bool,
    },
    /// Wait until the page is ready
    Ready {
        /// Wait for a selector to match
        #[arg(long = "select", value_name = "SELECTOR")]
        selector: Option<String>,
        /// Wait for an expression to be truthy
        #[arg(long, value_name = "EXPRESSION")]
        eval: Option<String>,
        /// Wait for the network to go idle
        #[arg(long = "network-idle")]
        network_idle: bool,
    },
    /// Print console entries for the active session
    Console {
        /// Keep only the first N entries
        #[arg(long, value_name = "N")]
        head: Option<usize>,
        /// Keep only the last N entries
        #[arg(long, value_name = "N")]
        tail: Option<usize>,
    },
    /// Print network entries for the active session
    Network {
        #[arg(long, value_name = "N")]
        head: Option<usize>,
        #[arg(long, value_name = "N")]
        tail: Option<usize>,
    },
    /// Capture a PNG screenshot
    Screenshot {
        /// Output file (default: screenshot-<timestamp>.png)
        file: Option<PathBuf>,
        /// Capture the full page, not just the viewport
        #[arg(long = "full-page")]
        full_page: bool,
    },
    /// Print page HTML, optionally filtered by selector
    Html {
        /// Output file (default: stdout)
        file: Option<PathBuf>,
        #[arg(long = "select", value_name = "SELECTOR")]
        selector: Option<String>,
    },
    /// Inspect page CSS
    Css {
        #[command(subcommand)]
        action: CssAction,
    },
    /// Evaluate JavaScript in the active session
    Eval {
        expression: String,
    },
    /// Manage cookies
    Cookies {
        #[command(subcommand)]
        action: Option<CookieAction>,
    },
    /// Click an element
    Click {
        selector: String,
    },
    /// Focus an element
    Focus {
        selector: String,
    },
    /// Type text into the focused (or selected) element
    Type {
        text: String,
        /// Focus this element first
        #[arg(long = "select", value_name = "SELECTOR")]
        selector: Option<String>,
        /// Press a named key after typing (e.g. Enter)
        #[arg(long)]
        key: Option<String>,
        /// Clear the field first (select-all + backspace)
        #[arg(long)]
        clear: bool,
    },
    /// Press a named key
    Key {
        key: String,
        #[arg(long)]
        alt: bool,
        #[arg(long)]
        ctrl: bool,
        #[arg(long)]
        meta: bool,
        #[arg(long)]
        shift: bool,
    },
    /// Set a <select> element's value (dispatches a change event)
    Select {
        selector: String,
        value: String,
    },
    /// Scroll the page or an element into view
    Scroll {
        #[command(subcommand)]
        mode: ScrollMode,
    },
    /// Interactive command prompt
    Repl,
    /// Serve a directory with live reload
    Serve {
        /// Directory to serve (default: current directory)
        dir: Option<PathBuf>,
        #[arg(long, default_value_t = 8377)]
        port: u16,
    },
    /// Removed; use `html --select`
    #[command(hide = true)]
    Find {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        rest: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CssAction {
    /// Concatenate all readable stylesheet rules
    Save {
        /// Output file (default: stdout)
        file: Option<PathBuf>,
    },
    /// Computed styles for every element matching a selector
    Computed { selector: String },
    /// A single computed property of the first match
    Get { selector: String, property: String },
    /// Inline style attributes of matching elements
    Inline { selector: String },
    /// Stylesheet rules matching the first match (user-agent rules skipped)
    Matched { selector: String },
}

#[derive(Debug, Subcommand)]
pub enum CookieAction {
    /// List cookies visible to the active session
    List,
    /// Set a cookie (scoped to the active page unless --domain is given)
    Set {
        name: String,
        value: String,
        #[arg(long)]
        domain: Option<String>,
        #[arg(long)]
        path: Option<String>,
        #[arg(long)]
        secure: bool,
        #[arg(long = "http-only")]
        http_only: bool,
        #[arg(long = "same-site", value_name = "Strict|Lax|None")]
        same_site: Option<String>,
        /// Expiry in seconds from now
        #[arg(long = "max-age", value_name = "SECONDS")]
        max_age: Option<i64>,
    },
    /// Delete a cookie by name (idempotent)
    Delete {
        name: String,
        /// Disambiguate when several domains carry the cookie
        #[arg(long)]
        domain: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ScrollMode {
    /// Scroll an element into view (centered)
    Element { selector: String },
    /// Scroll to absolute coordinates
    To { x: f64, y: f64 },
    /// Scroll by a delta
    By { x: f64, y: f64 },
}

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;
