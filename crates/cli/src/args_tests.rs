// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use clap::Parser;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(std::iter::once("bp").chain(args.iter().copied())).unwrap()
}

#[test]
fn navigate_with_wait() {
    let cli = parse(&["navigate", "https://example.com", "--wait"]);
    match cli.command {
        Commands::Navigate { url, wait } => {
            assert_eq!(url, "https://example.com");
            assert!(wait);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn global_flags_apply_after_subcommand() {
    let cli = parse(&["eval", "1+1", "--timeout", "10", "-o", "json", "--debug"]);
    assert_eq!(cli.timeout, Some(10));
    assert!(cli.debug);
    assert!(matches!(cli.output, crate::output::OutputFormat::Json));
}

#[test]
fn ready_modes_parse() {
    let cli = parse(&["ready", "--select", "#app", "--network-idle"]);
    match cli.command {
        Commands::Ready { selector, eval, network_idle } => {
            assert_eq!(selector.as_deref(), Some("#app"));
            assert!(eval.is_none());
            assert!(network_idle);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn cookies_set_with_options() {
    let cli = parse(&[
        "cookies", "set", "sid", "v42", "--domain", "example.com", "--secure", "--max-age",
        "3600",
    ]);
    match cli.command {
        Commands::Cookies { action: Some(CookieAction::Set { name, value, domain, secure, max_age, .. }) } => {
            assert_eq!(name, "sid");
            assert_eq!(value, "v42");
            assert_eq!(domain.as_deref(), Some("example.com"));
            assert!(secure);
            assert_eq!(max_age, Some(3600));
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn bare_cookies_defaults_to_list() {
    let cli = parse(&["cookies"]);
    assert!(matches!(cli.command, Commands::Cookies { action: None }));
}

#[test]
fn scroll_subcommands_parse() {
    match parse(&["scroll", "to", "0", "800"]).command {
        Commands::Scroll { mode: ScrollMode::To { x, y } } => {
            assert_eq!(x, 0.0);
            assert_eq!(y, 800.0);
        }
        other => panic!("unexpected: {other:?}"),
    }
    match parse(&["scroll", "element", ".footer"]).command {
        Commands::Scroll { mode: ScrollMode::Element { selector } } => {
            assert_eq!(selector, ".footer");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn type_with_key_and_clear() {
    let cli = parse(&["type", "hello", "--select", "#q", "--key", "Enter", "--clear"]);
    match cli.command {
        Commands::Type { text, selector, key, clear } => {
            assert_eq!(text, "hello");
            assert_eq!(selector.as_deref(), Some("#q"));
            assert_eq!(key.as_deref(), Some("Enter"));
            assert!(clear);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn find_is_hidden_but_still_parses() {
    let cli = parse(&["find", ".selector"]);
    assert!(matches!(cli.command, Commands::Find { .. }));
}

#[test]
fn css_actions_parse() {
    match parse(&["css", "get", "body", "color"]).command {
        Commands::Css { action: CssAction::Get { selector, property } } => {
            assert_eq!(selector, "body");
            assert_eq!(property, "color");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn unknown_verb_fails() {
    assert!(Cli::try_parse_from(["bp", "frobnicate"]).is_err());
}
