// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    simple = { "navigate example.com", vec!["navigate", "example.com"] },
    extra_whitespace = { "  eval   1+1  ", vec!["eval", "1+1"] },
    double_quotes = { r#"eval "1 + 1""#, vec!["eval", "1 + 1"] },
    single_quotes = { "type 'hello world' --key Enter", vec!["type", "hello world", "--key", "Enter"] },
    empty_quoted = { r#"type """#, vec!["type", ""] },
    quote_inside_token = { r#"click a"b"c"#, vec!["click", "abc"] },
)]
fn tokenize_cases(line: &str, expected: Vec<&str>) {
    assert_eq!(tokenize(line).unwrap(), expected);
}

#[test]
fn tokenize_rejects_unterminated_quote() {
    assert!(tokenize(r#"eval "1 + 1"#).is_err());
}

#[test]
fn tokenize_empty_line() {
    assert_eq!(tokenize("").unwrap(), Vec::<String>::new());
    assert_eq!(tokenize("   ").unwrap(), Vec::<String>::new());
}

#[test]
fn tokens_feed_the_clap_parser() {
    use clap::Parser;

    let tokens = tokenize("navigate https://example.com --wait").unwrap();
    let cli =
        crate::args::Cli::try_parse_from(std::iter::once("bp".to_string()).chain(tokens)).unwrap();
    match cli.command {
        crate::args::Commands::Navigate { url, wait } => {
            assert_eq!(url, "https://example.com");
            assert!(wait);
        }
        other => panic!("unexpected: {other:?}"),
    }
}
