use std::collections::BTreeMap;

use envscan::{Dotenv, Env, ParseMode, Variable, parse_str, parse_str_with_mode};

#[test]
fn parses_basic_fixture() {
    let fixture = include_str!("fixtures/basic.env");
    let env = parse_str(fixture).expect("fixture should parse");

    let map = to_map(&env);
    assert_eq!(map.get("BASIC").expect("BASIC"), "basic");
    assert_eq!(map.get("EMPTY").expect("EMPTY"), "");
    assert_eq!(map.get("INLINE_COMMENT").expect("INLINE_COMMENT"), "value");
    assert_eq!(map.get("SPACED").expect("SPACED"), "spaced");
    assert_eq!(map.get("DOUBLE").expect("DOUBLE"), "hello world");
    assert_eq!(map.get("SINGLE").expect("SINGLE"), "hello world");
    assert_eq!(map.get("EXPORTED").expect("EXPORTED"), "1");
    assert_eq!(map.get("QUOTED_EXPORT").expect("QUOTED_EXPORT"), "a b c");
    assert_eq!(map.get("HASH_IN_VALUE").expect("HASH_IN_VALUE"), "abc#def");
    assert_eq!(map.get("TRAILING_SPACE").expect("TRAILING_SPACE"), "padded");
    assert_eq!(map.get("ESCAPED_NEWLINE").expect("ESCAPED_NEWLINE"), "line1nline2");
    assert_eq!(map.get("ESCAPED_QUOTE").expect("ESCAPED_QUOTE"), "it's");
    assert_eq!(map.len(), 12);
}

#[test]
fn basic_fixture_preserves_order_and_lines() {
    let fixture = include_str!("fixtures/basic.env");
    let env = parse_str(fixture).expect("fixture should parse");

    let first = env.iter().next().expect("at least one entry");
    assert_eq!(first.key, "BASIC");
    assert_eq!(first.line, 2);
    assert_eq!(env.entry("EXPORTED").map(|entry| entry.line), Some(8));
    assert_eq!(env.keys().last(), Some("ESCAPED_QUOTE"));
}

#[test]
fn parses_crlf_fixture() {
    let fixture = include_str!("fixtures/crlf.env");
    let env = parse_str(fixture).expect("fixture should parse");

    assert_eq!(env.get("FIRST"), Some("1"));
    assert_eq!(env.get("SECOND"), Some("two"));
    assert_eq!(env.get("MULTI"), Some("line one\r\nline two"));
    assert_eq!(env.get("LAST"), Some("last"));
    assert_eq!(env.entry("LAST").map(|entry| entry.line), Some(5));
}

#[test]
fn relaxed_fixture_is_rejected_in_strict_mode() {
    let fixture = include_str!("fixtures/relaxed.env");
    assert!(parse_str(fixture).is_err());
}

#[test]
fn parses_relaxed_fixture() {
    let fixture = include_str!("fixtures/relaxed.env");
    let env = parse_str_with_mode(fixture, ParseMode::Relaxed).expect("fixture should parse");

    assert_eq!(
        env.keys().collect::<Vec<_>>(),
        ["DB_HOST", "DB_PORT", "SERVICE_URL", "SERVICE_NAME"]
    );
    assert_eq!(
        env.get("SERVICE_URL"),
        Some("http://${DB_HOST}:${DB_PORT}/api")
    );
    assert_eq!(env.get("SERVICE_NAME"), Some("svc"));
}

#[test]
fn relaxed_fixture_with_variable_pipeline() {
    let fixture = include_str!("fixtures/relaxed.env");
    let env = Dotenv::new()
        .mode(ParseMode::Relaxed)
        .substitution(Variable::new())
        .parse_str(fixture)
        .expect("fixture should parse");

    assert_eq!(env.get("SERVICE_URL"), Some("http://localhost:5432/api"));
}

fn to_map(env: &Env) -> BTreeMap<String, String> {
    env.to_map()
}
