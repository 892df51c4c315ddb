//! Adversarial-input containment: the four limits, the number grammar,
//! escape validation, and UTF-8 soundness.

use std::sync::{Mutex, MutexGuard};

use serde_tron::{from_slice, from_str, limits, to_string, ErrorKind};

static LIMITS_LOCK: Mutex<()> = Mutex::new(());

/// Temporarily overrides the process-wide limits; restores them on drop.
/// The lock serializes every test that touches them.
struct LimitsGuard {
    saved: (usize, usize, usize, usize),
    _lock: MutexGuard<'static, ()>,
}

fn with_limits(bytes: usize, tokens: usize, parse_depth: usize, walk_depth: usize) -> LimitsGuard {
    let lock = LIMITS_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let saved = (
        limits::max_input_bytes(),
        limits::max_tokens(),
        limits::max_parse_depth(),
        limits::max_walk_depth(),
    );
    limits::set_max_input_bytes(bytes);
    limits::set_max_tokens(tokens);
    limits::set_max_parse_depth(parse_depth);
    limits::set_max_walk_depth(walk_depth);
    LimitsGuard {
        saved,
        _lock: lock,
    }
}

impl Drop for LimitsGuard {
    fn drop(&mut self) {
        limits::set_max_input_bytes(self.saved.0);
        limits::set_max_tokens(self.saved.1);
        limits::set_max_parse_depth(self.saved.2);
        limits::set_max_walk_depth(self.saved.3);
    }
}

fn default_limits_lock() -> MutexGuard<'static, ()> {
    LIMITS_LOCK
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[test]
fn oversized_input_rejected_up_front() {
    let _guard = with_limits(8, 1_000_000, 1_000, 1_000);
    let err = from_str::<bool>("       true").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert!(err.to_string().contains("byte limit"), "got: {err}");
    assert!(from_str::<bool>("true").is_ok());
}

#[test]
fn token_count_capped() {
    let _guard = with_limits(10 << 20, 4, 1_000, 1_000);
    let err = from_str::<Vec<i64>>("[1,2,3]").unwrap_err();
    assert!(err.to_string().contains("too many tokens"), "got: {err}");
    // Number, EOF.
    assert!(from_str::<i64>("1").is_ok());
}

#[test]
fn parse_depth_capped() {
    let _guard = with_limits(10 << 20, 1_000_000, 5, 1_000);
    let ok = format!("{}1{}", "[".repeat(4), "]".repeat(4));
    assert!(from_str::<serde_json::Value>(&ok).is_ok());

    let deep = format!("{}1{}", "[".repeat(5), "]".repeat(5));
    let err = from_str::<serde_json::Value>(&deep).unwrap_err();
    assert!(
        err.to_string().contains("maximum parse depth exceeded"),
        "got: {err}"
    );
}

#[test]
fn walk_depth_capped_on_encode() {
    let _guard = with_limits(10 << 20, 1_000_000, 1_000, 3);
    let ok = vec![vec![vec![1u8]]];
    assert!(to_string(&ok).is_ok());

    let deep = vec![vec![vec![vec![1u8]]]];
    let err = to_string(&deep).unwrap_err();
    assert!(err.to_string().contains("walk depth"), "got: {err}");
}

#[test]
fn depth_guard_holds_at_default_limits() {
    let _guard = default_limits_lock();
    let within = format!("{}1{}", "[".repeat(999), "]".repeat(999));
    assert!(from_str::<serde_json::Value>(&within).is_ok());

    let beyond = format!("{}1{}", "[".repeat(1_001), "]".repeat(1_001));
    assert!(from_str::<serde_json::Value>(&beyond).is_err());
}

#[test]
fn number_grammar_accepts_json_numbers() {
    let _guard = default_limits_lock();
    for input in [
        "0", "-0", "1", "-1", "10", "0.1", "1.0", "-1.25", "1e0", "1E0", "1e+9", "1e-9", "-1E-9",
    ] {
        assert!(
            from_str::<serde_json::Value>(input).is_ok(),
            "rejected {input:?}"
        );
    }
}

#[test]
fn number_grammar_rejects_non_json_forms() {
    let _guard = default_limits_lock();
    for input in [
        "+1", "-", ".", "-.1", ".5", "01", "1.", "1e", "1e+", "0x10", "NaN", "Infinity",
        "-Infinity", "1_000",
    ] {
        assert!(
            from_str::<serde_json::Value>(input).is_err(),
            "accepted {input:?}"
        );
    }
}

#[test]
fn surrogate_escapes_must_pair() {
    let _guard = default_limits_lock();
    let s: String = from_str("\"\\uD83D\\uDE00\"").unwrap();
    assert_eq!(s, "😀");

    for input in [
        "\"\\u12G4\"",
        "\"\\uD83D\"",
        "\"\\uDE00\"",
        "\"\\uD83D\\u0041\"",
        "\"\\uD83D\\uD83D\"",
        "\"\\uDE00\\uDE00\"",
        "\"\\u\"",
        "\"\\u123\"",
        "\"\\uD83D\\uDE0\"",
    ] {
        assert!(
            from_str::<serde_json::Value>(input).is_err(),
            "accepted {input:?}"
        );
    }
}

#[test]
fn extra_hex_digit_stays_literal() {
    let _guard = default_limits_lock();
    let s: String = from_str("\"\\u12345\"").unwrap();
    assert_eq!(s, "\u{1234}5");
}

#[test]
fn invalid_utf8_is_rejected_not_replaced() {
    let _guard = default_limits_lock();
    for (input, offset) in [
        (&b"\xFF"[..], 0),
        (&b"tr\xFFue"[..], 2),
        (&b"\"a\xFF\""[..], 2),
        (&b"# \xFF\nnull"[..], 2),
        (&b"[1,\xC3\x28]"[..], 3),
    ] {
        let err = from_slice::<serde_json::Value>(input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert!(err.to_string().contains("invalid UTF-8"), "got: {err}");
        assert_eq!(err.location().map(|l| l.offset), Some(offset));
    }
}

#[test]
fn stray_tokens_after_class_definition() {
    let _guard = default_limits_lock();
    let err = from_str::<serde_json::Value>("class A: x extra\n\nA(1)").unwrap_err();
    assert!(
        err.to_string()
            .contains("expected newline after class definition"),
        "got: {err}"
    );
}

#[test]
fn error_offsets_are_byte_offsets() {
    let _guard = default_limits_lock();
    // The bad escape sits after a two-byte code point.
    let err = from_str::<serde_json::Value>("\"é\\uZZZZ\"").unwrap_err();
    let offset = err.location().map(|l| l.offset);
    assert!(offset >= Some(4), "got: {offset:?}");
}
