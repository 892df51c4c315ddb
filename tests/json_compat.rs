//! Inputs that are plain JSON (no header, no implicit root) must decode
//! into a type-erased target exactly the way a JSON decoder would: bools,
//! f64 numbers, strings, arrays, string-keyed maps, and null.

use serde_json::{json, Value};
use serde_tron::from_str;

fn decoded(input: &str) -> Value {
    from_str(input).unwrap_or_else(|err| panic!("decoding {input:?} failed: {err}"))
}

#[test]
fn scalars_match_json_shapes() {
    assert_eq!(decoded("null"), json!(null));
    assert_eq!(decoded("true"), json!(true));
    assert_eq!(decoded("false"), json!(false));
    assert_eq!(decoded("0"), json!(0.0));
    assert_eq!(decoded("-1"), json!(-1.0));
    assert_eq!(decoded("1.25"), json!(1.25));
    assert_eq!(decoded("1e3"), json!(1000.0));
    assert_eq!(decoded("-0"), json!(-0.0));
    assert_eq!(decoded("\"s\""), json!("s"));
    assert_eq!(decoded("\"\""), json!(""));
}

#[test]
fn containers_match_json_shapes() {
    assert_eq!(decoded("[]"), json!([]));
    assert_eq!(decoded("{}"), json!({}));
    assert_eq!(
        decoded(r#"[1,"two",[true,null],{"k":3}]"#),
        json!([1.0, "two", [true, null], {"k": 3.0}])
    );
    assert_eq!(
        decoded(r#"{"a":{"b":{"c":[]}}}"#),
        json!({"a": {"b": {"c": []}}})
    );
}

#[test]
fn json_escapes_match() {
    assert_eq!(decoded(r#""a\"b\\c\/d""#), json!("a\"b\\c/d"));
    assert_eq!(decoded(r#""\b\f\n\r\t""#), json!("\u{8}\u{c}\n\r\t"));
    assert_eq!(decoded(r#""Aé""#), json!("Aé"));
    assert_eq!(decoded(r#""😀""#), json!("😀"));
}

#[test]
fn every_valid_json_document_in_the_table_agrees_with_serde_json() {
    // Integral numbers are written with a fraction so that serde_json's
    // own parse lands on f64, matching the decoder's any-target collapse.
    for input in [
        "null",
        "true",
        "[1.0,2.5,-3.25]",
        r#"{"nested":[{"deep":[null,false]}],"s":"v"}"#,
        r#""unicode ключ 名""#,
        "[[],[[]],{}]",
    ] {
        let via_tron: Value = from_str(input).unwrap();
        let via_json: Value = serde_json::from_str(input).unwrap();
        assert_eq!(via_tron, via_json, "diverged on {input:?}");
    }
}

#[test]
fn tron_extensions_are_not_json_but_share_the_value_space() {
    // The header and constructor forms resolve into ordinary JSON shapes.
    assert_eq!(
        decoded("class A: x,y\n\n[A(1,2),A(3,4)]"),
        json!([{"x": 1.0, "y": 2.0}, {"x": 3.0, "y": 4.0}])
    );
    assert_eq!(decoded("a: 1\nb: [true]\n"), json!({"a": 1.0, "b": [true]}));
}
