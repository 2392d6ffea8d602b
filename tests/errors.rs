//! Error paths at each stage: scanning, parsing, and resolving. Runtime
//! error paths are covered alongside the features that raise them.

mod support;

use support::run_allowing_errors;

#[test]
fn unterminated_string_is_a_scan_error() {
    assert_eq!(run_allowing_errors("\"unterminated"), "Error (line 1): Unterminated string\n");
}

#[test]
fn unknown_character_is_a_scan_error() {
    assert_eq!(run_allowing_errors("print 1 @ 2;"), "Error (line 1): unknown character '@'\n");
}

#[test]
fn scanning_continues_past_an_error_to_report_the_parse_error_too() {
    // Once scanning itself fails, the parser never runs — downstream phases
    // are skipped on any scan error.
    let output = run_allowing_errors("@\nprint 1 +;");
    assert_eq!(output, "Error (line 1): unknown character '@'\n");
}

#[test]
fn missing_semicolon_is_a_parse_error() {
    let output = run_allowing_errors("print 1");
    assert!(output.contains("Expect ';'"));
}

#[test]
fn invalid_assignment_target_is_a_parse_error() {
    let output = run_allowing_errors("1 = 2;");
    assert!(output.contains("Invalid assignment target"));
}

#[test]
fn this_outside_a_class_is_a_resolve_error() {
    let output = run_allowing_errors("print this;");
    assert!(output.contains("outside of a class"));
}

#[test]
fn returning_a_value_from_an_initializer_is_a_resolve_error() {
    let output = run_allowing_errors("class A { init() { return 1; } }");
    assert!(output.contains("return a value from an initializer"));
}

#[test]
fn redeclaring_a_name_in_the_same_scope_is_a_resolve_error() {
    let output = run_allowing_errors("{ var a = 1; var a = 2; }");
    assert!(output.contains("already declared in this scope"));
}
