//! The end-to-end scenarios and invariants a conforming implementation must
//! satisfy, run against the combined print-plus-diagnostics sink.

mod support;

use support::{run, run_allowing_errors};

#[test]
fn arithmetic_precedence() {
    assert_eq!(run("print 1 + 2 * 3;"), "7\n");
}

#[test]
fn resolver_fixes_late_binding_in_closures() {
    let source = r#"
        var a = "global";
        {
            fun show() { print a; }
            show();
            var a = "block";
            show();
        }
    "#;
    assert_eq!(run(source), "global\nglobal\n");
}

#[test]
fn method_call_on_a_fresh_instance() {
    assert_eq!(run(r#"class Bagel { eat() { print "yum"; } } Bagel().eat();"#), "yum\n");
}

#[test]
fn subclass_constructor_chains_through_super() {
    let source = r#"
        class A { init(x) { this.x = x; } }
        class B < A { init(x) { super.init(x); this.y = x + 1; } }
        var b = B(3);
        print b.x;
        print b.y;
    "#;
    assert_eq!(run(source), "3\n4\n");
}

#[test]
fn counter_closure_keeps_independent_state() {
    let source = r#"
        fun counter() {
            var n = 0;
            fun tick() { n = n + 1; return n; }
            return tick;
        }
        var t = counter();
        print t();
        print t();
        print t();
    "#;
    assert_eq!(run(source), "1\n2\n3\n");
}

#[test]
fn undefined_global_is_a_runtime_error() {
    assert_eq!(run_allowing_errors("print a;"), "Error (line 1): undefined variable 'a'\n");
}

#[test]
fn reading_a_local_in_its_own_initializer_is_a_resolve_error() {
    let output = run_allowing_errors("var a = a;");
    assert!(output.starts_with("Error (line 1):"));
    assert!(output.contains("own initializer"));
}

#[test]
fn top_level_return_is_a_resolve_error() {
    let output = run_allowing_errors("return 1;");
    assert_eq!(output, "Error (line 1): cannot return outside of a function\n");
}

#[test]
fn closures_capture_by_environment_not_by_value() {
    let source = r#"
        var f;
        { var a = 1; f = fun(){ return a; }; }
        print f();
    "#;
    assert_eq!(run(source), "1\n");
}

#[test]
fn for_desugars_to_while_with_identical_behavior() {
    let desugared = run("{ var i = 0; while (i < 3) { print i; i = i + 1; } }");
    let for_loop = run("for (var i = 0; i < 3; i = i + 1) print i;");
    assert_eq!(desugared, for_loop);
}

#[test]
fn number_formatting_round_trips_canonical_forms() {
    assert_eq!(run("print 1;"), "1\n");
    assert_eq!(run("print 1.5;"), "1.5\n");
    assert_eq!(run("print 0.25;"), "0.25\n");
}

#[test]
fn double_negation_equals_truthiness() {
    assert_eq!(run("print !!nil;"), "false\n");
    assert_eq!(run("print !!false;"), "false\n");
    assert_eq!(run("print !!0;"), "true\n");
    assert_eq!(run("print !!\"\";"), "true\n");
}
