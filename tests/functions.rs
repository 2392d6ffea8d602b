mod support;

use support::{run, run_allowing_errors};

#[test]
fn functions_take_arguments_and_return_values() {
    let source = r#"
        fun add(a, b) { return a + b; }
        print add(2, 3);
    "#;
    assert_eq!(run(source), "5\n");
}

#[test]
fn function_without_a_return_statement_yields_nil() {
    assert_eq!(run("fun noop() {} print noop();"), "nil\n");
}

#[test]
fn recursive_functions_see_themselves_in_the_global_scope() {
    let source = r#"
        fun fib(n) {
            if (n < 2) return n;
            return fib(n - 1) + fib(n - 2);
        }
        print fib(8);
    "#;
    assert_eq!(run(source), "21\n");
}

#[test]
fn calling_with_the_wrong_arity_is_a_runtime_error() {
    let source = "fun f(a, b) { return a + b; } f(1);";
    assert_eq!(
        run_allowing_errors(source),
        "Error (line 1): expected 2 arguments but got 1\n"
    );
}

#[test]
fn calling_a_non_callable_value_is_a_runtime_error() {
    assert_eq!(
        run_allowing_errors("var x = 1; x();"),
        "Error (line 1): can only call functions and classes\n"
    );
}

#[test]
fn native_clock_returns_a_number() {
    assert_eq!(run("print clock() >= 0.0;"), "true\n");
}
