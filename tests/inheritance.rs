mod support;

use support::{run, run_allowing_errors};

#[test]
fn subclass_inherits_superclass_methods() {
    let source = r#"
        class Animal { speak() { return "..."; } }
        class Dog < Animal { bark() { return "woof"; } }
        var d = Dog();
        print d.speak();
        print d.bark();
    "#;
    assert_eq!(run(source), "...\nwoof\n");
}

#[test]
fn subclass_can_override_and_reach_the_overridden_method_via_super() {
    let source = r#"
        class Greeter {
            greet() { return "Hello"; }
        }
        class LoudGreeter < Greeter {
            greet() { return super.greet() + "!"; }
        }
        print LoudGreeter().greet();
    "#;
    assert_eq!(run(source), "Hello!\n");
}

#[test]
fn inherited_init_runs_when_the_subclass_defines_no_constructor() {
    let source = r#"
        class A { init(x) { this.x = x; } }
        class B < A {}
        print B(5).x;
    "#;
    assert_eq!(run(source), "5\n");
}

#[test]
fn a_class_cannot_inherit_from_itself() {
    let output = run_allowing_errors("class A < A {}");
    assert!(output.starts_with("Error (line 1):"));
    assert!(output.contains("inherit from itself"));
}

#[test]
fn a_non_class_superclass_is_a_runtime_error() {
    let source = "var NotAClass = 1; class A < NotAClass {}";
    assert_eq!(run_allowing_errors(source), "Error (line 1): superclass must be a class\n");
}

#[test]
fn super_outside_a_class_is_a_resolve_error() {
    let output = run_allowing_errors("super.foo();");
    assert!(output.contains("outside of a class"));
}

#[test]
fn super_in_a_class_with_no_superclass_is_a_resolve_error() {
    let output = run_allowing_errors("class A { f() { super.f(); } }");
    assert!(output.contains("no superclass"));
}
