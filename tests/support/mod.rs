use flint_lang::Flint;

/// Runs `source` to completion and returns the combined print-plus-
/// diagnostics output, panicking if it didn't finish without error.
pub fn run(source: &str) -> String {
    let (output, ok) = Flint::new().run_to_string(source);
    assert!(ok, "expected {source:?} to run without error, got:\n{output}");
    output
}

/// Runs `source` and returns its output regardless of whether a scan,
/// parse, resolve, or runtime error occurred.
pub fn run_allowing_errors(source: &str) -> String {
    Flint::new().run_to_string(source).0
}
