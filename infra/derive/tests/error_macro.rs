#[test]
fn modhub_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/error_with_context.rs");
}
