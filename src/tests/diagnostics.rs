use crate::diagnostic::{Diagnostic, DiagnosticEngine, DiagnosticLevel, ErrorFormatter, SourceLocation};

#[test]
fn test_format_diagnostics() {
    let mut engine = DiagnosticEngine::new();
    engine.report_error(2001, "Source file `a.cs' could not be found");
    engine.report_warning(-29, 1, "Compatibility: Use -unsafe instead of --unsafe");
    engine.report_error_at(1558, SourceLocation::new("src/app.cs", 3, 14), "`App' does not have a suitable static Main method");
    engine.report_note("Log:\nprobed /lib/x.dll\n(log related to previous command)");
    engine.runtime_missing_support("/target:module");

    let formatted = ErrorFormatter::default().format_diagnostics(engine.diagnostics());
    insta::assert_snapshot!(formatted, @r"
    error CS2001: Source file `a.cs' could not be found
    warning CS-29: Compatibility: Use -unsafe instead of --unsafe
    src/app.cs(3,14): error CS1558: `App' does not have a suitable static Main method
    Log:
    probed /lib/x.dll
    (log related to previous command)
    error: Your runtime is missing support for `/target:module'
    ");
}

#[test]
fn test_format_without_locations() {
    let formatter = ErrorFormatter { show_locations: false };
    let diag = Diagnostic::warning(2002, "Source file `a.cs' specified multiple times").at(SourceLocation::new("a.cs", 1, 1));
    assert_eq!(
        formatter.format_diagnostic(&diag),
        "warning CS2002: Source file `a.cs' specified multiple times"
    );
}

#[test]
fn test_counts_ignore_notes_and_missing_support() {
    let mut engine = DiagnosticEngine::new();
    engine.report_note("extra");
    engine.runtime_missing_support("Adding icons");
    assert!(!engine.has_errors());
    assert_eq!(engine.warning_count(), 0);
    assert_eq!(engine.diagnostics().len(), 2);
}

#[test]
fn test_warning_level_filter() {
    let mut engine = DiagnosticEngine::new();
    engine.options.warning_level = 2;
    engine.report_warning(1, 3, "dropped");
    engine.report_warning(2, 2, "kept");
    assert_eq!(engine.warning_count(), 1);
    assert_eq!(engine.diagnostics()[0].code, 2);
}

#[test]
fn test_ignored_warnings() {
    let mut engine = DiagnosticEngine::new();
    engine.options.ignored_warnings.insert(168);
    engine.report_warning(168, 1, "suppressed");
    engine.report_warning(169, 1, "reported");
    assert_eq!(engine.warning_count(), 1);
    assert!(!engine.has_code(168));
}

#[test]
fn test_warnings_as_errors() {
    let mut engine = DiagnosticEngine::new();
    engine.options.warnings_as_errors = true;
    engine.report_warning(2002, 1, "duplicate");
    assert!(engine.has_errors());
    assert_eq!(engine.warning_count(), 0);
    assert_eq!(engine.diagnostics()[0].level, DiagnosticLevel::Error);
}

#[test]
fn test_expected_error_tracking() {
    let mut engine = DiagnosticEngine::new();
    engine.options.expected_error = Some(1558);
    engine.report_error(5001, "other");
    assert!(!engine.expected_error_reported());
    engine.report_error(1558, "expected");
    assert!(engine.expected_error_reported());
}

#[test]
fn test_expected_warning_counts_only_as_error() {
    let mut engine = DiagnosticEngine::new();
    engine.options.expected_error = Some(2002);
    engine.report_warning(2002, 1, "duplicate");
    assert!(!engine.expected_error_reported());

    engine.options.warnings_as_errors = true;
    engine.report_warning(2002, 1, "duplicate");
    assert!(engine.expected_error_reported());
}

#[test]
fn test_summary() {
    let formatter = ErrorFormatter::default();
    let mut engine = DiagnosticEngine::new();
    assert_eq!(formatter.format_summary(&engine), None);

    engine.report_warning(1, 1, "w");
    engine.report_warning(2, 1, "w");
    insta::assert_snapshot!(formatter.format_summary(&engine).unwrap(), @"Compilation succeeded - 2 warning(s)");

    engine.report_error(6, "e");
    insta::assert_snapshot!(formatter.format_summary(&engine).unwrap(), @"Compilation failed: 1 error(s), 2 warnings");
}

#[test]
fn test_reset_restores_policy() {
    let mut engine = DiagnosticEngine::new();
    engine.options.warning_level = 0;
    engine.report_error(1, "e");
    engine.reset();
    assert!(!engine.has_errors());
    assert!(engine.diagnostics().is_empty());
    assert_eq!(engine.options.warning_level, 4);
}
