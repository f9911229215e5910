//! Diagnostic collection and reporting.
//!
//! Every phase of the driver reports into one [`DiagnosticEngine`]. The engine
//! owns the reporting policy (warning level, suppressed codes, warnings as
//! errors, expected error) and keeps the cumulative counts the pipeline gates on.

use hashbrown::HashSet;
use itertools::Itertools;
use std::fmt;
use std::path::PathBuf;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticLevel {
    Error,
    Warning,
    /// Extra information attached to a previous diagnostic (loader logs etc.)
    Note,
    /// The output backend lacks a capability. Reported, never counted.
    Unsupported,
}

/// Location of a diagnostic inside a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub path: PathBuf,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(path: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        SourceLocation {
            path: path.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({},{})", self.path.display(), self.line, self.column)
    }
}

/// Individual diagnostic
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub code: i32,
    pub message: String,
    pub location: Option<SourceLocation>,
}

impl Diagnostic {
    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Diagnostic {
            level: DiagnosticLevel::Error,
            code,
            message: message.into(),
            location: None,
        }
    }

    pub fn warning(code: i32, message: impl Into<String>) -> Self {
        Diagnostic {
            level: DiagnosticLevel::Warning,
            code,
            message: message.into(),
            location: None,
        }
    }

    pub fn at(mut self, location: SourceLocation) -> Self {
        self.location = Some(location);
        self
    }
}

/// Reporting policy set from the command line
#[derive(Debug, Clone)]
pub struct ReportingOptions {
    /// Warnings above this level are dropped (0-4)
    pub warning_level: u8,
    pub warnings_as_errors: bool,
    pub ignored_warnings: HashSet<i32>,
    /// Diagnostic code a test run expects to see (`--expect-error`)
    pub expected_error: Option<i32>,
    /// The first error ends the compilation (`--fatal`)
    pub fatal: bool,
}

impl Default for ReportingOptions {
    fn default() -> Self {
        ReportingOptions {
            warning_level: 4,
            warnings_as_errors: false,
            ignored_warnings: HashSet::new(),
            expected_error: None,
            fatal: false,
        }
    }
}

/// Diagnostic engine for collecting and reporting errors and warnings
#[derive(Debug, Default)]
pub struct DiagnosticEngine {
    pub diagnostics: Vec<Diagnostic>,
    pub options: ReportingOptions,
    errors: usize,
    warnings: usize,
    expected_error_seen: bool,
}

impl DiagnosticEngine {
    pub fn new() -> Self {
        DiagnosticEngine::default()
    }

    pub fn report_error(&mut self, code: i32, message: impl Into<String>) {
        self.report_diagnostic(Diagnostic::error(code, message));
    }

    pub fn report_error_at(&mut self, code: i32, location: SourceLocation, message: impl Into<String>) {
        self.report_diagnostic(Diagnostic::error(code, message).at(location));
    }

    /// Report a warning of the given level. Suppressed codes and warnings
    /// above the configured level are dropped; with warnings-as-errors the
    /// warning is counted as an error.
    pub fn report_warning(&mut self, code: i32, level: u8, message: impl Into<String>) {
        self.report_diagnostic_with_level(Diagnostic::warning(code, message), level);
    }

    pub fn report_warning_at(&mut self, code: i32, level: u8, location: SourceLocation, message: impl Into<String>) {
        self.report_diagnostic_with_level(Diagnostic::warning(code, message).at(location), level);
    }

    /// Attach free-form information to the previous diagnostic
    pub fn report_note(&mut self, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Note,
            code: 0,
            message: message.into(),
            location: None,
        });
    }

    /// The runtime behind the output backend lacks `feature`. This is not a
    /// compile error; the caller decides whether the run can go on.
    pub fn runtime_missing_support(&mut self, feature: &str) {
        self.diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Unsupported,
            code: 0,
            message: format!("Your runtime is missing support for `{}'", feature),
            location: None,
        });
    }

    pub fn report_diagnostic(&mut self, diagnostic: Diagnostic) {
        self.report_diagnostic_with_level(diagnostic, 1);
    }

    fn report_diagnostic_with_level(&mut self, mut diagnostic: Diagnostic, level: u8) {
        match diagnostic.level {
            DiagnosticLevel::Warning => {
                if self.options.ignored_warnings.contains(&diagnostic.code) || level > self.options.warning_level {
                    return;
                }
                if self.options.warnings_as_errors {
                    diagnostic.level = DiagnosticLevel::Error;
                    self.count_error(diagnostic.code);
                } else {
                    self.warnings += 1;
                }
            }
            DiagnosticLevel::Error => self.count_error(diagnostic.code),
            DiagnosticLevel::Note | DiagnosticLevel::Unsupported => {}
        }
        self.diagnostics.push(diagnostic);
    }

    fn count_error(&mut self, code: i32) {
        self.errors += 1;
        if self.options.expected_error == Some(code) {
            self.expected_error_seen = true;
        }
    }

    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }

    pub fn error_count(&self) -> usize {
        self.errors
    }

    pub fn warning_count(&self) -> usize {
        self.warnings
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True when a diagnostic with `code` was reported (at any level)
    pub fn has_code(&self, code: i32) -> bool {
        self.diagnostics.iter().any(|d| d.code == code)
    }

    /// An error was counted while errors are fatal
    pub fn fatal_error_seen(&self) -> bool {
        self.options.fatal && self.errors > 0
    }

    pub fn expected_error_reported(&self) -> bool {
        self.expected_error_seen
    }

    /// Drop every diagnostic and counter and restore the default policy
    pub fn reset(&mut self) {
        *self = DiagnosticEngine::default();
    }
}

/// Renders diagnostics the way the command line shows them
pub struct ErrorFormatter {
    pub show_locations: bool,
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        ErrorFormatter { show_locations: true }
    }
}

impl ErrorFormatter {
    pub fn format_diagnostic(&self, diag: &Diagnostic) -> String {
        let prefix = match (&diag.location, self.show_locations) {
            (Some(location), true) => format!("{}: ", location),
            _ => String::new(),
        };
        match diag.level {
            DiagnosticLevel::Error => format!("{}error {}: {}", prefix, format_code(diag.code), diag.message),
            DiagnosticLevel::Warning => format!("{}warning {}: {}", prefix, format_code(diag.code), diag.message),
            DiagnosticLevel::Note => diag.message.clone(),
            DiagnosticLevel::Unsupported => format!("{}error: {}", prefix, diag.message),
        }
    }

    pub fn format_diagnostics(&self, diagnostics: &[Diagnostic]) -> String {
        diagnostics
            .iter()
            .map(|diag| self.format_diagnostic(diag))
            .join("\n")
    }

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            eprintln!("{}", self.format_diagnostic(diag));
        }
    }

    /// The final tally line
    pub fn format_summary(&self, engine: &DiagnosticEngine) -> Option<String> {
        if engine.has_errors() {
            Some(format!(
                "Compilation failed: {} error(s), {} warnings",
                engine.error_count(),
                engine.warning_count()
            ))
        } else if engine.warning_count() > 0 {
            Some(format!("Compilation succeeded - {} warning(s)", engine.warning_count()))
        } else {
            None
        }
    }
}

fn format_code(code: i32) -> String {
    if code < 0 {
        format!("CS{}", code)
    } else {
        format!("CS{:04}", code)
    }
}
