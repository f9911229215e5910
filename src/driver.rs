//! Compiler driver module
//!
//! [`Driver`] is the facade used by `main`: it parses the command line,
//! runs the [`CompilerDriver`] pipeline, prints diagnostics and maps the
//! result to a process exit status.

pub mod artifact;
pub mod backend;
pub mod cli;
pub mod compiler;
pub mod options;
pub mod output;
pub mod pkg_config;
pub mod references;
pub mod resources;
pub mod response_file;
pub mod sources;

use log::{debug, LevelFilter};

use crate::diagnostic::{DiagnosticEngine, ErrorFormatter};

pub use artifact::CompilePhase;
pub use backend::Collaborators;
pub use cli::CompileConfig;
pub use compiler::{CompilerDriver, PipelineError};
pub use options::{ArgumentError, OptionParser, ParseOutcome};

use output::OutputHandler;

/// Process exit status of one compiler invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
    /// `--expect-error` was given and the run was otherwise clean
    ExpectedErrorMissing,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
            ExitStatus::ExpectedErrorMissing => 2,
        }
    }
}

/// Command-line facade
pub struct Driver {
    diagnostics: DiagnosticEngine,
    formatter: ErrorFormatter,
    output: OutputHandler,
    /// Starting configuration for every run
    base_config: CompileConfig,
}

impl Default for Driver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver {
    pub fn new() -> Self {
        Self::with_config(CompileConfig::default())
    }

    pub fn with_config(base_config: CompileConfig) -> Self {
        Driver {
            diagnostics: DiagnosticEngine::new(),
            formatter: ErrorFormatter::default(),
            output: OutputHandler::new(),
            base_config,
        }
    }

    /// Diagnostics of the last run
    pub fn diagnostics(&self) -> &DiagnosticEngine {
        &self.diagnostics
    }

    /// Parse `args`, compile with `collaborators` and report the result
    pub fn run(&mut self, args: Vec<String>, collaborators: Collaborators) -> ExitStatus {
        self.diagnostics.reset();

        let parsed = OptionParser::with_config(self.base_config.clone(), &mut self.diagnostics).parse(args);
        let config = match parsed {
            Ok(ParseOutcome::Compile(config)) => *config,
            Ok(ParseOutcome::Info(request)) => {
                self.output.print_info(request);
                return ExitStatus::Success;
            }
            Err(err) => {
                debug!("argument error: {:?}", err);
                self.diagnostics.report_error(err.code(), err.to_string());
                return self.finish(false);
            }
        };

        raise_log_level(config.debug_level);
        let stack_trace = config.stack_trace;
        let stop_after = if config.tokenize_only || config.parse_only {
            CompilePhase::Parse
        } else {
            CompilePhase::Save
        };

        let diagnostics = std::mem::take(&mut self.diagnostics);
        let mut driver = CompilerDriver::new(config, diagnostics, collaborators);
        let result = driver.run_pipeline(stop_after);
        self.diagnostics = driver.into_diagnostics();

        match &result {
            Ok(outcome) => debug!("pipeline finished after {:?}", outcome.last_phase),
            Err(PipelineError::Internal(message)) => {
                eprintln!("error: internal compiler error: {}", message);
                if stack_trace {
                    eprintln!("{}", std::backtrace::Backtrace::force_capture());
                }
            }
            Err(err) => debug!("{}", err),
        }

        self.finish(result.is_ok())
    }

    /// Print diagnostics and reconcile `--expect-error`
    fn finish(&self, pipeline_ok: bool) -> ExitStatus {
        self.formatter.print_diagnostics(self.diagnostics.diagnostics());

        if let Some(code) = self.diagnostics.options.expected_error {
            return if self.diagnostics.expected_error_reported() {
                println!("Reported expected error {}", code);
                ExitStatus::Success
            } else if !self.diagnostics.has_errors() {
                println!("Failed to report expected error {}.\nNo other errors reported.", code);
                ExitStatus::ExpectedErrorMissing
            } else {
                println!("Failed to report expected error {}.\nHowever, other errors were reported.", code);
                ExitStatus::Failure
            };
        }

        if let Some(summary) = self.formatter.format_summary(&self.diagnostics) {
            println!("{}", summary);
        }

        if pipeline_ok && !self.diagnostics.has_errors() {
            ExitStatus::Success
        } else {
            ExitStatus::Failure
        }
    }
}

/// Compile once with a fresh driver. `true` on success.
pub fn invoke(args: Vec<String>, collaborators: Collaborators) -> bool {
    Driver::new().run(args, collaborators) == ExitStatus::Success
}

/// `--mcs-debug N`: 1 info, 2 debug, 3 and above trace
fn raise_log_level(debug_level: u32) {
    let level = match debug_level {
        0 => return,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if level > log::max_level() {
        log::set_max_level(level);
    }
}
