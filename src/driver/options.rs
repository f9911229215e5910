//! Command-line option parsing
//!
//! Two dialects share one argument vector. Every `-x` token is first looked up
//! in the legacy table ([`legacy`]) by exact spelling; failing that it is
//! retried as `/x` against the colon table ([`colon`]). Both tables are plain
//! ordered lists of (matcher, handler) entries.

pub mod colon;
pub mod legacy;

use log::{debug, trace};

use crate::diagnostic::DiagnosticEngine;

use super::cli::CompileConfig;
use super::pkg_config;
use super::response_file;

/// Informational requests that end parsing without compiling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoRequest {
    Help,
    Help2,
    About,
    Version,
}

/// Result of a successful parse
#[derive(Debug)]
pub enum ParseOutcome {
    Compile(Box<CompileConfig>),
    Info(InfoRequest),
}

/// Errors that abort option parsing
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("Unrecognized command-line option: `{0}'")]
    UnrecognizedOption(String),
    #[error("{option} requires an argument")]
    MissingArgument { option: String, code: i32 },
    #[error("Invalid argument to {option}: `{value}'")]
    InvalidValue { option: String, value: String },
    #[error("Response file `{0}' specified multiple times")]
    DuplicateResponseFile(String),
    #[error("Unable to open response file: {0}")]
    UnreadableResponseFile(String),
    #[error("No files to compile were specified")]
    NoSourceFiles,
    #[error("{0}")]
    PackageTool(String),
}

impl ArgumentError {
    pub fn missing(option: &str) -> Self {
        ArgumentError::MissingArgument {
            option: option.to_string(),
            code: 5,
        }
    }

    /// Diagnostic code reported for this error
    pub fn code(&self) -> i32 {
        match self {
            ArgumentError::UnrecognizedOption(_) => 2007,
            ArgumentError::MissingArgument { code, .. } => *code,
            ArgumentError::InvalidValue { .. } => 5,
            ArgumentError::DuplicateResponseFile(_) => 1515,
            ArgumentError::UnreadableResponseFile(_) => 2011,
            ArgumentError::NoSourceFiles => 2008,
            ArgumentError::PackageTool(_) => -27,
        }
    }
}

/// Builds a [`CompileConfig`] from raw arguments
pub struct OptionParser<'a> {
    pub(crate) config: CompileConfig,
    pub(crate) diagnostics: &'a mut DiagnosticEngine,
    args: Vec<String>,
    pos: usize,
    info: Option<InfoRequest>,
}

impl<'a> OptionParser<'a> {
    pub fn new(diagnostics: &'a mut DiagnosticEngine) -> Self {
        Self::with_config(CompileConfig::default(), diagnostics)
    }

    /// Start from a preset configuration (used to point `-pkg` at another tool)
    pub fn with_config(config: CompileConfig, diagnostics: &'a mut DiagnosticEngine) -> Self {
        OptionParser {
            config,
            diagnostics,
            args: Vec::new(),
            pos: 0,
            info: None,
        }
    }

    pub fn parse(mut self, args: Vec<String>) -> Result<ParseOutcome, ArgumentError> {
        self.args = response_file::expand(args, &mut self.config.response_files)?;
        let mut parsing_options = true;

        while let Some(arg) = self.next_arg() {
            if arg.is_empty() {
                continue;
            }

            if arg == "--" {
                parsing_options = false;
                continue;
            }

            if parsing_options {
                self.dispatch(&arg)?;
            } else {
                self.add_source(&arg);
            }

            if let Some(request) = self.info {
                debug!("informational request {:?}", request);
                return Ok(ParseOutcome::Info(request));
            }
        }

        self.check_inputs()?;
        Ok(ParseOutcome::Compile(Box::new(self.config)))
    }

    /// Handle one token while options are still being parsed
    fn dispatch(&mut self, arg: &str) -> Result<(), ArgumentError> {
        if let Some(rest) = arg.strip_prefix('-') {
            if self.try_legacy(arg)? || self.try_colon(&format!("/{}", rest))? {
                return Ok(());
            }
            return Err(ArgumentError::UnrecognizedOption(arg.to_string()));
        }

        if arg.starts_with('/') {
            if self.try_colon(arg)? {
                return Ok(());
            }
            // `/usr/src/a.cs` is a path, `/foo` is an unknown option
            let path_shaped = arg.chars().skip(2).any(|c| c == '/');
            if !path_shaped {
                return Err(ArgumentError::UnrecognizedOption(arg.to_string()));
            }
        }

        self.add_source(arg);
        Ok(())
    }

    fn add_source(&mut self, spec: &str) {
        trace!("source argument {}", spec);
        self.config.sources.process(spec, false, self.diagnostics);
    }

    fn try_legacy(&mut self, arg: &str) -> Result<bool, ArgumentError> {
        let Some(option) = legacy::lookup(arg) else {
            return Ok(false);
        };

        if let Some(hint) = option.deprecated {
            self.diagnostics
                .report_warning(-29, 1, format!("Compatibility: Use {} instead of {}", hint, arg));
        }

        let value = if option.takes_value {
            match self.next_arg() {
                Some(value) => Some(value),
                None => return Err(option.missing_value(arg)),
            }
        } else {
            None
        };

        (option.handler)(self, arg, value)?;
        Ok(true)
    }

    fn try_colon(&mut self, arg: &str) -> Result<bool, ArgumentError> {
        let parsed = colon::split(arg);
        let Some((option, enabled)) = colon::lookup(&parsed.name) else {
            return Ok(false);
        };

        let arg = colon::ColonArg {
            option: parsed.option,
            value: parsed.value,
            enabled,
        };
        (option.handler)(self, &arg)?;
        Ok(true)
    }

    fn next_arg(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos).cloned();
        if arg.is_some() {
            self.pos += 1;
        }
        arg
    }

    pub(crate) fn request_info(&mut self, request: InfoRequest) {
        self.info = Some(request);
    }

    /// Splice `extra` into the unparsed arguments ahead of any `--`
    pub(crate) fn splice_args(&mut self, extra: Vec<String>) {
        let separator = self.args[self.pos..]
            .iter()
            .position(|a| a == "--")
            .map_or(self.args.len(), |p| self.pos + p);
        self.args.splice(separator..separator, extra);
    }

    pub(crate) fn expand_packages(&mut self, packages: &str) -> Result<(), ArgumentError> {
        let extra = pkg_config::expand(
            &self.config.pkg_config_program,
            &self.config.pkg_config_args,
            packages,
            self.diagnostics,
        )?;
        self.splice_args(extra);
        Ok(())
    }

    pub(crate) fn set_warning_level(&mut self, value: &str) {
        match value.trim().parse::<u8>() {
            Ok(level) if level <= 4 => self.diagnostics.options.warning_level = level,
            _ => self
                .diagnostics
                .report_error(1900, "Warning level must be in the range 0-4"),
        }
    }

    /// Record `-nowarn` ids. A malformed entry is reported and skipped alone.
    pub(crate) fn ignore_warnings(&mut self, values: &str) {
        for id in values.split(',').filter(|id| !id.is_empty()) {
            match id.trim().parse::<i32>() {
                Ok(code) if code >= 1 => {
                    self.diagnostics.options.ignored_warnings.insert(code);
                }
                _ => self
                    .diagnostics
                    .report_error(1904, format!("`{}' is not a valid warning number", id)),
            }
        }
    }

    fn check_inputs(&mut self) -> Result<(), ArgumentError> {
        let no_sources = self.config.sources.is_empty();
        if no_sources && (self.config.target.needs_source() || self.config.resources.is_empty()) {
            return Err(ArgumentError::NoSourceFiles);
        }
        Ok(())
    }
}

/// Conditional symbols are plain identifiers
pub(crate) fn is_valid_symbol(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
