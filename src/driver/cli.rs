//! CLI collection and configuration module
//!
//! clap only gathers the raw argument vector; both option dialects are
//! interpreted by [`super::options`] so that `-x`, `/x` and `@file` keep their
//! historical meaning. The parsed result is a [`CompileConfig`].

use clap::{Parser as CliParser, ValueEnum};
use hashbrown::HashSet;
use indexmap::IndexSet;
use std::ffi::OsString;
use std::path::PathBuf;

use crate::lang_options::{LanguageVersion, TextEncoding};

use super::references::ReferenceSet;
use super::resources::ResourceTable;
use super::sources::SourceFileSet;

/// CLI interface using clap
#[derive(CliParser, Debug)]
#[clap(
    name = "sharpc",
    about = "Batch compiler driver",
    disable_help_flag = true,
    disable_version_flag = true
)]
pub struct Cli {
    /// Options, source files and @response files
    #[clap(allow_hyphen_values = true, trailing_var_arg = true, num_args = 0..)]
    pub args: Vec<OsString>,
}

impl Cli {
    /// Collect `args` (without the program name) untouched.
    ///
    /// An escape is inserted in front so clap never eats a `--` the user wrote
    /// as the first argument.
    pub fn collect<I>(args: I) -> Self
    where
        I: IntoIterator<Item = OsString>,
    {
        let argv = [OsString::from("sharpc"), OsString::from("--")].into_iter().chain(args);
        Cli::parse_from(argv)
    }

    pub fn into_args(self) -> Vec<String> {
        self.args
            .into_iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }
}

/// Kind of artifact being produced
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Target {
    Library,
    #[default]
    Exe,
    #[value(name = "winexe")]
    WinExe,
    Module,
}

/// Subsystem recorded with the entry point
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PeKind {
    Console,
    Windows,
    Dll,
}

impl Target {
    pub fn parse(value: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(value, false).ok()
    }

    pub fn extension(self) -> &'static str {
        match self {
            Target::Exe | Target::WinExe => ".exe",
            Target::Library => ".dll",
            Target::Module => ".netmodule",
        }
    }

    pub fn needs_entry_point(self) -> bool {
        matches!(self, Target::Exe | Target::WinExe)
    }

    /// Targets that cannot be built from resources alone
    pub fn needs_source(self) -> bool {
        !matches!(self, Target::Library)
    }

    pub fn pe_kind(self) -> PeKind {
        match self {
            Target::Exe => PeKind::Console,
            Target::WinExe => PeKind::Windows,
            Target::Library | Target::Module => PeKind::Dll,
        }
    }

    /// "`library', `exe', `winexe' or `module'"
    pub fn valid_values() -> String {
        let names: Vec<String> = Target::value_variants()
            .iter()
            .filter_map(|t| t.to_possible_value())
            .map(|v| format!("`{}'", v.get_name()))
            .collect();
        match names.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{} or {}", rest.join(", "), last),
            _ => names.concat(),
        }
    }
}

/// Strong-name signing options. Recorded only; signing happens in the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningOptions {
    pub key_file: Option<PathBuf>,
    pub key_container: Option<String>,
    pub delay_sign: bool,
}

/// Configuration for compilation
#[derive(Debug, Clone)]
pub struct CompileConfig {
    pub target: Target,
    pub output_path: Option<PathBuf>,
    pub sources: SourceFileSet,
    pub references: ReferenceSet,
    pub modules: Vec<String>,
    pub link_paths: Vec<PathBuf>,
    pub resources: ResourceTable,
    pub win32_resource: Option<PathBuf>,
    pub win32_icon: Option<PathBuf>,
    pub doc_output: Option<PathBuf>,
    pub debug_info: bool,
    pub optimize: bool,
    pub checked: bool,
    pub unsafe_code: bool,
    pub defines: IndexSet<String>,
    pub lang_version: LanguageVersion,
    pub encoding: TextEncoding,
    pub main_class: Option<String>,
    pub stdlib: bool,
    pub load_default_config: bool,
    pub signing: SigningOptions,
    pub verify_cls_compliance: bool,
    pub tokenize_only: bool,
    pub parse_only: bool,
    pub timestamps: bool,
    pub stack_trace: bool,
    pub debug_level: u32,
    pub parser_verbosity: u32,
    /// Program run by `-pkg:`
    pub pkg_config_program: PathBuf,
    /// Arguments passed to the package tool ahead of `--libs`
    pub pkg_config_args: Vec<String>,
    /// Response files expanded so far
    pub response_files: HashSet<String>,
}

impl Default for CompileConfig {
    fn default() -> Self {
        CompileConfig {
            target: Target::default(),
            output_path: None,
            sources: SourceFileSet::default(),
            references: ReferenceSet::default(),
            modules: Vec::new(),
            link_paths: Vec::new(),
            resources: ResourceTable::default(),
            win32_resource: None,
            win32_icon: None,
            doc_output: None,
            debug_info: false,
            optimize: false,
            checked: false,
            unsafe_code: false,
            defines: IndexSet::new(),
            lang_version: LanguageVersion::default(),
            encoding: TextEncoding::default(),
            main_class: None,
            stdlib: true,
            load_default_config: true,
            signing: SigningOptions::default(),
            verify_cls_compliance: true,
            tokenize_only: false,
            parse_only: false,
            timestamps: false,
            stack_trace: false,
            debug_level: 0,
            parser_verbosity: 0,
            pkg_config_program: PathBuf::from("pkg-config"),
            pkg_config_args: Vec::new(),
            response_files: HashSet::new(),
        }
    }
}

impl CompileConfig {
    /// Output path derived from the first source when none was given
    pub fn default_output_path(&self) -> Option<PathBuf> {
        let first = self.sources.first()?;
        let stem = first.file_stem()?.to_string_lossy();
        let file_name = format!("{}{}", stem, self.target.extension());
        Some(first.with_file_name(file_name))
    }
}
