//! Collaborator capability traits
//!
//! The driver never parses, type-checks or writes binaries itself. Each of
//! those jobs sits behind one trait here and is handed to the orchestrator in
//! a [`Collaborators`] bundle.

use std::io;
use std::path::{Path, PathBuf};

use crate::diagnostic::DiagnosticEngine;

use super::artifact::{EntryPoint, ProgramTree};
use super::cli::{CompileConfig, PeKind, Target};
use super::references::RootNamespace;
use super::resources::Visibility;

/// A loaded reference or module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedUnit {
    pub name: String,
    pub path: PathBuf,
    /// Root namespace identifiers the unit exports
    pub identifiers: Vec<String>,
    pub is_module: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("`{}' not found", .path.display())]
    NotFound { path: PathBuf, log: String },
    #[error("`{}' is a module, not a unit", .path.display())]
    NotAUnit { path: PathBuf },
    #[error("`{}' has a bad image", .path.display())]
    BadImage { path: PathBuf, log: String },
}

/// Optional output backend features
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    ModuleOnly,
    ResourceEmbedding,
    NativeResources,
    IconResources,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Token,
    Error,
    Eof,
}

pub trait Lexer {
    fn next_token(&mut self) -> TokenKind;
}

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub id: usize,
    pub path: PathBuf,
}

pub struct ParseRequest<'a> {
    pub file: &'a SourceFile,
    pub text: &'a str,
    pub config: &'a CompileConfig,
}

/// The frontend gave up on a file
#[derive(Debug, Clone, thiserror::Error)]
#[error("{0}")]
pub struct FrontendAbort(pub String);

pub trait Frontend {
    fn lexer<'a>(&self, file: &'a SourceFile, text: &'a str) -> Box<dyn Lexer + 'a>;

    /// Add the declarations of one file to `tree`
    fn parse(
        &mut self,
        request: ParseRequest<'_>,
        tree: &mut ProgramTree,
        diagnostics: &mut DiagnosticEngine,
    ) -> Result<(), FrontendAbort>;
}

pub trait TypeSystem {
    /// Bind the predefined types. `false` aborts the run.
    fn resolve_core_types(&mut self, root: &RootNamespace, diagnostics: &mut DiagnosticEngine) -> bool;
    fn resolve_tree(&mut self, tree: &mut ProgramTree, diagnostics: &mut DiagnosticEngine);
    /// `bootstrap_core` is set when the core library is being compiled
    fn populate(&mut self, tree: &mut ProgramTree, bootstrap_core: bool, diagnostics: &mut DiagnosticEngine);
    fn define_types(&mut self, tree: &mut ProgramTree, diagnostics: &mut DiagnosticEngine);
    fn verify_using_aliases(&mut self, tree: &ProgramTree, diagnostics: &mut DiagnosticEngine);
    fn close_types(&mut self, tree: &mut ProgramTree);
}

/// Settings the code generator needs from the configuration
#[derive(Debug, Clone)]
pub struct EmitContext<'a> {
    pub target: Target,
    pub main_class: Option<&'a str>,
    pub optimize: bool,
    pub checked: bool,
    pub debug_info: bool,
}

pub trait CodeGenerator {
    /// Emit all code. Returns the entry point found while emitting, if any.
    fn emit(
        &mut self,
        tree: &ProgramTree,
        context: &EmitContext<'_>,
        output: &mut dyn OutputBackend,
        diagnostics: &mut DiagnosticEngine,
    ) -> Option<EntryPoint>;
}

/// The container being written
pub trait OutputBackend {
    fn init(&mut self, path: &Path, debug_info: bool) -> io::Result<()>;
    fn supports(&self, capability: Capability) -> bool;
    fn mark_module_only(&mut self);
    fn add_module(&mut self, path: &Path) -> Result<ResolvedUnit, LoadError>;
    fn resolve_attributes(&mut self, tree: &ProgramTree, diagnostics: &mut DiagnosticEngine);
    /// The unit declares itself CLS compliant
    fn is_cls_compliant(&self) -> bool;
    fn embed_resource(&mut self, name: &str, data: Vec<u8>, visibility: Visibility);
    fn link_resource(&mut self, name: &str, file_name: &str, visibility: Visibility);
    fn define_native_resource(&mut self, path: &Path) -> io::Result<()>;
    fn define_version_info_resource(&mut self);
    fn define_icon(&mut self, path: &Path) -> io::Result<()>;
    fn define_entry_point(&mut self, entry: &EntryPoint, kind: PeKind);
    fn save(&mut self, path: &Path, debug_info: bool) -> io::Result<()>;
}

pub trait UnitLoader {
    fn load_from(&mut self, path: &Path) -> Result<ResolvedUnit, LoadError>;
    /// Load from the runtime's own cache by simple name
    fn load_by_name(&mut self, name: &str) -> Result<ResolvedUnit, LoadError>;
    /// `path` is a well-formed module container
    fn probe_module(&mut self, path: &Path) -> bool;
    /// Directory holding the runtime's libraries
    fn system_dir(&self) -> PathBuf;
}

pub trait ComplianceChecker {
    fn verify(&mut self, modules: &[ResolvedUnit], tree: &ProgramTree, diagnostics: &mut DiagnosticEngine);
}

pub trait DocExporter {
    /// Write documentation for `tree`. `false` aborts the run.
    fn export(&mut self, path: &Path, tree: &ProgramTree, diagnostics: &mut DiagnosticEngine) -> bool;
}

/// Every collaborator one run needs
pub struct Collaborators {
    pub frontend: Box<dyn Frontend>,
    pub types: Box<dyn TypeSystem>,
    pub codegen: Box<dyn CodeGenerator>,
    pub output: Box<dyn OutputBackend>,
    pub loader: Box<dyn UnitLoader>,
    pub compliance: Box<dyn ComplianceChecker>,
    pub docs: Box<dyn DocExporter>,
}
