use indexmap::IndexMap;
use std::path::PathBuf;

use crate::diagnostic::SourceLocation;

/// Pipeline stages in execution order
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum CompilePhase {
    Parse,
    ConfigureDefaults,
    LoadReferences,
    OutputIdentity,
    LoadModules,
    CoreTypes,
    ResolveTree,
    Documentation,
    VerifyUsing,
    AssemblyAttributes,
    Emit,
    CloseTypes,
    EntryPoint,
    EmitResources,
    NativeResources,
    #[default]
    Save,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeclKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

impl DeclKind {
    /// Only classes and structs may declare `Main`
    pub fn can_host_entry_point(self) -> bool {
        matches!(self, DeclKind::Class | DeclKind::Struct)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDecl {
    pub name: String,
    pub kind: DeclKind,
    pub location: SourceLocation,
}

/// Method chosen to start the program
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub declaring_type: String,
    pub method: String,
}

/// Tree shared by the frontend, the type system and the code generator
#[derive(Debug, Default, Clone)]
pub struct ProgramTree {
    pub files: Vec<PathBuf>,
    pub declarations: IndexMap<String, TypeDecl>,
    pub entry_candidates: Vec<EntryPoint>,
}

impl ProgramTree {
    pub fn declaration(&self, name: &str) -> Option<&TypeDecl> {
        self.declarations.get(name)
    }
}

/// What a finished run produced
#[derive(Debug, Clone, Default)]
pub struct CompileOutcome {
    pub last_phase: CompilePhase,
    pub output_path: Option<PathBuf>,
    pub entry_point: Option<EntryPoint>,
}
