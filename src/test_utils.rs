//! Helpers shared by unit and integration tests
//!
//! [`StubBackend`] implements every collaborator trait over one shared
//! [`StubState`], so a test can script the collaborators, run the pipeline
//! and then inspect which calls were made.

use hashbrown::HashSet;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::diagnostic::{DiagnosticEngine, SourceLocation};
use crate::driver::artifact::{DeclKind, EntryPoint, ProgramTree, TypeDecl};
use crate::driver::backend::{
    Capability, CodeGenerator, Collaborators, ComplianceChecker, DocExporter, EmitContext, Frontend, FrontendAbort,
    Lexer, LoadError, OutputBackend, ParseRequest, ResolvedUnit, SourceFile, TokenKind, TypeSystem, UnitLoader,
};
use crate::driver::cli::{CompileConfig, PeKind};
use crate::driver::options::{ArgumentError, OptionParser, ParseOutcome};
use crate::driver::references::RootNamespace;
use crate::driver::resources::Visibility;

/// Collaborator call sites where a test can inject errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StubPhase {
    Parse,
    ResolveTree,
    Populate,
    DefineTypes,
    VerifyUsing,
    Attributes,
    Compliance,
    Emit,
}

#[derive(Debug)]
pub struct StubState {
    /// Collaborator methods in call order
    pub calls: Vec<String>,
    /// Errors reported when the phase runs
    pub errors: Vec<(StubPhase, i32)>,
    /// Declarations the frontend adds on every parse
    pub declarations: Vec<(String, DeclKind)>,
    pub parse_abort: Option<String>,
    pub entry_point: Option<EntryPoint>,
    pub core_types_ok: bool,
    pub cls_compliant: bool,
    pub docs_ok: bool,
    pub missing_capabilities: HashSet<Capability>,
    pub fail_init: bool,
    pub fail_save: bool,

    pub system_dir: PathBuf,
    /// Units `load_from` succeeds on
    pub units: IndexMap<PathBuf, ResolvedUnit>,
    /// Units `load_by_name` succeeds on
    pub named_units: IndexMap<String, ResolvedUnit>,
    pub bad_images: Vec<PathBuf>,
    /// Paths `probe_module` accepts
    pub module_containers: Vec<PathBuf>,
    /// Modules `add_module` accepts
    pub modules: IndexMap<PathBuf, ResolvedUnit>,
    pub probed: Vec<PathBuf>,

    pub init_path: Option<PathBuf>,
    pub module_only: bool,
    pub embedded: Vec<(String, usize, Visibility)>,
    pub linked: Vec<(String, String, Visibility)>,
    pub native_resource: Option<PathBuf>,
    pub version_info: bool,
    pub icon: Option<PathBuf>,
    pub defined_entry: Option<(EntryPoint, PeKind)>,
    pub saved: Option<PathBuf>,
}

impl Default for StubState {
    fn default() -> Self {
        StubState {
            calls: Vec::new(),
            errors: Vec::new(),
            declarations: Vec::new(),
            parse_abort: None,
            entry_point: None,
            core_types_ok: true,
            cls_compliant: false,
            docs_ok: true,
            missing_capabilities: HashSet::new(),
            fail_init: false,
            fail_save: false,
            system_dir: PathBuf::from("/stub/lib"),
            units: IndexMap::new(),
            named_units: IndexMap::new(),
            bad_images: Vec::new(),
            module_containers: Vec::new(),
            modules: IndexMap::new(),
            probed: Vec::new(),
            init_path: None,
            module_only: false,
            embedded: Vec::new(),
            linked: Vec::new(),
            native_resource: None,
            version_info: false,
            icon: None,
            defined_entry: None,
            saved: None,
        }
    }
}

/// Every collaborator in one scriptable object
#[derive(Debug, Clone, Default)]
pub struct StubBackend {
    pub state: Rc<RefCell<StubState>>,
}

impl StubBackend {
    pub fn new() -> Self {
        StubBackend::default()
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            frontend: Box::new(self.clone()),
            types: Box::new(self.clone()),
            codegen: Box::new(self.clone()),
            output: Box::new(self.clone()),
            loader: Box::new(self.clone()),
            compliance: Box::new(self.clone()),
            docs: Box::new(self.clone()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    pub fn fail_at(&self, phase: StubPhase, code: i32) {
        self.state.borrow_mut().errors.push((phase, code));
    }

    pub fn declare(&self, name: &str, kind: DeclKind) {
        self.state.borrow_mut().declarations.push((name.to_string(), kind));
    }

    pub fn set_entry_point(&self, declaring_type: &str) {
        self.state.borrow_mut().entry_point = Some(EntryPoint {
            declaring_type: declaring_type.to_string(),
            method: "Main".to_string(),
        });
    }

    /// Make `path` loadable as a unit
    pub fn add_unit(&self, path: impl Into<PathBuf>, identifiers: &[&str]) {
        let path = path.into();
        let unit = stub_unit(&path, identifiers, false);
        self.state.borrow_mut().units.insert(path, unit);
    }

    pub fn add_named_unit(&self, name: &str, identifiers: &[&str]) {
        let unit = stub_unit(Path::new(&format!("/gac/{}.dll", name)), identifiers, false);
        self.state.borrow_mut().named_units.insert(name.to_string(), unit);
    }

    fn record(&self, call: &str) {
        self.state.borrow_mut().calls.push(call.to_string());
    }

    fn inject(&self, phase: StubPhase, diagnostics: &mut DiagnosticEngine) {
        let codes: Vec<i32> = self
            .state
            .borrow()
            .errors
            .iter()
            .filter(|(p, _)| *p == phase)
            .map(|(_, code)| *code)
            .collect();
        for code in codes {
            diagnostics.report_error(code, format!("injected {:?} error", phase));
        }
    }
}

fn stub_unit(path: &Path, identifiers: &[&str], is_module: bool) -> ResolvedUnit {
    ResolvedUnit {
        name: path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        path: path.to_path_buf(),
        identifiers: identifiers.iter().map(|s| s.to_string()).collect(),
        is_module,
    }
}

/// Splits on whitespace; the word `@error` is an invalid token
pub struct StubLexer<'a> {
    words: std::str::SplitWhitespace<'a>,
}

impl Lexer for StubLexer<'_> {
    fn next_token(&mut self) -> TokenKind {
        match self.words.next() {
            None => TokenKind::Eof,
            Some("@error") => TokenKind::Error,
            Some(_) => TokenKind::Token,
        }
    }
}

impl Frontend for StubBackend {
    fn lexer<'a>(&self, _file: &'a SourceFile, text: &'a str) -> Box<dyn Lexer + 'a> {
        self.record("lexer");
        Box::new(StubLexer {
            words: text.split_whitespace(),
        })
    }

    fn parse(
        &mut self,
        request: ParseRequest<'_>,
        tree: &mut ProgramTree,
        diagnostics: &mut DiagnosticEngine,
    ) -> Result<(), FrontendAbort> {
        self.record("parse");
        self.inject(StubPhase::Parse, diagnostics);
        if let Some(reason) = self.state.borrow().parse_abort.clone() {
            return Err(FrontendAbort(reason));
        }
        for (name, kind) in self.state.borrow().declarations.iter() {
            tree.declarations.entry(name.clone()).or_insert_with(|| TypeDecl {
                name: name.clone(),
                kind: *kind,
                location: SourceLocation::new(request.file.path.clone(), 1, 1),
            });
        }
        Ok(())
    }
}

impl TypeSystem for StubBackend {
    fn resolve_core_types(&mut self, _root: &RootNamespace, _diagnostics: &mut DiagnosticEngine) -> bool {
        self.record("resolve_core_types");
        self.state.borrow().core_types_ok
    }

    fn resolve_tree(&mut self, _tree: &mut ProgramTree, diagnostics: &mut DiagnosticEngine) {
        self.record("resolve_tree");
        self.inject(StubPhase::ResolveTree, diagnostics);
    }

    fn populate(&mut self, _tree: &mut ProgramTree, bootstrap_core: bool, diagnostics: &mut DiagnosticEngine) {
        self.record(if bootstrap_core { "populate(bootstrap)" } else { "populate" });
        self.inject(StubPhase::Populate, diagnostics);
    }

    fn define_types(&mut self, _tree: &mut ProgramTree, diagnostics: &mut DiagnosticEngine) {
        self.record("define_types");
        self.inject(StubPhase::DefineTypes, diagnostics);
    }

    fn verify_using_aliases(&mut self, _tree: &ProgramTree, diagnostics: &mut DiagnosticEngine) {
        self.record("verify_using_aliases");
        self.inject(StubPhase::VerifyUsing, diagnostics);
    }

    fn close_types(&mut self, _tree: &mut ProgramTree) {
        self.record("close_types");
    }
}

impl CodeGenerator for StubBackend {
    fn emit(
        &mut self,
        _tree: &ProgramTree,
        _context: &EmitContext<'_>,
        _output: &mut dyn OutputBackend,
        diagnostics: &mut DiagnosticEngine,
    ) -> Option<EntryPoint> {
        self.record("emit");
        self.inject(StubPhase::Emit, diagnostics);
        self.state.borrow().entry_point.clone()
    }
}

impl OutputBackend for StubBackend {
    fn init(&mut self, path: &Path, _debug_info: bool) -> io::Result<()> {
        self.record("init");
        let mut state = self.state.borrow_mut();
        if state.fail_init {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"));
        }
        state.init_path = Some(path.to_path_buf());
        Ok(())
    }

    fn supports(&self, capability: Capability) -> bool {
        !self.state.borrow().missing_capabilities.contains(&capability)
    }

    fn mark_module_only(&mut self) {
        self.record("mark_module_only");
        self.state.borrow_mut().module_only = true;
    }

    fn add_module(&mut self, path: &Path) -> Result<ResolvedUnit, LoadError> {
        self.record("add_module");
        let state = self.state.borrow();
        match state.modules.get(path) {
            Some(unit) => Ok(unit.clone()),
            None if state.bad_images.iter().any(|p| p == path) => Err(LoadError::BadImage {
                path: path.to_path_buf(),
                log: String::new(),
            }),
            None => Err(LoadError::NotFound {
                path: path.to_path_buf(),
                log: String::new(),
            }),
        }
    }

    fn resolve_attributes(&mut self, _tree: &ProgramTree, diagnostics: &mut DiagnosticEngine) {
        self.record("resolve_attributes");
        self.inject(StubPhase::Attributes, diagnostics);
    }

    fn is_cls_compliant(&self) -> bool {
        self.state.borrow().cls_compliant
    }

    fn embed_resource(&mut self, name: &str, data: Vec<u8>, visibility: Visibility) {
        self.state
            .borrow_mut()
            .embedded
            .push((name.to_string(), data.len(), visibility));
    }

    fn link_resource(&mut self, name: &str, file_name: &str, visibility: Visibility) {
        self.state
            .borrow_mut()
            .linked
            .push((name.to_string(), file_name.to_string(), visibility));
    }

    fn define_native_resource(&mut self, path: &Path) -> io::Result<()> {
        self.state.borrow_mut().native_resource = Some(path.to_path_buf());
        Ok(())
    }

    fn define_version_info_resource(&mut self) {
        self.state.borrow_mut().version_info = true;
    }

    fn define_icon(&mut self, path: &Path) -> io::Result<()> {
        self.state.borrow_mut().icon = Some(path.to_path_buf());
        Ok(())
    }

    fn define_entry_point(&mut self, entry: &EntryPoint, kind: PeKind) {
        self.record("define_entry_point");
        self.state.borrow_mut().defined_entry = Some((entry.clone(), kind));
    }

    fn save(&mut self, path: &Path, _debug_info: bool) -> io::Result<()> {
        self.record("save");
        let mut state = self.state.borrow_mut();
        if state.fail_save {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "disk full"));
        }
        state.saved = Some(path.to_path_buf());
        Ok(())
    }
}

impl UnitLoader for StubBackend {
    fn load_from(&mut self, path: &Path) -> Result<ResolvedUnit, LoadError> {
        let mut state = self.state.borrow_mut();
        state.probed.push(path.to_path_buf());
        if let Some(unit) = state.units.get(path) {
            return Ok(unit.clone());
        }
        if state.bad_images.iter().any(|p| p == path) {
            return Err(LoadError::BadImage {
                path: path.to_path_buf(),
                log: format!("bad image {}", path.display()),
            });
        }
        Err(LoadError::NotFound {
            path: path.to_path_buf(),
            log: format!("probed {}\n", path.display()),
        })
    }

    fn load_by_name(&mut self, name: &str) -> Result<ResolvedUnit, LoadError> {
        match self.state.borrow().named_units.get(name) {
            Some(unit) => Ok(unit.clone()),
            None => Err(LoadError::NotFound {
                path: PathBuf::from(name),
                log: String::new(),
            }),
        }
    }

    fn probe_module(&mut self, path: &Path) -> bool {
        self.state.borrow().module_containers.iter().any(|p| p == path)
    }

    fn system_dir(&self) -> PathBuf {
        self.state.borrow().system_dir.clone()
    }
}

impl ComplianceChecker for StubBackend {
    fn verify(&mut self, _modules: &[ResolvedUnit], _tree: &ProgramTree, diagnostics: &mut DiagnosticEngine) {
        self.record("verify_compliance");
        self.inject(StubPhase::Compliance, diagnostics);
    }
}

impl DocExporter for StubBackend {
    fn export(&mut self, _path: &Path, _tree: &ProgramTree, _diagnostics: &mut DiagnosticEngine) -> bool {
        self.record("export_docs");
        self.state.borrow().docs_ok
    }
}

pub fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Parse `list` with a fresh diagnostics engine
pub fn parse_args(list: &[&str]) -> (Result<ParseOutcome, ArgumentError>, DiagnosticEngine) {
    let mut diagnostics = DiagnosticEngine::new();
    let outcome = OptionParser::new(&mut diagnostics).parse(args(list));
    (outcome, diagnostics)
}

/// Parse `list`, which must produce a compile request
pub fn parse_config(list: &[&str]) -> (CompileConfig, DiagnosticEngine) {
    match parse_args(list) {
        (Ok(ParseOutcome::Compile(config)), diagnostics) => (*config, diagnostics),
        (other, diagnostics) => panic!("expected a compile request, got {:?} ({:?})", other, diagnostics.diagnostics),
    }
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

pub fn init_test_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
