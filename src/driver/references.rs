//! Reference resolution
//!
//! Turns `-r`, soft default references and `-addmodule` entries into loaded
//! units and binds them into the root namespace: unaliased units join the
//! global root, aliased units are reachable only through their alias.

use indexmap::IndexMap;
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::diagnostic::DiagnosticEngine;

use super::backend::{LoadError, OutputBackend, ResolvedUnit, UnitLoader};

/// Core library loaded unless `-nostdlib`
pub const STDLIB_NAME: &str = "mscorlib";

/// References requested on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceSet {
    pub hard: Vec<String>,
    pub soft: Vec<String>,
    /// alias -> unit name, last assignment wins
    pub aliases: IndexMap<String, String>,
}

impl ReferenceSet {
    pub fn add_reference(&mut self, name: &str) {
        self.hard.push(name.to_string());
    }

    /// A reference that is silently dropped when it cannot be found
    pub fn add_soft_reference(&mut self, name: &str) {
        self.soft.push(name.to_string());
    }

    /// Register `alias=name`. Invalid bindings are reported and ignored.
    pub fn add_extern_alias(&mut self, alias: &str, name: &str, diagnostics: &mut DiagnosticEngine) -> bool {
        if name.is_empty() {
            diagnostics.report_error(1680, format!("Invalid reference alias `{}='. Missing filename", alias));
            return false;
        }
        if !is_valid_alias(alias) {
            diagnostics.report_error(
                1679,
                format!("Invalid extern alias for -reference. Alias `{}' is not a valid identifier", alias),
            );
            return false;
        }
        self.aliases.insert(alias.to_string(), name.to_string());
        true
    }
}

/// Alias names are identifiers: a letter or `_`, then letters, digits,
/// connector punctuation, formatting or combining marks
pub fn is_valid_alias(alias: &str) -> bool {
    let mut chars = alias.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || is_connector_or_mark(c))
}

fn is_connector_or_mark(c: char) -> bool {
    matches!(c,
        '_' | '\u{203F}' | '\u{2040}' | '\u{2054}' | '\u{FE33}' | '\u{FE34}' | '\u{FE4D}'..='\u{FE4F}' | '\u{FF3F}'
        | '\u{200C}' | '\u{200D}'
        | '\u{0300}'..='\u{036F}' | '\u{1AB0}'..='\u{1AFF}' | '\u{1DC0}'..='\u{1DFF}' | '\u{20D0}'..='\u{20FF}'
        | '\u{FE20}'..='\u{FE2F}')
}

/// Why a reference could not be bound
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("cannot find metadata file `{name}'")]
    NotFound { name: String, log: String },
    #[error("file `{file}' has invalid `{kind}' metadata")]
    InvalidMetadata { file: String, kind: &'static str, log: String },
    #[error("Referenced file `{file}' is not an assembly. Consider using `-addmodule' option instead")]
    NotAUnit { file: String },
}

impl ResolveError {
    pub fn code(&self) -> i32 {
        match self {
            ResolveError::NotFound { .. } => 6,
            ResolveError::InvalidMetadata { .. } => 9,
            ResolveError::NotAUnit { .. } => 1509,
        }
    }

    fn log(&self) -> &str {
        match self {
            ResolveError::NotFound { log, .. } | ResolveError::InvalidMetadata { log, .. } => log,
            ResolveError::NotAUnit { .. } => "",
        }
    }
}

/// Loaded units and where they are visible
#[derive(Debug, Default)]
pub struct RootNamespace {
    units: Vec<ResolvedUnit>,
    global: Vec<usize>,
    aliases: IndexMap<String, usize>,
    modules: Vec<ResolvedUnit>,
}

impl RootNamespace {
    pub fn units(&self) -> &[ResolvedUnit] {
        &self.units
    }

    /// Units merged into the global root, in load order
    pub fn global_units(&self) -> impl Iterator<Item = &ResolvedUnit> {
        self.global.iter().map(|&i| &self.units[i])
    }

    pub fn alias(&self, alias: &str) -> Option<&ResolvedUnit> {
        self.aliases.get(alias).map(|&i| &self.units[i])
    }

    pub fn modules(&self) -> &[ResolvedUnit] {
        &self.modules
    }

    /// Unit providing root identifier `name`. Later units shadow earlier ones,
    /// so the core library has the lowest priority.
    pub fn lookup(&self, name: &str) -> Option<&ResolvedUnit> {
        self.global
            .iter()
            .rev()
            .map(|&i| &self.units[i])
            .find(|unit| unit.identifiers.iter().any(|id| id == name))
    }

    fn find_loaded(&self, name: &str) -> Option<usize> {
        self.units.iter().position(|unit| unit.name == name)
    }

    fn bind(&mut self, index: usize, alias: Option<&str>) {
        match alias {
            Some(alias) => {
                self.aliases.insert(alias.to_string(), index);
            }
            None if !self.global.contains(&index) => self.global.push(index),
            None => {}
        }
    }
}

enum Located {
    Loaded(usize),
    New(ResolvedUnit),
}

/// Locates references through a [`UnitLoader`] and the link path
#[derive(Debug, Default)]
pub struct ReferenceResolver {
    link_paths: Vec<PathBuf>,
    root: RootNamespace,
}

impl ReferenceResolver {
    pub fn new() -> Self {
        ReferenceResolver::default()
    }

    pub fn set_link_paths(&mut self, link_paths: Vec<PathBuf>) {
        self.link_paths = link_paths;
    }

    pub fn link_paths(&self) -> &[PathBuf] {
        &self.link_paths
    }

    pub fn root(&self) -> &RootNamespace {
        &self.root
    }

    /// Load `name` and bind it under `alias` (or into the global root).
    ///
    /// Failures are reported and returned, except that a soft reference which
    /// cannot be found is dropped without a diagnostic (`Ok(None)`).
    pub fn resolve(
        &mut self,
        loader: &mut dyn UnitLoader,
        name: &str,
        alias: Option<&str>,
        soft: bool,
        diagnostics: &mut DiagnosticEngine,
    ) -> Result<Option<&ResolvedUnit>, ResolveError> {
        let index = match self.locate(loader, name) {
            Ok(Located::Loaded(index)) => index,
            Ok(Located::New(unit)) => {
                info!("loaded reference {} from {}", unit.name, unit.path.display());
                self.root.units.push(unit);
                self.root.units.len() - 1
            }
            Err(ResolveError::NotFound { .. }) if soft => {
                debug!("soft reference {} not found", name);
                return Ok(None);
            }
            Err(err) => {
                report(&err, diagnostics);
                return Err(err);
            }
        };

        self.root.bind(index, alias);
        Ok(Some(&self.root.units[index]))
    }

    /// Resolve everything in `references`: core library, soft, hard, aliased
    pub fn resolve_all(
        &mut self,
        loader: &mut dyn UnitLoader,
        references: &ReferenceSet,
        stdlib: bool,
        diagnostics: &mut DiagnosticEngine,
    ) {
        if stdlib {
            let _ = self.resolve(loader, STDLIB_NAME, None, false, diagnostics);
        }
        for name in &references.soft {
            let _ = self.resolve(loader, name, None, true, diagnostics);
        }
        for name in &references.hard {
            let _ = self.resolve(loader, name, None, false, diagnostics);
        }
        for (alias, name) in &references.aliases {
            let _ = self.resolve(loader, name, Some(alias), false, diagnostics);
        }
    }

    fn locate(&self, loader: &mut dyn UnitLoader, name: &str) -> Result<Located, ResolveError> {
        let mut log = String::new();

        if is_path_shaped(name) {
            match loader.load_from(Path::new(name)) {
                Ok(unit) => return Ok(Located::New(unit)),
                Err(LoadError::NotFound { log: attempt, .. }) => log.push_str(&attempt),
                Err(err) => return Err(classify(loader, err)),
            }
        } else {
            let simple = strip_unit_extension(name);
            if let Some(index) = self.root.find_loaded(simple) {
                return Ok(Located::Loaded(index));
            }
            match loader.load_by_name(simple) {
                Ok(unit) => return Ok(Located::New(unit)),
                Err(LoadError::NotFound { log: attempt, .. }) => log.push_str(&attempt),
                Err(err) => return Err(classify(loader, err)),
            }
        }

        for dir in &self.link_paths {
            for candidate in unit_candidates(dir, name) {
                match loader.load_from(&candidate) {
                    Ok(unit) => return Ok(Located::New(unit)),
                    Err(LoadError::NotFound { log: attempt, .. }) => log.push_str(&attempt),
                    Err(err) => return Err(classify(loader, err)),
                }
            }
        }

        Err(ResolveError::NotFound {
            name: name.to_string(),
            log,
        })
    }

    /// Link a `-addmodule` entry into the output being built
    pub fn load_module(
        &mut self,
        output: &mut dyn OutputBackend,
        name: &str,
        diagnostics: &mut DiagnosticEngine,
    ) -> Option<&ResolvedUnit> {
        let mut log = String::new();
        let mut candidates = vec![PathBuf::from(name)];
        for dir in &self.link_paths {
            candidates.push(dir.join(name));
            if !name.ends_with(".netmodule") {
                candidates.push(dir.join(format!("{}.netmodule", name)));
            }
        }

        for candidate in candidates {
            match output.add_module(&candidate) {
                Ok(unit) => {
                    info!("linked module {}", candidate.display());
                    self.root.modules.push(unit);
                    return self.root.modules.last();
                }
                Err(LoadError::NotFound { log: attempt, .. }) => log.push_str(&attempt),
                Err(err) => {
                    let (path, log) = match err {
                        LoadError::BadImage { path, log } => (path, log),
                        LoadError::NotAUnit { path } | LoadError::NotFound { path, .. } => (path, String::new()),
                    };
                    let err = ResolveError::InvalidMetadata {
                        file: path.display().to_string(),
                        kind: "module",
                        log,
                    };
                    report(&err, diagnostics);
                    return None;
                }
            }
        }

        report(
            &ResolveError::NotFound {
                name: name.to_string(),
                log,
            },
            diagnostics,
        );
        None
    }
}

/// An invalid unit that is a well-formed module container gets a more
/// helpful diagnostic
fn classify(loader: &mut dyn UnitLoader, err: LoadError) -> ResolveError {
    match err {
        LoadError::BadImage { path, log } => {
            if loader.probe_module(&path) {
                ResolveError::NotAUnit {
                    file: display_name(&path),
                }
            } else {
                ResolveError::InvalidMetadata {
                    file: path.display().to_string(),
                    kind: "assembly",
                    log,
                }
            }
        }
        LoadError::NotAUnit { path } => ResolveError::NotAUnit {
            file: display_name(&path),
        },
        LoadError::NotFound { path, log } => ResolveError::NotFound {
            name: path.display().to_string(),
            log,
        },
    }
}

fn report(err: &ResolveError, diagnostics: &mut DiagnosticEngine) {
    diagnostics.report_error(err.code(), err.to_string());
    let log = err.log();
    if !log.is_empty() {
        diagnostics.report_note(format!("Log:\n{}\n(log related to previous command)", log.trim_end()));
    }
}

fn is_path_shaped(name: &str) -> bool {
    name.contains('/') || name.contains('\\')
}

fn strip_unit_extension(name: &str) -> &str {
    name.strip_suffix(".dll")
        .or_else(|| name.strip_suffix(".exe"))
        .unwrap_or(name)
}

fn unit_candidates(dir: &Path, name: &str) -> Vec<PathBuf> {
    let mut candidates = vec![dir.join(name)];
    if strip_unit_extension(name) == name {
        candidates.push(dir.join(format!("{}.dll", name)));
    }
    candidates
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
