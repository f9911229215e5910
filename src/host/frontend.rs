//! Declaration scanner used by the command-line build
//!
//! This is not a parser. It records type declarations and `Main` methods
//! with regular expressions, which is enough to drive the pipeline: main-class
//! lookup, entry point selection and documentation output.

use log::trace;
use regex::Regex;
use std::sync::LazyLock;

use crate::diagnostic::{DiagnosticEngine, SourceLocation};
use crate::driver::artifact::{DeclKind, EntryPoint, ProgramTree, TypeDecl};
use crate::driver::backend::{
    CodeGenerator, EmitContext, Frontend, FrontendAbort, Lexer, OutputBackend, ParseRequest, SourceFile, TokenKind,
    TypeSystem,
};
use crate::driver::references::RootNamespace;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[\p{L}_][\p{L}\p{N}_]*|\d+|"(?:[^"\\\n]|\\.)*"|\S"#).expect("valid regex"));

static DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(class|struct|interface|enum|delegate)\s+(?:\w+\s+)??([\p{L}_][\p{L}\p{N}_]*)\s*(?:[:{<(]|$)")
        .expect("valid regex")
});

static NAMESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*namespace\s+([\w.]+)").expect("valid regex"));

static MAIN_METHOD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bstatic\s+(?:void|int)\s+Main\s*\(").expect("valid regex"));

/// Lexer splitting words, numbers, string literals and punctuation
pub struct ScanLexer<'a> {
    tokens: regex::Matches<'static, 'a>,
}

impl Lexer for ScanLexer<'_> {
    fn next_token(&mut self) -> TokenKind {
        match self.tokens.next() {
            None => TokenKind::Eof,
            // an unterminated string literal leaves a lone quote
            Some(m) if m.as_str() == "\"" => TokenKind::Error,
            Some(_) => TokenKind::Token,
        }
    }
}

#[derive(Debug, Default)]
pub struct ScanFrontend;

impl ScanFrontend {
    pub fn new() -> Self {
        ScanFrontend
    }
}

impl Frontend for ScanFrontend {
    fn lexer<'a>(&self, _file: &'a SourceFile, text: &'a str) -> Box<dyn Lexer + 'a> {
        Box::new(ScanLexer {
            tokens: TOKEN.find_iter(text),
        })
    }

    fn parse(
        &mut self,
        request: ParseRequest<'_>,
        tree: &mut ProgramTree,
        diagnostics: &mut DiagnosticEngine,
    ) -> Result<(), FrontendAbort> {
        let path = &request.file.path;
        let mut namespace: Option<String> = None;
        let mut current_type: Option<String> = None;
        let mut depth: i64 = 0;

        for (index, line) in request.text.lines().enumerate() {
            let line_no = index as u32 + 1;

            if let Some(caps) = NAMESPACE.captures(line) {
                namespace = Some(caps[1].to_string());
            }

            for caps in DECLARATION.captures_iter(line) {
                let kind = match &caps[1] {
                    "class" => DeclKind::Class,
                    "struct" => DeclKind::Struct,
                    "interface" => DeclKind::Interface,
                    "enum" => DeclKind::Enum,
                    _ => DeclKind::Delegate,
                };
                let name = match &namespace {
                    Some(ns) => format!("{}.{}", ns, &caps[2]),
                    None => caps[2].to_string(),
                };
                let column = caps.get(2).map_or(1, |m| m.start() as u32 + 1);
                let location = SourceLocation::new(path.clone(), line_no, column);

                if tree.declarations.contains_key(&name) {
                    diagnostics.report_error_at(
                        101,
                        location,
                        format!("The namespace `{}' already contains a definition for `{}'", namespace.as_deref().unwrap_or("global::"), &caps[2]),
                    );
                    continue;
                }

                trace!("declaration {:?} {}", kind, name);
                if kind.can_host_entry_point() {
                    current_type = Some(name.clone());
                }
                tree.declarations.insert(name.clone(), TypeDecl { name, kind, location });
            }

            if MAIN_METHOD.is_match(line) {
                match &current_type {
                    Some(declaring_type) => tree.entry_candidates.push(EntryPoint {
                        declaring_type: declaring_type.clone(),
                        method: "Main".to_string(),
                    }),
                    None => diagnostics.report_error_at(
                        116,
                        SourceLocation::new(path.clone(), line_no, 1),
                        "A namespace can only contain types and namespace declarations",
                    ),
                }
            }

            depth += line.matches('{').count() as i64;
            depth -= line.matches('}').count() as i64;
            if depth < 0 {
                return Err(FrontendAbort(format!("unbalanced `}}' at line {}", line_no)));
            }
        }

        if depth > 0 {
            let last_line = request.text.lines().count() as u32;
            diagnostics.report_error_at(1513, SourceLocation::new(path.clone(), last_line.max(1), 1), "} expected");
        }
        Ok(())
    }
}

/// Type system without semantic analysis. Declarations are already unique
/// once scanned; defining them only fixes their order.
#[derive(Debug, Default)]
pub struct HostTypeSystem;

impl TypeSystem for HostTypeSystem {
    fn resolve_core_types(&mut self, root: &RootNamespace, _diagnostics: &mut DiagnosticEngine) -> bool {
        trace!("{} unit(s) visible while resolving core types", root.units().len());
        true
    }

    fn resolve_tree(&mut self, _tree: &mut ProgramTree, _diagnostics: &mut DiagnosticEngine) {}

    fn populate(&mut self, tree: &mut ProgramTree, bootstrap_core: bool, _diagnostics: &mut DiagnosticEngine) {
        trace!("populating {} declaration(s), bootstrap: {}", tree.declarations.len(), bootstrap_core);
    }

    fn define_types(&mut self, tree: &mut ProgramTree, _diagnostics: &mut DiagnosticEngine) {
        tree.declarations.sort_keys();
    }

    fn verify_using_aliases(&mut self, _tree: &ProgramTree, _diagnostics: &mut DiagnosticEngine) {}

    fn close_types(&mut self, _tree: &mut ProgramTree) {}
}

/// Picks the entry point among the scanned `Main` methods
#[derive(Debug, Default)]
pub struct EntryPointSelector;

impl CodeGenerator for EntryPointSelector {
    fn emit(
        &mut self,
        tree: &ProgramTree,
        context: &EmitContext<'_>,
        _output: &mut dyn OutputBackend,
        diagnostics: &mut DiagnosticEngine,
    ) -> Option<EntryPoint> {
        if !context.target.needs_entry_point() {
            return None;
        }

        let candidates: Vec<&EntryPoint> = tree
            .entry_candidates
            .iter()
            .filter(|c| context.main_class.map_or(true, |main| c.declaring_type == main))
            .collect();

        match candidates.as_slice() {
            [] => None,
            [entry] => Some((*entry).clone()),
            many => {
                for candidate in many {
                    let location = tree
                        .declaration(&candidate.declaring_type)
                        .map(|decl| decl.location.clone());
                    let message = format!(
                        "Program has more than one entry point defined: `{}.Main'",
                        candidate.declaring_type
                    );
                    match location {
                        Some(location) => diagnostics.report_error_at(17, location, message),
                        None => diagnostics.report_error(17, message),
                    }
                }
                None
            }
        }
    }
}
