//! Core compilation pipeline orchestration module
//!
//! This module contains the compiler driver that runs the collaborators
//! through the fixed sequence of phases: parse, reference loading, semantic
//! passes, emission, entry point, resources and save. Most phases end at a
//! gate that stops the run as soon as any error has been counted.

use log::{debug, info, trace};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::diagnostic::DiagnosticEngine;
use crate::lang_options::LanguageVersion;

use super::artifact::{CompileOutcome, CompilePhase, EntryPoint, ProgramTree};
use super::backend::{Capability, Collaborators, EmitContext, ParseRequest, SourceFile, TokenKind};
use super::cli::{CompileConfig, Target};
use super::output::Timer;
use super::references::ReferenceResolver;

/// Soft references added unless `-noconfig`
pub const DEFAULT_CONFIG: &[&str] = &["System", "System.Xml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Ready,
    Finished,
}

/// Main compiler driver
pub struct CompilerDriver {
    config: CompileConfig,
    diagnostics: DiagnosticEngine,
    collaborators: Collaborators,
    resolver: ReferenceResolver,
    tree: ProgramTree,
    timer: Timer,
    phase: CompilePhase,
    output_path: Option<PathBuf>,
    entry_point: Option<EntryPoint>,
    state: DriverState,
}

impl CompilerDriver {
    /// Create a driver for one run. `diagnostics` usually carries the policy
    /// set while parsing options.
    pub fn new(config: CompileConfig, diagnostics: DiagnosticEngine, collaborators: Collaborators) -> Self {
        let timer = Timer::new(config.timestamps);
        CompilerDriver {
            config,
            diagnostics,
            collaborators,
            resolver: ReferenceResolver::new(),
            tree: ProgramTree::default(),
            timer,
            phase: CompilePhase::Parse,
            output_path: None,
            entry_point: None,
            state: DriverState::Ready,
        }
    }

    /// Prepare the driver for another run with a fresh configuration
    pub fn reset(&mut self, config: CompileConfig) {
        self.timer = Timer::new(config.timestamps);
        self.config = config;
        self.diagnostics.reset();
        self.resolver = ReferenceResolver::new();
        self.tree = ProgramTree::default();
        self.phase = CompilePhase::Parse;
        self.output_path = None;
        self.entry_point = None;
        self.state = DriverState::Ready;
    }

    pub fn diagnostics(&self) -> &DiagnosticEngine {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> DiagnosticEngine {
        self.diagnostics
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    pub fn resolver(&self) -> &ReferenceResolver {
        &self.resolver
    }

    pub fn tree(&self) -> &ProgramTree {
        &self.tree
    }

    /// Run every phase up to and including `stop_after`
    pub fn run_pipeline(&mut self, stop_after: CompilePhase) -> Result<CompileOutcome, PipelineError> {
        if self.state == DriverState::Finished {
            return Err(PipelineError::Internal(
                "the driver was run twice without a reset".to_string(),
            ));
        }
        self.state = DriverState::Finished;

        self.run_parse()?;
        if stop_after == CompilePhase::Parse || self.config.tokenize_only || self.config.parse_only {
            return Ok(self.outcome());
        }

        self.run_configure_defaults()?;
        self.run_load_references()?;
        self.run_output_identity()?;
        self.run_load_modules();
        self.stop_if_fatal()?;
        self.run_core_types()?;
        self.run_resolve_tree()?;
        self.run_documentation()?;
        self.run_verify_using()?;
        self.run_assembly_attributes()?;
        if stop_after < CompilePhase::Emit {
            return Ok(self.outcome());
        }

        self.run_emit()?;
        self.run_close_types();
        self.stop_if_fatal()?;
        self.run_entry_point()?;
        self.run_emit_resources()?;
        self.run_native_resources();
        self.stop_if_fatal()?;
        self.run_save()?;

        Ok(self.outcome())
    }

    fn enter(&mut self, phase: CompilePhase) {
        trace!("entering {:?}", phase);
        self.phase = phase;
    }

    fn outcome(&self) -> CompileOutcome {
        CompileOutcome {
            last_phase: self.phase,
            output_path: self.output_path.clone(),
            entry_point: self.entry_point.clone(),
        }
    }

    /// Check if there are any diagnostics errors and return PipelineError::Halted if there are
    fn check_diagnostics_and_return_if_error(&self) -> Result<(), PipelineError> {
        self.stop_if_fatal()?;
        if self.diagnostics.has_errors() {
            debug!("stopping after {:?}: {} error(s)", self.phase, self.diagnostics.error_count());
            Err(PipelineError::Halted(self.phase))
        } else {
            Ok(())
        }
    }

    /// Under `--fatal` any counted error ends the run where it happened
    fn stop_if_fatal(&self) -> Result<(), PipelineError> {
        if self.diagnostics.fatal_error_seen() {
            debug!("fatal error during {:?}", self.phase);
            return Err(PipelineError::Fatal(self.phase));
        }
        Ok(())
    }

    fn run_parse(&mut self) -> Result<(), PipelineError> {
        self.enter(CompilePhase::Parse);

        let files: Vec<PathBuf> = self.config.sources.iter().map(PathBuf::from).collect();
        for (id, path) in files.into_iter().enumerate() {
            self.stop_if_fatal()?;
            let file = SourceFile { id, path };
            let Some(text) = self.read_source(&file) else {
                continue;
            };

            if self.config.tokenize_only {
                self.tokenize_file(&file, &text);
            } else {
                self.parse_file(&file, &text);
            }
        }
        self.timer.show_time("   Parsing done");

        self.check_diagnostics_and_return_if_error()
    }

    fn read_source(&mut self, file: &SourceFile) -> Option<String> {
        let bytes = match fs::read(&file.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!("reading {} failed: {}", file.path.display(), e);
                self.diagnostics.report_error(
                    2001,
                    format!("Source file `{}' could not be found", file.path.display()),
                );
                return None;
            }
        };

        if bytes.starts_with(b"MZ") {
            self.diagnostics.report_error(
                2015,
                format!("Source file `{}' is a binary file and not a text file", file.path.display()),
            );
            return None;
        }

        match self.config.encoding.decode(&bytes) {
            Ok(text) => Some(text),
            Err(e) => {
                self.diagnostics.report_error(
                    2016,
                    format!("Source file `{}' could not be decoded: {}", file.path.display(), e),
                );
                None
            }
        }
    }

    fn tokenize_file(&mut self, file: &SourceFile, text: &str) {
        let mut lexer = self.collaborators.frontend.lexer(file, text);
        let mut tokens = 0;
        let mut errors = 0;
        loop {
            match lexer.next_token() {
                TokenKind::Eof => break,
                TokenKind::Error => errors += 1,
                TokenKind::Token => {}
            }
            tokens += 1;
        }
        println!("Tokenized: {} found {} errors", tokens, errors);
    }

    fn parse_file(&mut self, file: &SourceFile, text: &str) {
        info!("parsing {}", file.path.display());
        self.tree.files.push(file.path.clone());

        let request = ParseRequest {
            file,
            text,
            config: &self.config,
        };
        if let Err(abort) = self
            .collaborators
            .frontend
            .parse(request, &mut self.tree, &mut self.diagnostics)
        {
            self.diagnostics.report_error(
                589,
                format!("Compilation aborted in file `{}', {}", file.path.display(), abort),
            );
        }
    }

    fn run_configure_defaults(&mut self) -> Result<(), PipelineError> {
        self.enter(CompilePhase::ConfigureDefaults);

        if self.config.load_default_config {
            if self.config.lang_version == LanguageVersion::Linq {
                self.config.references.add_soft_reference("System.Core");
            }
            for name in DEFAULT_CONFIG {
                self.config.references.add_soft_reference(name);
            }
        }

        self.check_diagnostics_and_return_if_error()
    }

    fn run_load_references(&mut self) -> Result<(), PipelineError> {
        self.enter(CompilePhase::LoadReferences);
        self.timer.show_time("Loading references");

        let mut link_paths = self.config.link_paths.clone();
        link_paths.push(self.collaborators.loader.system_dir());
        link_paths.push(env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        self.resolver.set_link_paths(link_paths);

        self.resolver.resolve_all(
            self.collaborators.loader.as_mut(),
            &self.config.references,
            self.config.stdlib,
            &mut self.diagnostics,
        );
        self.timer.show_time("   References loaded");

        self.check_diagnostics_and_return_if_error()
    }

    fn run_output_identity(&mut self) -> Result<(), PipelineError> {
        self.enter(CompilePhase::OutputIdentity);

        let output = match self.config.output_path.clone() {
            Some(path) => path,
            None => match self.config.default_output_path() {
                Some(path) => path,
                None => {
                    self.diagnostics.report_error(
                        1562,
                        "If no source files are specified you must specify the output file with -out:",
                    );
                    return Err(PipelineError::Halted(self.phase));
                }
            },
        };
        info!("output file {}", output.display());

        if let Err(e) = self.collaborators.output.init(&output, self.config.debug_info) {
            self.diagnostics.report_error(
                16,
                format!("Could not write to file `{}', cause: {}", output.display(), e),
            );
            return Err(PipelineError::Fatal(self.phase));
        }

        if self.config.target == Target::Module {
            if !self.collaborators.output.supports(Capability::ModuleOnly) {
                self.diagnostics.runtime_missing_support("/target:module");
                return Err(PipelineError::MissingRuntimeSupport("/target:module".to_string()));
            }
            self.collaborators.output.mark_module_only();
        }

        self.output_path = Some(output);
        Ok(())
    }

    fn run_load_modules(&mut self) {
        self.enter(CompilePhase::LoadModules);

        for module in self.config.modules.clone() {
            self.resolver
                .load_module(self.collaborators.output.as_mut(), &module, &mut self.diagnostics);
        }
    }

    fn run_core_types(&mut self) -> Result<(), PipelineError> {
        self.enter(CompilePhase::CoreTypes);

        let resolved = self
            .collaborators
            .types
            .resolve_core_types(self.resolver.root(), &mut self.diagnostics);
        if !resolved {
            return Err(PipelineError::Fatal(self.phase));
        }
        Ok(())
    }

    fn run_resolve_tree(&mut self) -> Result<(), PipelineError> {
        self.enter(CompilePhase::ResolveTree);
        let types = &mut self.collaborators.types;

        self.timer.show_time("Resolving tree");
        types.resolve_tree(&mut self.tree, &mut self.diagnostics);
        self.check_diagnostics_and_return_if_error()?;

        self.timer.show_time("Populate tree");
        let types = &mut self.collaborators.types;
        types.populate(&mut self.tree, !self.config.stdlib, &mut self.diagnostics);
        self.stop_if_fatal()?;
        self.collaborators.types.define_types(&mut self.tree, &mut self.diagnostics);
        self.timer.show_time("   Types definitions");
        self.stop_if_fatal()
    }

    fn run_documentation(&mut self) -> Result<(), PipelineError> {
        self.enter(CompilePhase::Documentation);

        let Some(doc) = self.config.doc_output.clone() else {
            return Ok(());
        };
        if self.diagnostics.has_errors() {
            return Ok(());
        }

        if !self.collaborators.docs.export(&doc, &self.tree, &mut self.diagnostics) {
            return Err(PipelineError::Fatal(self.phase));
        }
        self.timer.show_time("Documentation");
        Ok(())
    }

    fn run_verify_using(&mut self) -> Result<(), PipelineError> {
        self.enter(CompilePhase::VerifyUsing);
        self.collaborators
            .types
            .verify_using_aliases(&self.tree, &mut self.diagnostics);
        self.check_diagnostics_and_return_if_error()
    }

    fn run_assembly_attributes(&mut self) -> Result<(), PipelineError> {
        self.enter(CompilePhase::AssemblyAttributes);
        let output = &mut self.collaborators.output;

        output.resolve_attributes(&self.tree, &mut self.diagnostics);
        if self.config.verify_cls_compliance && output.is_cls_compliant() {
            self.collaborators
                .compliance
                .verify(self.resolver.root().modules(), &self.tree, &mut self.diagnostics);
        }

        self.check_diagnostics_and_return_if_error()
    }

    fn run_emit(&mut self) -> Result<(), PipelineError> {
        self.enter(CompilePhase::Emit);
        self.timer.show_time("Emitting code");

        let context = EmitContext {
            target: self.config.target,
            main_class: self.config.main_class.as_deref(),
            optimize: self.config.optimize,
            checked: self.config.checked,
            debug_info: self.config.debug_info,
        };
        self.entry_point = self.collaborators.codegen.emit(
            &self.tree,
            &context,
            self.collaborators.output.as_mut(),
            &mut self.diagnostics,
        );
        self.timer.show_time("   Code emitted");

        self.check_diagnostics_and_return_if_error()
    }

    fn run_close_types(&mut self) {
        self.enter(CompilePhase::CloseTypes);
        self.timer.show_time("Closing types");
        self.collaborators.types.close_types(&mut self.tree);
    }

    fn run_entry_point(&mut self) -> Result<(), PipelineError> {
        self.enter(CompilePhase::EntryPoint);
        let target = self.config.target;

        if !target.needs_entry_point() {
            if self.config.main_class.is_some() {
                self.diagnostics
                    .report_error(2017, "Cannot specify -main if building a module or library");
            }
            return Ok(());
        }

        match self.entry_point.clone() {
            Some(entry) => {
                debug!("entry point {}.{}", entry.declaring_type, entry.method);
                self.collaborators.output.define_entry_point(&entry, target.pe_kind());
                Ok(())
            }
            None => {
                self.report_missing_entry_point();
                Err(PipelineError::Halted(self.phase))
            }
        }
    }

    fn report_missing_entry_point(&mut self) {
        if let Some(main_class) = self.config.main_class.as_deref() {
            match self.tree.declaration(main_class) {
                None => self.diagnostics.report_error(
                    1555,
                    format!("Could not find `{}' specified for Main method", main_class),
                ),
                Some(decl) if !decl.kind.can_host_entry_point() => self.diagnostics.report_error(
                    1556,
                    format!("`{}' specified for Main method must be a valid class or struct", main_class),
                ),
                Some(decl) => self.diagnostics.report_error_at(
                    1558,
                    decl.location.clone(),
                    format!("`{}' does not have a suitable static Main method", main_class),
                ),
            }
        } else if !self.diagnostics.has_errors() {
            let output = self
                .output_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            self.diagnostics.report_error(
                5001,
                format!(
                    "Program `{}' does not contain a static `Main' method suitable for an entry point",
                    output
                ),
            );
        }
    }

    fn run_emit_resources(&mut self) -> Result<(), PipelineError> {
        self.enter(CompilePhase::EmitResources);

        if self.config.resources.is_empty() {
            return Ok(());
        }
        if self.config.target == Target::Module {
            self.diagnostics
                .report_error(1507, "Cannot link resource file when building a module");
            return Err(PipelineError::Halted(self.phase));
        }

        let emitted = self
            .config
            .resources
            .emit_all(self.collaborators.output.as_mut(), &mut self.diagnostics);
        debug!("{} resource(s) emitted", emitted);
        Ok(())
    }

    fn run_native_resources(&mut self) {
        self.enter(CompilePhase::NativeResources);
        let output = &mut self.collaborators.output;

        match &self.config.win32_resource {
            Some(path) if output.supports(Capability::NativeResources) => {
                if let Err(e) = output.define_native_resource(path) {
                    debug!("native resource {} failed: {}", path.display(), e);
                    self.diagnostics
                        .report_error(1566, format!("Error reading resource file `{}'", path.display()));
                }
            }
            Some(_) => self.diagnostics.runtime_missing_support("resource embeding"),
            None => output.define_version_info_resource(),
        }

        if let Some(icon) = &self.config.win32_icon {
            if !output.supports(Capability::IconResources) {
                self.diagnostics.runtime_missing_support("Adding icons");
            } else if let Err(e) = output.define_icon(icon) {
                debug!("icon {} failed: {}", icon.display(), e);
                self.diagnostics
                    .report_error(1566, format!("Error reading resource file `{}'", icon.display()));
            }
        }
    }

    fn run_save(&mut self) -> Result<(), PipelineError> {
        self.enter(CompilePhase::Save);
        self.check_diagnostics_and_return_if_error()?;

        let Some(output) = self.output_path.clone() else {
            return Err(PipelineError::Internal("no output file was set up".to_string()));
        };

        if let Err(e) = self.collaborators.output.save(&output, self.config.debug_info) {
            self.diagnostics.report_error(
                16,
                format!("Could not write to file `{}', cause: {}", output.display(), e),
            );
            return Err(PipelineError::Halted(self.phase));
        }
        info!("saved {}", output.display());

        self.timer.show_time("Saved output");
        self.timer.show_total_time("Total");
        Ok(())
    }
}

/// Why the pipeline stopped early
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A gate found errors; they are already in the diagnostics
    #[error("compilation stopped after {0:?}")]
    Halted(CompilePhase),
    /// A collaborator asked for an immediate stop, or an error under `--fatal`
    #[error("compilation aborted during {0:?}")]
    Fatal(CompilePhase),
    #[error("runtime is missing support for {0}")]
    MissingRuntimeSupport(String),
    #[error("internal compiler error: {0}")]
    Internal(String),
}
