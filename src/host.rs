//! Collaborators used by the `sharpc` binary
//!
//! A scanner frontend, a filesystem loader and a JSON manifest in place of a
//! binary container. Enough to run the driver end to end.

pub mod frontend;
pub mod loader;
pub mod manifest;

use crate::diagnostic::DiagnosticEngine;
use crate::driver::artifact::ProgramTree;
use crate::driver::backend::{Collaborators, ComplianceChecker, ResolvedUnit};

pub use frontend::{EntryPointSelector, HostTypeSystem, ScanFrontend};
pub use loader::FileUnitLoader;
pub use manifest::{Manifest, ManifestWriter, XmlDocExporter};

/// Compliance checking needs attribute data the scanner does not collect
#[derive(Debug, Default)]
pub struct NoComplianceChecks;

impl ComplianceChecker for NoComplianceChecks {
    fn verify(&mut self, _modules: &[ResolvedUnit], _tree: &ProgramTree, _diagnostics: &mut DiagnosticEngine) {}
}

/// Collaborators for one command-line run
pub fn collaborators() -> Collaborators {
    Collaborators {
        frontend: Box::new(ScanFrontend::new()),
        types: Box::new(HostTypeSystem),
        codegen: Box::new(EntryPointSelector),
        output: Box::new(ManifestWriter::new()),
        loader: Box::new(FileUnitLoader::from_env()),
        compliance: Box::new(NoComplianceChecks),
        docs: Box::new(XmlDocExporter),
    }
}
