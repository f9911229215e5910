//! JSON manifest output and XML documentation
//!
//! The manifest records everything the driver asked the output container to
//! do, in place of a binary image.

use log::debug;
use serde::Serialize;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::diagnostic::DiagnosticEngine;
use crate::driver::artifact::{EntryPoint, ProgramTree};
use crate::driver::backend::{Capability, DocExporter, LoadError, OutputBackend, ResolvedUnit};
use crate::driver::cli::PeKind;
use crate::driver::resources::Visibility;

use super::loader::{describe, extension_of};

#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct Manifest {
    pub output: PathBuf,
    pub debug_info: bool,
    pub module_only: bool,
    pub modules: Vec<String>,
    pub resources: Vec<ManifestResource>,
    pub native_resource: Option<PathBuf>,
    pub version_info: bool,
    pub icon: Option<PathBuf>,
    pub entry_point: Option<ManifestEntryPoint>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ManifestResource {
    pub name: String,
    /// Size of embedded data; absent for linked resources
    pub size: Option<usize>,
    pub file: Option<String>,
    pub private: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ManifestEntryPoint {
    pub declaring_type: String,
    pub method: String,
    pub subsystem: &'static str,
}

/// Output backend writing a [`Manifest`] as pretty JSON
#[derive(Debug, Default)]
pub struct ManifestWriter {
    manifest: Manifest,
}

impl ManifestWriter {
    pub fn new() -> Self {
        ManifestWriter::default()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }
}

impl OutputBackend for ManifestWriter {
    fn init(&mut self, path: &Path, debug_info: bool) -> io::Result<()> {
        let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(dir) = parent {
            if !dir.is_dir() {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("directory `{}' does not exist", dir.display()),
                ));
            }
        }
        self.manifest = Manifest {
            output: path.to_path_buf(),
            debug_info,
            ..Manifest::default()
        };
        Ok(())
    }

    fn supports(&self, _capability: Capability) -> bool {
        true
    }

    fn mark_module_only(&mut self) {
        self.manifest.module_only = true;
    }

    fn add_module(&mut self, path: &Path) -> Result<ResolvedUnit, LoadError> {
        if !path.is_file() {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
                log: format!("  probed {}\n", path.display()),
            });
        }
        if extension_of(path) != "netmodule" {
            return Err(LoadError::BadImage {
                path: path.to_path_buf(),
                log: String::new(),
            });
        }
        let unit = describe(path, true);
        self.manifest.modules.push(unit.name.clone());
        Ok(unit)
    }

    fn resolve_attributes(&mut self, _tree: &ProgramTree, _diagnostics: &mut DiagnosticEngine) {}

    fn is_cls_compliant(&self) -> bool {
        false
    }

    fn embed_resource(&mut self, name: &str, data: Vec<u8>, visibility: Visibility) {
        self.manifest.resources.push(ManifestResource {
            name: name.to_string(),
            size: Some(data.len()),
            file: None,
            private: visibility == Visibility::Private,
        });
    }

    fn link_resource(&mut self, name: &str, file_name: &str, visibility: Visibility) {
        self.manifest.resources.push(ManifestResource {
            name: name.to_string(),
            size: None,
            file: Some(file_name.to_string()),
            private: visibility == Visibility::Private,
        });
    }

    fn define_native_resource(&mut self, path: &Path) -> io::Result<()> {
        fs::metadata(path)?;
        self.manifest.native_resource = Some(path.to_path_buf());
        Ok(())
    }

    fn define_version_info_resource(&mut self) {
        self.manifest.version_info = true;
    }

    fn define_icon(&mut self, path: &Path) -> io::Result<()> {
        fs::metadata(path)?;
        self.manifest.icon = Some(path.to_path_buf());
        Ok(())
    }

    fn define_entry_point(&mut self, entry: &EntryPoint, kind: PeKind) {
        let subsystem = match kind {
            PeKind::Console => "console",
            PeKind::Windows => "windows",
            PeKind::Dll => "dll",
        };
        self.manifest.entry_point = Some(ManifestEntryPoint {
            declaring_type: entry.declaring_type.clone(),
            method: entry.method.clone(),
            subsystem,
        });
    }

    fn save(&mut self, path: &Path, debug_info: bool) -> io::Result<()> {
        self.manifest.debug_info = debug_info;
        let json = serde_json::to_string_pretty(&self.manifest).map_err(io::Error::other)?;
        fs::write(path, json)?;
        debug!("manifest written to {}", path.display());
        Ok(())
    }
}

/// Writes one `<member>` per declared type
#[derive(Debug, Default)]
pub struct XmlDocExporter;

impl DocExporter for XmlDocExporter {
    fn export(&mut self, path: &Path, tree: &ProgramTree, diagnostics: &mut DiagnosticEngine) -> bool {
        match write_docs(path, tree) {
            Ok(()) => true,
            Err(e) => {
                diagnostics.report_error(
                    16,
                    format!("Could not write to file `{}', cause: {}", path.display(), e),
                );
                false
            }
        }
    }
}

fn write_docs(path: &Path, tree: &ProgramTree) -> io::Result<()> {
    let mut file = io::BufWriter::new(fs::File::create(path)?);
    writeln!(file, "<?xml version=\"1.0\"?>")?;
    writeln!(file, "<doc>")?;
    writeln!(file, "  <members>")?;
    for decl in tree.declarations.values() {
        writeln!(file, "    <member name=\"T:{}\" />", escape_xml(&decl.name))?;
    }
    writeln!(file, "  </members>")?;
    writeln!(file, "</doc>")?;
    file.flush()
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;").replace('"', "&quot;")
}
