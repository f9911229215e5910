//! Managed resources (`-resource`, `-linkresource`)

use indexmap::IndexMap;
use log::{debug, warn};
use std::fs;
use std::path::{Path, PathBuf};

use crate::diagnostic::DiagnosticEngine;

use super::backend::{Capability, OutputBackend};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceMode {
    /// Bytes are copied into the output
    Embedded,
    /// Only the file name is recorded
    Linked,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEntry {
    pub name: String,
    pub file: PathBuf,
    pub mode: ResourceMode,
    pub visibility: Visibility,
}

/// Resources keyed by their logical name
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    entries: IndexMap<String, ResourceEntry>,
    emitted: bool,
}

impl ResourceTable {
    /// Register a resource. A duplicate name is reported and the first entry
    /// is kept.
    pub fn add(&mut self, embedded: bool, file: &str, name: &str, private: bool, diagnostics: &mut DiagnosticEngine) -> bool {
        if self.entries.contains_key(name) {
            diagnostics.report_error(1508, format!("The resource identifier `{}' has already been used in this assembly", name));
            return false;
        }

        let entry = ResourceEntry {
            name: name.to_string(),
            file: PathBuf::from(file),
            mode: if embedded { ResourceMode::Embedded } else { ResourceMode::Linked },
            visibility: if private { Visibility::Private } else { Visibility::Public },
        };
        self.entries.insert(name.to_string(), entry);
        true
    }

    pub fn get(&self, name: &str) -> Option<&ResourceEntry> {
        self.entries.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Hand every resource to `output`. Runs once; later calls do nothing.
    /// Returns the number of resources emitted.
    pub fn emit_all(&mut self, output: &mut dyn OutputBackend, diagnostics: &mut DiagnosticEngine) -> usize {
        if self.emitted {
            debug!("resources already emitted");
            return 0;
        }
        self.emitted = true;

        let mut count = 0;
        for entry in self.entries.values() {
            if !entry.file.exists() {
                report_unreadable(&entry.file, diagnostics);
                continue;
            }

            match entry.mode {
                ResourceMode::Embedded => {
                    if !output.supports(Capability::ResourceEmbedding) {
                        diagnostics.runtime_missing_support("resource embedding");
                        continue;
                    }
                    match fs::read(&entry.file) {
                        Ok(data) => output.embed_resource(&entry.name, data, entry.visibility),
                        Err(e) => {
                            warn!("reading {} failed: {}", entry.file.display(), e);
                            report_unreadable(&entry.file, diagnostics);
                            continue;
                        }
                    }
                }
                ResourceMode::Linked => {
                    let file_name = entry
                        .file
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| entry.file.display().to_string());
                    output.link_resource(&entry.name, &file_name, entry.visibility);
                }
            }
            count += 1;
        }
        count
    }
}

fn report_unreadable(file: &Path, diagnostics: &mut DiagnosticEngine) {
    diagnostics.report_error(1566, format!("Error reading resource file `{}'", file.display()));
}

/// Parse `FILE[,NAME[,public|private]]`.
///
/// Returns `None` after reporting a malformed specification.
pub fn parse_resource_spec(
    option: &str,
    value: &str,
    diagnostics: &mut DiagnosticEngine,
) -> Option<(String, String, bool)> {
    let parts: Vec<&str> = value.split(',').collect();
    match parts.as_slice() {
        [file] => Some((file.to_string(), file_name_of(file), false)),
        [file, name] => Some((file.to_string(), name.to_string(), false)),
        [file, name, visibility] => match visibility.to_lowercase().as_str() {
            "public" => Some((file.to_string(), name.to_string(), false)),
            "private" => Some((file.to_string(), name.to_string(), true)),
            _ => {
                diagnostics.report_error(
                    1906,
                    format!("Invalid resource visibility option `{}'. Use either `public' or `private' instead", visibility),
                );
                None
            }
        },
        _ => {
            diagnostics.report_error(-2005, format!("Wrong number of arguments for option `{}'", option));
            None
        }
    }
}

/// Resource name defaults to the file name without directories
fn file_name_of(file: &str) -> String {
    Path::new(file)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}
