//! `-pkg:` expansion through the package metadata tool

use log::debug;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::diagnostic::DiagnosticEngine;

use super::options::ArgumentError;

/// Run `<program> [leading...] --libs <packages>` and return its output as arguments
pub fn expand(
    program: &Path,
    leading: &[String],
    packages: &str,
    diagnostics: &mut DiagnosticEngine,
) -> Result<Vec<String>, ArgumentError> {
    let packages: Vec<&str> = packages.split([',', ';']).filter(|p| !p.is_empty()).collect();
    debug!("running {} --libs {}", program.display(), packages.join(" "));

    let output = Command::new(program)
        .args(leading)
        .arg("--libs")
        .args(&packages)
        .stdin(Stdio::null())
        .stderr(Stdio::inherit())
        .output()
        .map_err(|e| ArgumentError::PackageTool(format!("Couldn't run pkg-config: {}", e)))?;

    if !output.status.success() {
        return Err(ArgumentError::PackageTool(
            "Error running pkg-config. Check the above output.".to_string(),
        ));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let args: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    if args.is_empty() {
        diagnostics.report_warning(-27, 1, "Specified package did not return any information");
    }
    Ok(args)
}
