use std::path::PathBuf;
use tempfile::tempdir;

use crate::diagnostic::DiagnosticEngine;
use crate::driver::backend::Capability;
use crate::driver::resources::{parse_resource_spec, ResourceMode, ResourceTable, Visibility};
use crate::test_utils::{parse_config, write_file, StubBackend};

#[test]
fn test_resource_spec_forms() {
    let mut diagnostics = DiagnosticEngine::new();

    assert_eq!(
        parse_resource_spec("/res", "dir/logo.png", &mut diagnostics),
        Some(("dir/logo.png".to_string(), "logo.png".to_string(), false))
    );
    assert_eq!(
        parse_resource_spec("/res", "logo.png,App.Logo", &mut diagnostics),
        Some(("logo.png".to_string(), "App.Logo".to_string(), false))
    );
    assert_eq!(
        parse_resource_spec("/res", "logo.png,App.Logo,Private", &mut diagnostics),
        Some(("logo.png".to_string(), "App.Logo".to_string(), true))
    );
    assert!(diagnostics.diagnostics().is_empty());
}

#[test]
fn test_resource_spec_errors() {
    let mut diagnostics = DiagnosticEngine::new();
    assert_eq!(parse_resource_spec("/res", "a,b,secret", &mut diagnostics), None);
    assert!(diagnostics.has_code(1906));

    let mut diagnostics = DiagnosticEngine::new();
    assert_eq!(parse_resource_spec("-linkres", "a,b,c,d", &mut diagnostics), None);
    assert_eq!(diagnostics.diagnostics()[0].code, -2005);
    assert_eq!(diagnostics.diagnostics()[0].message, "Wrong number of arguments for option `-linkres'");
}

#[test]
fn test_resource_options() {
    let (config, diagnostics) = parse_config(&[
        "-resource:data.bin,App.Data,private",
        "-linkres:docs/manual.pdf",
        "--res",
        "legacy.txt",
        "a.cs",
    ]);
    assert_eq!(config.resources.len(), 3);

    let data = config.resources.get("App.Data").unwrap();
    assert_eq!(data.mode, ResourceMode::Embedded);
    assert_eq!(data.visibility, Visibility::Private);
    assert_eq!(data.file, PathBuf::from("data.bin"));

    let manual = config.resources.get("manual.pdf").unwrap();
    assert_eq!(manual.mode, ResourceMode::Linked);
    assert_eq!(manual.visibility, Visibility::Public);

    assert_eq!(config.resources.get("legacy.txt").unwrap().mode, ResourceMode::Embedded);
    assert!(diagnostics.has_code(-29));
}

#[test]
fn test_duplicate_resource_name() {
    let (config, diagnostics) = parse_config(&["-res:a.txt,Same", "-linkres:b.txt,Same", "a.cs"]);
    assert_eq!(config.resources.len(), 1);
    assert_eq!(config.resources.get("Same").unwrap().file, PathBuf::from("a.txt"));
    assert!(diagnostics.has_code(1508));
}

#[test]
fn test_emit_all_runs_once() {
    let dir = tempdir().unwrap();
    let data = write_file(dir.path(), "data.bin", "12345");
    let linked = write_file(dir.path(), "sub/manual.pdf", "%PDF");

    let mut diagnostics = DiagnosticEngine::new();
    let mut table = ResourceTable::default();
    table.add(true, &data.display().to_string(), "Data", true, &mut diagnostics);
    table.add(false, &linked.display().to_string(), "Manual", false, &mut diagnostics);

    let stub = StubBackend::new();
    let mut output = stub.clone();
    assert_eq!(table.emit_all(&mut output, &mut diagnostics), 2);
    assert_eq!(table.emit_all(&mut output, &mut diagnostics), 0);

    let state = stub.state.borrow();
    assert_eq!(state.embedded, vec![("Data".to_string(), 5, Visibility::Private)]);
    assert_eq!(
        state.linked,
        vec![("Manual".to_string(), "manual.pdf".to_string(), Visibility::Public)]
    );
    assert!(!diagnostics.has_errors());
}

#[test]
fn test_emit_all_reports_missing_file() {
    let dir = tempdir().unwrap();
    let present = write_file(dir.path(), "present.txt", "x");
    let missing = dir.path().join("missing.txt");

    let mut diagnostics = DiagnosticEngine::new();
    let mut table = ResourceTable::default();
    table.add(true, &missing.display().to_string(), "Missing", false, &mut diagnostics);
    table.add(true, &present.display().to_string(), "Present", false, &mut diagnostics);

    let stub = StubBackend::new();
    let mut output = stub.clone();
    assert_eq!(table.emit_all(&mut output, &mut diagnostics), 1);

    assert_eq!(diagnostics.error_count(), 1);
    assert_eq!(
        diagnostics.diagnostics()[0].message,
        format!("Error reading resource file `{}'", missing.display())
    );
    assert_eq!(stub.state.borrow().embedded.len(), 1);
}

#[test]
fn test_emit_all_without_embedding_support() {
    let dir = tempdir().unwrap();
    let data = write_file(dir.path(), "data.bin", "x");

    let mut diagnostics = DiagnosticEngine::new();
    let mut table = ResourceTable::default();
    table.add(true, &data.display().to_string(), "Data", false, &mut diagnostics);

    let stub = StubBackend::new();
    stub.state
        .borrow_mut()
        .missing_capabilities
        .insert(Capability::ResourceEmbedding);
    let mut output = stub.clone();
    assert_eq!(table.emit_all(&mut output, &mut diagnostics), 0);

    assert!(!diagnostics.has_errors());
    assert!(diagnostics.diagnostics()[0].message.contains("resource embedding"));
}
