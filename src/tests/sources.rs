use std::path::{Path, PathBuf};
use tempfile::tempdir;

use crate::diagnostic::DiagnosticEngine;
use crate::driver::sources::SourceFileSet;
use crate::test_utils::{parse_config, write_file};

fn collected(set: &SourceFileSet) -> Vec<PathBuf> {
    set.iter().map(Path::to_path_buf).collect()
}

#[test]
fn test_duplicate_source_warns() {
    let mut diagnostics = DiagnosticEngine::new();
    let mut set = SourceFileSet::default();

    assert!(set.add(PathBuf::from("a.cs"), &mut diagnostics));
    assert!(!set.add(PathBuf::from("a.cs"), &mut diagnostics));

    assert_eq!(set.len(), 1);
    assert_eq!(diagnostics.warning_count(), 1);
    assert_eq!(diagnostics.diagnostics()[0].code, 2002);
    assert_eq!(diagnostics.diagnostics()[0].message, "Source file `a.cs' specified multiple times");
}

#[test]
fn test_wildcard_expands_sorted() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "b.cs", "");
    write_file(dir.path(), "a.cs", "");
    write_file(dir.path(), "notes.txt", "");
    write_file(dir.path(), "sub/c.cs", "");

    let mut diagnostics = DiagnosticEngine::new();
    let mut set = SourceFileSet::default();
    set.process(&format!("{}/*.cs", dir.path().display()), false, &mut diagnostics);

    assert_eq!(collected(&set), vec![dir.path().join("a.cs"), dir.path().join("b.cs")]);
    assert!(!diagnostics.has_errors());
}

#[test]
fn test_recurse_descends_into_subdirectories() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.cs", "");
    write_file(dir.path(), "sub/c.cs", "");
    write_file(dir.path(), "sub/deeper/d.cs", "");
    write_file(dir.path(), "sub/readme.md", "");

    let spec = format!("{}/*.cs", dir.path().display());
    let (config, diagnostics) = parse_config(&[&format!("-recurse:{}", spec)]);

    assert_eq!(
        collected(&config.sources),
        vec![
            dir.path().join("a.cs"),
            dir.path().join("sub/c.cs"),
            dir.path().join("sub/deeper/d.cs"),
        ]
    );
    assert!(!diagnostics.has_errors());
}

#[test]
fn test_wildcard_in_missing_directory() {
    let dir = tempdir().unwrap();
    let spec = format!("{}/*.cs", dir.path().join("nowhere").display());

    let mut diagnostics = DiagnosticEngine::new();
    let mut set = SourceFileSet::default();
    set.process(&spec, false, &mut diagnostics);

    assert!(set.is_empty());
    assert_eq!(diagnostics.diagnostics()[0].code, 2001);
    assert_eq!(
        diagnostics.diagnostics()[0].message,
        format!("Source file `{}' could not be found", spec)
    );
}

#[test]
fn test_wildcard_matching_nothing_adds_nothing() {
    let dir = tempdir().unwrap();
    write_file(dir.path(), "a.txt", "");

    let mut diagnostics = DiagnosticEngine::new();
    let mut set = SourceFileSet::default();
    set.process(&format!("{}/*.cs", dir.path().display()), false, &mut diagnostics);

    assert!(set.is_empty());
    assert!(diagnostics.diagnostics().is_empty());
}

#[test]
fn test_literal_sources_are_not_checked() {
    let mut diagnostics = DiagnosticEngine::new();
    let mut set = SourceFileSet::default();
    set.process("does/not/exist.cs", false, &mut diagnostics);

    assert_eq!(set.first(), Some(Path::new("does/not/exist.cs")));
    assert!(diagnostics.diagnostics().is_empty());
}

#[test]
fn test_default_output_path_follows_first_source() {
    let (config, _) = parse_config(&["src/main.cs", "other.cs"]);
    assert_eq!(config.default_output_path(), Some(PathBuf::from("src/main.exe")));

    let (config, _) = parse_config(&["-target:library", "lib.cs"]);
    assert_eq!(config.default_output_path(), Some(PathBuf::from("lib.dll")));

    let (config, _) = parse_config(&["-t:module", "m.cs"]);
    assert_eq!(config.default_output_path(), Some(PathBuf::from("m.netmodule")));
}
