use std::path::PathBuf;

use crate::diagnostic::{DiagnosticEngine, DiagnosticLevel};
use crate::driver::backend::ResolvedUnit;
use crate::driver::references::{is_valid_alias, ReferenceResolver, ReferenceSet, ResolveError, STDLIB_NAME};
use crate::test_utils::StubBackend;

fn resolver(link_paths: &[&str]) -> ReferenceResolver {
    let mut resolver = ReferenceResolver::new();
    resolver.set_link_paths(link_paths.iter().map(PathBuf::from).collect());
    resolver
}

fn names<'a>(units: impl Iterator<Item = &'a ResolvedUnit>) -> Vec<String> {
    units.map(|unit| unit.name.clone()).collect()
}

#[test]
fn test_alias_identifiers() {
    assert!(is_valid_alias("Foo"));
    assert!(is_valid_alias("_bar2"));
    assert!(is_valid_alias("été"));
    assert!(is_valid_alias("a\u{0301}b"));
    assert!(!is_valid_alias("1abc"));
    assert!(!is_valid_alias("a-b"));
    assert!(!is_valid_alias(""));
}

#[test]
fn test_resolve_through_link_path() {
    let stub = StubBackend::new();
    stub.add_unit("/lib/Foo.dll", &["Foo"]);
    let mut loader = stub.clone();
    let mut diagnostics = DiagnosticEngine::new();

    let mut resolver = resolver(&["/first", "/lib"]);
    let unit = resolver
        .resolve(&mut loader, "Foo", None, false, &mut diagnostics)
        .unwrap()
        .unwrap();

    assert_eq!(unit.path, PathBuf::from("/lib/Foo.dll"));
    assert_eq!(
        stub.state.borrow().probed,
        vec![
            PathBuf::from("/first/Foo"),
            PathBuf::from("/first/Foo.dll"),
            PathBuf::from("/lib/Foo"),
            PathBuf::from("/lib/Foo.dll"),
        ]
    );
    assert!(!diagnostics.has_errors());
}

#[test]
fn test_resolve_prefers_runtime_cache() {
    let stub = StubBackend::new();
    stub.add_named_unit("System.Data", &["System"]);
    let mut loader = stub.clone();
    let mut diagnostics = DiagnosticEngine::new();

    let mut resolver = resolver(&["/lib"]);
    let unit = resolver
        .resolve(&mut loader, "System.Data.dll", None, false, &mut diagnostics)
        .unwrap()
        .unwrap();

    assert_eq!(unit.name, "System.Data");
    assert!(stub.state.borrow().probed.is_empty());
}

#[test]
fn test_path_shaped_reference_is_loaded_directly() {
    let stub = StubBackend::new();
    stub.add_unit("/abs/Bar.dll", &["Bar"]);
    let mut loader = stub.clone();
    let mut diagnostics = DiagnosticEngine::new();

    let mut resolver = resolver(&["/lib"]);
    let unit = resolver
        .resolve(&mut loader, "/abs/Bar.dll", None, false, &mut diagnostics)
        .unwrap()
        .unwrap();

    assert_eq!(unit.name, "Bar");
    assert_eq!(stub.state.borrow().probed, vec![PathBuf::from("/abs/Bar.dll")]);
}

#[test]
fn test_missing_reference_reports_log() {
    let stub = StubBackend::new();
    let mut loader = stub.clone();
    let mut diagnostics = DiagnosticEngine::new();

    let mut resolver = resolver(&["/lib"]);
    let err = resolver
        .resolve(&mut loader, "Missing", None, false, &mut diagnostics)
        .unwrap_err();

    assert_eq!(err.code(), 6);
    let reported = diagnostics.diagnostics();
    assert_eq!(reported.len(), 2);
    assert_eq!(reported[0].code, 6);
    assert_eq!(reported[0].message, "cannot find metadata file `Missing'");
    assert_eq!(reported[1].level, DiagnosticLevel::Note);
    assert_eq!(
        reported[1].message,
        "Log:\nprobed /lib/Missing\nprobed /lib/Missing.dll\n(log related to previous command)"
    );
}

#[test]
fn test_missing_soft_reference_is_silent() {
    let stub = StubBackend::new();
    let mut loader = stub.clone();
    let mut diagnostics = DiagnosticEngine::new();

    let mut resolver = resolver(&["/lib"]);
    let resolved = resolver
        .resolve(&mut loader, "System.Xml", None, true, &mut diagnostics)
        .unwrap();

    assert!(resolved.is_none());
    assert!(diagnostics.diagnostics().is_empty());
}

#[test]
fn test_bad_image_soft_reference_still_reported() {
    let stub = StubBackend::new();
    stub.state.borrow_mut().bad_images.push(PathBuf::from("/lib/Broken.dll"));
    let mut loader = stub.clone();
    let mut diagnostics = DiagnosticEngine::new();

    let mut resolver = resolver(&["/lib"]);
    let err = resolver
        .resolve(&mut loader, "Broken", None, true, &mut diagnostics)
        .unwrap_err();

    assert_eq!(
        err,
        ResolveError::InvalidMetadata {
            file: "/lib/Broken.dll".to_string(),
            kind: "assembly",
            log: "bad image /lib/Broken.dll".to_string(),
        }
    );
    assert!(diagnostics.has_code(9));
}

#[test]
fn test_module_passed_as_reference() {
    let stub = StubBackend::new();
    {
        let mut state = stub.state.borrow_mut();
        state.bad_images.push(PathBuf::from("/lib/Part.netmodule"));
        state.module_containers.push(PathBuf::from("/lib/Part.netmodule"));
    }
    let mut loader = stub.clone();
    let mut diagnostics = DiagnosticEngine::new();

    let mut resolver = resolver(&["/lib"]);
    let err = resolver
        .resolve(&mut loader, "Part.netmodule", None, false, &mut diagnostics)
        .unwrap_err();

    assert_eq!(err.code(), 1509);
    assert_eq!(
        diagnostics.diagnostics()[0].message,
        "Referenced file `Part.netmodule' is not an assembly. Consider using `-addmodule' option instead"
    );
}

#[test]
fn test_resolve_all_order_and_priority() {
    let stub = StubBackend::new();
    stub.add_unit(format!("/lib/{}.dll", STDLIB_NAME), &["System", "Object"]);
    stub.add_unit("/lib/System.Xml.dll", &["System"]);
    stub.add_unit("/lib/Widgets.dll", &["Widgets", "Object"]);
    stub.add_unit("/lib/Old.dll", &["Legacy"]);
    let mut loader = stub.clone();
    let mut diagnostics = DiagnosticEngine::new();

    let mut references = ReferenceSet::default();
    references.add_soft_reference("System.Xml");
    references.add_soft_reference("System.Absent");
    references.add_reference("Widgets");
    references.add_extern_alias("OldApi", "Old", &mut diagnostics);

    let mut resolver = resolver(&["/lib"]);
    resolver.resolve_all(&mut loader, &references, true, &mut diagnostics);

    let root = resolver.root();
    assert_eq!(names(root.global_units()), vec![STDLIB_NAME, "System.Xml", "Widgets"]);
    assert_eq!(root.alias("OldApi").map(|u| u.name.as_str()), Some("Old"));
    assert!(root.lookup("Legacy").is_none());
    // later units shadow the core library
    assert_eq!(root.lookup("Object").map(|u| u.name.as_str()), Some("Widgets"));
    assert_eq!(root.lookup("System").map(|u| u.name.as_str()), Some("System.Xml"));
    assert!(!diagnostics.has_errors());
}

#[test]
fn test_resolve_all_without_stdlib() {
    let stub = StubBackend::new();
    stub.add_unit("/lib/Widgets.dll", &["Widgets"]);
    let mut loader = stub.clone();
    let mut diagnostics = DiagnosticEngine::new();

    let mut references = ReferenceSet::default();
    references.add_reference("Widgets");

    let mut resolver = resolver(&["/lib"]);
    resolver.resolve_all(&mut loader, &references, false, &mut diagnostics);

    assert_eq!(names(resolver.root().units().iter()), vec!["Widgets"]);
}

#[test]
fn test_repeated_reference_loads_once() {
    let stub = StubBackend::new();
    stub.add_unit("/lib/Widgets.dll", &["Widgets"]);
    let mut loader = stub.clone();
    let mut diagnostics = DiagnosticEngine::new();

    let mut references = ReferenceSet::default();
    references.add_reference("Widgets");
    references.add_reference("Widgets.dll");
    references.add_extern_alias("W", "Widgets", &mut diagnostics);

    let mut resolver = resolver(&["/lib"]);
    resolver.resolve_all(&mut loader, &references, false, &mut diagnostics);

    let root = resolver.root();
    assert_eq!(root.units().len(), 1);
    assert_eq!(names(root.global_units()), vec!["Widgets"]);
    assert_eq!(root.alias("W").map(|u| u.name.as_str()), Some("Widgets"));
}

#[test]
fn test_load_module_probes_netmodule_extension() {
    let stub = StubBackend::new();
    let module = ResolvedUnit {
        name: "Part".to_string(),
        path: PathBuf::from("/lib/Part.netmodule"),
        identifiers: vec!["Part".to_string()],
        is_module: true,
    };
    stub.state
        .borrow_mut()
        .modules
        .insert(PathBuf::from("/lib/Part.netmodule"), module.clone());
    let mut output = stub.clone();
    let mut diagnostics = DiagnosticEngine::new();

    let mut resolver = resolver(&["/lib"]);
    let loaded = resolver.load_module(&mut output, "Part", &mut diagnostics).cloned();

    assert_eq!(loaded, Some(module));
    assert_eq!(resolver.root().modules().len(), 1);
    assert!(!diagnostics.has_errors());
}

#[test]
fn test_load_module_errors() {
    let stub = StubBackend::new();
    stub.state.borrow_mut().bad_images.push(PathBuf::from("Bad.netmodule"));
    let mut output = stub.clone();

    let mut diagnostics = DiagnosticEngine::new();
    let mut resolver = resolver(&["/lib"]);
    assert!(resolver.load_module(&mut output, "Bad.netmodule", &mut diagnostics).is_none());
    assert_eq!(diagnostics.diagnostics()[0].message, "file `Bad.netmodule' has invalid `module' metadata");

    let mut diagnostics = DiagnosticEngine::new();
    assert!(resolver.load_module(&mut output, "Gone", &mut diagnostics).is_none());
    assert!(diagnostics.has_code(6));
}
