use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::{tempdir, TempDir};

fn sharpc(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sharpc").unwrap();
    cmd.current_dir(dir).env_remove("RUST_LOG").env_remove("SHARPC_LIB_DIR");
    cmd
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    for (name, contents) in files {
        fs::write(dir.path().join(name), contents).unwrap();
    }
    dir
}

fn manifest(path: &Path) -> serde_json::Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

const HELLO: &str = "class Hello\n{\n    static void Main ()\n    {\n    }\n}\n";

#[test]
fn test_version() {
    let dir = tempdir().unwrap();
    sharpc(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("sharpc compiler version"));
}

#[test]
fn test_help_lists_targets() {
    let dir = tempdir().unwrap();
    sharpc(dir.path())
        .arg("-help")
        .assert()
        .success()
        .stdout(predicate::str::contains("-target:KIND"))
        .stdout(predicate::str::contains("`library', `exe', `winexe' or `module'"));
}

#[test]
fn test_compile_executable() {
    let dir = project(&[("hello.cs", HELLO)]);
    sharpc(dir.path())
        .args(["-nostdlib", "-noconfig", "hello.cs"])
        .assert()
        .success();

    let json = manifest(&dir.path().join("hello.exe"));
    assert_eq!(json["entry_point"]["declaring_type"], "Hello");
    assert_eq!(json["entry_point"]["subsystem"], "console");
    assert_eq!(json["version_info"], true);
}

#[test]
fn test_compile_library_with_resource() {
    let dir = project(&[("lib.cs", "class Util { }\n"), ("data.txt", "payload")]);
    sharpc(dir.path())
        .args([
            "-nostdlib",
            "-noconfig",
            "-target:library",
            "-out:util.dll",
            "-resource:data.txt,Util.Data",
            "lib.cs",
        ])
        .assert()
        .success();

    let json = manifest(&dir.path().join("util.dll"));
    assert!(json["entry_point"].is_null());
    assert_eq!(json["resources"][0]["name"], "Util.Data");
    assert_eq!(json["resources"][0]["size"], 7);
}

#[test]
fn test_unknown_option() {
    let dir = tempdir().unwrap();
    sharpc(dir.path())
        .args(["-frobnicate", "a.cs"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "error CS2007: Unrecognized command-line option: `-frobnicate'",
        ));
}

#[test]
fn test_no_sources() {
    let dir = tempdir().unwrap();
    sharpc(dir.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error CS2008"));
}

#[test]
fn test_missing_main() {
    let dir = project(&[("lib.cs", "class Util { }\n")]);
    sharpc(dir.path())
        .args(["-nostdlib", "-noconfig", "lib.cs"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error CS5001"))
        .stdout(predicate::str::contains("Compilation failed: 1 error(s), 0 warnings"));
    assert!(!dir.path().join("lib.exe").exists());
}

#[test]
fn test_expected_error() {
    let dir = project(&[("lib.cs", "class Util { }\n"), ("hello.cs", HELLO)]);
    sharpc(dir.path())
        .args(["-nostdlib", "-noconfig", "--expect-error", "5001", "lib.cs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reported expected error 5001"));

    sharpc(dir.path())
        .args(["-nostdlib", "-noconfig", "--expect-error", "5001", "hello.cs"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Failed to report expected error 5001."));
}

#[test]
fn test_response_file() {
    let dir = project(&[("hello.cs", HELLO), ("build.rsp", "-nostdlib -noconfig\n-out:\"from rsp.exe\"\nhello.cs\n")]);
    sharpc(dir.path()).arg("@build.rsp").assert().success();
    assert!(dir.path().join("from rsp.exe").exists());
}

#[test]
fn test_default_references_from_lib_dir() {
    let dir = project(&[("hello.cs", HELLO)]);
    let lib = project(&[("mscorlib.dll", ""), ("System.dll", "")]);
    sharpc(dir.path())
        .env("SHARPC_LIB_DIR", lib.path())
        .arg("hello.cs")
        .assert()
        .success();
}

#[test]
fn test_missing_core_library() {
    let dir = project(&[("hello.cs", HELLO)]);
    let lib = tempdir().unwrap();
    sharpc(dir.path())
        .env("SHARPC_LIB_DIR", lib.path())
        .arg("hello.cs")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error CS0006: cannot find metadata file `mscorlib'"));
}

#[test]
fn test_documentation_output() {
    let dir = project(&[("hello.cs", HELLO)]);
    sharpc(dir.path())
        .args(["-nostdlib", "-noconfig", "-doc:hello.xml", "hello.cs"])
        .assert()
        .success();
    let doc = fs::read_to_string(dir.path().join("hello.xml")).unwrap();
    assert!(doc.contains("T:Hello"));
}

#[test]
fn test_duplicate_source_warning() {
    let dir = project(&[("hello.cs", HELLO)]);
    sharpc(dir.path())
        .args(["-nostdlib", "-noconfig", "hello.cs", "hello.cs"])
        .assert()
        .success()
        .stderr(predicate::str::contains("warning CS2002"))
        .stdout(predicate::str::contains("Compilation succeeded - 1 warning(s)"));

    sharpc(dir.path())
        .args(["-nostdlib", "-noconfig", "-warnaserror", "hello.cs", "hello.cs"])
        .assert()
        .code(1);
}
