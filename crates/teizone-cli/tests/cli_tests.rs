//! Integration tests for all CLI commands
//!
//! Tests each command with real invocations.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper to create a CLI command isolated from user and project config
fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_teizone"));
    cmd.current_dir(dir).env("HOME", dir).env_remove("RUST_LOG");
    cmd
}

const ITEMS: &str = r##"[
  {
    "id": "p2", "groupId": "ms1",
    "parts": [{
      "type": "image-annotations",
      "image": {"id": "1v", "uri": "http://img.org/ms1/1v.jpg"},
      "annotations": [
        {"id": "#a3", "eid": "n-aaron", "label": "Aaron", "selector": "xywh=pixel:10,10,20,20"}
      ]
    }]
  },
  {
    "id": "p1", "groupId": "ms1",
    "parts": [{
      "type": "image-annotations",
      "image": {"id": "1r", "uri": "http://img.org/ms1/1r.jpg"},
      "annotations": [
        {"id": "#a1", "eid": "n-adam", "label": "Adam", "selector": "xywh=pixel:100,50,130,70"},
        {"id": "#a2", "eid": "c-circle", "selector": "<svg><circle cx=\"400\" cy=\"200\" r=\"50\"/></svg>"}
      ]
    }]
  },
  {
    "id": "q1", "groupId": "ms2",
    "parts": [{
      "type": "image-annotations",
      "image": {"id": "1r", "uri": "http://img.org/ms2/1r.jpg"},
      "annotations": [
        {"id": "#b1", "eid": "p-tree", "selector": "xywh=pixel:0,0,5,5"}
      ]
    }]
  }
]"##;

fn write_items(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("items.json");
    fs::write(&path, ITEMS).unwrap();
    path
}

// ============ BUILD COMMAND TESTS ============

#[test]
fn test_build_help() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .arg("build")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Compose items into one TEI document"));
}

#[test]
fn test_build_writes_one_document_per_group() {
    let dir = TempDir::new().unwrap();
    let items = write_items(dir.path());
    let out = dir.path().join("out");

    cli(dir.path())
        .arg("build")
        .arg(&items)
        .arg("-o")
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("ms1.xml"))
        .stderr(predicate::str::contains("Composition Summary"));

    let ms1 = fs::read_to_string(out.join("ms1.xml")).unwrap();
    assert!(ms1.contains("<label>Adam</label>"));
    assert!(ms1.contains(r#"ulx="350""#));
    // pages keep item order regardless of input order
    let p1 = ms1.find(r#"xml:id="p1""#).unwrap();
    let p2 = ms1.find(r#"xml:id="p2""#).unwrap();
    assert!(p1 < p2);
    assert!(out.join("ms2.xml").exists());
}

#[test]
fn test_build_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let items = write_items(dir.path());
    let out = dir.path().join("out");

    cli(dir.path()).args(["-q", "build"]).arg(&items).arg("-o").arg(&out).assert().success();
    let first = fs::read_to_string(out.join("ms1.xml")).unwrap();
    cli(dir.path()).args(["-q", "build"]).arg(&items).arg("-o").arg(&out).assert().success();
    assert_eq!(fs::read_to_string(out.join("ms1.xml")).unwrap(), first);
}

#[test]
fn test_build_group_filter() {
    let dir = TempDir::new().unwrap();
    let items = write_items(dir.path());
    let out = dir.path().join("out");

    cli(dir.path())
        .arg("build")
        .arg(&items)
        .args(["-g", "ms2", "-o"])
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("ms2.xml").exists());
    assert!(!out.join("ms1.xml").exists());
}

#[test]
fn test_build_uses_config_output_dir() {
    let dir = TempDir::new().unwrap();
    let items = write_items(dir.path());
    fs::write(
        dir.path().join(".teizone.toml"),
        "[build]\noutput_dir = \"from-config\"\n\n[header]\ntitle = \"Configured title\"\n",
    )
    .unwrap();

    cli(dir.path()).arg("build").arg(&items).assert().success();

    let ms1 = fs::read_to_string(dir.path().join("from-config").join("ms1.xml")).unwrap();
    assert!(ms1.contains("Configured title"));
}

#[test]
fn test_build_invalid_selector_fails() {
    let dir = TempDir::new().unwrap();
    let items = dir.path().join("bad.json");
    fs::write(
        &items,
        r##"[{"id": "p1", "groupId": "ms1", "parts": [{"type": "image-annotations",
            "image": {"id": "1r", "uri": "u"},
            "annotations": [{"id": "#a1", "eid": "n-x", "selector": "xywh=percent:1,2,3,4"}]}]}]"##,
    )
    .unwrap();
    let out = dir.path().join("out");

    cli(dir.path())
        .arg("build")
        .arg(&items)
        .arg("-o")
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to compose item p1"));
    assert!(!out.join("ms1.xml").exists());

    cli(dir.path())
        .arg("build")
        .arg(&items)
        .arg("-o")
        .arg(&out)
        .arg("--continue-on-error")
        .assert()
        .success();
}

#[test]
fn test_build_missing_items_file() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .args(["build", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read items file"));
}

// ============ IMPORT COMMAND TESTS ============

#[test]
fn test_import_appends_items() {
    let dir = TempDir::new().unwrap();
    let items = write_items(dir.path());
    let out = dir.path().join("out");
    cli(dir.path()).args(["-q", "build"]).arg(&items).arg("-o").arg(&out).assert().success();

    let imported = dir.path().join("imported.json");
    fs::write(&imported, r#"[{"id": "keep", "title": "ms1 001 ms1/1r", "custom": true}]"#)
        .unwrap();
    let mask = format!("{}/*.xml", out.display());

    cli(dir.path())
        .arg("import")
        .arg(&mask)
        .arg(&imported)
        .args(["-p", r"^https?://[^/]+/(.*)$"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 item(s) from 2 file(s)"));

    let entries: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&imported).unwrap()).unwrap();
    assert_eq!(entries.len(), 3);
    // existing entries are kept verbatim
    assert_eq!(entries[0]["custom"], serde_json::Value::Bool(true));
    assert_eq!(entries[1]["title"], "ms1 002 ms1/1v");
    assert_eq!(entries[1]["id"], "p2");
    assert_eq!(entries[1]["description"], "ms1/1v: ms1/1v.jpg");
    assert_eq!(entries[2]["groupId"], "ms2");
    assert_eq!(entries[2]["flags"], 1);
}

#[test]
fn test_import_creates_missing_items_file() {
    let dir = TempDir::new().unwrap();
    let items = write_items(dir.path());
    let out = dir.path().join("out");
    cli(dir.path()).args(["-q", "build"]).arg(&items).arg("-o").arg(&out).assert().success();

    let imported = dir.path().join("new.json");
    cli(dir.path())
        .arg("import")
        .arg(format!("{}/ms2.xml", out.display()))
        .arg(&imported)
        .assert()
        .success();

    let entries: Vec<serde_json::Value> =
        serde_json::from_str(&fs::read_to_string(&imported).unwrap()).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["id"], "q1");
}

#[test]
fn test_import_invalid_pattern() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .args(["import", "*.xml", "items.json", "-p", "("])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid URI shortener"));
}

// ============ NORMALIZE COMMAND TESTS ============

#[test]
fn test_normalize_rewrites_unsorted_file() {
    let dir = TempDir::new().unwrap();
    let tei = dir.path().join("ms1.xml");
    fs::write(
        &tei,
        r#"<TEI xmlns="http://www.tei-c.org/ns/1.0"><facsimile>
<surface n="ms1/2"/>
<surface n="ms1/1"/>
</facsimile></TEI>"#,
    )
    .unwrap();

    cli(dir.path())
        .arg("normalize")
        .arg(&tei)
        .assert()
        .success()
        .stdout(predicate::str::contains("1 re-sorted"));

    let out = fs::read_to_string(&tei).unwrap();
    assert!(out.find(r#"n="ms1/1""#).unwrap() < out.find(r#"n="ms1/2""#).unwrap());

    cli(dir.path())
        .arg("normalize")
        .arg(&tei)
        .assert()
        .success()
        .stdout(predicate::str::contains("already sorted"));
}

#[test]
fn test_normalize_requires_files() {
    let dir = TempDir::new().unwrap();
    cli(dir.path()).arg("normalize").assert().failure();
}

// ============ CONFIG COMMAND TESTS ============

#[test]
fn test_config_show_defaults() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[header]"))
        .stdout(predicate::str::contains("Petrus von Poitiers"));
}

#[test]
fn test_config_show_explicit_file_json() {
    let dir = TempDir::new().unwrap();
    let explicit = dir.path().join("custom.toml");
    fs::write(&explicit, "[import]\nuri_shortener = \"^(.*)$\"\n").unwrap();

    cli(dir.path())
        .args(["config", "show", "--json", "--config"])
        .arg(&explicit)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"uri_shortener\": \"^(.*)$\""));
}

#[test]
fn test_config_path_lists_candidates() {
    let dir = TempDir::new().unwrap();
    cli(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(".teizone.toml"))
        .stdout(predicate::str::contains("not found"));
}

#[test]
fn test_quiet_conflicts_with_verbose() {
    let dir = TempDir::new().unwrap();
    cli(dir.path()).args(["-q", "-v", "config", "path"]).assert().failure();
}
