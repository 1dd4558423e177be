//! End-to-end tests for the generation pipeline against the fixture
//! repository (one complete board, one board with no pin file).

use boardstubs::prelude::*;
use std::path::PathBuf;

fn fixture_repo() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("repo")
}

fn offline_options(out_dir: &std::path::Path) -> GenerateOptions {
    let mut options = GenerateOptions::new(fixture_repo());
    options.out_dir = out_dir.to_path_buf();
    options.offline = true;
    options
}

#[test]
fn test_pipeline_writes_one_stub_and_skips_pinless_board() {
    let out = tempfile::tempdir().unwrap();
    let summary = generate(&offline_options(out.path())).unwrap();

    assert_eq!(summary.boards_written, 1);
    assert_eq!(summary.boards_skipped, 1);
    assert_eq!(summary.collisions, 0);

    let stub = out
        .path()
        .join("0x239A")
        .join("0x8022")
        .join("adafruit_feather_m4_express.pyi");
    assert!(stub.is_file(), "expected stub at {}", stub.display());

    // The skipped board must not leave any output behind.
    assert!(!out.path().join("0x1209").exists());
}

#[test]
fn test_pipeline_stub_content() {
    let out = tempfile::tempdir().unwrap();
    generate(&offline_options(out.path())).unwrap();

    let stub = std::fs::read_to_string(
        out.path()
            .join("0x239A")
            .join("0x8022")
            .join("adafruit_feather_m4_express.pyi"),
    )
    .unwrap();

    assert!(stub.starts_with("from __future__ import annotations\n"));
    assert!(stub.contains("import busio\nimport microcontroller\n"));
    assert!(stub.contains("board Adafruit Industries LLC Feather M4 Express\n"));
    assert!(stub.contains("https://circuitpython.org/boards/adafruit_feather_m4_express\n"));
    assert!(stub.contains("A0: microcontroller.Pin = ...\n"));
    assert!(stub.contains("def I2C() -> busio.I2C:\n"));
    // Reused blocks replace synthesized lines for the bus pins.
    assert!(!stub.contains("I2C: typing.Any"));
}

#[test]
fn test_pipeline_metadata_index() {
    let out = tempfile::tempdir().unwrap();
    generate(&offline_options(out.path())).unwrap();

    let metadata: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(out.path().join("metadata.json")).unwrap(),
    )
    .unwrap();

    let records = metadata.as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["vid"], "0x239A");
    assert_eq!(records[0]["pid"], "0x8022");
    assert_eq!(records[0]["product"], "Feather M4 Express");
    assert_eq!(records[0]["manufacturer"], "Adafruit Industries LLC");
    assert_eq!(records[0]["site_path"], "adafruit_feather_m4_express");
    assert_eq!(
        records[0]["description"],
        "Adafruit Industries LLC Feather M4 Express"
    );
}

#[test]
fn test_pipeline_is_rerunnable() {
    let out = tempfile::tempdir().unwrap();
    let options = offline_options(out.path());

    let first = generate(&options).unwrap();
    let second = generate(&options).unwrap();
    assert_eq!(first.boards_written, second.boards_written);
    assert_eq!(second.collisions, 0);
}

#[test]
fn test_pipeline_missing_template_is_fatal() {
    let out = tempfile::tempdir().unwrap();
    let mut options = offline_options(out.path());
    options.stub_template = PathBuf::from("no_such_template.pyi");
    assert!(generate(&options).is_err());
}
