//! Stub file and metadata index writers.

use std::path::Path;

use crate::core::{BoardRecord, StubGenError};
use crate::parser::pins::PinStubs;

/// Base URL for the per-board documentation link embedded in each stub.
pub const BOARD_SITE_BASE: &str = "https://circuitpython.org/boards";

/// Render one board stub: future import, namespace imports, a docstring with
/// the board description and site URL, synthesized lines, then the reused
/// generic blocks.
pub fn render_stub(description: &str, site_path: &str, pins: &PinStubs) -> String {
    let mut out = String::from("from __future__ import annotations\n");
    out.push_str(&pins.import_block());
    out.push_str(&format!("\"\"\"\nboard {description}\n"));
    out.push_str(&format!("{BOARD_SITE_BASE}/{site_path}\n\"\"\"\n"));
    for line in &pins.lines {
        out.push_str(line);
    }
    for (_, block) in &pins.reused {
        out.push_str(block);
        out.push('\n');
    }
    out
}

/// Write one board stub file, creating parent directories as needed.
pub fn write_board_stub(
    path: &Path,
    description: &str,
    site_path: &str,
    pins: &PinStubs,
) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_stub(description, site_path, pins))
}

/// Write the run-wide metadata index as a pretty-printed JSON array.
pub fn write_metadata(path: &Path, records: &[BoardRecord]) -> Result<(), StubGenError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json)?;
    Ok(())
}
