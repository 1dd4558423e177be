//! Generic board stub parser.
//!
//! The shared `board/__init__.pyi` template carries one canonical definition
//! block per named capability (`def I2C(...)`, `def SPI(...)`, ...). Boards
//! that expose a pin with the same name reuse the block verbatim instead of
//! synthesizing a one-line stub.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Mapping from definition name to the exact text span of its block,
/// including the `def` header line.
pub type GenericStubMap = HashMap<String, String>;

static DEF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^def ([^(]*)\(").expect("valid def regex"));

/// Parse the generic board stub file into named definition blocks.
pub fn parse_generic_stubs(path: &Path) -> std::io::Result<GenericStubMap> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_generic_stubs_str(&content))
}

/// Parse generic stub content. Each block starts at a `def NAME(...)` header
/// and extends to the line before the next header (or end of input). Text
/// before the first header is discarded; zero headers yield an empty map.
pub fn parse_generic_stubs_str(content: &str) -> GenericStubMap {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let headers: Vec<(usize, String)> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, line)| {
            DEF_RE
                .captures(line)
                .map(|caps| (i, caps[1].to_string()))
        })
        .collect();

    let mut stubs = GenericStubMap::new();
    for (n, (start, name)) in headers.iter().enumerate() {
        let end = headers
            .get(n + 1)
            .map(|(next_start, _)| *next_start)
            .unwrap_or(lines.len());
        stubs.insert(name.clone(), lines[*start..end].concat());
    }
    stubs
}
