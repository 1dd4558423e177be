//! Pin table parser.
//!
//! Scans a board's `pins.c` for the fixed-format table rows
//! `{ MP_ROM_QSTR(MP_QSTR_NAME), MP_ROM_PTR(expr) }` and turns each row into
//! either a reused generic definition block or a synthesized one-line stub
//! with an inferred type.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::parser::generic::GenericStubMap;

static PIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\s*\{\s*MP_ROM_QSTR\(MP_QSTR_(?P<name>[^)]*)\)\s*,\s*MP_ROM_PTR\((?P<value>[^)]*)\)")
        .expect("valid pin row regex")
});

/// Result of parsing one pin table.
#[derive(Debug, Clone, Default)]
pub struct PinStubs {
    /// Distinct imported namespaces, sorted alphabetically.
    pub imports: Vec<String>,
    /// Synthesized `name: type = ...` lines, in file-appearance order.
    pub lines: Vec<String>,
    /// Generic definition blocks reused verbatim, in file-appearance order.
    pub reused: Vec<(String, String)>,
}

impl PinStubs {
    /// Render the import statements, one `import X` line per namespace.
    pub fn import_block(&self) -> String {
        let mut block = self
            .imports
            .iter()
            .map(|namespace| format!("import {namespace}"))
            .collect::<Vec<_>>()
            .join("\n");
        block.push('\n');
        block
    }
}

/// Infer a stub type from the row's right-hand-side expression.
///
/// Two display expressions map exactly, pin-object references map by prefix,
/// everything else falls back to `typing.Any`.
fn classify_expression(value: &str) -> (&'static str, &'static str) {
    match value {
        "&displays[0].epaper_display" => ("displayio", "displayio.EPaperDisplay"),
        "&displays[0].display" => ("displayio", "displayio.Display"),
        _ if value.starts_with("&pin_") => ("microcontroller", "microcontroller.Pin"),
        _ => ("typing", "typing.Any"),
    }
}

/// Parse pin table content against the generic stub map.
///
/// Rows whose name has a generic definition copy that block (recording a
/// `busio` import when the block references the bus module); all other rows
/// get a synthesized line. Non-matching lines are skipped silently.
pub fn parse_pins(content: &str, generic_stubs: &GenericStubMap) -> PinStubs {
    let mut imports = BTreeSet::new();
    let mut lines = Vec::new();
    let mut reused = Vec::new();
    let mut reused_names = HashSet::new();

    for line in content.lines() {
        let Some(caps) = PIN_RE.captures(line) else {
            continue;
        };
        let name = &caps["name"];
        if let Some(block) = generic_stubs.get(name) {
            if reused_names.insert(name.to_string()) {
                reused.push((name.to_string(), block.clone()));
            }
            if block.contains("busio") {
                imports.insert("busio".to_string());
            }
            continue;
        }
        let (namespace, pin_type) = classify_expression(&caps["value"]);
        imports.insert(namespace.to_string());
        lines.push(format!("{name}: {pin_type} = ...\n"));
    }

    PinStubs {
        imports: imports.into_iter().collect(),
        lines,
        reused,
    }
}

/// Parse a `pins.c` file from disk.
pub fn parse_pins_file(path: &Path, generic_stubs: &GenericStubMap) -> std::io::Result<PinStubs> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_pins(&content, generic_stubs))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PINS: &str = "\
static const mp_rom_map_elem_t board_module_globals_table[] = {
    CIRCUITPYTHON_BOARD_DICT_STANDARD_ITEMS
    { MP_ROM_QSTR(MP_QSTR_A0), MP_ROM_PTR(&pin_PA02) },
    { MP_ROM_QSTR(MP_QSTR_D13), MP_ROM_PTR(&pin_PA23) },
    { MP_ROM_QSTR(MP_QSTR_DISPLAY), MP_ROM_PTR(&displays[0].display) },
    { MP_ROM_QSTR(MP_QSTR_I2C), MP_ROM_PTR(&board_i2c_obj) },
    { MP_ROM_QSTR(MP_QSTR_MYSTERY), MP_ROM_PTR(&mystery_obj) },
};
MP_DEFINE_CONST_DICT(board_module_globals, board_module_globals_table);
";

    fn generic() -> GenericStubMap {
        let mut stubs = GenericStubMap::new();
        stubs.insert(
            "I2C".to_string(),
            "def I2C() -> busio.I2C:\n    ...\n".to_string(),
        );
        stubs
    }

    #[test]
    fn test_pin_objects_map_to_microcontroller_pin() {
        let parsed = parse_pins(PINS, &generic());
        assert!(parsed.lines.contains(&"A0: microcontroller.Pin = ...\n".to_string()));
        assert!(parsed.lines.contains(&"D13: microcontroller.Pin = ...\n".to_string()));
        assert!(parsed.imports.contains(&"microcontroller".to_string()));
    }

    #[test]
    fn test_display_expression_maps_to_displayio() {
        let parsed = parse_pins(PINS, &generic());
        assert!(parsed.lines.contains(&"DISPLAY: displayio.Display = ...\n".to_string()));
        assert!(parsed.imports.contains(&"displayio".to_string()));
    }

    #[test]
    fn test_unknown_expression_falls_back_to_any() {
        let parsed = parse_pins(PINS, &generic());
        assert!(parsed.lines.contains(&"MYSTERY: typing.Any = ...\n".to_string()));
        assert!(parsed.imports.contains(&"typing".to_string()));
    }

    #[test]
    fn test_generic_block_reused_without_synthesized_line() {
        let parsed = parse_pins(PINS, &generic());
        assert_eq!(parsed.reused.len(), 1);
        assert_eq!(parsed.reused[0].0, "I2C");
        assert!(!parsed.lines.iter().any(|l| l.starts_with("I2C:")));
        // Block references busio, so the import is recorded.
        assert!(parsed.imports.contains(&"busio".to_string()));
    }

    #[test]
    fn test_imports_are_sorted_and_distinct() {
        let parsed = parse_pins(PINS, &generic());
        let mut sorted = parsed.imports.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(parsed.imports, sorted);
    }

    #[test]
    fn test_lines_keep_file_order() {
        let parsed = parse_pins(PINS, &generic());
        let a0 = parsed.lines.iter().position(|l| l.starts_with("A0:")).unwrap();
        let mystery = parsed.lines.iter().position(|l| l.starts_with("MYSTERY:")).unwrap();
        assert!(a0 < mystery);
    }

    #[test]
    fn test_non_matching_lines_are_skipped() {
        let parsed = parse_pins("int main(void) { return 0; }\n", &generic());
        assert!(parsed.lines.is_empty());
        assert!(parsed.imports.is_empty());
        assert!(parsed.reused.is_empty());
    }

    #[test]
    fn test_empty_import_block_is_single_newline() {
        let parsed = parse_pins("", &generic());
        assert_eq!(parsed.import_block(), "\n");
    }
}
