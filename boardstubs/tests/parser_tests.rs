//! Tests for the board config, pin table, and generic stub parsers against
//! on-disk fixtures.

use boardstubs::{parse_generic_stubs, parse_pins_file, BoardConfig};
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn feather_dir() -> PathBuf {
    fixture_path("repo/circuitpython/ports/atmel-samd/boards/adafruit_feather_m4_express")
}

#[test]
fn test_parse_generic_template() {
    let stubs = parse_generic_stubs(&fixture_path("repo/stubs/board/__init__.pyi")).unwrap();
    assert_eq!(stubs.len(), 3);
    for name in ["I2C", "SPI", "UART"] {
        assert!(stubs.contains_key(name), "missing generic block {name}");
        assert!(stubs[name].starts_with(&format!("def {name}()")));
    }
}

#[test]
fn test_parse_generic_missing_file() {
    let result = parse_generic_stubs(&fixture_path("does_not_exist.pyi"));
    assert!(result.is_err(), "should fail on nonexistent template");
}

#[test]
fn test_parse_feather_config() {
    let config = BoardConfig::from_file(&feather_dir().join("mpconfigboard.mk")).unwrap();
    assert_eq!(config.usb_vid, "0x239A");
    assert_eq!(config.usb_pid, "0x8022");
    assert_eq!(config.usb_product, "Feather M4 Express");
    assert_eq!(config.usb_manufacturer, "Adafruit Industries LLC");
    assert_eq!(config.creator_id, "");
    assert_eq!(config.creation_id, "");
}

#[test]
fn test_parse_feather_pins() {
    let generic = parse_generic_stubs(&fixture_path("repo/stubs/board/__init__.pyi")).unwrap();
    let parsed = parse_pins_file(&feather_dir().join("pins.c"), &generic).unwrap();

    // Plain pins are synthesized, bus pins reuse the generic blocks.
    assert!(parsed.lines.contains(&"A0: microcontroller.Pin = ...\n".to_string()));
    assert!(parsed.lines.contains(&"NEOPIXEL: microcontroller.Pin = ...\n".to_string()));
    let reused: Vec<_> = parsed.reused.iter().map(|(name, _)| name.as_str()).collect();
    assert_eq!(reused, ["I2C", "SPI", "UART"]);

    // The bus blocks reference busio, so the import is recorded alongside
    // the pin namespace.
    assert_eq!(parsed.imports, ["busio", "microcontroller"]);
}
