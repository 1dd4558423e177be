//! Core stub generation pipeline shared by the CLI and library users.
//!
//! Discovers board directories under the firmware checkout, runs the config
//! and pin parsers per board, writes one stub file per board into a tree
//! keyed by VID then PID, and writes the `metadata.json` index at the end.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::manufacturers::{self, ManufacturerEntry, DEFAULT_LISTING_URL};
use crate::output;
use crate::parser::config::BoardConfig;
use crate::parser::generic::{parse_generic_stubs, GenericStubMap};
use crate::parser::pins;

#[derive(Debug, thiserror::Error)]
pub enum StubGenError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Other(String),
}

/// The unit written into the metadata index, one per processed board.
#[derive(Debug, Clone, Serialize)]
pub struct BoardRecord {
    pub vid: String,
    pub pid: String,
    pub product: String,
    pub manufacturer: String,
    pub site_path: String,
    pub description: String,
}

/// Paths and knobs for one generation run.
#[derive(Clone, Debug)]
pub struct GenerateOptions {
    /// Root of the stub tool repository.
    pub repo_root: PathBuf,
    /// Firmware checkout containing `ports/*/boards/*`.
    pub firmware_root: PathBuf,
    /// Shared generic stub template.
    pub stub_template: PathBuf,
    /// Output tree for per-board stubs and `metadata.json`.
    pub out_dir: PathBuf,
    /// Manufacturer listing page.
    pub listing_url: String,
    /// Skip the manufacturer fetch entirely.
    pub offline: bool,
}

impl GenerateOptions {
    /// Options with the conventional repository layout: firmware under
    /// `circuitpython/`, template under `stubs/board/__init__.pyi`, output
    /// under `boards/`.
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        let repo_root = repo_root.into();
        Self {
            firmware_root: repo_root.join("circuitpython"),
            stub_template: repo_root.join("stubs").join("board").join("__init__.pyi"),
            out_dir: repo_root.join("boards"),
            listing_url: DEFAULT_LISTING_URL.to_string(),
            offline: false,
            repo_root,
        }
    }
}

/// Counts and records from one generation run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub boards_written: usize,
    pub boards_skipped: usize,
    pub collisions: usize,
    pub records: Vec<BoardRecord>,
}

/// Discover candidate board directories: `ports/*/boards/*` entries that
/// contain an `mpconfigboard.mk`. Sorted for a deterministic processing
/// order (which also fixes which colliding board gets the plain filename).
pub fn discover_boards(firmware_root: &Path) -> Result<Vec<PathBuf>, StubGenError> {
    let mut boards = Vec::new();
    let ports_dir = firmware_root.join("ports");
    for port in std::fs::read_dir(&ports_dir)? {
        let port = port?.path();
        if !port.is_dir() {
            continue;
        }
        let boards_dir = port.join("boards");
        if !boards_dir.is_dir() {
            continue;
        }
        for board in std::fs::read_dir(&boards_dir)? {
            let board = board?.path();
            if board.is_dir() && board.join("mpconfigboard.mk").is_file() {
                boards.push(board);
            }
        }
    }
    boards.sort();
    Ok(boards)
}

/// Run the full pipeline: parse the generic template once, fetch the
/// manufacturer list once, process every discovered board, then write the
/// metadata index.
pub fn generate(options: &GenerateOptions) -> Result<RunSummary, StubGenError> {
    let generic_stubs = parse_generic_stubs(&options.stub_template)?;
    let manufacturers = if options.offline {
        tracing::debug!("offline mode, skipping manufacturer fetch");
        Vec::new()
    } else {
        manufacturers::fetch_manufacturers_blocking(&options.listing_url)
    };

    let boards = discover_boards(&options.firmware_root)?;
    tracing::debug!("discovered {} candidate board directories", boards.len());

    let mut seen_keys: HashMap<String, usize> = HashMap::new();
    let mut records = Vec::new();
    let mut skipped = 0;
    for board_dir in &boards {
        match process_board(
            board_dir,
            &options.out_dir,
            &generic_stubs,
            &manufacturers,
            &mut seen_keys,
        )? {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    output::write_metadata(&options.out_dir.join("metadata.json"), &records)?;

    let collisions = seen_keys
        .values()
        .filter(|&&count| count > 1)
        .map(|count| count - 1)
        .sum();
    Ok(RunSummary {
        boards_written: records.len(),
        boards_skipped: skipped,
        collisions,
        records,
    })
}

/// Process one board directory. Returns `Ok(None)` when the board is skipped
/// (no supported pin table); write errors propagate.
fn process_board(
    board_dir: &Path,
    out_dir: &Path,
    generic_stubs: &GenericStubMap,
    manufacturers: &[ManufacturerEntry],
    seen_keys: &mut HashMap<String, usize>,
) -> Result<Option<BoardRecord>, StubGenError> {
    let site_path = board_dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string();

    let pins_path = board_dir.join("pins.c");
    if !pins_path.is_file() {
        if board_dir.join("pins.csv").is_file() {
            tracing::warn!("skipping {site_path}: unsupported pin table format (pins.csv)");
        } else {
            tracing::warn!("skipping {site_path}: no pin definition file");
        }
        return Ok(None);
    }

    let mut config = BoardConfig::from_file(&board_dir.join("mpconfigboard.mk"))?;
    config.apply_fallbacks(&site_path, manufacturers);

    // VID:PID is only a rough identity key. Later occurrences get a numeric
    // filename suffix instead of clobbering the first board's stub.
    let key = format!("{}:{}", config.usb_vid, config.usb_pid);
    let count = seen_keys.entry(key.clone()).or_insert(0);
    let occurrence = *count;
    *count += 1;
    let file_name = if occurrence == 0 {
        format!("{site_path}.pyi")
    } else {
        tracing::warn!("duplicate VID:PID {key} for {site_path}, suffixing stub filename");
        format!("{site_path}_{occurrence}.pyi")
    };

    let parsed = pins::parse_pins_file(&pins_path, generic_stubs)?;
    let description = format!("{} {}", config.usb_manufacturer, config.usb_product);
    let stub_path = out_dir
        .join(&config.usb_vid)
        .join(&config.usb_pid)
        .join(file_name);
    output::write_board_stub(&stub_path, &description, &site_path, &parsed)?;
    tracing::debug!("wrote {}", stub_path.display());

    Ok(Some(BoardRecord {
        vid: config.usb_vid,
        pid: config.usb_pid,
        product: config.usb_product,
        manufacturer: config.usb_manufacturer,
        site_path,
        description,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn board(dir: &Path, port: &str, name: &str, config: &str, pins: Option<&str>) {
        let board_dir = dir.join("ports").join(port).join("boards").join(name);
        write(&board_dir.join("mpconfigboard.mk"), config);
        if let Some(pins) = pins {
            write(&board_dir.join("pins.c"), pins);
        }
    }

    const PINS: &str = "{ MP_ROM_QSTR(MP_QSTR_A0), MP_ROM_PTR(&pin_PA02) },\n";

    #[test]
    fn test_discover_requires_config_file() {
        let dir = tempfile::tempdir().unwrap();
        board(dir.path(), "samd", "with_config", "USB_VID = 0x1\n", Some(PINS));
        std::fs::create_dir_all(
            dir.path().join("ports").join("samd").join("boards").join("bare"),
        )
        .unwrap();

        let boards = discover_boards(dir.path()).unwrap();
        assert_eq!(boards.len(), 1);
        assert!(boards[0].ends_with("with_config"));
    }

    #[test]
    fn test_discover_spans_ports() {
        let dir = tempfile::tempdir().unwrap();
        board(dir.path(), "samd", "one", "USB_VID = 0x1\n", Some(PINS));
        board(dir.path(), "rp2", "two", "USB_VID = 0x2\n", Some(PINS));
        assert_eq!(discover_boards(dir.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_missing_ports_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_boards(dir.path()).is_err());
    }

    #[test]
    fn test_collision_gets_suffixed_filename() {
        let dir = tempfile::tempdir().unwrap();
        let firmware = dir.path().join("circuitpython");
        let config = "USB_VID = 0x239A\nUSB_PID = 0x80F9\n";
        board(&firmware, "samd", "maker_alpha", config, Some(PINS));
        board(&firmware, "samd", "maker_beta", config, Some(PINS));
        write(
            &dir.path().join("stubs").join("board").join("__init__.pyi"),
            "def I2C():\n    ...\n",
        );

        let mut options = GenerateOptions::new(dir.path());
        options.offline = true;
        let summary = generate(&options).unwrap();

        assert_eq!(summary.boards_written, 2);
        assert_eq!(summary.collisions, 1);
        let out = dir.path().join("boards").join("0x239A").join("0x80F9");
        assert!(out.join("maker_alpha.pyi").is_file());
        assert!(out.join("maker_beta_1.pyi").is_file());
    }
}
