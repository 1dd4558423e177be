//! Boardstubs - CircuitPython board stub generation library
//!
//! Generates one `.pyi` type-stub file per supported CircuitPython board by
//! parsing the board's native `mpconfigboard.mk` and `pins.c` out of a
//! firmware checkout, reusing canonical definition blocks from the shared
//! `board` stub template, and writing a `metadata.json` index for the run.
//!
//! # Quick Start
//!
//! ```no_run
//! use boardstubs::{generate, GenerateOptions};
//!
//! let mut options = GenerateOptions::new(".");
//! options.offline = true;
//! let summary = generate(&options).unwrap();
//! println!("wrote {} stubs, skipped {}", summary.boards_written, summary.boards_skipped);
//! ```
//!
//! # Pipeline
//!
//! - **Manufacturer fetch**: one HTTP GET per run, empty list on failure
//! - **Generic stub parsing**: the shared template split into named blocks
//! - **Per-board parsing**: config keys with fallback rules, pin table rows
//! - **Output**: stub tree keyed by VID/PID plus the JSON metadata index

pub mod core;
pub mod manufacturers;
pub mod output;
pub mod parser;

// Re-export main types
pub use self::core::{
    discover_boards, generate, BoardRecord, GenerateOptions, RunSummary, StubGenError,
};
pub use manufacturers::{
    fetch_manufacturers, fetch_manufacturers_blocking, ManufacturerEntry, DEFAULT_LISTING_URL,
};
pub use parser::config::{normalize_vid_pid, BoardConfig};
pub use parser::generic::{parse_generic_stubs, parse_generic_stubs_str, GenericStubMap};
pub use parser::pins::{parse_pins, parse_pins_file, PinStubs};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{
        generate, BoardConfig, BoardRecord, GenerateOptions, ManufacturerEntry, PinStubs,
        RunSummary, StubGenError,
    };
}
