pub mod config;
pub mod generic;
pub mod pins;

// Re-export for convenience
pub use config::{normalize_vid_pid, BoardConfig};
pub use generic::{parse_generic_stubs, parse_generic_stubs_str, GenericStubMap};
pub use pins::{parse_pins, parse_pins_file, PinStubs};
