//! Board config parser.
//!
//! Reads the six USB identity keys out of a board's `mpconfigboard.mk`, then
//! applies the fallback chain that fills in missing VID/PID/product/
//! manufacturer values from the creator IDs, the directory name, and the
//! fetched manufacturer list.

use std::path::Path;

use crate::manufacturers::ManufacturerEntry;

/// USB identity values scraped from one `mpconfigboard.mk`.
///
/// All fields start empty; a key absent from the file simply stays empty and
/// flows through the fallback logic.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BoardConfig {
    pub usb_vid: String,
    pub usb_pid: String,
    pub usb_product: String,
    pub usb_manufacturer: String,
    pub creator_id: String,
    pub creation_id: String,
}

/// Recognized config keys, matched against the start of each line.
const KEYS: [&str; 6] = [
    "USB_VID",
    "USB_PID",
    "USB_PRODUCT",
    "USB_MANUFACTURER",
    "CIRCUITPY_CREATOR_ID",
    "CIRCUITPY_CREATION_ID",
];

impl BoardConfig {
    /// Parse `mpconfigboard.mk` content.
    ///
    /// Every line is scanned for every key; when a key appears on multiple
    /// lines the LAST match wins. This mirrors the build files, where a later
    /// assignment overrides an earlier one.
    pub fn parse(content: &str) -> Self {
        let mut config = Self::default();
        for line in content.lines() {
            for key in KEYS {
                if line.starts_with(key) {
                    if let Some(value) = extract_value(line) {
                        *config.field_mut(key) = value;
                    }
                }
            }
        }
        config
    }

    /// Parse a config file from disk.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::parse(&content))
    }

    fn field_mut(&mut self, key: &str) -> &mut String {
        match key {
            "USB_VID" => &mut self.usb_vid,
            "USB_PID" => &mut self.usb_pid,
            "USB_PRODUCT" => &mut self.usb_product,
            "USB_MANUFACTURER" => &mut self.usb_manufacturer,
            "CIRCUITPY_CREATOR_ID" => &mut self.creator_id,
            "CIRCUITPY_CREATION_ID" => &mut self.creation_id,
            _ => unreachable!("unrecognized config key"),
        }
    }

    /// Apply the fallback chain and normalize VID/PID.
    ///
    /// `site_path` is the board's directory name; `manufacturers` is the
    /// sorted list fetched once per run (may be empty when the fetch failed).
    ///
    /// The two overwrite conditions below overlap but are both kept: which
    /// boards get placeholder-derived names depends on the exact triggers.
    pub fn apply_fallbacks(&mut self, site_path: &str, manufacturers: &[ManufacturerEntry]) {
        if self.usb_vid.is_empty() && !self.creator_id.is_empty() {
            self.usb_vid = self.creator_id.clone();
        }
        if self.usb_pid.is_empty() && !self.creation_id.is_empty() {
            self.usb_pid = self.creation_id.clone();
        }

        let prefix = site_path.split('_').next().unwrap_or(site_path);
        let prefix_lower = prefix.to_lowercase();
        let matched = manufacturers
            .iter()
            .find(|entry| entry.manufacturer.to_lowercase().contains(&prefix_lower))
            .map(|entry| entry.manufacturer.as_str());

        let own_has_prefix = self.usb_manufacturer.to_lowercase().contains(&prefix_lower);
        if matched == Some("Unknown") || (matched.is_some() && !own_has_prefix) {
            self.usb_product = site_path.to_string();
            self.usb_manufacturer = capitalize(prefix);
        }

        if self.usb_product.is_empty() || self.usb_manufacturer.is_empty() {
            self.usb_product = site_path.to_string();
            self.usb_manufacturer = capitalize(prefix);
        }

        self.usb_vid = normalize_vid_pid(&self.usb_vid);
        self.usb_pid = normalize_vid_pid(&self.usb_pid);
    }
}

/// Extract the value from a `KEY = value # comment` line: first segment after
/// `=`, truncated at `#`, trimmed of quotes and whitespace.
fn extract_value(line: &str) -> Option<String> {
    // First segment after `=` only: a second assignment on the same line is
    // not part of the value.
    let rest = line.split('=').nth(1)?;
    let raw = rest.split('#').next().unwrap_or("");
    Some(
        raw.trim_matches(|c: char| c == '"' || c.is_whitespace())
            .to_string(),
    )
}

/// Normalize a VID/PID string to `0x` followed by uppercase hex digits.
///
/// Values already carrying a `0x`/`0X` prefix keep the lowercase `0x` and get
/// their digits uppercased; bare values are zero-padded to at least four
/// characters first. Empty input stays empty. Idempotent.
pub fn normalize_vid_pid(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    if let Some(digits) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        return format!("0x{}", digits.to_uppercase());
    }
    format!("0x{:0>4}", value.to_uppercase())
}

/// Capitalize like Python's `str.capitalize`: first char uppercased, the rest
/// lowercased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
