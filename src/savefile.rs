//! Savefile - Slot file naming, validation and metadata

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// A save slot file in a program's save directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Savefile {
    pub slot: u8,
    pub path: PathBuf,
}

impl Savefile {
    /// Create a new Savefile for a slot inside a save directory
    pub fn new(directory: &Path, slot: u8, format: &str) -> Self {
        Self {
            slot,
            path: directory.join(slot_file_name(slot, format)),
        }
    }

    /// Check if the save file exists
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Last modification time, formatted like `ctime` without the newline
    pub fn last_change(&self) -> Option<String> {
        last_change(&self.path)
    }
}

/// File name for a slot: two zero-padded digits followed by the format
pub fn slot_file_name(slot: u8, format: &str) -> String {
    format!("{:02}{}", slot, format)
}

/// Check whether a directory entry is a well-formed slot file
///
/// Only `NN<format>` is accepted: exactly two ASCII digits followed by the
/// configured format, compared case-sensitively.
pub fn is_slot_file(name: &str, format: &str) -> bool {
    let base = base_name(name);
    let bytes = base.as_bytes();

    bytes.len() == 2 + format.len()
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && &base[2..] == format
}

/// Parse the slot number from a slot path or name such as `saves/07.sna`
pub fn slot_from_name(name: &str) -> Option<u8> {
    let base = base_name(name);
    let stem = base.split('.').next().unwrap_or(base);
    let digits: String = stem.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Modification time of a file, or None when it cannot be read
pub fn last_change(path: &Path) -> Option<String> {
    let modified = std::fs::metadata(path).and_then(|m| m.modified()).ok()?;
    let local: DateTime<Local> = modified.into();
    Some(local.format("%a %b %e %H:%M:%S %Y").to_string())
}

fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}
