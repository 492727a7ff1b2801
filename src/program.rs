//! Program - Identifies the currently loaded program for save grouping

use crate::QUALIFIER_REGEX;
use std::path::{Path, PathBuf};

/// The program whose saves are being managed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Sanitized identity, shared by every disk/side/part of a title
    pub name: String,
    pub path: PathBuf,
}

impl Program {
    /// Create a new Program from an identity and the file it came from
    pub fn new(name: String, path: PathBuf) -> Self {
        Self { name, path }
    }

    /// Derive the program from the host's last opened file
    ///
    /// Returns None when nothing is loaded. The directory and extension are
    /// dropped before qualifiers are stripped, so `games/Elite (Side A).tap`
    /// becomes `Elite`. A name that is nothing but a qualifier, such as
    /// `Disk 1.dsk`, keeps its full stem.
    pub fn from_last_opened(last_opened: Option<&Path>) -> Option<Self> {
        let path = last_opened?;
        let stem = path.file_stem()?.to_string_lossy();
        let name = match sanitize_name(&stem) {
            name if name.is_empty() => stem.into_owned(),
            name => name,
        };
        Some(Self::new(name, path.to_path_buf()))
    }
}

/// Strip every disk/tape/side/part qualifier from a program name
pub fn sanitize_name(name: &str) -> String {
    QUALIFIER_REGEX.replace_all(name, "").into_owned()
}
