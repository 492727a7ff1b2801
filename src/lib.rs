//! Quicksave - Save-state slot management for ZX Spectrum emulators
//!
//! This library resolves where numbered save slots live on disk, answers
//! "does any slot exist" cheaply enough for UI refreshes, drives save/load
//! through an emulation host and extracts screen thumbnails from snapshots.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::PathBuf;

pub mod cache;
pub mod config;
pub mod formatters;
pub mod host;
pub mod outcome;
pub mod program;
pub mod resolver;
pub mod savefile;
pub mod scanner;
pub mod screen;
pub mod session;
pub mod sna;
pub mod snapshot;
pub mod z80;

pub use cache::DirectoryCache;
pub use config::Settings;
pub use formatters::Formatters;
pub use host::{EmulationHost, LoadIntent, PauseGuard, Reporter, Severity, SnapshotHost};
pub use outcome::{Operation, Outcome};
pub use program::Program;
pub use resolver::SlotResolver;
pub use savefile::Savefile;
pub use screen::Screen;
pub use session::Session;
pub use snapshot::{Machine, Snapshot, SnapshotFormat};

/// Directory under the config root holding every program's slots
pub const SAVESTATES_DIR: &str = "savestates";

/// Default quicksave file extension
pub const DEFAULT_FORMAT: &str = ".sna";

/// Longest composed path accepted, in bytes
pub const MAX_PATH: usize = 4096;

lazy_static! {
    /// Disk/tape/side/part qualifiers stripped from program names
    pub static ref QUALIFIER_REGEX: Regex = Regex::new(
        r"(?i)(?:[[:space:]]|[-_])*(?:[(\[])*[[:space:]]*(?:disk|tape|side|part)(?:[[:space:]]|[[:punct:]])*[abcd1234](?:[[:space:]]*of[[:space:]]*[1234])*(?:[[:space:]]*[)\]])*(?:[[:space:]]|[-_])*"
    )
    .unwrap();
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("No program loaded")]
    NoProgram,

    #[error("Config directory not available")]
    NoConfigRoot,

    #[error("Path too long: {0}")]
    PathTooLong(PathBuf),

    #[error("Not a savestate name: {0}")]
    InvalidSlotName(String),

    #[error("Invalid quicksave format '{0}' (expected 3 or 4 characters)")]
    InvalidFormat(String),

    #[error("couldn't stat '{}': {source}", path.display())]
    Stat {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("error creating savestate directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Malformed snapshot {0}")]
    Snapshot(String),

    #[error("Unsupported snapshot {0}")]
    UnsupportedSnapshot(String),

    #[error("Cannot write snapshots as '{0}'")]
    UnsupportedFormat(String),

    #[error("Snapshot has no memory page {0}")]
    MissingPage(u8),

    #[error("Unknown machine: {0}")]
    UnknownMachine(String),

    #[error("Error saving state to slot {slot:02}: {source}")]
    SaveFailed { slot: u8, source: Box<Error> },

    #[error("Error loading state from slot {slot:02}: {source}")]
    LoadFailed { slot: u8, source: Box<Error> },
}

pub type Result<T> = std::result::Result<T, Error>;
