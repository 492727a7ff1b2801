//! Resolver - Where a program's save slots live on disk

use crate::config::Settings;
use crate::program::Program;
use crate::savefile::{self, Savefile};
use crate::snapshot::Machine;
use crate::{Error, Result, MAX_PATH, SAVESTATES_DIR};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Width of a slot label, matching the menu column
const LABEL_WIDTH: usize = 19;

/// Longest program name shown in full in a label
const LABEL_PROGRAM_WIDTH: usize = 15;

/// Resolves save paths for the host's current program and machine
///
/// Every answer is a pure function of the settings, the machine and the
/// last opened file passed in at construction.
#[derive(Debug, Clone)]
pub struct SlotResolver<'a> {
    settings: &'a Settings,
    machine: Machine,
    last_opened: Option<&'a Path>,
}

impl<'a> SlotResolver<'a> {
    pub fn new(settings: &'a Settings, machine: Machine, last_opened: Option<&'a Path>) -> Self {
        Self {
            settings,
            machine,
            last_opened,
        }
    }

    /// Sanitized identity of the loaded program, None when nothing is loaded
    pub fn current_program(&self) -> Option<String> {
        Program::from_last_opened(self.last_opened).map(|p| p.name)
    }

    /// `<root>/savestates/[<machine>/]<program>`, None when not applicable
    pub fn current_directory(&self) -> Option<PathBuf> {
        let program = self.current_program()?;
        let root = self.settings.config_root()?;

        let mut dir = root.join(SAVESTATES_DIR);
        if self.settings.per_machine {
            dir.push(self.machine.name());
        }
        dir.push(program);

        within_limit(dir)
    }

    /// Path of a slot's save file
    pub fn filename_for_slot(&self, slot: u8) -> Option<PathBuf> {
        self.savefile(slot).map(|s| s.path)
    }

    /// The save file for a slot
    pub fn savefile(&self, slot: u8) -> Option<Savefile> {
        let dir = self.current_directory()?;
        let savefile = Savefile::new(&dir, slot, &self.settings.format);
        within_limit(savefile.path.clone()).map(|_| savefile)
    }

    /// Create the save directory if it does not exist yet
    pub fn ensure_directory_exists(&self) -> Result<PathBuf> {
        let dir = self.current_directory().ok_or(Error::NoProgram)?;

        match std::fs::metadata(&dir) {
            Ok(_) => Ok(dir),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                std::fs::create_dir_all(&dir).map_err(|source| Error::CreateDir {
                    path: dir.clone(),
                    source,
                })?;
                info!("Created savestate directory {:?}", dir);
                Ok(dir)
            }
            Err(source) => Err(Error::Stat { path: dir, source }),
        }
    }

    /// Whether a slot has a save file
    pub fn slot_exists(&self, slot: u8) -> bool {
        self.savefile(slot).map_or(false, |s| s.exists())
    }

    /// Whether the slot named by a path such as `.../07.sna` has a save file
    pub fn slot_exists_for_name(&self, name: &str) -> bool {
        savefile::slot_from_name(name).map_or(false, |slot| self.slot_exists(slot))
    }

    /// Saving needs a loaded program
    pub fn is_savestate_possible(&self) -> bool {
        self.current_program().is_some()
    }

    /// Menu label such as `07: Manic Miner`, cut to fit the menu column
    pub fn label(&self, slot: u8) -> Option<String> {
        let program = self.current_program()?;
        let savefile = self.savefile(slot)?;
        let stem = savefile.path.file_stem()?.to_string_lossy().into_owned();

        let mut label: String = format!("{}: {}", stem, program)
            .chars()
            .take(LABEL_WIDTH)
            .collect();
        if program.chars().count() > LABEL_PROGRAM_WIDTH {
            label = label.chars().take(LABEL_WIDTH - 1).collect();
            label.push('>');
        }
        Some(label)
    }

    /// Modification time of a slot's save file
    pub fn last_change(&self, slot: u8) -> Option<String> {
        self.savefile(slot).filter(|s| s.exists())?.last_change()
    }

    /// Every valid slot file in the current directory, sorted by slot
    pub fn list_slots(&self) -> Vec<Savefile> {
        let Some(dir) = self.current_directory() else {
            return Vec::new();
        };
        let format = &self.settings.format;

        crate::scanner::list_matches(&dir, |name| savefile::is_slot_file(name, format))
            .iter()
            .filter_map(|name| savefile::slot_from_name(name))
            .map(|slot| Savefile::new(&dir, slot, format))
            .collect()
    }
}

fn within_limit(path: PathBuf) -> Option<PathBuf> {
    if path.as_os_str().len() >= MAX_PATH {
        warn!("{}", Error::PathTooLong(path));
        return None;
    }
    debug!("Resolved {:?}", path);
    Some(path)
}
