//! Screen - Thumbnail of a slot's display memory

use crate::snapshot::{Snapshot, SnapshotFormat};
use crate::{Error, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Bitmap (6144) plus attributes (768)
pub const SCREEN_SIZE: usize = 6912;

/// Bank holding the normal display file
pub const NORMAL_SCREEN_PAGE: u8 = 5;

/// Bank holding the 128K shadow display file
pub const SHADOW_SCREEN_PAGE: u8 = 7;

/// A Spectrum screen in `.scr` layout
#[derive(Clone, PartialEq, Eq)]
pub struct Screen {
    bytes: Box<[u8; SCREEN_SIZE]>,
}

impl Screen {
    /// An all-black screen
    pub fn blank() -> Self {
        Self {
            bytes: Box::new([0; SCREEN_SIZE]),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..]
    }

    pub fn is_blank(&self) -> bool {
        self.bytes.iter().all(|&b| b == 0)
    }

    /// Write as a `.scr` file
    pub fn write_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.as_bytes())?;
        Ok(())
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self::blank()
    }
}

impl std::fmt::Debug for Screen {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("blank", &self.is_blank())
            .finish()
    }
}

/// Bank the snapshot's machine is displaying
///
/// Machines with 128K paging show bank 7 when bit 3 of port `0x7FFD` is
/// set; everything else always shows bank 5.
pub fn display_page(snap: &Snapshot) -> u8 {
    if snap.machine.has_128k_paging() && snap.paging & 0x08 != 0 {
        SHADOW_SCREEN_PAGE
    } else {
        NORMAL_SCREEN_PAGE
    }
}

/// Copy the displayed screen out of a parsed snapshot
pub fn screen_of(snap: &Snapshot) -> Result<Screen> {
    let page = display_page(snap);
    let memory = snap.page(page).ok_or(Error::MissingPage(page))?;

    let mut screen = Screen::blank();
    screen.bytes.copy_from_slice(&memory[..SCREEN_SIZE]);
    Ok(screen)
}

/// Read the snapshot at `path` and copy out its screen
pub fn try_extract_screen(path: &Path) -> Result<Screen> {
    let bytes = std::fs::read(path)?;
    let format = SnapshotFormat::from_path(path);
    let snap = Snapshot::parse(&bytes, format, &path.to_string_lossy())?;
    screen_of(&snap)
}

/// Screen of the snapshot at `path`, blank when it cannot be produced
pub fn extract_screen(path: Option<&Path>) -> Screen {
    let Some(path) = path else {
        return Screen::blank();
    };
    if !path.is_file() {
        debug!("No snapshot at {:?}, blank thumbnail", path);
        return Screen::blank();
    }

    match try_extract_screen(path) {
        Ok(screen) => screen,
        Err(e) => {
            warn!("Cannot extract screen from {:?}: {}", path, e);
            Screen::blank()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Machine, PAGE_SIZE};

    fn snapshot(machine: Machine, paging: u8) -> Snapshot {
        let mut snap = Snapshot::new(machine);
        snap.paging = paging;
        for bank in 0..8 {
            snap.set_page(bank, vec![0x10 + bank; PAGE_SIZE]);
        }
        snap
    }

    #[test]
    fn display_page_by_machine_and_paging() {
        assert_eq!(display_page(&snapshot(Machine::Spectrum48, 0x08)), 5);
        assert_eq!(display_page(&snapshot(Machine::Tc2048, 0x08)), 5);
        assert_eq!(display_page(&snapshot(Machine::Spectrum128, 0x00)), 5);
        assert_eq!(display_page(&snapshot(Machine::Spectrum128, 0x08)), 7);
        assert_eq!(display_page(&snapshot(Machine::Pentagon, 0x1F)), 7);
        assert_eq!(display_page(&snapshot(Machine::Plus3, 0x17)), 5);
    }

    #[test]
    fn copies_exactly_one_screen() {
        let screen = screen_of(&snapshot(Machine::Spectrum128, 0x08)).unwrap();
        assert_eq!(screen.as_bytes().len(), SCREEN_SIZE);
        assert!(screen.as_bytes().iter().all(|&b| b == 0x17));
    }

    #[test]
    fn missing_page_is_an_error() {
        let mut snap = Snapshot::new(Machine::Spectrum128);
        snap.paging = 0x08;
        snap.set_page(5, vec![1; PAGE_SIZE]);
        assert!(matches!(screen_of(&snap), Err(Error::MissingPage(7))));
    }

    #[test]
    fn absent_or_broken_snapshots_are_blank() {
        assert!(extract_screen(None).is_blank());
        assert!(extract_screen(Some(Path::new("/nonexistent/00.sna"))).is_blank());

        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("00.sna");
        std::fs::write(&broken, b"not a snapshot").unwrap();
        let screen = extract_screen(Some(&broken));
        assert_eq!(screen.as_bytes().len(), SCREEN_SIZE);
        assert!(screen.is_blank());
    }
}
