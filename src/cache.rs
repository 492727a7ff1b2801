//! Cache - Remembers whether a save directory holds any slot

use crate::scanner::scan_for_match;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Sticky-positive memo of "does this directory contain a slot file"
///
/// Once a directory is seen to hold a slot the answer stays `true` until the
/// queried directory changes or [`DirectoryCache::invalidate`] is called, so
/// UI refreshes do not list the directory every frame.
#[derive(Debug, Default)]
pub struct DirectoryCache {
    directory: Option<PathBuf>,
    found: bool,
}

impl DirectoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the cached directory and result
    pub fn invalidate(&mut self) {
        self.directory = None;
        self.found = false;
    }

    /// Directory the cached result belongs to
    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Answer whether `dir` holds an entry accepted by `is_slot`
    ///
    /// An absent or missing directory answers `false` without touching the
    /// cache.
    pub fn query<F>(&mut self, dir: Option<&Path>, is_slot: F) -> bool
    where
        F: FnMut(&str) -> bool,
    {
        let Some(dir) = dir else {
            return false;
        };
        if !dir.is_dir() {
            return false;
        }

        if self.directory.as_deref() != Some(dir) {
            debug!("Save directory changed to {:?}", dir);
            self.directory = Some(dir.to_path_buf());
            self.found = false;
        } else if self.found {
            return true;
        }

        self.found = scan_for_match(dir, is_slot);
        self.found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_sna(name: &str) -> bool {
        crate::savefile::is_slot_file(name, ".sna")
    }

    #[test]
    fn absent_directory_is_false_and_leaves_cache_alone() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("00.sna"), b"").unwrap();

        let mut cache = DirectoryCache::new();
        assert!(cache.query(Some(dir.path()), is_sna));

        assert!(!cache.query(None, is_sna));
        assert!(!cache.query(Some(&dir.path().join("missing")), is_sna));
        assert_eq!(cache.directory(), Some(dir.path()));
    }

    #[test]
    fn positive_result_is_sticky() {
        let dir = tempfile::tempdir().unwrap();
        let slot = dir.path().join("03.sna");
        let mut cache = DirectoryCache::new();

        assert!(!cache.query(Some(dir.path()), is_sna));
        std::fs::write(&slot, b"").unwrap();
        assert!(cache.query(Some(dir.path()), is_sna));

        std::fs::remove_file(&slot).unwrap();
        assert!(cache.query(Some(dir.path()), is_sna));

        let mut scans = 0;
        assert!(cache.query(Some(dir.path()), |_| {
            scans += 1;
            false
        }));
        assert_eq!(scans, 0);
    }

    #[test]
    fn directory_change_forces_a_fresh_scan() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(first.path().join("00.sna"), b"").unwrap();

        let mut cache = DirectoryCache::new();
        assert!(cache.query(Some(first.path()), is_sna));
        assert!(!cache.query(Some(second.path()), is_sna));

        std::fs::remove_file(first.path().join("00.sna")).unwrap();
        assert!(!cache.query(Some(first.path()), is_sna));
    }

    #[test]
    fn invalidate_rescans() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("00.sna"), b"").unwrap();

        let mut cache = DirectoryCache::new();
        assert!(cache.query(Some(dir.path()), is_sna));
        std::fs::remove_file(dir.path().join("00.sna")).unwrap();

        cache.invalidate();
        assert!(!cache.query(Some(dir.path()), is_sna));
    }
}
