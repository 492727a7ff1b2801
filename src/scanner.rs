//! Scanner - Predicate-driven directory enumeration

use std::path::Path;
use tracing::{debug, warn};

/// Check whether any entry of `dir` satisfies `is_match`
///
/// Stops at the first match. A directory that cannot be opened, or an error
/// while reading it, counts as "no match". Names that are not valid UTF-8
/// are skipped.
pub fn scan_for_match<F>(dir: &Path, mut is_match: F) -> bool
where
    F: FnMut(&str) -> bool,
{
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot open {:?}: {}", dir, e);
            return false;
        }
    };

    for entry in entries {
        match entry {
            Ok(entry) => {
                if let Some(name) = entry.file_name().to_str() {
                    if is_match(name) {
                        return true;
                    }
                }
            }
            Err(e) => {
                warn!("Error reading {:?}: {}", dir, e);
                return false;
            }
        }
    }

    false
}

/// Every entry name of `dir` satisfying `is_match`, sorted
pub fn list_matches<F>(dir: &Path, mut is_match: F) -> Vec<String>
where
    F: FnMut(&str) -> bool,
{
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .filter_map(|e| e.file_name().to_str().map(|s| s.to_string()))
            .filter(|name| is_match(name))
            .collect(),
        Err(e) => {
            debug!("Cannot open {:?}: {}", dir, e);
            Vec::new()
        }
    };
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_directory_has_no_match() {
        assert!(!scan_for_match(Path::new("/nonexistent/quicksave"), |_| true));
    }

    #[test]
    fn empty_directory_has_no_match() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!scan_for_match(dir.path(), |_| true));
    }

    #[test]
    fn stops_at_first_match() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a", "b", "c"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        let mut seen = 0;
        assert!(scan_for_match(dir.path(), |_| {
            seen += 1;
            true
        }));
        assert_eq!(seen, 1);
    }

    #[test]
    fn no_entry_matches() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
        assert!(!scan_for_match(dir.path(), |name| name.ends_with(".sna")));
    }

    #[test]
    fn lists_sorted_matches() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["10.sna", "02.sna", "readme", "00.sna"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        assert_eq!(
            list_matches(dir.path(), |name| name.ends_with(".sna")),
            vec!["00.sna", "02.sna", "10.sna"]
        );
    }
}
