//! Loading and atomically rewriting the catalogue file.

use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use photo_core::Result;

use crate::codec::{parse, serialize, ParseReport};
use crate::store::PhotoStore;

impl PhotoStore {
    /// Load a catalogue file.
    ///
    /// A missing file yields an empty store, so the first scan can create it.
    /// Malformed lines are skipped and listed in the returned report. Invalid
    /// UTF-8 is replaced and flagged with [`ParseReport::lossy`]; callers
    /// should keep a backup before saving over such a file.
    pub fn open(path: impl AsRef<Path>) -> Result<(Self, ParseReport)> {
        let path = path.as_ref();

        if !path.exists() {
            info!("No catalogue at {:?}; starting empty", path);
            return Ok((Self::new(), ParseReport::default()));
        }

        let bytes = fs::read(path)?;
        let (text, lossy) = match String::from_utf8(bytes) {
            Ok(text) => (text, false),
            Err(e) => {
                warn!("Catalogue {:?} is not valid UTF-8; replacing bad bytes", path);
                (String::from_utf8_lossy(e.as_bytes()).into_owned(), true)
            }
        };

        let (store, mut report) = parse(&text);
        report.lossy = lossy;
        info!(
            "Loaded {} photos and {} concepts from {:?} ({} warnings)",
            store.photo_count(),
            store.concepts().count(),
            path,
            report.warnings.len()
        );

        Ok((store, report))
    }

    /// Rewrite the catalogue file as a whole.
    ///
    /// The text goes to a temporary file in the target directory which then
    /// replaces the target, so an interrupted write leaves the old file
    /// intact. With `backup`, the old file is first copied to `<file>.bak`.
    /// The new file keeps the permissions of the one it replaces.
    pub fn save(&self, path: impl AsRef<Path>, backup: bool) -> Result<()> {
        let path = path.as_ref();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        if backup && path.exists() {
            let backup_path = backup_path(path);
            fs::copy(path, &backup_path)?;
            info!("Backed up catalogue to {:?}", backup_path);
        }

        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(serialize(self).as_bytes())?;
        if let Ok(existing) = fs::metadata(path) {
            tmp.as_file().set_permissions(existing.permissions())?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| e.error)?;

        info!("Saved {} photos to {:?}", self.photo_count(), path);
        Ok(())
    }
}

/// `<file>.bak` next to the catalogue.
pub(crate) fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let (store, report) = PhotoStore::open(dir.path().join("photos.db")).unwrap();
        assert!(store.is_empty());
        assert!(report.is_clean());
    }

    #[test]
    fn test_save_and_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("photos.db");

        let mut store = PhotoStore::new();
        let id = store.add_photo("abc", "a.jpg").unwrap();
        store.tag_photo(id, "cat").unwrap();
        store.save(&path, false).unwrap();

        let (loaded, report) = PhotoStore::open(&path).unwrap();
        assert!(report.is_clean());
        assert_eq!(loaded.photos(), store.photos());

        // Only the catalogue itself is left behind.
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photos.db");
        fs::write(&path, "0 \"old\"\n\nd0 \"old.jpg\"\nd1 \"older.jpg\"\n").unwrap();

        let mut store = PhotoStore::new();
        store.add_photo("d9", "new.jpg").unwrap();
        store.save(&path, false).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "\nd9 \"new.jpg\"\n");
        assert!(!backup_path(&path).exists());
    }

    #[test]
    fn test_save_with_backup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photos.db");
        let old = "\nd0 \"old.jpg\"\n";
        fs::write(&path, old).unwrap();

        PhotoStore::new().save(&path, true).unwrap();

        assert_eq!(fs::read_to_string(backup_path(&path)).unwrap(), old);
        assert_eq!(fs::read_to_string(&path).unwrap(), "\n");
    }

    #[test]
    fn test_open_reports_damaged_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photos.db");
        fs::write(&path, "0 \"cat\"\n\nd0 \"a.jpg\" -tags 0\ngarbage\nd1 \"b.jpg\"\n").unwrap();

        let (store, report) = PhotoStore::open(&path).unwrap();
        assert_eq!(store.photo_count(), 2);
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].line, 4);
    }

    #[test]
    fn test_open_lossy_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photos.db");
        fs::write(&path, b"\nd0 \"caf\xe9.jpg\"\n").unwrap();

        let (store, report) = PhotoStore::open(&path).unwrap();
        assert_eq!(store.photo_count(), 1);
        assert!(store.photo(0).unwrap().relative_path().starts_with("caf"));
        assert!(report.lossy);
        assert!(report.warnings.is_empty());
        assert!(!report.is_clean());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("photos.db");
        fs::write(&path, "\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        PhotoStore::new().save(&path, false).unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
