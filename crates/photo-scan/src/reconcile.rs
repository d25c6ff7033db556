//! Merging a directory tree into a record store.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use photo_core::{check_quotable, ContentDigest, Id, PhotoError, Result, ScanConfig};
use photo_store::PhotoStore;

/// A photo file found under the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Absolute (or root-prefixed) path used to read the file.
    pub path: PathBuf,

    /// `/`-separated path relative to the scan root.
    pub relative_path: String,
}

/// A candidate together with its content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub candidate: Candidate,
    pub digest: String,
}

/// A file left out of the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Photo files found.
    pub candidates: usize,

    /// Records created for new content.
    pub added: usize,

    /// Records moved to a new path.
    pub relocated: usize,

    /// Records found where the store expected them.
    pub unchanged: usize,

    /// Extra copies of content already claimed this scan.
    pub duplicates: usize,

    /// Files that could not be listed, read, or stored.
    pub skipped: Vec<SkippedFile>,
}

impl ScanReport {
    fn skip(&mut self, path: impl Into<PathBuf>, reason: impl Into<String>) {
        let skipped = SkippedFile {
            path: path.into(),
            reason: reason.into(),
        };
        warn!("Skipping {:?}: {}", skipped.path, skipped.reason);
        self.skipped.push(skipped);
    }
}

/// Walks a photo tree and merges what it finds into a store.
///
/// A scan runs in three steps: [`discover`](Self::discover) lists candidate
/// files, [`fingerprint`](Self::fingerprint) digests them without touching the
/// store, and [`merge`](Self::merge) is the single step that mutates it.
pub struct Reconciler<D> {
    /// Content fingerprint function.
    digest: D,

    /// Which files count as photos.
    config: ScanConfig,
}

impl<D: ContentDigest> Reconciler<D> {
    /// Create a reconciler.
    pub fn new(digest: D, config: ScanConfig) -> Self {
        Self { digest, config }
    }

    /// Scan `root` and merge the photos found into `store`.
    ///
    /// Files that vanish from disk keep their records. Unreadable files are
    /// reported and skipped.
    pub fn scan(&self, root: &Path, store: &mut PhotoStore) -> Result<ScanReport> {
        info!("Scanning {:?}", root);

        let mut report = ScanReport::default();
        let candidates = self.discover(root, &mut report)?;
        report.candidates = candidates.len();

        let fingerprints = self.fingerprint(candidates, &mut report);
        self.merge(store, fingerprints, &mut report);

        info!(
            "Scan complete: {} files, {} new, {} moved, {} unchanged, {} duplicates, {} skipped",
            report.candidates,
            report.added,
            report.relocated,
            report.unchanged,
            report.duplicates,
            report.skipped.len()
        );

        Ok(report)
    }

    /// List photo files under `root`, in file-name order.
    pub fn discover(&self, root: &Path, report: &mut ScanReport) -> Result<Vec<Candidate>> {
        if !root.is_dir() {
            return Err(PhotoError::walk(format!("{} is not a directory", root.display())));
        }

        let mut candidates = Vec::new();
        let walker = WalkDir::new(root)
            .follow_links(self.config.follow_links)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
                    report.skip(path, e.to_string());
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }
            if self.config.skip_hidden && entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let is_photo = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| self.config.accepts_extension(ext));
            if !is_photo {
                continue;
            }

            let relative_path = match relative_to(root, entry.path()) {
                Some(rel) => rel,
                None => {
                    report.skip(entry.path(), "path is not valid UTF-8");
                    continue;
                }
            };
            if let Err(e) = check_quotable(&relative_path) {
                report.skip(entry.path(), e.to_string());
                continue;
            }

            candidates.push(Candidate {
                path: entry.into_path(),
                relative_path,
            });
        }

        debug!("Found {} candidate files under {:?}", candidates.len(), root);
        Ok(candidates)
    }

    /// Digest every candidate. Files that cannot be read are reported.
    pub fn fingerprint(&self, candidates: Vec<Candidate>, report: &mut ScanReport) -> Vec<Fingerprint> {
        let mut fingerprints = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            match self.digest.digest(&candidate.path) {
                Ok(digest) => {
                    debug!("{} {}", digest, candidate.relative_path);
                    fingerprints.push(Fingerprint { candidate, digest });
                }
                Err(e) => report.skip(candidate.path, e.to_string()),
            }
        }

        fingerprints
    }

    /// Merge fingerprints into the store.
    ///
    /// Files still at their recorded path are settled first, so a copy of an
    /// unmoved photo cannot take over its record. Each record is claimed by
    /// at most one file per scan; later files with the same digest count as
    /// duplicates.
    pub fn merge(&self, store: &mut PhotoStore, fingerprints: Vec<Fingerprint>, report: &mut ScanReport) {
        let mut claimed: HashSet<Id> = HashSet::new();

        let (in_place, moved): (Vec<_>, Vec<_>) = fingerprints.into_iter().partition(|fp| {
            store
                .find_by_digest(&fp.digest)
                .is_some_and(|photo| photo.relative_path() == fp.candidate.relative_path)
        });

        for fp in in_place {
            if let Some(photo) = store.find_by_digest(&fp.digest) {
                claimed.insert(photo.id());
                report.unchanged += 1;
            }
        }

        for fp in moved {
            let Fingerprint { candidate, digest } = fp;
            let existing = store.find_by_digest(&digest).map(|photo| photo.id());

            match existing {
                Some(id) if claimed.contains(&id) => {
                    debug!("{} duplicates photo {}", candidate.relative_path, id);
                    report.duplicates += 1;
                }
                Some(id) => match store.relocate_photo(id, candidate.relative_path.clone()) {
                    Ok(()) => {
                        info!("Photo {} moved to {}", id, candidate.relative_path);
                        claimed.insert(id);
                        report.relocated += 1;
                    }
                    Err(e) => report.skip(candidate.path, e.to_string()),
                },
                None => match store.add_photo(digest, candidate.relative_path.clone()) {
                    Ok(id) => {
                        debug!("New photo {}: {}", id, candidate.relative_path);
                        claimed.insert(id);
                        report.added += 1;
                    }
                    Err(e) => report.skip(candidate.path, e.to_string()),
                },
            }
        }
    }
}

/// `/`-joined path of `path` below `root`, or None if not valid UTF-8.
fn relative_to(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts = rel
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_str()),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Digest that is the file's own text, for readable assertions.
    struct TextDigest;

    impl ContentDigest for TextDigest {
        fn digest(&self, path: &Path) -> Result<String> {
            Ok(format!("h-{}", fs::read_to_string(path)?.trim()))
        }
    }

    /// Refuses to read files named `a.jpg`.
    struct PickyDigest;

    impl ContentDigest for PickyDigest {
        fn digest(&self, path: &Path) -> Result<String> {
            if path.ends_with("a.jpg") {
                return Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "locked").into());
            }
            TextDigest.digest(path)
        }
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn reconciler() -> Reconciler<TextDigest> {
        Reconciler::new(TextDigest, ScanConfig::default())
    }

    #[test]
    fn test_scan_adds_new_photos() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.jpg", "one");
        write(dir.path(), "sub/b.PNG", "two");
        write(dir.path(), "notes.txt", "three");
        write(dir.path(), ".hidden.jpg", "four");

        let mut store = PhotoStore::new();
        let report = reconciler().scan(dir.path(), &mut store).unwrap();

        assert_eq!(report.candidates, 2);
        assert_eq!(report.added, 2);
        assert_eq!(store.photo_count(), 2);
        assert_eq!(store.find_by_digest("h-one").unwrap().relative_path(), "a.jpg");
        assert_eq!(store.find_by_digest("h-two").unwrap().relative_path(), "sub/b.PNG");
    }

    #[test]
    fn test_rescan_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.jpg", "one");
        write(dir.path(), "b.jpeg", "two");

        let mut store = PhotoStore::new();
        reconciler().scan(dir.path(), &mut store).unwrap();
        let before = store.photos().to_vec();

        let report = reconciler().scan(dir.path(), &mut store).unwrap();
        assert_eq!(report.unchanged, 2);
        assert_eq!(report.added, 0);
        assert_eq!(store.photos(), before.as_slice());
    }

    #[test]
    fn test_rename_keeps_record_and_tags() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PhotoStore::new();
        let id = store.add_photo("h-one", "a.jpg").unwrap();
        store.tag_photo(id, "cat").unwrap();

        write(dir.path(), "b/a.jpg", "one");
        let report = reconciler().scan(dir.path(), &mut store).unwrap();

        assert_eq!(report.relocated, 1);
        assert_eq!(report.added, 0);
        assert_eq!(store.photo_count(), 1);

        let photo = store.find_by_digest("h-one").unwrap();
        assert_eq!(photo.id(), id);
        assert_eq!(photo.relative_path(), "b/a.jpg");
        assert!(photo.has_tag(store.concept_id("cat").unwrap()));
        assert!(store.find_by_path("a.jpg").is_none());
        assert_eq!(store.find_by_path("b/a.jpg").unwrap().id(), id);
    }

    #[test]
    fn test_one_new_file_adds_one_record() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.jpg", "one");
        write(dir.path(), "b.jpg", "two");

        let mut store = PhotoStore::new();
        reconciler().scan(dir.path(), &mut store).unwrap();
        let known: Vec<String> = store.photos().iter().map(|p| p.digest().to_string()).collect();

        write(dir.path(), "c.jpg", "three");
        let report = reconciler().scan(dir.path(), &mut store).unwrap();

        assert_eq!(report.added, 1);
        assert_eq!(report.unchanged, 2);
        assert_eq!(report.relocated, 0);
        assert_eq!(store.photo_count(), 3);
        let new = store.photo(2).unwrap();
        assert!(!known.iter().any(|d| d == new.digest()));
    }

    #[test]
    fn test_missing_files_keep_records() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PhotoStore::new();
        let id = store.add_photo("h-gone", "gone.jpg").unwrap();
        store.tag_photo(id, "old").unwrap();

        write(dir.path(), "new.jpg", "fresh");
        reconciler().scan(dir.path(), &mut store).unwrap();

        assert_eq!(store.photo_count(), 2);
        let gone = store.find_by_digest("h-gone").unwrap();
        assert_eq!(gone.relative_path(), "gone.jpg");
        assert_eq!(gone.tags().len(), 1);
    }

    #[test]
    fn test_copy_does_not_steal_record() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PhotoStore::new();
        let id = store.add_photo("h-one", "z/orig.jpg").unwrap();

        // The copy sorts first in traversal order.
        write(dir.path(), "a/copy.jpg", "one");
        write(dir.path(), "z/orig.jpg", "one");
        let report = reconciler().scan(dir.path(), &mut store).unwrap();

        assert_eq!(report.unchanged, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(store.photo_count(), 1);
        assert_eq!(store.photo(id).unwrap().relative_path(), "z/orig.jpg");
    }

    #[test]
    fn test_identical_new_files_make_one_record() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.jpg", "same");
        write(dir.path(), "b.jpg", "same");

        let mut store = PhotoStore::new();
        let report = reconciler().scan(dir.path(), &mut store).unwrap();

        assert_eq!(report.added, 1);
        assert_eq!(report.duplicates, 1);
        assert_eq!(store.photos()[0].relative_path(), "a.jpg");
    }

    #[test]
    fn test_unreadable_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.jpg", "one");
        write(dir.path(), "b.jpg", "two");

        let mut store = PhotoStore::new();
        let report = Reconciler::new(PickyDigest, ScanConfig::default())
            .scan(dir.path(), &mut store)
            .unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("a.jpg"));
        assert_eq!(report.added, 1);
        assert_eq!(store.photo_count(), 1);
    }

    #[test]
    fn test_unquotable_path_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "say \"hi\".jpg", "one");

        let mut store = PhotoStore::new();
        let report = reconciler().scan(dir.path(), &mut store).unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_hidden_files_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".a.jpg", "one");

        let config = ScanConfig {
            skip_hidden: false,
            ..ScanConfig::default()
        };
        let mut store = PhotoStore::new();
        Reconciler::new(TextDigest, config).scan(dir.path(), &mut store).unwrap();
        assert_eq!(store.photo_count(), 1);
    }

    #[test]
    fn test_scan_root_must_be_directory() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PhotoStore::new();
        let err = reconciler().scan(&dir.path().join("nope"), &mut store).unwrap_err();
        assert_eq!(err.error_code(), "WALK_ERROR");
    }

    #[test]
    fn test_scan_with_blake3() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "x/y.jpg", "pixels");

        let mut store = PhotoStore::new();
        Reconciler::new(crate::Blake3Digest, ScanConfig::default())
            .scan(dir.path(), &mut store)
            .unwrap();

        let digest = blake3::hash(b"pixels").to_hex().to_string();
        assert_eq!(store.find_by_digest(&digest).unwrap().relative_path(), "x/y.jpg");
    }

    #[test]
    fn test_relative_to() {
        let root = Path::new("/photos");
        assert_eq!(relative_to(root, Path::new("/photos/a/b.jpg")).unwrap(), "a/b.jpg");
        assert!(relative_to(root, Path::new("/elsewhere/b.jpg")).is_none());
    }
}
