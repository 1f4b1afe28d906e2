//! Per-entry file storage

use crate::domain::{FilenameScheme, JournalEntry, ENTRY_EXTENSION};
use crate::error::{JotterError, Result};
use crate::infrastructure::codec;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Marker in the names of in-flight temp files
const TEMP_MARKER: &str = ".jotter-tmp-";

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// An entry together with the file it was read from
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEntry {
    pub path: PathBuf,
    pub entry: JournalEntry,
}

/// Reads and writes one file per entry under a root directory
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    scheme: FilenameScheme,
}

impl FileStore {
    pub fn new(root: PathBuf, scheme: FilenameScheme) -> Self {
        FileStore { root, scheme }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scheme(&self) -> FilenameScheme {
        self.scheme
    }

    /// Create the root directory (and parents) if it is missing
    pub fn ensure_root(&self) -> Result<()> {
        if !self.root.is_dir() {
            fs::create_dir_all(&self.root)?;
            debug!(root = %self.root.display(), "created storage root");
        }
        Ok(())
    }

    pub fn filename_for(&self, entry: &JournalEntry) -> String {
        self.scheme.filename_for(entry)
    }

    pub fn path_for(&self, entry: &JournalEntry) -> PathBuf {
        self.root.join(self.filename_for(entry))
    }

    /// Check if the file this entry would be written to already exists
    pub fn exists(&self, entry: &JournalEntry) -> bool {
        self.path_for(entry).exists()
    }

    /// Encode and atomically write an entry, returning the file written
    pub fn write(&self, entry: &JournalEntry) -> Result<PathBuf> {
        self.ensure_root()?;
        let path = self.path_for(entry);
        let bytes = codec::encode(entry)?;
        write_atomic(&path, &bytes)?;
        debug!(id = %entry.id(), path = %path.display(), "wrote entry");
        Ok(path)
    }

    /// Read and decode a single entry file
    pub fn read(&self, path: &Path) -> Result<JournalEntry> {
        read_entry(path)
    }

    /// Delete the file for an entry; `NotFound` if it is already gone
    pub fn delete(&self, entry: &JournalEntry) -> Result<()> {
        self.delete_path(&self.path_for(entry))
    }

    /// Delete a specific entry file; `NotFound` if it is already gone
    pub fn delete_path(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                JotterError::NotFound(path.to_path_buf())
            } else {
                JotterError::Io(e)
            }
        })?;
        debug!(path = %path.display(), "deleted entry file");
        Ok(())
    }

    /// Decode every entry file directly under the root
    pub fn list_all(&self) -> Result<Vec<StoredEntry>> {
        self.ensure_root()?;
        Self::list_entries(&self.root)
    }

    /// Decode every entry file directly under `dir`.
    ///
    /// Files that cannot be read or decoded are logged and skipped.
    pub fn list_entries(dir: &Path) -> Result<Vec<StoredEntry>> {
        let mut stored = Vec::new();

        for path in Self::list_files(dir, false)? {
            match read_entry(&path) {
                Ok(entry) => stored.push(StoredEntry { path, entry }),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping unreadable entry file");
                }
            }
        }

        Ok(stored)
    }

    /// Paths of entry files under `dir`, sorted by path.
    ///
    /// Non-recursive listing only looks at `dir` itself; recursive listing
    /// descends into subdirectories but skips hidden ones.
    pub fn list_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
        let mut files = if recursive {
            collect_recursive(dir)
        } else {
            collect_flat(dir)?
        };
        files.sort();
        Ok(files)
    }
}

/// Whether a path names a finished entry file
pub fn is_entry_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') || name.contains(TEMP_MARKER) {
        return false;
    }
    path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION)
}

fn collect_flat(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let Ok(entry) = entry else {
            continue;
        };
        let path = entry.path();
        if path.is_file() && is_entry_file(&path) {
            files.push(path);
        }
    }

    Ok(files)
}

fn collect_recursive(dir: &Path) -> Vec<PathBuf> {
    let walker = WalkDir::new(dir).into_iter().filter_entry(|entry| {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        entry
            .file_name()
            .to_str()
            .is_none_or(|name| !name.starts_with('.'))
    });

    walker
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file() && is_entry_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect()
}

/// Read and decode one entry file
pub fn read_entry(path: &Path) -> Result<JournalEntry> {
    let bytes = fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            JotterError::NotFound(path.to_path_buf())
        } else {
            JotterError::Io(e)
        }
    })?;
    Ok(codec::decode(&bytes)?)
}

/// Write bytes so that readers see either the old file or the complete new
/// one: write a temp file in the same directory, sync it, rename into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp_name = format!(
        ".{}{}{}-{}",
        path.file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("entry"),
        TEMP_MARKER,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    );
    let tmp_path = path.with_file_name(tmp_name);

    let written = File::create(&tmp_path).and_then(|mut file| {
        file.write_all(bytes)?;
        file.sync_all()
    });
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }

    // Windows `rename` does not replace an existing destination
    #[cfg(windows)]
    {
        if path.exists() {
            fs::remove_file(path)?;
        }
    }

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(temp: &TempDir) -> FileStore {
        FileStore::new(temp.path().join("entries"), FilenameScheme::Id)
    }

    #[test]
    fn test_write_creates_root_and_file() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let entry = JournalEntry::new("Trip", "Hello world");

        let path = store.write(&entry).unwrap();

        assert!(store.root().is_dir());
        assert_eq!(path, store.root().join(format!("{}.journal", entry.id())));
        assert_eq!(store.read(&path).unwrap(), entry);
    }

    #[test]
    fn test_write_overwrites_and_leaves_no_temp_files() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let mut entry = JournalEntry::new("Trip", "one");
        store.write(&entry).unwrap();
        entry.set_content("two words");
        let path = store.write(&entry).unwrap();

        assert_eq!(store.read(&path).unwrap().content(), "two words");
        let names: Vec<_> = fs::read_dir(store.root()).unwrap().collect();
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn test_read_missing_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let result = store.read(&temp.path().join("nope.journal"));
        assert!(matches!(result, Err(JotterError::NotFound(_))));
    }

    #[test]
    fn test_read_corrupt_is_decode_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.journal");
        fs::write(&path, "not json").unwrap();
        assert!(matches!(read_entry(&path), Err(JotterError::Decode(_))));
    }

    #[test]
    fn test_delete_twice_reports_not_found() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let entry = JournalEntry::new("Trip", "");
        store.write(&entry).unwrap();

        store.delete(&entry).unwrap();
        assert!(!store.exists(&entry));

        let err = store.delete(&entry).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_list_all_skips_corrupt_and_foreign_files() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        let good = JournalEntry::new("Good", "fine");
        store.write(&good).unwrap();
        fs::write(store.root().join("broken.journal"), "{{{").unwrap();
        fs::write(store.root().join("notes.txt"), "ignored").unwrap();
        fs::write(store.root().join(".hidden.journal"), "ignored").unwrap();

        let listed = store.list_all().unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].entry, good);
        assert_eq!(listed[0].path, store.path_for(&good));
    }

    #[test]
    fn test_list_all_on_missing_root_creates_it() {
        let temp = TempDir::new().unwrap();
        let store = store(&temp);
        assert!(store.list_all().unwrap().is_empty());
        assert!(store.root().is_dir());
    }

    #[test]
    fn test_list_files_recursive_skips_hidden_dirs() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("2024").join("march")).unwrap();
        fs::create_dir_all(root.join(".trash")).unwrap();
        fs::write(root.join("a.journal"), "").unwrap();
        fs::write(root.join("2024").join("march").join("b.journal"), "").unwrap();
        fs::write(root.join(".trash").join("c.journal"), "").unwrap();

        let flat = FileStore::list_files(root, false).unwrap();
        assert_eq!(flat, vec![root.join("a.journal")]);

        let deep = FileStore::list_files(root, true).unwrap();
        assert_eq!(
            deep,
            vec![
                root.join("2024").join("march").join("b.journal"),
                root.join("a.journal"),
            ]
        );
    }

    #[test]
    fn test_title_scheme_collision_overwrites() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path().to_path_buf(), FilenameScheme::Title);
        let first = JournalEntry::new("Day one", "first");
        let second = JournalEntry::new("Day_one", "second");

        store.write(&first).unwrap();
        store.write(&second).unwrap();

        let listed = store.list_all().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].entry.id(), second.id());
    }

    #[test]
    fn test_is_entry_file() {
        assert!(is_entry_file(Path::new("/x/abc.journal")));
        assert!(!is_entry_file(Path::new("/x/abc.json")));
        assert!(!is_entry_file(Path::new("/x/.abc.journal")));
        assert!(!is_entry_file(Path::new(
            "/x/abc.journal.jotter-tmp-1-0.journal"
        )));
    }
}
