//! Bulk operations: relocation, import and export

use crate::application::StorageManager;
use crate::domain::JournalEntry;
use crate::error::{JotterError, Result};
use crate::infrastructure::file_store::write_atomic;
use crate::infrastructure::{codec, FileStore};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Outcome of importing a folder or a backup file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Entries found at the source, readable or not
    pub scanned: usize,
    pub imported: usize,
    /// Entries whose destination file (or id) already existed
    pub skipped_duplicates: usize,
    /// Entries that could not be read, decoded, validated or written
    pub failed: usize,
}

/// Outcome of moving the storage root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelocateReport {
    pub from: PathBuf,
    pub to: PathBuf,
    pub copied: usize,
    /// Files left alone because the destination already had them
    pub skipped_existing: usize,
}

enum ImportOutcome {
    Imported,
    Duplicate,
    Failed,
}

impl StorageManager {
    /// Move the journal to `new_dir`.
    ///
    /// Entry files are copied, never moved, and files already present at the
    /// destination are kept. If any copy fails, the files copied so far are
    /// removed and the storage root stays where it was. On success the new
    /// root is persisted and the collection reloaded from it.
    pub fn relocate(&mut self, new_dir: &Path) -> Result<RelocateReport> {
        let from = self.store.root().to_path_buf();
        let to = new_dir.to_path_buf();

        if same_directory(&from, &to) {
            return Ok(RelocateReport {
                from,
                to,
                copied: 0,
                skipped_existing: 0,
            });
        }

        fs::create_dir_all(&to).map_err(|e| {
            error!(to = %to.display(), error = %e, "failed to create relocation target");
            e
        })?;
        self.store.ensure_root()?;

        let mut copied_paths = Vec::new();
        let mut skipped_existing = 0;

        for source in FileStore::list_files(&from, false)? {
            let Some(name) = source.file_name() else {
                continue;
            };
            let dest = to.join(name);
            if dest.exists() {
                debug!(dest = %dest.display(), "relocation target already has file");
                skipped_existing += 1;
                continue;
            }
            if let Err(e) = fs::copy(&source, &dest) {
                error!(
                    source = %source.display(),
                    error = %e,
                    "relocation copy failed, rolling back"
                );
                rollback(&copied_paths);
                return Err(e.into());
            }
            copied_paths.push(dest);
        }

        let mut config = self.config.clone();
        config.storage_path = to.clone();
        if let Some(settings) = &self.settings {
            if let Err(e) = settings.save(&config) {
                error!(error = %e, "failed to persist new storage path, rolling back");
                rollback(&copied_paths);
                return Err(e);
            }
        }

        self.store = FileStore::new(to.clone(), config.filename_scheme);
        self.config = config;
        self.load_all()?;

        info!(
            from = %from.display(),
            to = %to.display(),
            copied = copied_paths.len(),
            skipped_existing,
            "relocated journal"
        );
        Ok(RelocateReport {
            from,
            to,
            copied: copied_paths.len(),
            skipped_existing,
        })
    }

    /// Import every entry file found in `dir` (and its subfolders when
    /// `recursive`). Entries whose file already exists in the storage root,
    /// or whose id is already loaded, are skipped rather than overwritten.
    pub fn import_from(&mut self, dir: &Path, recursive: bool) -> Result<ImportReport> {
        if !dir.is_dir() {
            return Err(JotterError::NotFound(dir.to_path_buf()));
        }
        self.store.ensure_root()?;

        let files = FileStore::list_files(dir, recursive).map_err(|e| {
            error!(dir = %dir.display(), error = %e, "failed to list import folder");
            e
        })?;

        let mut report = ImportReport::default();
        for source in files {
            report.scanned += 1;
            let bytes = match fs::read(&source) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(source = %source.display(), error = %e, "skipping unreadable import file");
                    report.failed += 1;
                    continue;
                }
            };
            let entry = match codec::decode(&bytes) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(source = %source.display(), error = %e, "skipping undecodable import file");
                    report.failed += 1;
                    continue;
                }
            };
            let outcome = self.import_one(entry, Some(bytes.as_slice()));
            report.record(outcome);
        }

        self.finish_import(&report, dir);
        Ok(report)
    }

    /// Import the entries of a batch export file with the same duplicate
    /// protection as [`import_from`](Self::import_from)
    pub fn import_backup(&mut self, file: &Path) -> Result<ImportReport> {
        let bytes = fs::read(file).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                JotterError::NotFound(file.to_path_buf())
            } else {
                JotterError::Io(e)
            }
        })?;
        let batch = codec::decode_batch(&bytes)?;
        self.store.ensure_root()?;

        let mut report = ImportReport::default();
        for decoded in batch.entries {
            report.scanned += 1;
            match decoded {
                Ok(entry) => {
                    let outcome = self.import_one(entry, None);
                    report.record(outcome);
                }
                Err(e) => {
                    warn!(file = %file.display(), error = %e, "skipping undecodable backup entry");
                    report.failed += 1;
                }
            }
        }

        self.finish_import(&report, file);
        Ok(report)
    }

    /// Write the whole collection to `destination` as one batch document
    pub fn export_all(&self, destination: &Path) -> Result<usize> {
        let bytes = codec::encode_batch(&self.entries)?;
        write_atomic(destination, &bytes).map_err(|e| {
            error!(destination = %destination.display(), error = %e, "export failed");
            e
        })?;
        info!(
            count = self.entries.len(),
            destination = %destination.display(),
            "exported entries"
        );
        Ok(self.entries.len())
    }

    /// Bring one decoded entry into the storage root.
    ///
    /// With the original bytes at hand the file is copied verbatim;
    /// otherwise the entry is encoded afresh. An imported pin never
    /// displaces the one already in the journal.
    fn import_one(&mut self, mut entry: JournalEntry, original: Option<&[u8]>) -> ImportOutcome {
        let id = entry.id();
        if self.entry(id).is_some() || self.store.exists(&entry) {
            debug!(id = %id, "import skipped duplicate");
            return ImportOutcome::Duplicate;
        }
        if let Err(e) = entry.validate() {
            warn!(id = %id, error = %e, "skipping invalid imported entry");
            return ImportOutcome::Failed;
        }

        let mut original = original;
        if entry.is_pinned && self.pinned().is_some() {
            debug!(id = %id, "import dropped pin, journal already has one");
            entry.is_pinned = false;
            original = None;
        }

        let written = match original {
            Some(bytes) => {
                let path = self.store.path_for(&entry);
                write_atomic(&path, bytes).map(|_| path)
            }
            None => self.store.write(&entry),
        };

        match written {
            Ok(path) => {
                self.paths.insert(id, path);
                self.entries.push(entry);
                ImportOutcome::Imported
            }
            Err(e) => {
                error!(id = %id, error = %e, "failed to write imported entry");
                ImportOutcome::Failed
            }
        }
    }

    fn finish_import(&mut self, report: &ImportReport, source: &Path) {
        self.sort();
        info!(
            source = %source.display(),
            scanned = report.scanned,
            imported = report.imported,
            skipped = report.skipped_duplicates,
            failed = report.failed,
            "import finished"
        );
        self.notify();
    }
}

impl ImportReport {
    fn record(&mut self, outcome: ImportOutcome) {
        match outcome {
            ImportOutcome::Imported => self.imported += 1,
            ImportOutcome::Duplicate => self.skipped_duplicates += 1,
            ImportOutcome::Failed => self.failed += 1,
        }
    }
}

fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

fn rollback(copied: &[PathBuf]) {
    for path in copied {
        if let Err(e) = fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "rollback could not remove copied file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{Config, ConfigStore};
    use tempfile::TempDir;

    fn manager_at(path: &Path) -> StorageManager {
        StorageManager::at(path)
    }

    #[test]
    fn test_relocate_copies_and_switches() {
        let temp = TempDir::new().unwrap();
        let old_root = temp.path().join("old");
        let new_root = temp.path().join("new").join("nested");
        let mut manager = manager_at(&old_root);
        let entry = JournalEntry::new("Trip", "Hello world");
        manager.create(entry.clone()).unwrap();

        let report = manager.relocate(&new_root).unwrap();

        assert_eq!(report.copied, 1);
        assert_eq!(report.skipped_existing, 0);
        assert_eq!(manager.storage_path(), new_root.as_path());
        assert!(manager.entry(entry.id()).is_some());
        // Non-destructive: the old copy stays
        assert!(old_root.join(format!("{}.journal", entry.id())).exists());
        assert!(new_root.join(format!("{}.journal", entry.id())).exists());
    }

    #[test]
    fn test_relocate_keeps_existing_destination_files() {
        let temp = TempDir::new().unwrap();
        let old_root = temp.path().join("old");
        let new_root = temp.path().join("new");
        let mut manager = manager_at(&old_root);
        let mut entry = JournalEntry::new("Trip", "old text");
        manager.create(entry.clone()).unwrap();

        // Destination already holds a newer copy of the same entry
        entry.set_content("newer text here");
        FileStore::new(new_root.clone(), manager.config().filename_scheme)
            .write(&entry)
            .unwrap();

        let report = manager.relocate(&new_root).unwrap();

        assert_eq!(report.copied, 0);
        assert_eq!(report.skipped_existing, 1);
        assert_eq!(
            manager.entry(entry.id()).unwrap().content(),
            "newer text here"
        );
    }

    #[test]
    fn test_relocate_persists_storage_path() {
        let temp = TempDir::new().unwrap();
        let settings = ConfigStore::new(temp.path().join("config"));
        let config = Config {
            storage_path: temp.path().join("old"),
            ..Config::default()
        };
        settings.save(&config).unwrap();

        let mut manager = StorageManager::open(settings.clone()).unwrap();
        manager.create(JournalEntry::new("Trip", "")).unwrap();
        manager.relocate(&temp.path().join("moved")).unwrap();

        let reopened = StorageManager::open(settings).unwrap();
        assert_eq!(reopened.storage_path(), temp.path().join("moved").as_path());
        assert_eq!(reopened.entries().len(), 1);
    }

    fn journal_files(dir: &Path) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "journal"))
            .filter(|p| p.symlink_metadata().unwrap().is_file())
            .collect();
        files.sort();
        files
    }

    #[cfg(unix)]
    #[test]
    fn test_relocate_copy_failure_rolls_back() {
        let temp = TempDir::new().unwrap();
        let old_root = temp.path().join("old");
        let new_root = temp.path().join("new");
        let mut manager = manager_at(&old_root);
        manager.create(JournalEntry::new("One", "first")).unwrap();
        manager.create(JournalEntry::new("Two", "second")).unwrap();

        // The last file by name cannot be written at the destination
        let sources = journal_files(&old_root);
        fs::create_dir_all(&new_root).unwrap();
        let blocked = new_root.join(sources[1].file_name().unwrap());
        std::os::unix::fs::symlink(new_root.join("missing").join("target"), &blocked).unwrap();

        assert!(manager.relocate(&new_root).is_err());

        assert!(journal_files(&new_root).is_empty());
        assert_eq!(manager.storage_path(), old_root.as_path());
        assert_eq!(manager.entries().len(), 2);
        assert_eq!(journal_files(&old_root).len(), 2);
    }

    #[test]
    fn test_relocate_settings_failure_rolls_back() {
        let temp = TempDir::new().unwrap();
        let old_root = temp.path().join("old");
        let new_root = temp.path().join("new");
        // A regular file where the settings directory should be
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let config = Config {
            storage_path: old_root.clone(),
            ..Config::default()
        };
        let mut manager =
            StorageManager::new(config, Some(ConfigStore::new(blocker.join("config"))));
        manager.create(JournalEntry::new("Trip", "Hello world")).unwrap();

        assert!(manager.relocate(&new_root).is_err());

        assert!(journal_files(&new_root).is_empty());
        assert_eq!(manager.storage_path(), old_root.as_path());
        assert_eq!(manager.config().storage_path, old_root);
        assert_eq!(manager.entries().len(), 1);
    }

    #[test]
    fn test_relocate_to_same_directory_is_noop() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager_at(temp.path());
        manager.create(JournalEntry::new("Trip", "")).unwrap();

        let report = manager.relocate(temp.path()).unwrap();

        assert_eq!(report.copied, 0);
        assert_eq!(manager.entries().len(), 1);
    }

    #[test]
    fn test_import_skips_existing_files() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager_at(&temp.path().join("root"));
        let existing = JournalEntry::new("Kept", "original words");
        manager.create(existing.clone()).unwrap();

        let source = temp.path().join("source");
        let source_store = FileStore::new(source.clone(), manager.config().filename_scheme);
        let mut conflicting = existing.clone();
        conflicting.set_content("imported words must not win");
        source_store.write(&conflicting).unwrap();
        let fresh = JournalEntry::new("Fresh", "brand new");
        source_store.write(&fresh).unwrap();

        let report = manager.import_from(&source, false).unwrap();

        assert_eq!(
            report,
            ImportReport {
                scanned: 2,
                imported: 1,
                skipped_duplicates: 1,
                failed: 0,
            }
        );
        assert_eq!(manager.entries().len(), 2);
        assert_eq!(
            manager.entry(existing.id()).unwrap().content(),
            "original words"
        );

        manager.load_all().unwrap();
        assert_eq!(manager.entries().len(), 2);
        assert_eq!(
            manager.entry(existing.id()).unwrap().content(),
            "original words"
        );
    }

    #[test]
    fn test_import_counts_corrupt_files() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager_at(&temp.path().join("root"));
        let source = temp.path().join("source");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("broken.journal"), "{ nope").unwrap();
        fs::write(source.join("readme.md"), "ignored").unwrap();

        let report = manager.import_from(&source, false).unwrap();

        assert_eq!(report.scanned, 1);
        assert_eq!(report.failed, 1);
        assert!(manager.entries().is_empty());
    }

    #[test]
    fn test_import_recursive() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager_at(&temp.path().join("root"));
        let nested = temp.path().join("source").join("2024");
        FileStore::new(nested, manager.config().filename_scheme)
            .write(&JournalEntry::new("Deep", ""))
            .unwrap();

        let flat = manager
            .import_from(&temp.path().join("source"), false)
            .unwrap();
        assert_eq!(flat.scanned, 0);

        let deep = manager
            .import_from(&temp.path().join("source"), true)
            .unwrap();
        assert_eq!(deep.imported, 1);
        assert_eq!(manager.entries()[0].title, "Deep");
    }

    #[test]
    fn test_import_missing_folder_fails() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager_at(temp.path());
        let result = manager.import_from(&temp.path().join("nope"), false);
        assert!(matches!(result, Err(JotterError::NotFound(_))));
    }

    #[test]
    fn test_import_does_not_displace_pin() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager_at(&temp.path().join("root"));
        let mut mine = JournalEntry::new("Mine", "");
        mine.is_pinned = true;
        manager.create(mine.clone()).unwrap();

        let mut theirs = JournalEntry::new("Theirs", "");
        theirs.is_pinned = true;
        FileStore::new(temp.path().join("source"), manager.config().filename_scheme)
            .write(&theirs)
            .unwrap();

        manager
            .import_from(&temp.path().join("source"), false)
            .unwrap();

        assert_eq!(manager.pinned().unwrap().id(), mine.id());
        manager.load_all().unwrap();
        assert_eq!(manager.entries().iter().filter(|e| e.is_pinned).count(), 1);
    }

    #[test]
    fn test_export_then_import_backup() {
        let temp = TempDir::new().unwrap();
        let mut source = manager_at(&temp.path().join("a"));
        source.create(JournalEntry::new("One", "first")).unwrap();
        source.create(JournalEntry::new("Two", "second one")).unwrap();
        let backup = temp.path().join("backup.json");

        assert_eq!(source.export_all(&backup).unwrap(), 2);

        let mut target = manager_at(&temp.path().join("b"));
        let report = target.import_backup(&backup).unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(target.entries(), source.entries());

        let again = target.import_backup(&backup).unwrap();
        assert_eq!(again.imported, 0);
        assert_eq!(again.skipped_duplicates, 2);
        assert_eq!(target.entries().len(), 2);
    }

    #[test]
    fn test_export_is_not_an_entry_file() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager_at(&temp.path().join("root"));
        manager.create(JournalEntry::new("One", "")).unwrap();
        let backup = temp.path().join("backup.json");
        manager.export_all(&backup).unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&fs::read(&backup).unwrap()).unwrap();
        assert_eq!(json["format"], codec::BATCH_FORMAT);
        assert_eq!(json["entries"].as_array().unwrap().len(), 1);
        assert!(codec::decode(&fs::read(&backup).unwrap()).is_err());
    }

    #[test]
    fn test_import_backup_missing_file() {
        let temp = TempDir::new().unwrap();
        let mut manager = manager_at(temp.path());
        let result = manager.import_backup(&temp.path().join("missing.json"));
        assert!(matches!(result, Err(JotterError::NotFound(_))));
    }
}
