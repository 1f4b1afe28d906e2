//! Thread-safe handle to a single storage manager

use crate::application::{ImportReport, RelocateReport, StorageManager};
use crate::domain::JournalEntry;
use crate::error::Result;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

/// Cloneable handle that serializes every operation on one manager.
///
/// Each call holds the lock for its whole duration, so bulk operations
/// (import, relocate) never interleave with per-entry writes, and a write
/// that returned is visible to the next read from any thread. Observer
/// callbacks run under the lock and must not call back into the handle.
#[derive(Clone)]
pub struct SharedStorageManager {
    inner: Arc<Mutex<StorageManager>>,
}

impl SharedStorageManager {
    pub fn new(manager: StorageManager) -> Self {
        SharedStorageManager {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StorageManager> {
        // A panic inside an observer must not take the journal down with it
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with exclusive access to the manager
    pub fn with<R>(&self, f: impl FnOnce(&mut StorageManager) -> R) -> R {
        f(&mut self.lock())
    }

    /// Copy of the current collection, newest first
    pub fn snapshot(&self) -> Vec<JournalEntry> {
        self.lock().entries().to_vec()
    }

    pub fn entry(&self, id: Uuid) -> Option<JournalEntry> {
        self.lock().entry(id).cloned()
    }

    pub fn load_all(&self) -> Result<usize> {
        self.lock().load_all()
    }

    pub fn create(&self, entry: JournalEntry) -> Result<()> {
        self.lock().create(entry)
    }

    pub fn update(&self, old: &JournalEntry, new: JournalEntry) -> Result<()> {
        self.lock().update(old, new)
    }

    pub fn set_pinned(&self, id: Uuid, pinned: bool) -> Result<()> {
        self.lock().set_pinned(id, pinned)
    }

    pub fn delete(&self, entry: &JournalEntry) -> Result<bool> {
        self.lock().delete(entry)
    }

    pub fn relocate(&self, new_dir: &Path) -> Result<RelocateReport> {
        self.lock().relocate(new_dir)
    }

    pub fn import_from(&self, dir: &Path, recursive: bool) -> Result<ImportReport> {
        self.lock().import_from(dir, recursive)
    }

    pub fn import_backup(&self, file: &Path) -> Result<ImportReport> {
        self.lock().import_backup(file)
    }

    pub fn export_all(&self, destination: &Path) -> Result<usize> {
        self.lock().export_all(destination)
    }
}
