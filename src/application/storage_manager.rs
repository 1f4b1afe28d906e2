//! In-process authority over the entry collection
//!
//! The manager owns the sorted in-memory collection and mediates every write
//! to the [`FileStore`], so the two views never diverge for longer than one
//! operation. Disk failures are logged here and returned to the caller; they
//! never leave the collection half-updated.

use crate::domain::{JournalEntry, JournalStats};
use crate::error::{JotterError, Result};
use crate::infrastructure::{Config, ConfigStore, FileStore};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Handle returned by [`StorageManager::subscribe`]
pub type SubscriptionId = u64;

type Observer = Box<dyn Fn(&[JournalEntry]) + Send>;

pub struct StorageManager {
    pub(crate) store: FileStore,
    pub(crate) config: Config,
    pub(crate) settings: Option<ConfigStore>,
    pub(crate) entries: Vec<JournalEntry>,
    /// File each entry was last read from or written to
    pub(crate) paths: HashMap<Uuid, PathBuf>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: SubscriptionId,
}

impl StorageManager {
    /// Create a manager over `config.storage_path`. Nothing is loaded yet.
    ///
    /// When `settings` is given, relocations are persisted there.
    pub fn new(config: Config, settings: Option<ConfigStore>) -> Self {
        StorageManager {
            store: FileStore::new(config.storage_path.clone(), config.filename_scheme),
            config,
            settings,
            entries: Vec::new(),
            paths: HashMap::new(),
            observers: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Load the persisted config and every entry under its storage root
    pub fn open(settings: ConfigStore) -> Result<Self> {
        let config = settings.load()?;
        let mut manager = StorageManager::new(config, Some(settings));
        manager.load_all()?;
        Ok(manager)
    }

    /// Manager over a bare directory with default settings and no persistence
    pub fn at(root: impl Into<PathBuf>) -> Self {
        let config = Config {
            storage_path: root.into(),
            ..Config::default()
        };
        StorageManager::new(config, None)
    }

    pub fn storage_path(&self) -> &Path {
        self.store.root()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current collection, newest first
    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    pub fn entry(&self, id: Uuid) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.id() == id)
    }

    /// Resolve a full id or any unique prefix of one
    pub fn find(&self, id_or_prefix: &str) -> Result<&JournalEntry> {
        let needle = id_or_prefix.trim().to_lowercase();
        if needle.is_empty() {
            return Err(JotterError::EntryNotFound(id_or_prefix.to_string()));
        }

        let mut matches = self
            .entries
            .iter()
            .filter(|e| e.id().to_string().starts_with(&needle));

        match (matches.next(), matches.next()) {
            (Some(entry), None) => Ok(entry),
            (Some(_), Some(_)) => Err(JotterError::AmbiguousId(id_or_prefix.to_string())),
            (None, _) => Err(JotterError::EntryNotFound(id_or_prefix.to_string())),
        }
    }

    /// The pinned entry, if any
    pub fn pinned(&self) -> Option<&JournalEntry> {
        self.entries.iter().find(|e| e.is_pinned)
    }

    pub fn stats(&self) -> JournalStats {
        JournalStats::compute(&self.entries)
    }

    /// Replace the collection with what is on disk.
    ///
    /// Unreadable files are skipped. If two files carry the same id the
    /// first by path wins. When the root itself cannot be listed the
    /// collection is left as it was.
    pub fn load_all(&mut self) -> Result<usize> {
        let stored = self.store.list_all().map_err(|e| {
            error!(root = %self.store.root().display(), error = %e, "failed to list entries");
            e
        })?;

        let mut entries = Vec::with_capacity(stored.len());
        let mut paths: HashMap<Uuid, PathBuf> = HashMap::with_capacity(stored.len());
        for item in stored {
            let id = item.entry.id();
            if let Some(kept) = paths.get(&id) {
                warn!(
                    id = %id,
                    kept = %kept.display(),
                    ignored = %item.path.display(),
                    "duplicate entry id on disk"
                );
                continue;
            }
            paths.insert(id, item.path);
            entries.push(item.entry);
        }

        self.entries = entries;
        self.paths = paths;
        self.enforce_single_pin();
        self.sort();
        info!(count = self.entries.len(), root = %self.store.root().display(), "loaded entries");
        self.notify();
        Ok(self.entries.len())
    }

    /// Persist a new entry and add it to the collection
    pub fn create(&mut self, entry: JournalEntry) -> Result<()> {
        if self.entry(entry.id()).is_some() {
            return Err(JotterError::InvalidEntry(format!(
                "entry {} already exists",
                entry.id()
            )));
        }
        entry.validate()?;
        self.ensure_file_free(&entry)?;

        let path = self.store.write(&entry).map_err(|e| {
            error!(id = %entry.id(), error = %e, "failed to write new entry");
            e
        })?;

        let id = entry.id();
        let pinned = entry.is_pinned;
        self.paths.insert(id, path);
        self.entries.push(entry);
        if pinned {
            self.clear_other_pins(id);
        }
        self.sort();
        debug!(id = %id, "created entry");
        self.notify();
        Ok(())
    }

    /// Replace `old` with `new` (same id) on disk and in memory.
    ///
    /// The new file is written first; the file `old` lived in is removed
    /// afterwards if the name changed. Pinning `new` unpins every other entry.
    pub fn update(&mut self, old: &JournalEntry, new: JournalEntry) -> Result<()> {
        if old.id() != new.id() {
            return Err(JotterError::InvalidEntry(format!(
                "cannot update entry {} with entry {}",
                old.id(),
                new.id()
            )));
        }
        let id = new.id();
        let Some(index) = self.entries.iter().position(|e| e.id() == id) else {
            return Err(JotterError::EntryNotFound(id.to_string()));
        };
        new.validate()?;
        self.ensure_file_free(&new)?;

        let previous_path = self
            .paths
            .get(&id)
            .cloned()
            .unwrap_or_else(|| self.store.path_for(old));

        let path = self.store.write(&new).map_err(|e| {
            error!(id = %id, error = %e, "failed to write updated entry");
            e
        })?;

        if previous_path != path {
            remove_stale_file(&self.store, &previous_path);
        }

        let pinned = new.is_pinned;
        self.paths.insert(id, path);
        self.entries[index] = new;
        if pinned {
            self.clear_other_pins(id);
        }
        self.sort();
        debug!(id = %id, "updated entry");
        self.notify();
        Ok(())
    }

    /// Refuse to write `entry` over a file another loaded entry lives in.
    /// Only the `title` filename scheme can produce such a clash.
    fn ensure_file_free(&self, entry: &JournalEntry) -> Result<()> {
        let target = self.store.path_for(entry);
        let owner = self
            .paths
            .iter()
            .find(|(id, path)| **id != entry.id() && **path == target);
        if let Some((owner, _)) = owner {
            warn!(id = %entry.id(), owner = %owner, path = %target.display(), "entry file name clash");
            return Err(JotterError::InvalidEntry(format!(
                "file {} already belongs to entry {}",
                target.display(),
                owner
            )));
        }
        Ok(())
    }

    /// Apply `change` to a copy of the entry and persist it via [`update`](Self::update)
    pub fn update_with<F>(&mut self, id: Uuid, change: F) -> Result<()>
    where
        F: FnOnce(&mut JournalEntry),
    {
        let old = self
            .entry(id)
            .cloned()
            .ok_or_else(|| JotterError::EntryNotFound(id.to_string()))?;
        let mut new = old.clone();
        change(&mut new);
        self.update(&old, new)
    }

    /// Pin or unpin an entry; pinning clears the previous pin
    pub fn set_pinned(&mut self, id: Uuid, pinned: bool) -> Result<()> {
        self.update_with(id, |entry| entry.is_pinned = pinned)
    }

    /// Remove an entry's file and drop it from the collection.
    ///
    /// A file that is already gone counts as deleted, so deleting twice is
    /// fine. Returns whether the entry was in the collection. Callers holding
    /// a selection of this entry must clear it themselves.
    pub fn delete(&mut self, entry: &JournalEntry) -> Result<bool> {
        let id = entry.id();
        let path = self
            .paths
            .get(&id)
            .cloned()
            .unwrap_or_else(|| self.store.path_for(entry));

        match self.store.delete_path(&path) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                debug!(id = %id, path = %path.display(), "entry file already gone");
            }
            Err(e) => {
                error!(id = %id, error = %e, "failed to delete entry file");
                return Err(e);
            }
        }

        self.paths.remove(&id);
        let before = self.entries.len();
        self.entries.retain(|e| e.id() != id);
        let removed = self.entries.len() != before;
        if removed {
            debug!(id = %id, "deleted entry");
            self.notify();
        }
        Ok(removed)
    }

    /// Register a callback that receives the collection after every change.
    ///
    /// Callbacks run synchronously inside the mutating call.
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: Fn(&[JournalEntry]) + Send + 'static,
    {
        let id = self.next_subscription;
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    pub(crate) fn notify(&self) {
        for (_, observer) in &self.observers {
            observer(&self.entries);
        }
    }

    /// Newest first; ties broken by id so the order is stable across loads
    pub(crate) fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id().cmp(&b.id())));
    }

    /// Unpin every entry except `keep`, persisting each change.
    ///
    /// A failed write is logged; memory still reflects the single pin.
    fn clear_other_pins(&mut self, keep: Uuid) {
        let store = &self.store;
        let paths = &mut self.paths;

        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.is_pinned && e.id() != keep)
        {
            entry.is_pinned = false;
            match store.write(entry) {
                Ok(path) => {
                    if let Some(previous) = paths.insert(entry.id(), path.clone()) {
                        if previous != path {
                            remove_stale_file(store, &previous);
                        }
                    }
                }
                Err(e) => {
                    error!(id = %entry.id(), error = %e, "failed to persist unpin");
                }
            }
        }
    }

    /// Keep only the newest pinned entry pinned after reading from disk
    fn enforce_single_pin(&mut self) {
        let newest = self
            .entries
            .iter()
            .filter(|e| e.is_pinned)
            .max_by(|a, b| a.date.cmp(&b.date).then_with(|| b.id().cmp(&a.id())))
            .map(|e| e.id());

        if let Some(keep) = newest {
            if self.entries.iter().filter(|e| e.is_pinned).count() > 1 {
                warn!(kept = %keep, "multiple pinned entries on disk");
                self.clear_other_pins(keep);
            }
        }
    }
}

/// Remove a file an entry no longer lives in; already-gone is fine
fn remove_stale_file(store: &FileStore, path: &Path) {
    match store.delete_path(path) {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stale entry file"),
    }
}
