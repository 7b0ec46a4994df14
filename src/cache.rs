//! This module provides a local store for the diet log
//!
//! The whole log is kept in a single storage slot (a JSON file). It is written back entirely on every mutation.

use std::path::PathBuf;
use std::path::Path;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::traits::DietLogSource;
use crate::traits::SyncSlave;
use crate::entry::{EntryDraft, EntryId, FoodLogEntry, Meal, SyncStatus};
use crate::error::{NetworkError, PersistenceError, Result};
use crate::mock_behaviour::MockBehaviour;


/// A diet log source that stores its entries in a local file
#[derive(Debug)]
pub struct Cache {
    backing_file: PathBuf,
    data: CachedData,

    /// In tests, a cache can mock a flaky remote source
    mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>,
}

#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
struct CachedData {
    entries: Vec<FoodLogEntry>,
    last_sync: Option<DateTime<Utc>>,
}

impl Cache {
    /// Get the path to the default storage slot (see [`STORAGE_SLOT`](crate::config::STORAGE_SLOT))
    pub fn default_slot() -> PathBuf {
        PathBuf::from(crate::config::get(&crate::config::STORAGE_SLOT))
    }

    /// Initialize a cache from the content of a valid backing file if it exists.
    /// Returns an error otherwise
    pub fn from_file(path: &Path) -> std::result::Result<Self, PersistenceError> {
        let file = std::fs::File::open(path)?;
        let data = serde_json::from_reader(std::io::BufReader::new(file))?;

        Ok(Self{
            backing_file: PathBuf::from(path),
            data,
            mock_behaviour: None,
        })
    }

    /// Initialize a cache with the default (empty) contents.
    ///
    /// Nothing is written until the first mutation
    pub fn new(path: &Path) -> Self {
        Self{
            backing_file: PathBuf::from(path),
            data: CachedData::default(),
            mock_behaviour: None,
        }
    }

    /// Load the slot at `path`, or start with an empty one if it is missing or invalid.
    ///
    /// An invalid slot is moved aside (to `<slot>.corrupt`) rather than overwritten by the next write.
    pub fn open(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(cache) => cache,
            Err(PersistenceError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No cache file at {:?} yet", path);
                Self::new(path)
            },
            Err(err) => {
                let backup = sibling(path, ".corrupt");
                log::warn!("Invalid cache file {:?}: {}. Moving it to {:?} and using a default cache", path, err, backup);
                if let Err(err) = std::fs::rename(path, &backup) {
                    log::error!("Unable to move {:?} aside: {}", path, err);
                }
                Self::new(path)
            }
        }
    }

    /// Make this cache behave like a flaky remote source
    pub fn set_mock_behaviour(&mut self, mock_behaviour: Option<Arc<Mutex<MockBehaviour>>>) {
        self.mock_behaviour = mock_behaviour;
    }

    pub fn backing_file(&self) -> &Path {
        &self.backing_file
    }

    /// Every entry of the slot, including the ones that are locally deleted but not synced yet
    pub fn entries(&self) -> &[FoodLogEntry] {
        &self.data.entries
    }

    /// Entries of a given date, including the ones that are locally deleted but not synced yet
    pub fn entries_on(&self, date: NaiveDate) -> Vec<FoodLogEntry> {
        self.data.entries.iter()
            .filter(|entry| entry.date() == date)
            .cloned()
            .collect()
    }

    /// The distinct dates that have at least one entry, in chronological order
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.data.entries.iter().map(|e| e.date()).collect();
        dates.sort();
        dates.dedup();
        dates
    }

    /// Write the slot, and only then replace the in-memory data.
    ///
    /// The new content is written to a sibling file that is then renamed over the slot, so that the slot is
    /// either the old or the new content. A failed write leaves this cache as it was before the mutation.
    fn commit(&mut self, data: CachedData) -> std::result::Result<(), PersistenceError> {
        let serialized = serde_json::to_vec(&data)?;
        let temp_file = sibling(&self.backing_file, ".tmp");
        std::fs::write(&temp_file, serialized)?;
        if let Err(err) = std::fs::rename(&temp_file, &self.backing_file) {
            let _ = std::fs::remove_file(&temp_file);
            return Err(err.into());
        }
        self.data = data;
        Ok(())
    }

    /// Store the current Cache to its backing file
    pub fn save_to_file(&mut self) -> std::result::Result<(), PersistenceError> {
        let data = self.data.clone();
        self.commit(data)
    }

    /// Read-modify-write the whole slot
    fn mutate<F>(&mut self, f: F) -> std::result::Result<(), PersistenceError>
    where
        F: FnOnce(&mut CachedData),
    {
        let mut data = self.data.clone();
        f(&mut data);
        self.commit(data)
    }

    /// Replace a locally created entry by its counterpart that has just been pushed to the server
    pub fn mark_synced(&mut self, local_id: &EntryId, mut remote: FoodLogEntry) -> std::result::Result<(), PersistenceError> {
        remote.set_sync_status(SyncStatus::Synced);
        let local_id = local_id.clone();
        self.mutate(move |data| {
            match data.entries.iter().position(|e| e.id() == &local_id) {
                Some(index) => data.entries[index] = remote,
                None => data.entries.push(remote),
            }
        })
    }

    /// Add an entry that already exists on the server
    pub fn insert_synced(&mut self, mut entry: FoodLogEntry) -> std::result::Result<(), PersistenceError> {
        entry.set_sync_status(SyncStatus::Synced);
        self.mutate(move |data| data.entries.push(entry))
    }

    /// Actually delete an entry, whatever its sync status
    pub fn forget(&mut self, id: &EntryId) -> std::result::Result<(), PersistenceError> {
        if self.data.entries.iter().any(|e| e.id() == id) == false {
            return Ok(());
        }
        self.mutate(|data| data.entries.retain(|e| e.id() != id))
    }

    /// Compares two Caches to check they have the same current content
    ///
    /// This is not a complete equality test: sync statuses, locally deleted entries and last sync dates may differ
    pub fn has_same_observable_content_as(&self, other: &Self) -> bool {
        let left = visible_by_id(&self.data.entries);
        let right = visible_by_id(&other.data.entries);

        if crate::utils::keys_are_the_same(&left, &right) == false {
            return false;
        }

        for (id, entry_l) in left {
            match right.get(&id) {
                Some(entry_r) if entry_l.has_same_observable_content_as(entry_r) => (),
                _ => {
                    log::debug!("Entry {} differs", id);
                    return false;
                }
            }
        }
        true
    }

    fn check_mock<F>(&self, f: F) -> std::result::Result<(), NetworkError>
    where
        F: FnOnce(&mut MockBehaviour) -> std::result::Result<(), NetworkError>,
    {
        match &self.mock_behaviour {
            None => Ok(()),
            Some(behaviour) => {
                let mut behaviour = match behaviour.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                f(&mut *behaviour)
            }
        }
    }
}

/// `slot.json` + `.tmp` → `slot.json.tmp`, in the same folder
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

fn visible_by_id(entries: &[FoodLogEntry]) -> HashMap<EntryId, &FoodLogEntry> {
    entries.iter()
        .filter(|e| e.sync_status() != SyncStatus::LocallyDeleted)
        .map(|e| (e.id().clone(), e))
        .collect()
}

#[async_trait]
impl DietLogSource for Cache {
    async fn query(&self, date: NaiveDate, meal: Option<Meal>) -> Result<Vec<FoodLogEntry>> {
        self.check_mock(MockBehaviour::can_query)?;

        Ok(self.data.entries.iter()
            .filter(|entry| entry.sync_status() != SyncStatus::LocallyDeleted)
            .filter(|entry| entry.matches(date, meal))
            .cloned()
            .collect())
    }

    async fn add(&mut self, draft: EntryDraft) -> Result<FoodLogEntry> {
        self.check_mock(MockBehaviour::can_add)?;

        let entry = FoodLogEntry::from_draft(EntryId::random(), draft, SyncStatus::NotSynced);
        let stored = entry.clone();
        self.mutate(move |data| data.entries.push(stored))?;
        log::debug!("Stored entry {} ({}) in {:?}", entry.id(), entry.name(), self.backing_file);
        Ok(entry)
    }

    async fn remove(&mut self, id: &EntryId) -> Result<()> {
        self.check_mock(MockBehaviour::can_remove)?;

        let status = match self.data.entries.iter().find(|e| e.id() == id) {
            None => {
                log::debug!("No entry {} to remove", id);
                return Ok(());
            },
            Some(entry) => entry.sync_status(),
        };

        match status {
            SyncStatus::NotSynced => {
                // This was never synced to the server, we can safely delete it as soon as now
                self.mutate(|data| data.entries.retain(|e| e.id() != id))?;
            },
            SyncStatus::Synced => {
                self.mutate(|data| {
                    for entry in data.entries.iter_mut().filter(|e| e.id() == id) {
                        entry.set_sync_status(SyncStatus::LocallyDeleted);
                    }
                })?;
            },
            SyncStatus::LocallyDeleted => (),
        }
        Ok(())
    }
}

impl SyncSlave for Cache {
    fn get_last_sync(&self) -> Option<DateTime<Utc>> {
        self.data.last_sync
    }

    fn update_last_sync(&mut self, timepoint: Option<DateTime<Utc>>) {
        let timepoint = timepoint.unwrap_or_else(Utc::now);
        if let Err(err) = self.mutate(|data| data.last_sync = Some(timepoint)) {
            log::warn!("Unable to save the last sync date: {}", err);
            self.data.last_sync = Some(timepoint);
        }
    }
}
