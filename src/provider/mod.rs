//! This modules combines the local cache and the backend into a single virtual diet log
//!
//! It is also responsible for syncing them together

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::cache::Cache;
use crate::entry::{EntryDraft, EntryId, FoodLogEntry, Meal, SyncStatus};
use crate::error::Result;
use crate::traits::{DietLogSource, SyncSlave};

pub mod sync_progress;
use sync_progress::SyncProgress;
use sync_progress::{FeedbackSender, SyncEvent};


/// A diet log that works offline on a local [`Cache`], and syncs it with a remote source.
///
/// Usually, the remote source is a [`Client`](crate::client::Client), that is to say a [`BackendProvider`](crate::BackendProvider). \
/// However, providers can be used for integration tests, where the remote source is mocked by another `Cache`.
///
/// Queries, additions and removals only touch the local cache, and are pushed to the remote source at the next sync.
#[derive(Debug)]
pub struct Provider<R>
where
    R: DietLogSource + Send + Sync,
{
    /// The remote source (usually a server)
    remote: R,
    /// The local cache
    local: Cache,
}

impl<R> Provider<R>
where
    R: DietLogSource + Send + Sync,
{
    /// Create a provider.
    ///
    /// `remote` is usually a [`Client`](crate::client::Client). In case of a sync conflict, `remote` always wins
    pub fn new(remote: R, local: Cache) -> Self {
        Self { remote, local }
    }

    /// Returns the local cache
    pub fn local(&self)  -> &Cache { &self.local }
    /// Returns the local cache
    pub fn local_mut(&mut self)  -> &mut Cache { &mut self.local }
    /// Returns the data source described as `remote`.
    ///
    /// Apart from tests, there are very few (if any) reasons to access `remote` directly.
    pub fn remote(&self) -> &R { &self.remote }

    /// Performs a synchronisation of every day the local cache knows about, and provide feeedback to the user about the progress.
    ///
    /// Local additions and deletions are pushed to `remote`; additions and deletions made on `remote` are applied locally.
    ///
    /// It returns whether the sync was totally successful (details about errors are logged using the `log::*` macros).
    /// In case errors happened, the sync might have been partially executed. Entries that could not be pushed stay local and will be pushed at the next sync.
    pub async fn sync_with_feedback(&mut self, feedback_sender: FeedbackSender) -> bool {
        let mut progress = SyncProgress::new_with_feedback_channel(feedback_sender);
        let dates = self.local.dates();
        self.run_sync(&dates, &mut progress).await
    }

    /// Performs a synchronisation of every day the local cache knows about, without giving any feedback.
    ///
    /// See [`Self::sync_with_feedback`]
    pub async fn sync(&mut self) -> bool {
        let mut progress = SyncProgress::new();
        let dates = self.local.dates();
        self.run_sync(&dates, &mut progress).await
    }

    /// Performs a synchronisation of the given days, plus every day the local cache knows about.
    ///
    /// This is the way to fetch days that have never been seen locally.
    pub async fn sync_dates(&mut self, dates: &[NaiveDate]) -> bool {
        let mut progress = SyncProgress::new();
        let mut all_dates = self.local.dates();
        all_dates.extend_from_slice(dates);
        all_dates.sort();
        all_dates.dedup();
        self.run_sync(&all_dates, &mut progress).await
    }

    async fn run_sync(&mut self, dates: &[NaiveDate], progress: &mut SyncProgress) -> bool {
        progress.info("Starting a sync.");
        progress.feedback(SyncEvent::Started);

        for date in dates {
            if let Err(err) = self.sync_day(*date, progress).await {
                progress.warn(&format!("Unable to sync day {}: {}, skipping this time.", date, err));
            }
        }

        if progress.is_success() {
            self.local.update_last_sync(None);
        }
        progress.info("Sync ended");
        progress.feedback(SyncEvent::Finished{ success: progress.is_success() });
        progress.is_success()
    }

    async fn sync_day(&mut self, date: NaiveDate, progress: &mut SyncProgress) -> Result<()> {
        progress.info(&format!("Syncing day {}", date));
        progress.reset_counter();

        // Step 1 - find the differences
        progress.debug("Finding the differences to sync...");
        let remote_entries = self.remote.query(date, None).await?;
        progress.feedback(SyncEvent::InProgress{
            date,
            items_done_already: 0,
            details: format!("{} remote entries", remote_entries.len()),
        });

        let remote_ids: HashSet<EntryId> = remote_entries.iter().map(|e| e.id().clone()).collect();
        let local_entries = self.local.entries_on(date);
        let local_ids: HashSet<EntryId> = local_entries.iter().map(|e| e.id().clone()).collect();

        let mut local_additions = Vec::new();
        let mut local_del = Vec::new();
        let mut remote_del = Vec::new();

        for entry in local_entries {
            let id = entry.id().clone();
            match entry.sync_status() {
                SyncStatus::NotSynced => {
                    if remote_ids.contains(&id) {
                        progress.error(&format!("Id reuse between remote and local sources ({}). Ignoring this entry in the sync", id));
                        continue;
                    }
                    progress.debug(&format!("#   {} has been locally created", id));
                    local_additions.push(entry);
                },
                SyncStatus::LocallyDeleted => {
                    if remote_ids.contains(&id) {
                        progress.debug(&format!("#   {} is a local deletion", id));
                        local_del.push(id);
                    } else {
                        progress.debug(&format!("#   {} has been deleted from both sources", id));
                        remote_del.push(id);
                    }
                },
                SyncStatus::Synced => {
                    if remote_ids.contains(&id) == false {
                        progress.debug(&format!("#   {} is a deletion from the server", id));
                        remote_del.push(id);
                    }
                },
            }
        }

        let remote_additions: Vec<FoodLogEntry> = remote_entries.into_iter()
            .filter(|e| local_ids.contains(e.id()) == false)
            .collect();

        // Step 2 - commit changes
        progress.trace("Committing changes...");
        for id_del in local_del {
            progress.debug(&format!("> Pushing local deletion {} to the server", id_del));
            self.notify(progress, date, &id_del);

            match self.remote.remove(&id_del).await {
                Err(err) => {
                    progress.warn(&format!("Unable to delete remote entry {}: {}", id_del, err));
                },
                Ok(()) => {
                    // Change the local copy from "marked to deletion" to "actually deleted"
                    if let Err(err) = self.local.forget(&id_del) {
                        progress.error(&format!("Unable to permanently delete local entry {}: {}", id_del, err));
                    }
                },
            }
        }

        for id_del in remote_del {
            progress.debug(&format!("> Applying remote deletion {} locally", id_del));
            self.notify(progress, date, &id_del);
            if let Err(err) = self.local.forget(&id_del) {
                progress.warn(&format!("Unable to delete local entry {}: {}", id_del, err));
            }
        }

        for new_entry in remote_additions {
            progress.debug(&format!("> Applying remote addition {} locally", new_entry.id()));
            progress.increment_counter(1);
            progress.feedback(SyncEvent::InProgress{
                date,
                items_done_already: progress.counter(),
                details: new_entry.name().to_string(),
            });
            let id = new_entry.id().clone();
            if let Err(err) = self.local.insert_synced(new_entry) {
                progress.error(&format!("Not able to add entry {} to the local cache: {}", id, err));
            }
        }

        for entry in local_additions {
            progress.debug(&format!("> Pushing local addition {} to the server", entry.id()));
            progress.increment_counter(1);
            progress.feedback(SyncEvent::InProgress{
                date,
                items_done_already: progress.counter(),
                details: entry.name().to_string(),
            });

            match self.remote.add(entry.to_draft()).await {
                Err(err) => progress.error(&format!("Unable to add entry {} to the server: {}", entry.id(), err)),
                Ok(remote_entry) => {
                    // The server has assigned its own id, the local copy adopts it
                    if let Err(err) = self.local.mark_synced(entry.id(), remote_entry) {
                        progress.error(&format!("Unable to update local entry {} after upload: {}", entry.id(), err));
                    }
                },
            }
        }

        Ok(())
    }

    fn notify(&self, progress: &mut SyncProgress, date: NaiveDate, id: &EntryId) {
        let name = self.local.entries().iter()
            .find(|e| e.id() == id)
            .map(|e| e.name().to_string())
            .unwrap_or_default();
        progress.increment_counter(1);
        progress.feedback(SyncEvent::InProgress{
            date,
            items_done_already: progress.counter(),
            details: name,
        });
    }
}

#[async_trait]
impl<R> DietLogSource for Provider<R>
where
    R: DietLogSource + Send + Sync,
{
    async fn query(&self, date: NaiveDate, meal: Option<Meal>) -> Result<Vec<FoodLogEntry>> {
        self.local.query(date, meal).await
    }

    async fn add(&mut self, draft: EntryDraft) -> Result<FoodLogEntry> {
        self.local.add(draft).await
    }

    async fn remove(&mut self, id: &EntryId) -> Result<()> {
        self.local.remove(id).await
    }
}
