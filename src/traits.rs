//! The seams between the app state and its persistence collaborators

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::entry::{EntryDraft, EntryId, FoodLogEntry, Meal};
use crate::error::Result;
use crate::store::{RestaurantId, Store, StoreFilter, StoreId};

/// A place where food-log entries are stored
///
/// It is implemented by the local [`Cache`](crate::cache::Cache), the backend [`Client`](crate::client::Client),
/// and the [`Provider`](crate::Provider) that combines both.
#[async_trait]
pub trait DietLogSource {
    /// Returns the entries of `date`, restricted to `meal` if one is given.
    /// Their order is stable between two calls as long as the source is not mutated.
    async fn query(&self, date: NaiveDate, meal: Option<Meal>) -> Result<Vec<FoodLogEntry>>;

    /// Stores a new entry and returns it, with the id it has been assigned.
    ///
    /// This either fully succeeds (and the entry can be queried afterwards), or returns an error and stores nothing.
    async fn add(&mut self, draft: EntryDraft) -> Result<FoodLogEntry>;

    /// Deletes an entry. Deleting an id that does not exist is not an error for local sources.
    ///
    /// The backend [`Client`](crate::client::Client) cannot tell an unknown id apart from a refused deletion, and reports both as errors.
    async fn remove(&mut self, id: &EntryId) -> Result<()>;
}

/// The backend part that knows about restaurants and favorites
#[async_trait]
pub trait RestaurantDirectory {
    async fn search_stores(&self, filter: &StoreFilter) -> Result<Vec<Store>>;
    async fn store_detail(&self, id: &StoreId) -> Result<Store>;
    /// The stores the current user has marked as favorite
    async fn favorites(&self) -> Result<Vec<Store>>;
    async fn add_favorite(&self, id: &RestaurantId) -> Result<()>;
    async fn remove_favorite(&self, id: &RestaurantId) -> Result<()>;
}

pub trait SyncSlave {
    /// Returns the last time this source successfully synced from a master source (e.g. from a server)
    /// (or None in case it has never been synchronized)
    fn get_last_sync(&self) -> Option<DateTime<Utc>>;
    /// Update the last sync timestamp to now, or to a custom time in case `timepoint` is `Some`
    fn update_last_sync(&mut self, timepoint: Option<DateTime<Utc>>);
}
