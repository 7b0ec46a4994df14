//! This module drives the pages of the app
//!
//! A [`Coordinator`] owns the [`AppState`] and the collaborators it is computed from (a [`DietLogSource`] and a [`RestaurantDirectory`]).
//! Every user action is one of its methods: it asks the collaborators what it needs, checks the result, and only then updates the state.
//! Failures are logged, and leave the state either unchanged or empty, never half-updated.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::calendar::{self, DayCell};
use crate::entry::{EntryId, FoodLogEntry, Meal};
use crate::error::{Result, ValidationError};
use crate::nutrition::{self, Totals};
use crate::store::{FavoriteSet, Store, StoreFilter, StoreId};
use crate::traits::{DietLogSource, RestaurantDirectory};

mod page;
pub use page::{DietMode, NavEvent, Page};
mod state;
pub use state::{AppState, DayLoad, EntryForm};


/// The entries of the meal being detailed, and their totals
#[derive(Clone, Debug, PartialEq)]
pub struct MealView<'a> {
    pub meal: Meal,
    pub entries: &'a [FoodLogEntry],
    pub totals: Totals,
}


/// Owns the state of the app and applies the user actions to it
#[derive(Debug)]
pub struct Coordinator<S, D>
where
    S: DietLogSource,
    D: RestaurantDirectory,
{
    diet_log: S,
    directory: D,
    state: AppState,
}

impl<S, D> Coordinator<S, D>
where
    S: DietLogSource,
    D: RestaurantDirectory,
{
    /// Create a coordinator, showing the store list. `today` is the initially selected date
    pub fn new(diet_log: S, directory: D, today: NaiveDate) -> Self {
        Self {
            diet_log,
            directory,
            state: AppState::new(today),
        }
    }

    /// Create a coordinator whose selected date is the current local date
    pub fn with_local_today(diet_log: S, directory: D) -> Self {
        Self::new(diet_log, directory, chrono::Local::now().naive_local().date())
    }

    pub fn state(&self) -> &AppState { &self.state }
    pub fn diet_log(&self) -> &S { &self.diet_log }
    /// Gives access to the diet log, e.g. to sync a [`Provider`](crate::Provider).
    ///
    /// The displayed entries are not refreshed. Call [`Self::reload_day`] when this is needed.
    pub fn diet_log_mut(&mut self) -> &mut S { &mut self.diet_log }
    pub fn directory(&self) -> &D { &self.directory }

    fn navigate(&mut self, event: &NavEvent) -> Option<Page> {
        let next = self.state.page.next(event);
        match &next {
            None => log::debug!("Ignoring {:?} on page {}", event, self.state.page),
            Some(page) => log::trace!("{} -> {}", self.state.page, page),
        }
        next
    }

    //
    // Stores
    //

    /// Search stores and show them. A failed search shows an empty list
    pub async fn show_store_list(&mut self, filter: StoreFilter) -> Result<()> {
        if let Some(page) = self.navigate(&NavEvent::ShowStoreList) {
            self.state.page = page;
        }
        self.state.filter = filter;

        match self.directory.search_stores(&self.state.filter).await {
            Ok(stores) => {
                log::debug!("{} stores found", stores.len());
                self.state.stores = stores;
                Ok(())
            },
            Err(err) => {
                log::warn!("Unable to search stores: {}", err);
                self.state.stores.clear();
                Err(err)
            },
        }
    }

    /// Show the detail of a store. If it cannot be loaded, the current page stays displayed
    pub async fn select_store(&mut self, id: &StoreId) -> Result<()> {
        let page = match self.navigate(&NavEvent::SelectStore(id.clone())) {
            Some(page) => page,
            None => return Ok(()),
        };

        match self.directory.store_detail(id).await {
            Ok(mut store) => {
                store.is_favorited = store.is_favorited || self.state.favorites.contains(&store.restaurant_id);
                if store.is_favorited {
                    self.state.favorites.insert(store.restaurant_id.clone());
                }
                self.state.current_store = Some(store);
                self.state.page = page;
                Ok(())
            },
            Err(err) => {
                log::warn!("Unable to load store {}: {}", id, err);
                Err(err)
            },
        }
    }

    //
    // Favorites
    //

    /// Show the favorite stores.
    ///
    /// If they cannot be loaded, the last known store list is filtered with the last known favorites instead.
    pub async fn show_favorites(&mut self) -> Result<()> {
        if let Some(page) = self.navigate(&NavEvent::ShowFavorites) {
            self.state.page = page;
        }

        match self.directory.favorites().await {
            Ok(stores) => {
                self.state.favorites = stores.iter().collect();
                self.state.favorite_stores = self.state.favorites.filter(&stores);
                Ok(())
            },
            Err(err) => {
                log::warn!("Unable to load favorites: {}", err);
                self.state.favorite_stores = self.state.favorites.filter(&self.state.stores);
                Err(err)
            },
        }
    }

    /// Mark the current store as favorite, or unmark it.
    ///
    /// Nothing changes until the backend confirms. Returns whether the store is now a favorite.
    pub async fn toggle_favorite(&mut self) -> Result<bool> {
        let (restaurant_id, was_favorite) = match &self.state.current_store {
            None => return Err(ValidationError::NoStoreSelected.into()),
            Some(store) => (
                store.restaurant_id.clone(),
                store.is_favorited || self.state.favorites.contains(&store.restaurant_id),
            ),
        };

        let result = if was_favorite {
            self.directory.remove_favorite(&restaurant_id).await
        } else {
            self.directory.add_favorite(&restaurant_id).await
        };
        if let Err(err) = result {
            log::warn!("Unable to update favorite {}: {}", restaurant_id, err);
            return Err(err);
        }

        let now_favorite = !was_favorite;
        if now_favorite {
            self.state.favorites.insert(restaurant_id.clone());
        } else {
            self.state.favorites.remove(&restaurant_id);
            self.state.favorite_stores.retain(|s| s.restaurant_id != restaurant_id);
        }
        if let Some(store) = self.state.current_store.as_mut() {
            store.is_favorited = now_favorite;
        }
        for store in self.state.stores.iter_mut().filter(|s| s.restaurant_id == restaurant_id) {
            store.is_favorited = now_favorite;
        }
        Ok(now_favorite)
    }

    //
    // Diet tracker
    //

    /// Show the diet tracker in its aggregate mode, for the selected date
    pub async fn show_diet_tracker(&mut self) -> Result<()> {
        if let Some(page) = self.navigate(&NavEvent::ShowDietTracker) {
            self.state.page = page;
        }
        self.state.meal_entries.clear();
        self.reload_day().await
    }

    /// Select another day. The meal being detailed (if any) is closed
    pub async fn select_day(&mut self, date: NaiveDate) -> Result<()> {
        self.state.selected_date = date;
        self.state.meal_entries.clear();
        if let Some(page) = self.navigate(&NavEvent::SelectDay) {
            self.state.page = page;
        }
        self.reload_day().await
    }

    /// Move the displayed month. The selected date does not change
    pub fn change_month(&mut self, delta: i32) {
        self.state.cursor = calendar::change_month(&self.state.cursor, delta);
        log::debug!("Displaying {}", self.state.cursor.title());
    }

    /// Detail a meal, or go back to the aggregate view if this meal was detailed already
    pub async fn toggle_meal(&mut self, meal: Meal) -> Result<()> {
        let page = match self.navigate(&NavEvent::ToggleMeal(meal)) {
            Some(page) => page,
            None => return Ok(()),
        };
        self.state.page = page;

        match self.state.selected_meal() {
            None => {
                self.state.meal_entries.clear();
                Ok(())
            },
            Some(meal) => {
                let ticket = self.begin_day_load(Some(meal));
                let result = self.diet_log.query(ticket.date(), ticket.meal()).await;
                self.complete_day_load(&ticket, result)
            },
        }
    }

    /// Store a new entry in the meal being detailed, on the selected date.
    ///
    /// The form is checked before anything is written. The displayed entries are reloaded on success only.
    /// Once the entry is stored this returns it, even if the reload fails (the displayed entries are emptied then).
    pub async fn save_entry(&mut self, form: &EntryForm) -> Result<FoodLogEntry> {
        let meal = self.state.selected_meal().ok_or(ValidationError::NoMealSelected)?;
        if form.name.trim().is_empty() {
            return Err(ValidationError::MissingName.into());
        }

        let draft = form.to_draft(self.state.selected_date, meal);
        let entry = match self.diet_log.add(draft).await {
            Ok(entry) => entry,
            Err(err) => {
                log::error!("Unable to save {:?}: {}", form.name, err);
                return Err(err);
            },
        };
        log::info!("Saved {} ({})", entry.name(), entry.id());

        self.refresh_after_write().await;
        Ok(entry)
    }

    /// Delete an entry, and reload the displayed ones.
    ///
    /// A reload failure after a successful deletion is logged, not returned.
    pub async fn delete_entry(&mut self, id: &EntryId) -> Result<()> {
        if let Err(err) = self.diet_log.remove(id).await {
            log::error!("Unable to delete entry {}: {}", id, err);
            return Err(err);
        }
        self.refresh_after_write().await;
        Ok(())
    }

    async fn refresh_after_write(&mut self) {
        if let Err(err) = self.reload_day().await {
            log::warn!("Stored changes could not be displayed: {}", err);
        }
    }

    /// Query the entries of the selected date again (and of the detailed meal, if any)
    pub async fn reload_day(&mut self) -> Result<()> {
        let ticket = self.begin_day_load(None);
        let result = self.diet_log.query(ticket.date(), ticket.meal()).await;
        let day_outcome = self.complete_day_load(&ticket, result);

        // The meal view is reloaded even if the day could not be, so that it does not show another day
        let meal_outcome = match self.state.selected_meal() {
            None => Ok(()),
            Some(meal) => {
                let ticket = self.begin_day_load(Some(meal));
                let result = self.diet_log.query(ticket.date(), ticket.meal()).await;
                self.complete_day_load(&ticket, result)
            },
        };
        day_outcome.and(meal_outcome)
    }

    /// Start loading the entries of the selected date.
    ///
    /// Any load that has been started before is stale from now on.
    pub fn begin_day_load(&mut self, meal: Option<Meal>) -> DayLoad {
        self.state.generation += 1;
        DayLoad::new(self.state.generation, self.state.selected_date, meal)
    }

    /// Apply the result of a load, unless it is stale.
    ///
    /// A failed load empties the displayed entries, so that nothing from another day remains visible.
    pub fn complete_day_load(&mut self, ticket: &DayLoad, result: Result<Vec<FoodLogEntry>>) -> Result<()> {
        if ticket.generation() != self.state.generation || ticket.date() != self.state.selected_date {
            log::debug!("Dropping a stale load of {} (generation {}, now {})", ticket.date(), ticket.generation(), self.state.generation);
            return Ok(());
        }

        let (entries, outcome) = match result {
            Ok(entries) => {
                let entries: Vec<FoodLogEntry> = entries.into_iter()
                    .filter(|e| e.matches(ticket.date(), ticket.meal()))
                    .collect();
                (entries, Ok(()))
            },
            Err(err) => {
                log::warn!("Unable to load entries of {}: {}", ticket.date(), err);
                (Vec::new(), Err(err))
            },
        };

        match ticket.meal() {
            None => self.state.entries = entries,
            Some(_) => self.state.meal_entries = entries,
        }
        outcome
    }

    //
    // Derived views
    //

    /// Totals of every meal of the selected date
    pub fn day_totals(&self) -> Totals {
        nutrition::aggregate(&self.state.entries, None)
    }

    /// The meal being detailed, if any
    pub fn meal_view(&self) -> Option<MealView<'_>> {
        let meal = self.state.selected_meal()?;
        Some(MealView {
            meal,
            entries: &self.state.meal_entries,
            totals: nutrition::aggregate(&self.state.meal_entries, Some(meal)),
        })
    }

    /// Calories of each meal of the selected date
    pub fn meal_calories(&self) -> BTreeMap<Meal, f64> {
        nutrition::meal_calories(&self.state.entries)
    }

    /// The day grid of the displayed month
    pub fn calendar(&self, today: NaiveDate) -> Vec<DayCell> {
        calendar::days_grid(&self.state.cursor, self.state.selected_date, today)
    }

    /// The favorite set, as last confirmed by the backend
    pub fn favorites(&self) -> &FavoriteSet {
        &self.state.favorites
    }

    /// The stores the current page lists
    pub fn listed_stores(&self) -> &[Store] {
        match self.state.page {
            Page::Favorites => &self.state.favorite_stores,
            _ => &self.state.stores,
        }
    }
}
