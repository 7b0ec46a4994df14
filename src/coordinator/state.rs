//! The state of the app, as displayed to the user

use chrono::NaiveDate;

use crate::calendar::MonthCursor;
use crate::entry::{EntryDraft, FoodLogEntry, Meal, Nutrients};
use crate::store::{FavoriteSet, Store, StoreFilter};
use crate::utils::parse_amount;
use super::page::Page;

/// Everything the pages display.
///
/// It is owned by a [`Coordinator`](super::Coordinator), and only its transitions mutate it.
#[derive(Clone, Debug)]
pub struct AppState {
    pub(super) page: Page,

    pub(super) filter: StoreFilter,
    pub(super) stores: Vec<Store>,
    pub(super) current_store: Option<Store>,
    pub(super) favorites: FavoriteSet,
    pub(super) favorite_stores: Vec<Store>,

    pub(super) cursor: MonthCursor,
    pub(super) selected_date: NaiveDate,
    /// Entries of `selected_date`, all meals included
    pub(super) entries: Vec<FoodLogEntry>,
    /// Entries of `selected_date` for the meal being detailed
    pub(super) meal_entries: Vec<FoodLogEntry>,
    pub(super) generation: u64,
}

impl AppState {
    pub(super) fn new(today: NaiveDate) -> Self {
        Self {
            page: Page::default(),
            filter: StoreFilter::default(),
            stores: Vec::new(),
            current_store: None,
            favorites: FavoriteSet::new(),
            favorite_stores: Vec::new(),
            cursor: MonthCursor::from_date(today),
            selected_date: today,
            entries: Vec::new(),
            meal_entries: Vec::new(),
            generation: 0,
        }
    }

    pub fn page(&self) -> &Page                      { &self.page }
    pub fn filter(&self) -> &StoreFilter             { &self.filter }
    pub fn stores(&self) -> &[Store]                 { &self.stores }
    pub fn current_store(&self) -> Option<&Store>    { self.current_store.as_ref() }
    pub fn favorites(&self) -> &FavoriteSet          { &self.favorites }
    pub fn favorite_stores(&self) -> &[Store]        { &self.favorite_stores }
    pub fn cursor(&self) -> &MonthCursor             { &self.cursor }
    pub fn selected_date(&self) -> NaiveDate         { self.selected_date }
    pub fn entries(&self) -> &[FoodLogEntry]         { &self.entries }
    pub fn meal_entries(&self) -> &[FoodLogEntry]    { &self.meal_entries }

    /// The meal being detailed, if any
    pub fn selected_meal(&self) -> Option<Meal> {
        self.page.diet_mode().and_then(|mode| mode.meal())
    }
}


/// The input of the "add food" form, as typed by the user
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntryForm {
    pub name: String,
    pub cals: String,
    pub carbs: String,
    pub protein: String,
    pub fat: String,
    pub sugar: String,
    pub sodium: String,
    pub image: Option<String>,
}

impl EntryForm {
    pub fn new<S: ToString>(name: S) -> Self {
        Self { name: name.to_string(), ..Self::default() }
    }

    pub fn with_cals<S: ToString>(mut self, cals: S) -> Self {
        self.cals = cals.to_string();
        self
    }

    /// Blank or invalid amounts are read as zero
    pub fn nutrients(&self) -> Nutrients {
        Nutrients {
            cals: parse_amount(&self.cals),
            carbs: parse_amount(&self.carbs),
            protein: parse_amount(&self.protein),
            fat: parse_amount(&self.fat),
            sugar: parse_amount(&self.sugar),
            sodium: parse_amount(&self.sodium),
        }
    }

    pub(super) fn to_draft(&self, date: NaiveDate, meal: Meal) -> EntryDraft {
        let draft = EntryDraft::new(date, meal, self.name.trim(), self.nutrients());
        match &self.image {
            Some(image) if image.is_empty() == false => draft.with_image(image.clone()),
            _ => draft,
        }
    }
}


/// A pending load of the entries of a day.
///
/// Its result is only applied if nothing else has been selected meanwhile.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DayLoad {
    generation: u64,
    date: NaiveDate,
    meal: Option<Meal>,
}

impl DayLoad {
    pub(super) fn new(generation: u64, date: NaiveDate, meal: Option<Meal>) -> Self {
        Self { generation, date, meal }
    }

    pub fn generation(&self) -> u64 { self.generation }
    pub fn date(&self) -> NaiveDate { self.date }
    pub fn meal(&self) -> Option<Meal> { self.meal }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_amounts() {
        let form = EntryForm {
            name: "  salad ".to_string(),
            cals: "120".to_string(),
            carbs: "".to_string(),
            protein: "abc".to_string(),
            fat: "-3".to_string(),
            sugar: " 4.5 ".to_string(),
            sodium: "0".to_string(),
            image: Some(String::new()),
        };
        let draft = form.to_draft("2024-03-05".parse().unwrap(), Meal::Lunch);
        assert_eq!(draft.name, "salad");
        assert_eq!(draft.nutrients.cals, 120.0);
        assert_eq!(draft.nutrients.carbs, 0.0);
        assert_eq!(draft.nutrients.protein, 0.0);
        assert_eq!(draft.nutrients.fat, 0.0);
        assert_eq!(draft.nutrients.sugar, 4.5);
        assert_eq!(draft.image, None);
    }
}
