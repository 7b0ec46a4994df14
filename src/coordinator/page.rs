//! The pages of the app, and the ways to go from one to another

use std::fmt::{Display, Formatter};

use crate::entry::Meal;
use crate::store::StoreId;

/// What the diet tracker page displays
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DietMode {
    /// Totals of every meal of the selected day
    Aggregate,
    /// The entries of a single meal, and the form to add more
    MealDetail(Meal),
}

impl DietMode {
    pub fn meal(&self) -> Option<Meal> {
        match self {
            DietMode::Aggregate => None,
            DietMode::MealDetail(meal) => Some(*meal),
        }
    }
}

/// The page the user is looking at
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Page {
    StoreList,
    StoreDetail(StoreId),
    DietTracker(DietMode),
    Favorites,
}

impl Default for Page {
    fn default() -> Self {
        Page::StoreList
    }
}

impl Display for Page {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Page::StoreList => write!(f, "store list"),
            Page::StoreDetail(id) => write!(f, "store {}", id),
            Page::DietTracker(DietMode::Aggregate) => write!(f, "diet tracker"),
            Page::DietTracker(DietMode::MealDetail(meal)) => write!(f, "diet tracker ({})", meal),
            Page::Favorites => write!(f, "favorites"),
        }
    }
}

/// A user action that may change the current page
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavEvent {
    ShowStoreList,
    SelectStore(StoreId),
    ShowDietTracker,
    ToggleMeal(Meal),
    ShowFavorites,
    SelectDay,
}

impl Page {
    /// The transition table.
    ///
    /// Returns the page to show after `event`, or `None` if `event` makes no sense from this page.
    pub fn next(&self, event: &NavEvent) -> Option<Page> {
        match (self, event) {
            (_, NavEvent::ShowStoreList) => Some(Page::StoreList),
            (_, NavEvent::ShowDietTracker) => Some(Page::DietTracker(DietMode::Aggregate)),
            (_, NavEvent::ShowFavorites) => Some(Page::Favorites),

            (Page::StoreList, NavEvent::SelectStore(id))
            | (Page::Favorites, NavEvent::SelectStore(id))
            | (Page::StoreDetail(_), NavEvent::SelectStore(id)) => Some(Page::StoreDetail(id.clone())),

            (Page::DietTracker(DietMode::MealDetail(current)), NavEvent::ToggleMeal(meal)) if current == meal => {
                Some(Page::DietTracker(DietMode::Aggregate))
            },
            (Page::DietTracker(_), NavEvent::ToggleMeal(meal)) => Some(Page::DietTracker(DietMode::MealDetail(*meal))),

            (Page::DietTracker(_), NavEvent::SelectDay) => Some(Page::DietTracker(DietMode::Aggregate)),

            _ => None,
        }
    }

    pub fn diet_mode(&self) -> Option<DietMode> {
        match self {
            Page::DietTracker(mode) => Some(*mode),
            _ => None,
        }
    }
}
