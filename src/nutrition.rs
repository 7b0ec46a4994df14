//! Sums nutrition values over food-log entries

use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::entry::{FoodLogEntry, Meal, Nutrients};

/// Summed nutrition values of several entries
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Totals {
    pub cals: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub sugar: f64,
    pub sodium: f64,
}

impl Totals {
    pub fn is_zero(&self) -> bool {
        *self == Totals::default()
    }
}

impl AddAssign<&Nutrients> for Totals {
    fn add_assign(&mut self, n: &Nutrients) {
        self.cals += n.cals;
        self.carbs += n.carbs;
        self.protein += n.protein;
        self.fat += n.fat;
        self.sugar += n.sugar;
        self.sodium += n.sodium;
    }
}

impl Add for Totals {
    type Output = Totals;

    fn add(self, other: Totals) -> Totals {
        Totals {
            cals: self.cals + other.cals,
            carbs: self.carbs + other.carbs,
            protein: self.protein + other.protein,
            fat: self.fat + other.fat,
            sugar: self.sugar + other.sugar,
            sodium: self.sodium + other.sodium,
        }
    }
}

impl Sum for Totals {
    fn sum<I: Iterator<Item = Totals>>(iter: I) -> Totals {
        iter.fold(Totals::default(), Add::add)
    }
}

impl<'a> Sum<&'a Nutrients> for Totals {
    fn sum<I: Iterator<Item = &'a Nutrients>>(iter: I) -> Totals {
        let mut totals = Totals::default();
        for n in iter {
            totals += n;
        }
        totals
    }
}

/// Sum the entries of the given meal, or of every meal if `meal` is `None`.
///
/// Entries of every date are summed: filtering on a day is the job of the diet log store.
pub fn aggregate<'a, I>(entries: I, meal: Option<Meal>) -> Totals
where
    I: IntoIterator<Item = &'a FoodLogEntry>,
{
    entries.into_iter()
        .filter(|entry| meal.map_or(true, |m| entry.meal() == m))
        .map(|entry| entry.nutrients())
        .sum()
}

/// Calories of each meal, as displayed on the meal buttons. Every meal is present, even with zero calories
pub fn meal_calories<'a, I>(entries: I) -> BTreeMap<Meal, f64>
where
    I: IntoIterator<Item = &'a FoodLogEntry>,
{
    let mut per_meal: BTreeMap<Meal, f64> = Meal::ALL.iter().map(|m| (*m, 0.0)).collect();
    for entry in entries {
        *per_meal.entry(entry.meal()).or_insert(0.0) += entry.nutrients().cals;
    }
    per_meal
}


#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::entry::{EntryDraft, EntryId, SyncStatus};

    fn entry(date: &str, meal: Meal, cals: f64) -> FoodLogEntry {
        let date: NaiveDate = date.parse().unwrap();
        let nutrients = Nutrients { cals, carbs: 10.0, protein: 5.0, fat: 2.0, sugar: 1.0, sodium: 100.0 };
        FoodLogEntry::from_draft(EntryId::random(), EntryDraft::new(date, meal, "food", nutrients), SyncStatus::NotSynced)
    }

    #[test]
    fn empty_is_zero() {
        let none: Vec<FoodLogEntry> = Vec::new();
        assert!(aggregate(&none, None).is_zero());
        assert!(aggregate(&none, Some(Meal::Lunch)).is_zero());
    }

    #[test]
    fn by_meal_and_all() {
        let entries = vec![
            entry("2024-03-05", Meal::Lunch, 500.0),
            entry("2024-03-05", Meal::Dinner, 700.0),
        ];

        let all = aggregate(&entries, None);
        assert_eq!(all.cals, 1200.0);
        assert_eq!(all.carbs, 20.0);
        assert_eq!(all.sodium, 200.0);

        let lunch = aggregate(&entries, Some(Meal::Lunch));
        assert_eq!(lunch.cals, 500.0);
        assert_eq!(lunch.protein, 5.0);

        assert!(aggregate(&entries, Some(Meal::Breakfast)).is_zero());

        // idempotent
        assert_eq!(aggregate(&entries, None), all);
    }

    #[test]
    fn meal_buttons() {
        let entries = vec![
            entry("2024-03-05", Meal::Lunch, 500.0),
            entry("2024-03-05", Meal::Lunch, 50.0),
            entry("2024-03-05", Meal::Other, 80.0),
        ];
        let per_meal = meal_calories(&entries);
        assert_eq!(per_meal.len(), 4);
        assert_eq!(per_meal[&Meal::Breakfast], 0.0);
        assert_eq!(per_meal[&Meal::Lunch], 550.0);
        assert_eq!(per_meal[&Meal::Other], 80.0);
    }
}
