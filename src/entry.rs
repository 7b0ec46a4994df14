//! Food-log entries: what has been eaten, when, and its nutrition values

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::{lenient_amount, string_or_number};

/// The meal an entry belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
    /// Snacks, and whatever the backend sends that we do not know about
    #[serde(other)]
    Other,
}

impl Meal {
    pub const ALL: [Meal; 4] = [Meal::Breakfast, Meal::Lunch, Meal::Dinner, Meal::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Meal::Breakfast => "breakfast",
            Meal::Lunch => "lunch",
            Meal::Dinner => "dinner",
            Meal::Other => "other",
        }
    }
}

impl Display for Meal {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Meal {
    type Err = std::convert::Infallible;

    /// Unknown meal names are mapped to [`Meal::Other`]
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "breakfast" => Meal::Breakfast,
            "lunch" => Meal::Lunch,
            "dinner" => Meal::Dinner,
            _ => Meal::Other,
        })
    }
}


/// An opaque identifier of a stored entry.
///
/// The local store generates random ones, the backend uses its own (usually numeric) ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(#[serde(deserialize_with = "string_or_number")] String);

impl EntryId {
    /// Generate a random EntryId.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_hyphenated().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for EntryId {
    fn from(s: String) -> Self {
        Self(s)
    }
}
impl From<&str> for EntryId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
impl From<i64> for EntryId {
    fn from(n: i64) -> Self {
        Self(n.to_string())
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}


/// Nutrition values of a single entry.
///
/// Calories are in kcal, sodium in mg, everything else in grams.
/// Missing or malformed amounts are read as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrients {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub cals: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub carbs: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub protein: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub fat: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub sugar: f64,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub sodium: f64,
}

impl Nutrients {
    /// Only calories are known, every other amount is zero
    pub fn calories(cals: f64) -> Self {
        Self { cals: crate::utils::sanitize_amount(cals), ..Self::default() }
    }

    /// Replace every negative or non-finite amount by zero
    pub fn sanitized(self) -> Self {
        use crate::utils::sanitize_amount;
        Self {
            cals: sanitize_amount(self.cals),
            carbs: sanitize_amount(self.carbs),
            protein: sanitize_amount(self.protein),
            fat: sanitize_amount(self.fat),
            sugar: sanitize_amount(self.sugar),
            sodium: sanitize_amount(self.sodium),
        }
    }
}


/// Describes whether this entry has been synced with the backend already.
///
/// This is only meaningful when a local store acts as an offline cache of a remote one (see [`Provider`](crate::Provider)).
/// Entries are immutable, so there is no "locally modified" state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncStatus {
    /// This entry has been locally created, and never synced yet
    NotSynced,
    /// This entry exists on the backend under the same id
    Synced,
    /// This entry has been synced, and has been locally deleted since then.
    LocallyDeleted,
}

impl Default for SyncStatus {
    fn default() -> Self {
        SyncStatus::NotSynced
    }
}


/// What the user typed in the entry form, before it gets stored and receives an id
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryDraft {
    pub date: NaiveDate,
    pub meal: Meal,
    pub name: String,
    #[serde(flatten)]
    pub nutrients: Nutrients,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl EntryDraft {
    pub fn new<S: ToString>(date: NaiveDate, meal: Meal, name: S, nutrients: Nutrients) -> Self {
        Self {
            date,
            meal,
            name: name.to_string(),
            nutrients: nutrients.sanitized(),
            image: None,
        }
    }

    pub fn with_image(mut self, image: String) -> Self {
        self.image = Some(image);
        self
    }
}


/// One recorded food item
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FoodLogEntry {
    id: EntryId,
    date: NaiveDate,
    meal: Meal,
    name: String,
    #[serde(flatten)]
    nutrients: Nutrients,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,

    #[serde(default)]
    sync_status: SyncStatus,
}

impl FoodLogEntry {
    /// Turn a draft into a stored entry
    pub fn from_draft(id: EntryId, draft: EntryDraft, sync_status: SyncStatus) -> Self {
        Self {
            id,
            date: draft.date,
            meal: draft.meal,
            name: draft.name,
            nutrients: draft.nutrients,
            image: draft.image,
            sync_status,
        }
    }

    pub fn id(&self) -> &EntryId            { &self.id }
    pub fn date(&self) -> NaiveDate         { self.date }
    pub fn meal(&self) -> Meal              { self.meal }
    pub fn name(&self) -> &str              { &self.name }
    pub fn nutrients(&self) -> &Nutrients   { &self.nutrients }
    pub fn image(&self) -> Option<&str>     { self.image.as_deref() }
    pub fn sync_status(&self) -> SyncStatus { self.sync_status }

    pub fn set_sync_status(&mut self, new_status: SyncStatus) {
        self.sync_status = new_status;
    }

    /// Whether this entry is on `date`, and in `meal` if one is given
    pub fn matches(&self, date: NaiveDate, meal: Option<Meal>) -> bool {
        self.date == date && meal.map_or(true, |m| m == self.meal)
    }

    /// The draft this entry was (or could have been) created from
    pub fn to_draft(&self) -> EntryDraft {
        EntryDraft {
            date: self.date,
            meal: self.meal,
            name: self.name.clone(),
            nutrients: self.nutrients,
            image: self.image.clone(),
        }
    }

    /// Compares the user-visible contents of two entries, ignoring their ids and sync statuses
    pub fn has_same_observable_content_as(&self, other: &FoodLogEntry) -> bool {
           self.date == other.date
        && self.meal == other.meal
        && self.name == other.name
        && self.nutrients == other.nutrients
        && self.image == other.image
    }
}
