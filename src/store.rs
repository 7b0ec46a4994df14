//! Restaurants as returned by the backend, search filters and favorites

use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::iter::FromIterator;

use serde::{Deserialize, Serialize};

use crate::utils::string_or_number;

/// The identifier used in store URLs (`/stores/{id}`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreId(#[serde(deserialize_with = "string_or_number")] String);

/// The identifier used to mark a restaurant as favorite
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RestaurantId(#[serde(deserialize_with = "string_or_number")] String);

macro_rules! string_id {
    ($id_type:ident) => {
        impl $id_type {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }
        impl From<&str> for $id_type {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
        impl From<String> for $id_type {
            fn from(s: String) -> Self {
                Self(s)
            }
        }
        impl Display for $id_type {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    }
}

string_id!(StoreId);
string_id!(RestaurantId);


/// A dish of a store menu
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuItem {
    pub name: String,
    /// Already formatted by the backend, e.g. `$120`
    pub price: String,
    #[serde(deserialize_with = "crate::utils::lenient_amount")]
    pub calories: f64,
    #[serde(deserialize_with = "crate::utils::lenient_amount")]
    pub protein: f64,
    #[serde(deserialize_with = "crate::utils::lenient_amount")]
    pub carbs: f64,
    #[serde(deserialize_with = "crate::utils::lenient_amount")]
    pub fat: f64,
}

/// A restaurant, as listed in search results or shown in the detail page
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub restaurant_id: RestaurantId,
    #[serde(default)]
    pub name: String,
    /// e.g. `★★★★☆ 4.0`
    #[serde(default)]
    pub rating: String,
    #[serde(default, rename = "priceRange")]
    pub price_range: String,
    #[serde(default, rename = "priceMeta")]
    pub price_meta: String,
    #[serde(default)]
    pub distance: String,
    #[serde(default, rename = "heroImg")]
    pub hero_img: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub address: String,
    #[serde(default, rename = "foodType")]
    pub food_type: String,
    #[serde(default, rename = "vegetarianOption")]
    pub vegetarian_option: String,
    #[serde(default)]
    pub menu: Vec<MenuItem>,
    #[serde(default)]
    pub is_favorited: bool,
}

impl Store {
    /// The star part of the rating (`★★★★☆` for `★★★★☆ 4.0`)
    pub fn stars(&self) -> &str {
        self.rating.split(' ').next().unwrap_or("")
    }
}


/// Price tier filter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PriceTier {
    #[serde(rename = "$")]
    Low,
    #[serde(rename = "$$")]
    Medium,
    #[serde(rename = "$$$")]
    High,
}

impl PriceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PriceTier::Low => "$",
            PriceTier::Medium => "$$",
            PriceTier::High => "$$$",
        }
    }
}

/// Search criteria for the store list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StoreFilter {
    pub keyword: String,
    pub categories: Vec<String>,
    pub price: Option<PriceTier>,
    pub vegetarian: bool,
}

impl StoreFilter {
    pub fn with_keyword<S: ToString>(mut self, keyword: S) -> Self {
        self.keyword = keyword.to_string();
        self
    }

    /// Select a category, or unselect it if it was selected already
    pub fn toggle_category<S: AsRef<str>>(&mut self, category: S) {
        let category = category.as_ref();
        match self.categories.iter().position(|c| c == category) {
            Some(index) => { self.categories.remove(index); },
            None => self.categories.push(category.to_string()),
        }
    }

    /// Select a price tier, or unselect it if it was selected already. At most one tier is selected
    pub fn toggle_price(&mut self, tier: PriceTier) {
        self.price = if self.price == Some(tier) { None } else { Some(tier) };
    }

    /// Clear categories and price tier
    pub fn reset(&mut self) {
        self.categories.clear();
        self.price = None;
    }

    /// Query-string parameters of a store search, without the user id
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        let keyword = self.keyword.trim();
        if keyword.is_empty() == false {
            pairs.push(("keyword", keyword.to_string()));
        }
        if self.categories.is_empty() == false {
            pairs.push(("categories", self.categories.join(",")));
        }
        if let Some(tier) = self.price {
            pairs.push(("price", tier.as_str().to_string()));
        }
        if self.vegetarian {
            pairs.push(("vegetarian", "true".to_string()));
        }
        pairs
    }
}


/// The restaurants marked as favorite by the current user
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FavoriteSet {
    ids: HashSet<RestaurantId>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &RestaurantId) -> bool {
        self.ids.contains(id)
    }

    pub fn insert(&mut self, id: RestaurantId) -> bool {
        self.ids.insert(id)
    }

    pub fn remove(&mut self, id: &RestaurantId) -> bool {
        self.ids.remove(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Keep only the stores that are members of this set, in their original order
    pub fn filter<'a, I>(&self, stores: I) -> Vec<Store>
    where
        I: IntoIterator<Item = &'a Store>,
    {
        stores.into_iter()
            .filter(|store| self.contains(&store.restaurant_id))
            .cloned()
            .collect()
    }
}

impl<'a> FromIterator<&'a Store> for FavoriteSet {
    fn from_iter<I: IntoIterator<Item = &'a Store>>(stores: I) -> Self {
        Self { ids: stores.into_iter().map(|s| s.restaurant_id.clone()).collect() }
    }
}
