//! This crate holds the client-side state of a restaurant discovery and diet tracking app.
//!
//! It computes what the pages display (store lists, the calendar grid, the entries of a day and their nutrition totals), and keeps it consistent with the user actions.
//! Rendering is left to the caller.
//!
//! Food-log entries are stored in a [`DietLogSource`](traits::DietLogSource). This crate provides three of them:
//! * a backend client in the [`client`] module, that also knows about restaurants and favorites,
//! * a local cache in the [`cache`] module, that stores every entry in a single JSON file,
//! * a [`Provider`](provider::Provider), that works on a local cache and syncs it with the backend. \
//!   This is the way to keep a diet log usable while offline.
//!
//! The pages and their transitions are driven by a [`Coordinator`](coordinator::Coordinator).

pub mod traits;

pub mod entry;
pub use entry::{EntryDraft, EntryId, FoodLogEntry, Meal, Nutrients};
pub mod nutrition;
pub use nutrition::Totals;
pub mod calendar;
pub use calendar::MonthCursor;
pub mod store;
pub use store::{FavoriteSet, Store, StoreFilter};

pub mod provider;
pub use provider::Provider;
pub mod coordinator;
pub use coordinator::Coordinator;

pub mod client;
pub mod cache;

pub mod error;
pub use error::{Error, Result};
pub mod config;
pub mod mock_behaviour;
pub mod utils;

/// Unless you want another kind of Provider to write integration tests, you'll probably want this kind of Provider. \
/// See also the [`Provider`] documentation
pub type BackendProvider = Provider<client::Client>;
