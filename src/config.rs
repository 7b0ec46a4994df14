//! Support for library configuration options

use std::sync::{Arc, Mutex};
use once_cell::sync::Lazy;

/// Base URL of the backend REST API. Every endpoint path is appended to it (e.g. `{API_BASE_URL}/diet`).
/// Feel free to override it when initing this library.
pub static API_BASE_URL: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("http://localhost:5000/api".to_string())));

/// Identifier of the current user, sent along with every backend request.
/// Feel free to override it when initing this library.
pub static USER_ID: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("user_001".to_string())));

/// Path of the local storage slot that holds the serialized diet log.
pub static STORAGE_SLOT: Lazy<Arc<Mutex<String>>> = Lazy::new(|| Arc::new(Mutex::new("dietData.json".to_string())));

/// Read the current value of one of the settings above
pub fn get(setting: &Lazy<Arc<Mutex<String>>>) -> String {
    match setting.lock() {
        Ok(value) => value.clone(),
        // A panic while holding the lock cannot leave a String half-written
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Override one of the settings above
pub fn set<S: ToString>(setting: &Lazy<Arc<Mutex<String>>>, value: S) {
    let mut guard = match setting.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = value.to_string();
}
