//! Errors reported by the diet log stores, the backend client and the coordinator
//!
//! Nothing in this crate is fatal: callers are expected to log the error, show a message to the user, and keep the current view.

use thiserror::Error;

/// A request to the backend failed, or the backend refused it
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The backend answered with `{"success": false, "error": ...}`
    #[error("backend refused the request: {0}")]
    Rejected(String),
    /// The backend answered `success` without the `data` the call needs
    #[error("backend response has no data")]
    MissingData,
    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),
    /// Failure injected by a [`MockBehaviour`](crate::mock_behaviour::MockBehaviour)
    #[error("{0}")]
    Mocked(String),
}

/// Some required user input is missing. No write has been attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no meal is selected")]
    NoMealSelected,
    #[error("the food name is empty")]
    MissingName,
    #[error("no store is displayed")]
    NoStoreSelected,
}

/// The local storage slot could not be read or written
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unable to access storage slot: {0}")]
    Io(#[from] std::io::Error),
    #[error("unable to (de)serialize storage slot: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl Error {
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, Error::Persistence(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Network(NetworkError::Transport(err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
