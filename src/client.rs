//! This module provides a client to connect to the backend REST API
//!
//! Every backend response is wrapped in an envelope: `{"success": true, "data": ...}` or `{"success": false, "error": "..."}`.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::entry::{EntryDraft, EntryId, FoodLogEntry, Meal, Nutrients, SyncStatus};
use crate::error::{NetworkError, Result};
use crate::store::{RestaurantId, Store, StoreFilter, StoreId};
use crate::traits::{DietLogSource, RestaurantDirectory};


#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default = "Option::default")]
    data: Option<T>,
    #[serde(default)]
    error: Option<String>,
}

impl<T> Envelope<T> {
    /// The `data` of a successful envelope (that may be missing for calls that do not return anything)
    fn into_result(self) -> std::result::Result<Option<T>, NetworkError> {
        if self.success {
            Ok(self.data)
        } else {
            Err(NetworkError::Rejected(self.error.unwrap_or_else(|| "unknown error".to_string())))
        }
    }
}

/// Parse a response body. Bodies that are not an envelope are reported with the HTTP status
fn parse_envelope<T: DeserializeOwned>(status: reqwest::StatusCode, body: &str) -> std::result::Result<Option<T>, NetworkError> {
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(envelope) => envelope.into_result(),
        Err(err) if status.is_success() => Err(NetworkError::Rejected(format!("malformed response: {}", err))),
        Err(_) => Err(NetworkError::Rejected(format!("unexpected HTTP status code {:?}", status))),
    }
}


/// A diet log entry, as sent by the backend
#[derive(Debug, Deserialize)]
struct RemoteEntry {
    #[serde(alias = "log_id")]
    id: EntryId,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    timestamp: Option<String>,
    #[serde(default)]
    meal: Option<Meal>,
    #[serde(default)]
    name: String,
    #[serde(flatten)]
    nutrients: Nutrients,
    #[serde(default)]
    image: Option<String>,
}

impl RemoteEntry {
    /// The day of this entry, read from `date` or from the date part of `timestamp`
    fn day(&self) -> Option<NaiveDate> {
        self.date.iter()
            .chain(self.timestamp.iter())
            .filter_map(|s| s.get(..10))
            .find_map(|s| s.parse().ok())
    }

    fn into_entry(self, fallback_date: NaiveDate) -> FoodLogEntry {
        let date = self.day().unwrap_or(fallback_date);
        let draft = EntryDraft {
            date,
            meal: self.meal.unwrap_or(Meal::Other),
            name: self.name,
            nutrients: self.nutrients,
            image: self.image,
        };
        FoodLogEntry::from_draft(self.id, draft, SyncStatus::Synced)
    }
}

/// What the backend answers when a diet log has been created: either the whole entry or its id only
#[derive(Debug, Deserialize)]
struct SavedLog {
    #[serde(alias = "log_id")]
    id: EntryId,
}

#[derive(Serialize)]
struct NewLogBody<'a> {
    user_id: &'a str,
    #[serde(flatten)]
    draft: &'a EntryDraft,
}

#[derive(Serialize)]
struct DeleteLogBody<'a> {
    user_id: &'a str,
    log_id: &'a str,
}

#[derive(Serialize)]
struct FavoriteBody<'a> {
    user_id: &'a str,
    restaurant_id: &'a str,
}


/// A source that fetches its data from the backend REST API.
///
/// Every call is scoped to the user this client has been created for.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    user_id: String,
    http: reqwest::Client,
}

impl Client {
    /// Create a client. This does not start a connection
    pub fn new<S: AsRef<str>, T: ToString>(base_url: S, user_id: T) -> std::result::Result<Self, NetworkError> {
        let base_url = Url::parse(base_url.as_ref())?;
        if base_url.cannot_be_a_base() {
            return Err(NetworkError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }

        Ok(Self{
            base_url,
            user_id: user_id.to_string(),
            http: reqwest::Client::new(),
        })
    }

    /// Create a client from the [`API_BASE_URL`](crate::config::API_BASE_URL) and [`USER_ID`](crate::config::USER_ID) settings
    pub fn from_config() -> std::result::Result<Self, NetworkError> {
        Self::new(crate::config::get(&crate::config::API_BASE_URL), crate::config::get(&crate::config::USER_ID))
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Append path segments to the base URL (`/api` + `["stores", "3"]` → `/api/stores/3`)
    fn endpoint(&self, segments: &[&str]) -> std::result::Result<Url, NetworkError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| NetworkError::Url(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, String)]) -> Result<Option<T>> {
        let url = self.endpoint(segments)?;
        log::debug!("GET {}", url);

        let response = self.http.get(url)
            .query(&[("user_id", self.user_id.as_str())])
            .query(query)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(parse_envelope(status, &body)?)
    }

    async fn send_json<T: DeserializeOwned, B: Serialize + Sync>(&self, method: Method, segments: &[&str], body: &B) -> Result<Option<T>> {
        let url = self.endpoint(segments)?;
        log::debug!("{} {}", method, url);

        let response = self.http.request(method, url)
            .json(body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        Ok(parse_envelope(status, &text)?)
    }
}

#[async_trait]
impl DietLogSource for Client {
    async fn query(&self, date: NaiveDate, meal: Option<Meal>) -> Result<Vec<FoodLogEntry>> {
        let mut params = vec![("date", date.format("%Y-%m-%d").to_string())];
        if let Some(meal) = meal {
            params.push(("meal", meal.as_str().to_string()));
        }

        let remote: Vec<RemoteEntry> = self.get(&["diet"], &params).await?.unwrap_or_default();

        // The backend may ignore the meal filter, and may answer for another day than the one we asked for
        Ok(remote.into_iter()
            .map(|entry| entry.into_entry(date))
            .filter(|entry| entry.matches(date, meal))
            .collect())
    }

    async fn add(&mut self, draft: EntryDraft) -> Result<FoodLogEntry> {
        let body = NewLogBody { user_id: &self.user_id, draft: &draft };
        let saved: Option<SavedLog> = self.send_json(Method::POST, &["diet"], &body).await?;
        let saved = saved.ok_or(NetworkError::MissingData)?;

        log::debug!("Backend stored entry {} ({})", saved.id, draft.name);
        Ok(FoodLogEntry::from_draft(saved.id, draft, SyncStatus::Synced))
    }

    /// Deletes a diet log on the backend.
    ///
    /// The backend answers an unknown id the same way as any other refused deletion, so unlike the local
    /// [`Cache`](crate::cache::Cache), removing an absent id is reported as a [`NetworkError::Rejected`] here.
    async fn remove(&mut self, id: &EntryId) -> Result<()> {
        let body = DeleteLogBody { user_id: &self.user_id, log_id: id.as_str() };
        let _: Option<serde_json::Value> = self.send_json(Method::DELETE, &["diet"], &body).await?;
        Ok(())
    }
}

#[async_trait]
impl RestaurantDirectory for Client {
    async fn search_stores(&self, filter: &StoreFilter) -> Result<Vec<Store>> {
        Ok(self.get(&["stores"], &filter.query_pairs()).await?.unwrap_or_default())
    }

    async fn store_detail(&self, id: &StoreId) -> Result<Store> {
        let store: Option<Store> = self.get(&["stores", id.as_str()], &[]).await?;
        Ok(store.ok_or(NetworkError::MissingData)?)
    }

    async fn favorites(&self) -> Result<Vec<Store>> {
        Ok(self.get(&["favorites"], &[]).await?.unwrap_or_default())
    }

    async fn add_favorite(&self, id: &RestaurantId) -> Result<()> {
        let body = FavoriteBody { user_id: &self.user_id, restaurant_id: id.as_str() };
        let _: Option<serde_json::Value> = self.send_json(Method::POST, &["favorites"], &body).await?;
        Ok(())
    }

    async fn remove_favorite(&self, id: &RestaurantId) -> Result<()> {
        let body = FavoriteBody { user_id: &self.user_id, restaurant_id: id.as_str() };
        let _: Option<serde_json::Value> = self.send_json(Method::DELETE, &["favorites"], &body).await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn endpoints() {
        let client = Client::new("http://localhost:5000/api", "user_001").unwrap();
        assert_eq!(client.endpoint(&["diet"]).unwrap().as_str(), "http://localhost:5000/api/diet");
        assert_eq!(client.endpoint(&["stores", "3"]).unwrap().as_str(), "http://localhost:5000/api/stores/3");

        let client = Client::new("http://localhost:5000/api/", "user_001").unwrap();
        assert_eq!(client.endpoint(&["favorites"]).unwrap().as_str(), "http://localhost:5000/api/favorites");

        assert!(Client::new("not a url", "user_001").is_err());
        assert!(Client::new("mailto:someone@example.com", "user_001").is_err());
    }

    #[test]
    fn envelopes() {
        let ok: Option<Vec<u32>> = parse_envelope(StatusCode::OK, r#"{"success": true, "data": [1, 2]}"#).unwrap();
        assert_eq!(ok, Some(vec![1, 2]));

        let no_data: Option<serde_json::Value> = parse_envelope(StatusCode::OK, r#"{"success": true, "message": "done"}"#).unwrap();
        assert!(no_data.is_none());

        let refused = parse_envelope::<serde_json::Value>(StatusCode::BAD_REQUEST, r#"{"success": false, "error": "no user id"}"#);
        match refused {
            Err(NetworkError::Rejected(msg)) => assert_eq!(msg, "no user id"),
            other => panic!("unexpected {:?}", other),
        }

        let garbage = parse_envelope::<serde_json::Value>(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert!(matches!(garbage, Err(NetworkError::Rejected(_))));
    }

    #[test]
    fn remote_entries() {
        let body = r#"{"success": true, "data": [
            {"id": 12, "name": "Beef noodles", "restaurant": "Noodle Bar", "cals": 620, "protein": 31.5,
             "carbs": "80", "fat": null, "timestamp": "2024-03-05T12:00:00", "meal": "lunch"},
            {"log_id": "13", "name": "Tea", "date": "2024-03-05", "meal": "teatime"}
        ]}"#;
        let fallback: NaiveDate = "2000-01-01".parse().unwrap();
        let remote: Vec<RemoteEntry> = parse_envelope(StatusCode::OK, body).unwrap().unwrap();
        let entries: Vec<FoodLogEntry> = remote.into_iter().map(|e| e.into_entry(fallback)).collect();

        assert_eq!(entries[0].id().as_str(), "12");
        assert_eq!(entries[0].date(), "2024-03-05".parse::<NaiveDate>().unwrap());
        assert_eq!(entries[0].meal(), Meal::Lunch);
        assert_eq!(entries[0].nutrients().carbs, 80.0);
        assert_eq!(entries[0].nutrients().fat, 0.0);
        assert_eq!(entries[0].sync_status(), SyncStatus::Synced);

        assert_eq!(entries[1].id().as_str(), "13");
        assert_eq!(entries[1].meal(), Meal::Other);
        assert_eq!(entries[1].nutrients().cals, 0.0);
    }

    #[test]
    fn saved_log_shapes() {
        let short: SavedLog = serde_json::from_str(r#"{"log_id": 99}"#).unwrap();
        assert_eq!(short.id.as_str(), "99");
        let full: SavedLog = serde_json::from_str(r#"{"id": "abc", "name": "x", "cals": 1}"#).unwrap();
        assert_eq!(full.id.as_str(), "abc");
    }

    #[test]
    fn new_log_body() {
        let draft = EntryDraft::new("2024-03-05".parse().unwrap(), Meal::Dinner, "Curry", Nutrients::calories(700.0));
        let body = serde_json::to_value(NewLogBody { user_id: "user_001", draft: &draft }).unwrap();
        assert_eq!(body["user_id"], "user_001");
        assert_eq!(body["date"], "2024-03-05");
        assert_eq!(body["meal"], "dinner");
        assert_eq!(body["cals"], 700.0);
        assert!(body.get("image").is_none());
    }
}
