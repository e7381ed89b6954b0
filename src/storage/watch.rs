//! Watch state persisted through a [`KeyValueStore`]
//!
//! Key layout:
//! - `watchlist`: JSON array of movie ids
//! - `watchHistory`: JSON array of `{movieId, timestamp}`, most recent first
//! - `movie-progress-{id}`: elapsed seconds as a decimal string
//! - `adminToken`: raw bearer token

use chrono::{DateTime, Utc};
use tracing::warn;

use super::store::{KeyValueStore, StorageError};
use crate::models::HistoryEntry;

pub const WATCHLIST_KEY: &str = "watchlist";
pub const HISTORY_KEY: &str = "watchHistory";
pub const ADMIN_TOKEN_KEY: &str = "adminToken";

/// Maximum number of history entries kept
pub const HISTORY_LIMIT: usize = 50;

/// Store key holding the resume position of one movie
pub fn progress_key(movie_id: &str) -> String {
    format!("movie-progress-{}", movie_id)
}

/// Watchlist, history, progress and admin token over an injected store
#[derive(Debug, Default)]
pub struct WatchStore<S> {
    store: S,
}

impl<S: KeyValueStore> WatchStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Access the underlying store
    pub fn inner(&self) -> &S {
        &self.store
    }

    // -------------------------------------------------------------------------
    // Watchlist
    // -------------------------------------------------------------------------

    /// All watchlisted movie ids
    pub fn watchlist(&self) -> Vec<String> {
        self.read_list(WATCHLIST_KEY)
    }

    pub fn is_in_watchlist(&self, movie_id: &str) -> bool {
        self.watchlist().iter().any(|id| id == movie_id)
    }

    /// Flip membership and return the new state (true = now in watchlist)
    pub fn toggle_watchlist(&mut self, movie_id: &str) -> Result<bool, StorageError> {
        let mut ids = self.watchlist();
        let present = ids.iter().any(|id| id == movie_id);
        if present {
            ids.retain(|id| id != movie_id);
        } else {
            ids.push(movie_id.to_string());
        }
        self.write_list(WATCHLIST_KEY, &ids)?;
        Ok(!present)
    }

    /// Add a movie, returns false when it was already listed
    pub fn add_to_watchlist(&mut self, movie_id: &str) -> Result<bool, StorageError> {
        if self.is_in_watchlist(movie_id) {
            return Ok(false);
        }
        self.toggle_watchlist(movie_id)
    }

    /// Remove a movie, returns false when it was not listed
    pub fn remove_from_watchlist(&mut self, movie_id: &str) -> Result<bool, StorageError> {
        if !self.is_in_watchlist(movie_id) {
            return Ok(false);
        }
        self.toggle_watchlist(movie_id).map(|now_listed| !now_listed)
    }

    // -------------------------------------------------------------------------
    // History
    // -------------------------------------------------------------------------

    /// History entries, most recent first
    pub fn history(&self) -> Vec<HistoryEntry> {
        self.read_list(HISTORY_KEY)
    }

    /// Move `movie_id` to the front of the history, capped at [`HISTORY_LIMIT`]
    pub fn record_history(
        &mut self,
        movie_id: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut entries = self.history();
        entries.retain(|e| e.movie_id != movie_id);
        entries.insert(0, HistoryEntry::new(movie_id, timestamp));
        entries.truncate(HISTORY_LIMIT);
        self.write_list(HISTORY_KEY, &entries)
    }

    // -------------------------------------------------------------------------
    // Playback Progress
    // -------------------------------------------------------------------------

    /// Saved resume position in seconds
    pub fn progress(&self, movie_id: &str) -> Option<f64> {
        let raw = self.store.get(&progress_key(movie_id))?;
        match raw.trim().parse::<f64>() {
            Ok(secs) if secs.is_finite() && secs >= 0.0 => Some(secs),
            _ => {
                warn!(movie_id, value = %raw, "ignoring malformed progress value");
                None
            }
        }
    }

    pub fn save_progress(&mut self, movie_id: &str, seconds: f64) -> Result<(), StorageError> {
        self.store
            .set(&progress_key(movie_id), &seconds.to_string())
    }

    pub fn clear_progress(&mut self, movie_id: &str) -> Result<(), StorageError> {
        self.store.remove(&progress_key(movie_id))
    }

    // -------------------------------------------------------------------------
    // Admin Token
    // -------------------------------------------------------------------------

    pub fn admin_token(&self) -> Option<String> {
        self.store.get(ADMIN_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn set_admin_token(&mut self, token: &str) -> Result<(), StorageError> {
        self.store.set(ADMIN_TOKEN_KEY, token)
    }

    pub fn clear_admin_token(&mut self) -> Result<(), StorageError> {
        self.store.remove(ADMIN_TOKEN_KEY)
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn read_list<T: serde::de::DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let Some(raw) = self.store.get(key) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(list) => list,
            Err(e) => {
                warn!(key, error = %e, "treating malformed list as empty");
                Vec::new()
            }
        }
    }

    fn write_list<T: serde::Serialize>(&mut self, key: &str, list: &[T]) -> Result<(), StorageError> {
        let json = serde_json::to_string(list)?;
        self.store.set(key, &json)
    }
}
