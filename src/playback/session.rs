//! Play action side effects and event draining
//!
//! Pressing Play records the movie in the watch history and bumps its view
//! counter. Resuming and progress ticks do neither.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::tracker::{PlaybackEvent, PlaybackTracker};
use crate::api::CatalogClient;
use crate::storage::{KeyValueStore, WatchStore};

/// Record an explicit Play: history entry now and a detached view increment
pub fn record_play<S: KeyValueStore>(
    client: &CatalogClient,
    store: &mut WatchStore<S>,
    movie_id: &str,
) -> JoinHandle<()> {
    record_play_at(client, store, movie_id, Utc::now())
}

/// [`record_play`] with an explicit timestamp
pub fn record_play_at<S: KeyValueStore>(
    client: &CatalogClient,
    store: &mut WatchStore<S>,
    movie_id: &str,
    at: DateTime<Utc>,
) -> JoinHandle<()> {
    if let Err(e) = store.record_history(movie_id, at) {
        warn!(movie_id, error = %e, "failed to record watch history");
    }

    count_view(client, movie_id)
}

/// Bump the backend view counter in the background. Failures are logged only.
pub fn count_view(client: &CatalogClient, movie_id: &str) -> JoinHandle<()> {
    let client = client.clone();
    let id = movie_id.to_string();
    tokio::spawn(async move {
        if let Err(e) = client.increment_view(&id).await {
            warn!(movie_id = %id, error = %e, "failed to count view");
        }
    })
}

/// Feed player events into a tracker until the session is over.
/// Failed progress writes are logged and the session carries on.
/// Returns the tracker in its final state.
pub async fn drive<S: KeyValueStore>(
    mut tracker: PlaybackTracker,
    store: &mut WatchStore<S>,
    events: &mut mpsc::Receiver<PlaybackEvent>,
) -> PlaybackTracker {
    while let Some(event) = events.recv().await {
        if let Err(e) = tracker.apply(store, event) {
            warn!(movie_id = tracker.movie_id(), error = %e, "failed to save playback progress");
        }
        if tracker.is_done() {
            break;
        }
    }

    if !tracker.is_done() {
        // Watcher vanished without a final event
        tracker.on_closed();
    }
    info!(
        movie_id = tracker.movie_id(),
        finished = tracker.is_finished(),
        position = tracker.current_time(),
        "playback session over"
    );
    tracker
}
