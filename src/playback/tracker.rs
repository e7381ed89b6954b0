//! Playback progress tracking
//!
//! One tracker follows one playback session of one movie. It resumes from
//! the saved position, persists the position at most once per 5-second
//! bucket and clears it when the movie finishes.

use tracing::debug;

use super::player::PlayerType;
use crate::storage::{KeyValueStore, StorageError, WatchStore};

/// Progress is persisted once per bucket of this many seconds
pub const SAVE_BUCKET_SECS: f64 = 5.0;

/// Event reported by a running player
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlaybackEvent {
    /// Periodic position report
    Progress { current_time: f64, duration: f64 },
    /// Playback reached the end of the media
    Ended,
    /// Player closed before the end
    Closed,
}

/// Percentage watched, 0 when the duration is unknown
pub fn progress_percent(current_time: f64, duration: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 || !current_time.is_finite() {
        return 0.0;
    }
    current_time / duration * 100.0
}

fn bucket(seconds: f64) -> u64 {
    (seconds / SAVE_BUCKET_SECS).floor() as u64
}

/// Per-session progress state
#[derive(Debug, Clone)]
pub struct PlaybackTracker {
    movie_id: String,
    resume_from: Option<f64>,
    last_bucket: u64,
    current_time: f64,
    duration: f64,
    finished: bool,
    closed: bool,
}

impl PlaybackTracker {
    /// Start a session, reading the saved resume position
    pub fn start<S: KeyValueStore>(movie_id: impl Into<String>, store: &WatchStore<S>) -> Self {
        let movie_id = movie_id.into();
        let resume_from = store.progress(&movie_id);
        let position = resume_from.unwrap_or(0.0);
        debug!(movie_id = %movie_id, resume_from = ?resume_from, "playback session started");

        Self {
            movie_id,
            resume_from,
            last_bucket: bucket(position),
            current_time: position,
            duration: 0.0,
            finished: false,
            closed: false,
        }
    }

    /// Start a session for `player`. Players that cannot report their
    /// position start from the beginning, since a resumed run could never
    /// move the saved position forward.
    pub fn start_for<S: KeyValueStore>(
        movie_id: impl Into<String>,
        store: &WatchStore<S>,
        player: PlayerType,
    ) -> Self {
        if player.reports_progress() {
            return Self::start(movie_id, store);
        }
        let movie_id = movie_id.into();
        debug!(movie_id = %movie_id, player = %player, "playback session started without resume");
        Self {
            movie_id,
            resume_from: None,
            last_bucket: 0,
            current_time: 0.0,
            duration: 0.0,
            finished: false,
            closed: false,
        }
    }

    pub fn movie_id(&self) -> &str {
        &self.movie_id
    }

    /// Position the player should start at
    pub fn resume_position(&self) -> Option<f64> {
        self.resume_from
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn percent(&self) -> f64 {
        progress_percent(self.current_time, self.duration)
    }

    /// Natural end reached
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Session over (ended or closed)
    pub fn is_done(&self) -> bool {
        self.finished || self.closed
    }

    /// Record a position report. Returns true when the position was persisted.
    pub fn on_progress<S: KeyValueStore>(
        &mut self,
        store: &mut WatchStore<S>,
        current_time: f64,
        duration: f64,
    ) -> Result<bool, StorageError> {
        if self.is_done() || !current_time.is_finite() || current_time < 0.0 {
            return Ok(false);
        }

        self.current_time = current_time;
        self.duration = duration;

        let b = bucket(current_time);
        if b == self.last_bucket {
            return Ok(false);
        }
        self.last_bucket = b;
        store.save_progress(&self.movie_id, current_time)?;
        Ok(true)
    }

    /// Natural end: clear the saved position once, then ignore further events
    pub fn on_ended<S: KeyValueStore>(&mut self, store: &mut WatchStore<S>) -> Result<(), StorageError> {
        if self.is_done() {
            return Ok(());
        }
        self.finished = true;
        if self.duration > 0.0 {
            self.current_time = self.duration;
        }
        debug!(movie_id = %self.movie_id, "playback finished, clearing progress");
        store.clear_progress(&self.movie_id)
    }

    /// Early close keeps the last saved position
    pub fn on_closed(&mut self) {
        self.closed = true;
    }

    /// Dispatch a player event
    pub fn apply<S: KeyValueStore>(
        &mut self,
        store: &mut WatchStore<S>,
        event: PlaybackEvent,
    ) -> Result<(), StorageError> {
        match event {
            PlaybackEvent::Progress {
                current_time,
                duration,
            } => self.on_progress(store, current_time, duration).map(|_| ()),
            PlaybackEvent::Ended => self.on_ended(store),
            PlaybackEvent::Closed => {
                self.on_closed();
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(30.0, 120.0), 25.0);
        assert_eq!(progress_percent(30.0, 0.0), 0.0);
        assert_eq!(progress_percent(30.0, f64::NAN), 0.0);
        assert_eq!(progress_percent(30.0, f64::INFINITY), 0.0);
    }

    #[test]
    fn test_bucket() {
        assert_eq!(bucket(0.0), 0);
        assert_eq!(bucket(4.99), 0);
        assert_eq!(bucket(5.0), 1);
        assert_eq!(bucket(12.3), 2);
    }

    #[test]
    fn test_start_for_vlc_ignores_saved_position() {
        let mut store = WatchStore::new(crate::storage::MemoryStore::new());
        store.save_progress("m1", 42.0).unwrap();

        let tracker = PlaybackTracker::start_for("m1", &store, PlayerType::Vlc);
        assert_eq!(tracker.resume_position(), None);
        assert_eq!(tracker.current_time(), 0.0);

        let tracker = PlaybackTracker::start_for("m1", &store, PlayerType::Mpv);
        let expected = if cfg!(unix) { Some(42.0) } else { None };
        assert_eq!(tracker.resume_position(), expected);
    }
}
