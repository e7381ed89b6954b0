//! Playback tracker and session tests
//!
//! Resume position, bucketed progress writes, clearing on natural end and
//! the side effects of an explicit Play.

use chrono::{TimeZone, Utc};
use mockito::Server;
use moviestream::api::CatalogClient;
use moviestream::models::Movie;
use moviestream::playback::{session, LocalPlayer, PlaybackEvent, PlaybackTracker, PlayerType};
use moviestream::storage::{KeyValueStore, MemoryStore, StorageError, WatchStore};
use tokio::sync::mpsc;

fn store() -> WatchStore<MemoryStore> {
    WatchStore::new(MemoryStore::new())
}

fn movie(id: &str) -> Movie {
    Movie {
        id: id.to_string(),
        title: "Ocean Deep".into(),
        synopsis: String::new(),
        genres: Vec::new(),
        cast: Vec::new(),
        release_year: 2021,
        runtime: 95,
        poster_url: String::new(),
        video_url: "https://video.example/ocean.mp4".into(),
        language: "English".into(),
        subtitles: vec!["English".into(), "Spanish".into()],
        view_count: 0,
        created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    }
}

fn args(cmd: &tokio::process::Command) -> Vec<String> {
    cmd.as_std()
        .get_args()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

// =============================================================================
// Resume
// =============================================================================

#[test]
fn test_resume_from_saved_position_before_any_write() {
    let mut store = store();
    store.save_progress("m1", 42.0).unwrap();

    let mut tracker = PlaybackTracker::start("m1", &store);
    assert_eq!(tracker.resume_position(), Some(42.0));
    assert_eq!(tracker.current_time(), 42.0);

    // A report inside the resume bucket writes nothing
    let wrote = tracker.on_progress(&mut store, 43.0, 5700.0).unwrap();
    assert!(!wrote);
    assert_eq!(store.progress("m1"), Some(42.0));
}

#[test]
fn test_player_command_seeks_to_resume_position() {
    let player = LocalPlayer::new(PlayerType::Mpv);
    let mpv = args(&player.command_for(&movie("m1"), Some(42.0), None));
    assert_eq!(mpv[0], "https://video.example/ocean.mp4");
    assert!(mpv.contains(&"--start=42.000".to_string()));
    assert!(mpv
        .iter()
        .any(|a| a == "--force-media-title=Ocean Deep (2021) [subs: English, Spanish]"));

    let vlc = args(&LocalPlayer::new(PlayerType::Vlc).command_for(&movie("m1"), Some(42.0), None));
    assert!(vlc.contains(&"--start-time=42.000".to_string()));

    let fresh = args(&player.command_for(&movie("m1"), None, None));
    assert!(!fresh.iter().any(|a| a.starts_with("--start")));
}

#[test]
fn test_no_saved_progress_starts_at_zero() {
    let store = store();
    let tracker = PlaybackTracker::start("m1", &store);
    assert_eq!(tracker.resume_position(), None);
    assert_eq!(tracker.current_time(), 0.0);
}

// =============================================================================
// Progress Writes
// =============================================================================

#[test]
fn test_progress_written_once_per_bucket() {
    let mut store = store();
    let mut tracker = PlaybackTracker::start("m1", &store);

    let writes: Vec<bool> = [1.0, 4.9, 5.1, 7.0, 10.2, 10.9]
        .into_iter()
        .map(|t| tracker.on_progress(&mut store, t, 100.0).unwrap())
        .collect();

    assert_eq!(writes, vec![false, false, true, false, true, false]);
    assert_eq!(store.progress("m1"), Some(10.2));
    assert!((tracker.percent() - 10.9).abs() < 1e-9);
}

#[test]
fn test_invalid_positions_ignored() {
    let mut store = store();
    let mut tracker = PlaybackTracker::start("m1", &store);
    assert!(!tracker.on_progress(&mut store, f64::NAN, 100.0).unwrap());
    assert!(!tracker.on_progress(&mut store, -3.0, 100.0).unwrap());
    assert_eq!(store.progress("m1"), None);
}

#[test]
fn test_close_keeps_last_saved_position() {
    let mut store = store();
    let mut tracker = PlaybackTracker::start("m1", &store);
    tracker.on_progress(&mut store, 31.0, 100.0).unwrap();
    tracker.apply(&mut store, PlaybackEvent::Closed).unwrap();

    assert!(tracker.is_done());
    assert!(!tracker.is_finished());
    assert_eq!(store.progress("m1"), Some(31.0));
    // Late reports after close are dropped
    assert!(!tracker.on_progress(&mut store, 60.0, 100.0).unwrap());
}

// =============================================================================
// Natural End
// =============================================================================

#[test]
fn test_two_full_plays_second_starts_at_zero() {
    let mut store = store();

    let mut first = PlaybackTracker::start("m1", &store);
    for t in [10.0, 50.0, 99.0] {
        first.on_progress(&mut store, t, 100.0).unwrap();
    }
    assert_eq!(store.progress("m1"), Some(99.0));
    first.apply(&mut store, PlaybackEvent::Ended).unwrap();
    assert!(first.is_finished());
    assert_eq!(first.percent(), 100.0);
    assert_eq!(store.progress("m1"), None);
    assert!(store.inner().get("movie-progress-m1").is_none());

    let second = PlaybackTracker::start("m1", &store);
    assert_eq!(second.resume_position(), None);
    assert_eq!(second.current_time(), 0.0);
}

#[test]
fn test_ended_twice_is_harmless() {
    let mut store = store();
    let mut tracker = PlaybackTracker::start("m1", &store);
    tracker.on_ended(&mut store).unwrap();
    store.save_progress("m1", 5.0).unwrap();
    tracker.on_ended(&mut store).unwrap();
    // The second end is ignored, so the unrelated write survives
    assert_eq!(store.progress("m1"), Some(5.0));
}

// =============================================================================
// Session
// =============================================================================

#[tokio::test]
async fn test_drive_feeds_events_until_end() {
    let mut store = store();
    store.save_progress("m1", 20.0).unwrap();
    let tracker = PlaybackTracker::start("m1", &store);

    let (tx, mut rx) = mpsc::channel(8);
    for event in [
        PlaybackEvent::Progress {
            current_time: 26.0,
            duration: 100.0,
        },
        PlaybackEvent::Ended,
        PlaybackEvent::Progress {
            current_time: 50.0,
            duration: 100.0,
        },
    ] {
        tx.send(event).await.unwrap();
    }

    let tracker = session::drive(tracker, &mut store, &mut rx).await;
    assert!(tracker.is_finished());
    assert_eq!(store.progress("m1"), None);
}

#[tokio::test]
async fn test_drive_treats_dropped_watcher_as_close() {
    let mut store = store();
    let tracker = PlaybackTracker::start("m1", &store);

    let (tx, mut rx) = mpsc::channel(8);
    tx.send(PlaybackEvent::Progress {
        current_time: 12.0,
        duration: 100.0,
    })
    .await
    .unwrap();
    drop(tx);

    let tracker = session::drive(tracker, &mut store, &mut rx).await;
    assert!(tracker.is_done());
    assert!(!tracker.is_finished());
    assert_eq!(store.progress("m1"), Some(12.0));
}

/// Store whose writes fail while `failing` is set
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    failing: bool,
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.failing {
            return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full").into());
        }
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

#[tokio::test]
async fn test_drive_keeps_going_after_failed_write() {
    let mut store = WatchStore::new(FlakyStore {
        failing: true,
        ..FlakyStore::default()
    });
    let tracker = PlaybackTracker::start("m1", &store);

    let (tx, mut rx) = mpsc::channel(8);
    for event in [
        PlaybackEvent::Progress {
            current_time: 12.0,
            duration: 100.0,
        },
        PlaybackEvent::Progress {
            current_time: 31.0,
            duration: 100.0,
        },
        PlaybackEvent::Closed,
    ] {
        tx.send(event).await.unwrap();
    }

    let tracker = session::drive(tracker, &mut store, &mut rx).await;
    assert!(tracker.is_done());
    assert_eq!(tracker.current_time(), 31.0);
    assert_eq!(store.progress("m1"), None);
}

#[tokio::test]
async fn test_record_play_adds_history_and_counts_view() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/movies/m1/increment-view")
        .with_status(200)
        .with_body("{}")
        .expect(1)
        .create_async()
        .await;

    let client = CatalogClient::with_base_url(server.url());
    let mut store = store();
    store.save_progress("m1", 30.0).unwrap();

    session::record_play(&client, &mut store, "m1").await.unwrap();

    mock.assert_async().await;
    assert_eq!(store.history()[0].movie_id, "m1");
    // Resume position is untouched by a Play
    assert_eq!(store.progress("m1"), Some(30.0));
}

#[tokio::test]
async fn test_record_play_survives_backend_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/movies/m1/increment-view")
        .with_status(500)
        .create_async()
        .await;

    let client = CatalogClient::with_base_url(server.url());
    let mut store = store();

    session::record_play(&client, &mut store, "m1").await.unwrap();
    assert_eq!(store.history().len(), 1);
}
