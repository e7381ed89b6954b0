//! Playback coordination
//!
//! - Carousel: featured selection and auto-advance schedule
//! - Tracker: resume position and periodic progress persistence
//! - Session: side effects of an explicit Play
//! - Player: mpv/VLC launch and progress reporting

pub mod carousel;
pub mod player;
pub mod session;
pub mod tracker;

pub use carousel::{select_featured, AutoAdvance, Carousel};
pub use player::{LocalPlayer, PlayerError, PlayerHandle, PlayerType};
pub use tracker::{PlaybackEvent, PlaybackTracker};
