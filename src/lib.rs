//! MovieStream - terminal catalog and player for a MovieStream backend
//!
//! Browse the catalog, search with genre/year filters, keep a watchlist,
//! play movies in a local player with resume, and manage the catalog as an
//! admin. Everything is available from the TUI and as CLI subcommands.
//!
//! # Modules
//!
//! - `models` - Catalog and watch-state data structures
//! - `api` - Catalog client, search composition, admin guard
//! - `storage` - Key-value persistence and watch state
//! - `playback` - Carousel, progress tracking, local player
//! - `browse` - Home page composition
//! - `config` / `logging` - Configuration file and tracing setup
//! - `cli` / `commands` - Subcommands and their handlers
//! - `app` / `ui` - TUI state and rendering

pub mod api;
pub mod app;
pub mod browse;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod models;
pub mod playback;
pub mod storage;
pub mod ui;

// Re-export commonly used types
pub use models::{AdminStats, Genre, HistoryEntry, Movie, MovieFields, MovieUpdate, NewGenre};

pub use api::{AdminContext, AdminGuard, CatalogClient, CatalogError, SearchForm, SearchQuery};
pub use app::{App, AppState};
pub use browse::HomeFeed;
pub use config::Config;
pub use playback::{Carousel, PlaybackTracker, PlayerType};
pub use storage::{FileStore, KeyValueStore, MemoryStore, WatchStore};
