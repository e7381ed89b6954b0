//! Local persistence for watch state
//!
//! - Store: string key/value backends (in-memory and JSON file)
//! - Watch: watchlist, history, playback progress and admin token on top of a store

pub mod store;
pub mod watch;

pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError};
pub use watch::{WatchStore, HISTORY_LIMIT};
