//! Integration tests for MovieStream
//!
//! Tests are organized by component:
//! - catalog_test: Catalog and admin HTTP client tests
//! - storage_test: Watchlist, history, progress and token persistence
//! - carousel_test: Featured selection, rotation and home rows
//! - tracker_test: Resume and progress tracking, play side effects
//! - player_test: Player process exit handling
//! - search_test: Search composition and stale reply handling
//! - cli_test: CLI parsing, JSON output and command handlers
//! - ui_test: UI component tests
//! - e2e_test: End-to-end flows (Home -> Detail -> Play, Search, Admin)

// Note: Each test file is a separate integration test crate
// Tests are run individually by cargo, not via mod.rs
