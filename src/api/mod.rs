//! Backend API access
//!
//! - Catalog: public movie and genre endpoints
//! - Admin: token gate and authenticated mutations
//! - Search: request composition for the search endpoint

pub mod admin;
pub mod catalog;
pub mod search;

pub use admin::{AdminContext, AdminGuard};
pub use catalog::{CatalogClient, CatalogError};
pub use search::{SearchForm, SearchQuery, SearchState};
