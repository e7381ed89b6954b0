//! Admin access and catalog mutations
//!
//! The admin token is checked once when entering the admin area. The
//! resulting [`AdminContext`] is required by every mutating call, so
//! code without a validated token cannot reach them.

use tracing::{info, warn};

use super::catalog::{CatalogClient, CatalogError};
use crate::models::{AdminStats, Genre, Movie, MovieFields, MovieUpdate, NewGenre};
use crate::storage::{KeyValueStore, WatchStore};

/// Proof that a token was validated by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminContext {
    token: String,
}

impl AdminContext {
    fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }
}

/// Gate in front of the admin area
pub struct AdminGuard;

impl AdminGuard {
    /// Validate a typed token and remember it on success
    pub async fn login<S: KeyValueStore>(
        client: &CatalogClient,
        store: &mut WatchStore<S>,
        token: &str,
    ) -> Result<AdminContext, CatalogError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(CatalogError::Validation(
                "Please enter admin token".to_string(),
            ));
        }

        let ctx = Self::check(client, token).await?;
        Self::remember(store, &ctx);
        info!("admin login succeeded");
        Ok(ctx)
    }

    /// Validate the stored token, if any
    pub async fn enter<S: KeyValueStore>(
        client: &CatalogClient,
        store: &WatchStore<S>,
    ) -> Result<AdminContext, CatalogError> {
        let token = store.admin_token().ok_or_else(|| CatalogError::Auth {
            status: 401,
            message: "Not logged in".to_string(),
        })?;
        Self::check(client, &token).await
    }

    /// Forget the stored token
    pub fn logout<S: KeyValueStore>(store: &mut WatchStore<S>) {
        if let Err(e) = store.clear_admin_token() {
            warn!(error = %e, "could not clear admin token");
        }
    }

    /// Persist a validated token. Failure only costs the next login.
    pub fn remember<S: KeyValueStore>(store: &mut WatchStore<S>, ctx: &AdminContext) {
        if let Err(e) = store.set_admin_token(ctx.token()) {
            warn!(error = %e, "could not persist admin token");
        }
    }

    /// Ask the backend whether a token is valid, without touching storage
    pub async fn check(client: &CatalogClient, token: &str) -> Result<AdminContext, CatalogError> {
        let validation = client.validate_token(token).await?;
        if validation.valid {
            Ok(AdminContext::new(token))
        } else {
            Err(CatalogError::Auth {
                status: 403,
                message: "Invalid admin token".to_string(),
            })
        }
    }
}

// =============================================================================
// Admin operations
// =============================================================================

impl CatalogClient {
    /// Create a genre
    pub async fn create_genre(
        &self,
        ctx: &AdminContext,
        genre: &NewGenre,
    ) -> Result<Genre, CatalogError> {
        let url = self.url("/admin/genres");
        let request = self.http().post(&url).bearer_auth(ctx.token()).json(genre);
        Self::decode(self.send(request).await?).await
    }

    /// Delete a genre by ID
    pub async fn delete_genre(&self, ctx: &AdminContext, id: &str) -> Result<(), CatalogError> {
        let url = self.url(&format!("/admin/genres/{}", urlencoding::encode(id)));
        self.send(self.http().delete(&url).bearer_auth(ctx.token()))
            .await?;
        Ok(())
    }

    /// Create a movie
    pub async fn create_movie(
        &self,
        ctx: &AdminContext,
        fields: &MovieFields,
    ) -> Result<Movie, CatalogError> {
        let url = self.url("/admin/movies");
        let request = self.http().post(&url).bearer_auth(ctx.token()).json(fields);
        Self::decode(self.send(request).await?).await
    }

    /// Update selected fields of a movie. An empty update is rejected
    /// without a request.
    pub async fn update_movie(
        &self,
        ctx: &AdminContext,
        id: &str,
        update: &MovieUpdate,
    ) -> Result<Movie, CatalogError> {
        if update.is_empty() {
            return Err(CatalogError::Validation("No fields to update".to_string()));
        }

        let url = self.url(&format!("/admin/movies/{}", urlencoding::encode(id)));
        let request = self.http().put(&url).bearer_auth(ctx.token()).json(update);
        Self::decode(self.send(request).await?).await
    }

    /// Delete a movie by ID
    pub async fn delete_movie(&self, ctx: &AdminContext, id: &str) -> Result<(), CatalogError> {
        let url = self.url(&format!("/admin/movies/{}", urlencoding::encode(id)));
        self.send(self.http().delete(&url).bearer_auth(ctx.token()))
            .await?;
        Ok(())
    }

    /// Dashboard totals and the ten most viewed movies
    pub async fn admin_stats(&self, ctx: &AdminContext) -> Result<AdminStats, CatalogError> {
        self.get("/admin/stats", Some(ctx.token())).await
    }
}
