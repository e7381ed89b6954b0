//! CLI Command Handlers
//!
//! Implements all CLI commands by calling the catalog client and watch store.
//! Each handler takes CLI args, the shared Context and Output, returns ExitCode.

use tracing::warn;

use crate::api::search::{NO_RESULTS_MESSAGE, PROMPT_MESSAGE};
use crate::api::{AdminContext, AdminGuard, CatalogClient, CatalogError, SearchQuery};
use crate::browse::{HomeFeed, HOME_MOVIE_LIMIT};
use crate::cli::{
    AdminAction, AdminCmd, ExitCode, HistoryCmd, InfoCmd, MoviesCmd, Output, PlayCmd,
    PlaybackReport, ProgressCmd, ProgressStatus, SearchCmd, StatusOk, WatchlistAction,
    WatchlistCmd, WatchlistStatus,
};
use crate::config::Config;
use crate::models::{format_clock, Genre, Movie, NewGenre};
use crate::playback::{session, LocalPlayer, PlaybackTracker, PlayerType};
use crate::storage::{FileStore, KeyValueStore, MemoryStore, WatchStore};

/// Watch store with the backend chosen at runtime
pub type SharedStore = WatchStore<Box<dyn KeyValueStore + Send>>;

// =============================================================================
// Context
// =============================================================================

/// Resolved configuration plus the clients built from it
pub struct Context {
    pub config: Config,
    pub client: CatalogClient,
}

impl Context {
    pub fn new(config: Config) -> Self {
        let client = CatalogClient::from_config(&config);
        Self { config, client }
    }

    /// Open the watch store. Without any usable location the session runs
    /// on a volatile store.
    pub fn open_store(&self) -> SharedStore {
        let store: Box<dyn KeyValueStore + Send> = match self.config.resolved_storage_path() {
            Some(path) => Box::new(FileStore::open(path)),
            None => {
                warn!("no data directory, watch state will not persist");
                Box::new(MemoryStore::new())
            }
        };
        WatchStore::new(store)
    }
}

fn movie_line(movie: &Movie) -> String {
    format!(
        "{}  {}  [{}]  {} views",
        movie.id,
        movie,
        movie.genres.join(", "),
        movie.views_str()
    )
}

fn movie_lines(movies: &[Movie]) -> String {
    movies.iter().map(movie_line).collect::<Vec<_>>().join("\n")
}

fn serialize_failed(output: &Output, e: anyhow::Error) -> ExitCode {
    output.error(format!("Failed to serialize: {}", e), ExitCode::Error)
}

// =============================================================================
// Home Command
// =============================================================================

pub async fn home_cmd(ctx: &Context, output: &Output) -> ExitCode {
    output.info("Loading home page...");

    let (movies, genres) = tokio::join!(
        ctx.client.list_movies(HOME_MOVIE_LIMIT),
        ctx.client.list_genres()
    );

    let movies = match movies {
        Ok(m) => m,
        Err(e) => return output.catalog_error(&e),
    };
    let genres = genres.unwrap_or_else(|e| {
        warn!(error = %e, "genre list unavailable, skipping genre rows");
        Vec::new()
    });

    let feed = HomeFeed::compose(&movies, &genres);

    let mut text = String::from("Featured:\n");
    for (i, movie) in feed.featured.iter().enumerate() {
        text.push_str(&format!("  {}. {}\n", i + 1, movie_line(movie)));
    }
    for row in &feed.rows {
        text.push_str(&format!("\n{}:\n", row.title));
        for movie in &row.movies {
            text.push_str(&format!("  {}\n", movie_line(movie)));
        }
    }

    if let Err(e) = output.print_text(&feed, text.trim_end()) {
        return serialize_failed(output, e);
    }
    ExitCode::Success
}

// =============================================================================
// Catalog Commands
// =============================================================================

pub async fn movies_cmd(cmd: MoviesCmd, ctx: &Context, output: &Output) -> ExitCode {
    match ctx.client.list_movies(cmd.limit).await {
        Ok(movies) => {
            if let Err(e) = output.print_text(&movies, movie_lines(&movies)) {
                return serialize_failed(output, e);
            }
            ExitCode::Success
        }
        Err(e) => output.catalog_error(&e),
    }
}

pub async fn info_cmd(cmd: InfoCmd, ctx: &Context, output: &Output) -> ExitCode {
    output.info(format!("Getting info for: {}", cmd.id));

    match ctx.client.get_movie(&cmd.id).await {
        Ok(movie) => {
            let store = ctx.open_store();
            let listed = if store.is_in_watchlist(&movie.id) {
                "yes"
            } else {
                "no"
            };
            let text = format!(
                "{}\n{} | {} | {}\nGenres: {}\n\n{}\n\nCast: {}\nViews: {}\nSubtitles: {}\nIn watchlist: {}",
                movie,
                movie.release_year,
                movie.runtime_str(),
                movie.language,
                movie.genres.join(", "),
                movie.synopsis,
                movie.cast.join(", "),
                movie.views_str(),
                movie.subtitles_str(),
                listed
            );
            if let Err(e) = output.print_text(&movie, text) {
                return serialize_failed(output, e);
            }
            ExitCode::Success
        }
        Err(CatalogError::NotFound) => output.error("Movie not found", ExitCode::NotFound),
        Err(e) => output.catalog_error(&e),
    }
}

pub async fn search_cmd(cmd: SearchCmd, ctx: &Context, output: &Output) -> ExitCode {
    let Some(query) = SearchQuery::compose(&cmd.query, cmd.genre.as_deref(), cmd.year) else {
        output.info(PROMPT_MESSAGE);
        if let Err(e) = output.print_text(Vec::<Movie>::new(), "") {
            return serialize_failed(output, e);
        }
        return ExitCode::Success;
    };

    output.info(format!("Searching for: {}", query.q));

    match ctx.client.search_movies(&query).await {
        Ok(movies) => {
            if movies.is_empty() {
                output.info(NO_RESULTS_MESSAGE);
            }
            if let Err(e) = output.print_text(&movies, movie_lines(&movies)) {
                return serialize_failed(output, e);
            }
            ExitCode::Success
        }
        Err(e) => output.catalog_error(&e),
    }
}

pub async fn genres_cmd(ctx: &Context, output: &Output) -> ExitCode {
    match ctx.client.list_genres().await {
        Ok(genres) => {
            let text = genres
                .iter()
                .map(|g: &Genre| format!("{}  {}", g.id, g))
                .collect::<Vec<_>>()
                .join("\n");
            if let Err(e) = output.print_text(&genres, text) {
                return serialize_failed(output, e);
            }
            ExitCode::Success
        }
        Err(e) => output.catalog_error(&e),
    }
}

// =============================================================================
// Play Command
// =============================================================================

pub async fn play_cmd(cmd: PlayCmd, ctx: &Context, output: &Output) -> ExitCode {
    let movie = match ctx.client.get_movie(&cmd.id).await {
        Ok(m) => m,
        Err(CatalogError::NotFound) => return output.error("Movie not found", ExitCode::NotFound),
        Err(e) => return output.catalog_error(&e),
    };

    let player_type: PlayerType = cmd.player.map(Into::into).unwrap_or(ctx.config.player);
    let player = LocalPlayer::new(player_type);
    if !player.is_available().await {
        return output.error(
            format!("{} not found. Install it first.", player_type.display_name()),
            ExitCode::Error,
        );
    }

    let mut store = ctx.open_store();
    let tracker = PlaybackTracker::start_for(&movie.id, &store, player_type);
    if let Some(position) = tracker.resume_position() {
        output.info(format!("Resuming at {}", format_clock(position)));
    }

    let view_task = session::record_play(&ctx.client, &mut store, &movie.id);

    output.info(format!("Opening {} in {}...", movie, player_type.display_name()));
    let mut handle = match player.play(&movie, tracker.resume_position()) {
        Ok(h) => h,
        Err(e) => {
            let _ = view_task.await;
            return output.error(format!("Failed to start player: {}", e), ExitCode::Error);
        }
    };

    let resumed_from = tracker.resume_position();
    let tracker = session::drive(tracker, &mut store, handle.events_mut()).await;
    let _ = view_task.await;

    let report = PlaybackReport {
        movie_id: movie.id.clone(),
        title: movie.title.clone(),
        player: player_type.display_name().to_string(),
        resumed_from,
        position: tracker.current_time(),
        duration: tracker.duration(),
        percent: tracker.percent(),
        finished: tracker.is_finished(),
    };
    let text = if report.finished {
        format!("Finished {}", movie)
    } else if player_type.reports_progress() {
        format!(
            "Stopped {} at {} / {} ({:.0}%)",
            movie,
            format_clock(report.position),
            format_clock(report.duration),
            report.percent
        )
    } else {
        format!("Closed {}", movie)
    };

    if let Err(e) = output.print_text(&report, text) {
        return serialize_failed(output, e);
    }
    ExitCode::Success
}

// =============================================================================
// Watch State Commands
// =============================================================================

pub async fn watchlist_cmd(cmd: WatchlistCmd, ctx: &Context, output: &Output) -> ExitCode {
    let mut store = ctx.open_store();

    let (id, result) = match cmd.action.unwrap_or(WatchlistAction::List) {
        WatchlistAction::List => {
            let ids = store.watchlist();
            if let Err(e) = output.print_text(&ids, ids.join("\n")) {
                return serialize_failed(output, e);
            }
            return ExitCode::Success;
        }
        WatchlistAction::Add { id } => {
            let r = store.add_to_watchlist(&id).map(|changed| (true, changed));
            (id, r)
        }
        WatchlistAction::Remove { id } => {
            let r = store.remove_from_watchlist(&id).map(|changed| (false, changed));
            (id, r)
        }
        WatchlistAction::Toggle { id } => {
            let r = store.toggle_watchlist(&id).map(|listed| (listed, true));
            (id, r)
        }
    };

    match result {
        Ok((in_watchlist, changed)) => {
            let text = match (in_watchlist, changed) {
                (true, true) => format!("Added {} to watchlist", id),
                (false, true) => format!("Removed {} from watchlist", id),
                (true, false) => format!("{} is already in watchlist", id),
                (false, false) => format!("{} was not in watchlist", id),
            };
            let status = WatchlistStatus {
                movie_id: id,
                in_watchlist,
                changed,
            };
            if let Err(e) = output.print_text(&status, text) {
                return serialize_failed(output, e);
            }
            ExitCode::Success
        }
        Err(e) => output.error(format!("Failed to update watchlist: {}", e), ExitCode::Error),
    }
}

pub async fn history_cmd(cmd: HistoryCmd, ctx: &Context, output: &Output) -> ExitCode {
    let store = ctx.open_store();
    let mut entries = store.history();
    if let Some(limit) = cmd.limit {
        entries.truncate(limit);
    }

    let text = entries
        .iter()
        .map(|e| format!("{}  {}", e.timestamp.to_rfc3339(), e.movie_id))
        .collect::<Vec<_>>()
        .join("\n");
    if let Err(e) = output.print_text(&entries, text) {
        return serialize_failed(output, e);
    }
    ExitCode::Success
}

pub async fn progress_cmd(cmd: ProgressCmd, ctx: &Context, output: &Output) -> ExitCode {
    let mut store = ctx.open_store();

    if cmd.clear {
        if let Err(e) = store.clear_progress(&cmd.id) {
            return output.error(format!("Failed to clear progress: {}", e), ExitCode::Error);
        }
    }

    let status = ProgressStatus {
        position: store.progress(&cmd.id),
        movie_id: cmd.id,
    };
    let text = match status.position {
        Some(p) => format!("{} resumes at {}", status.movie_id, format_clock(p)),
        None => format!("{} has no saved position", status.movie_id),
    };
    if let Err(e) = output.print_text(&status, text) {
        return serialize_failed(output, e);
    }
    ExitCode::Success
}

// =============================================================================
// Admin Commands
// =============================================================================

pub async fn admin_cmd(cmd: AdminCmd, ctx: &Context, output: &Output) -> ExitCode {
    let mut store = ctx.open_store();

    match cmd.action {
        AdminAction::Login { token } => {
            match AdminGuard::login(&ctx.client, &mut store, &token).await {
                Ok(_) => {
                    if let Err(e) = output.print_text(StatusOk::default(), "Login successful!") {
                        return serialize_failed(output, e);
                    }
                    ExitCode::Success
                }
                Err(e) => output.catalog_error(&e),
            }
        }
        AdminAction::Logout => {
            AdminGuard::logout(&mut store);
            if let Err(e) = output.print_text(StatusOk::default(), "Logged out") {
                return serialize_failed(output, e);
            }
            ExitCode::Success
        }
        action => {
            let admin = match AdminGuard::enter(&ctx.client, &store).await {
                Ok(a) => a,
                Err(e @ CatalogError::Auth { .. }) => {
                    return output.error(
                        format!("{} (run `moviestream admin login <token>`)", e),
                        ExitCode::AuthFailed,
                    )
                }
                Err(e) => return output.catalog_error(&e),
            };
            admin_action(action, &admin, ctx, output).await
        }
    }
}

async fn admin_action(
    action: AdminAction,
    admin: &AdminContext,
    ctx: &Context,
    output: &Output,
) -> ExitCode {
    let client = &ctx.client;

    let printed = match action {
        AdminAction::Stats => match client.admin_stats(admin).await {
            Ok(stats) => {
                let mut text = format!(
                    "Movies: {}\nViews: {}\nGenres: {}\n\nTop movies:",
                    stats.total_movies,
                    crate::models::format_count(stats.total_views),
                    stats.total_genres
                );
                for (i, m) in stats.top_movies.iter().enumerate() {
                    text.push_str(&format!(
                        "\n  {}. {} ({} views)",
                        i + 1,
                        m.title,
                        crate::models::format_count(m.view_count)
                    ));
                }
                output.print_text(&stats, text)
            }
            Err(e) => return output.catalog_error(&e),
        },
        AdminAction::GenreAdd { name, slug } => {
            let genre = NewGenre::new(name.trim(), slug.as_deref());
            if genre.name.is_empty() || genre.slug.is_empty() {
                return output.error(
                    "Genre name must contain letters or digits",
                    ExitCode::ValidationFailed,
                );
            }
            match client.create_genre(admin, &genre).await {
                Ok(created) => output.print_text(&created, format!("Created genre {}", created)),
                Err(e) => return output.catalog_error(&e),
            }
        }
        AdminAction::GenreRm { id } => match client.delete_genre(admin, &id).await {
            Ok(()) => output.print_text(StatusOk::default(), format!("Deleted genre {}", id)),
            Err(CatalogError::NotFound) => {
                return output.error("Genre not found", ExitCode::NotFound)
            }
            Err(e) => return output.catalog_error(&e),
        },
        AdminAction::MovieAdd(args) => match client.create_movie(admin, &args.to_fields()).await {
            Ok(movie) => output.print_text(&movie, format!("Created {} ({})", movie, movie.id)),
            Err(e) => return output.catalog_error(&e),
        },
        AdminAction::MovieUpdate(args) => {
            match client.update_movie(admin, &args.id, &args.to_update()).await {
                Ok(movie) => output.print_text(&movie, format!("Updated {}", movie)),
                Err(CatalogError::NotFound) => {
                    return output.error("Movie not found", ExitCode::NotFound)
                }
                Err(e) => return output.catalog_error(&e),
            }
        }
        AdminAction::MovieRm { id } => match client.delete_movie(admin, &id).await {
            Ok(()) => output.print_text(StatusOk::default(), format!("Deleted movie {}", id)),
            Err(CatalogError::NotFound) => {
                return output.error("Movie not found", ExitCode::NotFound)
            }
            Err(e) => return output.catalog_error(&e),
        },
        AdminAction::Login { .. } | AdminAction::Logout => {
            return output.error("Unexpected admin action", ExitCode::InvalidArgs)
        }
    };

    if let Err(e) = printed {
        return serialize_failed(output, e);
    }
    ExitCode::Success
}

// =============================================================================
// Dispatch
// =============================================================================

/// Run one CLI subcommand
pub async fn run(command: crate::cli::Command, ctx: &Context, output: &Output) -> ExitCode {
    use crate::cli::Command;

    match command {
        Command::Home(_) => home_cmd(ctx, output).await,
        Command::Movies(cmd) => movies_cmd(cmd, ctx, output).await,
        Command::Info(cmd) => info_cmd(cmd, ctx, output).await,
        Command::Search(cmd) => search_cmd(cmd, ctx, output).await,
        Command::Genres(_) => genres_cmd(ctx, output).await,
        Command::Play(cmd) => play_cmd(cmd, ctx, output).await,
        Command::Watchlist(cmd) => watchlist_cmd(cmd, ctx, output).await,
        Command::History(cmd) => history_cmd(cmd, ctx, output).await,
        Command::Progress(cmd) => progress_cmd(cmd, ctx, output).await,
        Command::Admin(cmd) => admin_cmd(cmd, ctx, output).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_movie() -> Movie {
        serde_json::from_value(serde_json::json!({
            "id": "m1",
            "title": "Ocean Deep",
            "synopsis": "Under the sea.",
            "genres": ["Documentary", "Nature"],
            "releaseYear": 2021,
            "runtime": 95,
            "posterUrl": "",
            "videoUrl": "",
            "viewCount": 1500,
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_movie_line() {
        assert_eq!(
            movie_line(&sample_movie()),
            "m1  Ocean Deep (2021)  [Documentary, Nature]  1,500 views"
        );
    }

    #[test]
    fn test_context_uses_configured_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let ctx = Context::new(Config {
            storage_path: Some(path.clone()),
            ..Config::default()
        });
        let mut store = ctx.open_store();
        store.toggle_watchlist("m1").unwrap();
        assert!(path.exists());
        assert!(ctx.open_store().is_in_watchlist("m1"));
    }
}
