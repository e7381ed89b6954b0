//! App state and core application logic
//!
//! Manages the screen state machine, navigation stack and keyboard
//! handling. Network work is queued as [`Action`]s and comes back on a
//! channel as [`AppEvent`]s, so key handling and state updates stay
//! synchronous and every store write happens on the UI loop.

use std::time::{Duration, Instant};

use chrono::{Datelike, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::{AdminContext, AdminGuard, CatalogClient, CatalogError, SearchForm, SearchQuery};
use crate::browse::{HomeFeed, HOME_MOVIE_LIMIT};
use crate::commands::SharedStore;
use crate::models::{format_clock, slugify, AdminStats, Genre, Movie, NewGenre};
use crate::playback::{
    session, AutoAdvance, Carousel, LocalPlayer, PlaybackTracker, PlayerError, PlayerHandle,
    PlayerType,
};

/// Years offered by the search year filter, newest first
pub const YEAR_FILTER_SPAN: u16 = 10;

pub const MOVIE_NOT_FOUND: &str = "Movie not found";

// =============================================================================
// App State Enum
// =============================================================================

/// Application state enum representing current screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppState {
    /// Featured carousel and movie rows
    #[default]
    Home,
    /// Search box, filters and results
    Search,
    /// Single movie detail
    Detail,
    /// Now playing in the local player
    Playing,
    /// Admin token prompt
    AdminLogin,
    /// Admin dashboard, genres and movies
    Admin,
}

// =============================================================================
// Input Mode
// =============================================================================

/// Current input mode for keyboard handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal navigation mode
    #[default]
    Normal,
    /// Text input mode (search box, token prompt or genre form focused)
    Editing,
}

// =============================================================================
// Loading State
// =============================================================================

/// Loading state for async operations
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadingState {
    #[default]
    Idle,
    /// Loading with optional message
    Loading(Option<String>),
    /// Error with message
    Error(String),
}

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadingState::Loading(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, LoadingState::Error(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            LoadingState::Loading(Some(msg)) => Some(msg),
            LoadingState::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

// =============================================================================
// Selection State (per-view)
// =============================================================================

/// Selection state for list views
#[derive(Debug, Clone, Default)]
pub struct ListState {
    /// Currently selected index
    pub selected: usize,
    /// Total number of items
    pub len: usize,
}

impl ListState {
    pub fn new(len: usize) -> Self {
        Self { selected: 0, len }
    }

    pub fn up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.len > 0 && self.selected < self.len - 1 {
            self.selected += 1;
        }
    }

    /// Move selection up by a page
    pub fn page_up(&mut self, page_size: usize) {
        self.selected = self.selected.saturating_sub(page_size);
    }

    /// Move selection down by a page
    pub fn page_down(&mut self, page_size: usize) {
        if self.len > 0 {
            self.selected = (self.selected + page_size).min(self.len - 1);
        }
    }

    pub fn first(&mut self) {
        self.selected = 0;
    }

    pub fn last(&mut self) {
        if self.len > 0 {
            self.selected = self.len - 1;
        }
    }

    /// Update length (e.g., when new results come in)
    pub fn set_len(&mut self, len: usize) {
        self.len = len;
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }
}

// =============================================================================
// Home
// =============================================================================

/// Home view state
#[derive(Debug, Clone, Default)]
pub struct HomeState {
    pub feed: HomeFeed,
    pub carousel: Carousel,
    /// Auto-advance schedule; exists only while home is on screen
    pub timer: Option<AutoAdvance>,
    /// Focused row: 0 is the carousel, then one per feed row
    pub row: usize,
    /// Selected movie in each feed row
    pub cols: Vec<usize>,
    pub loading: LoadingState,
}

impl HomeState {
    /// Replace the feed, resetting carousel and selection
    pub fn set_feed(&mut self, feed: HomeFeed) {
        self.carousel = Carousel::new(feed.featured.clone());
        self.cols = vec![0; feed.rows.len()];
        self.feed = feed;
        self.row = 0;
        self.timer = None;
        self.loading = LoadingState::Idle;
    }

    pub fn row_count(&self) -> usize {
        1 + self.feed.rows.len()
    }

    pub fn up(&mut self) {
        self.row = self.row.saturating_sub(1);
    }

    pub fn down(&mut self) {
        if self.row + 1 < self.row_count() {
            self.row += 1;
        }
    }

    /// Left on the carousel row steps the carousel, elsewhere the row
    pub fn left(&mut self) {
        if self.row == 0 {
            self.carousel.prev();
        } else if let Some(col) = self.cols.get_mut(self.row - 1) {
            *col = col.saturating_sub(1);
        }
    }

    pub fn right(&mut self) {
        if self.row == 0 {
            self.carousel.next();
            return;
        }
        let len = self
            .feed
            .rows
            .get(self.row - 1)
            .map(|r| r.movies.len())
            .unwrap_or(0);
        if let Some(col) = self.cols.get_mut(self.row - 1) {
            if *col + 1 < len {
                *col += 1;
            }
        }
    }

    /// Selected column of a feed row
    pub fn col(&self, row_index: usize) -> usize {
        self.cols.get(row_index).copied().unwrap_or(0)
    }

    /// Movie under the cursor
    pub fn selected_movie(&self) -> Option<&Movie> {
        if self.row == 0 {
            return self.carousel.current();
        }
        let row_index = self.row - 1;
        self.feed
            .rows
            .get(row_index)
            .and_then(|r| r.movies.get(self.col(row_index)))
    }

    /// Apply due auto-advance ticks, starting the schedule on first call
    pub fn tick(&mut self, now: Instant) {
        match self.timer.as_mut() {
            Some(timer) => {
                let due = timer.due_ticks(now);
                if due > 0 {
                    self.carousel.advance(due);
                }
            }
            None => self.timer = AutoAdvance::for_carousel(&self.carousel, now),
        }
    }
}

// =============================================================================
// Search
// =============================================================================

/// Search view state
#[derive(Debug, Clone, Default)]
pub struct SearchView {
    pub form: SearchForm,
    /// Cursor position in the query, in chars
    pub cursor: usize,
    pub list: ListState,
    /// Genre filter options
    pub genres: Vec<Genre>,
    /// Year filter options, newest first
    pub years: Vec<u16>,
    /// Latest request; replies to older ones are dropped
    pub pending: Option<SearchQuery>,
}

impl SearchView {
    pub fn new(current_year: u16) -> Self {
        Self {
            years: (0..YEAR_FILTER_SPAN)
                .map(|i| current_year.saturating_sub(i))
                .collect(),
            ..Self::default()
        }
    }

    fn byte_index(&self) -> usize {
        self.form
            .query
            .char_indices()
            .nth(self.cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.form.query.len())
    }

    fn char_len(&self) -> usize {
        self.form.query.chars().count()
    }

    /// Insert character at cursor
    pub fn insert(&mut self, c: char) {
        let at = self.byte_index();
        self.form.query.insert(at, c);
        self.cursor += 1;
    }

    /// Delete character before cursor
    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index();
            self.form.query.remove(at);
        }
    }

    /// Delete character at cursor
    pub fn delete(&mut self) {
        if self.cursor < self.char_len() {
            let at = self.byte_index();
            self.form.query.remove(at);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor < self.char_len() {
            self.cursor += 1;
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.char_len();
    }

    /// Query split around the cursor, for rendering
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.form.query.split_at(self.byte_index())
    }

    /// Submit the typed text
    pub fn submit(&mut self) -> Option<SearchQuery> {
        let query = self.form.submit();
        self.track(query)
    }

    /// Step the genre filter: none, each genre in turn, back to none
    pub fn cycle_genre(&mut self) -> Option<SearchQuery> {
        let next = match &self.form.genre {
            None => self.genres.first(),
            Some(current) => self
                .genres
                .iter()
                .position(|g| &g.name == current)
                .and_then(|i| self.genres.get(i + 1)),
        }
        .map(|g| g.name.clone());
        let query = self.form.set_genre(next);
        self.track(query)
    }

    /// Step the year filter the same way
    pub fn cycle_year(&mut self) -> Option<SearchQuery> {
        let next = match self.form.year {
            None => self.years.first().copied(),
            Some(current) => self
                .years
                .iter()
                .position(|y| *y == current)
                .and_then(|i| self.years.get(i + 1))
                .copied(),
        };
        let query = self.form.set_year(next);
        self.track(query)
    }

    fn track(&mut self, query: Option<SearchQuery>) -> Option<SearchQuery> {
        self.pending = query.clone();
        if query.is_none() {
            self.list.set_len(0);
        }
        query
    }

    /// Apply a reply. Returns false when the reply was stale.
    pub fn apply(&mut self, query: &SearchQuery, result: Result<Vec<Movie>, CatalogError>) -> bool {
        if self.pending.as_ref() != Some(query) {
            debug!(q = %query.q, "dropping stale search reply");
            return false;
        }
        self.pending = None;
        match result {
            Ok(movies) => {
                self.list = ListState::new(movies.len());
                self.form.apply_results(movies);
            }
            Err(e) => {
                warn!(q = %query.q, error = %e, "search failed");
                self.list = ListState::new(0);
                self.form.apply_error(e.to_string());
            }
        }
        true
    }

    pub fn selected_movie(&self) -> Option<&Movie> {
        self.form.state.movies().get(self.list.selected)
    }
}

// =============================================================================
// Detail
// =============================================================================

/// Detail view state
#[derive(Debug, Clone, Default)]
pub struct DetailState {
    pub movie_id: String,
    /// Cached copy while the fresh one loads
    pub movie: Option<Movie>,
    pub loading: LoadingState,
    pub in_watchlist: bool,
    /// Saved position, shown as a resume hint
    pub resume_at: Option<f64>,
}

// =============================================================================
// Playing
// =============================================================================

/// Playing view state
pub struct PlayingState {
    pub movie: Movie,
    pub tracker: PlaybackTracker,
    pub player: PlayerType,
    /// Running player; `None` until launched and after it stops
    pub handle: Option<PlayerHandle>,
}

impl PlayingState {
    /// Resume notice for the view, if the session resumed
    pub fn resume_notice(&self) -> Option<String> {
        self.tracker
            .resume_position()
            .map(|p| format!("Resumed from {}", format_clock(p)))
    }
}

// =============================================================================
// Admin
// =============================================================================

/// Admin tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdminTab {
    #[default]
    Dashboard,
    Genres,
    Movies,
}

impl AdminTab {
    pub fn next(self) -> Self {
        match self {
            AdminTab::Dashboard => AdminTab::Genres,
            AdminTab::Genres => AdminTab::Movies,
            AdminTab::Movies => AdminTab::Dashboard,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AdminTab::Dashboard => "DASHBOARD",
            AdminTab::Genres => "GENRES",
            AdminTab::Movies => "MOVIES",
        }
    }
}

/// Field focused in the genre form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenreField {
    #[default]
    Name,
    Slug,
}

/// Add-genre form. The slug follows the name until edited by hand.
#[derive(Debug, Clone, Default)]
pub struct GenreForm {
    pub name: String,
    pub slug: String,
    pub slug_edited: bool,
    pub field: GenreField,
}

impl GenreForm {
    pub fn insert(&mut self, c: char) {
        match self.field {
            GenreField::Name => {
                self.name.push(c);
                self.sync_slug();
            }
            GenreField::Slug => {
                self.slug.push(c);
                self.slug_edited = true;
            }
        }
    }

    pub fn backspace(&mut self) {
        match self.field {
            GenreField::Name => {
                self.name.pop();
                self.sync_slug();
            }
            GenreField::Slug => {
                self.slug.pop();
                // An emptied slug goes back to following the name
                self.slug_edited = !self.slug.is_empty();
                self.sync_slug();
            }
        }
    }

    pub fn toggle_field(&mut self) {
        self.field = match self.field {
            GenreField::Name => GenreField::Slug,
            GenreField::Slug => GenreField::Name,
        };
    }

    fn sync_slug(&mut self) {
        if !self.slug_edited {
            self.slug = slugify(&self.name);
        }
    }

    /// Request body, or the message to show when the name is missing
    pub fn to_new_genre(&self) -> Result<NewGenre, String> {
        if self.name.trim().is_empty() {
            return Err("Genre name is required".to_string());
        }
        Ok(NewGenre::new(self.name.trim(), Some(self.slug.as_str())))
    }
}

/// Something selected for deletion, waiting for a second `d`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingDelete {
    Genre(String),
    Movie(String),
}

/// Admin view state
#[derive(Debug, Clone, Default)]
pub struct AdminState {
    pub ctx: Option<AdminContext>,
    pub token_input: String,
    pub tab: AdminTab,
    pub stats: Option<AdminStats>,
    pub genres: Vec<Genre>,
    pub movies: Vec<Movie>,
    pub list: ListState,
    /// Open add-genre form
    pub form: Option<GenreForm>,
    pub pending_delete: Option<PendingDelete>,
    pub loading: LoadingState,
}

impl AdminState {
    fn tab_len(&self) -> usize {
        match self.tab {
            AdminTab::Dashboard => self.stats.as_ref().map(|s| s.top_movies.len()).unwrap_or(0),
            AdminTab::Genres => self.genres.len(),
            AdminTab::Movies => self.movies.len(),
        }
    }

    fn sync_list(&mut self) {
        let len = self.tab_len();
        self.list.set_len(len);
    }

    /// Item under the cursor on the genre/movie tabs
    fn selected_target(&self) -> Option<PendingDelete> {
        match self.tab {
            AdminTab::Genres => self
                .genres
                .get(self.list.selected)
                .map(|g| PendingDelete::Genre(g.id.clone())),
            AdminTab::Movies => self
                .movies
                .get(self.list.selected)
                .map(|m| PendingDelete::Movie(m.id.clone())),
            AdminTab::Dashboard => None,
        }
    }
}

// =============================================================================
// Async plumbing
// =============================================================================

/// Work queued by key handling for the event loop
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    LoadHome,
    LoadGenres,
    Search(SearchQuery),
    LoadMovie(String),
    /// History entry plus view increment
    RecordPlay(String),
    Launch {
        movie: Box<Movie>,
        start_at: Option<f64>,
    },
    /// Validate a token; `remember` stores it on success
    CheckAdmin {
        token: String,
        remember: bool,
    },
    LoadAdmin(AdminContext),
    CreateGenre(AdminContext, NewGenre),
    DeleteGenre(AdminContext, String),
    DeleteMovie(AdminContext, String),
}

/// Completed async work
#[derive(Debug)]
pub enum AppEvent {
    Home {
        movies: Result<Vec<Movie>, CatalogError>,
        genres: Result<Vec<Genre>, CatalogError>,
    },
    Genres(Result<Vec<Genre>, CatalogError>),
    SearchResults {
        query: SearchQuery,
        result: Result<Vec<Movie>, CatalogError>,
    },
    Movie {
        id: String,
        result: Result<Movie, CatalogError>,
    },
    AdminChecked {
        result: Result<AdminContext, CatalogError>,
        remember: bool,
    },
    AdminData {
        stats: Result<AdminStats, CatalogError>,
        genres: Result<Vec<Genre>, CatalogError>,
        movies: Result<Vec<Movie>, CatalogError>,
    },
    GenreCreated(Result<Genre, CatalogError>),
    Deleted {
        what: PendingDelete,
        result: Result<(), CatalogError>,
    },
}

/// Run one network action. Actions handled on the UI loop return `None`.
pub async fn perform(client: CatalogClient, action: Action) -> Option<AppEvent> {
    let event = match action {
        Action::LoadHome => {
            let (movies, genres) =
                tokio::join!(client.list_movies(HOME_MOVIE_LIMIT), client.list_genres());
            AppEvent::Home { movies, genres }
        }
        Action::LoadGenres => AppEvent::Genres(client.list_genres().await),
        Action::Search(query) => {
            let result = client.search_movies(&query).await;
            AppEvent::SearchResults { query, result }
        }
        Action::LoadMovie(id) => {
            let result = client.get_movie(&id).await;
            AppEvent::Movie { id, result }
        }
        Action::CheckAdmin { token, remember } => AppEvent::AdminChecked {
            result: AdminGuard::check(&client, &token).await,
            remember,
        },
        Action::LoadAdmin(ctx) => {
            let (stats, genres, movies) = tokio::join!(
                client.admin_stats(&ctx),
                client.list_genres(),
                client.list_movies(100)
            );
            AppEvent::AdminData {
                stats,
                genres,
                movies,
            }
        }
        Action::CreateGenre(ctx, genre) => {
            AppEvent::GenreCreated(client.create_genre(&ctx, &genre).await)
        }
        Action::DeleteGenre(ctx, id) => {
            let result = client.delete_genre(&ctx, &id).await;
            AppEvent::Deleted {
                what: PendingDelete::Genre(id),
                result,
            }
        }
        Action::DeleteMovie(ctx, id) => {
            let result = client.delete_movie(&ctx, &id).await;
            AppEvent::Deleted {
                what: PendingDelete::Movie(id),
                result,
            }
        }
        Action::RecordPlay(_) | Action::Launch { .. } => return None,
    };
    Some(event)
}

// =============================================================================
// Main Application State
// =============================================================================

/// Main application state
pub struct App {
    /// Current state/screen
    pub state: AppState,
    /// Navigation history stack
    pub nav_stack: Vec<AppState>,
    /// Whether the app is running
    pub running: bool,
    /// Current input mode
    pub input_mode: InputMode,
    /// Error popup
    pub error: Option<String>,
    /// One-line message in the status bar
    pub notice: Option<String>,

    // View-specific states
    pub home: HomeState,
    pub search: SearchView,
    pub detail: DetailState,
    pub playing: Option<PlayingState>,
    pub admin: AdminState,

    // Shared state
    pub client: CatalogClient,
    pub store: SharedStore,
    pub player_type: PlayerType,
    /// Queued work, drained by [`App::dispatch`]
    pub actions: Vec<Action>,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl App {
    /// Create the app and queue the home page load
    pub fn new(client: CatalogClient, store: SharedStore, player_type: PlayerType) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let current_year = u16::try_from(Utc::now().year()).unwrap_or(u16::MAX);

        let mut app = Self {
            state: AppState::Home,
            nav_stack: Vec::new(),
            running: true,
            input_mode: InputMode::Normal,
            error: None,
            notice: None,

            home: HomeState::default(),
            search: SearchView::new(current_year),
            detail: DetailState::default(),
            playing: None,
            admin: AdminState::default(),

            client,
            store,
            player_type,
            actions: Vec::new(),
            events_tx,
            events_rx,
        };
        app.reload_home();
        app
    }

    /// Navigate to a new state, pushing current to stack
    pub fn navigate(&mut self, state: AppState) {
        if self.state != state {
            self.nav_stack.push(self.state);
            self.state = state;
        }
        self.input_mode = InputMode::Normal;
    }

    /// Go back to previous state
    pub fn back(&mut self) -> bool {
        // If in editing mode, exit editing first
        if self.input_mode == InputMode::Editing {
            self.input_mode = InputMode::Normal;
            self.admin.form = None;
            return true;
        }

        if self.state == AppState::Playing {
            self.stop_playback();
        }

        if let Some(prev) = self.nav_stack.pop() {
            self.state = prev;
            true
        } else {
            false
        }
    }

    /// Drop the whole stack and show home
    pub fn go_home(&mut self) {
        self.nav_stack.clear();
        self.state = AppState::Home;
        self.input_mode = InputMode::Normal;
    }

    pub fn quit(&mut self) {
        self.stop_playback();
        self.running = false;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.error = Some(msg.into());
    }

    pub fn set_notice(&mut self, msg: impl Into<String>) {
        self.notice = Some(msg.into());
    }

    /// Focus search input
    pub fn focus_search(&mut self) {
        if self.state != AppState::Search {
            self.navigate(AppState::Search);
            if self.search.genres.is_empty() {
                self.actions.push(Action::LoadGenres);
            }
        }
        self.input_mode = InputMode::Editing;
    }

    fn reload_home(&mut self) {
        self.home.loading = LoadingState::Loading(Some("Loading movies...".into()));
        self.actions.push(Action::LoadHome);
    }

    fn queue_search(&mut self, query: Option<SearchQuery>) {
        if let Some(query) = query {
            self.actions.push(Action::Search(query));
        }
    }

    /// Open the detail view for a movie, showing the cached copy meanwhile
    pub fn open_movie(&mut self, movie: Movie) {
        self.detail = DetailState {
            movie_id: movie.id.clone(),
            in_watchlist: self.store.is_in_watchlist(&movie.id),
            resume_at: self.resume_hint(&movie.id),
            loading: LoadingState::Loading(None),
            movie: Some(movie.clone()),
        };
        self.actions.push(Action::LoadMovie(movie.id));
        self.navigate(AppState::Detail);
    }

    // -------------------------------------------------------------------------
    // Watchlist and playback
    // -------------------------------------------------------------------------

    /// Flip the watchlist flag of the movie on screen
    pub fn toggle_watchlist(&mut self) {
        if self.detail.movie_id.is_empty() {
            return;
        }
        match self.store.toggle_watchlist(&self.detail.movie_id) {
            Ok(added) => {
                self.detail.in_watchlist = added;
                self.set_notice(if added {
                    "Added to watchlist"
                } else {
                    "Removed from watchlist"
                });
            }
            Err(e) => {
                warn!(movie_id = %self.detail.movie_id, error = %e, "watchlist update failed");
                self.set_error(format!("Could not update watchlist: {}", e));
            }
        }
    }

    /// Start playing the movie on the detail screen
    pub fn play_current(&mut self) {
        let Some(movie) = self.detail.movie.clone() else {
            return;
        };
        if movie.video_url.trim().is_empty() {
            self.set_error(PlayerError::NoVideo.to_string());
            return;
        }

        self.stop_playback();
        let tracker = PlaybackTracker::start_for(&movie.id, &self.store, self.player_type);
        info!(movie_id = %movie.id, resume = ?tracker.resume_position(), "starting playback");

        self.actions.push(Action::RecordPlay(movie.id.clone()));
        self.actions.push(Action::Launch {
            movie: Box::new(movie.clone()),
            start_at: tracker.resume_position(),
        });
        self.playing = Some(PlayingState {
            movie,
            tracker,
            player: self.player_type,
            handle: None,
        });
        self.navigate(AppState::Playing);
    }

    /// Hand the launched player to the playing view
    pub fn attach_player(&mut self, handle: PlayerHandle) {
        match self.playing.as_mut() {
            Some(playing) => playing.handle = Some(handle),
            // Stopped before the launch finished; dropping kills it
            None => drop(handle),
        }
    }

    /// Drain player events into the tracker
    pub fn poll_player(&mut self) {
        let Some(playing) = self.playing.as_mut() else {
            return;
        };
        let Some(handle) = playing.handle.as_mut() else {
            return;
        };

        while let Some(event) = handle.try_next_event() {
            if let Err(e) = playing.tracker.apply(&mut self.store, event) {
                warn!(movie_id = %playing.movie.id, error = %e, "could not save progress");
            }
            if playing.tracker.is_done() {
                break;
            }
        }

        if playing.tracker.is_done() {
            self.finish_playback();
        }
    }

    fn finish_playback(&mut self) {
        let Some(playing) = self.playing.take() else {
            return;
        };
        let notice = if playing.tracker.is_finished() {
            format!("Finished {}", playing.movie.title)
        } else {
            format!("Stopped at {}", format_clock(playing.tracker.current_time()))
        };
        info!(movie_id = %playing.movie.id, finished = playing.tracker.is_finished(), "playback over");
        self.refresh_resume(&playing.movie.id);
        self.set_notice(notice);
        if self.state == AppState::Playing {
            self.back();
        }
    }

    /// Close the player early; the last saved position stays
    pub fn stop_playback(&mut self) {
        if let Some(mut playing) = self.playing.take() {
            playing.tracker.on_closed();
            if let Some(handle) = playing.handle.take() {
                handle.stop();
            }
            self.refresh_resume(&playing.movie.id);
        }
    }

    fn refresh_resume(&mut self, movie_id: &str) {
        if self.detail.movie_id == movie_id {
            self.detail.resume_at = self.resume_hint(movie_id);
        }
    }

    /// Saved position, if the configured player can resume from it
    fn resume_hint(&self, movie_id: &str) -> Option<f64> {
        if self.player_type.reports_progress() {
            self.store.progress(movie_id)
        } else {
            None
        }
    }

    // -------------------------------------------------------------------------
    // Admin
    // -------------------------------------------------------------------------

    /// Enter the admin area: validate a stored token, or ask for one
    pub fn open_admin(&mut self) {
        if self.admin.ctx.is_some() {
            self.navigate(AppState::Admin);
            return;
        }
        match self.store.admin_token() {
            Some(token) => {
                self.admin.loading = LoadingState::Loading(Some("Checking token...".into()));
                self.actions.push(Action::CheckAdmin {
                    token,
                    remember: false,
                });
                self.navigate(AppState::Admin);
            }
            None => self.open_admin_login(),
        }
    }

    fn open_admin_login(&mut self) {
        self.admin.token_input.clear();
        self.admin.loading = LoadingState::Idle;
        self.navigate(AppState::AdminLogin);
        self.input_mode = InputMode::Editing;
    }

    fn submit_token(&mut self) {
        let token = self.admin.token_input.trim().to_string();
        if token.is_empty() {
            self.set_error("Please enter admin token");
            return;
        }
        self.admin.loading = LoadingState::Loading(Some("Checking token...".into()));
        self.actions.push(Action::CheckAdmin {
            token,
            remember: true,
        });
    }

    pub fn logout(&mut self) {
        AdminGuard::logout(&mut self.store);
        self.admin = AdminState::default();
        self.set_notice("Logged out");
        self.go_home();
    }

    fn reload_admin(&mut self) {
        if let Some(ctx) = self.admin.ctx.clone() {
            self.admin.loading = LoadingState::Loading(Some("Loading admin data...".into()));
            self.actions.push(Action::LoadAdmin(ctx));
        }
    }

    fn submit_genre_form(&mut self) {
        let (Some(form), Some(ctx)) = (self.admin.form.as_ref(), self.admin.ctx.clone()) else {
            return;
        };
        match form.to_new_genre() {
            Ok(genre) => self.actions.push(Action::CreateGenre(ctx, genre)),
            Err(msg) => self.set_error(msg),
        }
    }

    fn request_delete(&mut self) {
        let (Some(target), Some(ctx)) = (self.admin.selected_target(), self.admin.ctx.clone())
        else {
            return;
        };
        if self.admin.pending_delete.as_ref() == Some(&target) {
            self.admin.pending_delete = None;
            self.actions.push(match target {
                PendingDelete::Genre(id) => Action::DeleteGenre(ctx, id),
                PendingDelete::Movie(id) => Action::DeleteMovie(ctx, id),
            });
        } else {
            self.admin.pending_delete = Some(target);
            self.set_notice("Press d again to delete");
        }
    }

    // -------------------------------------------------------------------------
    // Async results
    // -------------------------------------------------------------------------

    /// Run queued actions: network work on spawned tasks, the rest here
    pub fn dispatch(&mut self) {
        for action in std::mem::take(&mut self.actions) {
            match action {
                Action::RecordPlay(id) => {
                    // View increment runs detached
                    let _ = session::record_play(&self.client, &mut self.store, &id);
                }
                Action::Launch { movie, start_at } => {
                    match LocalPlayer::new(self.player_type).play(&movie, start_at) {
                        Ok(handle) => self.attach_player(handle),
                        Err(e) => {
                            warn!(movie_id = %movie.id, error = %e, "player failed to start");
                            self.playing = None;
                            if self.state == AppState::Playing {
                                self.back();
                            }
                            self.set_error(e.to_string());
                        }
                    }
                }
                action => {
                    let client = self.client.clone();
                    let tx = self.events_tx.clone();
                    tokio::spawn(async move {
                        if let Some(event) = perform(client, action).await {
                            // Receiver only goes away on shutdown
                            let _ = tx.send(event);
                        }
                    });
                }
            }
        }
    }

    /// Apply every completed result waiting on the channel
    pub fn drain_events(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
        }
    }

    /// Advance timers and pull in async results
    pub fn tick(&mut self, now: Instant) {
        if self.state == AppState::Home {
            self.home.tick(now);
        } else {
            self.home.timer = None;
        }
        self.poll_player();
        self.drain_events();
    }

    /// How long to wait for input: at most `max`, less when the carousel
    /// is due to advance sooner
    pub fn poll_timeout(&self, now: Instant, max: Duration) -> Duration {
        match (&self.state, &self.home.timer) {
            (AppState::Home, Some(timer)) => timer.time_until_next(now).min(max),
            _ => max,
        }
    }

    /// Apply one completed result
    pub fn apply(&mut self, event: AppEvent) {
        match event {
            AppEvent::Home { movies, genres } => {
                let genres = genres.unwrap_or_else(|e| {
                    warn!(error = %e, "failed to load genres, showing no genre rows");
                    Vec::new()
                });
                match movies {
                    Ok(movies) => {
                        self.home.set_feed(HomeFeed::compose(&movies, &genres));
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to load movies");
                        self.home.set_feed(HomeFeed::default());
                        self.home.loading = LoadingState::Error(format!("Failed to load movies: {}", e));
                    }
                }
                if self.search.genres.is_empty() {
                    self.search.genres = genres;
                }
            }
            AppEvent::Genres(result) => match result {
                Ok(genres) => self.search.genres = genres,
                Err(e) => warn!(error = %e, "failed to load genre filter"),
            },
            AppEvent::SearchResults { query, result } => {
                self.search.apply(&query, result);
            }
            AppEvent::Movie { id, result } => self.apply_movie(id, result),
            AppEvent::AdminChecked { result, remember } => self.apply_admin_check(result, remember),
            AppEvent::AdminData {
                stats,
                genres,
                movies,
            } => {
                let mut failed = Vec::new();
                match stats {
                    Ok(stats) => self.admin.stats = Some(stats),
                    Err(e) => failed.push(format!("stats: {}", e)),
                }
                match genres {
                    Ok(genres) => self.admin.genres = genres,
                    Err(e) => failed.push(format!("genres: {}", e)),
                }
                match movies {
                    Ok(movies) => self.admin.movies = movies,
                    Err(e) => failed.push(format!("movies: {}", e)),
                }
                self.admin.loading = if failed.is_empty() {
                    LoadingState::Idle
                } else {
                    warn!(errors = ?failed, "admin data partially failed");
                    LoadingState::Error(failed.join("; "))
                };
                self.admin.sync_list();
            }
            AppEvent::GenreCreated(result) => match result {
                Ok(genre) => {
                    self.set_notice(format!("Created genre {}", genre.name));
                    self.admin.form = None;
                    self.input_mode = InputMode::Normal;
                    self.reload_admin();
                }
                // The form stays open with its fields
                Err(e) => self.set_error(format!("Failed to create genre: {}", e)),
            },
            AppEvent::Deleted { what, result } => match result {
                Ok(()) => {
                    self.set_notice(match what {
                        PendingDelete::Genre(_) => "Genre deleted",
                        PendingDelete::Movie(_) => "Movie deleted",
                    });
                    self.reload_admin();
                }
                Err(e) => self.set_error(format!("Delete failed: {}", e)),
            },
        }
    }

    fn apply_movie(&mut self, id: String, result: Result<Movie, CatalogError>) {
        if id != self.detail.movie_id {
            return;
        }
        match result {
            Ok(movie) => {
                self.detail.in_watchlist = self.store.is_in_watchlist(&movie.id);
                self.detail.resume_at = self.resume_hint(&movie.id);
                self.detail.movie = Some(movie);
                self.detail.loading = LoadingState::Idle;
            }
            Err(CatalogError::NotFound) => {
                info!(movie_id = %id, "movie not found, returning home");
                self.detail = DetailState::default();
                self.set_notice(MOVIE_NOT_FOUND);
                if self.state == AppState::Detail {
                    self.go_home();
                }
            }
            Err(e) => {
                warn!(movie_id = %id, error = %e, "failed to load movie");
                self.detail.loading = LoadingState::Error(e.to_string());
            }
        }
    }

    fn apply_admin_check(&mut self, result: Result<AdminContext, CatalogError>, remember: bool) {
        match result {
            Ok(ctx) => {
                if remember {
                    AdminGuard::remember(&mut self.store, &ctx);
                }
                self.admin.ctx = Some(ctx);
                self.admin.token_input.clear();
                if self.state == AppState::AdminLogin {
                    // Replace the prompt with the admin area
                    self.state = AppState::Admin;
                }
                self.input_mode = InputMode::Normal;
                self.reload_admin();
            }
            Err(e) => {
                warn!(error = %e, "admin token rejected");
                self.admin.loading = LoadingState::Idle;
                if self.state == AppState::Admin {
                    // Stored token no longer works: ask for a new one
                    self.state = AppState::AdminLogin;
                    self.admin.token_input.clear();
                    self.input_mode = InputMode::Editing;
                }
                self.set_error(match e {
                    CatalogError::Auth { message, .. } => message,
                    other => other.to_string(),
                });
            }
        }
    }

    // -------------------------------------------------------------------------
    // Keyboard Event Handling
    // -------------------------------------------------------------------------

    /// Handle keyboard event, returns true if event was consumed
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        // Popups and notices close on any keypress
        self.error = None;
        self.notice = None;

        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return true;
        }

        if self.input_mode == InputMode::Editing {
            self.handle_editing_key(key)
        } else {
            self.handle_normal_key(key)
        }
    }

    /// Handle keys in editing (text input) mode
    fn handle_editing_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Esc {
            return self.back();
        }
        match self.state {
            AppState::AdminLogin => self.handle_token_key(key),
            AppState::Admin => self.handle_genre_form_key(key),
            _ => self.handle_search_input_key(key),
        }
    }

    fn handle_search_input_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter => {
                self.input_mode = InputMode::Normal;
                let query = self.search.submit();
                self.queue_search(query);
            }
            KeyCode::Tab => {
                let query = self.search.cycle_genre();
                self.queue_search(query);
            }
            KeyCode::Char(c) => self.search.insert(c),
            KeyCode::Backspace => self.search.backspace(),
            KeyCode::Delete => self.search.delete(),
            KeyCode::Left => self.search.cursor_left(),
            KeyCode::Right => self.search.cursor_right(),
            KeyCode::Home => self.search.cursor_home(),
            KeyCode::End => self.search.cursor_end(),
            KeyCode::Down => self.input_mode = InputMode::Normal,
            _ => return false,
        }
        true
    }

    fn handle_token_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter => self.submit_token(),
            KeyCode::Char(c) => self.admin.token_input.push(c),
            KeyCode::Backspace => {
                self.admin.token_input.pop();
            }
            _ => return false,
        }
        true
    }

    fn handle_genre_form_key(&mut self, key: KeyEvent) -> bool {
        let Some(form) = self.admin.form.as_mut() else {
            self.input_mode = InputMode::Normal;
            return false;
        };
        match key.code {
            KeyCode::Enter => self.submit_genre_form(),
            KeyCode::Tab => form.toggle_field(),
            KeyCode::Char(c) => form.insert(c),
            KeyCode::Backspace => form.backspace(),
            _ => return false,
        }
        true
    }

    /// Handle keys in normal navigation mode
    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => {
                self.quit();
                return true;
            }
            KeyCode::Char('/') => {
                self.focus_search();
                return true;
            }
            KeyCode::Esc => {
                return self.back();
            }
            KeyCode::Char('a') if !matches!(self.state, AppState::Admin | AppState::AdminLogin) => {
                self.open_admin();
                return true;
            }
            _ => {}
        }

        match self.state {
            AppState::Home => self.handle_home_key(key),
            AppState::Search => self.handle_search_key(key),
            AppState::Detail => self.handle_detail_key(key),
            AppState::Playing => self.handle_playing_key(key),
            AppState::AdminLogin => match key.code {
                KeyCode::Enter | KeyCode::Char('i') => {
                    self.input_mode = InputMode::Editing;
                    true
                }
                _ => false,
            },
            AppState::Admin => self.handle_admin_key(key),
        }
    }

    fn handle_home_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => self.home.up(),
            KeyCode::Down | KeyCode::Char('j') => self.home.down(),
            KeyCode::Left | KeyCode::Char('h') => self.home.left(),
            KeyCode::Right | KeyCode::Char('l') => self.home.right(),
            KeyCode::Char(c @ '1'..='5') => {
                let index = (c as usize) - ('1' as usize);
                if self.home.carousel.jump(index) {
                    self.home.row = 0;
                }
            }
            KeyCode::Enter => {
                if let Some(movie) = self.home.selected_movie().cloned() {
                    self.open_movie(movie);
                }
            }
            KeyCode::Char('r') => self.reload_home(),
            _ => return false,
        }
        true
    }

    fn handle_search_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                if self.search.list.selected == 0 {
                    self.input_mode = InputMode::Editing;
                } else {
                    self.search.list.up();
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.search.list.down(),
            KeyCode::PageUp => self.search.list.page_up(10),
            KeyCode::PageDown => self.search.list.page_down(10),
            KeyCode::Home => self.search.list.first(),
            KeyCode::End => self.search.list.last(),
            KeyCode::Tab => {
                let query = self.search.cycle_genre();
                self.queue_search(query);
            }
            KeyCode::Char('y') => {
                let query = self.search.cycle_year();
                self.queue_search(query);
            }
            KeyCode::Enter => {
                if let Some(movie) = self.search.selected_movie().cloned() {
                    self.open_movie(movie);
                }
            }
            _ => return false,
        }
        true
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Enter | KeyCode::Char('p') => self.play_current(),
            KeyCode::Char('w') => self.toggle_watchlist(),
            KeyCode::Char('r') => {
                if !self.detail.movie_id.is_empty() {
                    self.detail.loading = LoadingState::Loading(None);
                    self.actions.push(Action::LoadMovie(self.detail.movie_id.clone()));
                }
            }
            _ => return false,
        }
        true
    }

    fn handle_playing_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('s') => {
                self.back();
                true
            }
            _ => false,
        }
    }

    fn handle_admin_key(&mut self, key: KeyEvent) -> bool {
        if self.admin.ctx.is_none() {
            // Still validating the stored token
            return false;
        }
        match key.code {
            KeyCode::Tab => {
                self.admin.tab = self.admin.tab.next();
                self.admin.list = ListState::default();
                self.admin.pending_delete = None;
                self.admin.sync_list();
            }
            KeyCode::Up | KeyCode::Char('k') => self.admin.list.up(),
            KeyCode::Down | KeyCode::Char('j') => self.admin.list.down(),
            KeyCode::Char('n') if self.admin.tab == AdminTab::Genres => {
                self.admin.form = Some(GenreForm::default());
                self.input_mode = InputMode::Editing;
            }
            KeyCode::Char('d') => self.request_delete(),
            KeyCode::Char('r') => self.reload_admin(),
            KeyCode::Char('o') => self.logout(),
            _ => return false,
        }
        true
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browse::TRENDING_TITLE;
    use crate::storage::{KeyValueStore, MemoryStore, WatchStore};
    use chrono::TimeZone;

    fn movie(id: &str, views: u64) -> Movie {
        Movie {
            id: id.into(),
            title: format!("Movie {}", id),
            synopsis: String::new(),
            genres: vec!["Action".into()],
            cast: Vec::new(),
            release_year: 2020,
            runtime: 100,
            poster_url: String::new(),
            video_url: format!("http://cdn/{}.mp4", id),
            language: "English".into(),
            subtitles: Vec::new(),
            view_count: views,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn app() -> App {
        let store: Box<dyn KeyValueStore + Send> = Box::new(MemoryStore::new());
        let mut app = App::new(
            CatalogClient::with_base_url("http://127.0.0.1:9"),
            WatchStore::new(store),
            PlayerType::Mpv,
        );
        app.actions.clear();
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    fn loaded_app() -> App {
        let mut app = app();
        app.apply(AppEvent::Home {
            movies: Ok(vec![movie("a", 100), movie("b", 50), movie("c", 200)]),
            genres: Ok(vec![Genre {
                id: "g1".into(),
                name: "Action".into(),
                slug: "action".into(),
            }]),
        });
        app
    }

    // -------------------------------------------------------------------------
    // ListState Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_list_state_navigation() {
        let mut list = ListState::new(5);
        list.down();
        list.down();
        assert_eq!(list.selected, 2);
        list.page_down(10);
        assert_eq!(list.selected, 4);
        list.down();
        assert_eq!(list.selected, 4);
        list.up();
        assert_eq!(list.selected, 3);
        list.first();
        assert_eq!(list.selected, 0);
        list.up();
        assert_eq!(list.selected, 0);
    }

    #[test]
    fn test_list_state_set_len() {
        let mut list = ListState::new(10);
        list.selected = 8;
        list.set_len(5);
        assert_eq!(list.selected, 4);
        list.set_len(0);
        assert_eq!(list.selected, 0);
    }

    // -------------------------------------------------------------------------
    // Home Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_new_app_queues_home_load() {
        let store: Box<dyn KeyValueStore + Send> = Box::new(MemoryStore::new());
        let app = App::new(
            CatalogClient::with_base_url("http://127.0.0.1:9"),
            WatchStore::new(store),
            PlayerType::Mpv,
        );
        assert_eq!(app.actions, vec![Action::LoadHome]);
        assert!(app.home.loading.is_loading());
    }

    #[test]
    fn test_home_feed_applied() {
        let app = loaded_app();
        let ids: Vec<_> = app.home.carousel.items().iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
        assert_eq!(app.home.feed.rows[0].title, TRENDING_TITLE);
        assert!(!app.home.loading.is_loading());
    }

    #[test]
    fn test_home_genre_failure_degrades() {
        let mut app = app();
        app.apply(AppEvent::Home {
            movies: Ok(vec![movie("a", 1)]),
            genres: Err(CatalogError::Server(500)),
        });
        assert_eq!(app.home.carousel.len(), 1);
        assert!(app.home.feed.rows.iter().all(|r| r.title != "Action"));
    }

    #[test]
    fn test_home_movies_failure_shows_error() {
        let mut app = app();
        app.apply(AppEvent::Home {
            movies: Err(CatalogError::Server(503)),
            genres: Ok(Vec::new()),
        });
        assert!(app.home.loading.is_error());
        assert!(app.home.feed.is_empty());
    }

    #[test]
    fn test_carousel_keys() {
        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.home.carousel.current_index(), 1);
        app.handle_key(key(KeyCode::Left));
        app.handle_key(key(KeyCode::Left));
        assert_eq!(app.home.carousel.current_index(), 2);
        app.handle_key(key(KeyCode::Char('1')));
        assert_eq!(app.home.carousel.current_index(), 0);
        // Out of range dot is ignored
        app.handle_key(key(KeyCode::Char('5')));
        assert_eq!(app.home.carousel.current_index(), 0);
    }

    #[test]
    fn test_carousel_auto_advance_only_on_home() {
        let mut app = loaded_app();
        let start = Instant::now();
        app.tick(start);
        app.tick(start + Duration::from_secs(5));
        assert_eq!(app.home.carousel.current_index(), 1);

        app.navigate(AppState::Search);
        app.tick(start + Duration::from_secs(30));
        assert!(app.home.timer.is_none());
        assert_eq!(app.home.carousel.current_index(), 1);
    }

    #[test]
    fn test_poll_timeout_stops_at_next_advance() {
        let mut app = loaded_app();
        let max = Duration::from_millis(100);
        let start = Instant::now();
        app.tick(start);

        assert_eq!(app.poll_timeout(start, max), max);
        let almost = start + Duration::from_millis(4_960);
        assert_eq!(app.poll_timeout(almost, max), Duration::from_millis(40));

        app.navigate(AppState::Search);
        assert_eq!(app.poll_timeout(almost, max), max);
    }

    #[test]
    fn test_row_navigation_and_open() {
        let mut app = loaded_app();
        app.handle_key(key(KeyCode::Down));
        app.handle_key(key(KeyCode::Right));
        assert_eq!(app.home.selected_movie().map(|m| m.id.as_str()), Some("a"));

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.state, AppState::Detail);
        assert_eq!(app.actions, vec![Action::LoadMovie("a".into())]);
        assert!(app.detail.movie.is_some());
    }

    // -------------------------------------------------------------------------
    // Search Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_search_editing() {
        let mut search = SearchView::new(2024);
        for c in "héllo".chars() {
            search.insert(c);
        }
        assert_eq!(search.cursor, 5);
        search.cursor_left();
        search.cursor_left();
        search.insert('X');
        assert_eq!(search.form.query, "hélXlo");
        search.backspace();
        search.cursor_home();
        search.delete();
        assert_eq!(search.form.query, "éllo");
        search.cursor_end();
        assert_eq!(search.split_at_cursor(), ("éllo", ""));
    }

    #[test]
    fn test_filter_without_text_sends_nothing() {
        let mut app = app();
        app.search.genres = vec![Genre {
            id: "g1".into(),
            name: "Action".into(),
            slug: "action".into(),
        }];
        app.focus_search();
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.search.form.genre.as_deref(), Some("Action"));
        assert!(app.actions.is_empty());
        assert!(app.search.form.state.message().is_some());
    }

    #[test]
    fn test_search_submit_and_stale_reply() {
        let mut app = app();
        app.focus_search();
        assert_eq!(app.actions, vec![Action::LoadGenres]);
        app.actions.clear();
        for c in "heat".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));
        let first = SearchQuery::compose("heat", None, None).unwrap();
        assert_eq!(app.actions, vec![Action::Search(first.clone())]);

        // A year filter re-issues; the first reply is then stale
        app.handle_key(key(KeyCode::Char('y')));
        let second = app.search.pending.clone().unwrap();
        assert!(!app.search.apply(&first, Ok(vec![movie("x", 1)])));
        assert!(app.search.apply(&second, Ok(vec![movie("y", 1)])));
        assert_eq!(app.search.selected_movie().map(|m| m.id.as_str()), Some("y"));
    }

    #[test]
    fn test_year_cycle_wraps_to_none() {
        let mut search = SearchView::new(2024);
        assert_eq!(search.years.len(), YEAR_FILTER_SPAN as usize);
        search.cycle_year();
        assert_eq!(search.form.year, Some(2024));
        for _ in 0..YEAR_FILTER_SPAN {
            search.cycle_year();
        }
        assert_eq!(search.form.year, None);
    }

    // -------------------------------------------------------------------------
    // Detail Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_missing_movie_returns_home_with_notice() {
        let mut app = loaded_app();
        app.open_movie(movie("gone", 0));
        app.apply(AppEvent::Movie {
            id: "gone".into(),
            result: Err(CatalogError::NotFound),
        });
        assert_eq!(app.state, AppState::Home);
        assert_eq!(app.notice.as_deref(), Some(MOVIE_NOT_FOUND));
        assert!(app.nav_stack.is_empty());
    }

    #[test]
    fn test_watchlist_toggle_key() {
        let mut app = loaded_app();
        app.open_movie(movie("a", 0));
        app.handle_key(key(KeyCode::Char('w')));
        assert!(app.detail.in_watchlist);
        assert!(app.store.is_in_watchlist("a"));
        app.handle_key(key(KeyCode::Char('w')));
        assert!(!app.store.is_in_watchlist("a"));
    }

    #[test]
    fn test_play_queues_history_and_launch_with_resume() {
        let mut app = loaded_app();
        app.store.save_progress("a", 42.0).unwrap();
        app.open_movie(movie("a", 0));
        app.actions.clear();

        app.handle_key(key(KeyCode::Char('p')));
        assert_eq!(app.state, AppState::Playing);
        assert_eq!(app.actions[0], Action::RecordPlay("a".into()));
        match &app.actions[1] {
            Action::Launch { start_at, .. } => assert_eq!(*start_at, Some(42.0)),
            other => panic!("unexpected action {:?}", other),
        }
        let playing = app.playing.as_ref().unwrap();
        assert_eq!(playing.resume_notice().as_deref(), Some("Resumed from 00:42"));
    }

    #[test]
    fn test_vlc_play_starts_from_beginning() {
        let mut app = loaded_app();
        app.player_type = PlayerType::Vlc;
        app.store.save_progress("a", 42.0).unwrap();
        app.open_movie(movie("a", 0));
        assert_eq!(app.detail.resume_at, None);
        app.actions.clear();

        app.handle_key(key(KeyCode::Char('p')));
        match &app.actions[1] {
            Action::Launch { start_at, .. } => assert_eq!(*start_at, None),
            other => panic!("unexpected action {:?}", other),
        }
        assert!(app.playing.as_ref().unwrap().resume_notice().is_none());
    }

    #[test]
    fn test_stop_keeps_saved_progress() {
        let mut app = loaded_app();
        app.store.save_progress("a", 42.0).unwrap();
        app.open_movie(movie("a", 0));
        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Char('s')));
        assert_eq!(app.state, AppState::Detail);
        assert!(app.playing.is_none());
        assert_eq!(app.detail.resume_at, Some(42.0));
    }

    // -------------------------------------------------------------------------
    // Admin Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_admin_without_token_prompts() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.state, AppState::AdminLogin);
        assert_eq!(app.input_mode, InputMode::Editing);

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.error.as_deref(), Some("Please enter admin token"));
        assert!(app.actions.is_empty());
    }

    #[test]
    fn test_admin_with_stored_token_validates() {
        let mut app = app();
        app.store.set_admin_token("secret").unwrap();
        app.handle_key(key(KeyCode::Char('a')));
        assert_eq!(app.state, AppState::Admin);
        assert_eq!(
            app.actions,
            vec![Action::CheckAdmin {
                token: "secret".into(),
                remember: false
            }]
        );

        app.apply(AppEvent::AdminChecked {
            result: Err(CatalogError::Auth {
                status: 403,
                message: "Invalid admin token".into(),
            }),
            remember: false,
        });
        assert_eq!(app.state, AppState::AdminLogin);
        assert_eq!(app.error.as_deref(), Some("Invalid admin token"));
    }

    #[test]
    fn test_genre_form_slug_follows_name() {
        let mut form = GenreForm::default();
        for c in "Film Noir".chars() {
            form.insert(c);
        }
        assert_eq!(form.slug, "film-noir");

        form.toggle_field();
        form.insert('x');
        assert_eq!(form.slug, "film-noirx");
        form.toggle_field();
        form.insert('!');
        assert_eq!(form.slug, "film-noirx");

        let genre = form.to_new_genre().unwrap();
        assert_eq!(genre.name, "Film Noir!");
        assert_eq!(genre.slug, "film-noirx");
    }

    #[test]
    fn test_genre_form_requires_name() {
        assert!(GenreForm::default().to_new_genre().is_err());
    }

    #[test]
    fn test_genre_create_failure_keeps_form() {
        let mut app = app();
        app.admin.form = Some(GenreForm {
            name: "Drama".into(),
            slug: "drama".into(),
            ..GenreForm::default()
        });
        app.state = AppState::Admin;
        app.input_mode = InputMode::Editing;
        app.apply(AppEvent::GenreCreated(Err(CatalogError::Validation(
            "Genre already exists".into(),
        ))));
        assert!(app.error.is_some());
        assert_eq!(app.admin.form.as_ref().map(|f| f.name.as_str()), Some("Drama"));
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    // -------------------------------------------------------------------------
    // App Navigation Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_app_navigation() {
        let mut app = app();
        app.navigate(AppState::Search);
        app.navigate(AppState::Search);
        assert_eq!(app.nav_stack.len(), 1);
        app.navigate(AppState::Detail);
        assert!(app.back());
        assert_eq!(app.state, AppState::Search);
        assert!(app.back());
        assert!(!app.back());
        assert_eq!(app.state, AppState::Home);
    }

    #[test]
    fn test_app_quit_keys() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('q')));
        assert!(!app.running);

        let mut app = self::app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(!app.running);
    }

    #[test]
    fn test_escape_leaves_editing_first() {
        let mut app = app();
        app.handle_key(key(KeyCode::Char('/')));
        assert_eq!(app.state, AppState::Search);
        assert_eq!(app.input_mode, InputMode::Editing);
        // 'q' is text while editing
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.running);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.input_mode, InputMode::Normal);
        assert_eq!(app.state, AppState::Search);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.state, AppState::Home);
    }
}
