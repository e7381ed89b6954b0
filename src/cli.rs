//! CLI - Command Line Interface for MovieStream
//!
//! Every TUI action is scriptable. All output is JSON-parseable.
//!
//! # Examples
//!
//! ```bash
//! # Browse the catalog
//! moviestream home --json
//! moviestream search "heist" -g Action -y 2023
//!
//! # Watch state
//! moviestream watchlist toggle 3f2a...
//! moviestream history -l 10
//!
//! # Admin
//! moviestream admin login $ADMIN_TOKEN
//! moviestream admin genre-add "Film Noir"
//! ```

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::api::CatalogError;
use crate::models::{parse_list, MovieFields, MovieUpdate, DEFAULT_LANGUAGE};
use crate::playback::PlayerType;

// =============================================================================
// Exit Codes
// =============================================================================

/// Exit codes for CLI operations (semantic for scripting)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success
    Success = 0,
    /// General error
    Error = 1,
    /// Invalid arguments
    InvalidArgs = 2,
    /// Network error
    NetworkError = 3,
    /// Movie or genre not found
    NotFound = 4,
    /// Admin token missing or rejected
    AuthFailed = 5,
    /// Backend rejected the request
    ValidationFailed = 6,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> std::process::ExitCode {
        std::process::ExitCode::from(code as u8)
    }
}

impl From<&CatalogError> for ExitCode {
    fn from(err: &CatalogError) -> ExitCode {
        match err {
            CatalogError::Network(_) | CatalogError::Server(_) => ExitCode::NetworkError,
            CatalogError::NotFound => ExitCode::NotFound,
            CatalogError::Auth { .. } => ExitCode::AuthFailed,
            CatalogError::Validation(_) => ExitCode::ValidationFailed,
            CatalogError::InvalidResponse(_) => ExitCode::Error,
        }
    }
}

// =============================================================================
// Main CLI Structure
// =============================================================================

/// MovieStream - terminal catalog and player
///
/// Run without arguments to launch interactive TUI.
/// Use subcommands for scriptable automation.
#[derive(Parser, Debug)]
#[command(
    name = "moviestream",
    version,
    about = "Terminal catalog and player for MovieStream",
    long_about = "Browse the MovieStream catalog, keep a watchlist, resume \
                  movies where you left off and manage the catalog as admin.\n\n\
                  Run without arguments to launch the interactive TUI.\n\
                  Use subcommands for automation and scripting.",
    after_help = "EXAMPLES:\n\
                  moviestream                          Launch interactive TUI\n\
                  moviestream search \"quantum\"         Search the catalog\n\
                  moviestream play <id> -p vlc         Play in VLC\n\
                  moviestream admin stats --json       Dashboard numbers"
)]
pub struct Cli {
    /// Output format as JSON (default for non-TTY)
    #[arg(long, short = 'j', global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Path to config file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Backend URL (overrides MOVIESTREAM_API_URL and config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Watch-state file (overrides MOVIESTREAM_STORAGE and config)
    #[arg(long, global = true)]
    pub storage: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(long, short = 'v', global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand to run (omit for TUI mode)
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Check if running in CLI mode (has subcommand)
    pub fn is_cli_mode(&self) -> bool {
        self.command.is_some()
    }

    /// Check if JSON output should be used
    pub fn should_json(&self) -> bool {
        self.json || !std::io::stdout().is_terminal()
    }
}

// =============================================================================
// Subcommands
// =============================================================================

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the home page: featured movies and rows
    #[command(visible_alias = "h")]
    Home(HomeCmd),

    /// List movies
    #[command(visible_alias = "ls")]
    Movies(MoviesCmd),

    /// Get details for a movie
    #[command(visible_alias = "i")]
    Info(InfoCmd),

    /// Search movies by title or synopsis
    #[command(visible_alias = "s")]
    Search(SearchCmd),

    /// List genres
    #[command(visible_alias = "g")]
    Genres(GenresCmd),

    /// Play a movie locally in mpv or VLC
    #[command(visible_alias = "p")]
    Play(PlayCmd),

    /// Show or change the watchlist
    #[command(visible_alias = "wl")]
    Watchlist(WatchlistCmd),

    /// Show watch history
    History(HistoryCmd),

    /// Show or clear the saved resume position of a movie
    Progress(ProgressCmd),

    /// Admin operations (token required)
    Admin(AdminCmd),
}

// =============================================================================
// Catalog Commands
// =============================================================================

/// Featured carousel plus genre rows
#[derive(Args, Debug)]
pub struct HomeCmd {}

/// List movies in catalog order
#[derive(Args, Debug)]
pub struct MoviesCmd {
    /// Maximum number of movies (1-100)
    #[arg(long, short = 'l', default_value = "30", value_parser = clap::value_parser!(u32).range(1..=100))]
    pub limit: u32,
}

/// Get detailed information about a movie
#[derive(Args, Debug)]
pub struct InfoCmd {
    /// Movie ID
    #[arg(required = true)]
    pub id: String,
}

/// Search the catalog
#[derive(Args, Debug)]
pub struct SearchCmd {
    /// Search text (matched against title and synopsis)
    pub query: String,

    /// Only movies in this genre (display name)
    #[arg(long, short = 'g')]
    pub genre: Option<String>,

    /// Only movies released this year
    #[arg(long, short = 'y')]
    pub year: Option<u16>,
}

/// List all genres
#[derive(Args, Debug)]
pub struct GenresCmd {}

// =============================================================================
// Play Command
// =============================================================================

/// Local player selection
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerChoice {
    /// mpv media player (reports progress)
    Mpv,
    /// VLC media player
    Vlc,
}

impl From<PlayerChoice> for PlayerType {
    fn from(choice: PlayerChoice) -> PlayerType {
        match choice {
            PlayerChoice::Mpv => PlayerType::Mpv,
            PlayerChoice::Vlc => PlayerType::Vlc,
        }
    }
}

/// Play a movie, resuming from the saved position
#[derive(Args, Debug)]
pub struct PlayCmd {
    /// Movie ID
    #[arg(required = true)]
    pub id: String,

    /// Player to use (defaults to the configured player)
    #[arg(long, short = 'p', value_enum)]
    pub player: Option<PlayerChoice>,
}

// =============================================================================
// Watch State Commands
// =============================================================================

/// Show or change the watchlist
#[derive(Args, Debug)]
pub struct WatchlistCmd {
    #[command(subcommand)]
    pub action: Option<WatchlistAction>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum WatchlistAction {
    /// List watchlisted movie IDs (default)
    List,
    /// Add a movie
    Add { id: String },
    /// Remove a movie
    #[command(visible_alias = "rm")]
    Remove { id: String },
    /// Add if absent, remove if present
    Toggle { id: String },
}

/// Show watch history, most recent first
#[derive(Args, Debug)]
pub struct HistoryCmd {
    /// Maximum number of entries
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,
}

/// Show or clear a resume position
#[derive(Args, Debug)]
pub struct ProgressCmd {
    /// Movie ID
    #[arg(required = true)]
    pub id: String,

    /// Forget the saved position
    #[arg(long)]
    pub clear: bool,
}

// =============================================================================
// Admin Commands
// =============================================================================

/// Admin operations
#[derive(Args, Debug)]
pub struct AdminCmd {
    #[command(subcommand)]
    pub action: AdminAction,
}

#[derive(Subcommand, Debug)]
pub enum AdminAction {
    /// Validate and remember an admin token
    Login {
        /// Admin token
        token: String,
    },
    /// Forget the stored admin token
    Logout,
    /// Dashboard totals and top movies
    Stats,
    /// Create a genre
    GenreAdd {
        /// Display name
        name: String,
        /// Slug override (normalized); derived from the name when omitted
        #[arg(long)]
        slug: Option<String>,
    },
    /// Delete a genre
    GenreRm {
        /// Genre ID
        id: String,
    },
    /// Create a movie
    MovieAdd(MovieAddArgs),
    /// Update fields of a movie
    MovieUpdate(MovieUpdateArgs),
    /// Delete a movie
    MovieRm {
        /// Movie ID
        id: String,
    },
}

/// Fields of a new movie
#[derive(Args, Debug)]
pub struct MovieAddArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub synopsis: String,
    /// Comma-separated genre names
    #[arg(long)]
    pub genres: String,
    /// Comma-separated cast
    #[arg(long, default_value = "")]
    pub cast: String,
    #[arg(long)]
    pub year: u16,
    /// Runtime in minutes
    #[arg(long)]
    pub runtime: u32,
    #[arg(long)]
    pub poster: String,
    #[arg(long)]
    pub video: String,
    #[arg(long, default_value = DEFAULT_LANGUAGE)]
    pub language: String,
    /// Comma-separated subtitle languages
    #[arg(long, default_value = "")]
    pub subtitles: String,
}

impl MovieAddArgs {
    pub fn to_fields(&self) -> MovieFields {
        MovieFields {
            title: self.title.clone(),
            synopsis: self.synopsis.clone(),
            genres: parse_list(&self.genres),
            cast: parse_list(&self.cast),
            release_year: self.year,
            runtime: self.runtime,
            poster_url: self.poster.clone(),
            video_url: self.video.clone(),
            language: self.language.clone(),
            subtitles: parse_list(&self.subtitles),
        }
    }
}

/// Fields to change; omitted flags are left untouched
#[derive(Args, Debug)]
pub struct MovieUpdateArgs {
    /// Movie ID
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub synopsis: Option<String>,
    /// Comma-separated genre names
    #[arg(long)]
    pub genres: Option<String>,
    /// Comma-separated cast
    #[arg(long)]
    pub cast: Option<String>,
    #[arg(long)]
    pub year: Option<u16>,
    #[arg(long)]
    pub runtime: Option<u32>,
    #[arg(long)]
    pub poster: Option<String>,
    #[arg(long)]
    pub video: Option<String>,
    #[arg(long)]
    pub language: Option<String>,
    /// Comma-separated subtitle languages
    #[arg(long)]
    pub subtitles: Option<String>,
}

impl MovieUpdateArgs {
    pub fn to_update(&self) -> MovieUpdate {
        MovieUpdate {
            title: self.title.clone(),
            synopsis: self.synopsis.clone(),
            genres: self.genres.as_deref().map(parse_list),
            cast: self.cast.as_deref().map(parse_list),
            release_year: self.year,
            runtime: self.runtime,
            poster_url: self.poster.clone(),
            video_url: self.video.clone(),
            language: self.language.clone(),
            subtitles: self.subtitles.as_deref().map(parse_list),
        }
    }
}

// =============================================================================
// JSON Output Types
// =============================================================================

/// Generic JSON output wrapper with status
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonOutput<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "is_zero")]
    pub exit_code: i32,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl<T: Serialize> JsonOutput<T> {
    /// Create success output with data
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            exit_code: 0,
        }
    }

    /// Create error output (no data)
    pub fn error_msg(msg: impl Into<String>, code: ExitCode) -> JsonOutput<()> {
        JsonOutput::<()> {
            data: None,
            error: Some(msg.into()),
            exit_code: code.into(),
        }
    }
}

/// Status OK response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusOk {
    pub status: &'static str,
}

impl Default for StatusOk {
    fn default() -> Self {
        Self { status: "ok" }
    }
}

/// Watchlist membership after a change
#[derive(Debug, Serialize, Deserialize)]
pub struct WatchlistStatus {
    pub movie_id: String,
    pub in_watchlist: bool,
    pub changed: bool,
}

/// Saved resume position
#[derive(Debug, Serialize, Deserialize)]
pub struct ProgressStatus {
    pub movie_id: String,
    pub position: Option<f64>,
}

/// Outcome of a `play` session
#[derive(Debug, Serialize, Deserialize)]
pub struct PlaybackReport {
    pub movie_id: String,
    pub title: String,
    pub player: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resumed_from: Option<f64>,
    pub position: f64,
    pub duration: f64,
    pub percent: f64,
    pub finished: bool,
}

// =============================================================================
// Output Helpers
// =============================================================================

/// Output handler for consistent formatting
pub struct Output {
    pub json: bool,
    pub quiet: bool,
}

impl Output {
    pub fn new(cli: &Cli) -> Self {
        Self {
            json: cli.should_json(),
            quiet: cli.quiet,
        }
    }

    /// Print success data
    pub fn print<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        if self.json {
            let output = JsonOutput::success(data);
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!("{}", serde_json::to_string_pretty(&data)?);
        }
        Ok(())
    }

    /// Print preformatted text, or the data as JSON in JSON mode
    pub fn print_text<T: Serialize>(&self, data: T, text: impl std::fmt::Display) -> anyhow::Result<()> {
        if self.json {
            self.print(data)
        } else {
            println!("{}", text);
            Ok(())
        }
    }

    /// Print error and return exit code
    pub fn error(&self, msg: impl Into<String>, code: ExitCode) -> ExitCode {
        let msg = msg.into();
        if self.json {
            let output = JsonOutput::<()>::error_msg(&msg, code);
            if let Ok(json) = serde_json::to_string_pretty(&output) {
                eprintln!("{}", json);
            }
        } else if !self.quiet {
            eprintln!("Error: {}", msg);
        }
        code
    }

    /// Print a catalog error with its matching exit code
    pub fn catalog_error(&self, err: &CatalogError) -> ExitCode {
        self.error(err.to_string(), ExitCode::from(err))
    }

    /// Print info message (suppressed in quiet mode)
    pub fn info(&self, msg: impl std::fmt::Display) {
        if !self.quiet && !self.json {
            eprintln!("{}", msg);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
