//! MovieStream - terminal client for the MovieStream catalog
//!
//! Browse featured movies and genre rows, search, keep a watchlist and
//! play in mpv or VLC with resume. Admins can manage genres and movies.
//!
//! # Usage
//!
//! ```bash
//! # Launch interactive TUI
//! moviestream
//!
//! # CLI mode (for automation)
//! moviestream search "heat" --genre Crime
//! moviestream play 42 --player vlc
//! moviestream watchlist --json
//! ```

use std::io::{stdout, Stdout};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph},
    Frame, Terminal,
};
use tracing::{error, info};

use moviestream::app::{App, AppState, InputMode};
use moviestream::cli::{Cli, ExitCode, Output};
use moviestream::commands::{self, Context};
use moviestream::config::Config;
use moviestream::logging;
use moviestream::ui::{self, Theme};

/// Terminal type alias for convenience
type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Input poll interval; also the carousel and player polling period
const TICK_RATE: Duration = Duration::from_millis(100);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logging comes up before the config so load problems get reported
    if cli.is_cli_mode() {
        if let Err(e) = logging::init_stderr(cli.verbose, cli.quiet) {
            eprintln!("warning: logging disabled: {}", e);
        }
    } else if let Some(path) = logging::default_log_path() {
        init_file_logging(cli.verbose, cli.quiet, path);
    }

    let mut config = match cli.config.as_deref() {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    config.apply_overrides(cli.api_url.clone(), cli.storage.clone());
    let ctx = Context::new(config);

    if cli.is_cli_mode() {
        // CLI mode: execute command and exit
        let exit_code = run_cli(cli, &ctx).await;
        std::process::exit(exit_code.into());
    } else {
        // TUI mode: launch interactive interface
        run_tui(&ctx).await
    }
}

fn init_file_logging(verbose: u8, quiet: bool, path: PathBuf) {
    // The TUI owns the terminal; without a log file we run silent
    if let Err(e) = logging::init_file(verbose, quiet, &path) {
        eprintln!("warning: file logging disabled: {}", e);
    }
}

/// Run CLI command and return exit code
async fn run_cli(cli: Cli, ctx: &Context) -> ExitCode {
    let output = Output::new(&cli);

    match cli.command {
        Some(command) => commands::run(command, ctx, &output).await,
        // Handled by the is_cli_mode check
        None => ExitCode::Success,
    }
}

// =============================================================================
// TUI Mode
// =============================================================================

/// Initialize the terminal for TUI mode
fn init_terminal() -> Result<Tui> {
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore terminal to normal state
fn restore_terminal(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Run interactive TUI
async fn run_tui(ctx: &Context) -> Result<()> {
    info!(api_url = %ctx.config.api_url, "starting TUI");
    let mut app = App::new(ctx.client.clone(), ctx.open_store(), ctx.config.player);

    let mut terminal = init_terminal()?;
    let result = run_event_loop(&mut terminal, &mut app).await;

    // Always restore terminal, even on error
    restore_terminal(&mut terminal)?;

    if let Err(ref e) = result {
        error!(error = %e, "TUI exited with error");
    }
    result
}

/// Main event loop - handles input, applies async results, renders UI
async fn run_event_loop(terminal: &mut Tui, app: &mut App) -> Result<()> {
    while app.running {
        app.dispatch();
        app.tick(Instant::now());

        terminal.draw(|frame| render_ui(frame, app))?;

        // event::poll blocks; keep it off the runtime's worker so spawned
        // requests make progress meanwhile
        let timeout = app.poll_timeout(Instant::now(), TICK_RATE);
        let ready = tokio::task::block_in_place(|| event::poll(timeout))?;
        if ready {
            if let Event::Key(key) = event::read()? {
                // Only handle key press events (ignore releases on Windows)
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }
    }

    // Stop any player before the runtime goes away
    app.stop_playback();
    Ok(())
}

// =============================================================================
// UI Rendering
// =============================================================================

/// Main render function - dispatches to view-specific renderers
pub fn render_ui(frame: &mut Frame, app: &App) {
    let area = frame.area();

    frame.render_widget(Clear, area);
    frame.render_widget(Block::default().style(Style::default().bg(Theme::BACKGROUND)), area);

    // Main layout: header, content, status bar
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    render_content(frame, chunks[1], app);
    render_status_bar(frame, chunks[2], app);

    if let Some(ref error) = app.error {
        render_error_popup(frame, area, error);
    }
}

/// Render the header with logo and search box
fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let header_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(17), // Logo
            Constraint::Min(1),     // Search box
        ])
        .split(area);

    let logo = Paragraph::new(Line::from(vec![
        Span::styled(
            "MOVIE",
            Style::default()
                .fg(Theme::PRIMARY)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            "STREAM",
            Style::default().fg(Theme::TEXT).add_modifier(Modifier::BOLD),
        ),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Theme::border()),
    );
    frame.render_widget(logo, header_chunks[0]);

    let editing_search = app.input_mode == InputMode::Editing && app.state == AppState::Search;
    let query = &app.search.form.query;

    let search_text = if editing_search {
        let (before, after) = app.search.split_at_cursor();
        format!("⌕ {}│{}", before, after)
    } else if query.is_empty() {
        "⌕ Type / to search...".to_string()
    } else {
        format!("⌕ {}", query)
    };

    let search_box = Paragraph::new(search_text)
        .style(if editing_search {
            Theme::input().fg(Theme::PRIMARY)
        } else {
            Theme::input()
        })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(if editing_search {
                    Theme::border_focused()
                } else {
                    Theme::border()
                })
                .title(Span::styled(" SEARCH ", Theme::title())),
        );
    frame.render_widget(search_box, header_chunks[1]);
}

/// Render the main content area based on current state
fn render_content(frame: &mut Frame, area: Rect, app: &App) {
    match app.state {
        AppState::Home => ui::home::render(frame, area, &app.home),
        AppState::Search => ui::search::render(frame, area, &app.search),
        AppState::Detail => ui::detail::render(frame, area, &app.detail),
        AppState::Playing => ui::player::render(frame, area, app.playing.as_ref()),
        AppState::AdminLogin => ui::admin::render_login(
            frame,
            area,
            &app.admin,
            app.input_mode == InputMode::Editing,
        ),
        AppState::Admin => ui::admin::render(frame, area, &app.admin),
    }
}

fn state_label(state: AppState) -> &'static str {
    match state {
        AppState::Home => "HOME",
        AppState::Search => "SEARCH",
        AppState::Detail => "DETAIL",
        AppState::Playing => "PLAYING",
        AppState::AdminLogin => "LOGIN",
        AppState::Admin => "ADMIN",
    }
}

fn help_text(app: &App) -> &'static str {
    if app.input_mode == InputMode::Editing {
        return " ↵:submit  ESC:cancel ";
    }
    match app.state {
        AppState::Home => " ←→:carousel  1-5:jump  ↑↓:rows  ↵:open  /:search  a:admin  q:quit ",
        AppState::Search => " ↑↓:select  ↵:open  Tab:genre  y:year  /:edit  ESC:back ",
        AppState::Detail => " p:play  w:watchlist  ESC:back ",
        AppState::Playing => " s:stop  ESC:back ",
        AppState::AdminLogin => " ↵:edit token  ESC:back ",
        AppState::Admin => " Tab:tab  ↑↓:select  ESC:back ",
    }
}

/// Render status bar at bottom
fn render_status_bar(frame: &mut Frame, area: Rect, app: &App) {
    let mode_indicator = match app.input_mode {
        InputMode::Normal => Span::styled(
            " NORMAL ",
            Style::default().fg(Theme::TEXT).bg(Theme::PRIMARY),
        ),
        InputMode::Editing => Span::styled(
            " INSERT ",
            Style::default().fg(Theme::BACKGROUND).bg(Theme::ACCENT),
        ),
    };

    let state_indicator = Span::styled(
        format!(" {} ", state_label(app.state)),
        Style::default().fg(Theme::DIM),
    );

    let mut spans = vec![mode_indicator, state_indicator, Span::raw(" │ ")];
    match app.notice.as_deref() {
        Some(notice) => spans.push(Span::styled(notice.to_string(), Theme::accent())),
        None => spans.push(Span::styled(help_text(app), Theme::dimmed())),
    }

    let status = Paragraph::new(Line::from(spans)).style(Theme::status_bar());
    frame.render_widget(status, area);
}

/// Render error popup overlay
fn render_error_popup(frame: &mut Frame, area: Rect, error: &str) {
    let popup_width = 60.min(area.width.saturating_sub(4));
    let popup_height = 5;

    let popup_area = Rect {
        x: area.x + (area.width.saturating_sub(popup_width)) / 2,
        y: area.y + (area.height.saturating_sub(popup_height)) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let error_block = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(error, Theme::error())),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Theme::error())
            .title(Span::styled(" ✗ ERROR ", Theme::error()))
            .style(Style::default().bg(Theme::BACKGROUND)),
    );

    frame.render_widget(error_block, popup_area);
}
