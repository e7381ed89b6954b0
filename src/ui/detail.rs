//! Detail view
//!
//! Everything the catalog knows about one movie, plus watchlist and
//! resume state from local storage.

use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};

use crate::app::DetailState;
use crate::models::{format_clock, format_count, Movie};
use crate::ui::{keybind_line, panel, render_message, Theme};

/// Render the detail view
pub fn render(frame: &mut Frame, area: Rect, detail: &DetailState) {
    let Some(movie) = detail.movie.as_ref() else {
        let block = panel("DETAIL", false);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        match detail.loading.message().filter(|_| detail.loading.is_error()) {
            Some(error) => render_message(frame, inner, error, Theme::error()),
            None => render_message(frame, inner, "⟳ Loading...", Theme::loading()),
        }
        return;
    };

    let block = panel(movie.title.to_uppercase(), true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    let paragraph = Paragraph::new(Text::from(info_lines(movie, detail, inner.width)))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, chunks[0]);

    let watch_label = if detail.in_watchlist {
        "Remove from list"
    } else {
        "Add to list"
    };
    let play_label = if detail.resume_at.is_some() {
        "Resume"
    } else {
        "Play"
    };
    frame.render_widget(
        Paragraph::new(keybind_line(&[
            ("p", play_label),
            ("w", watch_label),
            ("ESC", "Back"),
        ])),
        chunks[1],
    );
}

fn info_lines(movie: &Movie, detail: &DetailState, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    let mut title = vec![
        Span::styled("▶ ", Theme::accent()),
        Span::styled(movie.title.clone(), Theme::title()),
        Span::styled(format!(" ({})", movie.release_year), Theme::year()),
    ];
    if detail.in_watchlist {
        title.push(Span::styled("  ✓ In your list", Theme::watchlisted()));
    }
    lines.push(Line::from(title));

    lines.push(Line::from(vec![
        Span::styled(movie.runtime_str(), Theme::duration()),
        Span::styled(" │ ", Theme::dimmed()),
        Span::styled(movie.language.clone(), Theme::text()),
        Span::styled(" │ ", Theme::dimmed()),
        Span::styled(format!("{} views", format_count(movie.view_count)), Theme::views()),
    ]));

    if detail.loading.is_loading() {
        lines.push(Line::from(Span::styled("⟳ refreshing", Theme::loading())));
    } else if let Some(error) = detail.loading.message().filter(|_| detail.loading.is_error()) {
        lines.push(Line::from(Span::styled(
            format!("Could not refresh: {}", error),
            Theme::warning(),
        )));
    }

    if let Some(position) = detail.resume_at {
        lines.push(Line::from(Span::styled(
            format!("Resume from {}", format_clock(position)),
            Theme::success(),
        )));
    }

    lines.push(Line::from(Span::styled(
        "─".repeat(width as usize),
        Theme::dimmed(),
    )));

    lines.push(labelled("Genres", movie.genres.join(", ")));
    lines.push(labelled("Cast", movie.cast.join(", ")));
    lines.push(labelled("Subtitles", movie.subtitles_str()));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("SYNOPSIS", Theme::accent())));
    for line in movie.synopsis.lines() {
        lines.push(Line::from(Span::styled(line.to_string(), Theme::text())));
    }

    lines
}

fn labelled(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{}: ", label), Theme::dimmed()),
        Span::styled(value, Theme::text()),
    ])
}
