//! Home view
//!
//! Featured carousel on top, titled movie rows below. The focused row is
//! kept on screen by scrolling the row list.

use ratatui::{
    prelude::*,
    widgets::{Paragraph, Wrap},
};

use crate::app::HomeState;
use crate::browse::MovieRow;
use crate::models::Movie;
use crate::ui::{panel, render_message, Theme};

/// Height of the carousel panel
const HERO_HEIGHT: u16 = 9;

/// Height of one movie row
const ROW_HEIGHT: u16 = 3;

/// Render the home page
pub fn render(frame: &mut Frame, area: Rect, home: &HomeState) {
    if home.loading.is_loading() && home.feed.is_empty() {
        let block = panel("HOME", false);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        render_message(frame, inner, "⟳ Loading movies...", Theme::loading());
        return;
    }

    if let Some(error) = home.loading.message().filter(|_| home.loading.is_error()) {
        let block = panel("HOME", false);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        render_message(frame, inner, error, Theme::error());
        return;
    }

    if home.feed.is_empty() {
        let block = panel("HOME", false);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        render_message(frame, inner, "No movies yet", Theme::dimmed());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(HERO_HEIGHT), Constraint::Min(0)])
        .split(area);

    render_hero(frame, chunks[0], home);
    render_rows(frame, chunks[1], home);
}

/// Featured movie with position dots
fn render_hero(frame: &mut Frame, area: Rect, home: &HomeState) {
    let block = panel("★ FEATURED", home.row == 0);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(movie) = home.carousel.current() else {
        render_message(frame, inner, "Nothing featured", Theme::dimmed());
        return;
    };

    let lines = vec![
        Line::from(vec![
            Span::styled("▶ ", Theme::accent()),
            Span::styled(movie.title.clone(), Theme::title()),
            Span::styled(format!(" ({})", movie.release_year), Theme::year()),
        ]),
        meta_line(movie),
        Line::from(""),
        Line::from(Span::styled(movie.synopsis.clone(), Theme::text())),
    ];

    let dots: Vec<Span> = (0..home.carousel.len())
        .map(|i| {
            let active = i == home.carousel.current_index();
            Span::styled(if active { "● " } else { "○ " }, Theme::carousel_dot(active))
        })
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);

    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }),
        chunks[0],
    );
    frame.render_widget(
        Paragraph::new(Line::from(dots)).alignment(Alignment::Center),
        chunks[1],
    );
}

fn meta_line(movie: &Movie) -> Line<'static> {
    Line::from(vec![
        Span::styled(movie.genres.join(", "), Theme::genre()),
        Span::styled(" │ ", Theme::dimmed()),
        Span::styled(movie.runtime_str(), Theme::duration()),
        Span::styled(" │ ", Theme::dimmed()),
        Span::styled(format!("{} views", movie.views_str()), Theme::views()),
    ])
}

/// Rows below the carousel, scrolled so the focused one is visible
fn render_rows(frame: &mut Frame, area: Rect, home: &HomeState) {
    let visible = (area.height / ROW_HEIGHT).max(1) as usize;
    let focused = home.row.checked_sub(1);
    let first = match focused {
        Some(i) if i >= visible => i + 1 - visible,
        _ => 0,
    };

    let rows: Vec<(usize, &MovieRow)> = home
        .feed
        .rows
        .iter()
        .enumerate()
        .skip(first)
        .take(visible)
        .collect();

    let constraints: Vec<Constraint> = rows
        .iter()
        .map(|_| Constraint::Length(ROW_HEIGHT))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (slot, (index, row)) in rows.into_iter().enumerate() {
        let is_focused = focused == Some(index);
        let selected = is_focused.then(|| home.col(index));
        render_row(frame, chunks[slot], row, selected);
    }
}

/// One row as a horizontal strip of titles
fn render_row(frame: &mut Frame, area: Rect, row: &MovieRow, selected: Option<usize>) {
    let block = panel(row.title.clone(), selected.is_some());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Scroll the strip so the selected title starts in view
    let start = selected.unwrap_or(0);
    let mut spans = Vec::new();
    if start > 0 {
        spans.push(Span::styled("‹ ", Theme::dimmed()));
    }
    for (i, movie) in row.movies.iter().enumerate().skip(start) {
        let style = if Some(i) == selected {
            Theme::list_item_selected()
        } else {
            Theme::list_item()
        };
        spans.push(Span::styled(format!(" {} ", movie.title), style));
        spans.push(Span::styled("·", Theme::dimmed()));
    }
    spans.pop();

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}
