//! Search view
//!
//! Filter bar plus the result list. The query itself is typed into the
//! header search box.

use ratatui::{
    prelude::*,
    widgets::{List, ListItem, ListState as ListWidgetState, Paragraph},
};

use crate::api::SearchState;
use crate::app::SearchView;
use crate::models::Movie;
use crate::ui::{panel, render_message, Theme};

/// Render filters and results
pub fn render(frame: &mut Frame, area: Rect, search: &SearchView) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    frame.render_widget(Paragraph::new(filter_line(search)), chunks[0]);
    render_results(frame, chunks[1], search);
}

fn filter_line(search: &SearchView) -> Line<'static> {
    let genre = search.form.genre.clone().unwrap_or_else(|| "All".to_string());
    let year = search
        .form
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "All".to_string());

    Line::from(vec![
        Span::styled(" Genre: ", Theme::dimmed()),
        Span::styled(genre, Theme::accent()),
        Span::styled(" [Tab]", Theme::keybind_desc()),
        Span::styled("   Year: ", Theme::dimmed()),
        Span::styled(year, Theme::year()),
        Span::styled(" [y]", Theme::keybind_desc()),
    ])
}

fn render_results(frame: &mut Frame, area: Rect, search: &SearchView) {
    let movies = search.form.state.movies();
    let block = panel(format!("RESULTS ({})", movies.len()), false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    match &search.form.state {
        SearchState::Loading => {
            render_message(frame, inner, "⟳ Searching...", Theme::loading());
            return;
        }
        SearchState::Results(_) => {}
        other => {
            let message = other.message().unwrap_or_default();
            render_message(frame, inner, message, Theme::dimmed());
            return;
        }
    }

    let items: Vec<ListItem> = movies
        .iter()
        .enumerate()
        .map(|(i, movie)| result_item(movie, i == search.list.selected))
        .collect();

    let mut state = ListWidgetState::default();
    state.select(Some(search.list.selected));

    let list = List::new(items)
        .style(Theme::text())
        .highlight_style(Theme::list_item_selected());
    frame.render_stateful_widget(list, inner, &mut state);
}

fn result_item(movie: &Movie, is_selected: bool) -> ListItem<'static> {
    let marker = if is_selected { "▸ " } else { "  " };
    let line = Line::from(vec![
        Span::styled(
            marker,
            if is_selected {
                Theme::accent()
            } else {
                Theme::dimmed()
            },
        ),
        Span::styled(movie.title.clone(), Theme::list_item()),
        Span::styled(format!(" ({})", movie.release_year), Theme::year()),
        Span::raw(" "),
        Span::styled(format!("[{}]", movie.genres.join(", ")), Theme::genre()),
        Span::raw(" "),
        Span::styled(format!("{} views", movie.views_str()), Theme::views()),
    ]);
    ListItem::new(line)
}
