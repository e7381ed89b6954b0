//! Admin views
//!
//! Token prompt, then a tabbed area: dashboard totals with the top
//! movies, the genre list with its add form, and the movie list.

use ratatui::{
    prelude::*,
    widgets::{
        Block, BorderType, Borders, Clear, List, ListItem, ListState as ListWidgetState, Paragraph,
    },
};

use crate::app::{AdminState, AdminTab, GenreField, GenreForm, PendingDelete};
use crate::models::format_count;
use crate::ui::{keybind_line, panel, render_message, Theme};

/// Render the token prompt
pub fn render_login(frame: &mut Frame, area: Rect, admin: &AdminState, editing: bool) {
    let block = panel("🔒 ADMIN LOGIN", true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Tokens are secrets; show one dot per character
    let masked = "•".repeat(admin.token_input.chars().count());
    let cursor = if editing { "│" } else { "" };

    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled("Enter your admin token", Theme::text())),
        Line::from(""),
        Line::from(vec![
            Span::styled("Token: ", Theme::dimmed()),
            Span::styled(format!("{}{}", masked, cursor), Theme::input()),
        ]),
        Line::from(""),
    ];
    if admin.loading.is_loading() {
        lines.push(Line::from(Span::styled("⟳ Checking token...", Theme::loading())));
    } else {
        lines.push(keybind_line(&[("↵", "Log in"), ("ESC", "Cancel")]));
    }

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), inner);
}

/// Render the admin area
pub fn render(frame: &mut Frame, area: Rect, admin: &AdminState) {
    if admin.ctx.is_none() {
        let block = panel("ADMIN", false);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        render_message(frame, inner, "⟳ Checking token...", Theme::loading());
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    frame.render_widget(Paragraph::new(tab_line(admin.tab)), chunks[0]);

    match admin.tab {
        AdminTab::Dashboard => render_dashboard(frame, chunks[1], admin),
        AdminTab::Genres => render_genres(frame, chunks[1], admin),
        AdminTab::Movies => render_movies(frame, chunks[1], admin),
    }

    let hints: &[(&str, &str)] = match admin.tab {
        AdminTab::Genres => &[
            ("Tab", "Next tab"),
            ("n", "New genre"),
            ("d", "Delete"),
            ("r", "Refresh"),
            ("o", "Log out"),
        ],
        AdminTab::Movies => &[
            ("Tab", "Next tab"),
            ("d", "Delete"),
            ("r", "Refresh"),
            ("o", "Log out"),
        ],
        AdminTab::Dashboard => &[("Tab", "Next tab"), ("r", "Refresh"), ("o", "Log out")],
    };
    frame.render_widget(Paragraph::new(keybind_line(hints)), chunks[2]);

    if let Some(form) = admin.form.as_ref() {
        render_genre_form(frame, area, form);
    }
}

fn tab_line(active: AdminTab) -> Line<'static> {
    let spans: Vec<Span> = [AdminTab::Dashboard, AdminTab::Genres, AdminTab::Movies]
        .into_iter()
        .flat_map(|tab| {
            let style = if tab == active {
                Theme::highlighted()
            } else {
                Theme::dimmed()
            };
            [Span::styled(format!(" {} ", tab.label()), style), Span::raw(" ")]
        })
        .collect();
    Line::from(spans)
}

fn status_line(admin: &AdminState) -> Option<Line<'static>> {
    if admin.loading.is_loading() {
        return Some(Line::from(Span::styled("⟳ Loading...", Theme::loading())));
    }
    admin
        .loading
        .message()
        .filter(|_| admin.loading.is_error())
        .map(|e| {
            Line::from(Span::styled(
                format!("Some data failed to load: {}", e),
                Theme::warning(),
            ))
        })
}

fn render_dashboard(frame: &mut Frame, area: Rect, admin: &AdminState) {
    let block = panel("DASHBOARD", true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(stats) = admin.stats.as_ref() else {
        let line = status_line(admin).unwrap_or_else(|| Line::from("No stats"));
        frame.render_widget(Paragraph::new(line), inner);
        return;
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Movies ", Theme::dimmed()),
            Span::styled(format_count(stats.total_movies), Theme::accent()),
            Span::styled("   Genres ", Theme::dimmed()),
            Span::styled(format_count(stats.total_genres), Theme::accent()),
            Span::styled("   Views ", Theme::dimmed()),
            Span::styled(format_count(stats.total_views), Theme::views()),
        ]),
        Line::from(""),
        Line::from(Span::styled("TOP MOVIES", Theme::title())),
    ];
    for (i, movie) in stats.top_movies.iter().enumerate() {
        let style = if i == admin.list.selected {
            Theme::selected()
        } else {
            Theme::list_item()
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{:>2}. ", i + 1), Theme::dimmed()),
            Span::styled(movie.title.clone(), style),
            Span::styled(format!("  {} views", format_count(movie.view_count)), Theme::views()),
        ]));
    }
    if let Some(status) = status_line(admin) {
        lines.push(Line::from(""));
        lines.push(status);
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

fn delete_marker(admin: &AdminState, target: PendingDelete) -> Span<'static> {
    if admin.pending_delete.as_ref() == Some(&target) {
        Span::styled("  ✗ press d to confirm", Theme::error())
    } else {
        Span::raw("")
    }
}

fn render_list(
    frame: &mut Frame,
    area: Rect,
    title: String,
    items: Vec<ListItem<'static>>,
    admin: &AdminState,
) {
    let block = panel(title, true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if items.is_empty() {
        match status_line(admin) {
            Some(status) => frame.render_widget(Paragraph::new(status), inner),
            None => render_message(frame, inner, "Nothing here yet", Theme::dimmed()),
        }
        return;
    }

    let mut state = ListWidgetState::default();
    state.select(Some(admin.list.selected));
    let list = List::new(items).highlight_style(Theme::list_item_selected());
    frame.render_stateful_widget(list, inner, &mut state);
}

fn render_genres(frame: &mut Frame, area: Rect, admin: &AdminState) {
    let items = admin
        .genres
        .iter()
        .map(|g| {
            ListItem::new(Line::from(vec![
                Span::styled(g.name.clone(), Theme::list_item()),
                Span::styled(format!("  [{}]", g.slug), Theme::genre()),
                delete_marker(admin, PendingDelete::Genre(g.id.clone())),
            ]))
        })
        .collect();
    render_list(frame, area, format!("GENRES ({})", admin.genres.len()), items, admin);
}

fn render_movies(frame: &mut Frame, area: Rect, admin: &AdminState) {
    let items = admin
        .movies
        .iter()
        .map(|m| {
            ListItem::new(Line::from(vec![
                Span::styled(m.title.clone(), Theme::list_item()),
                Span::styled(format!(" ({})", m.release_year), Theme::year()),
                Span::styled(format!("  {} views", m.views_str()), Theme::views()),
                delete_marker(admin, PendingDelete::Movie(m.id.clone())),
            ]))
        })
        .collect();
    render_list(frame, area, format!("MOVIES ({})", admin.movies.len()), items, admin);
}

/// Centered add-genre popup
fn render_genre_form(frame: &mut Frame, area: Rect, form: &GenreForm) {
    let width = 50.min(area.width.saturating_sub(4));
    let height = 7;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width,
        height,
    };
    frame.render_widget(Clear, popup);

    let field = |label: &str, value: &str, focused: bool| {
        let cursor = if focused { "│" } else { "" };
        Line::from(vec![
            Span::styled(format!("{:>6}: ", label), Theme::dimmed()),
            Span::styled(
                format!("{}{}", value, cursor),
                if focused {
                    Theme::input().fg(Theme::PRIMARY)
                } else {
                    Theme::input()
                },
            ),
        ])
    };

    let lines = vec![
        field("Name", &form.name, form.field == GenreField::Name),
        field("Slug", &form.slug, form.field == GenreField::Slug),
        Line::from(""),
        keybind_line(&[("Tab", "Field"), ("↵", "Create"), ("ESC", "Cancel")]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Theme::border_focused())
        .title(Span::styled(" + NEW GENRE ", Theme::title()))
        .style(Style::default().bg(Theme::BACKGROUND));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}
