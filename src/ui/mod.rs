//! Terminal UI components
//!
//! Built with ratatui. Each view renders from the matching app state so
//! views can be drawn against a `TestBackend` without a running app.

pub mod admin;
pub mod detail;
pub mod home;
pub mod player;
pub mod search;
pub mod theme;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
    Frame,
};

/// Rounded panel with a themed title
pub fn panel(title: impl Into<String>, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(if focused {
            Theme::border_focused()
        } else {
            Theme::border()
        })
        .title(Span::styled(format!(" {} ", title.into()), Theme::title()))
}

/// Centered single message, used for empty/loading/error states
pub fn render_message(frame: &mut Frame, area: Rect, message: &str, style: Style) {
    let para = Paragraph::new(vec![Line::from(""), Line::from(Span::styled(message.to_string(), style))])
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(para, area);
}

/// `█░` bar for a 0-100 percentage
pub fn progress_bar(percent: f64, width: usize) -> Line<'static> {
    let ratio = if percent.is_finite() {
        (percent / 100.0).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (ratio * width as f64).round() as usize;
    let empty = width.saturating_sub(filled);
    Line::from(vec![
        Span::styled("█".repeat(filled), Theme::progress_bar()),
        Span::styled("░".repeat(empty), Theme::progress_bar_empty()),
    ])
}

/// Key hints as `key desc` pairs
pub fn keybind_line(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (key, desc) in hints {
        spans.push(Span::styled(format!(" {} ", key), Theme::keybind()));
        spans.push(Span::styled(format!("{}  ", desc), Theme::keybind_desc()));
    }
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_progress_bar_fill() {
        assert_eq!(text(&progress_bar(50.0, 10)), "█████░░░░░");
        assert_eq!(text(&progress_bar(0.0, 4)), "░░░░");
        assert_eq!(text(&progress_bar(250.0, 4)), "████");
        assert_eq!(text(&progress_bar(f64::NAN, 4)), "░░░░");
    }

    #[test]
    fn test_keybind_line() {
        let line = keybind_line(&[("q", "quit"), ("/", "search")]);
        assert_eq!(text(&line), " q quit   / search  ");
    }
}
