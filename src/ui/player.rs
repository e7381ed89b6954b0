//! Now Playing view
//!
//! Shows the movie in the local player with a progress bar driven by the
//! tracker. Without progress reports (VLC) only the title and resume
//! notice are shown.

use ratatui::{prelude::*, widgets::Paragraph};

use crate::app::PlayingState;
use crate::models::format_clock;
use crate::ui::{keybind_line, panel, progress_bar, render_message, Theme};

/// Width of the progress bar in cells
const BAR_WIDTH: usize = 40;

/// Render now playing view
pub fn render(frame: &mut Frame, area: Rect, playing: Option<&PlayingState>) {
    let block = panel("▶ NOW PLAYING", true);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(playing) = playing else {
        render_message(frame, inner, "Nothing playing", Theme::dimmed());
        return;
    };

    let tracker = &playing.tracker;
    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(playing.movie.title.clone(), Theme::title())),
        Line::from(Span::styled(
            format!("in {}", playing.player.display_name()),
            Theme::dimmed(),
        )),
        Line::from(""),
    ];

    if let Some(notice) = playing.resume_notice() {
        content.push(Line::from(Span::styled(notice, Theme::success())));
        content.push(Line::from(""));
    }

    if playing.handle.is_none() {
        content.push(Line::from(Span::styled("Starting player...", Theme::loading())));
    } else if tracker.duration() > 0.0 {
        let width = BAR_WIDTH.min(inner.width.saturating_sub(2) as usize);
        content.push(progress_bar(tracker.percent(), width));
        content.push(Line::from(Span::styled(
            format!(
                "{} / {}  ({:.0}%)",
                format_clock(tracker.current_time()),
                format_clock(tracker.duration()),
                tracker.percent()
            ),
            Theme::dimmed(),
        )));
    } else if playing.player.reports_progress() {
        content.push(Line::from(Span::styled("Waiting for position...", Theme::loading())));
    } else {
        content.push(Line::from(Span::styled(
            "Progress is not reported by this player",
            Theme::dimmed(),
        )));
    }

    content.push(Line::from(""));
    content.push(keybind_line(&[("s", "Stop"), ("ESC", "Back")]));

    frame.render_widget(Paragraph::new(content).alignment(Alignment::Center), inner);
}
