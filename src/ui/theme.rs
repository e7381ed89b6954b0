//! MovieStream theme
//!
//! Color palette and style helpers for the TUI: a near-black canvas with
//! the signature red for focus and selection.

use ratatui::style::{Color, Modifier, Style};

/// MovieStream color palette
pub struct Theme;

impl Theme {
    // ═══════════════════════════════════════════════════════════════════════
    // CORE PALETTE
    // ═══════════════════════════════════════════════════════════════════════

    /// Background: #0b0b0b (near black)
    pub const BACKGROUND: Color = Color::Rgb(0x0b, 0x0b, 0x0b);

    /// Primary: #e50914 (brand red)
    pub const PRIMARY: Color = Color::Rgb(0xe5, 0x09, 0x14);

    /// Secondary: #f5c518 (marquee gold)
    pub const SECONDARY: Color = Color::Rgb(0xf5, 0xc5, 0x18);

    /// Accent: #ffd60a (yellow)
    pub const ACCENT: Color = Color::Rgb(0xff, 0xd6, 0x0a);

    /// Highlight: #ff5a63 (light red)
    pub const HIGHLIGHT: Color = Color::Rgb(0xff, 0x5a, 0x63);

    /// Text: #e5e5e5 (soft white)
    pub const TEXT: Color = Color::Rgb(0xe5, 0xe5, 0xe5);

    /// Dim: #8c8c8c (grey)
    pub const DIM: Color = Color::Rgb(0x8c, 0x8c, 0x8c);

    /// Success: #46d369 (green)
    pub const SUCCESS: Color = Color::Rgb(0x46, 0xd3, 0x69);

    /// Warning: #ffa31a (orange)
    pub const WARNING: Color = Color::Rgb(0xff, 0xa3, 0x1a);

    /// Error: #ff4d4f (red)
    pub const ERROR: Color = Color::Rgb(0xff, 0x4d, 0x4f);

    // ═══════════════════════════════════════════════════════════════════════
    // DERIVED COLORS (for UI elements)
    // ═══════════════════════════════════════════════════════════════════════

    /// Panels and input fields
    pub const BACKGROUND_LIGHT: Color = Color::Rgb(0x18, 0x18, 0x18);

    /// Border color (dark red)
    pub const BORDER: Color = Color::Rgb(0x7a, 0x1f, 0x24);

    /// Border color when focused (full red)
    pub const BORDER_FOCUSED: Color = Self::PRIMARY;

    // ═══════════════════════════════════════════════════════════════════════
    // STYLE HELPERS
    // ═══════════════════════════════════════════════════════════════════════

    /// Default text style
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT).bg(Self::BACKGROUND)
    }

    /// Highlighted text (text on the brand red)
    pub fn highlighted() -> Style {
        Style::default()
            .fg(Self::TEXT)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Selected item style (light red, bold)
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Dimmed/muted text
    pub fn dimmed() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn error() -> Style {
        Style::default()
            .fg(Self::ERROR)
            .add_modifier(Modifier::BOLD)
    }

    pub fn success() -> Style {
        Style::default()
            .fg(Self::SUCCESS)
            .add_modifier(Modifier::BOLD)
    }

    pub fn warning() -> Style {
        Style::default()
            .fg(Self::WARNING)
            .add_modifier(Modifier::BOLD)
    }

    /// Title/header style
    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Accent text style (yellow)
    pub fn accent() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    /// Normal/unfocused border
    pub fn border() -> Style {
        Style::default().fg(Self::BORDER)
    }

    pub fn border_focused() -> Style {
        Style::default()
            .fg(Self::BORDER_FOCUSED)
            .add_modifier(Modifier::BOLD)
    }

    /// Progress bar filled portion
    pub fn progress_bar() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .bg(Self::BACKGROUND_LIGHT)
    }

    /// Progress bar unfilled portion
    pub fn progress_bar_empty() -> Style {
        Style::default().fg(Self::DIM).bg(Self::BACKGROUND_LIGHT)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // COMPONENT STYLES
    // ═══════════════════════════════════════════════════════════════════════

    /// Style for list items (normal state)
    pub fn list_item() -> Style {
        Style::default().fg(Self::TEXT)
    }

    /// Style for list items (selected/highlighted)
    pub fn list_item_selected() -> Style {
        Self::highlighted()
    }

    /// Style for input fields
    pub fn input() -> Style {
        Style::default().fg(Self::TEXT).bg(Self::BACKGROUND_LIGHT)
    }

    /// Keybinding hint style
    pub fn keybind() -> Style {
        Style::default().fg(Self::ACCENT)
    }

    /// Keybinding description style
    pub fn keybind_desc() -> Style {
        Style::default().fg(Self::DIM)
    }

    /// Status bar style
    pub fn status_bar() -> Style {
        Style::default().fg(Self::TEXT).bg(Self::BACKGROUND_LIGHT)
    }

    /// Loading/spinner indicator
    pub fn loading() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Year/date metadata
    pub fn year() -> Style {
        Style::default().fg(Self::SECONDARY)
    }

    /// Genre tags
    pub fn genre() -> Style {
        Style::default().fg(Self::DIM)
    }

    /// Duration text
    pub fn duration() -> Style {
        Style::default().fg(Self::DIM)
    }

    /// View counts
    pub fn views() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    /// Watchlist marker
    pub fn watchlisted() -> Style {
        Style::default()
            .fg(Self::ACCENT)
            .add_modifier(Modifier::BOLD)
    }

    /// Carousel position dots
    pub fn carousel_dot(active: bool) -> Style {
        if active {
            Style::default().fg(Self::PRIMARY)
        } else {
            Style::default().fg(Self::DIM)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brand_colors() {
        assert_eq!(Theme::PRIMARY, Color::Rgb(0xe5, 0x09, 0x14));
        assert_eq!(Theme::BACKGROUND, Color::Rgb(0x0b, 0x0b, 0x0b));
        assert_eq!(Theme::BORDER_FOCUSED, Theme::PRIMARY);
    }

    #[test]
    fn test_carousel_dot_styles_differ() {
        assert_ne!(Theme::carousel_dot(true), Theme::carousel_dot(false));
        assert_eq!(Theme::carousel_dot(true).fg, Some(Theme::PRIMARY));
    }
}
