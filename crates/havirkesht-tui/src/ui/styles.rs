//! Console look: a tile-blue frame with saffron keys, and one accent per
//! registry so a province never looks like a village at a glance.

use ratatui::style::{Color, Modifier, Style};

use havirkesht_core::api::ApiStatus;
use havirkesht_core::ResourceKind;

/// Minutes left on the access token below which the expiry turns amber.
const EXPIRY_WARN_MINUTES: i64 = 15;

/// Minutes left below which the next request may already be refused.
const EXPIRY_CRITICAL_MINUTES: i64 = 5;

pub mod palette {
    use ratatui::style::Color;

    pub const TILE: Color = Color::Rgb(28, 132, 148);
    pub const SAFFRON: Color = Color::Rgb(236, 178, 46);
    pub const POMEGRANATE: Color = Color::Rgb(196, 52, 72);
    pub const PISTACHIO: Color = Color::Rgb(142, 190, 104);
    pub const LAPIS: Color = Color::Rgb(70, 104, 184);
    pub const CLAY: Color = Color::Rgb(200, 118, 76);
    pub const PLUM: Color = Color::Rgb(150, 98, 170);
    pub const SAND: Color = Color::Rgb(226, 218, 200);
    pub const DUST: Color = Color::Rgb(118, 114, 106);
    pub const NIGHT: Color = Color::Rgb(22, 30, 38);
    pub const ROW: Color = Color::Rgb(30, 62, 70);
}

use palette::*;

// ============================================================================
// Text
// ============================================================================

pub fn heading_style() -> Style {
    Style::default().fg(TILE).add_modifier(Modifier::BOLD)
}

pub fn text_style() -> Style {
    Style::default().fg(SAND)
}

pub fn muted_style() -> Style {
    Style::default().fg(DUST)
}

pub fn accent_style() -> Style {
    Style::default().fg(SAFFRON)
}

pub fn error_style() -> Style {
    Style::default().fg(POMEGRANATE)
}

/// Key names in hints and the help overlay.
pub fn key_style() -> Style {
    Style::default().fg(SAFFRON).add_modifier(Modifier::BOLD)
}

/// Text being typed into the search line.
pub fn input_style() -> Style {
    Style::default().fg(SAFFRON).add_modifier(Modifier::UNDERLINED)
}

// ============================================================================
// Chrome
// ============================================================================

pub fn frame_style(focused: bool) -> Style {
    Style::default().fg(if focused { TILE } else { DUST })
}

pub fn selected_style() -> Style {
    Style::default().bg(ROW).fg(SAND).add_modifier(Modifier::BOLD)
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default().fg(NIGHT).bg(TILE).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(SAND)
    }
}

/// A page number in the pager.
pub fn page_style(current: bool) -> Style {
    if current {
        Style::default().fg(NIGHT).bg(SAFFRON).add_modifier(Modifier::BOLD)
    } else {
        muted_style()
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(NIGHT).fg(SAND)
}

// ============================================================================
// Registry and session
// ============================================================================

pub fn kind_color(kind: ResourceKind) -> Color {
    match kind {
        ResourceKind::Province => LAPIS,
        ResourceKind::City => CLAY,
        ResourceKind::Village => PISTACHIO,
        ResourceKind::User => PLUM,
    }
}

/// Titles of a registry's card and table.
pub fn kind_style(kind: ResourceKind) -> Style {
    Style::default().fg(kind_color(kind)).add_modifier(Modifier::BOLD)
}

/// Big number on a dashboard card
pub fn count_style(kind: ResourceKind) -> Style {
    Style::default().fg(kind_color(kind)).add_modifier(Modifier::BOLD)
}

pub fn status_style(status: Option<&ApiStatus>) -> Style {
    match status {
        Some(ApiStatus::Connected) => Style::default().fg(PISTACHIO),
        Some(ApiStatus::HttpError(_)) => Style::default().fg(SAFFRON),
        Some(ApiStatus::Unreachable) => error_style(),
        None => muted_style(),
    }
}

pub fn expiry_style(minutes_left: Option<i64>) -> Style {
    match minutes_left {
        Some(m) if m < EXPIRY_CRITICAL_MINUTES => error_style().add_modifier(Modifier::BOLD),
        Some(m) if m < EXPIRY_WARN_MINUTES => accent_style(),
        Some(_) => text_style(),
        None => muted_style(),
    }
}
