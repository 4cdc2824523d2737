use ratatui::style::{Color, Modifier, Style};

use shepherd_core::models::RankTier;

// Palette
const VIOLET: Color = Color::Rgb(138, 110, 200);
const OLIVE: Color = Color::Rgb(120, 170, 100);
const AMBER: Color = Color::Rgb(220, 170, 80);
const CRIMSON: Color = Color::Rgb(200, 80, 80);
const SLATE: Color = Color::Rgb(120, 124, 136);
const TEXT: Color = Color::Rgb(230, 230, 235);
const SELECTION_BG: Color = Color::Rgb(52, 44, 72);
const STATUS_BG: Color = Color::Rgb(28, 26, 38);

const GOLD: Color = Color::Rgb(212, 175, 55);
const SILVER: Color = Color::Rgb(192, 192, 192);
const BRONZE: Color = Color::Rgb(205, 127, 50);

fn fg(color: Color) -> Style {
    Style::default().fg(color)
}

fn bold(color: Color) -> Style {
    fg(color).add_modifier(Modifier::BOLD)
}

pub fn title_style() -> Style {
    bold(VIOLET)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(SELECTION_BG)
        .fg(TEXT)
        .add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    fg(TEXT)
}

pub fn muted_style() -> Style {
    fg(SLATE)
}

pub fn highlight_style() -> Style {
    fg(AMBER)
}

pub fn success_style() -> Style {
    fg(OLIVE)
}

pub fn error_style() -> Style {
    fg(CRIMSON)
}

pub fn border_style(focused: bool) -> Style {
    fg(if focused { VIOLET } else { SLATE })
}

pub fn search_style() -> Style {
    bold(AMBER)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(STATUS_BG).fg(TEXT)
}

pub fn help_key_style() -> Style {
    bold(AMBER)
}

pub fn help_desc_style() -> Style {
    list_item_style()
}

/// Active/inactive badge color
pub fn status_style(active: bool) -> Style {
    if active {
        success_style()
    } else {
        muted_style()
    }
}

pub fn tier_style(tier: RankTier) -> Style {
    match tier {
        RankTier::Gold => bold(GOLD),
        RankTier::Silver => bold(SILVER),
        RankTier::Bronze => bold(BRONZE),
        RankTier::Standard => list_item_style(),
    }
}
