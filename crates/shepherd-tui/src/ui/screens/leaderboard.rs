use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use shepherd_core::models::{RankTier, RankedUser};

use crate::app::App;
use crate::ui::styles;

/// Characters used for the progress bar
const BAR_WIDTH: usize = 20;

fn medal(tier: RankTier) -> &'static str {
    match tier {
        RankTier::Gold => "🥇",
        RankTier::Silver => "🥈",
        RankTier::Bronze => "🥉",
        RankTier::Standard => "  ",
    }
}

fn progress_bar(percent: f64) -> String {
    let filled = ((percent / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("{}{}", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn row(user: &RankedUser) -> Row<'static> {
    let style = styles::tier_style(user.tier);
    Row::new(vec![
        Cell::from(format!("{} {:>3}", medal(user.tier), user.rank)),
        Cell::from(Span::styled(user.progress.name.clone(), style)),
        Cell::from(progress_bar(user.percent())),
        Cell::from(format!("{:>5.1}%", user.percent())),
    ])
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(["Rank", "Name", "Progress", ""])
        .style(styles::title_style())
        .height(1);

    let rows: Vec<Row> = app.leaderboard.iter().map(row).collect();
    let widths = [
        Constraint::Length(8),
        Constraint::Fill(1),
        Constraint::Length(BAR_WIDTH as u16 + 2),
        Constraint::Length(8),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!(" Summa Logos reading plan ({}) ", app.leaderboard.len()))
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !app.leaderboard.is_empty() {
        state.select(Some(app.leaderboard_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}
