use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use shepherd_core::routes::Route;

use crate::app::{App, AppState, DeleteTarget};

use super::screens::{church_events, community, devotions, forms, home, leaderboard, login};
use super::styles;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_main_content(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::ConfirmingDelete(target) => render_delete_overlay(frame, app, target),
        _ => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  Shepherd · {}", app.route.title());
    let help_hint = if app.is_loading() {
        "Loading...  [?] Help"
    } else {
        "[?] Help"
    };

    let title_line = Line::from(vec![
        Span::styled(title.clone(), styles::title_style()),
        Span::raw(" ".repeat(
            (area.width as usize).saturating_sub(title.chars().count() + help_hint.len() + 2),
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    match app.route {
        Route::Root | Route::Home => home::render(frame, app, area),
        Route::Login => login::render(frame, app, area),
        Route::Devotions => devotions::render(frame, app, area),
        Route::DevotionEdit(_) => forms::render_devotion_form(frame, app, area),
        Route::ChurchEvents => church_events::render(frame, app, area),
        Route::ChurchEventCreate | Route::ChurchEventEdit(_) => {
            forms::render_event_form(frame, app, area)
        }
        Route::Leaderboard => leaderboard::render(frame, app, area),
        Route::Community => community::render(frame, app, area),
    }
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = if matches!(app.state, AppState::Searching) {
        format!(" Search: {}▌ ", app.search_query)
    } else if let Some(ref msg) = app.status_message {
        format!(" {} ", msg)
    } else if !app.search_query.is_empty() {
        format!(" Filter: {} ", app.search_query)
    } else {
        String::new()
    };
    let left_style = if matches!(app.state, AppState::Searching) {
        styles::search_style()
    } else {
        styles::muted_style()
    };

    let right_text = format!(" {} | [q]uit ", app.display_name());
    let padding_len = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.chars().count());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(56, 26, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let lines = vec![
        Line::from(Span::styled("  Shepherd", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", version),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("1-4", "Devotions / Events / Leaderboard / Community"),
        help_line("↑/↓", "Move selection"),
        help_line("Enter", "Open / edit selected"),
        help_line("Esc", "Go back"),
        help_line("o", "Sign out (home)"),
        Line::from(""),
        Line::from(Span::styled(" Lists", styles::highlight_style())),
        help_line("/", "Search"),
        help_line("←/→", "Previous / next page"),
        help_line("n", "New church event"),
        help_line("x, Del", "Delete selected"),
        help_line("r", "Reload"),
        help_line("d t b v s", "Sort devotions"),
        help_line("t d s c", "Sort events"),
        Line::from(""),
        Line::from(Span::styled(" Forms", styles::highlight_style())),
        help_line("Tab/↓ ↑", "Next / previous field"),
        help_line("Space", "Toggle checkbox"),
        help_line("Enter", "Attach image / save"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn confirm_lines(question: String, action: &'static str) -> Vec<Line<'static>> {
    vec![
        Line::from(""),
        Line::from(Span::styled(format!("  {}", question), styles::highlight_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(format!(" to {}, ", action), styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ]
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 6, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    let lines = confirm_lines("Are you sure you want to quit?".to_string(), "quit");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_delete_overlay(frame: &mut Frame, app: &App, target: DeleteTarget) {
    let area = centered_rect_fixed(60, 6, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .title(" Delete ")
        .borders(Borders::ALL)
        .border_style(styles::error_style());
    let question = format!("Delete {}?", app.delete_label(target));
    let lines = confirm_lines(question, "delete");
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
pub fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
