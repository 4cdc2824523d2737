use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use shepherd_core::routes::Route;

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(6)])
        .split(area);

    let signed_in = app.session.is_authenticated();
    let greeting = if signed_in {
        vec![
            Line::from(vec![
                Span::styled("Welcome, ", styles::muted_style()),
                Span::styled(app.display_name(), styles::title_style()),
            ]),
            Line::from(Span::styled("[o] Sign out", styles::muted_style())),
        ]
    } else {
        vec![
            Line::from(Span::styled("You are not signed in.", styles::muted_style())),
            Line::from(Span::styled(
                "Choose any section to sign in.",
                styles::muted_style(),
            )),
        ]
    };
    frame.render_widget(
        Paragraph::new(greeting).block(Block::default().borders(Borders::BOTTOM)),
        chunks[0],
    );

    let items: Vec<ListItem> = Route::menu()
        .iter()
        .enumerate()
        .map(|(i, route)| {
            let lock = if route.is_protected() && !signed_in {
                "  (sign in)"
            } else {
                ""
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" [{}] ", i + 1), styles::help_key_style()),
                Span::styled(route.title(), styles::list_item_style()),
                Span::styled(lock, styles::muted_style()),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Menu ")
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .highlight_style(styles::selected_style());

    let mut state = ListState::default();
    state.select(Some(app.home_selection));
    frame.render_stateful_widget(list, chunks[1], &mut state);
}
