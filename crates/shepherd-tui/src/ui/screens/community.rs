use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let lines = vec![
        Line::from(vec![
            Span::styled("Welcome to the community, ", styles::muted_style()),
            Span::styled(app.display_name(), styles::title_style()),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Member groups and announcements live here.",
            styles::list_item_style(),
        )),
        Line::from(Span::styled(
            "Press [3] to see who is leading the reading plan.",
            styles::muted_style(),
        )),
    ];

    let block = Block::default()
        .title(" Community ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}
