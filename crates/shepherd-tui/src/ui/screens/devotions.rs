use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use shepherd_core::models::{Devotion, DevotionSortColumn};
use shepherd_core::utils::truncate;

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_table(frame, app, chunks[0]);
    render_detail(frame, app.selected_devotion(), chunks[1]);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let sort = &app.devotion_sort;
    let header_label = |column: DevotionSortColumn| {
        format!("{}{}", column.label(), sort.indicator(column))
    };
    let header = Row::new([
        Cell::from(header_label(DevotionSortColumn::Date)),
        Cell::from(header_label(DevotionSortColumn::Title)),
        Cell::from(header_label(DevotionSortColumn::Book)),
        Cell::from(header_label(DevotionSortColumn::Views)),
        Cell::from(header_label(DevotionSortColumn::Status)),
    ])
    .style(styles::title_style())
    .height(1);

    let visible = app.visible_devotions();
    let page = app.devotion_page_of(&visible);

    let rows: Vec<Row> = page
        .items
        .iter()
        .map(|devotion| {
            Row::new(vec![
                Cell::from(devotion.formatted_date()),
                Cell::from(truncate(&devotion.title, 40)),
                Cell::from(devotion.book.clone()),
                Cell::from(devotion.total_views.to_string()),
                Cell::from(Span::styled(
                    devotion.status_label(),
                    styles::status_style(devotion.is_active),
                )),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Length(22),
        Constraint::Fill(1),
        Constraint::Length(14),
        Constraint::Length(7),
        Constraint::Length(9),
    ];

    let title = format!(
        " Devotions - {} - page {}/{} - [d]ate [t]itle [b]ook [v]iews [s]tatus ",
        page.range_label(app.devotions_per_page()),
        page.page,
        page.total_pages.max(1),
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .title_style(styles::muted_style())
                .borders(Borders::ALL)
                .border_style(styles::border_style(true)),
        )
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    if !page.items.is_empty() {
        state.select(Some(app.devotion_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_detail(frame: &mut Frame, devotion: Option<&Devotion>, area: Rect) {
    let lines = match devotion {
        Some(devotion) => {
            let mut lines = vec![
                Line::from(Span::styled(devotion.title.clone(), styles::title_style())),
            ];
            if !devotion.subtitle.is_empty() {
                lines.push(Line::from(Span::styled(
                    devotion.subtitle.clone(),
                    styles::highlight_style(),
                )));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("Date:   ", styles::muted_style()),
                Span::raw(devotion.formatted_date()),
            ]));
            lines.push(Line::from(vec![
                Span::styled("Book:   ", styles::muted_style()),
                Span::raw(if devotion.book.is_empty() { "-".to_string() } else { devotion.book.clone() }),
            ]));
            if !devotion.video_url.is_empty() {
                lines.push(Line::from(vec![
                    Span::styled("Video:  ", styles::muted_style()),
                    Span::raw(devotion.video_url.clone()),
                ]));
            }
            lines.push(Line::from(""));
            lines.extend(devotion.content.lines().map(|l| Line::from(l.to_string())));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "[Enter] edit  [x] delete",
                styles::muted_style(),
            )));
            lines
        }
        None => vec![Line::from(Span::styled(
            "No devotion selected",
            styles::muted_style(),
        ))],
    };

    let block = Block::default()
        .title(" Details ")
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
