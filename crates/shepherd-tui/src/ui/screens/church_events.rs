use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use shepherd_core::models::{ChurchEvent, ChurchEventSortColumn};

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_table(frame, app, chunks[0]);
    render_detail(frame, app.selected_event(), chunks[1]);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let sort = &app.event_sort;
    let header_label = |column: ChurchEventSortColumn| {
        format!("{}{}", column.label(), sort.indicator(column))
    };
    let header = Row::new([
        Cell::from(header_label(ChurchEventSortColumn::Title)),
        Cell::from(header_label(ChurchEventSortColumn::EventDate)),
        Cell::from(header_label(ChurchEventSortColumn::Status)),
        Cell::from(header_label(ChurchEventSortColumn::CheckIn)),
    ])
    .style(styles::title_style())
    .height(1);

    let visible = app.visible_events();
    let rows: Vec<Row> = visible
        .iter()
        .map(|event| {
            let check_in = if event.is_eligible_to_check_in { "Yes" } else { "No" };
            Row::new(vec![
                Cell::from(event.title.clone()),
                Cell::from(event.formatted_date()),
                Cell::from(Span::styled(
                    event.status_label(),
                    styles::status_style(event.is_active),
                )),
                Cell::from(check_in),
            ])
            .style(styles::list_item_style())
        })
        .collect();

    let widths = [
        Constraint::Fill(1),
        Constraint::Length(22),
        Constraint::Length(9),
        Constraint::Length(9),
    ];

    let title = format!(
        " Church events ({}) - [t]itle [d]ate [s]tatus [c]heck-in - [n]ew ",
        visible.len()
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
    if !visible.is_empty() {
        state.select(Some(app.event_selection));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn detail_row(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<10}", label), styles::muted_style()),
        Span::raw(value),
    ])
}

fn render_detail(frame: &mut Frame, event: Option<&ChurchEvent>, area: Rect) {
    let lines = match event {
        Some(event) => {
            let mut lines = vec![
                Line::from(Span::styled(event.title.clone(), styles::title_style())),
                Line::from(""),
                detail_row("Date:", event.formatted_date()),
                detail_row("Time:", event.formatted_time()),
                detail_row(
                    "Location:",
                    if event.location.is_empty() { "-".to_string() } else { event.location.clone() },
                ),
                detail_row("Image:", event.image_url().unwrap_or("none").to_string()),
                detail_row("Checked in:", event.attendees.len().to_string()),
            ];

            if !event.description.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled("Description", styles::highlight_style())));
                lines.extend(event.description.lines().map(|l| Line::from(l.to_string())));
            }

            let servants = event.servants();
            if !servants.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled("Serving", styles::highlight_style())));
                for servant in servants {
                    lines.push(Line::from(vec![
                        Span::styled(format!("  {:<18}", servant.service_role), styles::muted_style()),
                        Span::raw(servant.user.name.clone()),
                    ]));
                }
            }

            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "[Enter] edit  [x] delete",
                styles::muted_style(),
            )));
            lines
        }
        None => vec![Line::from(Span::styled(
            "No event selected",
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
