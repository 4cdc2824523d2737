use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, DevotionField, EventField};
use crate::ui::styles;

/// Width reserved for field labels
const LABEL_WIDTH: usize = 20;

fn text_line(label: &'static str, value: &str, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::styled(format!("  {:<width$}", label, width = LABEL_WIDTH), styles::muted_style()),
        Span::styled(format!("{}{}", value, cursor), style),
    ])
}

fn checkbox_line(label: &'static str, checked: bool, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let mark = if checked { "[x]" } else { "[ ]" };
    Line::from(vec![
        Span::styled(format!("  {:<width$}", label, width = LABEL_WIDTH), styles::muted_style()),
        Span::styled(mark, style),
    ])
}

fn save_line(focused: bool) -> Line<'static> {
    if focused {
        Line::from(vec![
            Span::raw("  ["),
            Span::styled(" ▶ Save ◀ ", styles::selected_style()),
            Span::raw("]"),
        ])
    } else {
        Line::from(vec![
            Span::raw("  ["),
            Span::styled("   Save   ", styles::list_item_style()),
            Span::raw("]"),
        ])
    }
}

fn push_footer(lines: &mut Vec<Line<'static>>, error: Option<&str>) {
    if let Some(error) = error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  [Tab] next field  [Space] toggle  [Enter] save  [Esc] cancel",
        styles::muted_style(),
    )));
}

fn form_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
}

pub fn render_devotion_form(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.devotion_form;
    let focus = app.devotion_field;

    let mut lines = vec![Line::from("")];
    for field in DevotionField::ALL {
        let focused = field == focus;
        let line = match field {
            DevotionField::Date => text_line(field.label(), &form.date, focused),
            DevotionField::Title => text_line(field.label(), &form.title, focused),
            DevotionField::Subtitle => text_line(field.label(), &form.subtitle, focused),
            DevotionField::Book => text_line(field.label(), &form.book, focused),
            DevotionField::VideoUrl => text_line(field.label(), &form.video_url, focused),
            DevotionField::Content => text_line(field.label(), &form.content, focused),
            DevotionField::Active => checkbox_line(field.label(), form.is_active, focused),
            DevotionField::Save => {
                lines.push(Line::from(""));
                save_line(focused)
            }
        };
        lines.push(line);
    }
    push_footer(&mut lines, app.form_error.as_deref());

    frame.render_widget(
        Paragraph::new(lines)
            .block(form_block(format!(" {} ", app.route.title())))
            .wrap(Wrap { trim: false }),
        area,
    );
}

pub fn render_event_form(frame: &mut Frame, app: &App, area: Rect) {
    let form = &app.event_form;
    let focus = app.event_field;

    let mut lines = vec![Line::from("")];
    for field in EventField::ALL {
        let focused = field == focus;
        let line = match field {
            EventField::Title => text_line(field.label(), &form.title, focused),
            EventField::Description => text_line(field.label(), &form.description, focused),
            EventField::Date => text_line(field.label(), &form.event_date, focused),
            EventField::Time => text_line(field.label(), &form.event_time, focused),
            EventField::Location => text_line(field.label(), &form.location, focused),
            EventField::Active => checkbox_line(field.label(), form.is_active, focused),
            EventField::CheckIn => {
                checkbox_line(field.label(), form.is_eligible_to_check_in, focused)
            }
            EventField::Image => {
                let line = text_line(field.label(), &form.image_path, focused);
                lines.push(line);
                let preview = form
                    .image_preview()
                    .unwrap_or_else(|| "No image".to_string());
                let style = if form.image.is_some() {
                    styles::success_style()
                } else {
                    styles::muted_style()
                };
                Line::from(vec![
                    Span::raw(format!("  {:<width$}", "", width = LABEL_WIDTH)),
                    Span::styled(preview, style),
                ])
            }
            EventField::Save => {
                lines.push(Line::from(""));
                save_line(focused)
            }
        };
        lines.push(line);
    }
    push_footer(&mut lines, app.form_error.as_deref());

    frame.render_widget(
        Paragraph::new(lines)
            .block(form_block(format!(" {} ", app.route.title())))
            .wrap(Wrap { trim: false }),
        area,
    );
}
