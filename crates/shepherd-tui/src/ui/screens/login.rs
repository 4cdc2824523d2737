use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, LoginFocus};
use crate::ui::render::centered_rect_fixed;
use crate::ui::styles;

/// Visible width of the input fields
const FIELD_WIDTH: usize = 24;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let extra = usize::from(app.notice.is_some()) + usize::from(app.login_error.is_some());
    let height = 9 + 2 * extra as u16;
    let area = centered_rect_fixed(50, height, area);
    frame.render_widget(Clear, area);

    let mut lines = vec![];

    if let Some(ref notice) = app.notice {
        lines.push(Line::from(Span::styled(
            format!(" {}", notice),
            styles::highlight_style(),
        )));
        lines.push(Line::from(""));
    }

    lines.push(Line::from(Span::styled(
        "  Sign in to manage your church",
        styles::muted_style(),
    )));
    lines.push(Line::from(""));

    lines.push(field_line(
        "Email:    ",
        tail(&app.login_email, FIELD_WIDTH),
        app.login_focus == LoginFocus::Email,
    ));
    let masked = "*".repeat(app.login_password.chars().count().min(FIELD_WIDTH));
    lines.push(field_line(
        "Password: ",
        masked,
        app.login_focus == LoginFocus::Password,
    ));

    lines.push(Line::from(""));
    let button_focused = app.login_focus == LoginFocus::Button;
    let (label, style) = if button_focused {
        (" ▶ Sign in ◀ ", styles::selected_style())
    } else {
        ("   Sign in   ", styles::list_item_style())
    };
    lines.push(Line::from(vec![
        Span::raw("               ["),
        Span::styled(label, style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!(" {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .title(" Shepherd ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn field_line(label: &'static str, value: String, focused: bool) -> Line<'static> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("  "),
        Span::styled(label, styles::muted_style()),
        Span::styled("[", styles::muted_style()),
        Span::styled(format!("{:<width$}{}", value, cursor, width = FIELD_WIDTH), style),
        Span::styled("]", styles::muted_style()),
    ])
}

/// Last `width` characters, so the cursor end stays visible
fn tail(s: &str, width: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(width)).collect()
}
