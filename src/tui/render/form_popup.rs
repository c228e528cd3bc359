use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::model::date::CANONICAL_FORMAT;
use crate::screen::{FormField, TextField};
use crate::tui::app::App;
use crate::util::unicode::{display_width, truncate_to_width};

use super::helpers::centered_rect_fixed;

const LABEL_WIDTH: usize = 13;

/// Render the create/edit task modal
pub fn render_form_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(form) = app.home.form() else {
        return;
    };
    let theme = &app.theme;
    let bg = theme.background;

    let popup = centered_rect_fixed(56, 9, area);
    frame.render_widget(Clear, popup);

    let title = if form.is_edit() { " Edit task " } else { " New task " };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.highlight).bg(bg))
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(bg));
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let value_width = (inner.width as usize).saturating_sub(LABEL_WIDTH + 1);
    let label = |name: &'static str, field: FormField| {
        let style = if form.focus == field {
            Style::default()
                .fg(theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.dim).bg(bg)
        };
        Span::styled(format!(" {:<width$}", name, width = LABEL_WIDTH), style)
    };
    let value_style = Style::default().fg(theme.text_bright).bg(theme.selection_bg);
    let text_value = |field: &TextField| {
        let text = truncate_to_width(field.text(), value_width);
        let pad = value_width.saturating_sub(display_width(&text));
        Span::styled(format!("{text}{}", " ".repeat(pad)), value_style)
    };

    let date = app.home.selected_date().format(CANONICAL_FORMAT).to_string();
    let date_hint = if form.focus == FormField::Date {
        "  \u{2190}\u{2192} day  \u{2191}\u{2193} week"
    } else {
        ""
    };

    let lines = vec![
        Line::from(""),
        Line::from(vec![
            label("Description", FormField::Description),
            text_value(&form.description),
        ]),
        Line::from(""),
        Line::from(vec![label("Time", FormField::Time), text_value(&form.time)]),
        Line::from(""),
        Line::from(vec![
            label("Date", FormField::Date),
            Span::styled(date, Style::default().fg(theme.text_bright).bg(bg)),
            Span::styled(date_hint, Style::default().fg(theme.dim).bg(bg)),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);

    // Terminal cursor on the focused text field
    let (field, row) = match form.focus {
        FormField::Description => (&form.description, 1),
        FormField::Time => (&form.time, 3),
        FormField::Date => return,
    };
    let col = field.cursor_col().min(value_width);
    frame.set_cursor_position((
        inner.x + (LABEL_WIDTH + 1 + col) as u16,
        inner.y + row,
    ));
}
