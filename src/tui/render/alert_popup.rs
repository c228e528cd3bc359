use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::screen::AlertKind;
use crate::tui::app::App;
use crate::util::unicode::display_width;

use super::helpers::centered_rect_fixed;

/// Render the blocking alert dialog
pub fn render_alert_popup(frame: &mut Frame, app: &App, area: Rect) {
    let Some(alert) = app.home.alert() else {
        return;
    };
    let theme = &app.theme;
    let bg = theme.background;

    let (title, border) = match alert.kind {
        AlertKind::Info => (" Done ", theme.green),
        AlertKind::Error => (" Error ", theme.red),
    };

    let width = (display_width(&alert.message) as u16 + 6).clamp(30, 60);
    let popup = centered_rect_fixed(width, 6, area);
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border).bg(bg))
        .title(Span::styled(
            title,
            Style::default().fg(border).bg(bg).add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(bg));

    let lines = vec![
        Line::from(Span::styled(
            format!(" {}", alert.message),
            Style::default().fg(theme.text_bright).bg(bg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            " Enter OK",
            Style::default().fg(theme.dim).bg(bg),
        )),
    ];

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup);
}
