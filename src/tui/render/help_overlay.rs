use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::tui::app::{App, View};

/// Render the help overlay (toggled with ?)
pub fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let overlay_area = centered_rect(60, 80, area);
    frame.render_widget(Clear, overlay_area);

    let bg = app.theme.background;
    let key_style = Style::default()
        .fg(app.theme.highlight)
        .bg(bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(app.theme.text).bg(bg);
    let header_style = Style::default()
        .fg(app.theme.text_bright)
        .bg(bg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(" Key Bindings", header_style)),
        Line::from(""),
    ];

    match app.view {
        View::Home => {
            lines.push(Line::from(Span::styled(" Tasks", header_style)));
            for (key, desc) in [
                (" \u{2191}\u{2193}/jk", "Move cursor"),
                (" g/G", "First / last task"),
                (" a/n", "New task on the selected day"),
                (" e/Enter", "Edit task"),
                (" Space/x", "Toggle completed"),
                (" d/Del", "Delete task"),
            ] {
                add_binding(&mut lines, key, desc, key_style, desc_style);
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(" Calendar", header_style)));
            for (key, desc) in [
                (" \u{2190}\u{2192}/hl", "Previous / next day"),
                (" H/L", "Previous / next week"),
                (" [/]", "Previous / next month"),
                (" t", "Today"),
            ] {
                add_binding(&mut lines, key, desc, key_style, desc_style);
            }
        }
        View::Profile => {
            lines.push(Line::from(Span::styled(" Profile", header_style)));
            add_binding(&mut lines, " L", "Sign out and quit", key_style, desc_style);
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" Global", header_style)));
    for (key, desc) in [
        (" Tab", "Switch tab"),
        (" ?", "Close this help"),
        (" q/Ctrl+C", "Quit"),
    ] {
        add_binding(&mut lines, key, desc, key_style, desc_style);
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.accent).bg(bg))
        .style(Style::default().bg(bg));
    frame.render_widget(Paragraph::new(lines).block(block), overlay_area);
}

fn add_binding<'a>(
    lines: &mut Vec<Line<'a>>,
    key: &'a str,
    desc: &'a str,
    key_style: Style,
    desc_style: Style,
) {
    let padded_key = format!("{:<width$}", key, width = 16);
    lines.push(Line::from(vec![
        Span::styled(padded_key, key_style),
        Span::styled(desc, desc_style),
    ]));
}

/// Create a centered rectangle of the given percentage of the parent
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
