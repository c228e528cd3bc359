use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::screen::HomeState;
use crate::tui::app::{App, View};

use super::helpers::spans_width;

/// Render the status row (bottom of screen)
pub fn render_status_row(frame: &mut Frame, app: &App, area: Rect) {
    let bg = app.theme.background;
    let width = area.width as usize;

    let mut spans: Vec<Span> = Vec::new();
    let pending = app.home.pending_writes();
    if pending > 0 {
        spans.push(Span::styled(
            " saving\u{2026}",
            Style::default().fg(app.theme.highlight).bg(bg),
        ));
    } else if app.home.state() == HomeState::Loading {
        spans.push(Span::styled(
            " loading\u{2026}",
            Style::default().fg(app.theme.dim).bg(bg),
        ));
    }

    let hint = hint_for(app);
    let content_width = spans_width(&spans);
    let hint_width = crate::util::unicode::display_width(hint);
    if content_width + hint_width < width {
        let padding = width - content_width - hint_width;
        spans.push(Span::styled(" ".repeat(padding), Style::default().bg(bg)));
        spans.push(Span::styled(hint, Style::default().fg(app.theme.dim).bg(bg)));
    }

    let paragraph = Paragraph::new(Line::from(spans)).style(Style::default().bg(bg));
    frame.render_widget(paragraph, area);
}

fn hint_for(app: &App) -> &'static str {
    if app.home.form().is_some() {
        return "Tab next field  Enter save  Esc cancel ";
    }
    match app.view {
        View::Home => "a add  e edit  space done  d delete  ? help ",
        View::Profile => "L sign out  Tab tasks  ? help ",
    }
}
