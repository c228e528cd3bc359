use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::{App, View};

/// Render the tab bar with a separator line below
pub fn render_tab_bar(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(area);

    let bg = app.theme.background;
    let bg_style = Style::default().bg(bg);
    let mut spans: Vec<Span> = vec![
        Span::styled(" ", bg_style),
        Span::styled("\u{25B6}", Style::default().fg(app.theme.highlight).bg(bg)),
        Span::styled(" ", bg_style),
    ];

    for (i, (label, view)) in [(" Tasks ", View::Home), (" Profile ", View::Profile)]
        .into_iter()
        .enumerate()
    {
        if i > 0 {
            spans.push(Span::styled(
                "\u{2502}",
                Style::default().fg(app.theme.dim).bg(bg),
            ));
        }
        spans.push(Span::styled(label, tab_style(app, app.view == view)));
    }

    // Signed-in user at the right edge
    let who = format!("{} ", app.profile.name);
    let used = super::helpers::spans_width(&spans);
    let who_width = crate::util::unicode::display_width(&who);
    let width = chunks[0].width as usize;
    if used + who_width < width {
        spans.push(Span::styled(" ".repeat(width - used - who_width), bg_style));
        spans.push(Span::styled(who, Style::default().fg(app.theme.dim).bg(bg)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(bg_style),
        chunks[0],
    );

    let sep = "\u{2500}".repeat(chunks[1].width as usize);
    frame.render_widget(
        Paragraph::new(Span::styled(sep, Style::default().fg(app.theme.accent).bg(bg))),
        chunks[1],
    );
}

fn tab_style(app: &App, active: bool) -> Style {
    if active {
        Style::default()
            .fg(app.theme.text_bright)
            .bg(app.theme.selection_bg)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.dim).bg(app.theme.background)
    }
}
