use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::tui::app::App;

/// Render the signed-in user's details and task totals
pub fn render_profile_view(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;
    let label = Style::default().fg(theme.dim).bg(bg);
    let value = Style::default().fg(theme.text_bright).bg(bg);
    let (total, done) = app.task_counts();

    let row = |name: &'static str, v: String| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", name), label),
            Span::styled(v, value),
        ])
    };

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", app.profile.name),
            Style::default()
                .fg(theme.highlight)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        row("Email", app.profile.email.clone()),
        row("User ID", app.profile.uid.clone()),
        Line::from(""),
        row("Tasks", total.to_string()),
        row("Completed", done.to_string()),
        row("Open", (total - done).to_string()),
        Line::from(""),
        Line::from(Span::styled("  Press L to sign out", label)),
    ];

    frame.render_widget(Paragraph::new(lines).style(Style::default().bg(bg)), area);
}
