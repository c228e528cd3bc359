mod alert_popup;
mod form_popup;
mod help_overlay;
mod helpers;
mod home_view;
mod profile_view;
mod status_row;
mod tab_bar;

#[cfg(test)]
pub(crate) mod test_helpers;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::Style;
use ratatui::widgets::Block;

use super::app::{App, View};

/// Main render function, dispatches to sub-renderers
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    let bg_style = Style::default().bg(app.theme.background);
    frame.render_widget(Block::default().style(bg_style), area);

    // Layout: tab bar (2 rows) | content | status row (1 row)
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    tab_bar::render_tab_bar(frame, app, chunks[0]);

    match app.view {
        View::Home => home_view::render_home_view(frame, app, chunks[1]),
        View::Profile => profile_view::render_profile_view(frame, app, chunks[1]),
    }

    status_row::render_status_row(frame, app, chunks[2]);

    // Overlays, topmost last
    if app.home.form().is_some() {
        form_popup::render_form_popup(frame, app, area);
    }
    if app.show_help {
        help_overlay::render_help_overlay(frame, app, area);
    }
    if app.home.alert().is_some() {
        alert_popup::render_alert_popup(frame, app, area);
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;
    use super::*;
    use crate::backend::memory::MemoryStore;

    #[test]
    fn home_screen_layout() {
        let store = MemoryStore::new();
        seed(&store, "Buy milk", "2024-05-01", "9am", false);
        let mut app = mounted_app(&store);
        let out = render_to_string(TERM_W, TERM_H, |frame, _| render(frame, &mut app));

        let first = out.lines().next().unwrap();
        assert!(first.contains("Tasks"));
        assert!(first.contains("Profile"));
        assert!(out.contains("May 2024"));
        assert!(out.contains("Buy milk"));
        assert!(out.lines().last().unwrap().contains("? help"));
    }

    #[test]
    fn alert_draws_over_the_form() {
        let store = MemoryStore::new();
        let mut app = mounted_app(&store);
        app.home.open_create();
        app.home.submit();
        let out = render_to_string(TERM_W, TERM_H, |frame, _| render(frame, &mut app));
        assert!(out.contains("Please fill all fields!"));
        assert!(out.contains("New task"));
    }

    #[test]
    fn profile_tab() {
        let store = MemoryStore::new();
        let mut app = mounted_app(&store);
        app.view = View::Profile;
        let out = render_to_string(TERM_W, TERM_H, |frame, _| render(frame, &mut app));
        assert!(out.contains("ada@example.com"));
    }
}
