use crossterm::event::{KeyCode, KeyEvent};

use crate::tui::app::{App, View};

pub(super) fn handle_navigate(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Tab | KeyCode::BackTab => {
            app.view = match app.view {
                View::Home => View::Profile,
                View::Profile => View::Home,
            };
        }
        _ => match app.view {
            View::Home => handle_home(app, key),
            View::Profile => handle_profile(app, key),
        },
    }
}

fn handle_home(app: &mut App, key: KeyEvent) {
    let home = &mut app.home;
    match key.code {
        // List cursor
        KeyCode::Down | KeyCode::Char('j') => home.move_cursor(1),
        KeyCode::Up | KeyCode::Char('k') => home.move_cursor(-1),
        KeyCode::Char('g') => home.move_cursor(isize::MIN),
        KeyCode::Char('G') => home.move_cursor(isize::MAX),

        // Calendar
        KeyCode::Left | KeyCode::Char('h') => home.move_date(-1),
        KeyCode::Right | KeyCode::Char('l') => home.move_date(1),
        KeyCode::Char('H') => home.move_date(-7),
        KeyCode::Char('L') => home.move_date(7),
        KeyCode::Char('[') | KeyCode::PageUp => home.move_month(-1),
        KeyCode::Char(']') | KeyCode::PageDown => home.move_month(1),
        KeyCode::Char('t') => home.select_today(),

        // Rows
        KeyCode::Char('a') | KeyCode::Char('n') => home.open_create(),
        KeyCode::Char('e') | KeyCode::Enter => home.open_edit(),
        KeyCode::Char(' ') | KeyCode::Char('x') => home.toggle(),
        KeyCode::Char('d') | KeyCode::Delete => home.delete(),
        _ => {}
    }
}

fn handle_profile(app: &mut App, key: KeyEvent) {
    if key.code == KeyCode::Char('L') {
        app.logout_requested = true;
        app.should_quit = true;
    }
}
