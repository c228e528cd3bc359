mod form;
mod navigate;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::App;

use form::handle_form;
use navigate::handle_navigate;

/// Handle a key event for whatever currently has focus
pub fn handle_key(app: &mut App, key: KeyEvent) {
    // Ignore bare modifier key presses (Shift, Ctrl, Alt, etc.)
    if matches!(key.code, KeyCode::Modifier(_)) {
        return;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    // Alerts block until dismissed
    if app.home.alert().is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
            app.home.dismiss_alert();
        }
        return;
    }

    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.home.form().is_some() {
        handle_form(app, key);
    } else {
        handle_navigate(app, key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DocumentStore;
    use crate::backend::memory::MemoryStore;
    use crate::model::{AppConfig, TASKS, UserProfile};
    use crate::screen::{FormField, HomeState};
    use crate::screen::home::FILL_ALL_FIELDS;
    use crate::tui::app::View;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::sync::Arc;

    fn press(app: &mut App, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn app_with(store: &MemoryStore) -> App {
        let profile = UserProfile {
            name: "Ada".into(),
            email: "a@b.co".into(),
            uid: "u1".into(),
        };
        let mut app = App::new(
            Arc::new(store.clone()),
            profile,
            &AppConfig::default(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
        );
        app.home.mount().unwrap();
        app.home.tick();
        app
    }

    fn settle(app: &mut App) {
        app.home.wait_for_writes();
        app.home.tick();
    }

    #[test]
    fn add_task_through_the_modal() {
        let store = MemoryStore::new();
        let mut app = app_with(&store);

        press(&mut app, KeyCode::Char('l')); // next day
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.home.state(), HomeState::CreateOpen);
        type_str(&mut app, "Buy milk");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "9am");
        press(&mut app, KeyCode::Enter);
        settle(&mut app);

        assert_eq!(app.home.state(), HomeState::Subscribed);
        let task = &app.home.tasks()[0];
        assert_eq!(task.description, "Buy milk");
        assert_eq!(task.time, "9am");
        assert_eq!(task.date, "2024-05-02");
    }

    #[test]
    fn empty_submit_shows_blocking_alert() {
        let store = MemoryStore::new();
        let mut app = app_with(&store);
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.home.alert().unwrap().message, FILL_ALL_FIELDS);

        // Keys other than dismiss are swallowed
        press(&mut app, KeyCode::Char('x'));
        assert_eq!(app.home.form().unwrap().description.text(), "");
        press(&mut app, KeyCode::Enter);
        assert!(app.home.alert().is_none());
        assert_eq!(app.home.state(), HomeState::CreateOpen);
        assert!(store.writes().is_empty());
    }

    #[test]
    fn date_field_moves_the_calendar() {
        let store = MemoryStore::new();
        let mut app = app_with(&store);
        press(&mut app, KeyCode::Char('a'));
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.home.form().unwrap().focus, FormField::Date);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Right);
        assert_eq!(
            app.home.selected_date(),
            NaiveDate::from_ymd_opt(2024, 5, 9).unwrap()
        );
        press(&mut app, KeyCode::Esc);
        assert!(app.home.form().is_none());
    }

    #[test]
    fn toggle_and_delete_keys() {
        let store = MemoryStore::new();
        store
            .add(
                TASKS,
                json!({"description": "a", "date": "2024-05-01", "time": "9", "completed": false})
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .unwrap();
        let mut app = app_with(&store);

        press(&mut app, KeyCode::Char(' '));
        settle(&mut app);
        assert!(app.home.tasks()[0].completed);

        press(&mut app, KeyCode::Char('d'));
        settle(&mut app);
        assert!(app.home.tasks().is_empty());
    }

    #[test]
    fn tab_switches_view_and_q_quits() {
        let store = MemoryStore::new();
        let mut app = app_with(&store);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.view, View::Profile);
        press(&mut app, KeyCode::Char('?'));
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn logout_from_profile() {
        let store = MemoryStore::new();
        let mut app = app_with(&store);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Char('L'));
        assert!(app.logout_requested);
        assert!(app.should_quit);
    }
}
