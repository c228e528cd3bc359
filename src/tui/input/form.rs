use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::screen::FormField;
use crate::tui::app::App;

pub(super) fn handle_form(app: &mut App, key: KeyEvent) {
    let home = &mut app.home;
    match key.code {
        KeyCode::Esc => return home.cancel(),
        KeyCode::Enter => return home.submit(),
        _ => {}
    }

    let Some(form) = home.form_mut() else {
        return;
    };
    match key.code {
        KeyCode::Tab => {
            form.focus = form.focus.next();
            return;
        }
        KeyCode::BackTab => {
            form.focus = form.focus.prev();
            return;
        }
        _ => {}
    }

    if form.focus == FormField::Date {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => home.move_date(-1),
            KeyCode::Right | KeyCode::Char('l') => home.move_date(1),
            KeyCode::Up | KeyCode::Char('k') => home.move_date(-7),
            KeyCode::Down | KeyCode::Char('j') => home.move_date(7),
            KeyCode::PageUp | KeyCode::Char('[') => home.move_month(-1),
            KeyCode::PageDown | KeyCode::Char(']') => home.move_month(1),
            KeyCode::Char('t') => home.select_today(),
            _ => {}
        }
        return;
    }

    let Some(field) = form.focused_mut() else {
        return;
    };
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('w') if ctrl => field.delete_word(),
        KeyCode::Char('a') if ctrl => field.home(),
        KeyCode::Char('e') if ctrl => field.end(),
        KeyCode::Char(c) if !ctrl => field.insert(c),
        KeyCode::Backspace => field.backspace(),
        KeyCode::Delete => field.delete(),
        KeyCode::Left => field.left(),
        KeyCode::Right => field.right(),
        KeyCode::Home => field.home(),
        KeyCode::End => field.end(),
        _ => {}
    }
}
