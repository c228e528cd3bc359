use std::sync::Arc;

use chrono::NaiveDate;
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use serde_json::json;

use crate::backend::DocumentStore;
use crate::backend::memory::MemoryStore;
use crate::model::{AppConfig, TASKS, UserProfile};
use crate::tui::app::App;

pub const TERM_W: u16 = 80;
pub const TERM_H: u16 = 24;

/// Render into an in-memory buffer and return plain text (no styles).
pub fn render_to_string<F>(w: u16, h: u16, f: F) -> String
where
    F: FnOnce(&mut ratatui::Frame, Rect),
{
    let backend = TestBackend::new(w, h);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| {
            let area = frame.area();
            f(frame, area);
        })
        .unwrap();

    let buf = terminal.backend().buffer().clone();
    let w = buf.area.width as usize;
    let lines: Vec<String> = buf
        .content
        .chunks(w)
        .map(|row| {
            let s: String = row.iter().map(|cell| cell.symbol()).collect();
            s.trim_end().to_string()
        })
        .collect();

    // Trim trailing blank lines
    let end = lines
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |i| i + 1);
    lines[..end].join("\n")
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

/// Add a task document straight to the store
pub fn seed(store: &MemoryStore, description: &str, date: &str, time: &str, completed: bool) -> String {
    store
        .add(
            TASKS,
            json!({"description": description, "date": date, "time": time, "completed": completed})
                .as_object()
                .cloned()
                .unwrap(),
        )
        .unwrap()
}

/// An App on 2024-05-01 over `store`, mounted and caught up
pub fn mounted_app(store: &MemoryStore) -> App {
    let profile = UserProfile {
        name: "Ada".into(),
        email: "ada@example.com".into(),
        uid: "u1".into(),
    };
    let mut app = App::new(Arc::new(store.clone()), profile, &AppConfig::default(), today());
    app.home.mount().unwrap();
    app.home.tick();
    app
}
