use std::io;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use crossterm::event::{self, Event, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use crate::backend::DocumentStore;
use crate::cli::handlers::AppContext;
use crate::model::date::today;
use crate::model::{AppConfig, UserProfile, WeekStart};
use crate::ops::account_ops;
use crate::screen::HomeScreen;

use super::input;
use super::render;
use super::theme::Theme;

/// Which tab is displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Profile,
}

/// Main application state
pub struct App {
    pub home: HomeScreen,
    pub profile: UserProfile,
    pub view: View,
    pub theme: Theme,
    pub week_start: WeekStart,
    pub show_help: bool,
    pub should_quit: bool,
    /// Sign out once the terminal is restored
    pub logout_requested: bool,
}

impl App {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        profile: UserProfile,
        config: &AppConfig,
        today: NaiveDate,
    ) -> Self {
        App {
            home: HomeScreen::new(store, today),
            profile,
            view: View::Home,
            theme: Theme::from_config(&config.ui),
            week_start: config.ui.week_starts_on,
            show_help: false,
            should_quit: false,
            logout_requested: false,
        }
    }

    /// Task totals for the profile tab, from the live list
    pub fn task_counts(&self) -> (usize, usize) {
        let tasks = self.home.tasks();
        (tasks.len(), tasks.iter().filter(|t| t.completed).count())
    }
}

/// Run the TUI application
pub fn run(ctx: &AppContext) -> Result<(), Box<dyn std::error::Error>> {
    let profile = account_ops::current_profile(&ctx.auth, ctx.store.as_ref())?;
    let store: Arc<dyn DocumentStore> = ctx.store.clone();
    let mut app = App::new(store, profile, &ctx.config, today());

    // Subscribe before taking over the terminal so a failure prints normally
    app.home.mount()?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Install panic hook to restore terminal on panic
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    let result = run_event_loop(&mut terminal, &mut app);

    app.home.unmount();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if result.is_ok() && app.logout_requested {
        account_ops::log_out(&ctx.auth)?;
        println!("Signed out");
    }
    result
}

fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.home.tick();
        terminal.draw(|frame| render::render(frame, app))?;

        if event::poll(Duration::from_millis(250))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            input::handle_key(app, key);
        }

        if app.should_quit {
            break;
        }
    }
    Ok(())
}
