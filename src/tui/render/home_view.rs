use chrono::{Datelike, Months, NaiveDate};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::model::WeekStart;
use crate::model::date::parse_date;
use crate::screen::HomeState;
use crate::tui::app::App;
use crate::util::unicode::truncate_to_width;

/// Cell width of one calendar day
const DAY_CELL: u16 = 4;
const CALENDAR_WIDTH: u16 = DAY_CELL * 7 + 2;

/// Render the calendar on the left and the grouped task list beside it
pub fn render_home_view(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(CALENDAR_WIDTH), Constraint::Min(1)])
        .split(area);

    render_calendar(frame, app, chunks[0]);
    render_task_list(frame, app, chunks[1]);
}

fn render_calendar(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;
    let selected = app.home.selected_date();
    let today = app.home.today();
    let marked = app.home.dates_with_tasks();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent).bg(bg))
        .title(Span::styled(
            format!(" {} ", selected.format("%B %Y")),
            Style::default()
                .fg(theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD),
        ))
        .style(Style::default().bg(bg));

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(Span::styled(
        weekday_header(app.week_start),
        Style::default().fg(theme.dim).bg(bg),
    )));

    for week in month_grid(selected, app.week_start) {
        let mut spans: Vec<Span> = Vec::new();
        for day in week {
            let Some(day) = day else {
                spans.push(Span::styled(
                    " ".repeat(DAY_CELL as usize),
                    Style::default().bg(bg),
                ));
                continue;
            };
            let marker = if marked.contains(&day) { "\u{2022}" } else { " " };
            let mut style = Style::default().fg(theme.text).bg(bg);
            if day == today {
                style = style.fg(theme.highlight).add_modifier(Modifier::BOLD);
            }
            if day == selected {
                style = style
                    .fg(theme.text_bright)
                    .bg(theme.highlight)
                    .add_modifier(Modifier::BOLD);
            }
            spans.push(Span::styled(format!("{:>3}", day.day()), style));
            spans.push(Span::styled(marker, Style::default().fg(theme.highlight).bg(bg)));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" New tasks go on ", Style::default().fg(theme.dim).bg(bg)),
        Span::styled(
            selected.format("%b %-d").to_string(),
            Style::default().fg(theme.text_bright).bg(bg),
        ),
    ]));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn weekday_header(week_start: WeekStart) -> String {
    let names = match week_start {
        WeekStart::Monday => ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"],
        WeekStart::Sunday => ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
    };
    names.iter().map(|n| format!(" {n} ")).collect()
}

/// Rows of seven cells covering the month of `date`, `None` outside it
fn month_grid(date: NaiveDate, week_start: WeekStart) -> Vec<[Option<NaiveDate>; 7]> {
    let Some(first) = date.with_day(1) else {
        return Vec::new();
    };
    let offset = match week_start {
        WeekStart::Monday => first.weekday().num_days_from_monday(),
        WeekStart::Sunday => first.weekday().num_days_from_sunday(),
    } as usize;
    let next_month = first.checked_add_months(Months::new(1));

    let mut weeks = Vec::new();
    let mut week = [None; 7];
    let mut col = offset;
    for day in first.iter_days().take_while(|d| Some(*d) != next_month) {
        week[col] = Some(day);
        col += 1;
        if col == 7 {
            weeks.push(week);
            week = [None; 7];
            col = 0;
        }
    }
    if col > 0 {
        weeks.push(week);
    }
    weeks
}

fn render_task_list(frame: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let bg = theme.background;
    let inner = Rect {
        x: area.x + 1,
        width: area.width.saturating_sub(2),
        ..area
    };

    if app.home.state() == HomeState::Loading {
        frame.render_widget(
            Paragraph::new(Span::styled(
                "Loading tasks\u{2026}",
                Style::default().fg(theme.dim).bg(bg),
            )),
            inner,
        );
        return;
    }

    let groups = app.home.grouped();
    if groups.is_empty() {
        let lines = vec![
            Line::from(Span::styled(
                "No tasks yet.",
                Style::default().fg(theme.text).bg(bg),
            )),
            Line::from(Span::styled(
                "Press a to add one.",
                Style::default().fg(theme.dim).bg(bg),
            )),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
        return;
    }

    let width = inner.width as usize;
    let cursor = app.home.cursor();
    let mut lines: Vec<Line> = Vec::new();
    let mut cursor_line = 0;
    let mut index = 0;

    for (date, tasks) in &groups {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            truncate_to_width(&date_heading(date, app.home.today()), width),
            Style::default()
                .fg(theme.text_bright)
                .bg(bg)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )));

        for task in tasks {
            let is_cursor = index == cursor;
            if is_cursor {
                cursor_line = lines.len();
            }
            let row_bg = if is_cursor { theme.selection_bg } else { bg };
            let check = if task.completed { "[x] " } else { "[ ] " };
            let time = format!("  {}", task.time);
            let desc_room = width.saturating_sub(4 + crate::util::unicode::display_width(&time));
            let desc_style = if task.completed {
                Style::default()
                    .fg(theme.dim)
                    .bg(row_bg)
                    .add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(theme.text).bg(row_bg)
            };
            lines.push(Line::from(vec![
                Span::styled(check, Style::default().fg(theme.highlight).bg(row_bg)),
                Span::styled(truncate_to_width(&task.description, desc_room), desc_style),
                Span::styled(time, Style::default().fg(theme.dim).bg(row_bg)),
            ]));
            index += 1;
        }
    }

    // Keep the cursor row on screen
    let height = inner.height as usize;
    let scroll = cursor_line.saturating_sub(height.saturating_sub(1));
    let visible: Vec<Line> = lines.into_iter().skip(scroll).take(height).collect();
    frame.render_widget(Paragraph::new(visible), inner);
}

/// "Wed, May 1 2024" for canonical dates, the raw string otherwise
fn date_heading(date: &str, today: NaiveDate) -> String {
    match parse_date(date, today) {
        Ok(d) if d == today => format!("Today, {}", d.format("%b %-d %Y")),
        Ok(d) => d.format("%a, %b %-d %Y").to_string(),
        Err(_) => date.to_string(),
    }
}
