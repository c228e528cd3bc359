use indexmap::IndexMap;
use serde::Serialize;

use crate::model::{ProfileSummary, Task};

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson<'a> {
    pub id: &'a str,
    pub description: &'a str,
    pub date: &'a str,
    pub time: &'a str,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

#[derive(Serialize)]
pub struct DateGroupJson<'a> {
    pub date: &'a str,
    pub tasks: Vec<TaskJson<'a>>,
}

#[derive(Serialize)]
pub struct CreatedJson<'a> {
    pub id: &'a str,
}

#[derive(Serialize)]
pub struct ToggledJson<'a> {
    pub id: &'a str,
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson<'_> {
    TaskJson {
        id: &task.id,
        description: &task.description,
        date: &task.date,
        time: &task.time,
        completed: task.completed,
        created_at: task.created_at.map(|t| t.to_rfc3339()),
    }
}

pub fn groups_to_json<'a>(groups: &IndexMap<&'a str, Vec<&'a Task>>) -> Vec<DateGroupJson<'a>> {
    groups
        .iter()
        .map(|(date, tasks)| DateGroupJson {
            date: *date,
            tasks: tasks.iter().map(|t| task_to_json(*t)).collect(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Human-readable formatting
// ---------------------------------------------------------------------------

/// `[x] Buy milk at 9am  (id)`
pub fn format_task_line(task: &Task) -> String {
    let check = if task.completed { 'x' } else { ' ' };
    if task.time.is_empty() {
        format!("[{}] {}  ({})", check, task.description, task.id)
    } else {
        format!("[{}] {} at {}  ({})", check, task.description, task.time, task.id)
    }
}

/// Date headings with their tasks indented under them
pub fn format_groups(groups: &IndexMap<&str, Vec<&Task>>) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, (date, tasks)) in groups.iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        lines.push(date.to_string());
        for task in tasks {
            lines.push(format!("  {}", format_task_line(task)));
        }
    }
    lines
}

pub fn format_profile(summary: &ProfileSummary) -> Vec<String> {
    vec![
        format!("name:  {}", summary.user.name),
        format!("email: {}", summary.user.email),
        format!("uid:   {}", summary.user.uid),
        format!(
            "tasks: {} ({} done)",
            summary.total_tasks, summary.completed_tasks
        ),
    ]
}
