use indexmap::IndexMap;

use crate::model::Task;

/// Partition tasks by their literal `date` string.
///
/// Groups appear in the order their date is first seen, and tasks keep
/// their input order within a group. Dates are compared as strings with no
/// parsing, so `2024-05-01` and `2024-5-1` are separate groups.
pub fn group_by_date(tasks: &[Task]) -> IndexMap<&str, Vec<&Task>> {
    let mut groups: IndexMap<&str, Vec<&Task>> = IndexMap::new();
    for task in tasks {
        groups.entry(task.date.as_str()).or_default().push(task);
    }
    groups
}
