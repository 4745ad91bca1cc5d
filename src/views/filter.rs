//! Visibility, archive and search filters.

use chrono::{DateTime, Utc};

use crate::task::Task;
use crate::tree::is_completed_older_than;

fn is_archived(task: &Task, hide_days: u32, now: DateTime<Utc>) -> bool {
    task.is_completed() && is_completed_older_than(task, hide_days, now)
}

/// Children of `parent_id` minus archived completions, sorted by `order`.
pub fn visible_children<'a>(
    tasks: &'a [Task],
    parent_id: &str,
    hide_days: u32,
    now: DateTime<Utc>,
) -> Vec<&'a Task> {
    let mut children: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.parent_id == parent_id)
        .filter(|t| !is_archived(t, hide_days, now))
        .collect();
    children.sort_by_key(|t| t.order);
    children
}

/// Completed tasks past the cutoff, most recently completed first.
pub fn archived_tasks(tasks: &[Task], hide_days: u32, now: DateTime<Utc>) -> Vec<&Task> {
    let mut archived: Vec<&Task> = tasks
        .iter()
        .filter(|t| is_archived(t, hide_days, now))
        .collect();
    archived.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    archived
}

/// Case-insensitive substring match on title or description.
///
/// A blank query matches nothing.
pub fn search_tasks<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    tasks
        .iter()
        .filter(|t| {
            t.title.to_lowercase().contains(&needle)
                || t
                    .description
                    .as_deref()
                    .map(|d| d.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        })
        .collect()
}
