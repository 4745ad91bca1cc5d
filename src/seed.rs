//! Seed tree written on first start.
//!
//! Ids are fixed so tests and docs can refer to them.

use chrono::{DateTime, Utc};

use crate::task::{Task, TaskPriority, TaskStatus, ROOT_TASK_ID};

/// Tag carried by every seeded life area.
pub const AREA_TAG: &str = "root";

/// `(id, title, description)` for each life area, in display order.
pub const LIFE_AREAS: [(&str, &str, &str); 6] = [
    ("career", "Career", "Work, projects and professional growth"),
    ("health", "Health", "Exercise, nutrition and sleep"),
    ("finances", "Finances", "Budgeting, saving and investing"),
    ("relationships", "Relationships", "Family, friends and community"),
    ("learning", "Learning", "Courses, books and new skills"),
    ("home", "Home", "Chores, repairs and errands"),
];

const SAMPLE_TASKS: [(&str, &str, &str, TaskStatus, i64, TaskPriority); 5] = [
    ("c1", "career", "Complete Q1 Review", TaskStatus::InProgress, 0, TaskPriority::High),
    ("c2", "career", "Update Resume", TaskStatus::NotStarted, 1, TaskPriority::Medium),
    ("h1", "health", "Morning Run", TaskStatus::Completed, 0, TaskPriority::Medium),
    ("h2", "health", "Meal Prep", TaskStatus::NotStarted, 1, TaskPriority::High),
    ("f1", "finances", "Budget Review", TaskStatus::OnHold, 0, TaskPriority::High),
];

fn seeded(
    id: &str,
    parent_id: &str,
    title: &str,
    status: TaskStatus,
    order: i64,
    priority: TaskPriority,
    now: DateTime<Utc>,
) -> Task {
    Task {
        id: id.to_string(),
        parent_id: parent_id.to_string(),
        title: title.to_string(),
        description: None,
        status,
        priority: Some(priority),
        order,
        created_at: now,
        updated_at: now,
        completed_at: (status == TaskStatus::Completed).then_some(now),
        due_date: None,
        scheduled_date: None,
        calendar_only: false,
        tags: Vec::new(),
    }
}

/// Life areas plus a handful of sample tasks, all stamped with `now`.
pub fn seed_tasks(now: DateTime<Utc>) -> Vec<Task> {
    let mut tasks = Vec::with_capacity(LIFE_AREAS.len() + SAMPLE_TASKS.len());

    for (index, (id, title, description)) in LIFE_AREAS.iter().enumerate() {
        let mut area = seeded(
            id,
            ROOT_TASK_ID,
            title,
            TaskStatus::NotStarted,
            index as i64,
            TaskPriority::Medium,
            now,
        );
        area.description = Some(description.to_string());
        area.tags = vec![AREA_TAG.to_string()];
        tasks.push(area);
    }

    for (id, parent, title, status, order, priority) in SAMPLE_TASKS {
        tasks.push(seeded(id, parent, title, status, order, priority, now));
    }

    tasks
}
