//! Home dashboard summaries: life area cards, today's agenda, upcoming deadlines.

use chrono::{DateTime, Days, Duration, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::config::DashboardConfig;
use crate::task::{Task, TaskStatus, ROOT_TASK_ID};
use crate::tree::theme_name;

/// Immediate-children counts per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub not_started: usize,
    pub in_progress: usize,
    pub on_hold: usize,
    pub completed: usize,
}

impl StatusCounts {
    pub fn get(&self, status: TaskStatus) -> usize {
        match status {
            TaskStatus::NotStarted => self.not_started,
            TaskStatus::InProgress => self.in_progress,
            TaskStatus::OnHold => self.on_hold,
            TaskStatus::Completed => self.completed,
        }
    }

    fn bump(&mut self, status: TaskStatus) {
        match status {
            TaskStatus::NotStarted => self.not_started += 1,
            TaskStatus::InProgress => self.in_progress += 1,
            TaskStatus::OnHold => self.on_hold += 1,
            TaskStatus::Completed => self.completed += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AreaSnapshot<'a> {
    pub area: &'a Task,
    pub theme: &'static str,
    pub counts: StatusCounts,
    pub total: usize,
    pub due_soon: bool,
    pub highlights: Vec<String>,
}

impl AreaSnapshot<'_> {
    /// Active work: in progress plus on hold.
    pub fn activity_score(&self) -> usize {
        self.counts.in_progress + self.counts.on_hold
    }
}

/// Tasks due or scheduled on the current local day.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TodayAgenda<'a> {
    pub tasks: Vec<&'a Task>,
    pub calendar_items: Vec<&'a Task>,
}

impl TodayAgenda<'_> {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.calendar_items.is_empty()
    }
}

/// Top-level areas, excluding calendar-only items, in display order.
pub fn life_areas(tasks: &[Task]) -> Vec<&Task> {
    let mut areas: Vec<&Task> = tasks
        .iter()
        .filter(|t| t.parent_id == ROOT_TASK_ID && !t.calendar_only)
        .collect();
    areas.sort_by_key(|t| t.order);
    areas
}

/// Open and due within `days` (overdue counts).
fn is_due_soon(task: &Task, days: u32, now: DateTime<Utc>) -> bool {
    match task.due_date {
        Some(due) if !task.is_completed() => due - now <= Duration::days(i64::from(days)),
        _ => false,
    }
}

pub fn area_snapshots<'a>(
    tasks: &'a [Task],
    now: DateTime<Utc>,
    config: &DashboardConfig,
) -> Vec<AreaSnapshot<'a>> {
    life_areas(tasks)
        .into_iter()
        .map(|area| {
            let children: Vec<&Task> = tasks.iter().filter(|t| t.parent_id == area.id).collect();

            let mut counts = StatusCounts::default();
            for child in &children {
                counts.bump(child.status);
            }

            let soon = |t: &Task| is_due_soon(t, config.due_soon_days, now);
            let mut candidates: Vec<&Task> = children
                .iter()
                .copied()
                .filter(|t| t.status == TaskStatus::InProgress || soon(*t))
                .collect();
            candidates.sort_by_key(|t| {
                (
                    t.status != TaskStatus::InProgress,
                    t.due_date.unwrap_or(DateTime::<Utc>::MAX_UTC),
                )
            });

            AreaSnapshot {
                area,
                theme: theme_name(&area.id),
                counts,
                total: children.len(),
                due_soon: children.iter().any(|t| soon(*t)),
                highlights: candidates
                    .into_iter()
                    .take(config.highlights)
                    .map(|t| t.title.clone())
                    .collect(),
            }
        })
        .collect()
}

/// Area with the most active work; ties go to the earlier area.
pub fn primary_area<'s, 'a>(snapshots: &'s [AreaSnapshot<'a>]) -> Option<&'s AreaSnapshot<'a>> {
    let mut best: Option<&AreaSnapshot> = None;
    for snapshot in snapshots {
        match best {
            Some(current) if snapshot.activity_score() <= current.activity_score() => {}
            _ => best = Some(snapshot),
        }
    }
    best
}

fn local_day<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// Open tasks due or scheduled today, earliest of today's times first.
pub fn today_agenda<'a, Tz: TimeZone>(
    tasks: &'a [Task],
    tz: &Tz,
    now: DateTime<Utc>,
) -> TodayAgenda<'a> {
    let today = local_day(now, tz);
    let today_time = |at: Option<DateTime<Utc>>| at.filter(|d| local_day(*d, tz) == today);

    let mut relevant: Vec<(&Task, DateTime<Utc>)> = tasks
        .iter()
        .filter(|t| !t.is_completed())
        .filter_map(|t| {
            let due = today_time(t.due_date);
            let scheduled = today_time(t.scheduled_date);
            let earliest = match (due, scheduled) {
                (Some(d), Some(s)) => Some(d.min(s)),
                (d, s) => d.or(s),
            };
            earliest.map(|at| (t, at))
        })
        .collect();
    relevant.sort_by_key(|(_, at)| *at);

    let (calendar_items, tasks): (Vec<&Task>, Vec<&Task>) = relevant
        .into_iter()
        .map(|(t, _)| t)
        .partition(|t| t.calendar_only);
    TodayAgenda {
        tasks,
        calendar_items,
    }
}

/// Open board tasks due from tomorrow through `days` days after, soonest first.
pub fn upcoming_tasks<'a, Tz: TimeZone>(
    tasks: &'a [Task],
    tz: &Tz,
    now: DateTime<Utc>,
    days: u32,
) -> Vec<&'a Task> {
    let today = local_day(now, tz);
    let after = |n: u32| {
        today
            .checked_add_days(Days::new(u64::from(n)))
            .unwrap_or(NaiveDate::MAX)
    };
    let first = after(1);
    let last = after(days);

    let mut upcoming: Vec<&Task> = tasks
        .iter()
        .filter(|t| !t.is_completed() && !t.calendar_only)
        .filter(|t| match t.due_date {
            Some(due) => {
                let day = local_day(due, tz);
                day >= first && day <= last
            }
            None => false,
        })
        .collect();
    upcoming.sort_by_key(|t| t.due_date);
    upcoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;

    fn at(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
    }

    fn task(id: &str, parent: &str, status: TaskStatus, order: i64) -> Task {
        let mut task = Task::from_new(
            NewTask::new(parent, id.to_uppercase()).with_status(status),
            id.to_string(),
            at("2024-03-01T00:00:00Z"),
        );
        task.order = order;
        task
    }

    #[test]
    fn life_areas_sorted_and_skip_calendar_items() {
        let mut marker = task("m", ROOT_TASK_ID, TaskStatus::NotStarted, 0);
        marker.calendar_only = true;
        let tasks = vec![
            task("health", ROOT_TASK_ID, TaskStatus::NotStarted, 1),
            task("career", ROOT_TASK_ID, TaskStatus::NotStarted, 0),
            task("c1", "career", TaskStatus::NotStarted, 0),
            marker,
        ];
        let ids: Vec<&str> = life_areas(&tasks).iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["career", "health"]);
    }

    #[test]
    fn snapshot_counts_and_highlights() {
        let now = at("2024-03-10T12:00:00Z");
        let mut soon = task("soon", "career", TaskStatus::NotStarted, 0);
        soon.due_date = Some(now + Duration::days(2));
        let mut later = task("later", "career", TaskStatus::NotStarted, 1);
        later.due_date = Some(now + Duration::days(10));
        let mut done = task("done", "career", TaskStatus::Completed, 0);
        done.due_date = Some(now);
        let tasks = vec![
            task("career", ROOT_TASK_ID, TaskStatus::NotStarted, 0),
            task("health", ROOT_TASK_ID, TaskStatus::NotStarted, 1),
            task("active", "career", TaskStatus::InProgress, 0),
            task("held", "health", TaskStatus::OnHold, 0),
            task("grandchild", "active", TaskStatus::InProgress, 0),
            soon,
            later,
            done,
        ];

        let snapshots = area_snapshots(&tasks, now, &DashboardConfig::default());
        let career = &snapshots[0];
        assert_eq!(career.total, 4);
        assert_eq!(career.counts.get(TaskStatus::NotStarted), 2);
        assert_eq!(career.counts.in_progress, 1);
        assert_eq!(career.counts.completed, 1);
        assert!(career.due_soon);
        assert_eq!(career.highlights, vec!["ACTIVE", "SOON"]);

        let health = &snapshots[1];
        assert!(!health.due_soon);
        assert!(health.highlights.is_empty());

        // 1 active in career vs 1 held in health: tie goes to career.
        assert_eq!(primary_area(&snapshots).unwrap().area.id, "career");
        assert!(primary_area(&[]).is_none());
    }

    #[test]
    fn today_agenda_splits_calendar_items() {
        let now = at("2024-03-10T12:00:00Z");
        let mut a = task("a", "career", TaskStatus::NotStarted, 0);
        a.due_date = Some(at("2024-03-10T18:00:00Z"));
        let mut b = task("b", "career", TaskStatus::InProgress, 0);
        b.scheduled_date = Some(at("2024-03-10T09:00:00Z"));
        b.due_date = Some(at("2024-03-20T09:00:00Z"));
        let mut c = task("c", ROOT_TASK_ID, TaskStatus::NotStarted, 0);
        c.calendar_only = true;
        c.scheduled_date = Some(at("2024-03-10T12:00:00Z"));
        let mut done = task("done", "career", TaskStatus::Completed, 0);
        done.due_date = Some(now);
        let mut tomorrow = task("tomorrow", "career", TaskStatus::NotStarted, 0);
        tomorrow.due_date = Some(at("2024-03-11T09:00:00Z"));
        let tasks = vec![a, b, c, done, tomorrow];

        let agenda = today_agenda(&tasks, &Utc, now);
        let ids: Vec<&str> = agenda.tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(agenda.calendar_items.len(), 1);
        assert_eq!(agenda.calendar_items[0].id, "c");
    }

    #[test]
    fn upcoming_window_starts_tomorrow() {
        let now = at("2024-03-10T12:00:00Z");
        let mk = |id: &str, due: &str| {
            let mut t = task(id, "career", TaskStatus::NotStarted, 0);
            t.due_date = Some(at(due));
            t
        };
        let tasks = vec![
            mk("today", "2024-03-10T20:00:00Z"),
            mk("week", "2024-03-17T08:00:00Z"),
            mk("tomorrow", "2024-03-11T08:00:00Z"),
            mk("too-far", "2024-03-18T08:00:00Z"),
        ];
        let ids: Vec<&str> = upcoming_tasks(&tasks, &Utc, now, 7)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["tomorrow", "week"]);
    }

    #[test]
    fn upcoming_window_saturates_at_the_calendar_end() {
        let now = at("2024-03-10T12:00:00Z");
        let mut far = task("far", "career", TaskStatus::NotStarted, 0);
        far.due_date = Some(at("9999-01-01T12:00:00Z"));
        let tasks = vec![far];
        let ids: Vec<&str> = upcoming_tasks(&tasks, &Utc, now, u32::MAX)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["far"]);
    }
}
