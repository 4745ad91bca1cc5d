//! Calendar projection.
//!
//! Each open task with a due and/or scheduled date becomes one or two entries on
//! local calendar days. Start and end times only spread same-day entries across
//! the display window so they do not overlap; they are never written back.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Serialize;

use crate::config::CalendarConfig;
use crate::task::Task;

/// Which of a task's dates an entry stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Scheduled,
    Due,
    /// Due and scheduled on the same day.
    Both,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Scheduled => "scheduled",
            EntryKind::Due => "due",
            EntryKind::Both => "both",
        }
    }

    pub fn is_scheduled(self) -> bool {
        matches!(self, EntryKind::Scheduled | EntryKind::Both)
    }

    pub fn is_due(self) -> bool {
        matches!(self, EntryKind::Due | EntryKind::Both)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarEntry {
    /// `{task_id}-{kind}-{YYYY-MM-DD}`
    pub id: String,
    pub task_id: String,
    pub title: String,
    pub day: NaiveDate,
    pub kind: EntryKind,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

fn local_day<Tz: TimeZone>(at: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// Noon on `day` in `tz`, the instant used when a date is picked without a time.
pub fn local_noon<Tz: TimeZone>(day: NaiveDate, tz: &Tz) -> Option<DateTime<Utc>> {
    let noon = day.and_time(NaiveTime::from_hms_opt(12, 0, 0)?);
    tz.from_local_datetime(&noon)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
}

pub fn calendar_entries<Tz: TimeZone>(
    tasks: &[Task],
    tz: &Tz,
    config: &CalendarConfig,
) -> Vec<CalendarEntry> {
    let mut by_day: BTreeMap<NaiveDate, Vec<(&Task, EntryKind)>> = BTreeMap::new();

    for task in tasks.iter().filter(|t| !t.is_completed()) {
        let scheduled = task.scheduled_date.map(|at| local_day(at, tz));
        let due = task.due_date.map(|at| local_day(at, tz));

        match (scheduled, due) {
            (Some(s), Some(d)) if s == d => {
                by_day.entry(s).or_default().push((task, EntryKind::Both));
            }
            _ => {
                if let Some(day) = scheduled {
                    by_day.entry(day).or_default().push((task, EntryKind::Scheduled));
                }
                if let Some(day) = due {
                    by_day.entry(day).or_default().push((task, EntryKind::Due));
                }
            }
        }
    }

    let window = f64::from(config.window_minutes());
    let mut entries = Vec::new();
    for (day, day_entries) in by_day {
        let step = window / (day_entries.len() as f64 + 1.0);
        let window_start = day.and_time(
            NaiveTime::from_hms_opt(config.start_hour.min(23), 0, 0).unwrap_or_default(),
        );

        for (index, (task, kind)) in day_entries.into_iter().enumerate() {
            let offset = (step * (index as f64 + 1.0)).round() as i64;
            let start = window_start + Duration::minutes(offset);
            let end = start + Duration::minutes(i64::from(config.event_minutes));
            entries.push(CalendarEntry {
                id: format!("{}-{}-{}", task.id, kind.as_str(), day.format("%Y-%m-%d")),
                task_id: task.id.clone(),
                title: task.title.clone(),
                day,
                kind,
                start,
                end,
            });
        }
    }
    entries
}

/// Open tasks scheduled on each local day, for month cells.
pub fn scheduled_count_by_day<Tz: TimeZone>(tasks: &[Task], tz: &Tz) -> BTreeMap<NaiveDate, usize> {
    let mut counts = BTreeMap::new();
    for task in tasks.iter().filter(|t| !t.is_completed()) {
        if let Some(at) = task.scheduled_date {
            *counts.entry(local_day(at, tz)).or_insert(0) += 1;
        }
    }
    counts
}
