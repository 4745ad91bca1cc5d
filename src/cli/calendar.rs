//! lb calendar command implementations: calendar, schedule, done, today, upcoming.

use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;

use crate::cli::{format_day, parse_day, parse_when, task_line, Context};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::task::Task;
use crate::views::{self, CalendarEntry, EntryKind, TodayAgenda};

#[derive(Serialize)]
struct CalendarReport {
    entries: Vec<CalendarEntry>,
    scheduled_per_day: Vec<(NaiveDate, usize)>,
}

#[derive(Serialize)]
struct ScheduleReport<'a> {
    task: &'a Task,
    kind: EntryKind,
}

#[derive(Serialize)]
struct DoneReport {
    task_id: String,
    deleted: bool,
    task: Option<Task>,
}

#[derive(Serialize)]
struct UpcomingReport<'a> {
    days: u32,
    tasks: Vec<&'a Task>,
}

pub fn run_calendar(ctx: &Context, from: Option<String>, to: Option<String>) -> Result<()> {
    let engine = ctx.open_engine()?;
    let from = from.as_deref().map(parse_day).transpose()?;
    let to = to.as_deref().map(parse_day).transpose()?;
    let in_range = |day: &NaiveDate| {
        from.map(|f| *day >= f).unwrap_or(true) && to.map(|t| *day <= t).unwrap_or(true)
    };

    let entries: Vec<CalendarEntry> =
        views::calendar_entries(engine.tasks(), &Local, &engine.config().calendar)
            .into_iter()
            .filter(|entry| in_range(&entry.day))
            .collect();
    let scheduled_per_day: Vec<(NaiveDate, usize)> =
        views::scheduled_count_by_day(engine.tasks(), &Local)
            .into_iter()
            .filter(|(day, _)| in_range(day))
            .collect();

    let mut human = HumanOutput::new("Calendar");
    human.push_summary("entries", entries.len().to_string());
    for entry in &entries {
        human.push_line(
            &entry.day.format("%Y-%m-%d %a").to_string(),
            format!(
                "{}-{}  {}  ({}, {})",
                entry.start.format("%H:%M"),
                entry.end.format("%H:%M"),
                entry.title,
                entry.kind.as_str(),
                entry.task_id
            ),
        );
    }

    emit_success(
        ctx.output(),
        "calendar",
        &CalendarReport {
            entries,
            scheduled_per_day,
        },
        Some(&human),
    )
}

pub fn run_schedule(ctx: &Context, id: String, date: String, due: bool) -> Result<()> {
    let mut engine = ctx.open_engine()?;
    let at = parse_when(&date)?;

    let (task, kind) = if due {
        (engine.reschedule(&id, EntryKind::Due, at)?, EntryKind::Due)
    } else {
        (engine.schedule_task(&id, at)?, EntryKind::Scheduled)
    };

    let mut human = HumanOutput::new(format!("lb schedule: {}", task.title));
    human.push_summary(kind.as_str(), format_day(at));
    human.push_next_step("lb calendar");

    emit_success(
        ctx.output(),
        "schedule",
        &ScheduleReport { task: &task, kind },
        Some(&human),
    )
}

pub fn run_done(ctx: &Context, id: String) -> Result<()> {
    let mut engine = ctx.open_engine()?;
    let task = engine.complete_for_today(&id)?;

    let header = match &task {
        Some(task) => format!("lb done: {} cleared from today", task.title),
        None => format!("lb done: calendar item {id} removed"),
    };
    let human = HumanOutput::new(header);

    emit_success(
        ctx.output(),
        "done",
        &DoneReport {
            task_id: id,
            deleted: task.is_none(),
            task,
        },
        Some(&human),
    )
}

pub fn run_today(ctx: &Context) -> Result<()> {
    let engine = ctx.open_engine()?;
    let now = Utc::now();
    let agenda: TodayAgenda<'_> = views::today_agenda(engine.tasks(), &Local, now);

    let mut human = HumanOutput::new(format!("Today, {}", format_day(now)));
    if agenda.is_empty() {
        human.push_summary("nothing due or scheduled today", "");
    }
    human.push_section("Tasks");
    for task in &agenda.tasks {
        human.push_line(
            "Tasks",
            format!("{}  ({})", task_line(task, now), engine.breadcrumb(&task.id)),
        );
    }
    for item in &agenda.calendar_items {
        human.push_line("Calendar", task_line(item, now));
    }
    human.push_next_step("lb done <id>");

    emit_success(ctx.output(), "today", &agenda, Some(&human))
}

pub fn run_upcoming(ctx: &Context, days: Option<u32>) -> Result<()> {
    let engine = ctx.open_engine()?;
    let now = Utc::now();
    let days = days.unwrap_or(engine.config().dashboard.upcoming_days);
    let tasks = views::upcoming_tasks(engine.tasks(), &Local, now, days);

    let mut human = HumanOutput::new(format!("Upcoming: next {days} days"));
    human.push_section("Due");
    for task in &tasks {
        human.push_line(
            "Due",
            format!("{}  ({})", task_line(task, now), engine.breadcrumb(&task.id)),
        );
    }

    emit_success(
        ctx.output(),
        "upcoming",
        &UpcomingReport { days, tasks },
        Some(&human),
    )
}
