//! lb board command implementations: ls, search, archive.

use chrono::Utc;
use serde::Serialize;

use crate::cli::{task_line, Context};
use crate::error::Result;
use crate::output::{emit_success, HumanOutput};
use crate::task::{Task, ROOT_TASK_ID};
use crate::views::{self, AreaSnapshot, Board, Swimlane};

#[derive(Serialize)]
struct DashboardReport<'a> {
    areas: &'a [AreaSnapshot<'a>],
    primary: Option<&'a str>,
}

#[derive(Serialize)]
struct SwimlaneReport<'a> {
    parent_id: &'a str,
    lanes: Vec<Swimlane<'a>>,
}

#[derive(Serialize)]
struct Match<'a> {
    task: &'a Task,
    breadcrumb: String,
}

#[derive(Serialize)]
struct SearchReport<'a> {
    query: &'a str,
    results: Vec<Match<'a>>,
}

#[derive(Serialize)]
struct ArchiveReport<'a> {
    hide_days: u32,
    tasks: Vec<Match<'a>>,
}

pub fn run_ls(ctx: &Context, parent: Option<String>, swimlanes: bool) -> Result<()> {
    let mut engine = ctx.open_engine()?;
    let parent = parent.unwrap_or_else(|| ROOT_TASK_ID.to_string());
    engine.navigate_to(&parent)?;
    let now = Utc::now();

    if swimlanes {
        let lanes = views::swimlanes(engine.tasks(), &parent);
        let mut human = HumanOutput::new(format!("Swimlanes: {}", engine.breadcrumb(&parent)));
        for lane in &lanes {
            let section = format!("{} ({})", lane.group.title, lane.theme);
            human.push_section(&section);
            for column in lane.columns.iter().filter(|c| !c.tasks.is_empty()) {
                for task in &column.tasks {
                    human.push_line(&section, format!("{}: {}", column.label, task_line(task, now)));
                }
            }
        }
        return emit_success(
            ctx.output(),
            "ls",
            &SwimlaneReport {
                parent_id: &parent,
                lanes,
            },
            Some(&human),
        );
    }

    if parent == ROOT_TASK_ID {
        let snapshots = views::area_snapshots(engine.tasks(), now, &engine.config().dashboard);
        let primary = views::primary_area(&snapshots);

        let mut human = HumanOutput::new("Life areas");
        if let Some(primary) = primary {
            human.push_summary("focus", primary.area.title.clone());
        }
        for snapshot in &snapshots {
            let counts = snapshot.counts;
            let mut line = format!(
                "{}  {}  {} in progress, {} on hold, {} not started, {} done",
                snapshot.area.id,
                snapshot.area.title,
                counts.in_progress,
                counts.on_hold,
                counts.not_started,
                counts.completed
            );
            if snapshot.due_soon {
                line.push_str(" (due soon)");
            }
            human.push_line("Areas", line);
            for highlight in &snapshot.highlights {
                human.push_line("Areas", format!("    - {highlight}"));
            }
        }
        human.push_next_step("lb ls <area-id>");

        return emit_success(
            ctx.output(),
            "ls",
            &DashboardReport {
                areas: &snapshots,
                primary: primary.map(|s| s.area.id.as_str()),
            },
            Some(&human),
        );
    }

    let board: Board<'_> = engine.board();
    let mut human = HumanOutput::new(format!("Board: {}", engine.breadcrumb(&parent)));
    human.push_summary("tasks", board.len().to_string());
    for column in &board.columns {
        human.push_section(column.label);
        for task in &column.tasks {
            human.push_line(column.label, task_line(task, now));
        }
    }

    emit_success(ctx.output(), "ls", &board, Some(&human))
}

pub fn run_search(ctx: &Context, query: String) -> Result<()> {
    let engine = ctx.open_engine()?;
    let now = Utc::now();
    let results: Vec<Match<'_>> = engine
        .search_tasks(&query)
        .into_iter()
        .map(|task| Match {
            breadcrumb: engine.breadcrumb(&task.id),
            task,
        })
        .collect();

    let mut human = HumanOutput::new(format!("Search: {}", query.trim()));
    human.push_summary("matches", results.len().to_string());
    for found in &results {
        human.push_line("Results", task_line(found.task, now));
        human.push_line("Results", format!("    {}", found.breadcrumb));
    }

    emit_success(
        ctx.output(),
        "search",
        &SearchReport {
            query: &query,
            results,
        },
        Some(&human),
    )
}

pub fn run_archive(ctx: &Context) -> Result<()> {
    let engine = ctx.open_engine()?;
    let now = Utc::now();
    let hide_days = engine.config().archive.hide_days;
    let tasks: Vec<Match<'_>> = engine
        .archived_tasks()
        .into_iter()
        .map(|task| Match {
            breadcrumb: engine.breadcrumb(&task.id),
            task,
        })
        .collect();

    let mut human = HumanOutput::new("Archive");
    human.push_summary("older than", format!("{hide_days} days"));
    human.push_section("Completed");
    for archived in &tasks {
        human.push_line("Completed", task_line(archived.task, now));
    }

    emit_success(
        ctx.output(),
        "archive",
        &ArchiveReport { hide_days, tasks },
        Some(&human),
    )
}
