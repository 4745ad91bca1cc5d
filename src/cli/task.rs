//! lb task command implementations: add, edit, mv, reorder, rm, show.

use chrono::{Local, Utc};
use serde::Serialize;

use crate::cli::{format_day, parse_opt, parse_when, task_line, Context};
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput};
use crate::task::{NewTask, Task, TaskPatch, TaskPriority, TaskStatus};
use crate::tree;

pub struct AddOptions {
    pub title: String,
    pub parent: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub description: Option<String>,
    pub due: Option<String>,
    pub scheduled: Option<String>,
    pub tags: Vec<String>,
    pub calendar: bool,
}

pub struct EditOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub due: Option<String>,
    pub no_due: bool,
    pub scheduled: Option<String>,
    pub no_scheduled: bool,
    pub tags: Vec<String>,
}

pub struct MoveOptions {
    pub id: String,
    pub status: Option<String>,
    pub order: Option<i64>,
    pub parent: Option<String>,
}

#[derive(Serialize)]
struct TaskReport<'a> {
    task: &'a Task,
    breadcrumb: String,
}

#[derive(Serialize)]
struct DeleteReport {
    deleted: Vec<String>,
}

#[derive(Serialize)]
struct ReorderReport {
    status: TaskStatus,
    ids: Vec<String>,
    updated: usize,
}

#[derive(Serialize)]
struct ShowReport<'a> {
    task: &'a Task,
    breadcrumb: String,
    path: Vec<&'a str>,
    children: Vec<&'a Task>,
}

pub fn run_add(ctx: &Context, options: AddOptions) -> Result<()> {
    let mut engine = ctx.open_engine()?;
    let scheduled = options.scheduled.as_deref().map(parse_when).transpose()?;

    let task = if options.calendar {
        let at = match scheduled {
            Some(at) => at,
            None => parse_when(&Local::now().format("%Y-%m-%d").to_string())?,
        };
        engine.add_calendar_item(&options.title, at)?
    } else {
        let mut input = NewTask::new(options.parent, options.title.trim())
            .with_tags(options.tags);
        if let Some(status) = parse_opt::<TaskStatus>(options.status.as_deref())? {
            input = input.with_status(status);
        }
        if let Some(priority) = parse_opt::<TaskPriority>(options.priority.as_deref())? {
            input = input.with_priority(priority);
        }
        if let Some(description) = options.description {
            input = input.with_description(description);
        }
        if let Some(due) = options.due.as_deref() {
            input = input.with_due_date(parse_when(due)?);
        }
        if let Some(at) = scheduled {
            input = input.with_scheduled_date(at);
        }
        engine.create_task(input)?
    };

    let breadcrumb = engine.breadcrumb(&task.id);
    let mut human = HumanOutput::new(format!("lb add: {}", task.title));
    human.push_summary("id", task.id.clone());
    human.push_summary("path", breadcrumb.clone());
    human.push_summary("status", task.status.label());
    human.push_next_step(format!("lb show {}", task.id));

    emit_success(
        ctx.output(),
        "add",
        &TaskReport {
            task: &task,
            breadcrumb,
        },
        Some(&human),
    )
}

pub fn run_edit(ctx: &Context, options: EditOptions) -> Result<()> {
    let mut engine = ctx.open_engine()?;

    let mut patch = TaskPatch {
        title: options.title.map(|t| t.trim().to_string()),
        description: options.description.map(|d| {
            let trimmed = d.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }),
        status: parse_opt(options.status.as_deref())?,
        priority: parse_opt::<TaskPriority>(options.priority.as_deref())?.map(Some),
        ..TaskPatch::default()
    };
    if options.no_due {
        patch.due_date = Some(None);
    } else if let Some(due) = options.due.as_deref() {
        patch.due_date = Some(Some(parse_when(due)?));
    }
    if options.no_scheduled {
        patch.scheduled_date = Some(None);
    } else if let Some(scheduled) = options.scheduled.as_deref() {
        patch.scheduled_date = Some(Some(parse_when(scheduled)?));
    }
    if !options.tags.is_empty() {
        patch.tags = Some(options.tags);
    }

    let mut human;
    let task = if patch.is_empty() {
        human = HumanOutput::new(format!("lb edit {}: nothing to change", options.id));
        engine
            .task(&options.id)
            .cloned()
            .ok_or_else(|| Error::TaskNotFound(options.id.clone()))?
    } else {
        let task = engine.update_task(&options.id, patch)?;
        human = HumanOutput::new(format!("lb edit: {}", task.title));
        task
    };

    let breadcrumb = engine.breadcrumb(&task.id);
    human.push_summary("id", task.id.clone());
    human.push_summary("status", task.status.label());
    human.push_summary("task", task_line(&task, Utc::now()));

    emit_success(
        ctx.output(),
        "edit",
        &TaskReport {
            task: &task,
            breadcrumb,
        },
        Some(&human),
    )
}

pub fn run_mv(ctx: &Context, options: MoveOptions) -> Result<()> {
    let mut engine = ctx.open_engine()?;
    let status = parse_opt::<TaskStatus>(options.status.as_deref())?;

    let task = match (options.parent.as_deref(), status, options.order) {
        (Some(parent), None, None) => engine.reparent_task(&options.id, parent)?,
        (parent, status, order) => {
            let current = engine
                .task(&options.id)
                .cloned()
                .ok_or_else(|| Error::TaskNotFound(options.id.clone()))?;
            let status = status.unwrap_or(current.status);
            let target_parent = parent.unwrap_or(current.parent_id.as_str());
            let order = match order {
                Some(order) => order,
                None if status == current.status && target_parent == current.parent_id => {
                    current.order
                }
                None => tree::next_order(engine.tasks(), target_parent, status),
            };
            engine.move_task(&options.id, status, order, parent)?
        }
    };

    let breadcrumb = engine.breadcrumb(&task.id);
    let mut human = HumanOutput::new(format!("lb mv: {}", task.title));
    human.push_summary("path", breadcrumb.clone());
    human.push_summary("status", task.status.label());
    human.push_summary("order", task.order.to_string());

    emit_success(
        ctx.output(),
        "mv",
        &TaskReport {
            task: &task,
            breadcrumb,
        },
        Some(&human),
    )
}

pub fn run_reorder(ctx: &Context, ids: Vec<String>, status: String) -> Result<()> {
    let mut engine = ctx.open_engine()?;
    let status: TaskStatus = status.parse()?;
    let updated = engine.reorder_tasks(&ids, status)?;

    let mut human = HumanOutput::new(format!("lb reorder: {}", status.label()));
    for (index, id) in ids.iter().enumerate() {
        let title = engine.task(id).map(|t| t.title.as_str()).unwrap_or("");
        human.push_line("Order", format!("{index}. {id}  {title}"));
    }

    emit_success(
        ctx.output(),
        "reorder",
        &ReorderReport {
            status,
            updated: updated.len(),
            ids,
        },
        Some(&human),
    )
}

pub fn run_rm(ctx: &Context, id: String) -> Result<()> {
    let mut engine = ctx.open_engine()?;
    let title = engine.task(&id).map(|t| t.title.clone()).unwrap_or_default();
    let deleted = engine.delete_task(&id)?;

    let mut human = HumanOutput::new(format!("lb rm: {title}"));
    human.push_summary("deleted", deleted.len().to_string());
    if deleted.len() > 1 {
        human.push_warning(format!(
            "{} descendant task{} removed as well",
            deleted.len() - 1,
            if deleted.len() == 2 { "" } else { "s" }
        ));
    }

    emit_success(ctx.output(), "rm", &DeleteReport { deleted }, Some(&human))
}

pub fn run_show(ctx: &Context, id: String) -> Result<()> {
    let engine = ctx.open_engine()?;
    let task = engine
        .task(&id)
        .ok_or_else(|| Error::TaskNotFound(id.clone()))?;
    let now = Utc::now();

    let path = engine.task_path(&id);
    let children = engine.children_of(&id);
    let report = ShowReport {
        task,
        breadcrumb: engine.breadcrumb(&id),
        path: path.iter().map(|t| t.id.as_str()).collect(),
        children: children.clone(),
    };

    let mut human = HumanOutput::new(report.breadcrumb.clone());
    human.push_summary("id", task.id.clone());
    human.push_summary("title", task.title.clone());
    human.push_summary("status", task.status.label());
    if let Some(priority) = task.priority {
        human.push_summary("priority", priority.as_str().to_lowercase());
    }
    if let Some(description) = &task.description {
        human.push_summary("description", description.clone());
    }
    if let Some(due) = task.due_date {
        let urgency = tree::due_urgency(due, now);
        human.push_summary("due", format!("{} ({})", format_day(due), urgency.as_str()));
    }
    if let Some(scheduled) = task.scheduled_date {
        human.push_summary("scheduled", format_day(scheduled));
    }
    if !task.tags.is_empty() {
        human.push_summary("tags", task.tags.join(", "));
    }
    if let Some(ago) = tree::completed_ago_text(task, now) {
        human.push_summary("completed", ago);
    }
    human.push_section("Children");
    for child in &children {
        human.push_line("Children", format!("{} {}", child.status.label(), task_line(child, now)));
    }

    emit_success(ctx.output(), "show", &report, Some(&human))
}
