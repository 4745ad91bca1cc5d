//! lb export / import command implementations.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::cli::Context;
use crate::error::Result;
use crate::lock::write_atomic;
use crate::output::{emit_success, HumanOutput};
use crate::storage::TaskFile;
use crate::task::Task;

/// Accepted import documents: a bare task array or a `tasks.json` snapshot.
#[derive(Deserialize)]
#[serde(untagged)]
enum ImportDocument {
    Tasks(Vec<Task>),
    Snapshot(TaskFile),
}

impl ImportDocument {
    fn into_tasks(self) -> Vec<Task> {
        match self {
            ImportDocument::Tasks(tasks) => tasks,
            ImportDocument::Snapshot(file) => file.tasks,
        }
    }
}

#[derive(Serialize)]
struct ExportReport {
    path: PathBuf,
    count: usize,
}

#[derive(Serialize)]
struct ImportReport {
    path: PathBuf,
    count: usize,
}

pub fn run_export(ctx: &Context, output: Option<PathBuf>) -> Result<()> {
    let engine = ctx.open_engine()?;
    let tasks = engine.export_tasks()?;

    let Some(path) = output else {
        if ctx.output().json {
            return emit_success(ctx.output(), "export", &tasks, None);
        }
        println!("{}", serde_json::to_string_pretty(&tasks)?);
        return Ok(());
    };

    let mut content = serde_json::to_vec_pretty(&tasks)?;
    content.push(b'\n');
    write_atomic(&path, &content)?;

    let mut human = HumanOutput::new(format!("lb export: {} tasks", tasks.len()));
    human.push_summary("path", path.display().to_string());
    emit_success(
        ctx.output(),
        "export",
        &ExportReport {
            path,
            count: tasks.len(),
        },
        Some(&human),
    )
}

pub fn run_import(ctx: &Context, path: PathBuf) -> Result<()> {
    let content = std::fs::read_to_string(&path)?;
    let tasks = serde_json::from_str::<ImportDocument>(&content)?.into_tasks();

    let mut engine = ctx.open_engine()?;
    let count = tasks.len();
    engine.import_tasks(tasks)?;

    let mut human = HumanOutput::new(format!("lb import: {count} tasks"));
    human.push_summary("path", path.display().to_string());
    human.push_warning("previous tasks were replaced");
    human.push_next_step("lb ls");

    emit_success(
        ctx.output(),
        "import",
        &ImportReport { path, count },
        Some(&human),
    )
}
