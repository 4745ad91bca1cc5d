//! Command-line interface for lb
//!
//! This module defines the CLI structure using clap derive macros.
//! Each group of subcommands is implemented in its own submodule.

use std::path::PathBuf;

use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use crate::config::{self, Config};
use crate::engine::{InitReport, TaskEngine};
use crate::error::{Error, Result};
use crate::events::EventDestination;
use crate::output::OutputOptions;
use crate::storage::FileStore;
use crate::task::{Task, ROOT_TASK_ID};
use crate::tree;
use crate::views::local_noon;

mod board;
mod calendar;
mod init;
mod task;
mod transfer;

/// lb - life areas, kanban boards and a calendar over one task tree
#[derive(Parser, Debug)]
#[command(name = "lb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Data directory (defaults to the platform data dir)
    #[arg(long, global = true, env = "LIFEBOARD_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Write engine events as JSONL to a file, or "-" for stdout
    #[arg(long, global = true, env = "LIFEBOARD_EVENTS")]
    pub events: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, default config and seed tree
    Init,

    /// Add a task
    Add {
        /// Task title
        title: String,

        /// Parent task id (defaults to the top level)
        #[arg(long, default_value = ROOT_TASK_ID)]
        parent: String,

        /// Status: not_started, in_progress, on_hold, completed
        #[arg(long)]
        status: Option<String>,

        /// Priority: low, medium, high
        #[arg(long)]
        priority: Option<String>,

        /// Description text
        #[arg(short, long)]
        description: Option<String>,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,

        /// Scheduled date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        scheduled: Option<String>,

        /// Tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Create a top-level calendar item on the --scheduled date (default today)
        #[arg(long)]
        calendar: bool,
    },

    /// Edit task fields
    Edit {
        /// Task id
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        /// Status: not_started, in_progress, on_hold, completed
        #[arg(long)]
        status: Option<String>,

        /// Priority: low, medium, high
        #[arg(long)]
        priority: Option<String>,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long, conflicts_with = "no_due")]
        due: Option<String>,

        /// Clear the due date
        #[arg(long)]
        no_due: bool,

        /// Scheduled date (YYYY-MM-DD or RFC 3339)
        #[arg(long, conflicts_with = "no_scheduled")]
        scheduled: Option<String>,

        /// Clear the scheduled date
        #[arg(long)]
        no_scheduled: bool,

        /// Replace tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Move a task to another status, position or parent
    Mv {
        /// Task id
        id: String,

        /// Target status
        #[arg(long)]
        status: Option<String>,

        /// Target order within the bucket
        #[arg(long)]
        order: Option<i64>,

        /// New parent task id
        #[arg(long)]
        parent: Option<String>,
    },

    /// Renumber sibling tasks in the given sequence
    Reorder {
        /// Task ids in their new order
        #[arg(required = true)]
        ids: Vec<String>,

        /// Status bucket whose unlisted tasks are renumbered after the listed ones
        #[arg(long, required = true)]
        status: String,
    },

    /// Delete a task and all of its descendants
    Rm {
        /// Task id
        id: String,
    },

    /// Show the board of a parent (the dashboard at the top level)
    Ls {
        /// Parent task id
        parent: Option<String>,

        /// Group each child's own tasks into lanes
        #[arg(long)]
        swimlanes: bool,
    },

    /// Show a task with its breadcrumb and children
    Show {
        /// Task id
        id: String,
    },

    /// Search titles and descriptions
    Search {
        /// Text to look for
        query: String,
    },

    /// List completed tasks past the archive cutoff
    Archive,

    /// List calendar entries
    Calendar {
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Last day to include (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Put a task on the calendar, or move its due date
    Schedule {
        /// Task id
        id: String,

        /// Date (YYYY-MM-DD or RFC 3339)
        date: String,

        /// Move the due date instead of the scheduled date
        #[arg(long)]
        due: bool,
    },

    /// Clear a task from today's agenda
    Done {
        /// Task id
        id: String,
    },

    /// Today's agenda
    Today,

    /// Open tasks due in the coming days
    Upcoming {
        /// Days after today to include
        #[arg(long)]
        days: Option<u32>,
    },

    /// Write every task as JSON
    Export {
        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace every task with the contents of a JSON export
    Import {
        /// Export file
        path: PathBuf,
    },
}

/// Global options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub data_dir: Option<PathBuf>,
    pub events: Option<String>,
    pub json: bool,
    pub quiet: bool,
}

impl Context {
    /// JSON output is suppressed when events go to stdout.
    pub fn output(&self) -> OutputOptions {
        let events_to_stdout = matches!(
            EventDestination::parse(self.events.as_deref()),
            Some(EventDestination::Stdout)
        );
        OutputOptions {
            json: self.json && !events_to_stdout,
            quiet: self.quiet,
        }
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        config::resolve_data_dir(self.data_dir.clone())
    }

    pub fn open_engine(&self) -> Result<TaskEngine<FileStore>> {
        self.open_engine_with_report().map(|(engine, _)| engine)
    }

    /// Open the file store, load configuration, wire the event sink and load tasks.
    pub fn open_engine_with_report(&self) -> Result<(TaskEngine<FileStore>, InitReport)> {
        let data_dir = self.data_dir()?;
        let store = FileStore::open(&data_dir)?;
        let config = Config::load_from_dir(&data_dir);
        let mut engine = TaskEngine::new(store, config);

        if let Some(destination) = EventDestination::parse(self.events.as_deref()) {
            let mut sink = destination.open()?;
            engine.subscribe(move |event| sink.record(event));
        }

        let report = engine.initialize();
        if report.degraded {
            return Err(Error::Storage(format!(
                "cannot load tasks from {}",
                data_dir.display()
            )));
        }
        Ok((engine, report))
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let ctx = Context {
            data_dir: self.data_dir,
            events: self.events,
            json: self.json,
            quiet: self.quiet,
        };

        match self.command {
            Commands::Init => init::run(&ctx),
            Commands::Add {
                title,
                parent,
                status,
                priority,
                description,
                due,
                scheduled,
                tags,
                calendar,
            } => task::run_add(
                &ctx,
                task::AddOptions {
                    title,
                    parent,
                    status,
                    priority,
                    description,
                    due,
                    scheduled,
                    tags,
                    calendar,
                },
            ),
            Commands::Edit {
                id,
                title,
                description,
                status,
                priority,
                due,
                no_due,
                scheduled,
                no_scheduled,
                tags,
            } => task::run_edit(
                &ctx,
                task::EditOptions {
                    id,
                    title,
                    description,
                    status,
                    priority,
                    due,
                    no_due,
                    scheduled,
                    no_scheduled,
                    tags,
                },
            ),
            Commands::Mv {
                id,
                status,
                order,
                parent,
            } => task::run_mv(
                &ctx,
                task::MoveOptions {
                    id,
                    status,
                    order,
                    parent,
                },
            ),
            Commands::Reorder { ids, status } => task::run_reorder(&ctx, ids, status),
            Commands::Rm { id } => task::run_rm(&ctx, id),
            Commands::Show { id } => task::run_show(&ctx, id),
            Commands::Ls { parent, swimlanes } => board::run_ls(&ctx, parent, swimlanes),
            Commands::Search { query } => board::run_search(&ctx, query),
            Commands::Archive => board::run_archive(&ctx),
            Commands::Calendar { from, to } => calendar::run_calendar(&ctx, from, to),
            Commands::Schedule { id, date, due } => calendar::run_schedule(&ctx, id, date, due),
            Commands::Done { id } => calendar::run_done(&ctx, id),
            Commands::Today => calendar::run_today(&ctx),
            Commands::Upcoming { days } => calendar::run_upcoming(&ctx, days),
            Commands::Export { output } => transfer::run_export(&ctx, output),
            Commands::Import { path } => transfer::run_import(&ctx, path),
        }
    }
}

// =============================================================================
// Argument parsing helpers
// =============================================================================

/// Parse a calendar day.
pub(crate) fn parse_day(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        Error::InvalidArgument(format!("invalid date '{raw}': expected YYYY-MM-DD"))
    })
}

/// Parse an RFC 3339 instant, or a bare day taken as local noon.
pub(crate) fn parse_when(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Ok(at.with_timezone(&Utc));
    }
    let day = parse_day(raw)?;
    local_noon(day, &Local)
        .ok_or_else(|| Error::InvalidArgument(format!("date '{raw}' does not exist locally")))
}

pub(crate) fn parse_opt<T>(raw: Option<&str>) -> Result<Option<T>>
where
    T: std::str::FromStr<Err = Error>,
{
    raw.map(str::parse).transpose()
}

// =============================================================================
// Human rendering helpers
// =============================================================================

pub(crate) fn format_day(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

/// One-line task summary: id, title and the dates that matter.
pub(crate) fn task_line(task: &Task, now: DateTime<Utc>) -> String {
    let mut line = format!("{}  {}", task.id, task.title);
    if let Some(priority) = task.priority {
        line.push_str(&format!(" [{}]", priority.as_str().to_lowercase()));
    }
    if let Some(due) = task.due_date {
        line.push_str(&format!(" due {}", format_day(due)));
        if tree::is_overdue(task, now) {
            line.push_str(" (overdue)");
        }
    }
    if let Some(scheduled) = task.scheduled_date {
        line.push_str(&format!(" scheduled {}", format_day(scheduled)));
    }
    if let Some(ago) = tree::completed_ago_text(task, now) {
        line.push_str(&format!(" - {ago}"));
    }
    line
}
