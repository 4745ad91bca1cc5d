//! Engine change notifications and their JSONL output.
//!
//! The engine hands an [`EngineEvent`] to every subscriber after each committed
//! change. [`EventSink`] writes them as JSON lines to stdout or a file.

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::task::{Task, TaskStatus};

pub const EVENT_SCHEMA_VERSION: &str = "lifeboard.event.v1";

/// A committed state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    Loaded { count: usize, seeded: bool },
    TaskCreated { task: Task },
    TaskUpdated { task: Task },
    TaskMoved { task: Task },
    TasksReordered { ids: Vec<String>, status: TaskStatus },
    TasksDeleted { ids: Vec<String> },
    TasksImported { count: usize },
    Navigated { parent_id: String },
    SelectionChanged { task_id: Option<String> },
    SearchToggled { open: bool },
    ArchiveToggled { open: bool },
}

impl EngineEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            EngineEvent::Loaded { .. } => EventKind::StoreLoaded,
            EngineEvent::TaskCreated { .. } => EventKind::TaskCreated,
            EngineEvent::TaskUpdated { .. } => EventKind::TaskUpdated,
            EngineEvent::TaskMoved { .. } => EventKind::TaskMoved,
            EngineEvent::TasksReordered { .. } => EventKind::TasksReordered,
            EngineEvent::TasksDeleted { .. } => EventKind::TasksDeleted,
            EngineEvent::TasksImported { .. } => EventKind::TasksImported,
            EngineEvent::Navigated { .. } => EventKind::Navigated,
            EngineEvent::SelectionChanged { .. } => EventKind::SelectionChanged,
            EngineEvent::SearchToggled { .. } | EngineEvent::ArchiveToggled { .. } => {
                EventKind::OverlayToggled
            }
        }
    }

    /// True for events that changed the task collection.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            EngineEvent::TaskCreated { .. }
                | EngineEvent::TaskUpdated { .. }
                | EngineEvent::TaskMoved { .. }
                | EngineEvent::TasksReordered { .. }
                | EngineEvent::TasksDeleted { .. }
                | EngineEvent::TasksImported { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub enum EventDestination {
    Stdout,
    File(PathBuf),
}

impl EventDestination {
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        raw.and_then(|value| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return None;
            }
            if trimmed == "-" {
                return Some(EventDestination::Stdout);
            }
            Some(EventDestination::File(PathBuf::from(trimmed)))
        })
    }

    pub fn open(&self) -> Result<EventSink> {
        match self {
            EventDestination::Stdout => Ok(EventSink::stdout()),
            EventDestination::File(path) => EventSink::file(path),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    StoreLoaded,
    TaskCreated,
    TaskUpdated,
    TaskMoved,
    TasksReordered,
    TasksDeleted,
    TasksImported,
    Navigated,
    SelectionChanged,
    OverlayToggled,
}

/// One JSONL record.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub schema_version: &'static str,
    pub event: EventKind,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl Event {
    pub fn new(event: EventKind) -> Self {
        Self {
            schema_version: EVENT_SCHEMA_VERSION,
            event,
            timestamp: Utc::now(),
            data: None,
        }
    }

    /// Attach a serializable payload to the event.
    pub fn with_data<T: Serialize>(mut self, data: T) -> Result<Self> {
        self.data = Some(serde_json::to_value(data)?);
        Ok(self)
    }

    pub fn from_engine(event: &EngineEvent) -> Result<Self> {
        Event::new(event.kind()).with_data(event)
    }
}

/// Event sink that writes JSONL output to a destination.
pub struct EventSink {
    writer: Box<dyn Write + Send>,
}

impl EventSink {
    pub fn stdout() -> Self {
        Self {
            writer: Box::new(std::io::stdout()),
        }
    }

    /// Append to a file, creating it if necessary.
    pub fn file(path: &Path) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            writer: Box::new(file),
        })
    }

    pub fn from_writer(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }

    pub fn emit(&mut self, event: &Event) -> Result<()> {
        let serialized = serde_json::to_vec(event)?;
        self.writer.write_all(&serialized)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().map_err(Error::Io)?;
        Ok(())
    }

    /// Engine subscriber callback. Write failures are logged, not propagated.
    pub fn record(&mut self, event: &EngineEvent) {
        let result = Event::from_engine(event).and_then(|event| self.emit(&event));
        if let Err(err) = result {
            tracing::warn!(error = %err, "failed to write event");
        }
    }
}
