#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use chrono::{DateTime, Utc};
use lifeboard::error::{Error, Result};
use lifeboard::store::{MemoryStore, TaskStore};
use lifeboard::task::{NewTask, Task, TaskPatch, TaskStatus};
use serde_json::Value;
use tempfile::TempDir;

/// Temporary data directory for the `lb` binary.
pub struct TestData {
    dir: TempDir,
}

impl TestData {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn lb(&self) -> Command {
        let mut cmd = lb_cmd();
        cmd.env("LIFEBOARD_DIR", self.dir.path());
        cmd
    }

    /// Run `lb --json <args>` and return the `data` of the success envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .lb()
            .arg("--json")
            .args(args)
            .output()
            .expect("run lb");
        assert!(
            output.status.success(),
            "lb {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        let envelope: Value = serde_json::from_slice(&output.stdout).expect("json envelope");
        assert_eq!(envelope["status"], "success");
        envelope["data"].clone()
    }
}

pub fn lb_cmd() -> Command {
    let mut cmd = Command::cargo_bin("lb").expect("binary");
    cmd.env_remove("LIFEBOARD_EVENTS");
    cmd.env_remove("RUST_LOG");
    cmd
}

pub fn at(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .expect("rfc3339")
        .with_timezone(&Utc)
}

/// Fixture task with a fixed id and order.
pub fn task(id: &str, parent: &str, status: TaskStatus, order: i64) -> Task {
    let mut task = Task::from_new(
        NewTask::new(parent, format!("Task {id}")).with_status(status),
        id.to_string(),
        at("2024-03-01T09:00:00Z"),
    );
    task.order = order;
    task
}

/// Memory store whose single updates start failing after `budget` successes.
pub struct FlakyStore {
    pub inner: MemoryStore,
    budget: usize,
}

impl FlakyStore {
    pub fn new(tasks: Vec<Task>, budget: usize) -> Self {
        Self {
            inner: MemoryStore::with_tasks(tasks),
            budget,
        }
    }
}

impl TaskStore for FlakyStore {
    fn get_all_tasks(&self) -> Result<Vec<Task>> {
        self.inner.get_all_tasks()
    }

    fn get_task(&self, id: &str) -> Result<Option<Task>> {
        self.inner.get_task(id)
    }

    fn get_children(&self, parent_id: &str) -> Result<Vec<Task>> {
        self.inner.get_children(parent_id)
    }

    fn create_task(&mut self, input: NewTask) -> Result<Task> {
        self.inner.create_task(input)
    }

    fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<Task> {
        if self.budget == 0 {
            return Err(Error::Storage("disk full".to_string()));
        }
        self.budget -= 1;
        self.inner.update_task(id, patch)
    }

    fn delete_task(&mut self, id: &str) -> Result<()> {
        self.inner.delete_task(id)
    }

    fn delete_tasks(&mut self, ids: &[String]) -> Result<()> {
        self.inner.delete_tasks(ids)
    }

    fn import_tasks(&mut self, tasks: Vec<Task>) -> Result<()> {
        self.inner.import_tasks(tasks)
    }

    fn export_tasks(&self) -> Result<Vec<Task>> {
        self.inner.export_tasks()
    }

    fn is_initialized(&self) -> Result<bool> {
        self.inner.is_initialized()
    }

    fn set_initialized(&mut self) -> Result<()> {
        self.inner.set_initialized()
    }
}
