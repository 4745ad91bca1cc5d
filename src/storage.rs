//! File-backed task store.
//!
//! # Directory Structure
//!
//! ```text
//! <data dir>/
//!   tasks.json         # { schema_version, initialized, tasks: [...] }
//!   tasks.json.lock    # advisory lock held during every operation
//!   lifeboard.toml     # optional configuration
//! ```
//!
//! Each operation locks, reads the whole document, applies its change, and
//! rewrites the document atomically. Batch updates and deletes are a single write,
//! so they either land completely or not at all.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::store::{new_task_id, TaskStore};
use crate::task::{NewTask, Task, TaskPatch};

/// Name of the task document inside the data directory
pub const TASKS_FILE: &str = "tasks.json";

/// Current on-disk schema version
pub const SCHEMA_VERSION: u32 = 1;

/// On-disk document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskFile {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub initialized: bool,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for TaskFile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            initialized: false,
            tasks: Vec::new(),
        }
    }
}

impl TaskFile {
    fn validate(&self) -> Result<()> {
        if self.schema_version > SCHEMA_VERSION {
            return Err(Error::Storage(format!(
                "unsupported schema_version {} (expected <= {})",
                self.schema_version, SCHEMA_VERSION
            )));
        }
        Ok(())
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }
}

/// Durable store rooted at a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) the data directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tasks_file(&self) -> PathBuf {
        self.root.join(TASKS_FILE)
    }

    // =========================================================================
    // Locked document access
    // =========================================================================

    fn read_file(&self, path: &Path) -> Result<TaskFile> {
        if !path.exists() {
            return Ok(TaskFile::default());
        }
        let content = fs::read_to_string(path)?;
        let file: TaskFile = serde_json::from_str(&content)?;
        file.validate()?;
        Ok(file)
    }

    /// Read the document under the lock.
    pub fn load(&self) -> Result<TaskFile> {
        let path = self.tasks_file();
        let _lock = FileLock::acquire(lock::lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;
        self.read_file(&path)
    }

    /// Lock, read, mutate, write. Nothing is written when `f` fails.
    fn update_file<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut TaskFile) -> Result<T>,
    {
        let path = self.tasks_file();
        let _lock = FileLock::acquire(lock::lock_path_for(&path), DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut file = self.read_file(&path)?;
        let result = f(&mut file)?;
        file.schema_version = SCHEMA_VERSION;

        let json = serde_json::to_string_pretty(&file)?;
        lock::write_atomic(&path, json.as_bytes())?;
        Ok(result)
    }
}

impl TaskStore for FileStore {
    fn get_all_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.load()?.tasks)
    }

    fn get_task(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.load()?.tasks.into_iter().find(|t| t.id == id))
    }

    fn get_children(&self, parent_id: &str) -> Result<Vec<Task>> {
        let mut children: Vec<Task> = self
            .load()?
            .tasks
            .into_iter()
            .filter(|t| t.parent_id == parent_id)
            .collect();
        children.sort_by_key(|t| t.order);
        Ok(children)
    }

    fn create_task(&mut self, input: NewTask) -> Result<Task> {
        let task = Task::from_new(input, new_task_id(), Utc::now());
        self.update_file(|file| {
            file.tasks.push(task.clone());
            Ok(())
        })?;
        Ok(task)
    }

    fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<Task> {
        let now = Utc::now();
        self.update_file(|file| {
            let task = file.find_mut(id)?;
            task.apply_patch(patch, now);
            Ok(task.clone())
        })
    }

    fn delete_task(&mut self, id: &str) -> Result<()> {
        self.update_file(|file| {
            let before = file.tasks.len();
            file.tasks.retain(|t| t.id != id);
            if file.tasks.len() == before {
                return Err(Error::TaskNotFound(id.to_string()));
            }
            Ok(())
        })
    }

    fn delete_tasks(&mut self, ids: &[String]) -> Result<()> {
        self.update_file(|file| {
            file.tasks.retain(|t| !ids.contains(&t.id));
            Ok(())
        })
    }

    fn import_tasks(&mut self, tasks: Vec<Task>) -> Result<()> {
        self.update_file(|file| {
            file.tasks = tasks;
            Ok(())
        })
    }

    fn export_tasks(&self) -> Result<Vec<Task>> {
        self.get_all_tasks()
    }

    fn is_initialized(&self) -> Result<bool> {
        Ok(self.load()?.initialized)
    }

    fn set_initialized(&mut self) -> Result<()> {
        self.update_file(|file| {
            file.initialized = true;
            Ok(())
        })
    }

    /// All patches land in one write; a missing id aborts the whole batch.
    fn update_tasks(&mut self, updates: &[(String, TaskPatch)]) -> Result<Vec<Task>> {
        let now = Utc::now();
        self.update_file(|file| {
            let mut updated = Vec::with_capacity(updates.len());
            for (id, patch) in updates {
                let task = file.find_mut(id)?;
                task.apply_patch(patch, now);
                updated.push(task.clone());
            }
            Ok(updated)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{TaskStatus, ROOT_TASK_ID};
    use tempfile::TempDir;

    fn store() -> (TempDir, FileStore) {
        let temp = TempDir::new().unwrap();
        let store = FileStore::open(temp.path().join("data")).unwrap();
        (temp, store)
    }

    #[test]
    fn missing_file_reads_as_empty_uninitialized() {
        let (_temp, store) = store();
        assert!(store.get_all_tasks().unwrap().is_empty());
        assert!(!store.is_initialized().unwrap());
        assert!(!store.tasks_file().exists());
    }

    #[test]
    fn create_persists_across_instances() {
        let (_temp, mut store) = store();
        let task = store
            .create_task(NewTask::new(ROOT_TASK_ID, "Health").with_status(TaskStatus::Completed))
            .unwrap();
        store.set_initialized().unwrap();

        let reopened = FileStore::open(store.root()).unwrap();
        let loaded = reopened.get_task(&task.id).unwrap().unwrap();
        assert_eq!(loaded, task);
        assert!(loaded.completed_at.is_some());
        assert!(reopened.is_initialized().unwrap());
    }

    #[test]
    fn batch_update_is_all_or_nothing() {
        let (_temp, mut store) = store();
        let a = store.create_task(NewTask::new(ROOT_TASK_ID, "A")).unwrap();
        let updates = vec![
            (a.id.clone(), TaskPatch::order(9)),
            ("missing".to_string(), TaskPatch::order(1)),
        ];
        assert!(matches!(
            store.update_tasks(&updates),
            Err(Error::TaskNotFound(_))
        ));
        assert_eq!(store.get_task(&a.id).unwrap().unwrap().order, a.order);
    }

    #[test]
    fn delete_tasks_removes_all_listed() {
        let (_temp, mut store) = store();
        let a = store.create_task(NewTask::new(ROOT_TASK_ID, "A")).unwrap();
        let b = store.create_task(NewTask::new(&a.id, "B")).unwrap();
        let c = store.create_task(NewTask::new(ROOT_TASK_ID, "C")).unwrap();

        store.delete_tasks(&[a.id.clone(), b.id.clone()]).unwrap();
        let ids: Vec<String> = store.get_all_tasks().unwrap().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![c.id]);
    }

    #[test]
    fn newer_schema_is_rejected() {
        let (_temp, store) = store();
        fs::write(
            store.tasks_file(),
            r#"{"schema_version": 99, "initialized": true, "tasks": []}"#,
        )
        .unwrap();
        assert!(matches!(store.get_all_tasks(), Err(Error::Storage(_))));
    }

    #[test]
    fn import_then_export_is_identical() {
        let (_temp, mut store) = store();
        store.create_task(NewTask::new(ROOT_TASK_ID, "A")).unwrap();
        let exported = store.export_tasks().unwrap();
        store.import_tasks(exported.clone()).unwrap();
        assert_eq!(store.export_tasks().unwrap(), exported);
    }
}
