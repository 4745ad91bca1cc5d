//! Persistence port.
//!
//! The engine only talks to storage through [`TaskStore`]. [`MemoryStore`] keeps
//! everything in a map; `storage::FileStore` persists to disk.

use std::collections::BTreeMap;

use chrono::Utc;
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::task::{NewTask, Task, TaskPatch};

/// Fresh task id: a lowercase ULID.
pub fn new_task_id() -> String {
    Ulid::new().to_string().to_lowercase()
}

/// Durable task collection keyed by id.
pub trait TaskStore {
    fn get_all_tasks(&self) -> Result<Vec<Task>>;

    fn get_task(&self, id: &str) -> Result<Option<Task>>;

    /// Children of `parent_id`, sorted by `order`.
    fn get_children(&self, parent_id: &str) -> Result<Vec<Task>>;

    /// Assigns id and timestamps; stamps `completed_at` when created completed.
    fn create_task(&mut self, input: NewTask) -> Result<Task>;

    /// Fails with [`Error::TaskNotFound`] when `id` is absent.
    fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<Task>;

    /// Fails with [`Error::TaskNotFound`] when `id` is absent.
    fn delete_task(&mut self, id: &str) -> Result<()>;

    /// Removes every listed id; ids that are already gone are skipped.
    fn delete_tasks(&mut self, ids: &[String]) -> Result<()>;

    /// Replace the whole collection.
    fn import_tasks(&mut self, tasks: Vec<Task>) -> Result<()>;

    fn export_tasks(&self) -> Result<Vec<Task>>;

    fn is_initialized(&self) -> Result<bool>;

    fn set_initialized(&mut self) -> Result<()>;

    /// Apply several patches.
    ///
    /// The default applies them one at a time and stops at the first failure,
    /// leaving earlier updates in place.
    fn update_tasks(&mut self, updates: &[(String, TaskPatch)]) -> Result<Vec<Task>> {
        let mut updated = Vec::with_capacity(updates.len());
        for (id, patch) in updates {
            updated.push(self.update_task(id, patch)?);
        }
        Ok(updated)
    }
}

/// In-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tasks: BTreeMap<String, Task>,
    initialized: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populated, initialized store.
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: tasks.into_iter().map(|t| (t.id.clone(), t)).collect(),
            initialized: true,
        }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl TaskStore for MemoryStore {
    fn get_all_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.tasks.values().cloned().collect())
    }

    fn get_task(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.tasks.get(id).cloned())
    }

    fn get_children(&self, parent_id: &str) -> Result<Vec<Task>> {
        let mut children: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| t.parent_id == parent_id)
            .cloned()
            .collect();
        children.sort_by_key(|t| t.order);
        Ok(children)
    }

    fn create_task(&mut self, input: NewTask) -> Result<Task> {
        let task = Task::from_new(input, new_task_id(), Utc::now());
        self.tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    }

    fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<Task> {
        let task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        task.apply_patch(patch, Utc::now());
        Ok(task.clone())
    }

    fn delete_task(&mut self, id: &str) -> Result<()> {
        self.tasks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    fn delete_tasks(&mut self, ids: &[String]) -> Result<()> {
        for id in ids {
            self.tasks.remove(id);
        }
        Ok(())
    }

    fn import_tasks(&mut self, tasks: Vec<Task>) -> Result<()> {
        self.tasks = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        Ok(())
    }

    fn export_tasks(&self) -> Result<Vec<Task>> {
        self.get_all_tasks()
    }

    fn is_initialized(&self) -> Result<bool> {
        Ok(self.initialized)
    }

    fn set_initialized(&mut self) -> Result<()> {
        self.initialized = true;
        Ok(())
    }
}
