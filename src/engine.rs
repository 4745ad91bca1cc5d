//! Task engine: the authoritative in-memory collection plus navigation state.
//!
//! Every mutation validates first, writes through the [`TaskStore`], and only then
//! updates memory and notifies subscribers. A failed store call leaves memory as it
//! was, except for a failed batch reorder, which re-reads the store.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::EngineEvent;
use crate::seed;
use crate::store::TaskStore;
use crate::task::{NewTask, Task, TaskPatch, TaskStatus, ROOT_TASK_ID};
use crate::tree::{self, TreeIndex};
use crate::views::{self, Board, DropPlan, EntryKind};

/// Observer callback.
pub type Listener = Box<dyn FnMut(&EngineEvent)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Outcome of [`TaskEngine::initialize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct InitReport {
    /// The seed tree was written on this start.
    pub seeded: bool,
    /// Tasks held in memory afterwards.
    pub loaded: usize,
    /// Startup failed and the engine is running on an empty collection.
    pub degraded: bool,
}

pub struct TaskEngine<S: TaskStore> {
    store: S,
    config: Config,
    tasks: Vec<Task>,
    current_parent_id: String,
    selected_task_id: Option<String>,
    search_open: bool,
    archive_open: bool,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl<S: TaskStore> TaskEngine<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self {
            store,
            config,
            tasks: Vec::new(),
            current_parent_id: ROOT_TASK_ID.to_string(),
            selected_task_id: None,
            search_open: false,
            archive_open: false,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Seed the store on first run, then load the whole collection.
    ///
    /// Never fails: a store error is logged and the engine continues empty.
    pub fn initialize(&mut self) -> InitReport {
        match self.load() {
            Ok(report) => report,
            Err(err) => {
                error!(error = %err, "failed to initialize tasks; continuing with an empty collection");
                self.tasks.clear();
                InitReport {
                    seeded: false,
                    loaded: 0,
                    degraded: true,
                }
            }
        }
    }

    fn load(&mut self) -> Result<InitReport> {
        let mut seeded = false;
        if !self.store.is_initialized()? {
            let tasks = seed::seed_tasks(Utc::now());
            info!(count = tasks.len(), "seeding task store");
            self.store.import_tasks(tasks)?;
            self.store.set_initialized()?;
            seeded = true;
        }
        self.tasks = self.store.get_all_tasks()?;
        let loaded = self.tasks.len();
        debug!(loaded, seeded, "tasks loaded");
        self.emit(EngineEvent::Loaded {
            count: loaded,
            seeded,
        });
        Ok(InitReport {
            seeded,
            loaded,
            degraded: false,
        })
    }

    // =========================================================================
    // State accessors
    // =========================================================================

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn current_parent_id(&self) -> &str {
        &self.current_parent_id
    }

    pub fn selected_task_id(&self) -> Option<&str> {
        self.selected_task_id.as_deref()
    }

    pub fn search_open(&self) -> bool {
        self.search_open
    }

    pub fn archive_open(&self) -> bool {
        self.archive_open
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn require(&self, id: &str) -> Result<&Task> {
        self.task(id).ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Register an observer called after every committed change.
    pub fn subscribe(&mut self, listener: impl FnMut(&EngineEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Returns false if the id was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sub, _)| *sub != id);
        self.listeners.len() != before
    }

    fn emit(&mut self, event: EngineEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    // =========================================================================
    // Navigation and overlays
    // =========================================================================

    /// Show the children of `parent_id` and clear the selection.
    pub fn navigate_to(&mut self, parent_id: &str) -> Result<()> {
        if parent_id != ROOT_TASK_ID {
            self.require(parent_id)?;
        }
        self.current_parent_id = parent_id.to_string();
        self.emit(EngineEvent::Navigated {
            parent_id: parent_id.to_string(),
        });
        self.set_selection(None);
        Ok(())
    }

    pub fn select_task(&mut self, task_id: Option<&str>) -> Result<()> {
        if let Some(id) = task_id {
            self.require(id)?;
        }
        self.set_selection(task_id.map(str::to_string));
        Ok(())
    }

    /// Navigate to a task's parent and select it.
    pub fn focus_task(&mut self, task_id: &str) -> Result<()> {
        let parent_id = self.require(task_id)?.parent_id.clone();
        self.navigate_to(&parent_id)?;
        self.select_task(Some(task_id))
    }

    fn set_selection(&mut self, task_id: Option<String>) {
        if self.selected_task_id != task_id {
            self.selected_task_id = task_id.clone();
            self.emit(EngineEvent::SelectionChanged { task_id });
        }
    }

    pub fn set_search_open(&mut self, open: bool) {
        self.search_open = open;
        self.emit(EngineEvent::SearchToggled { open });
    }

    pub fn set_archive_open(&mut self, open: bool) {
        self.archive_open = open;
        self.emit(EngineEvent::ArchiveToggled { open });
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Append a new task to the end of its `(parent, status)` bucket.
    pub fn create_task(&mut self, mut input: NewTask) -> Result<Task> {
        tree::validate_title(&input.title)?;
        if input.parent_id != ROOT_TASK_ID && self.task(&input.parent_id).is_none() {
            return Err(Error::ParentNotFound(input.parent_id));
        }

        input.order = tree::next_order(&self.tasks, &input.parent_id, input.status);
        let task = self.store.create_task(input)?;
        debug!(id = %task.id, parent = %task.parent_id, order = task.order, "task created");

        self.tasks.push(task.clone());
        self.emit(EngineEvent::TaskCreated { task: task.clone() });
        Ok(task)
    }

    /// Merge a patch onto a task.
    ///
    /// A parent change is refused when the parent is missing or would create a cycle.
    pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        if let Some(title) = &patch.title {
            tree::validate_title(title)?;
        }
        if let Some(parent_id) = &patch.parent_id {
            self.check_reparent(id, parent_id)?;
        }

        let task = self.store.update_task(id, &patch)?;
        debug!(id = %task.id, status = %task.status, "task updated");

        self.replace(task.clone());
        self.emit(EngineEvent::TaskUpdated { task: task.clone() });
        Ok(task)
    }

    /// Set status and order, optionally reparenting.
    pub fn move_task(
        &mut self,
        id: &str,
        status: TaskStatus,
        order: i64,
        new_parent_id: Option<&str>,
    ) -> Result<Task> {
        if let Some(parent_id) = new_parent_id {
            self.check_reparent(id, parent_id)?;
        }

        let patch = TaskPatch {
            status: Some(status),
            order: Some(order),
            parent_id: new_parent_id.map(str::to_string),
            ..TaskPatch::default()
        };
        let task = self.store.update_task(id, &patch)?;
        debug!(id = %task.id, status = %task.status, order = task.order, "task moved");

        self.replace(task.clone());
        self.emit(EngineEvent::TaskMoved { task: task.clone() });
        Ok(task)
    }

    /// Move a task under a new parent, at the end of its status bucket there.
    pub fn reparent_task(&mut self, id: &str, new_parent_id: &str) -> Result<Task> {
        self.check_reparent(id, new_parent_id)?;
        let status = self.require(id)?.status;
        let order = tree::next_order(&self.tasks, new_parent_id, status);
        self.move_task(id, status, order, Some(new_parent_id))
    }

    fn check_reparent(&self, id: &str, new_parent_id: &str) -> Result<()> {
        let task = self.require(id)?;
        if task.parent_id == new_parent_id {
            return Ok(());
        }
        if new_parent_id != ROOT_TASK_ID && self.task(new_parent_id).is_none() {
            return Err(Error::ParentNotFound(new_parent_id.to_string()));
        }
        if tree::would_create_cycle(&self.tasks, id, new_parent_id) {
            warn!(id, parent = new_parent_id, "reparent refused: cycle");
            return Err(Error::CycleRejected {
                task_id: id.to_string(),
                parent_id: new_parent_id.to_string(),
            });
        }
        Ok(())
    }

    /// Renumber `ids` to orders `0..n` within their shared parent.
    ///
    /// Only `order` changes; every task keeps its status. Tasks of the
    /// `(parent, status)` bucket that are not listed keep their relative order
    /// after the listed ones. If the store fails part way, memory is re-read from the store
    /// and the error returned.
    pub fn reorder_tasks(&mut self, ids: &[String], status: TaskStatus) -> Result<Vec<Task>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::with_capacity(ids.len());
        for id in ids {
            if !seen.insert(id.as_str()) {
                return Err(Error::InvalidArgument(format!(
                    "task {id} listed more than once"
                )));
            }
        }

        let parent_id = self.require(&ids[0])?.parent_id.clone();
        let mut updates = Vec::with_capacity(ids.len());
        for (index, id) in ids.iter().enumerate() {
            let task = self.require(id)?;
            if task.parent_id != parent_id {
                return Err(Error::InvalidArgument(format!(
                    "task {id} is not a sibling of {}",
                    ids[0]
                )));
            }
            updates.push((id.clone(), TaskPatch::order(index as i64)));
        }

        let index = TreeIndex::build(&self.tasks);
        let unlisted = index
            .bucket(&parent_id, status)
            .into_iter()
            .filter(|t| !seen.contains(t.id.as_str()));
        for (offset, task) in unlisted.enumerate() {
            let order = (ids.len() + offset) as i64;
            if task.order != order {
                updates.push((task.id.clone(), TaskPatch::order(order)));
            }
        }

        let updated = match self.store.update_tasks(&updates) {
            Ok(updated) => updated,
            Err(err) => {
                warn!(error = %err, parent = %parent_id, "reorder failed; re-syncing from store");
                self.resync();
                return Err(err);
            }
        };
        debug!(parent = %parent_id, %status, count = updated.len(), "tasks reordered");

        for task in &updated {
            self.replace(task.clone());
        }
        self.emit(EngineEvent::TasksReordered {
            ids: ids.to_vec(),
            status,
        });
        Ok(updated)
    }

    fn resync(&mut self) {
        match self.store.get_all_tasks() {
            Ok(tasks) => self.tasks = tasks,
            Err(err) => error!(error = %err, "re-sync failed; keeping in-memory tasks"),
        }
    }

    /// Land a board drop: the move first, then the reorder.
    pub fn apply_drop(&mut self, plan: &DropPlan) -> Result<()> {
        if let Some((status, order)) = plan.move_to {
            self.move_task(&plan.task_id, status, order, None)?;
        }
        if let Some((ids, status)) = &plan.reorder {
            self.reorder_tasks(ids, *status)?;
        }
        Ok(())
    }

    /// Delete a task and its whole subtree. Returns the removed ids.
    pub fn delete_task(&mut self, id: &str) -> Result<Vec<String>> {
        self.require(id)?;
        let ids = tree::subtree_ids(&self.tasks, id);
        self.store.delete_tasks(&ids)?;
        debug!(id, count = ids.len(), "subtree deleted");

        let removed: HashSet<&str> = ids.iter().map(String::as_str).collect();
        self.tasks.retain(|t| !removed.contains(t.id.as_str()));

        let navigation_gone = removed.contains(self.current_parent_id.as_str());
        let selection_gone = self
            .selected_task_id
            .as_deref()
            .map(|selected| removed.contains(selected))
            .unwrap_or(false);

        self.emit(EngineEvent::TasksDeleted { ids: ids.clone() });
        if selection_gone {
            self.set_selection(None);
        }
        if navigation_gone {
            self.current_parent_id = ROOT_TASK_ID.to_string();
            self.emit(EngineEvent::Navigated {
                parent_id: ROOT_TASK_ID.to_string(),
            });
        }
        Ok(ids)
    }

    // =========================================================================
    // Calendar and dashboard actions
    // =========================================================================

    /// Land a calendar drag: scheduled entries move the scheduled date, due-only
    /// entries move the due date.
    pub fn reschedule(&mut self, task_id: &str, kind: EntryKind, at: DateTime<Utc>) -> Result<Task> {
        let mut patch = TaskPatch::default();
        if kind.is_scheduled() {
            patch.scheduled_date = Some(Some(at));
        } else if kind.is_due() {
            patch.due_date = Some(Some(at));
        }
        self.update_task(task_id, patch)
    }

    /// Put an existing open board task on the calendar.
    pub fn schedule_task(&mut self, task_id: &str, at: DateTime<Utc>) -> Result<Task> {
        let task = self.require(task_id)?;
        if task.is_completed() || task.calendar_only {
            return Err(Error::InvalidArgument(format!(
                "task {task_id} cannot be scheduled: it is completed or calendar-only"
            )));
        }
        self.update_task(
            task_id,
            TaskPatch {
                scheduled_date: Some(Some(at)),
                ..TaskPatch::default()
            },
        )
    }

    /// Create a top-level calendar-only marker.
    pub fn add_calendar_item(&mut self, title: &str, at: DateTime<Utc>) -> Result<Task> {
        self.create_task(
            NewTask::new(ROOT_TASK_ID, title.trim())
                .with_scheduled_date(at)
                .calendar_only(),
        )
    }

    /// Dismiss a task from today's agenda.
    ///
    /// Calendar-only items are deleted (returns `None`); other tasks lose their
    /// scheduled date.
    pub fn complete_for_today(&mut self, task_id: &str) -> Result<Option<Task>> {
        let task = self.require(task_id)?;
        if task.calendar_only {
            self.delete_task(task_id)?;
            return Ok(None);
        }
        if task.scheduled_date.is_none() {
            return Ok(Some(task.clone()));
        }
        self.update_task(
            task_id,
            TaskPatch {
                scheduled_date: Some(None),
                ..TaskPatch::default()
            },
        )
        .map(Some)
    }

    // =========================================================================
    // Bulk import / export
    // =========================================================================

    /// Replace the whole collection and reset navigation and selection.
    ///
    /// Completion stamps are normalised first: completed tasks without one get
    /// their `updated_at`, open tasks lose any stale stamp.
    pub fn import_tasks(&mut self, mut tasks: Vec<Task>) -> Result<()> {
        tree::validate_collection(&tasks)?;
        tree::normalize_completion(&mut tasks);
        self.store.import_tasks(tasks.clone())?;
        self.store.set_initialized()?;
        info!(count = tasks.len(), "tasks imported");

        let count = tasks.len();
        self.tasks = tasks;
        self.emit(EngineEvent::TasksImported { count });
        self.set_selection(None);
        if self.current_parent_id != ROOT_TASK_ID {
            self.current_parent_id = ROOT_TASK_ID.to_string();
            self.emit(EngineEvent::Navigated {
                parent_id: ROOT_TASK_ID.to_string(),
            });
        }
        Ok(())
    }

    pub fn export_tasks(&self) -> Result<Vec<Task>> {
        self.store.export_tasks()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Children of the current parent, minus archived completions.
    pub fn visible_children(&self) -> Vec<&Task> {
        views::visible_children(
            &self.tasks,
            &self.current_parent_id,
            self.config.archive.hide_days,
            Utc::now(),
        )
    }

    pub fn archived_tasks(&self) -> Vec<&Task> {
        views::archived_tasks(&self.tasks, self.config.archive.hide_days, Utc::now())
    }

    pub fn search_tasks(&self, query: &str) -> Vec<&Task> {
        views::search_tasks(&self.tasks, query)
    }

    /// Board for the current parent.
    pub fn board(&self) -> Board<'_> {
        Board::from_visible(&self.current_parent_id, &self.visible_children())
    }

    pub fn task_path(&self, id: &str) -> Vec<&Task> {
        tree::task_path(&self.tasks, id)
    }

    pub fn breadcrumb(&self, id: &str) -> String {
        let path = self.task_path(id);
        tree::format_breadcrumb(&path, self.config.display.breadcrumb_max_len)
    }

    /// Immediate children of `id`, sorted by order.
    pub fn children_of(&self, id: &str) -> Vec<&Task> {
        TreeIndex::build(&self.tasks).children(id).to_vec()
    }

    fn replace(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => self.tasks.push(task),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn engine() -> TaskEngine<MemoryStore> {
        let mut engine = TaskEngine::new(MemoryStore::new(), Config::default());
        let report = engine.initialize();
        assert!(report.seeded);
        engine
    }

    #[test]
    fn initialize_seeds_once() {
        let mut engine = engine();
        let count = engine.tasks().len();
        assert!(count > 0);
        assert!(engine.store().is_initialized().unwrap());

        let report = engine.initialize();
        assert!(!report.seeded);
        assert_eq!(report.loaded, count);
    }

    #[test]
    fn create_appends_to_bucket() {
        let mut engine = engine();
        let t = engine.create_task(NewTask::new("career", "Network")).unwrap();
        // Seed has c2 at order 1 in career/NOT_STARTED.
        assert_eq!(t.order, 2);
        assert!(engine.task(&t.id).is_some());
    }

    #[test]
    fn create_rejects_bad_title_and_missing_parent() {
        let mut engine = engine();
        let before = engine.tasks().len();
        assert!(matches!(
            engine.create_task(NewTask::new("career", "   ")),
            Err(Error::InvalidTitle(_))
        ));
        assert!(matches!(
            engine.create_task(NewTask::new("ghost", "Orphan")),
            Err(Error::ParentNotFound(_))
        ));
        assert_eq!(engine.tasks().len(), before);
    }

    #[test]
    fn update_missing_task_propagates_not_found() {
        let mut engine = engine();
        let err = engine.update_task("nope", TaskPatch::order(1)).unwrap_err();
        assert!(matches!(err, Error::TaskNotFound(_)));
    }

    #[test]
    fn reparent_refuses_cycles() {
        let mut engine = engine();
        let child = engine.create_task(NewTask::new("c1", "Draft")).unwrap();

        let err = engine.reparent_task("c1", &child.id).unwrap_err();
        assert!(err.is_rejection());
        assert_eq!(engine.task("c1").unwrap().parent_id, "career");

        let err = engine.move_task("career", TaskStatus::NotStarted, 0, Some("c1")).unwrap_err();
        assert!(matches!(err, Error::CycleRejected { .. }));

        let moved = engine.reparent_task(&child.id, "health").unwrap();
        assert_eq!(moved.parent_id, "health");
        assert_eq!(moved.order, 2);
    }

    #[test]
    fn delete_resets_navigation_and_selection() {
        let mut engine = engine();
        engine.navigate_to("career").unwrap();
        engine.select_task(Some("c1")).unwrap();

        let removed = engine.delete_task("career").unwrap();
        assert_eq!(removed.len(), 3);
        assert_eq!(engine.current_parent_id(), ROOT_TASK_ID);
        assert!(engine.selected_task_id().is_none());
        assert!(engine.task("c2").is_none());
    }

    #[test]
    fn subscribers_see_committed_changes() {
        let mut engine = engine();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let sub = engine.subscribe(move |event| sink.borrow_mut().push(event.kind()));

        engine.set_search_open(true);
        engine.create_task(NewTask::new("career", "x")).unwrap();
        let _ = engine.create_task(NewTask::new("career", ""));
        assert_eq!(seen.borrow().len(), 2);

        assert!(engine.unsubscribe(sub));
        assert!(!engine.unsubscribe(sub));
        engine.set_archive_open(true);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn navigate_clears_selection() {
        let mut engine = engine();
        engine.select_task(Some("c1")).unwrap();
        engine.navigate_to("health").unwrap();
        assert!(engine.selected_task_id().is_none());
        assert!(engine.navigate_to("ghost").is_err());
        assert_eq!(engine.current_parent_id(), "health");
    }

    #[test]
    fn focus_navigates_to_parent() {
        let mut engine = engine();
        engine.focus_task("h2").unwrap();
        assert_eq!(engine.current_parent_id(), "health");
        assert_eq!(engine.selected_task_id(), Some("h2"));
    }

    #[test]
    fn complete_for_today_deletes_markers_and_unschedules_tasks() {
        let mut engine = engine();
        let now = Utc::now();
        let marker = engine.add_calendar_item("Dentist", now).unwrap();
        assert!(marker.calendar_only);
        assert!(engine.complete_for_today(&marker.id).unwrap().is_none());
        assert!(engine.task(&marker.id).is_none());

        engine.schedule_task("c2", now).unwrap();
        let task = engine.complete_for_today("c2").unwrap().unwrap();
        assert!(task.scheduled_date.is_none());
    }

    #[test]
    fn schedule_refuses_completed_tasks() {
        let mut engine = engine();
        assert!(matches!(
            engine.schedule_task("h1", Utc::now()),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn reschedule_moves_the_right_date() {
        let mut engine = engine();
        let at = Utc::now();
        let t = engine.reschedule("c1", EntryKind::Due, at).unwrap();
        assert_eq!(t.due_date, Some(at));
        assert!(t.scheduled_date.is_none());

        let t = engine.reschedule("c1", EntryKind::Both, at).unwrap();
        assert_eq!(t.scheduled_date, Some(at));
    }

    #[test]
    fn breadcrumb_and_children() {
        let mut engine = engine();
        let sub = engine.create_task(NewTask::new("c1", "Notes")).unwrap();
        assert_eq!(
            engine.breadcrumb(&sub.id),
            "Root › Career › Complete Q1 Review › Notes"
        );
        let children: Vec<&str> = engine
            .children_of("career")
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(children, vec!["c1", "c2"]);
    }
}
