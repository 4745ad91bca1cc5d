//! Kanban board grouping and drop planning.
//!
//! A drop gesture arrives already resolved to "task X was released over column Y"
//! or "over task Z". [`plan_drop`] turns that into the engine calls that land it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::task::{Task, TaskStatus};
use crate::tree::{theme_name, TreeIndex};
use crate::views::filter::visible_children;

#[derive(Debug, Clone, Serialize)]
pub struct Column<'a> {
    pub status: TaskStatus,
    pub label: &'static str,
    pub tasks: Vec<&'a Task>,
}

impl<'a> Column<'a> {
    fn group(tasks: &[&'a Task], status: TaskStatus) -> Self {
        Self {
            status,
            label: status.label(),
            tasks: tasks.iter().copied().filter(|t| t.status == status).collect(),
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.id.clone()).collect()
    }

    fn position(&self, task_id: &str) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == task_id)
    }

    fn next_order(&self) -> i64 {
        self.tasks
            .iter()
            .map(|t| t.order)
            .max()
            .map(|max| max + 1)
            .unwrap_or(0)
    }
}

/// The four fixed status columns for one parent.
#[derive(Debug, Clone, Serialize)]
pub struct Board<'a> {
    pub parent_id: String,
    pub columns: Vec<Column<'a>>,
}

impl<'a> Board<'a> {
    /// Group already-visible children (sorted by order) into columns.
    ///
    /// Calendar-only items never appear on the board.
    pub fn from_visible(parent_id: &str, visible: &[&'a Task]) -> Self {
        let cards: Vec<&Task> = visible.iter().copied().filter(|t| !t.calendar_only).collect();
        Self {
            parent_id: parent_id.to_string(),
            columns: TaskStatus::ALL
                .iter()
                .map(|status| Column::group(&cards, *status))
                .collect(),
        }
    }

    pub fn build(tasks: &'a [Task], parent_id: &str, hide_days: u32, now: DateTime<Utc>) -> Self {
        let visible = visible_children(tasks, parent_id, hide_days, now);
        Self::from_visible(parent_id, &visible)
    }

    pub fn column(&self, status: TaskStatus) -> &Column<'a> {
        &self.columns[status.column_index()]
    }

    pub fn find(&self, task_id: &str) -> Option<&'a Task> {
        self.columns
            .iter()
            .flat_map(|c| c.tasks.iter())
            .find(|t| t.id == task_id)
            .copied()
    }

    pub fn len(&self) -> usize {
        self.columns.iter().map(|c| c.tasks.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One lane per child of a parent, each with its own status columns.
#[derive(Debug, Clone, Serialize)]
pub struct Swimlane<'a> {
    pub group: &'a Task,
    pub theme: &'static str,
    pub columns: Vec<Column<'a>>,
}

pub fn swimlanes<'a>(tasks: &'a [Task], parent_id: &str) -> Vec<Swimlane<'a>> {
    let index = TreeIndex::build(tasks);
    index
        .children(parent_id)
        .iter()
        .copied()
        .map(|group| {
            let children = index.children(&group.id);
            Swimlane {
                group,
                theme: theme_name(&group.id),
                columns: TaskStatus::ALL
                    .iter()
                    .map(|status| Column::group(children, *status))
                    .collect(),
            }
        })
        .collect()
}

/// Where a dragged card was released.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    Column(TaskStatus),
    Task(String),
}

/// Engine calls that land a drop: an optional move, then an optional reorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DropPlan {
    pub task_id: String,
    pub move_to: Option<(TaskStatus, i64)>,
    pub reorder: Option<(Vec<String>, TaskStatus)>,
}

/// Resolve a drop into a plan, or `None` when nothing changes.
///
/// - Over a column with another status: append to that column.
/// - Over a card in another column: take the card's status and order, then
///   renumber the target column with the dragged card spliced in before it.
/// - Over a card in the same column: move within the column and renumber.
pub fn plan_drop(board: &Board<'_>, active_id: &str, target: &DropTarget) -> Option<DropPlan> {
    let active = board.find(active_id)?;

    match target {
        DropTarget::Column(status) => {
            if active.status == *status {
                return None;
            }
            let order = board.column(*status).next_order();
            Some(DropPlan {
                task_id: active.id.clone(),
                move_to: Some((*status, order)),
                reorder: None,
            })
        }
        DropTarget::Task(over_id) => {
            if over_id == active_id {
                return None;
            }
            let over = board.find(over_id)?;

            if active.status != over.status {
                let column = board.column(over.status);
                let mut ids: Vec<String> = column
                    .ids()
                    .into_iter()
                    .filter(|id| id != active_id)
                    .collect();
                let over_index = ids.iter().position(|id| id == over_id).unwrap_or(ids.len());
                ids.insert(over_index, active.id.clone());
                return Some(DropPlan {
                    task_id: active.id.clone(),
                    move_to: Some((over.status, over.order)),
                    reorder: Some((ids, over.status)),
                });
            }

            let column = board.column(active.status);
            let old_index = column.position(active_id)?;
            let new_index = column.position(over_id)?;
            if old_index == new_index {
                return None;
            }
            let mut ids = column.ids();
            let moved = ids.remove(old_index);
            ids.insert(new_index, moved);
            Some(DropPlan {
                task_id: active.id.clone(),
                move_to: None,
                reorder: Some((ids, active.status)),
            })
        }
    }
}
