//! Derived views: pure functions of a task snapshot plus the current context.

pub mod board;
pub mod calendar;
pub mod dashboard;
pub mod filter;

pub use board::{plan_drop, swimlanes, Board, Column, DropPlan, DropTarget, Swimlane};
pub use calendar::{calendar_entries, local_noon, scheduled_count_by_day, CalendarEntry, EntryKind};
pub use dashboard::{
    area_snapshots, life_areas, primary_area, today_agenda, upcoming_tasks, AreaSnapshot,
    TodayAgenda,
};
pub use filter::{archived_tasks, search_tasks, visible_children};
