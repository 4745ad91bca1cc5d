//! Tree utilities over a task collection snapshot.
//!
//! The tree is stored as parent pointers. [`TreeIndex`] builds the id and
//! parent→children maps once per snapshot; the free functions build a throwaway
//! index for one-off queries.

use std::collections::{HashMap, HashSet, VecDeque};

use chrono::{DateTime, Duration, Utc};

use crate::error::{Error, Result};
use crate::task::{Task, TaskStatus, ROOT_TASK_ID, TITLE_MAX_LEN};

const BREADCRUMB_SEPARATOR: &str = " › ";
const BREADCRUMB_ROOT: &str = "Root";

/// Id and children lookups for one snapshot.
#[derive(Debug)]
pub struct TreeIndex<'a> {
    by_id: HashMap<&'a str, &'a Task>,
    children: HashMap<&'a str, Vec<&'a Task>>,
}

impl<'a> TreeIndex<'a> {
    pub fn build(tasks: &'a [Task]) -> Self {
        let mut by_id = HashMap::with_capacity(tasks.len());
        let mut children: HashMap<&'a str, Vec<&'a Task>> = HashMap::new();
        for task in tasks {
            by_id.insert(task.id.as_str(), task);
            children
                .entry(task.parent_id.as_str())
                .or_default()
                .push(task);
        }
        for list in children.values_mut() {
            list.sort_by_key(|task| task.order);
        }
        Self { by_id, children }
    }

    pub fn get(&self, id: &str) -> Option<&'a Task> {
        self.by_id.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    /// Immediate children sorted by `order`.
    pub fn children(&self, parent_id: &str) -> &[&'a Task] {
        self.children
            .get(parent_id)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Ancestors from the top-level area down to `id` itself.
    ///
    /// Stops at the root sentinel or at a missing parent, returning what was
    /// collected so far. Never revisits an id.
    pub fn path(&self, id: &str) -> Vec<&'a Task> {
        let mut path = Vec::new();
        let mut seen = HashSet::new();
        let mut current = id;
        while current != ROOT_TASK_ID && seen.insert(current) {
            let Some(task) = self.get(current) else {
                break;
            };
            path.push(task);
            current = task.parent_id.as_str();
        }
        path.reverse();
        path
    }

    /// True if making `new_parent_id` the parent of `task_id` would close a loop.
    pub fn would_create_cycle(&self, task_id: &str, new_parent_id: &str) -> bool {
        if new_parent_id == ROOT_TASK_ID {
            return false;
        }
        if new_parent_id == task_id {
            return true;
        }

        let mut seen = HashSet::new();
        let mut current = new_parent_id;
        while current != ROOT_TASK_ID && seen.insert(current) {
            if current == task_id {
                return true;
            }
            match self.get(current) {
                Some(task) => current = task.parent_id.as_str(),
                None => break,
            }
        }
        false
    }

    /// `task_id` followed by every transitive descendant, breadth first.
    pub fn subtree_ids(&self, task_id: &str) -> Vec<String> {
        let mut ids = vec![task_id.to_string()];
        let mut seen: HashSet<&str> = HashSet::from([task_id]);
        let mut queue = VecDeque::from([task_id]);

        while let Some(current) = queue.pop_front() {
            for child in self.children(current) {
                if seen.insert(child.id.as_str()) {
                    ids.push(child.id.clone());
                    queue.push_back(child.id.as_str());
                }
            }
        }
        ids
    }

    /// Tasks of one `(parent_id, status)` bucket in render order.
    pub fn bucket(&self, parent_id: &str, status: TaskStatus) -> Vec<&'a Task> {
        self.children(parent_id)
            .iter()
            .copied()
            .filter(|task| task.status == status)
            .collect()
    }
}

/// Structural check for a whole collection: unique ids, every parent present,
/// and every chain reaching the root sentinel.
pub fn validate_collection(tasks: &[Task]) -> Result<()> {
    let mut ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if task.id == ROOT_TASK_ID {
            return Err(Error::InvalidArgument(format!(
                "task id '{ROOT_TASK_ID}' is reserved"
            )));
        }
        if !ids.insert(task.id.as_str()) {
            return Err(Error::InvalidArgument(format!("duplicate task id {}", task.id)));
        }
    }

    let index = TreeIndex::build(tasks);
    if let Some(orphan) = tasks
        .iter()
        .find(|t| t.parent_id != ROOT_TASK_ID && !index.contains(&t.parent_id))
    {
        return Err(Error::ParentNotFound(orphan.parent_id.clone()));
    }
    for task in tasks {
        let top = index.path(&task.id).first().copied();
        if top.map(|t| t.parent_id.as_str()) != Some(ROOT_TASK_ID) {
            return Err(Error::CycleRejected {
                task_id: task.id.clone(),
                parent_id: task.parent_id.clone(),
            });
        }
    }
    Ok(())
}

/// Make `completed_at` agree with status: stamp completed tasks that lack one
/// with `updated_at`, clear it on open tasks.
pub fn normalize_completion(tasks: &mut [Task]) {
    for task in tasks {
        if task.is_completed() {
            task.completed_at.get_or_insert(task.updated_at);
        } else {
            task.completed_at = None;
        }
    }
}

pub fn task_path<'a>(tasks: &'a [Task], id: &str) -> Vec<&'a Task> {
    TreeIndex::build(tasks).path(id)
}

pub fn would_create_cycle(tasks: &[Task], task_id: &str, new_parent_id: &str) -> bool {
    TreeIndex::build(tasks).would_create_cycle(task_id, new_parent_id)
}

pub fn subtree_ids(tasks: &[Task], task_id: &str) -> Vec<String> {
    TreeIndex::build(tasks).subtree_ids(task_id)
}

/// Ids of a `(parent_id, status)` bucket in render order.
pub fn bucket_ids(tasks: &[Task], parent_id: &str, status: TaskStatus) -> Vec<String> {
    TreeIndex::build(tasks)
        .bucket(parent_id, status)
        .into_iter()
        .map(|task| task.id.clone())
        .collect()
}

/// Order for a new task appended to a bucket: 0 when empty, else max + 1.
pub fn next_order(tasks: &[Task], parent_id: &str, status: TaskStatus) -> i64 {
    tasks
        .iter()
        .filter(|task| task.parent_id == parent_id && task.status == status)
        .map(|task| task.order)
        .max()
        .map(|max| max + 1)
        .unwrap_or(0)
}

pub fn is_completed_older_than(task: &Task, days: u32, now: DateTime<Utc>) -> bool {
    match task.completed_at {
        Some(completed_at) => completed_at < now - Duration::days(i64::from(days)),
        None => false,
    }
}

/// "Completed 3 days ago", "Completed 1 hour ago", "Completed 12 mins ago".
pub fn completed_ago_text(task: &Task, now: DateTime<Utc>) -> Option<String> {
    let completed_at = task.completed_at?;
    let elapsed = now - completed_at;

    let days = elapsed.num_days();
    if days > 0 {
        return Some(format!("Completed {} day{} ago", days, plural(days)));
    }
    let hours = elapsed.num_hours();
    if hours > 0 {
        return Some(format!("Completed {} hour{} ago", hours, plural(hours)));
    }
    let mins = elapsed.num_minutes().max(0);
    Some(format!("Completed {} min{} ago", mins, plural(mins)))
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

pub fn is_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    match task.due_date {
        Some(due) => due < now && !task.is_completed(),
        None => false,
    }
}

/// Join `Root` and the path titles with ` › `.
///
/// A chain longer than `max_len` characters collapses to `Root › … › last`; a
/// single-level chain is cut and suffixed with `…` instead.
pub fn format_breadcrumb(path: &[&Task], max_len: usize) -> String {
    if path.is_empty() {
        return BREADCRUMB_ROOT.to_string();
    }

    let mut titles = Vec::with_capacity(path.len() + 1);
    titles.push(BREADCRUMB_ROOT);
    titles.extend(path.iter().map(|task| task.title.as_str()));
    let full = titles.join(BREADCRUMB_SEPARATOR);

    if full.chars().count() <= max_len {
        return full;
    }

    if titles.len() <= 2 {
        let keep = max_len.saturating_sub(1);
        let mut cut: String = full.chars().take(keep).collect();
        cut.push('…');
        return cut;
    }

    let last = titles[titles.len() - 1];
    format!(
        "{first}{sep}…{sep}{last}",
        first = titles[0],
        sep = BREADCRUMB_SEPARATOR
    )
}

pub fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidTitle("Title is required".to_string()));
    }
    if trimmed.chars().count() > TITLE_MAX_LEN {
        return Err(Error::InvalidTitle(format!(
            "Title must be {TITLE_MAX_LEN} characters or less"
        )));
    }
    Ok(())
}

/// Urgency band of a due date relative to `now`, in whole days rounded up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueUrgency {
    Overdue,
    Urgent,
    ThisWeek,
    Future,
}

impl DueUrgency {
    pub fn as_str(self) -> &'static str {
        match self {
            DueUrgency::Overdue => "overdue",
            DueUrgency::Urgent => "urgent",
            DueUrgency::ThisWeek => "this week",
            DueUrgency::Future => "future",
        }
    }
}

pub fn due_urgency(due: DateTime<Utc>, now: DateTime<Utc>) -> DueUrgency {
    let millis = (due - now).num_milliseconds();
    let day = Duration::days(1).num_milliseconds();
    let days = millis.div_euclid(day) + i64::from(millis.rem_euclid(day) != 0);
    match days {
        d if d < 0 => DueUrgency::Overdue,
        d if d <= 3 => DueUrgency::Urgent,
        d if d <= 7 => DueUrgency::ThisWeek,
        _ => DueUrgency::Future,
    }
}

/// Area card colours, indexed by [`theme_index`].
pub const PALETTE: [&str; 8] = [
    "blue", "emerald", "violet", "amber", "rose", "cyan", "fuchsia", "lime",
];

pub fn theme_name(id: &str) -> &'static str {
    PALETTE[theme_index(id, PALETTE.len())]
}

/// Stable palette slot for an id (string hash, `h * 31 + c` over UTF-16 units).
pub fn theme_index(id: &str, palette_len: usize) -> usize {
    if palette_len == 0 {
        return 0;
    }
    let mut hash: i32 = 0;
    for unit in id.encode_utf16() {
        hash = i32::from(unit).wrapping_add(hash.wrapping_shl(5).wrapping_sub(hash));
    }
    (hash.unsigned_abs() as usize) % palette_len
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::NewTask;

    fn task(id: &str, parent: &str, status: TaskStatus, order: i64) -> Task {
        let mut task = Task::from_new(
            NewTask::new(parent, id.to_uppercase()).with_status(status),
            id.to_string(),
            Utc::now(),
        );
        task.order = order;
        task
    }

    fn fixture() -> Vec<Task> {
        vec![
            task("a", ROOT_TASK_ID, TaskStatus::NotStarted, 0),
            task("b", "a", TaskStatus::NotStarted, 0),
            task("c", "b", TaskStatus::InProgress, 0),
            task("d", "a", TaskStatus::NotStarted, 3),
            task("e", ROOT_TASK_ID, TaskStatus::NotStarted, 1),
        ]
    }

    #[test]
    fn path_walks_to_root() {
        let tasks = fixture();
        let ids: Vec<&str> = task_path(&tasks, "c").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn path_stops_at_broken_link() {
        let mut tasks = fixture();
        tasks[1].parent_id = "ghost".to_string();
        let ids: Vec<&str> = task_path(&tasks, "c").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert!(task_path(&tasks, "missing").is_empty());
    }

    #[test]
    fn path_terminates_on_corrupt_loop() {
        let mut tasks = fixture();
        tasks[0].parent_id = "c".to_string();
        let path = task_path(&tasks, "c");
        let unique: HashSet<&str> = path.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(unique.len(), path.len());
        assert_eq!(path.len(), 3);
    }

    #[test]
    fn collection_validation() {
        let mut tasks = fixture();
        assert!(validate_collection(&tasks).is_ok());

        tasks[0].parent_id = "c".to_string();
        assert!(matches!(
            validate_collection(&tasks),
            Err(Error::CycleRejected { .. })
        ));

        let mut tasks = fixture();
        tasks[4].parent_id = "ghost".to_string();
        assert!(matches!(
            validate_collection(&tasks),
            Err(Error::ParentNotFound(_))
        ));

        let mut tasks = fixture();
        tasks.push(tasks[0].clone());
        assert!(matches!(
            validate_collection(&tasks),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn cycle_detection() {
        let tasks = fixture();
        assert!(would_create_cycle(&tasks, "a", "b"));
        assert!(would_create_cycle(&tasks, "a", "c"));
        assert!(would_create_cycle(&tasks, "b", "b"));
        assert!(!would_create_cycle(&tasks, "b", "e"));
        assert!(!would_create_cycle(&tasks, "c", "a"));
        assert!(!would_create_cycle(&tasks, "a", ROOT_TASK_ID));
    }

    #[test]
    fn subtree_contains_exact_descendants() {
        let tasks = fixture();
        let mut ids = subtree_ids(&tasks, "a");
        ids.sort();
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
        assert_eq!(subtree_ids(&tasks, "e"), vec!["e"]);
    }

    #[test]
    fn next_order_is_max_plus_one_per_bucket() {
        let tasks = fixture();
        assert_eq!(next_order(&tasks, "a", TaskStatus::NotStarted), 4);
        assert_eq!(next_order(&tasks, "a", TaskStatus::InProgress), 0);
        assert_eq!(next_order(&tasks, ROOT_TASK_ID, TaskStatus::NotStarted), 2);
    }

    #[test]
    fn completed_age_uses_cutoff() {
        let now = Utc::now();
        let mut done = task("x", "a", TaskStatus::Completed, 0);
        done.completed_at = Some(now - Duration::days(8));
        assert!(is_completed_older_than(&done, 7, now));
        done.completed_at = Some(now - Duration::days(6));
        assert!(!is_completed_older_than(&done, 7, now));
        done.completed_at = None;
        assert!(!is_completed_older_than(&done, 7, now));
    }

    #[test]
    fn completed_ago_text_picks_unit() {
        let now = Utc::now();
        let mut done = task("x", "a", TaskStatus::Completed, 0);
        done.completed_at = Some(now - Duration::days(1) - Duration::hours(2));
        assert_eq!(completed_ago_text(&done, now).unwrap(), "Completed 1 day ago");
        done.completed_at = Some(now - Duration::hours(3));
        assert_eq!(completed_ago_text(&done, now).unwrap(), "Completed 3 hours ago");
        done.completed_at = Some(now - Duration::minutes(1));
        assert_eq!(completed_ago_text(&done, now).unwrap(), "Completed 1 min ago");
        done.completed_at = None;
        assert!(completed_ago_text(&done, now).is_none());
    }

    #[test]
    fn overdue_ignores_completed() {
        let now = Utc::now();
        let mut t = task("x", "a", TaskStatus::InProgress, 0);
        t.due_date = Some(now - Duration::hours(1));
        assert!(is_overdue(&t, now));
        t.status = TaskStatus::Completed;
        assert!(!is_overdue(&t, now));
        t.status = TaskStatus::InProgress;
        t.due_date = Some(now + Duration::hours(1));
        assert!(!is_overdue(&t, now));
    }

    #[test]
    fn breadcrumb_truncates_middle() {
        let tasks = fixture();
        let path = task_path(&tasks, "c");
        assert_eq!(format_breadcrumb(&path, 50), "Root › A › B › C");
        assert_eq!(format_breadcrumb(&path, 10), "Root › … › C");
        assert_eq!(format_breadcrumb(&[], 10), "Root");

        let mut long = task("l", ROOT_TASK_ID, TaskStatus::NotStarted, 0);
        long.title = "A very long life area title".to_string();
        let crumb = format_breadcrumb(&[&long], 12);
        assert_eq!(crumb.chars().count(), 12);
        assert!(crumb.ends_with('…'));
    }

    #[test]
    fn title_validation() {
        assert!(validate_title("  ok  ").is_ok());
        assert!(matches!(validate_title("   "), Err(Error::InvalidTitle(_))));
        assert!(validate_title(&"x".repeat(200)).is_ok());
        assert!(matches!(
            validate_title(&"x".repeat(201)),
            Err(Error::InvalidTitle(_))
        ));
    }

    #[test]
    fn theme_index_is_stable_and_bounded() {
        assert_eq!(theme_index("career", 8), theme_index("career", 8));
        for id in ["career", "health", "finances", ""] {
            assert!(theme_index(id, 8) < 8);
        }
        assert_eq!(theme_index("x", 0), 0);
        assert!(PALETTE.contains(&theme_name("health")));
    }

    #[test]
    fn due_urgency_bands() {
        let now = Utc::now();
        assert_eq!(due_urgency(now - Duration::days(2), now), DueUrgency::Overdue);
        assert_eq!(due_urgency(now + Duration::hours(5), now), DueUrgency::Urgent);
        assert_eq!(due_urgency(now + Duration::days(3), now), DueUrgency::Urgent);
        assert_eq!(due_urgency(now + Duration::days(5), now), DueUrgency::ThisWeek);
        assert_eq!(due_urgency(now + Duration::days(30), now), DueUrgency::Future);
    }
}
