use std::collections::BTreeMap;
use std::fmt;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::model::task::Task;

// ---------------------------------------------------------------------------
// List queries
// ---------------------------------------------------------------------------

/// Tasks not yet completed, in store order.
pub fn active_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|t| !t.completed).collect()
}

/// Completed tasks, in store order.
pub fn completed_tasks(tasks: &[Task]) -> Vec<&Task> {
    tasks.iter().filter(|t| t.completed).collect()
}

/// Every task due on `day`, completed or not. Comparison is by calendar
/// day only; unscheduled tasks never match.
pub fn tasks_for_date(tasks: &[Task], day: NaiveDate) -> Vec<&Task> {
    tasks.iter().filter(|t| t.is_due_on(day)).collect()
}

/// Active tasks carrying `tag` (exact, case-sensitive).
pub fn tasks_for_tag<'a>(tasks: &'a [Task], tag: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| !t.completed && t.has_tag(tag))
        .collect()
}

/// Active tasks due after tomorrow, grouped by due day in ascending order.
/// Tasks due today or tomorrow are not upcoming.
pub fn upcoming_grouped_by_date(tasks: &[Task], today: NaiveDate) -> BTreeMap<NaiveDate, Vec<&Task>> {
    let tomorrow = today.checked_add_days(Days::new(1)).unwrap_or(today);
    let mut groups: BTreeMap<NaiveDate, Vec<&Task>> = BTreeMap::new();
    for task in tasks.iter().filter(|t| !t.completed) {
        if let Some(due) = task.due_date
            && due > tomorrow
        {
            groups.entry(due).or_default().push(task);
        }
    }
    groups
}

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskCounts {
    pub completed: usize,
    pub active: usize,
}

impl TaskCounts {
    pub fn total(&self) -> usize {
        self.completed + self.active
    }

    /// Fraction of tasks completed, in `0.0..=1.0`; 0 for an empty store.
    pub fn progress(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.completed as f64 / total as f64,
        }
    }
}

pub fn task_counts(tasks: &[Task]) -> TaskCounts {
    let completed = tasks.iter().filter(|t| t.completed).count();
    TaskCounts {
        completed,
        active: tasks.len() - completed,
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// A list view the interface can show. Each one selects its tasks with one
/// of the queries above, so re-rendering after any mutation is a single
/// `select` call on whichever view is current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Active,
    Completed,
    /// Active tasks with the given tag; `None` when no tag is selected
    Tagged(Option<String>),
    Upcoming,
    Day(NaiveDate),
}

/// Tasks chosen by a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewResult<'a> {
    List(Vec<&'a Task>),
    Grouped(BTreeMap<NaiveDate, Vec<&'a Task>>),
}

impl ViewResult<'_> {
    pub fn is_empty(&self) -> bool {
        match self {
            ViewResult::List(tasks) => tasks.is_empty(),
            ViewResult::Grouped(groups) => groups.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ViewResult::List(tasks) => tasks.len(),
            ViewResult::Grouped(groups) => groups.values().map(Vec::len).sum(),
        }
    }
}

impl View {
    /// Run this view's query against a store snapshot.
    pub fn select<'a>(&self, tasks: &'a [Task], today: NaiveDate) -> ViewResult<'a> {
        match self {
            View::Active => ViewResult::List(active_tasks(tasks)),
            View::Completed => ViewResult::List(completed_tasks(tasks)),
            View::Tagged(Some(tag)) => ViewResult::List(tasks_for_tag(tasks, tag)),
            View::Tagged(None) => ViewResult::List(Vec::new()),
            View::Upcoming => ViewResult::Grouped(upcoming_grouped_by_date(tasks, today)),
            View::Day(day) => ViewResult::List(tasks_for_date(tasks, *day)),
        }
    }

    /// Text shown when the view selects nothing
    pub fn empty_message(&self) -> &'static str {
        match self {
            View::Active => "No tasks scheduled for today",
            View::Completed => "No completed tasks yet",
            View::Tagged(Some(_)) => "No active tasks with this tag",
            View::Tagged(None) => "No tag selected",
            View::Upcoming => "No upcoming tasks",
            View::Day(_) => "No tasks for this date",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::Active => write!(f, "Tasks"),
            View::Completed => write!(f, "Completed"),
            View::Tagged(Some(tag)) => write!(f, "Tasks with tag: {}", tag),
            View::Tagged(None) => write!(f, "Tags"),
            View::Upcoming => write!(f, "Upcoming"),
            View::Day(day) => write!(f, "{}", day.format("%Y-%m-%d")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::TaskFields;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(id: u64, title: &str) -> Task {
        Task::new(id, TaskFields::new(title))
    }

    fn due(id: u64, title: &str, on: NaiveDate) -> Task {
        Task::new(id, TaskFields::new(title).with_due_date(on))
    }

    fn done(mut t: Task) -> Task {
        t.completed = true;
        t.completed_at = Some(Utc::now());
        t
    }

    fn ids(tasks: &[&Task]) -> Vec<u64> {
        tasks.iter().map(|t| t.id).collect()
    }

    #[test]
    fn same_day_scenario() {
        let tasks = vec![
            due(1, "A", day(2024, 1, 10)),
            done(due(2, "B", day(2024, 1, 10))),
        ];
        assert_eq!(ids(&tasks_for_date(&tasks, day(2024, 1, 10))), vec![1, 2]);
        assert_eq!(ids(&active_tasks(&tasks)), vec![1]);
        assert_eq!(ids(&completed_tasks(&tasks)), vec![2]);
    }

    #[test]
    fn active_and_completed_partition_the_store() {
        let tasks = vec![
            task(1, "a"),
            done(task(2, "b")),
            task(3, "c"),
            done(task(4, "d")),
            task(5, "e"),
        ];
        assert_eq!(
            active_tasks(&tasks).len() + completed_tasks(&tasks).len(),
            tasks.len()
        );
        assert_eq!(ids(&active_tasks(&tasks)), vec![1, 3, 5]);
    }

    #[test]
    fn date_query_skips_unscheduled_and_other_days() {
        let tasks = vec![
            task(1, "unscheduled"),
            due(2, "other", day(2024, 1, 11)),
            due(3, "match", day(2024, 1, 10)),
        ];
        assert_eq!(ids(&tasks_for_date(&tasks, day(2024, 1, 10))), vec![3]);
        assert!(tasks_for_date(&tasks, day(2030, 1, 1)).is_empty());
    }

    #[test]
    fn tag_query_is_exact_and_skips_completed() {
        let tasks = vec![
            Task::new(1, TaskFields::new("a").with_tags(["Work"])),
            Task::new(2, TaskFields::new("b").with_tags(["home", "work"])),
            done(Task::new(3, TaskFields::new("c").with_tags(["work"]))),
            Task::new(4, TaskFields::new("d").with_tags(["workshop"])),
        ];
        assert_eq!(ids(&tasks_for_tag(&tasks, "work")), vec![2]);
        assert_eq!(ids(&tasks_for_tag(&tasks, "Work")), vec![1]);
    }

    #[test]
    fn upcoming_excludes_today_and_tomorrow() {
        let today = day(2024, 3, 30);
        let tasks = vec![
            due(1, "today", today),
            due(2, "tomorrow", day(2024, 3, 31)),
            due(3, "in two days", day(2024, 4, 1)),
            due(4, "yesterday", day(2024, 3, 29)),
            done(due(5, "done later", day(2024, 4, 5))),
            task(6, "unscheduled"),
        ];
        let groups = upcoming_grouped_by_date(&tasks, today);
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec![day(2024, 4, 1)]);
        assert_eq!(ids(&groups[&day(2024, 4, 1)]), vec![3]);
    }

    #[test]
    fn upcoming_groups_ascending_in_store_order() {
        let today = day(2024, 1, 1);
        let tasks = vec![
            due(1, "late", day(2024, 2, 1)),
            due(2, "early", day(2024, 1, 5)),
            due(3, "late too", day(2024, 2, 1)),
        ];
        let groups = upcoming_grouped_by_date(&tasks, today);
        let keys: Vec<_> = groups.keys().copied().collect();
        assert_eq!(keys, vec![day(2024, 1, 5), day(2024, 2, 1)]);
        assert_eq!(ids(&groups[&day(2024, 2, 1)]), vec![1, 3]);
    }

    #[test]
    fn counts_on_empty_store() {
        let counts = task_counts(&[]);
        assert_eq!(
            counts,
            TaskCounts {
                completed: 0,
                active: 0
            }
        );
        assert_eq!(counts.progress(), 0.0);
    }

    #[test]
    fn counts_and_progress() {
        let tasks = vec![task(1, "a"), done(task(2, "b")), task(3, "c"), task(4, "d")];
        let counts = task_counts(&tasks);
        assert_eq!(counts.completed, 1);
        assert_eq!(counts.active, 3);
        assert_eq!(counts.progress(), 0.25);
    }

    #[test]
    fn view_select_dispatches_to_queries() {
        let today = day(2024, 1, 1);
        let tasks = vec![
            Task::new(1, TaskFields::new("a").with_tags(["x"]).with_due_date(day(2024, 1, 9))),
            done(task(2, "b")),
        ];
        assert_eq!(View::Active.select(&tasks, today).len(), 1);
        assert_eq!(View::Completed.select(&tasks, today).len(), 1);
        assert_eq!(View::Tagged(Some("x".into())).select(&tasks, today).len(), 1);
        assert!(View::Tagged(None).select(&tasks, today).is_empty());
        assert!(matches!(
            View::Upcoming.select(&tasks, today),
            ViewResult::Grouped(ref g) if g.len() == 1
        ));
        assert_eq!(View::Day(day(2024, 1, 9)).select(&tasks, today).len(), 1);
    }

    #[test]
    fn view_labels() {
        assert_eq!(View::Tagged(Some("home".into())).to_string(), "Tasks with tag: home");
        assert_eq!(View::Tagged(None).empty_message(), "No tag selected");
        assert_eq!(View::Day(day(2024, 1, 9)).to_string(), "2024-01-09");
    }
}
