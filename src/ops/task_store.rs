use std::collections::{HashMap, HashSet};

use chrono::Utc;

use crate::io::persistence::{load_tasks, save_tasks};
use crate::io::storage::{KeyValueStore, StorageError};
use crate::model::task::{Task, TaskFields, TaskId};

/// Error type for task store mutations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task title must not be empty")]
    EmptyTitle,
    /// Every id above the highest stored one is taken.
    #[error("no task ids left above {0}")]
    IdsExhausted(TaskId),
    /// The in-memory change was applied but could not be written.
    #[error("could not save tasks: {0}")]
    Storage(#[from] StorageError),
}

/// The ordered task collection and the storage it writes through to.
///
/// Order is the manual sort order of the active list. Every mutation that
/// changes something saves the whole collection before returning; a lookup
/// of an id that is not present changes nothing and reports `None`/`false`.
pub struct TaskStore<S: KeyValueStore> {
    storage: S,
    tasks: Vec<Task>,
    last_id: TaskId,
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Load the tasks held in `storage`. Unreadable data yields an empty store.
    pub fn open(mut storage: S) -> Self {
        let tasks = load_tasks(&mut storage);
        let last_id = tasks.iter().map(|t| t.id).max().unwrap_or(0);
        TaskStore {
            storage,
            tasks,
            last_id,
        }
    }

    /// All tasks in store order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The underlying key-value namespace, shared with selection state.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Append a new, not-completed task and return it.
    pub fn create(&mut self, fields: TaskFields) -> Result<&Task, StoreError> {
        if fields.is_blank() {
            return Err(StoreError::EmptyTitle);
        }
        let id = self.next_id()?;
        self.tasks.push(Task::new(id, fields));
        tracing::debug!(id, "task created");
        self.persist()?;
        let idx = self.tasks.len() - 1;
        Ok(&self.tasks[idx])
    }

    /// Overwrite title, description, due date and tags of task `id` in place.
    /// Returns `None` if there is no such task.
    pub fn update(&mut self, id: TaskId, fields: TaskFields) -> Result<Option<&Task>, StoreError> {
        if fields.is_blank() {
            return Err(StoreError::EmptyTitle);
        }
        let Some(idx) = self.index_of(id) else {
            tracing::debug!(id, "update of unknown task ignored");
            return Ok(None);
        };
        self.tasks[idx].apply(fields);
        tracing::debug!(id, "task updated");
        self.persist()?;
        Ok(Some(&self.tasks[idx]))
    }

    /// Mark task `id` completed or not. Completing stamps `completed_at`;
    /// reopening clears it. Setting the current value again writes nothing.
    pub fn set_completed(&mut self, id: TaskId, value: bool) -> Result<Option<&Task>, StoreError> {
        let Some(idx) = self.index_of(id) else {
            tracing::debug!(id, "completion change of unknown task ignored");
            return Ok(None);
        };
        let task = &mut self.tasks[idx];
        if task.completed == value {
            return Ok(Some(&self.tasks[idx]));
        }
        task.completed = value;
        task.completed_at = value.then(Utc::now);
        tracing::debug!(id, completed = value, "task completion changed");
        self.persist()?;
        Ok(Some(&self.tasks[idx]))
    }

    /// Flip the completion state of task `id`.
    pub fn toggle(&mut self, id: TaskId) -> Result<Option<&Task>, StoreError> {
        match self.get(id).map(|t| t.completed) {
            Some(completed) => self.set_completed(id, !completed),
            None => Ok(None),
        }
    }

    /// Remove task `id`. Returns whether a task was removed; removing a
    /// missing id is not an error.
    pub fn delete(&mut self, id: TaskId) -> Result<bool, StoreError> {
        let Some(idx) = self.index_of(id) else {
            return Ok(false);
        };
        self.tasks.remove(idx);
        tracing::debug!(id, "task deleted");
        self.persist()?;
        Ok(true)
    }

    /// Reorder so the named tasks follow `ids`.
    ///
    /// Only the positions currently held by the named tasks are rewritten;
    /// every task not named keeps its slot, so reordering a filtered view
    /// never drops the tasks it hides. Unknown ids are ignored and a
    /// repeated id counts once. Returns whether the order changed.
    pub fn reorder(&mut self, ids: &[TaskId]) -> Result<bool, StoreError> {
        let present: HashSet<TaskId> = self.tasks.iter().map(|t| t.id).collect();
        let mut named = HashSet::new();
        let requested: Vec<TaskId> = ids
            .iter()
            .copied()
            .filter(|id| present.contains(id) && named.insert(*id))
            .collect();

        let before: Vec<TaskId> = self.tasks.iter().map(|t| t.id).collect();
        let mut moving = HashMap::new();
        let mut layout = Vec::with_capacity(self.tasks.len());
        for task in std::mem::take(&mut self.tasks) {
            if named.contains(&task.id) {
                moving.insert(task.id, task);
                layout.push(None);
            } else {
                layout.push(Some(task));
            }
        }

        let mut fill = requested.into_iter().filter_map(|id| moving.remove(&id));
        for slot in layout {
            match slot {
                Some(task) => self.tasks.push(task),
                None => {
                    if let Some(task) = fill.next() {
                        self.tasks.push(task);
                    }
                }
            }
        }

        let changed = self.tasks.iter().map(|t| t.id).ne(before.iter().copied());
        if changed {
            tracing::debug!(count = named.len(), "tasks reordered");
            self.persist()?;
        }
        Ok(changed)
    }

    /// Move active task `id` to position `index` of the active list (the
    /// drop at the end of a drag). Indices past the end move it last.
    /// Returns false if `id` is not an active task.
    pub fn move_to(&mut self, id: TaskId, index: usize) -> Result<bool, StoreError> {
        let mut active: Vec<TaskId> = self
            .tasks
            .iter()
            .filter(|t| !t.completed)
            .map(|t| t.id)
            .collect();
        let Some(from) = active.iter().position(|&a| a == id) else {
            return Ok(false);
        };
        active.remove(from);
        active.insert(index.min(active.len()), id);
        self.reorder(&active)?;
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn index_of(&self, id: TaskId) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    /// Next id: creation time in milliseconds, strictly above every id
    /// issued or loaded so far.
    fn next_id(&mut self) -> Result<TaskId, StoreError> {
        let floor = self
            .last_id
            .checked_add(1)
            .ok_or(StoreError::IdsExhausted(self.last_id))?;
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let id = now.max(floor);
        self.last_id = id;
        Ok(id)
    }

    fn persist(&mut self) -> Result<(), StoreError> {
        save_tasks(&mut self.storage, &self.tasks)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::persistence::TASKS_KEY;
    use crate::io::storage::MemoryStore;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn store_with(titles: &[&str]) -> TaskStore<MemoryStore> {
        let mut store = TaskStore::open(MemoryStore::new());
        for title in titles {
            store.create(TaskFields::new(*title)).unwrap();
        }
        store
    }

    fn ids(store: &TaskStore<MemoryStore>) -> Vec<TaskId> {
        store.tasks().iter().map(|t| t.id).collect()
    }

    fn titles(store: &TaskStore<MemoryStore>) -> Vec<String> {
        store.tasks().iter().map(|t| t.title.clone()).collect()
    }

    fn reloaded(store: &TaskStore<MemoryStore>) -> Vec<Task> {
        TaskStore::open(store.storage().clone()).tasks().to_vec()
    }

    // --- create ---

    #[test]
    fn create_appends_with_fresh_id() {
        let mut store = store_with(&["A", "B"]);
        let existing = ids(&store);

        let task = store
            .create(TaskFields::new("C").with_tags(["home"]))
            .unwrap()
            .clone();
        assert!(!existing.contains(&task.id));
        assert!(task.id > *existing.iter().max().unwrap());
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
        assert_eq!(store.tasks().last(), Some(&task));
        assert_eq!(reloaded(&store), store.tasks());
    }

    #[test]
    fn ids_stay_unique_in_a_burst() {
        let store = store_with(&["a", "b", "c", "d", "e", "f"]);
        let mut seen = ids(&store);
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 6);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut store = store_with(&["A"]);
        let first = store.tasks()[0].id;
        store.delete(first).unwrap();
        let second = store.create(TaskFields::new("B")).unwrap().id;
        assert_ne!(first, second);
    }

    #[test]
    fn create_rejects_blank_title() {
        let mut store = store_with(&[]);
        assert!(matches!(
            store.create(TaskFields::new("   ")),
            Err(StoreError::EmptyTitle)
        ));
        assert!(store.is_empty());
    }

    // --- update ---

    #[test]
    fn update_overwrites_fields_in_place() {
        let mut store = store_with(&["A", "B", "C"]);
        let id = store.tasks()[1].id;
        store.set_completed(id, true).unwrap();
        let stamped = store.get(id).unwrap().completed_at;

        let due = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let updated = store
            .update(
                id,
                TaskFields::new("B2")
                    .with_description("more")
                    .with_due_date(due)
                    .with_tags(["x"]),
            )
            .unwrap()
            .unwrap()
            .clone();

        assert_eq!(updated.id, id);
        assert_eq!(updated.title, "B2");
        assert_eq!(updated.description.as_deref(), Some("more"));
        assert_eq!(updated.due_date, Some(due));
        assert_eq!(updated.tags, vec!["x"]);
        assert!(updated.completed);
        assert_eq!(updated.completed_at, stamped);
        assert_eq!(titles(&store), vec!["A", "B2", "C"]);
        assert_eq!(reloaded(&store), store.tasks());
    }

    #[test]
    fn update_clears_optional_fields() {
        let mut store = TaskStore::open(MemoryStore::new());
        let id = store
            .create(
                TaskFields::new("A")
                    .with_description("d")
                    .with_due_date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()),
            )
            .unwrap()
            .id;
        let task = store.update(id, TaskFields::new("A")).unwrap().unwrap();
        assert_eq!(task.description, None);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let mut store = store_with(&["A"]);
        let before = store.tasks().to_vec();
        assert!(store.update(999, TaskFields::new("Z")).unwrap().is_none());
        assert_eq!(store.tasks(), before.as_slice());
    }

    // --- completion ---

    #[test]
    fn completion_round_trip_restamps() {
        let mut store = store_with(&["A"]);
        let id = store.tasks()[0].id;

        let first = store.set_completed(id, true).unwrap().unwrap().completed_at;
        assert!(first.is_some());

        let reopened = store.set_completed(id, false).unwrap().unwrap();
        assert!(!reopened.completed);
        assert!(reopened.completed_at.is_none());

        let again = store.set_completed(id, true).unwrap().unwrap();
        assert!(again.completed);
        assert!(again.completed_at >= first);
    }

    #[test]
    fn setting_same_completion_writes_nothing() {
        let mut store = TaskStore::open(MemoryStore::new());
        let id = store.create(TaskFields::new("A")).unwrap().id;
        let stamp = store.set_completed(id, true).unwrap().unwrap().completed_at;

        // Swap in a read-only copy: any write would now fail.
        let snapshot = store.storage().get(TASKS_KEY).unwrap();
        let mut frozen =
            TaskStore::open(MemoryStore::read_only([(TASKS_KEY.to_string(), snapshot)]));
        let task = frozen.set_completed(id, true).unwrap().unwrap();
        assert_eq!(task.completed_at, stamp);
    }

    #[test]
    fn toggle_flips_and_reports_missing() {
        let mut store = store_with(&["A"]);
        let id = store.tasks()[0].id;
        assert!(store.toggle(id).unwrap().unwrap().completed);
        assert!(!store.toggle(id).unwrap().unwrap().completed);
        assert!(store.toggle(12345).unwrap().is_none());
    }

    // --- delete ---

    #[test]
    fn delete_removes_and_is_idempotent() {
        let mut store = store_with(&["A", "B"]);
        let id = store.tasks()[0].id;
        assert!(store.delete(id).unwrap());
        assert_eq!(titles(&store), vec!["B"]);

        let before = store.tasks().to_vec();
        assert!(!store.delete(id).unwrap());
        assert!(!store.delete(424242).unwrap());
        assert_eq!(store.tasks(), before.as_slice());
        assert_eq!(reloaded(&store), before);
    }

    // --- reorder ---

    #[test]
    fn reorder_full_sequence() {
        let mut store = store_with(&["A", "B", "C"]);
        let v = ids(&store);
        assert!(store.reorder(&[v[2], v[0], v[1]]).unwrap());
        assert_eq!(titles(&store), vec!["C", "A", "B"]);
        assert_eq!(reloaded(&store), store.tasks());
    }

    #[test]
    fn reorder_keeps_unnamed_tasks_in_their_slots() {
        let mut store = store_with(&["A", "B", "C", "D", "E"]);
        let v = ids(&store);
        // A filtered view showing only A, C, E is reordered to E, A, C.
        store.reorder(&[v[4], v[0], v[2]]).unwrap();
        assert_eq!(titles(&store), vec!["E", "B", "A", "D", "C"]);
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn reorder_ignores_unknown_and_repeated_ids() {
        let mut store = store_with(&["A", "B", "C"]);
        let v = ids(&store);
        store.reorder(&[v[1], 7, v[1], v[0]]).unwrap();
        assert_eq!(titles(&store), vec!["B", "A", "C"]);
    }

    #[test]
    fn reorder_to_same_order_reports_no_change() {
        let mut store = store_with(&["A", "B"]);
        let v = ids(&store);
        assert!(!store.reorder(&v).unwrap());
        assert!(!store.reorder(&[]).unwrap());
    }

    #[test]
    fn move_to_reorders_active_list_only() {
        let mut store = store_with(&["A", "B", "C", "D"]);
        let v = ids(&store);
        store.set_completed(v[1], true).unwrap();

        // Active list is A, C, D; move D to the front.
        assert!(store.move_to(v[3], 0).unwrap());
        assert_eq!(titles(&store), vec!["D", "B", "A", "C"]);

        assert!(store.move_to(v[3], 99).unwrap());
        assert_eq!(titles(&store), vec!["A", "B", "C", "D"]);

        // Completed tasks are not in the active list.
        assert!(!store.move_to(v[1], 0).unwrap());
    }

    // --- failure surfaces ---

    #[test]
    fn write_failure_is_reported_but_change_is_kept() {
        let mut store = TaskStore::open(MemoryStore::read_only([]));
        let result = store.create(TaskFields::new("A"));
        assert!(matches!(result, Err(StoreError::Storage(StorageError::ReadOnly))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn create_after_largest_id_is_an_error() {
        let mut storage = MemoryStore::new();
        storage
            .set(TASKS_KEY, r#"[{"id":18446744073709551615,"title":"max"}]"#.into())
            .unwrap();
        let mut store = TaskStore::open(storage);
        assert_eq!(store.len(), 1);

        let result = store.create(TaskFields::new("next"));
        assert!(matches!(result, Err(StoreError::IdsExhausted(u64::MAX))));
        assert_eq!(ids(&store), vec![u64::MAX]);
        assert_eq!(reloaded(&store).len(), 1);
    }

    #[test]
    fn open_on_corrupt_data_starts_empty_and_accepts_writes() {
        let mut storage = MemoryStore::new();
        storage.set(TASKS_KEY, "definitely not json".into()).unwrap();
        let mut store = TaskStore::open(storage);
        assert!(store.is_empty());
        store.create(TaskFields::new("fresh")).unwrap();
        assert_eq!(reloaded(&store).len(), 1);
    }
}
