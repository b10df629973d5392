use std::collections::HashSet;

use chrono::Utc;

use crate::io::storage::{KeyValueStore, StorageError};
use crate::model::task::Task;

/// Key holding the JSON array of tasks
pub const TASKS_KEY: &str = "tasks";

/// Key an unreadable `tasks` payload is moved to before the list resets
pub const RECOVERED_KEY: &str = "tasks.recovered";

/// Load the task list from `store`.
///
/// Never fails: a missing key is an empty list, and a payload that does not
/// parse is copied to [`RECOVERED_KEY`] and treated as empty. Records are
/// normalized on the way in (completion timestamps synced, repeated ids
/// dropped after the first).
pub fn load_tasks<S: KeyValueStore + ?Sized>(store: &mut S) -> Vec<Task> {
    let Some(raw) = store.get(TASKS_KEY) else {
        return Vec::new();
    };

    let parsed: Vec<Task> = match serde_json::from_str(&raw) {
        Ok(tasks) => tasks,
        Err(e) => {
            tracing::warn!(error = %e, "stored tasks are unreadable, starting with an empty list");
            if let Err(e) = store.set(RECOVERED_KEY, raw) {
                tracing::warn!(error = %e, "could not preserve unreadable tasks");
            }
            return Vec::new();
        }
    };

    let now = Utc::now();
    let mut seen = HashSet::new();
    let mut tasks = Vec::with_capacity(parsed.len());
    for mut task in parsed {
        if !seen.insert(task.id) {
            tracing::warn!(id = task.id, title = %task.title, "dropping task with repeated id");
            continue;
        }
        if task.sync_completion(now) {
            tracing::debug!(id = task.id, "completion timestamp resynced on load");
        }
        tasks.push(task);
    }
    tracing::debug!(count = tasks.len(), "tasks loaded");
    tasks
}

/// Replace the stored task list with `tasks`, in order.
pub fn save_tasks<S: KeyValueStore + ?Sized>(store: &mut S, tasks: &[Task]) -> Result<(), StorageError> {
    let json = serde_json::to_string(tasks)?;
    store.set(TASKS_KEY, json)?;
    tracing::debug!(count = tasks.len(), "tasks saved");
    Ok(())
}
