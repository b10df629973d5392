use chrono::NaiveDate;

use crate::io::storage::{KeyValueStore, StorageError};
use crate::model::prefs::Theme;
use crate::model::task::{Task, parse_day};

/// Last tag the user picked, read by the tagged view
pub const SELECTED_TAG_KEY: &str = "selectedTag";
/// Snapshot of the task opened for editing
pub const EDITING_TASK_KEY: &str = "editingTask";
pub const THEME_KEY: &str = "theme";
pub const SIDEBAR_COLLAPSED_KEY: &str = "sidebarCollapsed";

// ---------------------------------------------------------------------------
// Selected tag
// ---------------------------------------------------------------------------

/// The last selected tag, if any. Never cleared automatically.
pub fn read_selected_tag<S: KeyValueStore + ?Sized>(store: &S) -> Option<String> {
    store.get(SELECTED_TAG_KEY).filter(|t| !t.is_empty())
}

pub fn write_selected_tag<S: KeyValueStore + ?Sized>(
    store: &mut S,
    tag: &str,
) -> Result<(), StorageError> {
    store.set(SELECTED_TAG_KEY, tag.to_string())
}

// ---------------------------------------------------------------------------
// Editing snapshot
// ---------------------------------------------------------------------------

/// Record `task` as the one being edited, replacing any earlier snapshot.
pub fn write_editing_task<S: KeyValueStore + ?Sized>(
    store: &mut S,
    task: &Task,
) -> Result<(), StorageError> {
    let json = serde_json::to_string(task)?;
    store.set(EDITING_TASK_KEY, json)
}

/// Read the editing snapshot without consuming it.
pub fn peek_editing_task<S: KeyValueStore + ?Sized>(store: &S) -> Option<Task> {
    let raw = store.get(EDITING_TASK_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(task) => Some(task),
        Err(e) => {
            tracing::warn!(error = %e, "ignoring unreadable editing snapshot");
            None
        }
    }
}

/// Read and clear the editing snapshot. A second call returns `None`.
pub fn take_editing_task<S: KeyValueStore + ?Sized>(
    store: &mut S,
) -> Result<Option<Task>, StorageError> {
    let task = peek_editing_task(store);
    if store.get(EDITING_TASK_KEY).is_some() {
        store.remove(EDITING_TASK_KEY)?;
    }
    Ok(task)
}

// ---------------------------------------------------------------------------
// Preferences
// ---------------------------------------------------------------------------

/// Stored theme; dark when absent or unrecognized.
pub fn read_theme<S: KeyValueStore + ?Sized>(store: &S) -> Theme {
    store
        .get(THEME_KEY)
        .and_then(|t| Theme::parse(&t))
        .unwrap_or_default()
}

pub fn write_theme<S: KeyValueStore + ?Sized>(store: &mut S, theme: Theme) -> Result<(), StorageError> {
    store.set(THEME_KEY, theme.as_str().to_string())
}

/// Only the exact string `"true"` counts as collapsed.
pub fn read_sidebar_collapsed<S: KeyValueStore + ?Sized>(store: &S) -> bool {
    store.get(SIDEBAR_COLLAPSED_KEY).as_deref() == Some("true")
}

pub fn write_sidebar_collapsed<S: KeyValueStore + ?Sized>(
    store: &mut S,
    collapsed: bool,
) -> Result<(), StorageError> {
    store.set(SIDEBAR_COLLAPSED_KEY, collapsed.to_string())
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Interpret the calendar's `date` navigation parameter. Unparseable or
/// absent values select nothing.
pub fn date_param(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?;
    match parse_day(raw) {
        Ok(day) => Some(day),
        Err(e) => {
            tracing::debug!(value = raw, error = %e, "ignoring date parameter");
            None
        }
    }
}
