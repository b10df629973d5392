use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Task identifier. Assigned once at creation from the creation time in
/// milliseconds, bumped past any id already issued.
pub type TaskId = u64;

/// A task record, as held by the store and persisted under the `tasks` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    /// Free-form notes. Never `Some("")`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_text"
    )]
    pub description: Option<String>,
    /// Calendar day the task is due; `None` means unscheduled.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "optional_day"
    )]
    pub due_date: Option<NaiveDate>,
    /// Tag labels in entry order (duplicates allowed)
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub completed: bool,
    /// Set exactly when `completed` is true
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Build a fresh, not-completed task from user-entered fields.
    pub fn new(id: TaskId, fields: TaskFields) -> Self {
        let mut task = Task {
            id,
            title: String::new(),
            description: None,
            due_date: None,
            tags: Vec::new(),
            completed: false,
            completed_at: None,
        };
        task.apply(fields);
        task
    }

    /// Overwrite the editable fields, leaving id and completion untouched.
    pub fn apply(&mut self, fields: TaskFields) {
        let fields = fields.normalized();
        self.title = fields.title;
        self.description = fields.description;
        self.due_date = fields.due_date;
        self.tags = fields.tags;
    }

    /// The editable fields of this task, e.g. to pre-fill an edit form.
    pub fn fields(&self) -> TaskFields {
        TaskFields {
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            tags: self.tags.clone(),
        }
    }

    pub fn is_due_on(&self, day: NaiveDate) -> bool {
        self.due_date == Some(day)
    }

    /// Exact, case-sensitive tag membership.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Bring `completed_at` back in line with `completed` after a load.
    /// Returns true if anything changed.
    pub fn sync_completion(&mut self, now: DateTime<Utc>) -> bool {
        match (self.completed, self.completed_at) {
            (true, None) => {
                self.completed_at = Some(now);
                true
            }
            (false, Some(_)) => {
                self.completed_at = None;
                true
            }
            _ => false,
        }
    }
}

/// The user-editable part of a task: what a create or edit form submits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFields {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub tags: Vec<String>,
}

impl TaskFields {
    pub fn new(title: impl Into<String>) -> Self {
        TaskFields {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_due_date(mut self, due: NaiveDate) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// True if the title is blank once trimmed
    pub fn is_blank(&self) -> bool {
        self.title.trim().is_empty()
    }

    /// Trim the title and description; an empty description becomes `None`.
    pub fn normalized(self) -> Self {
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        TaskFields {
            title: self.title.trim().to_string(),
            description,
            due_date: self.due_date,
            tags: self.tags,
        }
    }
}

/// Parse a due date as entered or as stored: `YYYY-MM-DD`, optionally
/// followed by a `T...` time part which is ignored.
pub fn parse_day(s: &str) -> Result<NaiveDate, chrono::ParseError> {
    let day = s.trim().split('T').next().unwrap_or_default();
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
}

fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let text: Option<String> = Option::deserialize(deserializer)?;
    Ok(text.filter(|t| !t.is_empty()))
}

fn optional_day<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let text: Option<String> = Option::deserialize(deserializer)?;
    match text.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_day(s)
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid dueDate {:?}: {}", s, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_task_is_active_and_normalized() {
        let task = Task::new(
            7,
            TaskFields::new("  Write report ")
                .with_description("   ")
                .with_tags(["work", "work"]),
        );
        assert_eq!(task.id, 7);
        assert_eq!(task.title, "Write report");
        assert_eq!(task.description, None);
        assert_eq!(task.tags, vec!["work", "work"]);
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn serializes_camel_case_and_skips_absent_fields() {
        let task = Task::new(1, TaskFields::new("A").with_due_date(day(2024, 1, 10)));
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 1,
                "title": "A",
                "dueDate": "2024-01-10",
                "tags": [],
                "completed": false
            })
        );
    }

    #[test]
    fn reads_loosely_written_records() {
        let task: Task = serde_json::from_str(
            r#"{"id":1700000000000,"title":"Old","description":"","dueDate":"","tags":["x"]}"#,
        )
        .unwrap();
        assert_eq!(task.description, None);
        assert_eq!(task.due_date, None);
        assert!(!task.completed);

        let task: Task =
            serde_json::from_str(r#"{"id":2,"title":"T","dueDate":"2024-03-05T10:00:00.000Z"}"#)
                .unwrap();
        assert_eq!(task.due_date, Some(day(2024, 3, 5)));
        assert!(task.tags.is_empty());
    }

    #[test]
    fn rejects_garbage_due_date() {
        let result: Result<Task, _> =
            serde_json::from_str(r#"{"id":2,"title":"T","dueDate":"next tuesday"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn sync_completion_restores_invariant() {
        let now = Utc::now();
        let mut done: Task =
            serde_json::from_str(r#"{"id":1,"title":"A","completed":true}"#).unwrap();
        assert!(done.sync_completion(now));
        assert_eq!(done.completed_at, Some(now));
        assert!(!done.sync_completion(now));

        let mut open: Task = serde_json::from_str(
            r#"{"id":2,"title":"B","completed":false,"completedAt":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(open.sync_completion(now));
        assert_eq!(open.completed_at, None);
    }

    #[test]
    fn parse_day_accepts_time_suffix() {
        assert_eq!(parse_day("2024-02-29").unwrap(), day(2024, 2, 29));
        assert_eq!(parse_day("2024-02-29T23:59:00").unwrap(), day(2024, 2, 29));
        assert!(parse_day("2023-02-29").is_err());
        assert!(parse_day("").is_err());
    }
}
