//! Task and comment types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A task together with its comment thread.
///
/// `comments` is always present; a task without comments carries an empty
/// list and serializes as `[]`, never `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

impl Task {
    pub fn new(id: i64, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            comments: Vec::new(),
        }
    }

    /// Put comments in thread order: oldest first, ties broken by id.
    pub fn sort_comments(&mut self) {
        self.comments
            .sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    }
}

/// A comment on a task. Ids and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub task_id: i64,
    pub author: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Task fields supplied by a client on create and update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl NewTask {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Both name and description must be non-empty.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty() && !self.description.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn comment(id: i64, secs: i64) -> Comment {
        Comment {
            id,
            task_id: 1,
            author: 7,
            text: format!("comment {}", id),
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_comments_serialize_as_array() {
        let task = Task::new(1, "Alpha", "first");
        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["comments"], serde_json::json!([]));
    }

    #[test]
    fn test_missing_comments_deserialize_as_empty() {
        let task: Task =
            serde_json::from_str(r#"{"id":3,"name":"a","description":"b"}"#).unwrap();
        assert!(task.comments.is_empty());
    }

    #[test]
    fn test_sort_comments_by_time_then_id() {
        let mut task = Task::new(1, "Alpha", "first");
        task.comments = vec![comment(3, 20), comment(2, 10), comment(1, 10)];
        task.sort_comments();

        let ids: Vec<i64> = task.comments.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_new_task_completeness() {
        assert!(NewTask::new("a", "b").is_complete());
        assert!(!NewTask::new("", "b").is_complete());
        assert!(!NewTask::new("a", "   ").is_complete());
    }
}
