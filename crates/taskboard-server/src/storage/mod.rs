//! Storage layer
//!
//! SQLite (embedded) is the store of record for tasks, comments and users.
//! The handlers never talk to it directly; they go through the task
//! coordinator, which depends only on the traits below.

pub mod db;
pub mod password;
pub mod retry;
mod tasks;
mod users;

pub use db::Database;

use crate::error::StoreError;
use async_trait::async_trait;
use taskboard_types::{Comment, Credentials, NewTask, Task, TaskQuery};

/// Durable task and comment operations
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn add_task(&self, task: &NewTask) -> Result<Task, StoreError>;

    /// Task with its full comment thread; `TaskNotFound` if absent.
    async fn get_task(&self, id: i64) -> Result<Task, StoreError>;

    /// Filtered, ordered, limited listing. No match is an empty vector.
    async fn get_selected_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError>;

    async fn update_task(&self, id: i64, task: &NewTask) -> Result<Task, StoreError>;

    async fn delete_task(&self, id: i64) -> Result<(), StoreError>;

    async fn add_comment(&self, task_id: i64, author: i64, text: &str)
        -> Result<Comment, StoreError>;
}

/// Durable user credential operations
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Store a new user with a hashed password and return its id.
    async fn insert_user(&self, credentials: &Credentials) -> Result<i64, StoreError>;

    /// Id of the user if the password matches.
    async fn check_user(&self, credentials: &Credentials) -> Result<i64, StoreError>;
}
