//! Task and comment queries

use super::db::is_foreign_key_violation;
use super::{Database, TaskStore};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use taskboard_types::{Comment, NewTask, Task, TaskQuery};
use tracing::debug;

/// Task columns plus the comment thread folded into one JSON array.
/// Tasks without comments get `[]`, never NULL.
const TASK_SELECT: &str = r#"
    SELECT
        t.id, t.name, t.description,
        COALESCE(
            json_group_array(
                json_object(
                    'id', c.id,
                    'task_id', c.task_id,
                    'author', c.author,
                    'text', c.text,
                    'created_at', c.created_at
                )
            ) FILTER (WHERE c.id IS NOT NULL),
            '[]'
        ) AS comments
    FROM tasks t
    LEFT JOIN comments c ON c.task_id = t.id
"#;

#[async_trait]
impl TaskStore for Database {
    async fn add_task(&self, task: &NewTask) -> Result<Task, StoreError> {
        let (id, name, description): (i64, String, String) = sqlx::query_as(
            r#"
            INSERT INTO tasks (name, description)
            VALUES (?1, ?2)
            RETURNING id, name, description
            "#,
        )
        .bind(&task.name)
        .bind(&task.description)
        .fetch_one(&self.pool)
        .await?;

        debug!(task_id = id, "Inserted task");

        Ok(Task::new(id, name, description))
    }

    async fn get_task(&self, id: i64) -> Result<Task, StoreError> {
        let mut conn = self.pool.acquire().await?;
        fetch_task(&mut conn, id).await
    }

    async fn get_selected_tasks(&self, query: &TaskQuery) -> Result<Vec<Task>, StoreError> {
        let mut builder = build_selection(query);

        let rows: Vec<TaskRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn update_task(&self, id: i64, task: &NewTask) -> Result<Task, StoreError> {
        // write and re-read commit together or not at all
        let mut tx = self.pool.begin().await?;

        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM tasks WHERE id = ?1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if exists == 0 {
            return Err(StoreError::TaskNotFound(id));
        }

        sqlx::query("UPDATE tasks SET name = ?1, description = ?2 WHERE id = ?3")
            .bind(&task.name)
            .bind(&task.description)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let updated = fetch_task(&mut tx, id).await?;
        tx.commit().await?;

        debug!(task_id = id, "Updated task");

        Ok(updated)
    }

    async fn delete_task(&self, id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::TaskNotFound(id));
        }

        debug!(task_id = id, "Deleted task");

        Ok(())
    }

    async fn add_comment(
        &self,
        task_id: i64,
        author: i64,
        text: &str,
    ) -> Result<Comment, StoreError> {
        let row: CommentRow = sqlx::query_as(
            r#"
            INSERT INTO comments (task_id, author, text)
            VALUES (?1, ?2, ?3)
            RETURNING id, task_id, author, text, created_at
            "#,
        )
        .bind(task_id)
        .bind(author)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                StoreError::TaskNotFound(task_id)
            } else {
                StoreError::Database(e)
            }
        })?;

        debug!(task_id, comment_id = row.id, "Inserted comment");

        Ok(row.into())
    }
}

/// Task with its comment thread, read on an existing connection
async fn fetch_task(conn: &mut SqliteConnection, id: i64) -> Result<Task, StoreError> {
    let sql = format!("{} WHERE t.id = ?1 GROUP BY t.id", TASK_SELECT);

    let row: Option<TaskRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.ok_or(StoreError::TaskNotFound(id))?.try_into()
}

/// Listing query. Values are bound; the only interpolated text comes from
/// `SortColumn` and `SortDirection`, which are closed enums.
fn build_selection(query: &TaskQuery) -> QueryBuilder<'_, Sqlite> {
    let mut builder = QueryBuilder::<Sqlite>::new(TASK_SELECT);

    if let Some(name) = &query.name {
        builder.push(" WHERE t.name = ").push_bind(name.as_str());
    }

    builder.push(" GROUP BY t.id, t.name, t.description");

    if let Some(column) = query.order_by {
        builder
            .push(" ORDER BY ")
            .push(column.as_sql())
            .push(" ")
            .push(query.direction.as_sql());
    }

    if let Some(limit) = query.limit {
        builder.push(" LIMIT ").push_bind(i64::from(limit));
    }

    builder
}

// Helper structs for sqlx query_as
#[derive(sqlx::FromRow)]
struct TaskRow {
    id: i64,
    name: String,
    description: String,
    comments: String,
}

impl TryFrom<TaskRow> for Task {
    type Error = StoreError;

    fn try_from(r: TaskRow) -> Result<Self, Self::Error> {
        let comments: Vec<Comment> = serde_json::from_str(&r.comments).map_err(|e| {
            StoreError::Corrupt(format!("comments of task {}: {}", r.id, e))
        })?;

        let mut task = Task {
            id: r.id,
            name: r.name,
            description: r.description,
            comments,
        };
        task.sort_comments();
        Ok(task)
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    task_id: i64,
    author: i64,
    text: String,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(r: CommentRow) -> Self {
        Comment {
            id: r.id,
            task_id: r.task_id,
            author: r.author,
            text: r.text,
            created_at: r.created_at,
        }
    }
}
