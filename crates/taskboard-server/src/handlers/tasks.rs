//! Task and comment handlers

use super::{csv, ApiError};
use crate::error::StoreError;
use crate::extractors::AuthUser;
use crate::services::tasks::Served;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use taskboard_types::{NewTask, Task, TaskQuery};
use tracing::info;

/// Response header telling how the cache took part
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// Cache operations that failed while serving the request, comma separated
pub const CACHE_ERROR_HEADER: &str = "x-cache-error";

fn cache_headers<T>(served: &Served<T>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        CACHE_STATUS_HEADER,
        HeaderValue::from_static(served.cache_status.as_str()),
    );

    let failed: Vec<String> = served
        .faults
        .iter()
        .filter(|f| !f.error.is_benign())
        .map(|f| f.op.to_string())
        .collect();
    if !failed.is_empty() {
        if let Ok(value) = HeaderValue::from_str(&failed.join(",")) {
            headers.insert(CACHE_ERROR_HEADER, value);
        }
    }

    headers
}

pub async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let Json(req) = payload?;
    if !req.is_complete() {
        return Err(ApiError::bad_request("name and description are required"));
    }

    let task = state.tasks.add_task(&req).await?;
    info!(task_id = task.id, user_id = user.user_id, "Task created");

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let served = state.tasks.get_task(id).await?;

    Ok((cache_headers(&served), Json(served.value)).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    name: String,
    #[serde(default)]
    order_by: String,
    #[serde(default)]
    sort: String,
    limit: Option<String>,
    format: Option<String>,
}

enum ListFormat {
    Json,
    Csv,
}

impl ListParams {
    fn format(&self) -> Result<ListFormat, ApiError> {
        match self.format.as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("") | Some("json") => Ok(ListFormat::Json),
            Some("csv") => Ok(ListFormat::Csv),
            Some(other) => Err(ApiError::bad_request(format!(
                "unsupported format: {}",
                other
            ))),
        }
    }

    fn query(&self) -> Result<TaskQuery, StoreError> {
        let limit = match self.limit.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<u32>()
                    .map_err(|_| StoreError::InvalidQuery(format!("invalid limit: {}", raw)))?,
            ),
        };

        Ok(TaskQuery::from_params(
            &self.name,
            &self.order_by,
            &self.sort,
            limit,
        )?)
    }
}

pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<ListParams>,
) -> Result<Response, ApiError> {
    let format = params.format()?;
    let query = params.query()?;

    let tasks = state.tasks.get_selected_tasks(&query).await?;

    Ok(match format {
        ListFormat::Json => Json(tasks).into_response(),
        ListFormat::Csv => (
            [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
            csv::render_tasks(&tasks),
        )
            .into_response(),
    })
}

pub async fn update(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    if !req.is_complete() {
        return Err(ApiError::bad_request("name and description are required"));
    }

    let served = state.tasks.update_task(id, &req).await?;
    info!(task_id = id, user_id = user.user_id, "Task updated");

    Ok((cache_headers(&served), Json(served.value)).into_response())
}

pub async fn delete(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.tasks.delete_task(id).await?;
    info!(task_id = id, user_id = user.user_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    text: String,
}

pub async fn add_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<i64>,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    if req.text.trim().is_empty() {
        return Err(ApiError::bad_request("comment text is required"));
    }

    let served = state
        .tasks
        .add_comment(task_id, user.user_id, &req.text)
        .await?;
    info!(task_id, comment_id = served.value.id, "Comment added");

    Ok((cache_headers(&served), Json(served.value)).into_response())
}
