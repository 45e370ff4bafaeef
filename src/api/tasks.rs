//! Task endpoints. Every task route is scoped to the caller's own tasks.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{AppState, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::types::{
    TITLE_MAX_LEN, Task, TaskCreate, TaskFilter, TaskListResponse, TaskUpdate, User,
};

/// Trim a title and check its length.
pub fn validate_title(title: &str) -> ApiResult<String> {
    let title = title.trim();
    let len = title.chars().count();
    if len == 0 || len > TITLE_MAX_LEN {
        return Err(ApiError::invalid_value(
            "title",
            &format!("Title must be between 1 and {} characters", TITLE_MAX_LEN),
        ));
    }
    Ok(title.to_string())
}

/// Load a task and check the caller owns it: 404 when missing, 403 otherwise.
fn authorize_task(state: &AppState, user: &User, task_id: i64, action: &str) -> ApiResult<Task> {
    let task = state
        .db
        .get_task(task_id)?
        .ok_or_else(|| ApiError::task_not_found(task_id))?;

    if task.user_id != user.id {
        return Err(ApiError::forbidden(format!(
            "You do not have permission to {} this task",
            action
        )));
    }
    Ok(task)
}

pub async fn create_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<TaskCreate>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let title = validate_title(&body.title)?;
    let task = state
        .db
        .create_task(user.id, &title)
        .map_err(|e| ApiError::database("creating task", e))?;

    info!(user_id = user.id, task_id = task.id, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub status_filter: Option<String>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<TaskListResponse>> {
    let filter = TaskFilter::from_query(params.status_filter.as_deref());
    let tasks = state.db.list_tasks(user.id, filter)?;
    let stats = state.db.task_stats(user.id)?;

    info!(user_id = user.id, count = tasks.len(), ?filter, "Listed tasks");
    Ok(Json(TaskListResponse {
        tasks,
        total: stats.total,
        completed: stats.completed,
        pending: stats.pending,
    }))
}

pub async fn get_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<i64>,
) -> ApiResult<Json<Task>> {
    let task = authorize_task(&state, &user, task_id, "access")?;
    Ok(Json(task))
}

pub async fn update_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<i64>,
    Json(body): Json<TaskUpdate>,
) -> ApiResult<Json<Task>> {
    authorize_task(&state, &user, task_id, "update")?;

    let update = TaskUpdate {
        title: body.title.as_deref().map(validate_title).transpose()?,
        is_completed: body.is_completed,
    };

    let task = state
        .db
        .update_task(task_id, &update)
        .map_err(|e| ApiError::database("updating task", e))?
        .ok_or_else(|| ApiError::task_not_found(task_id))?;

    info!(user_id = user.id, task_id, "Task updated");
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(task_id): Path<i64>,
) -> ApiResult<StatusCode> {
    authorize_task(&state, &user, task_id, "delete")?;

    let deleted = state
        .db
        .delete_task(task_id)
        .map_err(|e| ApiError::database("deleting task", e))?;
    if !deleted {
        return Err(ApiError::task_not_found(task_id));
    }

    info!(user_id = user.id, task_id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsOverview {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
    pub completion_rate: f64,
    pub message: String,
}

pub async fn stats_overview(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<StatsOverview>> {
    let stats = state.db.task_stats(user.id)?;

    Ok(Json(StatsOverview {
        total_tasks: stats.total,
        completed_tasks: stats.completed,
        pending_tasks: stats.pending,
        completion_rate: (stats.completion_rate * 100.0).round() / 100.0,
        message: format!(
            "You have completed {} out of {} tasks",
            stats.completed, stats.total
        ),
    }))
}
