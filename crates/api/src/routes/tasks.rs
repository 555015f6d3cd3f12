//! Task mutation routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::patch,
};
use serde::Deserialize;

use crate::{
    AppState,
    error::{ApiError, db_err},
    middleware::auth::TenantContext,
};
use projextpal_core::policy::{Action, check_action};
use projextpal_db::{
    TaskRepository, entities::tasks, repositories::ProjectRepository,
};
use projextpal_shared::AppError;

/// Creates the task routes.
pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/tasks/{task_id}/subtasks/{id}",
        patch(toggle_subtask),
    )
}

/// Toggle payload.
#[derive(Debug, Deserialize)]
struct TogglePayload {
    /// Desired completion state.
    completed: bool,
}

/// PATCH /tasks/{task_id}/subtasks/{id} - Toggles a subtask; the parent
/// task's progress is recomputed in the same transaction and returned.
async fn toggle_subtask(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path((task_id, subtask_id)): Path<(i64, i64)>,
    Json(payload): Json<TogglePayload>,
) -> Result<Json<tasks::Model>, ApiError> {
    check_action(&ctx, Action::ManageTasks).map_err(AppError::from)?;

    let tasks_repo = TaskRepository::new((*state.db).clone());

    // Resolve parentage first so the visibility check runs before mutation.
    let (parent_task_id, project_id) = tasks_repo
        .subtask_parent(subtask_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("subtask {subtask_id}")))?;
    if parent_task_id != task_id {
        return Err(AppError::NotFound(format!("subtask {subtask_id}")).into());
    }

    let projects_repo = ProjectRepository::new((*state.db).clone());
    projects_repo
        .find_scoped(&ctx, project_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("subtask {subtask_id}")))?;

    let task = tasks_repo
        .set_subtask_completed(subtask_id, payload.completed)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("subtask {subtask_id}")))?;

    Ok(Json(task))
}
