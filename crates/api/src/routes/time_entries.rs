//! Time tracking routes: logging and the approval workflow.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    AppState,
    error::{ApiError, db_err},
    middleware::auth::TenantContext,
};
use projextpal_core::policy::{Action, Context, check_action};
use projextpal_db::{
    TaskRepository, TimeEntryError, TimeEntryRepository, entities::time_entries,
    repositories::ProjectRepository,
};
use projextpal_shared::AppError;

/// Creates the time entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tasks/{task_id}/time-entries",
            get(list_entries).post(log_entry),
        )
        .route("/time-entries/{id}/submit", post(submit_entry))
        .route("/time-entries/{id}/approve", post(approve_entry))
        .route("/time-entries/{id}/reject", post(reject_entry))
}

/// Entry creation payload. The billed rate is snapshotted server-side from
/// the member's profile, never taken from the client.
#[derive(Debug, Deserialize)]
struct LogPayload {
    hours: Decimal,
    entry_date: Option<NaiveDate>,
    note: Option<String>,
}

/// GET /tasks/{task_id}/time-entries - Lists a task's entries, newest first.
async fn list_entries(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path(task_id): Path<i64>,
) -> Result<Json<Vec<time_entries::Model>>, ApiError> {
    check_action(&ctx, Action::ReadProject).map_err(AppError::from)?;
    require_visible_task(&state, &ctx, task_id).await?;

    let entries = TimeEntryRepository::new((*state.db).clone())
        .entries_for_task(task_id)
        .await
        .map_err(db_err)?;
    Ok(Json(entries))
}

/// POST /tasks/{task_id}/time-entries - Logs a draft entry for the caller.
async fn log_entry(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path(task_id): Path<i64>,
    Json(payload): Json<LogPayload>,
) -> Result<(StatusCode, Json<time_entries::Model>), ApiError> {
    check_action(&ctx, Action::LogTime).map_err(AppError::from)?;

    if payload.hours <= Decimal::ZERO {
        return Err(AppError::Validation("hours must be positive".into()).into());
    }

    require_visible_task(&state, &ctx, task_id).await?;

    let entry_date = payload
        .entry_date
        .unwrap_or_else(|| Utc::now().date_naive());

    let entry = TimeEntryRepository::new((*state.db).clone())
        .log(task_id, ctx.user_id, payload.hours, entry_date, payload.note)
        .await
        .map_err(time_entry_err)?;

    Ok((StatusCode::CREATED, Json(entry)))
}

/// POST /time-entries/{id}/submit - Moves a draft to submitted.
async fn submit_entry(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<time_entries::Model>, ApiError> {
    check_action(&ctx, Action::LogTime).map_err(AppError::from)?;

    let entry = TimeEntryRepository::new((*state.db).clone())
        .submit(id)
        .await
        .map_err(time_entry_err)?;
    Ok(Json(entry))
}

/// POST /time-entries/{id}/approve - Approves a submitted entry, fixing its
/// labor cost into the project's actuals.
async fn approve_entry(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<time_entries::Model>, ApiError> {
    check_action(&ctx, Action::ApproveTime).map_err(AppError::from)?;

    let entry = TimeEntryRepository::new((*state.db).clone())
        .approve(id)
        .await
        .map_err(time_entry_err)?;
    Ok(Json(entry))
}

/// POST /time-entries/{id}/reject - Rejects a submitted entry.
async fn reject_entry(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<time_entries::Model>, ApiError> {
    check_action(&ctx, Action::ApproveTime).map_err(AppError::from)?;

    let entry = TimeEntryRepository::new((*state.db).clone())
        .reject(id)
        .await
        .map_err(time_entry_err)?;
    Ok(Json(entry))
}

/// Resolves the task's project and applies the tenant visibility check.
async fn require_visible_task(
    state: &AppState,
    ctx: &Context,
    task_id: i64,
) -> Result<(), ApiError> {
    let project_id = TaskRepository::new((*state.db).clone())
        .task_project(task_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("task {task_id}")))?;

    ProjectRepository::new((*state.db).clone())
        .find_scoped(ctx, project_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("task {task_id}")))?;

    Ok(())
}

fn time_entry_err(err: TimeEntryError) -> ApiError {
    match err {
        TimeEntryError::NotFound => AppError::NotFound("time entry".into()).into(),
        TimeEntryError::InvalidState { .. } => AppError::Conflict(err.to_string()).into(),
        TimeEntryError::Db(e) => db_err(e),
    }
}
