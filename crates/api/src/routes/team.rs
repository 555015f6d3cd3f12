//! Project team management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::{ApiError, db_err},
    middleware::auth::TenantContext,
};
use projextpal_core::policy::{Action, check_action};
use projextpal_db::{
    TeamRepository, UserRepository,
    entities::sea_orm_active_enums::UserRole,
    repositories::ProjectRepository,
};
use projextpal_shared::AppError;

/// Creates the team routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects/{id}/team", get(list_team).post(add_member))
        .route("/projects/{id}/team/{user_id}", delete(remove_member))
}

/// Active member view joining the membership row with its user.
#[derive(Debug, Serialize)]
struct TeamMember {
    user_id: i64,
    name: String,
    email: String,
    role: UserRole,
    hourly_rate: Option<Decimal>,
}

/// Membership payload. Members may come from another company; the
/// membership row is what grants them visibility into this project.
#[derive(Debug, Deserialize)]
struct AddMemberPayload {
    user_id: i64,
    hourly_rate: Option<Decimal>,
}

/// GET /projects/{id}/team - Lists a project's active members.
async fn list_team(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<TeamMember>>, ApiError> {
    check_action(&ctx, Action::ReadProject).map_err(AppError::from)?;
    require_project(&state, &ctx, project_id).await?;

    let members = TeamRepository::new((*state.db).clone())
        .active_team_members(project_id)
        .await
        .map_err(db_err)?;

    let members = members
        .into_iter()
        .map(|(_, user)| TeamMember {
            user_id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            hourly_rate: user.hourly_rate,
        })
        .collect();

    Ok(Json(members))
}

/// POST /projects/{id}/team - Adds a member, reactivating a prior
/// membership when one exists.
async fn add_member(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path(project_id): Path<i64>,
    Json(payload): Json<AddMemberPayload>,
) -> Result<StatusCode, ApiError> {
    check_action(&ctx, Action::ManageTeam).map_err(AppError::from)?;
    require_project(&state, &ctx, project_id).await?;

    let user = UserRepository::new((*state.db).clone())
        .find_by_id(payload.user_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("user {}", payload.user_id)))?;
    if !user.is_active {
        return Err(AppError::Validation("user account is disabled".into()).into());
    }

    TeamRepository::new((*state.db).clone())
        .upsert_member(project_id, payload.user_id, payload.hourly_rate)
        .await
        .map_err(db_err)?;

    tracing::info!(project_id, user_id = payload.user_id, "team member added");
    Ok(StatusCode::CREATED)
}

/// DELETE /projects/{id}/team/{user_id} - Deactivates a membership. The row
/// survives so a later re-add restores it.
async fn remove_member(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path((project_id, user_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    check_action(&ctx, Action::ManageTeam).map_err(AppError::from)?;
    require_project(&state, &ctx, project_id).await?;

    TeamRepository::new((*state.db).clone())
        .deactivate_member(project_id, user_id)
        .await
        .map_err(db_err)?;

    tracing::info!(project_id, user_id, "team member deactivated");
    Ok(StatusCode::NO_CONTENT)
}

async fn require_project(
    state: &AppState,
    ctx: &projextpal_core::policy::Context,
    project_id: i64,
) -> Result<(), ApiError> {
    ProjectRepository::new((*state.db).clone())
        .find_scoped(ctx, project_id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("project {project_id}")))?;
    Ok(())
}
