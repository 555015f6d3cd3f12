//! Project read routes: listing, detail, summary, timeline, and the
//! AI-insights analysis run.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    AppState,
    error::{ApiError, db_err},
    middleware::auth::TenantContext,
};
use projextpal_core::analytics::types::{MilestoneRecord, ProjectSnapshot, TaskRecord};
use projextpal_core::analytics::{
    AnalysisReport, Analyzer, SnapshotSource,
    performance::{self, PerformanceMetrics},
};
use projextpal_core::policy::{Action, check_action};
use projextpal_db::{SnapshotRepository, entities::projects, repositories::ProjectRepository};
use projextpal_shared::{AppError, TimeFilter};

/// Creates the project routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects))
        .route("/projects/{id}", get(get_project))
        .route("/projects/{id}/summary", get(get_summary))
        .route("/projects/{id}/timeline", get(get_timeline))
        .route("/projects/{id}/ai-insights", get(get_ai_insights))
}

/// Query parameters for the analysis run.
#[derive(Debug, Default, Deserialize)]
struct InsightsQuery {
    /// Metric window; defaults to `overall`.
    #[serde(default)]
    time_filter: TimeFilter,
}

/// Project summary card.
#[derive(Debug, Serialize)]
struct ProjectSummary {
    /// Project row.
    project: projects::Model,
    /// Performance collector output (progress, tasks, budget, timeline).
    performance: PerformanceMetrics,
    /// Active team member count.
    team_size: u64,
    /// Open risk count.
    open_risks: usize,
}

/// One milestone with its tasks, for the timeline view.
#[derive(Debug, Serialize)]
struct TimelineMilestone {
    /// Milestone record.
    #[serde(flatten)]
    milestone: MilestoneRecord,
    /// Tasks under this milestone.
    tasks: Vec<TaskRecord>,
}

/// GET /projects - Everything the caller can see.
async fn list_projects(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
) -> Result<Json<Vec<projects::Model>>, ApiError> {
    check_action(&ctx, Action::ReadProject).map_err(AppError::from)?;

    let repo = ProjectRepository::new((*state.db).clone());
    let projects = repo.list_visible(&ctx).await.map_err(db_err)?;
    Ok(Json(projects))
}

/// GET /projects/{id} - Scoped fetch.
async fn get_project(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<projects::Model>, ApiError> {
    check_action(&ctx, Action::ReadProject).map_err(AppError::from)?;

    let repo = ProjectRepository::new((*state.db).clone());
    let project = repo
        .find_scoped(&ctx, id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("project {id}")))?;
    Ok(Json(project))
}

/// GET /projects/{id}/summary - Progress, budget, team, and timeline card.
async fn get_summary(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<ProjectSummary>, ApiError> {
    check_action(&ctx, Action::ReadProject).map_err(AppError::from)?;

    let repo = ProjectRepository::new((*state.db).clone());
    let project = repo
        .find_scoped(&ctx, id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("project {id}")))?;

    let snapshot = load_snapshot(&state, &ctx, id).await?;

    let today = Utc::now().date_naive();
    let window = TimeFilter::Overall.window(today);
    let metrics = performance::measure(&snapshot, &window, today).map_err(|e| {
        ApiError(AppError::MetricUnavailable {
            collector: "performance",
            message: e.to_string(),
        })
    })?;

    let open_risks = snapshot
        .risks
        .iter()
        .filter(|r| r.status != projextpal_core::analytics::types::RiskStatus::Closed)
        .count();

    Ok(Json(ProjectSummary {
        project,
        performance: metrics,
        team_size: snapshot.team_size,
        open_risks,
    }))
}

/// GET /projects/{id}/timeline - Milestones with their tasks.
async fn get_timeline(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path(id): Path<i64>,
) -> Result<Json<Vec<TimelineMilestone>>, ApiError> {
    check_action(&ctx, Action::ReadProject).map_err(AppError::from)?;

    let snapshot = load_snapshot(&state, &ctx, id).await?;

    let timeline = snapshot
        .milestones
        .into_iter()
        .map(|milestone| {
            let tasks = snapshot
                .tasks
                .iter()
                .filter(|t| t.milestone_id == milestone.id)
                .cloned()
                .collect();
            TimelineMilestone { milestone, tasks }
        })
        .collect();

    Ok(Json(timeline))
}

/// GET /projects/{id}/ai-insights - Runs the full analysis pipeline and
/// persists the health colors.
async fn get_ai_insights(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path(id): Path<i64>,
    Query(query): Query<InsightsQuery>,
) -> Result<Json<AnalysisReport>, ApiError> {
    check_action(&ctx, Action::RunAnalysis).map_err(AppError::from)?;

    let analyzer = Analyzer::new(SnapshotRepository::new((*state.db).clone()));
    let report = analyzer
        .analyze(&ctx, state.llm.as_ref(), id, query.time_filter)
        .await?;

    Ok(Json(report))
}

/// Loads the tenant-guarded snapshot or reports not found.
async fn load_snapshot(
    state: &AppState,
    ctx: &projextpal_core::policy::Context,
    project_id: i64,
) -> Result<ProjectSnapshot, ApiError> {
    let source = SnapshotRepository::new((*state.db).clone());
    source
        .load_snapshot(ctx, project_id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| ApiError(AppError::NotFound(format!("project {project_id}"))))
}
