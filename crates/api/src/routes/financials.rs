//! Cash-flow forecast routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;

use crate::{
    AppState,
    error::{ApiError, db_err},
    middleware::auth::TenantContext,
};
use projextpal_core::analytics::types::ProjectInfo;
use projextpal_core::forecast::{
    DEFAULT_HORIZON_MONTHS, DEFAULT_WINDOW_MONTHS, engine::ForecastEngine, types::CashFlowForecast,
};
use projextpal_core::policy::{Action, check_action};
use projextpal_db::{ExpenseRepository, entities::projects, repositories::ProjectRepository};
use projextpal_shared::AppError;

/// Creates the financial forecast routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/project-financials/{id}/forecast", get(get_forecast))
        .route("/project-financials/forecasts", get(get_all_forecasts))
}

/// Forecast tuning parameters.
#[derive(Debug, Deserialize)]
struct ForecastQuery {
    /// Trailing months of history to fit on.
    window_months: Option<u32>,
    /// Months to project forward.
    horizon_months: Option<u32>,
}

/// GET /project-financials/{id}/forecast - Single-project forecast.
async fn get_forecast(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Path(id): Path<i64>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<CashFlowForecast>, ApiError> {
    check_action(&ctx, Action::ReadForecast).map_err(AppError::from)?;

    let repo = ProjectRepository::new((*state.db).clone());
    let project = repo
        .find_scoped(&ctx, id)
        .await
        .map_err(db_err)?
        .ok_or_else(|| AppError::NotFound(format!("project {id}")))?;

    let forecast = run_forecast(&state, &project, &query).await?;
    Ok(Json(forecast))
}

/// GET /project-financials/forecasts - Bulk forecast over the caller's
/// active (pending or in-progress) projects.
async fn get_all_forecasts(
    State(state): State<AppState>,
    TenantContext(ctx): TenantContext,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<Vec<CashFlowForecast>>, ApiError> {
    check_action(&ctx, Action::ReadForecast).map_err(AppError::from)?;

    let repo = ProjectRepository::new((*state.db).clone());
    let projects = repo.active_projects(ctx.company_id).await.map_err(db_err)?;

    let mut forecasts = Vec::with_capacity(projects.len());
    for project in &projects {
        forecasts.push(run_forecast(&state, project, &query).await?);
    }

    Ok(Json(forecasts))
}

async fn run_forecast(
    state: &AppState,
    project: &projects::Model,
    query: &ForecastQuery,
) -> Result<CashFlowForecast, ApiError> {
    let expenses = ExpenseRepository::new((*state.db).clone())
        .records_for(project.id)
        .await
        .map_err(db_err)?;

    let info = ProjectInfo {
        id: project.id,
        name: project.name.clone(),
        company_id: project.company_id,
        status: project.status.clone().into(),
        start_date: project.start_date,
        end_date: project.end_date,
        budget: project.budget,
    };

    let engine = ForecastEngine;
    let forecast = engine
        .forecast(
            &info,
            &expenses,
            query.window_months.unwrap_or(DEFAULT_WINDOW_MONTHS),
            query.horizon_months.unwrap_or(DEFAULT_HORIZON_MONTHS),
            state.llm.as_ref(),
            Utc::now(),
        )
        .await?;

    Ok(forecast)
}
