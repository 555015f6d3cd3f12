//! The analysis pipeline: load snapshot, run collectors, synthesize, persist.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use projextpal_shared::{AppError, HealthColors, TimeFilter};

use crate::llm::LlmClient;
use crate::policy::Context;

use super::blockers::{self, BlockerPrediction};
use super::context::{self, ContextMetrics};
use super::health::{self, HealthSubscores};
use super::overdue::{self, OverdueAnalysis};
use super::performance::{self, PerformanceMetrics};
use super::synthesis::{self, InsightReport, SynthesisInputs};
use super::types::ProjectSnapshot;

/// Failure loading or persisting snapshot data.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The backing store failed.
    #[error("store error: {0}")]
    Store(String),
}

impl From<SnapshotError> for AppError {
    fn from(err: SnapshotError) -> Self {
        match err {
            SnapshotError::Store(msg) => Self::Database(msg),
        }
    }
}

/// Read/write seam between the analyzer and the database.
///
/// `load_snapshot` is company-guarded: it returns `None` for projects the
/// caller's tenant cannot see, which the analyzer reports as not found.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Loads the full snapshot for one project, or `None` when the project
    /// does not exist or is outside the caller's tenant.
    async fn load_snapshot(
        &self,
        ctx: &Context,
        project_id: i64,
    ) -> Result<Option<ProjectSnapshot>, SnapshotError>;

    /// Persists the seven health colors and the analysis timestamp in one
    /// atomic write.
    async fn persist_health(
        &self,
        project_id: i64,
        colors: &HealthColors,
        analyzed_at: DateTime<Utc>,
    ) -> Result<(), SnapshotError>;
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Analyzed project ID.
    pub project_id: i64,
    /// The filter the metrics were computed under.
    pub time_filter: TimeFilter,
    /// Overdue analysis.
    pub overdue: OverdueAnalysis,
    /// Blocker prediction.
    pub blockers: BlockerPrediction,
    /// Performance metrics.
    pub performance: PerformanceMetrics,
    /// Contextual metrics.
    pub context: ContextMetrics,
    /// Seven-dimension subscores.
    pub subscores: HealthSubscores,
    /// Persisted palette colors.
    pub colors: HealthColors,
    /// Narrative insight.
    pub insight: InsightReport,
    /// When the analysis ran.
    pub analyzed_at: DateTime<Utc>,
}

/// Runs the full analysis pipeline for one project.
pub struct Analyzer<S> {
    source: S,
}

impl<S: SnapshotSource> Analyzer<S> {
    /// Wraps a snapshot source.
    pub const fn new(source: S) -> Self {
        Self { source }
    }

    /// Analyzes one project and persists its health colors.
    ///
    /// All database reads happen before the LLM call; no transaction is held
    /// across it. Identical project state yields identical colors.
    pub async fn analyze(
        &self,
        ctx: &Context,
        llm: &dyn LlmClient,
        project_id: i64,
        filter: TimeFilter,
    ) -> Result<AnalysisReport, AppError> {
        if project_id <= 0 {
            return Err(AppError::Validation(
                "project id must be a positive integer".into(),
            ));
        }

        let snapshot = self
            .source
            .load_snapshot(ctx, project_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("project {project_id}")))?;

        let now = Utc::now();
        let (report, colors) = self
            .run_pipeline(&snapshot, llm, project_id, filter, now)
            .await?;

        self.source
            .persist_health(project_id, &colors, now)
            .await?;

        Ok(report)
    }

    async fn run_pipeline(
        &self,
        snapshot: &ProjectSnapshot,
        llm: &dyn LlmClient,
        project_id: i64,
        filter: TimeFilter,
        now: DateTime<Utc>,
    ) -> Result<(AnalysisReport, HealthColors), AppError> {
        let today: NaiveDate = now.date_naive();
        let window = filter.window(today);

        let overdue = overdue::analyze(snapshot, &window, today)
            .map_err(|e| metric_unavailable("overdue", &e))?;
        let blockers = blockers::predict(snapshot, &window, today)
            .map_err(|e| metric_unavailable("blockers", &e))?;
        let performance = performance::measure(snapshot, &window, today)
            .map_err(|e| metric_unavailable("performance", &e))?;
        let context = context::collect(snapshot, &window, today)
            .map_err(|e| metric_unavailable("context", &e))?;

        // All reads are done; the LLM call happens outside any transaction.
        let inputs = SynthesisInputs {
            project: &snapshot.project,
            overdue: &overdue,
            blockers: &blockers,
            performance: &performance,
            context: &context,
        };
        let insight = synthesis::synthesize(llm, &inputs).await;

        let llm_score = if insight.fallback {
            None
        } else {
            Some(insight.health_score.score)
        };
        let subscores = health::subscores(&performance, &overdue, &blockers, &snapshot.risks, llm_score);
        let colors = subscores.colors();

        let report = AnalysisReport {
            project_id,
            time_filter: filter,
            overdue,
            blockers,
            performance,
            context,
            subscores,
            colors,
            insight,
            analyzed_at: now,
        };
        Ok((report, colors))
    }
}

fn metric_unavailable(collector: &'static str, err: &super::CollectorError) -> AppError {
    AppError::MetricUnavailable {
        collector,
        message: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::snapshot_with_tasks;
    use crate::analytics::types::{TaskPriority, TaskStatus};
    use crate::llm::DisabledLlm;
    use mockall::predicate::eq;
    use projextpal_shared::Role;

    fn ctx() -> Context {
        Context::new(1, Role::Pm, 1)
    }

    #[tokio::test]
    async fn test_rejects_non_positive_id() {
        let source = MockSnapshotSource::new();
        let analyzer = Analyzer::new(source);

        let err = analyzer
            .analyze(&ctx(), &DisabledLlm, 0, TimeFilter::Overall)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_missing_project_is_not_found() {
        let mut source = MockSnapshotSource::new();
        source
            .expect_load_snapshot()
            .with(mockall::predicate::always(), eq(42))
            .returning(|_, _| Ok(None));
        source.expect_persist_health().never();
        let analyzer = Analyzer::new(source);

        let err = analyzer
            .analyze(&ctx(), &DisabledLlm, 42, TimeFilter::Overall)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_analysis_persists_colors_once() {
        let mut source = MockSnapshotSource::new();
        source
            .expect_load_snapshot()
            .returning(|_, _| Ok(Some(snapshot_with_tasks(vec![]))));
        source
            .expect_persist_health()
            .withf(|id, _, _| *id == 7)
            .times(1)
            .returning(|_, _, _| Ok(()));
        let analyzer = Analyzer::new(source);

        let report = analyzer
            .analyze(&ctx(), &DisabledLlm, 7, TimeFilter::Overall)
            .await
            .unwrap();
        assert_eq!(report.project_id, 7);
        assert!(report.insight.fallback);
    }

    #[tokio::test]
    async fn test_identical_state_yields_identical_colors() {
        let make_analyzer = || {
            let mut source = MockSnapshotSource::new();
            source.expect_load_snapshot().returning(|_, _| {
                let t = crate::analytics::test_support::task(
                    1,
                    1,
                    TaskStatus::Todo,
                    TaskPriority::High,
                    None,
                );
                Ok(Some(snapshot_with_tasks(vec![t])))
            });
            source.expect_persist_health().returning(|_, _, _| Ok(()));
            Analyzer::new(source)
        };

        let first = make_analyzer()
            .analyze(&ctx(), &DisabledLlm, 1, TimeFilter::Overall)
            .await
            .unwrap();
        let second = make_analyzer()
            .analyze(&ctx(), &DisabledLlm, 1, TimeFilter::Overall)
            .await
            .unwrap();
        assert_eq!(first.colors, second.colors);
    }

    #[tokio::test]
    async fn test_store_failure_surfaces_as_database_error() {
        let mut source = MockSnapshotSource::new();
        source
            .expect_load_snapshot()
            .returning(|_, _| Err(SnapshotError::Store("connection reset".into())));
        let analyzer = Analyzer::new(source);

        let err = analyzer
            .analyze(&ctx(), &DisabledLlm, 1, TimeFilter::Overall)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}
