//! Project analytics.
//!
//! Four pure collectors ([`overdue`], [`blockers`], [`performance`],
//! [`context`]) run over a [`types::ProjectSnapshot`], the [`health`] module
//! maps their outputs to the seven-color palette, and [`synthesis`] produces
//! the narrative report. [`orchestrator`] ties the pipeline together behind
//! the [`orchestrator::SnapshotSource`] seam.

pub mod blockers;
pub mod context;
pub mod health;
pub mod orchestrator;
pub mod overdue;
pub mod performance;
pub mod synthesis;
pub mod types;

pub use blockers::BlockerPrediction;
pub use context::ContextMetrics;
pub use health::HealthSubscores;
pub use orchestrator::{AnalysisReport, Analyzer, SnapshotError, SnapshotSource};
pub use overdue::OverdueAnalysis;
pub use performance::PerformanceMetrics;
pub use synthesis::InsightReport;
pub use types::ProjectSnapshot;

/// A collector could not produce its metric.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CollectorError {
    message: String,
}

impl CollectorError {
    /// Builds a collector error from a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Task-derived milestone progress: the mean of task progress values,
/// rounded half up. A milestone with no tasks is at zero.
pub(crate) fn milestone_progress(tasks: &[&types::TaskRecord]) -> i32 {
    if tasks.is_empty() {
        return 0;
    }
    let sum: i64 = tasks.iter().map(|t| i64::from(t.progress)).sum();
    let n = tasks.len() as i64;
    i32::try_from((sum * 2 + n) / (n * 2)).unwrap_or(0)
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod tests {
    use super::milestone_progress;
    use super::test_support::task;
    use super::types::{TaskPriority, TaskStatus};

    #[test]
    fn test_milestone_progress_empty() {
        assert_eq!(milestone_progress(&[]), 0);
    }

    #[test]
    fn test_milestone_progress_rounds_half_up() {
        let mut a = task(1, 1, TaskStatus::InProgress, TaskPriority::Low, None);
        a.progress = 33;
        let mut b = task(2, 1, TaskStatus::InProgress, TaskPriority::Low, None);
        b.progress = 34;
        // (33 + 34) / 2 = 33.5 -> 34
        assert_eq!(milestone_progress(&[&a, &b]), 34);
    }
}
