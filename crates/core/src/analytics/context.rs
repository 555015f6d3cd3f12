//! Contextual cardinalities for insight synthesis.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use projextpal_shared::TimeWindow;

use super::CollectorError;
use super::types::ProjectSnapshot;

/// Windowed counts that give the synthesizer situational awareness.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextMetrics {
    /// Registered stakeholders.
    pub stakeholders: u64,
    /// Change requests raised.
    pub change_requests: u64,
    /// Distinct workflow stages among the windowed change requests.
    pub workflow_complexity: u64,
    /// Meetings held.
    pub meetings: u64,
    /// Deployments marked ready.
    pub deployments_ready: u64,
    /// Survey responses received.
    pub surveys: u64,
    /// Activity log entries.
    pub recent_activities: u64,
    /// Documents uploaded.
    pub documents: u64,
    /// Active team members (not windowed; membership is current state).
    pub team_size: u64,
}

fn count_in(dates: &[NaiveDate], window: &TimeWindow) -> u64 {
    dates.iter().filter(|d| window.contains(**d)).count() as u64
}

/// Counts the contextual cardinalities within the window.
pub fn collect(
    snapshot: &ProjectSnapshot,
    window: &TimeWindow,
    _today: NaiveDate,
) -> Result<ContextMetrics, CollectorError> {
    let ctx = &snapshot.context;

    let windowed_requests: Vec<_> = ctx
        .change_requests
        .iter()
        .filter(|cr| window.contains(cr.date))
        .collect();
    let stages: BTreeSet<&str> = windowed_requests
        .iter()
        .map(|cr| cr.stage.as_str())
        .collect();

    Ok(ContextMetrics {
        stakeholders: count_in(&ctx.stakeholders, window),
        change_requests: windowed_requests.len() as u64,
        workflow_complexity: stages.len() as u64,
        meetings: count_in(&ctx.meetings, window),
        deployments_ready: ctx
            .deployments
            .iter()
            .filter(|d| d.ready && window.contains(d.date))
            .count() as u64,
        surveys: count_in(&ctx.surveys, window),
        recent_activities: count_in(&ctx.activities, window),
        documents: count_in(&ctx.documents, window),
        team_size: snapshot.team_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::snapshot_with_tasks;
    use crate::analytics::types::{ChangeRequestRecord, DeploymentRecord};
    use projextpal_shared::TimeFilter;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_counts_respect_window() {
        let today = date(2024, 6, 10);
        let mut snapshot = snapshot_with_tasks(vec![]);
        snapshot.context.meetings = vec![date(2024, 6, 9), date(2024, 6, 10), date(2024, 5, 1)];
        snapshot.context.stakeholders = vec![date(2024, 1, 1)];
        snapshot.context.documents = vec![date(2024, 6, 4), date(2024, 6, 5)];

        let window = TimeFilter::Week.window(today);
        let result = collect(&snapshot, &window, today).unwrap();
        assert_eq!(result.meetings, 2);
        assert_eq!(result.stakeholders, 0);
        // Week of Jun 4..=10 includes both documents.
        assert_eq!(result.documents, 2);

        let overall = TimeFilter::Overall.window(today);
        let result = collect(&snapshot, &overall, today).unwrap();
        assert_eq!(result.meetings, 3);
        assert_eq!(result.stakeholders, 1);
    }

    #[test]
    fn test_workflow_complexity_counts_distinct_stages() {
        let today = date(2024, 6, 10);
        let mut snapshot = snapshot_with_tasks(vec![]);
        snapshot.context.change_requests = vec![
            ChangeRequestRecord { date: date(2024, 6, 9), stage: "review".into() },
            ChangeRequestRecord { date: date(2024, 6, 8), stage: "review".into() },
            ChangeRequestRecord { date: date(2024, 6, 7), stage: "approval".into() },
            ChangeRequestRecord { date: date(2024, 1, 1), stage: "archive".into() },
        ];

        let window = TimeFilter::Week.window(today);
        let result = collect(&snapshot, &window, today).unwrap();
        assert_eq!(result.change_requests, 3);
        assert_eq!(result.workflow_complexity, 2);
    }

    #[test]
    fn test_only_ready_deployments_count() {
        let today = date(2024, 6, 10);
        let mut snapshot = snapshot_with_tasks(vec![]);
        snapshot.context.deployments = vec![
            DeploymentRecord { date: date(2024, 6, 9), ready: true },
            DeploymentRecord { date: date(2024, 6, 9), ready: false },
        ];

        let window = TimeFilter::Overall.window(today);
        let result = collect(&snapshot, &window, today).unwrap();
        assert_eq!(result.deployments_ready, 1);
    }
}
