//! Project performance metrics.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use projextpal_shared::TimeWindow;

use super::CollectorError;
use super::types::{MilestoneStatus, ProjectSnapshot, TaskRecord, TaskStatus};
use crate::analytics::milestone_progress;

/// Task counts by status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    /// All tasks.
    pub total: u64,
    /// Todo.
    pub todo: u64,
    /// In progress.
    pub in_progress: u64,
    /// Blocked.
    pub blocked: u64,
    /// Done.
    pub done: u64,
}

/// Budget consumption summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetUsage {
    /// Project budget.
    pub budget: Decimal,
    /// Sum of all expense amounts.
    pub total_expenses: Decimal,
    /// Expenses over budget, percent (0 when budget is not positive).
    pub utilization_percent: Decimal,
}

/// Schedule position relative to the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineStatus {
    /// Actual progress meets or beats expected.
    OnTrack,
    /// Within 10 percentage points below expected.
    SlightDelay,
    /// More than 10 points below expected.
    BehindSchedule,
    /// Start or end date missing.
    Unknown,
}

/// Output of the performance collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Average of computed task-based progress across milestones, percent.
    pub overall_progress: Decimal,
    /// Completed milestones over total, percent.
    pub milestone_completion_rate: Decimal,
    /// Task counts.
    pub tasks: TaskStats,
    /// Tasks completed per day (window, or project lifetime without one).
    pub velocity_per_day: Decimal,
    /// Budget consumption.
    pub budget: BudgetUsage,
    /// Schedule position.
    pub timeline_status: TimelineStatus,
    /// `remaining_tasks / velocity_per_day`, rounded down. `None` when
    /// velocity is zero.
    pub estimated_completion_days: Option<i64>,
}

fn task_stats(tasks: &[TaskRecord]) -> TaskStats {
    let mut stats = TaskStats {
        total: tasks.len() as u64,
        ..TaskStats::default()
    };
    for task in tasks {
        match task.status {
            TaskStatus::Todo => stats.todo += 1,
            TaskStatus::InProgress => stats.in_progress += 1,
            TaskStatus::Blocked => stats.blocked += 1,
            TaskStatus::Done => stats.done += 1,
        }
    }
    stats
}

/// Expected progress percent from the planned date range, `None` when
/// either boundary is missing or the range is empty.
fn expected_progress(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<Decimal> {
    let (start, end) = (start?, end?);
    let total = (end - start).num_days();
    if total <= 0 {
        return None;
    }
    let elapsed = (today - start).num_days().clamp(0, total);
    Some((Decimal::from(elapsed) / Decimal::from(total) * Decimal::ONE_HUNDRED).round_dp(1))
}

/// Runs the performance collector.
pub fn measure(
    snapshot: &ProjectSnapshot,
    window: &TimeWindow,
    today: NaiveDate,
) -> Result<PerformanceMetrics, CollectorError> {
    let project = &snapshot.project;

    // Milestone progress is task-derived; milestones without tasks count
    // as zero.
    let overall_progress = if snapshot.milestones.is_empty() {
        Decimal::ZERO
    } else {
        let sum: i64 = snapshot
            .milestones
            .iter()
            .map(|m| {
                let tasks: Vec<&TaskRecord> = snapshot
                    .tasks
                    .iter()
                    .filter(|t| t.milestone_id == m.id)
                    .collect();
                i64::from(milestone_progress(&tasks))
            })
            .sum();
        (Decimal::from(sum) / Decimal::from(snapshot.milestones.len())).round_dp(1)
    };

    let milestone_completion_rate = if snapshot.milestones.is_empty() {
        Decimal::ZERO
    } else {
        let completed = snapshot
            .milestones
            .iter()
            .filter(|m| m.status == MilestoneStatus::Completed)
            .count();
        (Decimal::from(completed) / Decimal::from(snapshot.milestones.len())
            * Decimal::ONE_HUNDRED)
            .round_dp(1)
    };

    let stats = task_stats(&snapshot.tasks);

    // Velocity: done tasks per day over the window, or over the project
    // lifetime when the filter is overall.
    let velocity_per_day = match window.start {
        Some(start) => {
            let days = (window.end - start).num_days() + 1;
            let done_in_window = snapshot
                .tasks
                .iter()
                .filter(|t| {
                    t.status == TaskStatus::Done && t.updated_at.date_naive() >= start
                })
                .count();
            (Decimal::from(done_in_window) / Decimal::from(days.max(1))).round_dp(2)
        }
        None => {
            let lifetime_start = project.start_date.or_else(|| {
                snapshot
                    .tasks
                    .iter()
                    .map(|t| t.updated_at.date_naive())
                    .min()
            });
            let days = lifetime_start.map_or(1, |s| ((today - s).num_days()).max(1));
            (Decimal::from(stats.done) / Decimal::from(days)).round_dp(2)
        }
    };

    let total_expenses: Decimal = snapshot.expenses.iter().map(|e| e.amount).sum();
    let utilization_percent = if project.budget <= Decimal::ZERO {
        Decimal::ZERO
    } else {
        (total_expenses / project.budget * Decimal::ONE_HUNDRED).round_dp(1)
    };

    let timeline_status = match expected_progress(project.start_date, project.end_date, today) {
        None => TimelineStatus::Unknown,
        Some(expected) => {
            if overall_progress >= expected {
                TimelineStatus::OnTrack
            } else if expected - overall_progress <= Decimal::from(10) {
                TimelineStatus::SlightDelay
            } else {
                TimelineStatus::BehindSchedule
            }
        }
    };

    let remaining = stats.total - stats.done;
    let estimated_completion_days = if velocity_per_day > Decimal::ZERO {
        let est = Decimal::from(remaining) / velocity_per_day;
        est.floor().try_into().ok()
    } else {
        None
    };

    Ok(PerformanceMetrics {
        overall_progress,
        milestone_completion_rate,
        tasks: stats,
        velocity_per_day,
        budget: BudgetUsage {
            budget: project.budget,
            total_expenses,
            utilization_percent,
        },
        timeline_status,
        estimated_completion_days,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::{expense, snapshot_with_tasks, task};
    use crate::analytics::types::{TaskPriority, TaskStatus};
    use projextpal_shared::TimeFilter;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_no_expenses_means_zero_utilization() {
        let snapshot = snapshot_with_tasks(vec![]);
        let today = date(2024, 6, 1);
        let window = TimeFilter::Overall.window(today);

        let result = measure(&snapshot, &window, today).unwrap();
        assert_eq!(result.budget.utilization_percent, Decimal::ZERO);
        assert_eq!(result.budget.total_expenses, Decimal::ZERO);
    }

    #[test]
    fn test_zero_budget_reports_zero_utilization() {
        let mut snapshot = snapshot_with_tasks(vec![]);
        snapshot.project.budget = Decimal::ZERO;
        snapshot.expenses = vec![expense(1, dec!(500), date(2024, 5, 1))];
        let today = date(2024, 6, 1);
        let window = TimeFilter::Overall.window(today);

        let result = measure(&snapshot, &window, today).unwrap();
        assert_eq!(result.budget.utilization_percent, Decimal::ZERO);
        assert_eq!(result.budget.total_expenses, dec!(500));
    }

    #[test]
    fn test_utilization_percent() {
        let mut snapshot = snapshot_with_tasks(vec![]);
        snapshot.project.budget = dec!(1000);
        snapshot.expenses = vec![
            expense(1, dec!(500), date(2024, 5, 1)),
            expense(2, dec!(250), date(2024, 5, 2)),
        ];
        let today = date(2024, 6, 1);
        let window = TimeFilter::Overall.window(today);

        let result = measure(&snapshot, &window, today).unwrap();
        assert_eq!(result.budget.utilization_percent, dec!(75.0));
    }

    #[test]
    fn test_overall_progress_averages_milestones() {
        // Milestone 1 at 100 (one done task), milestone 2 at 0.
        let mut done = task(1, 1, TaskStatus::Done, TaskPriority::Medium, None);
        done.progress = 100;
        let open = task(2, 2, TaskStatus::Todo, TaskPriority::Medium, None);
        let snapshot = snapshot_with_tasks(vec![done, open]);
        let today = date(2024, 6, 1);
        let window = TimeFilter::Overall.window(today);

        let result = measure(&snapshot, &window, today).unwrap();
        assert_eq!(result.overall_progress, dec!(50.0));
    }

    #[test]
    fn test_task_stats() {
        let tasks = vec![
            task(1, 1, TaskStatus::Todo, TaskPriority::Low, None),
            task(2, 1, TaskStatus::InProgress, TaskPriority::Low, None),
            task(3, 1, TaskStatus::Blocked, TaskPriority::Low, None),
            task(4, 2, TaskStatus::Done, TaskPriority::Low, None),
            task(5, 2, TaskStatus::Done, TaskPriority::Low, None),
        ];
        let snapshot = snapshot_with_tasks(tasks);
        let today = date(2024, 6, 1);
        let window = TimeFilter::Overall.window(today);

        let result = measure(&snapshot, &window, today).unwrap();
        assert_eq!(result.tasks.total, 5);
        assert_eq!(result.tasks.todo, 1);
        assert_eq!(result.tasks.blocked, 1);
        assert_eq!(result.tasks.done, 2);
    }

    #[test]
    fn test_velocity_over_lifetime() {
        let today = date(2024, 6, 11);
        let mut tasks = Vec::new();
        for id in 1..=5 {
            let mut t = task(id, 1, TaskStatus::Done, TaskPriority::Low, None);
            t.progress = 100;
            tasks.push(t);
        }
        let mut snapshot = snapshot_with_tasks(tasks);
        snapshot.project.start_date = Some(date(2024, 6, 1));
        let window = TimeFilter::Overall.window(today);

        let result = measure(&snapshot, &window, today).unwrap();
        // 5 done over 10 elapsed days.
        assert_eq!(result.velocity_per_day, dec!(0.50));
    }

    #[test]
    fn test_estimated_completion_days_floors() {
        let today = date(2024, 6, 11);
        let mut tasks = Vec::new();
        for id in 1..=5 {
            tasks.push(task(id, 1, TaskStatus::Done, TaskPriority::Low, None));
        }
        for id in 6..=8 {
            tasks.push(task(id, 1, TaskStatus::Todo, TaskPriority::Low, None));
        }
        let mut snapshot = snapshot_with_tasks(tasks);
        snapshot.project.start_date = Some(date(2024, 6, 1));
        let window = TimeFilter::Overall.window(today);

        let result = measure(&snapshot, &window, today).unwrap();
        // velocity 0.5/day, 3 remaining -> 6 days exactly.
        assert_eq!(result.estimated_completion_days, Some(6));
    }

    #[test]
    fn test_zero_velocity_has_no_estimate() {
        let snapshot = snapshot_with_tasks(vec![task(
            1,
            1,
            TaskStatus::Todo,
            TaskPriority::Low,
            None,
        )]);
        let today = date(2024, 6, 1);
        let window = TimeFilter::Overall.window(today);

        let result = measure(&snapshot, &window, today).unwrap();
        assert_eq!(result.estimated_completion_days, None);
    }

    #[test]
    fn test_timeline_unknown_without_dates() {
        let snapshot = snapshot_with_tasks(vec![]);
        let today = date(2024, 6, 1);
        let window = TimeFilter::Overall.window(today);

        let result = measure(&snapshot, &window, today).unwrap();
        assert_eq!(result.timeline_status, TimelineStatus::Unknown);
    }

    #[test]
    fn test_timeline_statuses() {
        let today = date(2024, 6, 1);
        let window = TimeFilter::Overall.window(today);

        // Halfway through the plan with zero progress: behind schedule.
        let mut snapshot = snapshot_with_tasks(vec![task(
            1,
            1,
            TaskStatus::Todo,
            TaskPriority::Low,
            None,
        )]);
        snapshot.project.start_date = Some(date(2024, 5, 1));
        snapshot.project.end_date = Some(date(2024, 7, 1));
        let result = measure(&snapshot, &window, today).unwrap();
        assert_eq!(result.timeline_status, TimelineStatus::BehindSchedule);

        // Full progress: on track.
        let mut done = task(1, 1, TaskStatus::Done, TaskPriority::Low, None);
        done.progress = 100;
        let mut snapshot = snapshot_with_tasks(vec![done]);
        snapshot.project.start_date = Some(date(2024, 5, 1));
        snapshot.project.end_date = Some(date(2024, 7, 1));
        let result = measure(&snapshot, &window, today).unwrap();
        assert_eq!(result.timeline_status, TimelineStatus::OnTrack);

        // 45 vs expected ~50.8: slight delay.
        let mut half = task(1, 1, TaskStatus::InProgress, TaskPriority::Low, None);
        half.progress = 45;
        let mut snapshot = snapshot_with_tasks(vec![half]);
        snapshot.project.start_date = Some(date(2024, 5, 1));
        snapshot.project.end_date = Some(date(2024, 7, 1));
        let result = measure(&snapshot, &window, today).unwrap();
        assert_eq!(result.timeline_status, TimelineStatus::SlightDelay);
    }
}
