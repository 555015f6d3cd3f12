//! Health subscores and their mapping to the seven colors.
//!
//! Each dimension gets a 1-10 subscore from concrete metrics; unknown
//! inputs produce `None`, which maps to gray without failing the pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use projextpal_shared::{HealthColor, HealthColors};

use super::blockers::BlockerPrediction;
use super::overdue::OverdueAnalysis;
use super::performance::{PerformanceMetrics, TimelineStatus};
use super::types::{RiskLevel, RiskRecord, RiskStatus};

/// The seven subscores before palette mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthSubscores {
    /// Scope dimension.
    pub scope: Option<Decimal>,
    /// Time dimension.
    pub time: Option<Decimal>,
    /// Cost dimension.
    pub cost: Option<Decimal>,
    /// Cash-flow dimension.
    pub cash_flow: Option<Decimal>,
    /// Safety dimension.
    pub safety: Option<Decimal>,
    /// Risk dimension.
    pub risk: Option<Decimal>,
    /// Quality dimension.
    pub quality: Option<Decimal>,
}

impl HealthSubscores {
    /// Maps every subscore through the fixed palette.
    #[must_use]
    pub fn colors(&self) -> HealthColors {
        HealthColors {
            scope: HealthColor::from_score(self.scope),
            time: HealthColor::from_score(self.time),
            cost: HealthColor::from_score(self.cost),
            cash_flow: HealthColor::from_score(self.cash_flow),
            safety: HealthColor::from_score(self.safety),
            risk: HealthColor::from_score(self.risk),
            quality: HealthColor::from_score(self.quality),
        }
    }
}

fn clamp_score(score: Decimal) -> Decimal {
    score.clamp(Decimal::ONE, Decimal::TEN)
}

/// `scope`: (overall_progress + milestone_completion_rate) / 20.
fn scope_score(perf: &PerformanceMetrics) -> Option<Decimal> {
    let raw = (perf.overall_progress + perf.milestone_completion_rate) / Decimal::from(20);
    Some(clamp_score(raw.round_dp(1)))
}

/// `time`: piecewise by timeline status and overdue count.
fn time_score(perf: &PerformanceMetrics, overdue: &OverdueAnalysis) -> Option<Decimal> {
    let few_overdue = overdue.total_overdue <= 3;
    let score = match perf.timeline_status {
        TimelineStatus::Unknown => return None,
        TimelineStatus::OnTrack => {
            if overdue.total_overdue == 0 {
                9
            } else if few_overdue {
                7
            } else {
                5
            }
        }
        TimelineStatus::SlightDelay => {
            if few_overdue {
                5
            } else {
                4
            }
        }
        TimelineStatus::BehindSchedule => {
            if few_overdue {
                3
            } else {
                2
            }
        }
    };
    Some(Decimal::from(score))
}

/// `cost`: piecewise by budget utilization percent.
fn cost_score(perf: &PerformanceMetrics) -> Option<Decimal> {
    let util = perf.budget.utilization_percent;
    let score = if util <= Decimal::from(50) {
        9
    } else if util <= Decimal::from(75) {
        7
    } else if util <= Decimal::from(90) {
        5
    } else if util <= Decimal::ONE_HUNDRED {
        3
    } else {
        1
    };
    Some(Decimal::from(score))
}

/// `cash_flow`: piecewise by remaining budget percent. When the budget is
/// not positive, remaining defaults to 50% (matches the source system;
/// flagged for product).
fn cash_flow_score(perf: &PerformanceMetrics) -> Option<Decimal> {
    let remaining_pct = if perf.budget.budget <= Decimal::ZERO {
        Decimal::from(50)
    } else {
        (perf.budget.budget - perf.budget.total_expenses) / perf.budget.budget
            * Decimal::ONE_HUNDRED
    };
    let score = if remaining_pct >= Decimal::from(75) {
        9
    } else if remaining_pct >= Decimal::from(50) {
        7
    } else if remaining_pct >= Decimal::from(25) {
        5
    } else if remaining_pct >= Decimal::TEN {
        4
    } else if remaining_pct >= Decimal::ONE {
        3
    } else {
        1
    };
    Some(Decimal::from(score))
}

/// `safety`: piecewise by total blocker count across the five categories.
fn safety_score(blockers: &BlockerPrediction) -> Option<Decimal> {
    let total = blockers.total_blockers();
    let score = match total {
        0 => 9,
        1..=2 => 7,
        3..=5 => 5,
        6..=9 => 3,
        _ => 1,
    };
    Some(Decimal::from(score))
}

/// `risk`: piecewise by the (high risks, unmitigated risks) pair.
fn risk_score(risks: &[RiskRecord], blockers: &BlockerPrediction) -> Option<Decimal> {
    let unmitigated = blockers.unmitigated_risks.len();
    let high = risks
        .iter()
        .filter(|r| r.level == RiskLevel::High && r.status != RiskStatus::Closed)
        .count();
    let score = if unmitigated >= 3 {
        1
    } else if unmitigated >= 1 {
        3
    } else if high >= 5 {
        4
    } else if high >= 1 {
        6
    } else {
        9
    };
    Some(Decimal::from(score))
}

/// `quality`: composite of the LLM health score, completion rate, and
/// blocked-task percent. `None` when the LLM score is absent and no tasks
/// exist to infer from.
fn quality_score(perf: &PerformanceMetrics, llm_score: Option<u8>) -> Option<Decimal> {
    if llm_score.is_none() && perf.tasks.total == 0 {
        return None;
    }
    let completion_rate = if perf.tasks.total == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(perf.tasks.done) / Decimal::from(perf.tasks.total) * Decimal::ONE_HUNDRED
    };
    let blocked_pct = if perf.tasks.total == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(perf.tasks.blocked) / Decimal::from(perf.tasks.total)
            * Decimal::ONE_HUNDRED
    };
    let llm = Decimal::from(llm_score.unwrap_or(5));
    let composite =
        (llm + completion_rate / Decimal::TEN + (Decimal::TEN - blocked_pct / Decimal::TEN))
            / Decimal::from(3);
    Some(clamp_score(composite.round_dp(1)))
}

/// Computes all seven subscores from the collector outputs.
#[must_use]
pub fn subscores(
    perf: &PerformanceMetrics,
    overdue: &OverdueAnalysis,
    blockers: &BlockerPrediction,
    risks: &[RiskRecord],
    llm_score: Option<u8>,
) -> HealthSubscores {
    HealthSubscores {
        scope: scope_score(perf),
        time: time_score(perf, overdue),
        cost: cost_score(perf),
        cash_flow: cash_flow_score(perf),
        safety: safety_score(blockers),
        risk: risk_score(risks, blockers),
        quality: quality_score(perf, llm_score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::performance::{BudgetUsage, TaskStats};
    use rust_decimal_macros::dec;

    fn perf_with_budget(budget: Decimal, spent: Decimal) -> PerformanceMetrics {
        PerformanceMetrics {
            overall_progress: dec!(50),
            milestone_completion_rate: dec!(50),
            tasks: TaskStats::default(),
            velocity_per_day: Decimal::ZERO,
            budget: BudgetUsage {
                budget,
                total_expenses: spent,
                utilization_percent: if budget > Decimal::ZERO {
                    (spent / budget * Decimal::ONE_HUNDRED).round_dp(1)
                } else {
                    Decimal::ZERO
                },
            },
            timeline_status: TimelineStatus::Unknown,
            estimated_completion_days: None,
        }
    }

    fn empty_blockers() -> BlockerPrediction {
        BlockerPrediction {
            overloaded_team_members: vec![],
            stalled_milestones: vec![],
            dependency_risks: vec![],
            unmitigated_risks: vec![],
            resource_conflicts: vec![],
        }
    }

    #[test]
    fn test_cash_flow_five_percent_remaining_is_orange() {
        // Budget 1000, spent 950: remaining 5% -> subscore 3 -> orange.
        let perf = perf_with_budget(dec!(1000), dec!(950));
        let score = cash_flow_score(&perf).unwrap();
        assert_eq!(score, dec!(3));
        assert_eq!(HealthColor::from_score(Some(score)), HealthColor::Orange);
    }

    #[test]
    fn test_cash_flow_zero_budget_uses_fifty_default() {
        let perf = perf_with_budget(Decimal::ZERO, dec!(500));
        let score = cash_flow_score(&perf).unwrap();
        assert_eq!(score, dec!(7));
        assert_eq!(
            HealthColor::from_score(Some(score)),
            HealthColor::LightGreen
        );
    }

    #[test]
    fn test_cost_no_expenses_is_green() {
        let perf = perf_with_budget(dec!(1000), Decimal::ZERO);
        let score = cost_score(&perf).unwrap();
        assert_eq!(HealthColor::from_score(Some(score)), HealthColor::Green);
    }

    #[test]
    fn test_cost_over_budget_is_red() {
        let perf = perf_with_budget(dec!(1000), dec!(1200));
        assert_eq!(cost_score(&perf).unwrap(), dec!(1));
    }

    #[test]
    fn test_scope_score() {
        let perf = perf_with_budget(dec!(1000), Decimal::ZERO);
        // (50 + 50) / 20 = 5
        assert_eq!(scope_score(&perf).unwrap(), dec!(5.0));
    }

    #[test]
    fn test_time_unknown_is_gray() {
        let perf = perf_with_budget(dec!(1000), Decimal::ZERO);
        let overdue = OverdueAnalysis {
            total_overdue: 0,
            by_milestone: vec![],
            by_priority: std::collections::BTreeMap::new(),
            by_assignee: vec![],
            average_overdue_days: Decimal::ZERO,
            most_affected_milestone: None,
        };
        assert_eq!(time_score(&perf, &overdue), None);
        let scores = subscores(&perf, &overdue, &empty_blockers(), &[], None);
        assert_eq!(scores.colors().time, HealthColor::Gray);
    }

    #[test]
    fn test_safety_piecewise() {
        assert_eq!(safety_score(&empty_blockers()).unwrap(), dec!(9));
        let mut blockers = empty_blockers();
        blockers.unmitigated_risks = vec![
            super::super::blockers::UnmitigatedRisk {
                risk_id: 1,
                title: String::new(),
                severity: super::super::blockers::Severity::High,
            };
            4
        ];
        assert_eq!(safety_score(&blockers).unwrap(), dec!(5));
    }

    #[test]
    fn test_risk_score_unmitigated_dominates() {
        let mut blockers = empty_blockers();
        blockers.unmitigated_risks = vec![super::super::blockers::UnmitigatedRisk {
            risk_id: 1,
            title: String::new(),
            severity: super::super::blockers::Severity::High,
        }];
        assert_eq!(risk_score(&[], &blockers).unwrap(), dec!(3));
    }

    #[test]
    fn test_quality_none_without_signal() {
        let perf = perf_with_budget(dec!(1000), Decimal::ZERO);
        assert_eq!(quality_score(&perf, None), None);
        // An LLM score alone is enough signal.
        assert!(quality_score(&perf, Some(5)).is_some());
    }

    #[test]
    fn test_all_colors_come_from_palette() {
        let perf = perf_with_budget(dec!(1000), dec!(400));
        let overdue = OverdueAnalysis {
            total_overdue: 2,
            by_milestone: vec![],
            by_priority: std::collections::BTreeMap::new(),
            by_assignee: vec![],
            average_overdue_days: dec!(4.5),
            most_affected_milestone: None,
        };
        let scores = subscores(&perf, &overdue, &empty_blockers(), &[], Some(7));
        for color in scores.colors().as_array() {
            assert!(matches!(
                color,
                HealthColor::Green
                    | HealthColor::LightGreen
                    | HealthColor::Yellow
                    | HealthColor::Orange
                    | HealthColor::Red
                    | HealthColor::Gray
            ));
        }
    }
}
