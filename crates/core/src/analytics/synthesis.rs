//! Insight synthesis.
//!
//! Merges the collector outputs, asks the LLM for an executive summary in
//! JSON mode, and falls back to a deterministic report when the LLM is
//! unavailable. The LLM contributes prose only; every persisted value is
//! rule-derived.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::llm::LlmClient;

use super::blockers::BlockerPrediction;
use super::context::ContextMetrics;
use super::overdue::OverdueAnalysis;
use super::performance::{PerformanceMetrics, TimelineStatus};
use super::types::ProjectInfo;

/// LLM-scored overall health.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthScore {
    /// Score 1-10.
    pub score: u8,
    /// One-sentence justification.
    pub justification: String,
}

/// The synthesized insight report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightReport {
    /// Executive summary prose.
    pub executive_summary: String,
    /// Most pressing risks, ordered.
    pub top_risks: Vec<String>,
    /// Actionable recommendations.
    pub recommendations: Vec<String>,
    /// Overall health score.
    pub health_score: HealthScore,
    /// What is going well.
    pub positive_highlights: Vec<String>,
    /// Whether the deterministic fallback produced this report.
    pub fallback: bool,
}

/// Inputs to synthesis, bundled to keep the call site readable.
#[derive(Debug, Clone)]
pub struct SynthesisInputs<'a> {
    /// Project header.
    pub project: &'a ProjectInfo,
    /// Overdue analysis.
    pub overdue: &'a OverdueAnalysis,
    /// Blocker prediction.
    pub blockers: &'a BlockerPrediction,
    /// Performance metrics.
    pub performance: &'a PerformanceMetrics,
    /// Contextual metrics.
    pub context: &'a ContextMetrics,
}

const SYSTEM_PROMPT: &str = "You are a senior program management analyst. \
Respond with a single JSON object with keys: executive_summary (string), \
top_risks (array of strings), recommendations (array of strings), \
health_score (object with integer score 1-10 and string justification), \
positive_highlights (array of strings).";

fn user_prompt(inputs: &SynthesisInputs<'_>) -> String {
    json!({
        "project": {
            "name": inputs.project.name,
            "status": inputs.project.status,
            "budget": inputs.project.budget,
        },
        "overdue": inputs.overdue,
        "blockers": inputs.blockers,
        "performance": inputs.performance,
        "context": inputs.context,
    })
    .to_string()
}

fn parse_report(value: &serde_json::Value) -> Option<InsightReport> {
    let summary = value.get("executive_summary")?.as_str()?.to_string();
    let score = value.get("health_score")?.get("score")?.as_u64()?;
    if !(1..=10).contains(&score) {
        return None;
    }
    let justification = value
        .get("health_score")?
        .get("justification")?
        .as_str()?
        .to_string();
    let strings = |key: &str| -> Vec<String> {
        value
            .get(key)
            .and_then(|v| v.as_array())
            .map(|a| {
                a.iter()
                    .filter_map(|s| s.as_str().map(String::from))
                    .collect()
            })
            .unwrap_or_default()
    };
    Some(InsightReport {
        executive_summary: summary,
        top_risks: strings("top_risks"),
        recommendations: strings("recommendations"),
        health_score: HealthScore {
            score: u8::try_from(score).ok()?,
            justification,
        },
        positive_highlights: strings("positive_highlights"),
        fallback: false,
    })
}

/// Deterministic fallback report with a neutral score of 5.
#[must_use]
pub fn fallback_report(inputs: &SynthesisInputs<'_>) -> InsightReport {
    let perf = inputs.performance;
    let mut top_risks = Vec::new();
    if inputs.overdue.total_overdue > 0 {
        top_risks.push(format!(
            "{} overdue tasks, {} days overdue on average",
            inputs.overdue.total_overdue, inputs.overdue.average_overdue_days
        ));
    }
    for risk in &inputs.blockers.unmitigated_risks {
        top_risks.push(format!("Unmitigated high risk: {}", risk.title));
    }
    for member in &inputs.blockers.overloaded_team_members {
        top_risks.push(format!(
            "{} is overloaded with {} active tasks",
            member.name, member.active_tasks
        ));
    }

    let mut recommendations = Vec::new();
    if !inputs.blockers.unmitigated_risks.is_empty() {
        recommendations.push("Author mitigation plans for open high risks".to_string());
    }
    if inputs.overdue.total_overdue > 0 {
        recommendations.push("Re-plan or reassign overdue tasks".to_string());
    }
    if perf.budget.utilization_percent > Decimal::from(90) {
        recommendations.push("Review spend: budget utilization above 90%".to_string());
    }
    if recommendations.is_empty() {
        recommendations.push("Keep the current cadence".to_string());
    }

    let mut positive_highlights = Vec::new();
    if perf.timeline_status == TimelineStatus::OnTrack {
        positive_highlights.push("Schedule is on track".to_string());
    }
    if inputs.blockers.total_blockers() == 0 {
        positive_highlights.push("No predicted blockers".to_string());
    }

    InsightReport {
        executive_summary: format!(
            "{} is {}% complete with {}% of milestones done; {} blockers predicted.",
            inputs.project.name,
            perf.overall_progress,
            perf.milestone_completion_rate,
            inputs.blockers.total_blockers()
        ),
        top_risks,
        recommendations,
        health_score: HealthScore {
            score: 5,
            justification: "Neutral score: analysis produced without LLM input".to_string(),
        },
        positive_highlights,
        fallback: true,
    }
}

/// Synthesizes the insight report, using the LLM when available.
///
/// Every LLM failure mode collapses into the deterministic fallback; this
/// function itself never fails.
pub async fn synthesize(
    llm: &dyn LlmClient,
    inputs: &SynthesisInputs<'_>,
) -> InsightReport {
    let user = user_prompt(inputs);
    match llm
        .complete_json(inputs.project.company_id, SYSTEM_PROMPT, &user)
        .await
    {
        Ok(value) => parse_report(&value).unwrap_or_else(|| fallback_report(inputs)),
        Err(_) => fallback_report(inputs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::performance::{BudgetUsage, TaskStats};
    use crate::analytics::types::ProjectStatus;
    use crate::llm::{DisabledLlm, MockLlmClient};
    use rust_decimal_macros::dec;

    fn project() -> ProjectInfo {
        ProjectInfo {
            id: 1,
            name: "Atlas".into(),
            company_id: 10,
            status: ProjectStatus::InProgress,
            start_date: None,
            end_date: None,
            budget: dec!(1000),
        }
    }

    fn performance() -> PerformanceMetrics {
        PerformanceMetrics {
            overall_progress: dec!(40),
            milestone_completion_rate: dec!(25),
            tasks: TaskStats {
                total: 4,
                todo: 2,
                in_progress: 1,
                blocked: 0,
                done: 1,
            },
            velocity_per_day: dec!(0.1),
            budget: BudgetUsage {
                budget: dec!(1000),
                total_expenses: dec!(100),
                utilization_percent: dec!(10),
            },
            timeline_status: TimelineStatus::OnTrack,
            estimated_completion_days: Some(30),
        }
    }

    fn empty_overdue() -> OverdueAnalysis {
        OverdueAnalysis {
            total_overdue: 0,
            by_milestone: vec![],
            by_priority: std::collections::BTreeMap::new(),
            by_assignee: vec![],
            average_overdue_days: Decimal::ZERO,
            most_affected_milestone: None,
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

    #[tokio::test]
    async fn test_disabled_llm_falls_back_with_neutral_score() {
        let project = project();
        let performance = performance();
        let overdue = empty_overdue();
        let blockers = empty_blockers();
        let context = ContextMetrics::default();
        let inputs = SynthesisInputs {
            project: &project,
            overdue: &overdue,
            blockers: &blockers,
            performance: &performance,
            context: &context,
        };

        let report = synthesize(&DisabledLlm, &inputs).await;
        assert!(report.fallback);
        assert_eq!(report.health_score.score, 5);
        assert!(!report.recommendations.is_empty());
    }

    #[tokio::test]
    async fn test_valid_llm_response_is_used() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete_json().returning(|_, _, _| {
            Ok(serde_json::json!({
                "executive_summary": "Going well.",
                "top_risks": ["scope creep"],
                "recommendations": ["freeze scope"],
                "health_score": {"score": 8, "justification": "solid"},
                "positive_highlights": ["velocity"]
            }))
        });

        let project = project();
        let performance = performance();
        let overdue = empty_overdue();
        let blockers = empty_blockers();
        let context = ContextMetrics::default();
        let inputs = SynthesisInputs {
            project: &project,
            overdue: &overdue,
            blockers: &blockers,
            performance: &performance,
            context: &context,
        };

        let report = synthesize(&llm, &inputs).await;
        assert!(!report.fallback);
        assert_eq!(report.health_score.score, 8);
        assert_eq!(report.executive_summary, "Going well.");
    }

    #[tokio::test]
    async fn test_malformed_llm_response_falls_back() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete_json()
            .returning(|_, _, _| Ok(serde_json::json!({"score": 200})));

        let project = project();
        let performance = performance();
        let overdue = empty_overdue();
        let blockers = empty_blockers();
        let context = ContextMetrics::default();
        let inputs = SynthesisInputs {
            project: &project,
            overdue: &overdue,
            blockers: &blockers,
            performance: &performance,
            context: &context,
        };

        let report = synthesize(&llm, &inputs).await;
        assert!(report.fallback);
        assert_eq!(report.health_score.score, 5);
    }

    #[tokio::test]
    async fn test_out_of_range_score_falls_back() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete_json().returning(|_, _, _| {
            Ok(serde_json::json!({
                "executive_summary": "x",
                "health_score": {"score": 11, "justification": "y"}
            }))
        });

        let project = project();
        let performance = performance();
        let overdue = empty_overdue();
        let blockers = empty_blockers();
        let context = ContextMetrics::default();
        let inputs = SynthesisInputs {
            project: &project,
            overdue: &overdue,
            blockers: &blockers,
            performance: &performance,
            context: &context,
        };

        let report = synthesize(&llm, &inputs).await;
        assert!(report.fallback);
    }

    #[test]
    fn test_fallback_surfaces_overdue_and_risks() {
        let project = project();
        let performance = performance();
        let mut overdue = empty_overdue();
        overdue.total_overdue = 3;
        overdue.average_overdue_days = dec!(12.0);
        let mut blockers = empty_blockers();
        blockers.unmitigated_risks = vec![crate::analytics::blockers::UnmitigatedRisk {
            risk_id: 1,
            title: "Vendor lock".into(),
            severity: crate::analytics::blockers::Severity::High,
        }];
        let context = ContextMetrics::default();
        let inputs = SynthesisInputs {
            project: &project,
            overdue: &overdue,
            blockers: &blockers,
            performance: &performance,
            context: &context,
        };

        let report = fallback_report(&inputs);
        assert_eq!(report.top_risks.len(), 2);
        assert!(report.top_risks[1].contains("Vendor lock"));
        assert!(
            report
                .recommendations
                .iter()
                .any(|r| r.contains("mitigation"))
        );
    }
}
