//! The forecast engine: LLM projection with a least-squares fallback.

use chrono::{DateTime, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::json;

use projextpal_shared::AppError;

use crate::analytics::types::{ExpenseRecord, ProjectInfo};
use crate::llm::LlmClient;

use super::regression::{self, LinearFit};
use super::types::{CashFlowForecast, SeriesPoint};
use super::{build_history, monthly_totals};

const SYSTEM_PROMPT: &str = "You are a financial forecasting assistant. Given \
a monthly expense history, respond with a single JSON object containing a \
\"predictions\" array of exactly the requested number of numeric values, \
oldest first.";

/// Projects per-project monthly spend.
#[derive(Debug, Clone, Copy, Default)]
pub struct ForecastEngine;

impl ForecastEngine {
    /// Forecasts the next `horizon_months` of spend from the trailing
    /// `window_months` of expenses.
    ///
    /// The LLM is tried first; any failure (disabled, timeout, wrong shape)
    /// falls back to a closed-form linear fit. Every emitted amount is
    /// clipped at zero and rounded to 2 decimals.
    pub async fn forecast(
        &self,
        project: &ProjectInfo,
        expenses: &[ExpenseRecord],
        window_months: u32,
        horizon_months: u32,
        llm: &dyn LlmClient,
        now: DateTime<Utc>,
    ) -> Result<CashFlowForecast, AppError> {
        if window_months < 1 {
            return Err(AppError::Validation("window_months must be at least 1".into()));
        }
        if horizon_months < 1 {
            return Err(AppError::Validation("horizon_months must be at least 1".into()));
        }

        let totals = monthly_totals(expenses);
        let history = build_history(&totals, window_months, now.date_naive());
        let amounts: Vec<Decimal> = history.iter().map(|(_, a)| *a).collect();
        let latest_month = history
            .last()
            .map(|(m, _)| *m)
            .unwrap_or_else(|| super::month_start(now.date_naive()));

        let (predictions, variance) =
            match self.llm_predictions(project, llm, &history, horizon_months).await {
                Some(predictions) => (predictions, Vec::new()),
                None => fallback_predictions(&amounts, horizon_months, &history),
            };

        let actuals = history
            .iter()
            .map(|(month, amount)| SeriesPoint::new(*month, *amount))
            .collect();
        let forecast = predictions
            .into_iter()
            .enumerate()
            .map(|(i, amount)| {
                let month = latest_month + Months::new(i as u32 + 1);
                SeriesPoint::new(month, amount.max(Decimal::ZERO))
            })
            .collect();

        Ok(CashFlowForecast {
            project_id: project.id,
            project_name: project.name.clone(),
            window_months,
            horizon_months,
            actuals,
            forecast,
            variance,
            generated_at: now,
        })
    }

    /// Asks the LLM for predictions; `None` on any failure or shape mismatch.
    async fn llm_predictions(
        &self,
        project: &ProjectInfo,
        llm: &dyn LlmClient,
        history: &[(NaiveDate, Decimal)],
        horizon_months: u32,
    ) -> Option<Vec<Decimal>> {
        let pairs: Vec<_> = history
            .iter()
            .map(|(month, amount)| {
                json!({"month": month.format("%Y-%m").to_string(), "amount": amount})
            })
            .collect();
        let user = json!({
            "history": pairs,
            "horizon_months": horizon_months,
        })
        .to_string();

        let value = llm
            .complete_json(project.company_id, SYSTEM_PROMPT, &user)
            .await
            .ok()?;
        let predictions = value.get("predictions")?.as_array()?;
        if predictions.len() != horizon_months as usize {
            return None;
        }
        predictions
            .iter()
            .map(|v| {
                v.as_f64()
                    .and_then(|f| Decimal::try_from(f).ok())
                    .or_else(|| v.as_i64().map(Decimal::from))
            })
            .collect()
    }
}

/// Linear-fit predictions plus the residual series.
fn fallback_predictions(
    amounts: &[Decimal],
    horizon_months: u32,
    history: &[(NaiveDate, Decimal)],
) -> (Vec<Decimal>, Vec<SeriesPoint>) {
    let fit: LinearFit = regression::linear_fit(amounts);
    let n = amounts.len() as i64;

    let predictions = (1..=i64::from(horizon_months))
        .map(|i| fit.at(n - 1 + i).max(Decimal::ZERO))
        .collect();

    let variance = history
        .iter()
        .enumerate()
        .map(|(i, (month, amount))| SeriesPoint::new(*month, *amount - fit.at(i as i64)))
        .collect();

    (predictions, variance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::expense;
    use crate::analytics::types::ProjectStatus;
    use crate::llm::{DisabledLlm, MockLlmClient};
    use rust_decimal_macros::dec;

    fn project() -> ProjectInfo {
        ProjectInfo {
            id: 1,
            name: "Atlas".into(),
            company_id: 1,
            status: ProjectStatus::InProgress,
            start_date: None,
            end_date: None,
            budget: dec!(10000),
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        date(y, m, d).and_hms_opt(12, 0, 0).unwrap().and_utc()
    }

    fn monthly(amounts: &[Decimal]) -> Vec<ExpenseRecord> {
        amounts
            .iter()
            .enumerate()
            .map(|(i, amount)| expense(i as i64 + 1, *amount, date(2024, i as u32 + 1, 10)))
            .collect()
    }

    #[tokio::test]
    async fn test_linear_fallback_projects_the_trend() {
        let expenses = monthly(&[dec!(100), dec!(200), dec!(300), dec!(400)]);
        let engine = ForecastEngine;

        let result = engine
            .forecast(&project(), &expenses, 4, 3, &DisabledLlm, at(2024, 6, 1))
            .await
            .unwrap();

        let amounts: Vec<Decimal> = result.forecast.iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![dec!(500.00), dec!(600.00), dec!(700.00)]);
        assert_eq!(result.forecast[0].month, "2024-05");
        assert_eq!(result.forecast[2].month, "2024-07");
        assert_eq!(result.variance.len(), 4);
    }

    #[tokio::test]
    async fn test_flat_zero_history_forecasts_zero() {
        let expenses = monthly(&[dec!(0), dec!(0), dec!(0), dec!(0)]);
        let engine = ForecastEngine;

        let result = engine
            .forecast(&project(), &expenses, 4, 3, &DisabledLlm, at(2024, 6, 1))
            .await
            .unwrap();

        assert_eq!(result.forecast.len(), 3);
        assert!(result.forecast.iter().all(|p| p.amount == dec!(0.00)));
    }

    #[tokio::test]
    async fn test_declining_trend_clips_at_zero() {
        let expenses = monthly(&[dec!(300), dec!(200), dec!(100), dec!(0)]);
        let engine = ForecastEngine;

        let result = engine
            .forecast(&project(), &expenses, 4, 3, &DisabledLlm, at(2024, 6, 1))
            .await
            .unwrap();

        assert!(result.forecast.iter().all(|p| p.amount >= Decimal::ZERO));
        assert_eq!(result.forecast[0].amount, dec!(0.00));
    }

    #[tokio::test]
    async fn test_series_lengths_match_parameters() {
        let expenses = monthly(&[dec!(50)]);
        let engine = ForecastEngine;

        let result = engine
            .forecast(&project(), &expenses, 6, 2, &DisabledLlm, at(2024, 6, 1))
            .await
            .unwrap();

        assert_eq!(result.actuals.len(), 6);
        assert_eq!(result.forecast.len(), 2);
    }

    #[tokio::test]
    async fn test_llm_predictions_used_when_shape_is_valid() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete_json()
            .returning(|_, _, _| Ok(serde_json::json!({"predictions": [150.5, 160, 170.25]})));
        let expenses = monthly(&[dec!(100), dec!(120), dec!(130), dec!(140)]);
        let engine = ForecastEngine;

        let result = engine
            .forecast(&project(), &expenses, 4, 3, &llm, at(2024, 6, 1))
            .await
            .unwrap();

        let amounts: Vec<Decimal> = result.forecast.iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![dec!(150.50), dec!(160.00), dec!(170.25)]);
        assert!(result.variance.is_empty());
    }

    #[tokio::test]
    async fn test_llm_wrong_length_falls_back() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete_json()
            .returning(|_, _, _| Ok(serde_json::json!({"predictions": [1, 2]})));
        let expenses = monthly(&[dec!(100), dec!(200), dec!(300), dec!(400)]);
        let engine = ForecastEngine;

        let result = engine
            .forecast(&project(), &expenses, 4, 3, &llm, at(2024, 6, 1))
            .await
            .unwrap();

        assert_eq!(result.forecast[0].amount, dec!(500.00));
        assert!(!result.variance.is_empty());
    }

    #[tokio::test]
    async fn test_llm_non_numeric_falls_back() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete_json().returning(|_, _, _| {
            Ok(serde_json::json!({"predictions": ["a", "b", "c"]}))
        });
        let expenses = monthly(&[dec!(100), dec!(200), dec!(300), dec!(400)]);
        let engine = ForecastEngine;

        let result = engine
            .forecast(&project(), &expenses, 4, 3, &llm, at(2024, 6, 1))
            .await
            .unwrap();

        assert_eq!(result.forecast[0].amount, dec!(500.00));
    }

    #[tokio::test]
    async fn test_zero_window_is_rejected() {
        let engine = ForecastEngine;
        let err = engine
            .forecast(&project(), &[], 0, 3, &DisabledLlm, at(2024, 6, 1))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_no_expenses_history_ends_at_current_month() {
        let engine = ForecastEngine;

        let result = engine
            .forecast(&project(), &[], 4, 3, &DisabledLlm, at(2024, 6, 15))
            .await
            .unwrap();

        assert_eq!(result.actuals[3].month, "2024-06");
        assert_eq!(result.forecast[0].month, "2024-07");
        assert!(result.forecast.iter().all(|p| p.amount == dec!(0.00)));
    }
}
