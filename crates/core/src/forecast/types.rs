//! Forecast output shapes.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One month of a forecast series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Month key, `YYYY-MM`.
    pub month: String,
    /// Human label, `MMM YYYY`.
    pub label: String,
    /// Amount, 2 decimals.
    pub amount: Decimal,
}

impl SeriesPoint {
    /// Builds a point for the month `date` falls in, rounding to 2 decimals.
    #[must_use]
    pub fn new(date: NaiveDate, amount: Decimal) -> Self {
        Self {
            month: date.format("%Y-%m").to_string(),
            label: date.format("%b %Y").to_string(),
            amount: amount.round_dp(2),
        }
    }
}

/// Per-project cash-flow forecast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CashFlowForecast {
    /// Project ID.
    pub project_id: i64,
    /// Project name.
    pub project_name: String,
    /// Trailing window length.
    pub window_months: u32,
    /// Projection horizon length.
    pub horizon_months: u32,
    /// Observed monthly totals, oldest first. Always `window_months` long.
    pub actuals: Vec<SeriesPoint>,
    /// Projected monthly totals. Always `horizon_months` long.
    pub forecast: Vec<SeriesPoint>,
    /// Residuals against the fitted line; empty when the LLM produced the
    /// forecast.
    pub variance: Vec<SeriesPoint>,
    /// When the forecast was generated.
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_series_point_formats_and_rounds() {
        let point = SeriesPoint::new(
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            dec!(123.456),
        );
        assert_eq!(point.month, "2024-03");
        assert_eq!(point.label, "Mar 2024");
        assert_eq!(point.amount, dec!(123.46));
    }
}
