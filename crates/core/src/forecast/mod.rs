//! Monthly cash-flow forecasting.
//!
//! Expenses are bucketed by calendar month, the trailing window becomes a
//! zero-filled history, and the [`engine::ForecastEngine`] projects the next
//! months via the LLM with a closed-form least-squares fallback.

pub mod engine;
pub mod regression;
pub mod types;

use std::collections::BTreeMap;

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;

pub use engine::ForecastEngine;
pub use types::{CashFlowForecast, SeriesPoint};

use crate::analytics::types::ExpenseRecord;

/// Default trailing window, in months.
pub const DEFAULT_WINDOW_MONTHS: u32 = 4;
/// Default projection horizon, in months.
pub const DEFAULT_HORIZON_MONTHS: u32 = 3;

/// First day of the month `date` falls in.
#[must_use]
pub fn month_start(date: NaiveDate) -> NaiveDate {
    // with_day(1) cannot fail for day 1
    date.with_day(1).unwrap_or(date)
}

/// Sums expense amounts per calendar month, keyed by the first of the month.
#[must_use]
pub fn monthly_totals(expenses: &[ExpenseRecord]) -> BTreeMap<NaiveDate, Decimal> {
    let mut totals = BTreeMap::new();
    for expense in expenses {
        *totals.entry(month_start(expense.date)).or_insert(Decimal::ZERO) += expense.amount;
    }
    totals
}

/// Builds a contiguous history of `window_months` totals ending at the latest
/// observed month (or `today`'s month when there are no expenses). Months with
/// no expenses contribute zero.
#[must_use]
pub fn build_history(
    totals: &BTreeMap<NaiveDate, Decimal>,
    window_months: u32,
    today: NaiveDate,
) -> Vec<(NaiveDate, Decimal)> {
    let latest = totals
        .keys()
        .next_back()
        .copied()
        .unwrap_or_else(|| month_start(today));

    let mut history = Vec::with_capacity(window_months as usize);
    for back in (0..window_months).rev() {
        let month = latest - Months::new(back);
        let amount = totals.get(&month).copied().unwrap_or(Decimal::ZERO);
        history.push((month, amount));
    }
    history
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::test_support::expense;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_totals_buckets_by_month_start() {
        let expenses = vec![
            expense(1, dec!(100), date(2024, 3, 5)),
            expense(2, dec!(50), date(2024, 3, 28)),
            expense(3, dec!(75), date(2024, 4, 1)),
        ];

        let totals = monthly_totals(&expenses);
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&date(2024, 3, 1)], dec!(150));
        assert_eq!(totals[&date(2024, 4, 1)], dec!(75));
    }

    #[test]
    fn test_history_zero_fills_gaps() {
        let expenses = vec![
            expense(1, dec!(100), date(2024, 1, 15)),
            expense(2, dec!(300), date(2024, 4, 2)),
        ];
        let totals = monthly_totals(&expenses);

        let history = build_history(&totals, 4, date(2024, 6, 1));
        assert_eq!(history.len(), 4);
        assert_eq!(history[0], (date(2024, 1, 1), dec!(100)));
        assert_eq!(history[1], (date(2024, 2, 1), Decimal::ZERO));
        assert_eq!(history[2], (date(2024, 3, 1), Decimal::ZERO));
        assert_eq!(history[3], (date(2024, 4, 1), dec!(300)));
    }

    #[test]
    fn test_history_without_expenses_ends_at_current_month() {
        let totals = BTreeMap::new();

        let history = build_history(&totals, 3, date(2024, 6, 17));
        assert_eq!(history.len(), 3);
        assert_eq!(history[2].0, date(2024, 6, 1));
        assert_eq!(history[0].0, date(2024, 4, 1));
        assert!(history.iter().all(|(_, amount)| amount.is_zero()));
    }

    #[test]
    fn test_history_spans_year_boundary() {
        let totals = monthly_totals(&[expense(1, dec!(10), date(2024, 1, 10))]);

        let history = build_history(&totals, 4, date(2024, 6, 1));
        assert_eq!(history[0].0, date(2023, 10, 1));
        assert_eq!(history[3].0, date(2024, 1, 1));
    }
}
