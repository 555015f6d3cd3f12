//! Closed-form least squares over a monthly series.

use rust_decimal::Decimal;

/// Slope and intercept of the best-fit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinearFit {
    /// Value at x = 0.
    pub intercept: Decimal,
    /// Change per unit of x.
    pub slope: Decimal,
}

impl LinearFit {
    /// The fitted value at index `x`.
    #[must_use]
    pub fn at(&self, x: i64) -> Decimal {
        self.intercept + self.slope * Decimal::from(x)
    }
}

/// Fits `y = intercept + slope * x` with x = 0..n-1.
///
/// A single point (or a degenerate denominator) yields a flat line through
/// the mean.
#[must_use]
pub fn linear_fit(ys: &[Decimal]) -> LinearFit {
    let n = Decimal::from(ys.len());
    if ys.is_empty() {
        return LinearFit {
            intercept: Decimal::ZERO,
            slope: Decimal::ZERO,
        };
    }

    let mut sum_x = Decimal::ZERO;
    let mut sum_y = Decimal::ZERO;
    let mut sum_xy = Decimal::ZERO;
    let mut sum_xx = Decimal::ZERO;
    for (i, y) in ys.iter().enumerate() {
        let x = Decimal::from(i as u64);
        sum_x += x;
        sum_y += *y;
        sum_xy += x * *y;
        sum_xx += x * x;
    }

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.is_zero() {
        return LinearFit {
            intercept: sum_y / n,
            slope: Decimal::ZERO,
        };
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    LinearFit { intercept, slope }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fits_ascending_series() {
        let fit = linear_fit(&[dec!(100), dec!(200), dec!(300), dec!(400)]);
        assert_eq!(fit.slope, dec!(100));
        assert_eq!(fit.intercept, dec!(100));
        assert_eq!(fit.at(4), dec!(500));
    }

    #[test]
    fn test_flat_series_has_zero_slope() {
        let fit = linear_fit(&[dec!(50), dec!(50), dec!(50)]);
        assert_eq!(fit.slope, Decimal::ZERO);
        assert_eq!(fit.intercept, dec!(50));
    }

    #[test]
    fn test_single_point_is_flat_through_it() {
        let fit = linear_fit(&[dec!(42)]);
        assert_eq!(fit.slope, Decimal::ZERO);
        assert_eq!(fit.intercept, dec!(42));
    }

    #[test]
    fn test_empty_series_is_zero() {
        let fit = linear_fit(&[]);
        assert_eq!(fit.at(10), Decimal::ZERO);
    }

    #[test]
    fn test_descending_series() {
        let fit = linear_fit(&[dec!(400), dec!(300), dec!(200), dec!(100)]);
        assert_eq!(fit.slope, dec!(-100));
        assert_eq!(fit.at(4), Decimal::ZERO);
    }
}
