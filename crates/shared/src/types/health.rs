//! Health color palette for project dimension scoring.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discrete health color token for one project dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HealthColor {
    /// Score 8-10.
    Green,
    /// Score 6-7.
    LightGreen,
    /// Score 4-5.
    Yellow,
    /// Score 2-3.
    Orange,
    /// Score below 2.
    Red,
    /// Unknown or missing input.
    Gray,
}

impl HealthColor {
    /// Maps a 1-10 subscore to the fixed palette. `None` means the inputs
    /// for the dimension were unknown and resolves to gray.
    #[must_use]
    pub fn from_score(score: Option<Decimal>) -> Self {
        let Some(score) = score else {
            return Self::Gray;
        };
        if score >= Decimal::from(8) {
            Self::Green
        } else if score >= Decimal::from(6) {
            Self::LightGreen
        } else if score >= Decimal::from(4) {
            Self::Yellow
        } else if score >= Decimal::from(2) {
            Self::Orange
        } else {
            Self::Red
        }
    }

    /// Hex string persisted on the project row.
    #[must_use]
    pub const fn hex(self) -> &'static str {
        match self {
            Self::Green => "#22c55e",
            Self::LightGreen => "#84cc16",
            Self::Yellow => "#eab308",
            Self::Orange => "#f97316",
            Self::Red => "#ef4444",
            Self::Gray => "#808080",
        }
    }

    /// Parses a persisted hex string back into a token. Unrecognized values
    /// resolve to gray rather than failing.
    #[must_use]
    pub fn from_hex(hex: &str) -> Self {
        match hex {
            "#22c55e" => Self::Green,
            "#84cc16" => Self::LightGreen,
            "#eab308" => Self::Yellow,
            "#f97316" => Self::Orange,
            "#ef4444" => Self::Red,
            _ => Self::Gray,
        }
    }
}

impl fmt::Display for HealthColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Green => "green",
            Self::LightGreen => "light-green",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Red => "red",
            Self::Gray => "gray",
        };
        f.write_str(name)
    }
}

/// The seven per-project health colors, in persistence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthColors {
    /// Scope dimension.
    pub scope: HealthColor,
    /// Time dimension.
    pub time: HealthColor,
    /// Cost dimension.
    pub cost: HealthColor,
    /// Cash-flow dimension.
    pub cash_flow: HealthColor,
    /// Safety dimension (blockers).
    pub safety: HealthColor,
    /// Risk dimension.
    pub risk: HealthColor,
    /// Quality dimension.
    pub quality: HealthColor,
}

impl HealthColors {
    /// All seven colors set to gray (never analyzed).
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            scope: HealthColor::Gray,
            time: HealthColor::Gray,
            cost: HealthColor::Gray,
            cash_flow: HealthColor::Gray,
            safety: HealthColor::Gray,
            risk: HealthColor::Gray,
            quality: HealthColor::Gray,
        }
    }

    /// The seven colors as an array in persistence order.
    #[must_use]
    pub const fn as_array(self) -> [HealthColor; 7] {
        [
            self.scope,
            self.time,
            self.cost,
            self.cash_flow,
            self.safety,
            self.risk,
            self.quality,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(10), HealthColor::Green)]
    #[case(dec!(8), HealthColor::Green)]
    #[case(dec!(7.5), HealthColor::LightGreen)]
    #[case(dec!(6), HealthColor::LightGreen)]
    #[case(dec!(5), HealthColor::Yellow)]
    #[case(dec!(4), HealthColor::Yellow)]
    #[case(dec!(3), HealthColor::Orange)]
    #[case(dec!(2), HealthColor::Orange)]
    #[case(dec!(1.9), HealthColor::Red)]
    #[case(dec!(1), HealthColor::Red)]
    fn test_palette(#[case] score: Decimal, #[case] expected: HealthColor) {
        assert_eq!(HealthColor::from_score(Some(score)), expected);
    }

    #[test]
    fn test_missing_score_is_gray() {
        assert_eq!(HealthColor::from_score(None), HealthColor::Gray);
        assert_eq!(HealthColor::Gray.hex(), "#808080");
    }

    #[test]
    fn test_hex_round_trip() {
        for color in [
            HealthColor::Green,
            HealthColor::LightGreen,
            HealthColor::Yellow,
            HealthColor::Orange,
            HealthColor::Red,
            HealthColor::Gray,
        ] {
            assert_eq!(HealthColor::from_hex(color.hex()), color);
        }
    }

    #[test]
    fn test_unrecognized_hex_is_gray() {
        assert_eq!(HealthColor::from_hex("#123456"), HealthColor::Gray);
    }
}
