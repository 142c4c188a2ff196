//! Household energy balance.

use std::fmt;

use serde::Serialize;

/// Largest residual treated as balanced.
pub const BALANCE_TOLERANCE: f64 = 1e-10;

/// Net balance of one step in kW.
///
/// Positive terms consume power (`load`, `charge`, `feed_in`), negative terms
/// supply it (`pv`, `discharge`, `purchase`). A physically consistent step
/// sums to zero.
pub fn net_balance_kw(
    load: f64,
    pv: f64,
    charge: f64,
    discharge: f64,
    feed_in: f64,
    purchase: f64,
) -> f64 {
    load - pv + charge - discharge + feed_in - purchase
}

/// Outcome of checking a whole balance series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BalanceCheck {
    Balanced,
    /// Exactly one step is out of balance.
    SingleStep { t: usize },
    /// More than one step is out of balance.
    MultipleSteps { count: usize },
}

impl BalanceCheck {
    /// Classifies `balance` against [`BALANCE_TOLERANCE`].
    pub fn from_series(balance: &[f64]) -> Self {
        let mut off = balance
            .iter()
            .enumerate()
            .filter(|(_, v)| v.abs() > BALANCE_TOLERANCE || v.is_nan())
            .map(|(t, _)| t);
        match (off.next(), off.count()) {
            (None, _) => Self::Balanced,
            (Some(t), 0) => Self::SingleStep { t },
            (Some(_), rest) => Self::MultipleSteps { count: rest + 1 },
        }
    }

    pub fn is_balanced(self) -> bool {
        self == Self::Balanced
    }
}

impl fmt::Display for BalanceCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Balanced => f.write_str("Energy balance check passed: All values are 0"),
            Self::SingleStep { t } => write!(f, "Warning: Energy imbalance at index {t}"),
            Self::MultipleSteps { .. } => {
                f.write_str("Warning: Energy imbalance, more than one value ≠ 0")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surplus_split_between_battery_and_grid_balances() {
        // pv=3, load=1 → charge 1.5, feed in 0.5
        assert_eq!(net_balance_kw(1.0, 3.0, 1.5, 0.0, 0.5, 0.0), 0.0);
    }

    #[test]
    fn deficit_covered_by_discharge_and_purchase_balances() {
        assert_eq!(net_balance_kw(2.0, 0.5, 0.0, 1.0, 0.0, 0.5), 0.0);
    }

    #[test]
    fn unserved_load_shows_as_positive_residual() {
        assert_eq!(net_balance_kw(2.0, 0.0, 0.0, 0.0, 0.0, 0.0), 2.0);
    }

    #[test]
    fn classifies_residual_series() {
        assert_eq!(BalanceCheck::from_series(&[0.0, 1e-12, -1e-11]), BalanceCheck::Balanced);
        assert_eq!(
            BalanceCheck::from_series(&[0.0, 0.3, 0.0]),
            BalanceCheck::SingleStep { t: 1 }
        );
        assert_eq!(
            BalanceCheck::from_series(&[0.1, 0.0, -0.2, 0.5]),
            BalanceCheck::MultipleSteps { count: 3 }
        );
    }

    #[test]
    fn messages_match_report_wording() {
        assert_eq!(
            BalanceCheck::Balanced.to_string(),
            "Energy balance check passed: All values are 0"
        );
        assert_eq!(
            BalanceCheck::SingleStep { t: 42 }.to_string(),
            "Warning: Energy imbalance at index 42"
        );
        assert_eq!(
            BalanceCheck::MultipleSteps { count: 2 }.to_string(),
            "Warning: Energy imbalance, more than one value ≠ 0"
        );
    }
}
