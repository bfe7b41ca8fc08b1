use serde::{Deserialize, Serialize};

use super::{check_sequence_length, lookup, normalize_sequence, PeriodAmount};
use crate::types::Money;
use crate::ScheduleResult;

/// Construction draw funded in each period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrawPolicy {
    /// Same draw every period
    Fixed(Money),
    /// One draw per period, exactly `term_periods` long
    PerPeriod(Vec<Money>),
}

impl DrawPolicy {
    /// Per-period draws normalised to `term` entries.
    pub fn per_period(values: Vec<Money>, term: u32) -> Self {
        DrawPolicy::PerPeriod(normalize_sequence(values, term))
    }

    /// Verify the sequence length invariant against the loan term.
    pub fn check_length(&self, term: u32) -> ScheduleResult<()> {
        match self {
            DrawPolicy::Fixed(_) => Ok(()),
            DrawPolicy::PerPeriod(values) => check_sequence_length("Draw", values.len(), term),
        }
    }
}

impl PeriodAmount for DrawPolicy {
    fn amount_for(&self, period: u32) -> Money {
        match self {
            DrawPolicy::Fixed(amount) => *amount,
            DrawPolicy::PerPeriod(values) => lookup(values, period),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fixed_draw_constant() {
        let policy = DrawPolicy::Fixed(dec!(200000));
        assert_eq!(policy.amount_for(1), dec!(200000));
        assert_eq!(policy.amount_for(36), dec!(200000));
        assert!(policy.check_length(36).is_ok());
    }

    #[test]
    fn test_per_period_padded_at_construction() {
        let policy = DrawPolicy::per_period(vec![dec!(10), dec!(20)], 4);
        assert_eq!(
            policy,
            DrawPolicy::PerPeriod(vec![dec!(10), dec!(20), Decimal::ZERO, Decimal::ZERO])
        );
        assert_eq!(policy.amount_for(2), dec!(20));
        assert_eq!(policy.amount_for(4), Decimal::ZERO);
        assert!(policy.check_length(4).is_ok());
    }

    #[test]
    fn test_unnormalised_sequence_rejected() {
        let policy = DrawPolicy::PerPeriod(vec![dec!(10)]);
        assert!(policy.check_length(3).is_err());
    }
}
