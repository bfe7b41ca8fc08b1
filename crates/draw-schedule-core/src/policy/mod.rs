//! Per-period amount policies driving the schedule recurrence.

pub mod draw;
pub mod interest;
pub mod paydown;

pub use draw::DrawPolicy;
pub use interest::InterestPolicy;
pub use paydown::{PaydownPolicy, PaydownSchedule, UnitSale};

use rust_decimal::Decimal;

use crate::error::ScheduleError;
use crate::types::Money;
use crate::ScheduleResult;

/// Anything that supplies an amount for a 1-based period.
pub trait PeriodAmount {
    fn amount_for(&self, period: u32) -> Money;
}

/// Pad with zeros or truncate so the result has exactly `term` entries.
pub fn normalize_sequence<T: Clone + Default>(mut values: Vec<T>, term: u32) -> Vec<T> {
    values.resize(term as usize, T::default());
    values
}

/// Value at the 1-based `period`, zero when out of range.
pub(crate) fn lookup(values: &[Money], period: u32) -> Money {
    period
        .checked_sub(1)
        .and_then(|idx| values.get(idx as usize))
        .copied()
        .unwrap_or(Decimal::ZERO)
}

pub(crate) fn check_sequence_length(
    policy: &str,
    actual: usize,
    term: u32,
) -> ScheduleResult<()> {
    if actual != term as usize {
        return Err(ScheduleError::Configuration(format!(
            "{policy} sequence has {actual} entries but the term is {term} periods"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_pads_short_list() {
        let out = normalize_sequence(vec![dec!(1), dec!(2)], 5);
        assert_eq!(out, vec![dec!(1), dec!(2), dec!(0), dec!(0), dec!(0)]);
    }

    #[test]
    fn test_normalize_truncates_long_list() {
        let out = normalize_sequence(vec![dec!(1), dec!(2), dec!(3), dec!(4)], 2);
        assert_eq!(out, vec![dec!(1), dec!(2)]);
    }

    #[test]
    fn test_lookup_out_of_range_is_zero() {
        let values = [dec!(5), dec!(6)];
        assert_eq!(lookup(&values, 0), Decimal::ZERO);
        assert_eq!(lookup(&values, 2), dec!(6));
        assert_eq!(lookup(&values, 3), Decimal::ZERO);
    }

    #[test]
    fn test_length_check() {
        assert!(check_sequence_length("Draw", 3, 3).is_ok());
        let err = check_sequence_length("Draw", 2, 3).unwrap_err();
        assert!(matches!(err, ScheduleError::Configuration(_)));
    }
}
