use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::generator::PeriodRecord;
use crate::error::ScheduleError;
use crate::types::Money;
use crate::ScheduleResult;

/// Totals over a generated schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub total_interest: Money,
    pub total_construction_draws: Money,
    /// Construction draws plus any capitalised interest
    pub total_draws: Money,
    pub total_paydowns: Money,
    pub final_balance: Money,
}

/// Totals over `records`. Sums are checked: a total outside the decimal
/// range is an `Overflow` even when every single record fits.
pub fn summarize(records: &[PeriodRecord]) -> ScheduleResult<ScheduleSummary> {
    let total = |label: &str, field: fn(&PeriodRecord) -> Money| {
        records
            .iter()
            .try_fold(Decimal::ZERO, |acc, r| acc.checked_add(field(r)))
            .ok_or_else(|| ScheduleError::Overflow(format!("{label} leaves the decimal range")))
    };

    Ok(ScheduleSummary {
        total_interest: total("total interest", |r| r.interest_draw)?,
        total_construction_draws: total("total construction draws", |r| r.construction_draw)?,
        total_draws: total("total draws", |r| r.total_draw)?,
        total_paydowns: total("total paydowns", |r| r.paydown)?,
        final_balance: records
            .last()
            .map(|r| r.ending_balance)
            .unwrap_or(Decimal::ZERO),
    })
}
