//! Month-by-month construction loan schedule.

pub mod generator;
pub mod summary;
pub mod table;

pub use generator::{generate, LoanParameters, PeriodRecord};
pub use summary::{summarize, ScheduleSummary};
pub use table::{flat_table, FlatRow};

use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::config::ScheduleConfig;
use crate::types::{with_metadata, ComputationOutput};
use crate::ScheduleResult;

/// Generated periods plus their totals.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOutput {
    pub periods: Vec<PeriodRecord>,
    pub summary: ScheduleSummary,
}

/// Resolve `config`, run the recurrence and summarise it.
pub fn build_schedule(config: &ScheduleConfig) -> ScheduleResult<ComputationOutput<ScheduleOutput>> {
    let start = Instant::now();
    let resolved = config.resolve()?;

    let periods = generate(
        &resolved.loan,
        &resolved.calendar,
        &resolved.draw,
        &resolved.paydown,
        resolved.interest,
    )?;
    let summary = summarize(&periods)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Construction Draw Schedule (monthly rate = annual / 12, month-end periods)",
        &serde_json::json!({
            "principal": resolved.loan.principal.to_string(),
            "annual_rate": resolved.loan.annual_rate.to_string(),
            "monthly_rate": resolved.loan.monthly_rate().to_string(),
            "term_periods": resolved.loan.term_periods,
            "first_period_date": resolved.calendar.period_date(1).to_string(),
            "interest": resolved.interest.label(),
            "paydown_start_period": resolved.paydown.start_period(),
        }),
        resolved.warnings,
        elapsed,
        ScheduleOutput { periods, summary },
    ))
}
