use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;
use crate::error::ScheduleError;
use crate::policy::{DrawPolicy, InterestPolicy, PaydownPolicy, PeriodAmount};
use crate::types::{Money, Rate};
use crate::ScheduleResult;

const MONTHS_PER_YEAR: Decimal = dec!(12);

/// Headline terms of the construction loan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    /// Opening balance at the start of period 1
    pub principal: Money,
    /// Nominal annual rate (0.08 = 8%)
    pub annual_rate: Rate,
    /// Number of monthly periods
    pub term_periods: u32,
}

impl LoanParameters {
    pub fn validate(&self) -> ScheduleResult<()> {
        if self.principal <= Decimal::ZERO {
            return Err(ScheduleError::InvalidInput {
                field: "principal".into(),
                reason: "Loan principal must be positive".into(),
            });
        }
        if self.annual_rate < Decimal::ZERO || self.annual_rate > Decimal::ONE {
            return Err(ScheduleError::InvalidInput {
                field: "annual_rate".into(),
                reason: "Annual rate must be a decimal fraction between 0 and 1".into(),
            });
        }
        if self.term_periods == 0 {
            return Err(ScheduleError::InvalidInput {
                field: "term_periods".into(),
                reason: "Term must be at least 1 month".into(),
            });
        }
        Ok(())
    }

    /// Annual rate divided evenly over twelve months.
    pub fn monthly_rate(&self) -> Rate {
        self.annual_rate / MONTHS_PER_YEAR
    }
}

/// One month of the draw schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRecord {
    pub period: u32,
    pub date: NaiveDate,
    pub beginning_balance: Money,
    pub construction_draw: Money,
    pub interest_draw: Money,
    pub total_draw: Money,
    pub cumulative_drawn: Money,
    pub paydown: Money,
    pub ending_balance: Money,
}

/// Run the balance recurrence for every period of the term.
///
/// Balances are not bounded: over-draws and negative amortisation are valid
/// loan states. All validation happens before the first record is built.
pub fn generate(
    loan: &LoanParameters,
    calendar: &Calendar,
    draw: &DrawPolicy,
    paydown: &PaydownPolicy,
    interest: InterestPolicy,
) -> ScheduleResult<Vec<PeriodRecord>> {
    loan.validate()?;
    calendar.check_term(loan.term_periods)?;
    draw.check_length(loan.term_periods)?;
    paydown.validate(loan.term_periods)?;

    let monthly_rate = loan.monthly_rate();
    let mut records = Vec::with_capacity(loan.term_periods as usize);
    let mut balance = loan.principal;
    let mut cumulative_drawn = Decimal::ZERO;

    for period in 1..=loan.term_periods {
        let overflow =
            || ScheduleError::Overflow(format!("balance leaves the decimal range in period {period}"));
        let interest_draw = balance.checked_mul(monthly_rate).ok_or_else(overflow)?;
        let construction_draw = draw.amount_for(period);
        let total_draw = if interest.capitalizes() {
            construction_draw.checked_add(interest_draw).ok_or_else(overflow)?
        } else {
            construction_draw
        };
        let paydown_amount = paydown.amount_for(period);
        let ending_balance = balance
            .checked_add(total_draw)
            .and_then(|b| b.checked_sub(paydown_amount))
            .ok_or_else(overflow)?;
        cumulative_drawn = cumulative_drawn.checked_add(construction_draw).ok_or_else(overflow)?;

        records.push(PeriodRecord {
            period,
            date: calendar.period_date(period),
            beginning_balance: balance,
            construction_draw,
            interest_draw,
            total_draw,
            cumulative_drawn,
            paydown: paydown_amount,
            ending_balance,
        });

        balance = ending_balance;
    }

    tracing::debug!(
        periods = records.len(),
        final_balance = %balance,
        interest = interest.label(),
        "generated draw schedule"
    );

    Ok(records)
}
