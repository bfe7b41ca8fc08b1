use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{check_sequence_length, lookup, normalize_sequence, PeriodAmount};
use crate::error::ScheduleError;
use crate::types::Money;
use crate::ScheduleResult;

/// Units settled in one period and the paydown earned per unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitSale {
    pub units: Decimal,
    pub amount_per_unit: Money,
}

impl UnitSale {
    /// Units times price, or `None` when the product leaves the decimal range.
    pub fn amount(&self) -> Option<Money> {
        self.units.checked_mul(self.amount_per_unit)
    }
}

/// Shape of the principal paydown, before start-period gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaydownSchedule {
    /// Same paydown every period
    Fixed(Money),
    /// Constant units sold per period times a constant release price
    Derived {
        units_per_period: Decimal,
        amount_per_unit: Money,
    },
    /// One paydown per period, exactly `term_periods` long
    PerPeriod(Vec<Money>),
    /// One (units, amount-per-unit) pair per period, exactly `term_periods` long
    PerPeriodDerived(Vec<UnitSale>),
}

impl PaydownSchedule {
    pub fn derived(units_per_period: Decimal, amount_per_unit: Money) -> Self {
        PaydownSchedule::Derived {
            units_per_period,
            amount_per_unit,
        }
    }

    /// Per-period paydowns normalised to `term` entries.
    pub fn per_period(values: Vec<Money>, term: u32) -> Self {
        PaydownSchedule::PerPeriod(normalize_sequence(values, term))
    }

    /// Per-period unit sales normalised to `term` entries.
    pub fn per_period_derived(sales: Vec<UnitSale>, term: u32) -> Self {
        PaydownSchedule::PerPeriodDerived(normalize_sequence(sales, term))
    }

    /// Verify the sequence length invariant against the loan term.
    pub fn check_length(&self, term: u32) -> ScheduleResult<()> {
        match self {
            PaydownSchedule::Fixed(_) | PaydownSchedule::Derived { .. } => Ok(()),
            PaydownSchedule::PerPeriod(values) => {
                check_sequence_length("Paydown", values.len(), term)
            }
            PaydownSchedule::PerPeriodDerived(sales) => {
                check_sequence_length("Paydown unit-sale", sales.len(), term)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Prepared {
    Constant(Money),
    Sequence(Vec<Money>),
    /// A units-times-price product did not fit; `None` for the constant form
    Overflow(Option<u32>),
}

/// Paydown schedule plus the period before which nothing is repaid.
#[derive(Debug, Clone, PartialEq)]
pub struct PaydownPolicy {
    schedule: PaydownSchedule,
    start_period: Option<u32>,
    prepared: Prepared,
}

impl PaydownPolicy {
    /// Build the policy, computing derived amounts once.
    pub fn new(schedule: PaydownSchedule, start_period: Option<u32>) -> Self {
        let prepared = match &schedule {
            PaydownSchedule::Fixed(amount) => Prepared::Constant(*amount),
            PaydownSchedule::Derived {
                units_per_period,
                amount_per_unit,
            } => units_per_period
                .checked_mul(*amount_per_unit)
                .map_or(Prepared::Overflow(None), Prepared::Constant),
            PaydownSchedule::PerPeriod(values) => Prepared::Sequence(values.clone()),
            PaydownSchedule::PerPeriodDerived(sales) => {
                let amounts: Option<Vec<Money>> = sales.iter().map(UnitSale::amount).collect();
                match amounts {
                    Some(values) => Prepared::Sequence(values),
                    None => Prepared::Overflow(
                        sales
                            .iter()
                            .position(|s| s.amount().is_none())
                            .map(|idx| idx as u32 + 1),
                    ),
                }
            }
        };
        Self {
            schedule,
            start_period,
            prepared,
        }
    }

    pub fn none() -> Self {
        Self::new(PaydownSchedule::Fixed(Decimal::ZERO), None)
    }

    pub fn schedule(&self) -> &PaydownSchedule {
        &self.schedule
    }

    pub fn start_period(&self) -> Option<u32> {
        self.start_period
    }

    /// True when `period` falls before the configured start period.
    pub fn is_gated(&self, period: u32) -> bool {
        self.start_period.is_some_and(|start| period < start)
    }

    pub fn check_length(&self, term: u32) -> ScheduleResult<()> {
        self.schedule.check_length(term)
    }

    /// Length invariant plus every derived product being representable.
    pub fn validate(&self, term: u32) -> ScheduleResult<()> {
        self.check_length(term)?;
        match &self.prepared {
            Prepared::Overflow(None) => Err(ScheduleError::Overflow(
                "units per period times amount per unit leaves the decimal range".into(),
            )),
            Prepared::Overflow(Some(period)) => Err(ScheduleError::Overflow(format!(
                "unit sale for period {period} leaves the decimal range"
            ))),
            _ => Ok(()),
        }
    }
}

impl PeriodAmount for PaydownPolicy {
    fn amount_for(&self, period: u32) -> Money {
        if self.is_gated(period) {
            return Decimal::ZERO;
        }
        match &self.prepared {
            Prepared::Constant(amount) => *amount,
            Prepared::Sequence(values) => lookup(values, period),
            Prepared::Overflow(_) => Decimal::ZERO,
        }
    }
}
