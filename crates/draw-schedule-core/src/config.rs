//! Schedule configuration.
//!
//! A [`ScheduleConfig`] is everything the parameter form used to collect,
//! as one immutable, serde-friendly value. Draw and paydown inputs are kept
//! raw here and only normalised to the loan term by [`ScheduleConfig::resolve`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;
use crate::error::ScheduleError;
use crate::parse::parse_amount_list;
use crate::policy::{DrawPolicy, InterestPolicy, PaydownPolicy, PaydownSchedule, UnitSale};
use crate::schedule::generator::LoanParameters;
use crate::types::Money;
use crate::ScheduleResult;

/// How construction draws are supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DrawInput {
    Fixed { amount: Money },
    PerPeriod { amounts: Vec<Money> },
    /// Free-form list, e.g. "200000, 150000, 0"
    Text { text: String },
}

impl Default for DrawInput {
    fn default() -> Self {
        DrawInput::Fixed {
            amount: Decimal::ZERO,
        }
    }
}

/// How principal paydowns are supplied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaydownInput {
    #[default]
    None,
    Fixed {
        amount: Money,
    },
    /// Units settled per period times the paydown per unit
    Derived {
        units_per_period: Decimal,
        amount_per_unit: Money,
    },
    PerPeriod {
        amounts: Vec<Money>,
    },
    /// Free-form list, e.g. "0, 0, 150000"
    Text {
        text: String,
    },
    /// One (units, amount-per-unit) pair per period
    UnitSales {
        sales: Vec<UnitSale>,
    },
}

/// Full input for a construction draw schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub loan: LoanParameters,
    /// Any date in the first month of the schedule
    pub anchor_date: NaiveDate,
    #[serde(default)]
    pub draw: DrawInput,
    #[serde(default)]
    pub paydown: PaydownInput,
    /// First period (1-based) in which paydowns apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paydown_start_period: Option<u32>,
    /// Any date in the first month in which paydowns apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paydown_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub interest: InterestPolicy,
}

/// Configuration turned into ready-to-run policies.
#[derive(Debug, Clone)]
pub struct ResolvedSchedule {
    pub loan: LoanParameters,
    pub calendar: Calendar,
    pub draw: DrawPolicy,
    pub paydown: PaydownPolicy,
    pub interest: InterestPolicy,
    pub warnings: Vec<String>,
}

impl ScheduleConfig {
    /// Validate the loan and build normalised policies.
    ///
    /// Unparsable entries in free-form lists become zero and are reported in
    /// `warnings`; they never fail the build.
    pub fn resolve(&self) -> ScheduleResult<ResolvedSchedule> {
        self.loan.validate()?;
        let term = self.loan.term_periods;
        let calendar = Calendar::new(self.anchor_date);
        calendar.check_term(term)?;
        let mut warnings = Vec::new();

        let draw = match &self.draw {
            DrawInput::Fixed { amount } => DrawPolicy::Fixed(*amount),
            DrawInput::PerPeriod { amounts } => {
                warn_on_length("Draw", amounts.len(), term, &mut warnings);
                DrawPolicy::per_period(amounts.clone(), term)
            }
            DrawInput::Text { text } => {
                let parsed = parse_amount_list(text);
                warnings.extend(parsed.warnings("Draw"));
                warn_on_length("Draw", parsed.values.len(), term, &mut warnings);
                DrawPolicy::per_period(parsed.values, term)
            }
        };

        let schedule = match &self.paydown {
            PaydownInput::None => PaydownSchedule::Fixed(Decimal::ZERO),
            PaydownInput::Fixed { amount } => PaydownSchedule::Fixed(*amount),
            PaydownInput::Derived {
                units_per_period,
                amount_per_unit,
            } => PaydownSchedule::derived(*units_per_period, *amount_per_unit),
            PaydownInput::PerPeriod { amounts } => {
                warn_on_length("Paydown", amounts.len(), term, &mut warnings);
                PaydownSchedule::per_period(amounts.clone(), term)
            }
            PaydownInput::Text { text } => {
                let parsed = parse_amount_list(text);
                warnings.extend(parsed.warnings("Paydown"));
                warn_on_length("Paydown", parsed.values.len(), term, &mut warnings);
                PaydownSchedule::per_period(parsed.values, term)
            }
            PaydownInput::UnitSales { sales } => {
                warn_on_length("Unit sale", sales.len(), term, &mut warnings);
                PaydownSchedule::per_period_derived(sales.clone(), term)
            }
        };

        let start_period = self.paydown_start(&calendar)?;
        if let Some(start) = start_period {
            if start > term {
                warnings.push(format!(
                    "Paydowns start in period {start}, after the {term}-period term; no paydowns applied"
                ));
            }
        }

        Ok(ResolvedSchedule {
            loan: self.loan.clone(),
            calendar,
            draw,
            paydown: PaydownPolicy::new(schedule, start_period),
            interest: self.interest,
            warnings,
        })
    }

    fn paydown_start(&self, calendar: &Calendar) -> ScheduleResult<Option<u32>> {
        match (self.paydown_start_period, self.paydown_start_date) {
            (Some(_), Some(_)) => Err(ScheduleError::InvalidInput {
                field: "paydown_start".into(),
                reason: "Give either a paydown start period or a start date, not both".into(),
            }),
            (Some(0), None) => Err(ScheduleError::InvalidInput {
                field: "paydown_start_period".into(),
                reason: "Periods are numbered from 1".into(),
            }),
            (Some(period), None) => Ok(Some(period)),
            (None, Some(date)) => Ok(Some(calendar.period_on_or_after(date))),
            (None, None) => Ok(None),
        }
    }
}

fn warn_on_length(label: &str, len: usize, term: u32, warnings: &mut Vec<String>) {
    let term_len = term as usize;
    if len < term_len {
        warnings.push(format!(
            "{label} list has {len} entries for a {term}-period term; padded with zeros"
        ));
    } else if len > term_len {
        warnings.push(format!(
            "{label} list has {len} entries for a {term}-period term; extra entries ignored"
        ));
    }
}
