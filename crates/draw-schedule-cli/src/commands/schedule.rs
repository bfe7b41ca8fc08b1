use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use draw_schedule_core::config::{DrawInput, PaydownInput, ScheduleConfig};
use draw_schedule_core::policy::InterestPolicy;
use draw_schedule_core::schedule::{self, FlatRow, LoanParameters, ScheduleSummary};
use draw_schedule_core::ComputationOutput;

use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum InterestArg {
    /// Interest is drawn and added to the balance
    Capitalized,
    /// Interest is reported but paid outside the loan
    ExpensedOnly,
}

impl From<InterestArg> for InterestPolicy {
    fn from(arg: InterestArg) -> Self {
        match arg {
            InterestArg::Capitalized => InterestPolicy::Capitalized,
            InterestArg::ExpensedOnly => InterestPolicy::ExpensedOnly,
        }
    }
}

/// Schedule parameters shared by every command
#[derive(Args, Debug, Clone)]
pub struct ScheduleArgs {
    /// Path to a JSON or YAML configuration file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Opening loan balance
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate as a decimal (0.08 = 8%)
    #[arg(long)]
    pub annual_rate: Option<Decimal>,

    /// Loan term in months
    #[arg(long, conflicts_with = "term_years")]
    pub term_months: Option<u32>,

    /// Loan term in whole years
    #[arg(long)]
    pub term_years: Option<u32>,

    /// Any date in the first month of the schedule (defaults to today)
    #[arg(long)]
    pub anchor_date: Option<NaiveDate>,

    /// Fixed construction draw per period
    #[arg(long, conflicts_with = "draws")]
    pub draw: Option<Decimal>,

    /// Per-period construction draws, e.g. "200000, 150000, 0"
    #[arg(long)]
    pub draws: Option<String>,

    /// Fixed paydown per period
    #[arg(long, conflicts_with_all = ["units_per_period", "paydowns"])]
    pub paydown: Option<Decimal>,

    /// Units settled per period (with --amount-per-unit)
    #[arg(long, requires = "amount_per_unit", conflicts_with = "paydowns")]
    pub units_per_period: Option<Decimal>,

    /// Paydown per settled unit (with --units-per-period)
    #[arg(long, requires = "units_per_period")]
    pub amount_per_unit: Option<Decimal>,

    /// Per-period paydowns, e.g. "0, 0, 150000"
    #[arg(long)]
    pub paydowns: Option<String>,

    /// First period (1-based) in which paydowns apply
    #[arg(long, conflicts_with = "paydown_start_date")]
    pub paydown_start_period: Option<u32>,

    /// Any date in the first month in which paydowns apply
    #[arg(long)]
    pub paydown_start_date: Option<NaiveDate>,

    /// Interest treatment
    #[arg(long, value_enum, default_value = "capitalized")]
    pub interest: InterestArg,

    /// Leave the cumulative-drawn column out
    #[arg(long)]
    pub no_cumulative: bool,
}

/// Load the configuration from --input, piped stdin, or the individual flags.
pub fn load_config(args: &ScheduleArgs) -> Result<ScheduleConfig, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        input::file::read_config(path)
    } else if let Some(config) = input::stdin::read_stdin()? {
        Ok(config)
    } else {
        config_from_flags(args)
    }
}

pub fn config_from_flags(args: &ScheduleArgs) -> Result<ScheduleConfig, Box<dyn std::error::Error>> {
    let principal = args
        .principal
        .ok_or("--principal is required (or provide --input)")?;
    let annual_rate = args
        .annual_rate
        .ok_or("--annual-rate is required (or provide --input)")?;
    let term_periods = match (args.term_months, args.term_years) {
        (Some(months), _) => months,
        (None, Some(years)) => years
            .checked_mul(12)
            .ok_or("--term-years is too large")?,
        (None, None) => return Err("--term-months or --term-years is required".into()),
    };
    let anchor_date = args.anchor_date.unwrap_or_else(|| {
        let today = chrono::Local::now().date_naive();
        tracing::debug!(%today, "no --anchor-date given, anchoring on today");
        today
    });

    let draw = match (&args.draw, &args.draws) {
        (_, Some(text)) => DrawInput::Text { text: text.clone() },
        (Some(amount), None) => DrawInput::Fixed { amount: *amount },
        (None, None) => DrawInput::default(),
    };

    let paydown = if let Some(text) = &args.paydowns {
        PaydownInput::Text { text: text.clone() }
    } else if let (Some(units), Some(amount)) = (args.units_per_period, args.amount_per_unit) {
        PaydownInput::Derived {
            units_per_period: units,
            amount_per_unit: amount,
        }
    } else if let Some(amount) = args.paydown {
        PaydownInput::Fixed { amount }
    } else {
        PaydownInput::None
    };

    Ok(ScheduleConfig {
        loan: LoanParameters {
            principal,
            annual_rate,
            term_periods,
        },
        anchor_date,
        draw,
        paydown,
        paydown_start_period: args.paydown_start_period,
        paydown_start_date: args.paydown_start_date,
        interest: args.interest.into(),
    })
}

/// Flat rows plus totals, as printed by the schedule command.
#[derive(Debug, Serialize)]
pub struct ScheduleTable {
    pub rows: Vec<FlatRow>,
    pub summary: ScheduleSummary,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config = load_config(&args)?;
    let output = schedule::build_schedule(&config)?;
    let table = ComputationOutput {
        result: ScheduleTable {
            rows: schedule::flat_table(&output.result.periods, !args.no_cumulative),
            summary: output.result.summary,
        },
        methodology: output.methodology,
        assumptions: output.assumptions,
        warnings: output.warnings,
        metadata: output.metadata,
    };
    Ok(serde_json::to_value(table)?)
}
