use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cell::{Cell, CellExpr, CellFormat, CellRef, RangeRef, Sheet, Workbook};
use crate::config::ResolvedSchedule;
use crate::error::ScheduleError;
use crate::policy::{InterestPolicy, PaydownPolicy, PaydownSchedule};
use crate::schedule::generator::{LoanParameters, PeriodRecord};
use crate::schedule::summary::summarize;
use crate::schedule::table::headers;
use crate::ScheduleResult;

pub const SCHEDULE_SHEET: &str = "Schedule";
pub const SUMMARY_SHEET: &str = "Summary";

const VALUE_COL: u16 = 1;
const ANNUAL_RATE_ROW: u32 = 2;
const MONTHLY_RATE_ROW: u32 = 3;
const UNITS_ROW: u32 = 5;
const AMOUNT_PER_UNIT_ROW: u32 = 6;

/// Which optional parts of the workbook to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectionOptions {
    pub include_summary: bool,
    pub include_cumulative: bool,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            include_summary: true,
            include_cumulative: true,
        }
    }
}

/// Inputs the projector needs besides the records themselves.
#[derive(Debug, Clone, Copy)]
pub struct ProjectionContext<'a> {
    pub loan: &'a LoanParameters,
    pub interest: InterestPolicy,
    pub paydown: &'a PaydownPolicy,
    pub options: ProjectionOptions,
}

impl<'a> ProjectionContext<'a> {
    pub fn from_resolved(resolved: &'a ResolvedSchedule, options: ProjectionOptions) -> Self {
        Self {
            loan: &resolved.loan,
            interest: resolved.interest,
            paydown: &resolved.paydown,
            options,
        }
    }
}

/// Column positions on the schedule sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleColumns {
    pub period: u16,
    pub date: u16,
    pub beginning_balance: u16,
    pub construction_draw: u16,
    pub interest_draw: u16,
    pub total_draw: u16,
    pub cumulative_drawn: Option<u16>,
    pub paydown: u16,
    pub ending_balance: u16,
}

impl ScheduleColumns {
    pub fn new(include_cumulative: bool) -> Self {
        let shift = u16::from(include_cumulative);
        Self {
            period: 0,
            date: 1,
            beginning_balance: 2,
            construction_draw: 3,
            interest_draw: 4,
            total_draw: 5,
            cumulative_drawn: include_cumulative.then_some(6),
            paydown: 6 + shift,
            ending_balance: 7 + shift,
        }
    }

    pub fn width(&self) -> usize {
        self.ending_balance as usize + 1
    }
}

/// Derived paydowns reference the per-unit inputs on the summary sheet.
fn derived_paydown_expr(schedule: &PaydownSchedule) -> Option<CellExpr> {
    match schedule {
        PaydownSchedule::Derived { .. } => Some(
            CellExpr::Ref(CellRef::absolute_on(SUMMARY_SHEET, UNITS_ROW, VALUE_COL)).mul(
                CellExpr::Ref(CellRef::absolute_on(SUMMARY_SHEET, AMOUNT_PER_UNIT_ROW, VALUE_COL)),
            ),
        ),
        _ => None,
    }
}

/// Lay the schedule out as cells: literals for policy inputs, formulas for
/// every column that follows from other cells.
pub fn project(records: &[PeriodRecord], ctx: &ProjectionContext<'_>) -> ScheduleResult<Workbook> {
    if records.len() != ctx.loan.term_periods as usize {
        return Err(ScheduleError::Configuration(format!(
            "Cannot project {} records for a {}-period term",
            records.len(),
            ctx.loan.term_periods
        )));
    }
    let Some(first) = records.first() else {
        return Err(ScheduleError::Configuration("Cannot project an empty schedule".into()));
    };
    if first.beginning_balance != ctx.loan.principal {
        return Err(ScheduleError::Configuration(
            "First period does not open at the loan principal".into(),
        ));
    }

    let options = ctx.options;
    let cols = ScheduleColumns::new(options.include_cumulative);
    let monthly_rate = ctx.loan.monthly_rate();
    let rate_expr = if options.include_summary {
        CellExpr::Ref(CellRef::absolute_on(SUMMARY_SHEET, MONTHLY_RATE_ROW, VALUE_COL))
    } else {
        CellExpr::Number(monthly_rate)
    };
    let derived_paydown = if options.include_summary {
        derived_paydown_expr(ctx.paydown.schedule())
    } else {
        None
    };

    let mut schedule = Sheet::new(SCHEDULE_SHEET);
    schedule.push_row(
        headers(options.include_cumulative)
            .into_iter()
            .map(Cell::header)
            .collect(),
    );

    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 1;
        let prev = row - 1;
        let mut cells = vec![Cell::default(); cols.width()];

        cells[cols.period as usize] = Cell::number(Decimal::from(record.period), CellFormat::Integer);
        cells[cols.date as usize] = Cell::date(record.date);

        cells[cols.beginning_balance as usize] = if idx == 0 {
            Cell::number(ctx.loan.principal, CellFormat::Currency)
        } else {
            Cell::formula(
                CellExpr::cell(prev, cols.ending_balance),
                record.beginning_balance,
                CellFormat::Currency,
            )
        };

        cells[cols.construction_draw as usize] =
            Cell::number(record.construction_draw, CellFormat::Currency);

        cells[cols.interest_draw as usize] = Cell::formula(
            CellExpr::cell(row, cols.beginning_balance).mul(rate_expr.clone()),
            record.interest_draw,
            CellFormat::Currency,
        );

        let total = if ctx.interest.capitalizes() {
            CellExpr::cell(row, cols.construction_draw).add(CellExpr::cell(row, cols.interest_draw))
        } else {
            CellExpr::cell(row, cols.construction_draw)
        };
        cells[cols.total_draw as usize] = Cell::formula(total, record.total_draw, CellFormat::Currency);

        if let Some(col) = cols.cumulative_drawn {
            let expr = if idx == 0 {
                CellExpr::cell(row, cols.construction_draw)
            } else {
                CellExpr::cell(prev, col).add(CellExpr::cell(row, cols.construction_draw))
            };
            cells[col as usize] = Cell::formula(expr, record.cumulative_drawn, CellFormat::Currency);
        }

        cells[cols.paydown as usize] = match &derived_paydown {
            Some(expr) if !ctx.paydown.is_gated(record.period) => {
                Cell::formula(expr.clone(), record.paydown, CellFormat::Currency)
            }
            _ => Cell::number(record.paydown, CellFormat::Currency),
        };

        cells[cols.ending_balance as usize] = Cell::formula(
            CellExpr::cell(row, cols.beginning_balance)
                .add(CellExpr::cell(row, cols.total_draw))
                .sub(CellExpr::cell(row, cols.paydown)),
            record.ending_balance,
            CellFormat::Currency,
        );

        schedule.push_row(cells);
    }

    let summary = summarize(records)?;
    let first_data_row = 1;
    let last_data_row = records.len() as u32;
    let column_total = |col: u16| CellExpr::Sum(RangeRef::column(col, first_data_row, last_data_row));

    let mut totals = vec![Cell::default(); cols.width()];
    totals[cols.period as usize] = Cell::header("Totals");
    totals[cols.construction_draw as usize] = Cell::formula(
        column_total(cols.construction_draw),
        summary.total_construction_draws,
        CellFormat::Currency,
    );
    totals[cols.interest_draw as usize] = Cell::formula(
        column_total(cols.interest_draw),
        summary.total_interest,
        CellFormat::Currency,
    );
    totals[cols.total_draw as usize] = Cell::formula(
        column_total(cols.total_draw),
        summary.total_draws,
        CellFormat::Currency,
    );
    totals[cols.paydown as usize] = Cell::formula(
        column_total(cols.paydown),
        summary.total_paydowns,
        CellFormat::Currency,
    );
    schedule.push_row(totals);

    let mut workbook = Workbook {
        sheets: vec![schedule],
    };

    if options.include_summary {
        let schedule_total = |col: u16| {
            CellExpr::Sum(RangeRef::column(col, first_data_row, last_data_row).on_sheet(SCHEDULE_SHEET))
        };
        let value = |expr: CellExpr, expected: Decimal| Cell::formula(expr, expected, CellFormat::Currency);

        let mut sheet = Sheet::new(SUMMARY_SHEET);
        sheet.push_row(vec![Cell::header("Item"), Cell::header("Value")]);
        sheet.push_row(vec![
            Cell::text("Principal"),
            Cell::number(ctx.loan.principal, CellFormat::Currency),
        ]);
        sheet.push_row(vec![
            Cell::text("Annual Rate"),
            Cell::number(ctx.loan.annual_rate, CellFormat::Percent),
        ]);
        sheet.push_row(vec![
            Cell::text("Monthly Rate"),
            Cell::formula(
                CellExpr::cell(ANNUAL_RATE_ROW, VALUE_COL).div(CellExpr::Number(Decimal::from(12))),
                monthly_rate,
                CellFormat::Percent,
            ),
        ]);
        sheet.push_row(vec![
            Cell::text("Term (months)"),
            Cell::number(Decimal::from(ctx.loan.term_periods), CellFormat::Integer),
        ]);
        if let PaydownSchedule::Derived {
            units_per_period,
            amount_per_unit,
        } = ctx.paydown.schedule()
        {
            sheet.push_row(vec![
                Cell::text("Units Per Period"),
                Cell::number(*units_per_period, CellFormat::General),
            ]);
            sheet.push_row(vec![
                Cell::text("Amount Per Unit"),
                Cell::number(*amount_per_unit, CellFormat::Currency),
            ]);
        }
        sheet.push_row(vec![
            Cell::text("Total Interest"),
            value(schedule_total(cols.interest_draw), summary.total_interest),
        ]);
        sheet.push_row(vec![
            Cell::text("Total Construction Draws"),
            value(schedule_total(cols.construction_draw), summary.total_construction_draws),
        ]);
        sheet.push_row(vec![
            Cell::text("Total Draws"),
            value(schedule_total(cols.total_draw), summary.total_draws),
        ]);
        sheet.push_row(vec![
            Cell::text("Total Paydowns"),
            value(schedule_total(cols.paydown), summary.total_paydowns),
        ]);
        sheet.push_row(vec![
            Cell::text("Final Balance"),
            value(
                CellExpr::Ref(CellRef::new(last_data_row, cols.ending_balance).on_sheet(SCHEDULE_SHEET)),
                summary.final_balance,
            ),
        ]);
        workbook.sheets.push(sheet);
    }

    tracing::debug!(
        rows = records.len(),
        formulas = workbook.formula_count(),
        summary = options.include_summary,
        "projected schedule workbook"
    );

    Ok(workbook)
}
