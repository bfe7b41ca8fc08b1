//! In-process formula evaluation for projected workbooks.
//!
//! Arithmetic runs in `f64`, as a spreadsheet engine would, so a successful
//! check means the written formulas reproduce the decimal schedule within
//! spreadsheet rounding.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cell::{CellExpr, CellRef, CellValue, Literal, RangeRef, Workbook};
use super::projector::{ScheduleColumns, ProjectionOptions, SCHEDULE_SHEET};
use crate::error::ScheduleError;
use crate::schedule::generator::PeriodRecord;
use crate::ScheduleResult;

/// Default relative tolerance for formula/value checks.
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

type CellKey = (String, u32, u16);

/// Excel serial day number (1900 date system).
fn date_serial(date: NaiveDate) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or(date);
    (date - epoch).num_days() as f64
}

fn to_f64(value: Decimal, cell: &str) -> ScheduleResult<f64> {
    value.to_f64().ok_or_else(|| ScheduleError::Formula {
        cell: cell.to_string(),
        reason: format!("{value} is not representable as f64"),
    })
}

fn cell_name(sheet: &str, row: u32, col: u16) -> String {
    format!("{sheet}!{}", CellRef::new(row, col).address())
}

enum Value {
    Number(f64),
    Text,
    Blank,
}

/// Memoising evaluator over one workbook.
pub struct Evaluator<'a> {
    workbook: &'a Workbook,
    cache: HashMap<CellKey, f64>,
    in_progress: HashSet<CellKey>,
}

impl<'a> Evaluator<'a> {
    pub fn new(workbook: &'a Workbook) -> Self {
        Self {
            workbook,
            cache: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Numeric value of a cell. Blank cells are zero; text is an error.
    pub fn evaluate(&mut self, sheet: &str, row: u32, col: u16) -> ScheduleResult<f64> {
        self.warm((sheet.to_string(), row, col))?;
        self.number(sheet, row, col)
    }

    fn number(&mut self, sheet: &str, row: u32, col: u16) -> ScheduleResult<f64> {
        match self.value(sheet, row, col)? {
            Value::Number(n) => Ok(n),
            Value::Blank => Ok(0.0),
            Value::Text => Err(ScheduleError::Formula {
                cell: cell_name(sheet, row, col),
                reason: "text used in arithmetic".into(),
            }),
        }
    }

    /// Evaluate the precedents of `target` bottom-up with an explicit stack,
    /// so that the recursive pass only ever finds cached references. A
    /// balance chain is as deep as the schedule is long.
    fn warm(&mut self, target: CellKey) -> ScheduleResult<()> {
        let mut stack = vec![(target, false)];
        let mut scheduled = HashSet::new();
        while let Some((key, ready)) = stack.pop() {
            if self.cache.contains_key(&key) {
                continue;
            }
            if ready {
                self.value(&key.0, key.1, key.2)?;
                continue;
            }
            if !scheduled.insert(key.clone()) {
                // already queued, or part of a cycle the recursive pass reports
                continue;
            }
            let precedents = self.precedents(&key);
            stack.push((key, true));
            stack.extend(
                precedents
                    .into_iter()
                    .filter(|k| !self.cache.contains_key(k))
                    .map(|k| (k, false)),
            );
        }
        Ok(())
    }

    /// Cells a formula cell reads directly. Literals and blanks have none.
    fn precedents(&self, key: &CellKey) -> Vec<CellKey> {
        let (sheet, row, col) = key;
        let Some(cell) = self.workbook.sheet(sheet).and_then(|s| s.cell(*row, *col)) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        if let CellValue::Formula(formula) = &cell.value {
            collect_refs(&formula.expr, sheet, &mut out);
        }
        out
    }

    fn value(&mut self, sheet: &str, row: u32, col: u16) -> ScheduleResult<Value> {
        let key = (sheet.to_string(), row, col);
        if let Some(v) = self.cache.get(&key) {
            return Ok(Value::Number(*v));
        }

        let workbook = self.workbook;
        let target = workbook.sheet(sheet).ok_or_else(|| ScheduleError::Formula {
            cell: cell_name(sheet, row, col),
            reason: format!("no sheet named '{sheet}'"),
        })?;
        let Some(cell) = target.cell(row, col) else {
            return Ok(Value::Blank);
        };

        let name = cell_name(sheet, row, col);
        let result = match &cell.value {
            CellValue::Empty => return Ok(Value::Blank),
            CellValue::Literal(Literal::Text(_)) => return Ok(Value::Text),
            CellValue::Literal(Literal::Number(n)) => to_f64(*n, &name)?,
            CellValue::Literal(Literal::Date(d)) => date_serial(*d),
            CellValue::Formula(formula) => {
                if !self.in_progress.insert(key.clone()) {
                    return Err(ScheduleError::Formula {
                        cell: name,
                        reason: "circular reference".into(),
                    });
                }
                let value = self.expr(&formula.expr, sheet);
                self.in_progress.remove(&key);
                value?
            }
        };

        self.cache.insert(key, result);
        Ok(Value::Number(result))
    }

    fn expr(&mut self, expr: &CellExpr, current_sheet: &str) -> ScheduleResult<f64> {
        match expr {
            CellExpr::Number(n) => to_f64(*n, current_sheet),
            CellExpr::Ref(r) => {
                let sheet = r.sheet.as_deref().unwrap_or(current_sheet);
                self.number(sheet, r.row, r.col)
            }
            CellExpr::Add(a, b) => Ok(self.expr(a, current_sheet)? + self.expr(b, current_sheet)?),
            CellExpr::Sub(a, b) => Ok(self.expr(a, current_sheet)? - self.expr(b, current_sheet)?),
            CellExpr::Mul(a, b) => Ok(self.expr(a, current_sheet)? * self.expr(b, current_sheet)?),
            CellExpr::Div(a, b) => {
                let numerator = self.expr(a, current_sheet)?;
                let denominator = self.expr(b, current_sheet)?;
                if denominator == 0.0 {
                    return Err(ScheduleError::Formula {
                        cell: format!("{current_sheet}!{expr}"),
                        reason: "#DIV/0!".into(),
                    });
                }
                Ok(numerator / denominator)
            }
            CellExpr::Sum(range) => self.sum(range, current_sheet),
        }
    }

    /// SUM skips text and blank cells, like a spreadsheet.
    fn sum(&mut self, range: &RangeRef, current_sheet: &str) -> ScheduleResult<f64> {
        let sheet = range.sheet().unwrap_or(current_sheet).to_string();
        let (r0, r1) = ordered(range.start.row, range.end.row);
        let (c0, c1) = ordered(range.start.col, range.end.col);
        let mut total = 0.0;
        for row in r0..=r1 {
            for col in c0..=c1 {
                if let Value::Number(n) = self.value(&sheet, row, col)? {
                    total += n;
                }
            }
        }
        Ok(total)
    }
}

fn collect_refs(expr: &CellExpr, current_sheet: &str, out: &mut Vec<CellKey>) {
    match expr {
        CellExpr::Number(_) => {}
        CellExpr::Ref(r) => {
            let sheet = r.sheet.as_deref().unwrap_or(current_sheet);
            out.push((sheet.to_string(), r.row, r.col));
        }
        CellExpr::Add(a, b) | CellExpr::Sub(a, b) | CellExpr::Mul(a, b) | CellExpr::Div(a, b) => {
            collect_refs(a, current_sheet, out);
            collect_refs(b, current_sheet, out);
        }
        CellExpr::Sum(range) => {
            let sheet = range.sheet().unwrap_or(current_sheet);
            let (r0, r1) = ordered(range.start.row, range.end.row);
            let (c0, c1) = ordered(range.start.col, range.end.col);
            for row in r0..=r1 {
                for col in c0..=c1 {
                    out.push((sheet.to_string(), row, col));
                }
            }
        }
    }
}

fn ordered<T: Ord>(a: T, b: T) -> (T, T) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Workbook {
    /// Evaluate a single cell.
    pub fn evaluate(&self, sheet: &str, row: u32, col: u16) -> ScheduleResult<f64> {
        Evaluator::new(self).evaluate(sheet, row, col)
    }
}

/// A cell whose value disagrees with the schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mismatch {
    pub cell: String,
    pub expected: f64,
    pub actual: f64,
}

/// Outcome of checking a projected workbook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub cells_checked: usize,
    pub formulas_checked: usize,
    pub max_relative_error: f64,
    pub mismatches: Vec<Mismatch>,
}

impl VerificationReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }

    fn record(&mut self, cell: String, expected: f64, actual: f64, tolerance: f64) {
        let error = relative_error(expected, actual);
        self.cells_checked += 1;
        if error > self.max_relative_error {
            self.max_relative_error = error;
        }
        if error > tolerance {
            self.mismatches.push(Mismatch {
                cell,
                expected,
                actual,
            });
        }
    }
}

/// |actual - expected| scaled by |expected|, with a floor of 1 near zero.
pub fn relative_error(expected: f64, actual: f64) -> f64 {
    (actual - expected).abs() / expected.abs().max(1.0)
}

/// Evaluate every formula against its expected value, then cross-check each
/// schedule row against the matching period record.
pub fn verify_projection(
    workbook: &Workbook,
    records: &[PeriodRecord],
    options: &ProjectionOptions,
    tolerance: f64,
) -> ScheduleResult<VerificationReport> {
    let mut evaluator = Evaluator::new(workbook);
    let mut report = VerificationReport::default();

    for sheet in &workbook.sheets {
        for (row, col, cell) in sheet.cells() {
            if let CellValue::Formula(formula) = &cell.value {
                let actual = evaluator.evaluate(&sheet.name, row, col)?;
                let name = cell_name(&sheet.name, row, col);
                let expected = to_f64(formula.expected, &name)?;
                report.formulas_checked += 1;
                report.record(name, expected, actual, tolerance);
            }
        }
    }

    let cols = ScheduleColumns::new(options.include_cumulative);
    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 1;
        let mut fields = vec![
            (cols.period, Decimal::from(record.period)),
            (cols.beginning_balance, record.beginning_balance),
            (cols.construction_draw, record.construction_draw),
            (cols.interest_draw, record.interest_draw),
            (cols.total_draw, record.total_draw),
            (cols.paydown, record.paydown),
            (cols.ending_balance, record.ending_balance),
        ];
        if let Some(col) = cols.cumulative_drawn {
            fields.push((col, record.cumulative_drawn));
        }
        for (col, field) in fields {
            let name = cell_name(SCHEDULE_SHEET, row, col);
            let actual = evaluator.evaluate(SCHEDULE_SHEET, row, col)?;
            report.record(name.clone(), to_f64(field, &name)?, actual, tolerance);
        }
        let date = evaluator.evaluate(SCHEDULE_SHEET, row, cols.date)?;
        report.record(
            cell_name(SCHEDULE_SHEET, row, cols.date),
            date_serial(record.date),
            date,
            0.0,
        );
    }

    tracing::debug!(
        cells = report.cells_checked,
        formulas = report.formulas_checked,
        max_relative_error = report.max_relative_error,
        mismatches = report.mismatches.len(),
        "verified workbook projection"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::cell::{Cell, CellFormat, Sheet};
    use rust_decimal_macros::dec;

    fn grid(rows: Vec<Vec<Cell>>) -> Workbook {
        Workbook {
            sheets: vec![Sheet {
                name: "S".into(),
                rows,
            }],
        }
    }

    #[test]
    fn test_arithmetic_and_sum() {
        let wb = grid(vec![
            vec![
                Cell::number(dec!(2), CellFormat::General),
                Cell::number(dec!(3), CellFormat::General),
                Cell::formula(
                    CellExpr::cell(0, 0).mul(CellExpr::cell(0, 1)).sub(CellExpr::Number(dec!(1))),
                    dec!(5),
                    CellFormat::General,
                ),
                Cell::text("label"),
                Cell::formula(CellExpr::Sum(RangeRef::column(0, 0, 0)), dec!(2), CellFormat::General),
            ],
            vec![Cell::formula(
                CellExpr::Sum(RangeRef {
                    start: CellRef::new(0, 0),
                    end: CellRef::new(0, 3),
                }),
                dec!(10),
                CellFormat::General,
            )],
        ]);
        assert_eq!(wb.evaluate("S", 0, 2).unwrap(), 5.0);
        // SUM ignores the text cell
        assert_eq!(wb.evaluate("S", 1, 0).unwrap(), 10.0);
        // blank cell
        assert_eq!(wb.evaluate("S", 5, 5).unwrap(), 0.0);
    }

    #[test]
    fn test_text_in_arithmetic_is_error() {
        let wb = grid(vec![vec![
            Cell::text("x"),
            Cell::formula(CellExpr::cell(0, 0).add(CellExpr::Number(dec!(1))), dec!(1), CellFormat::General),
        ]]);
        assert!(wb.evaluate("S", 0, 1).is_err());
    }

    #[test]
    fn test_circular_reference_detected() {
        let wb = grid(vec![vec![
            Cell::formula(CellExpr::cell(0, 1), Decimal::ZERO, CellFormat::General),
            Cell::formula(CellExpr::cell(0, 0), Decimal::ZERO, CellFormat::General),
        ]]);
        let err = wb.evaluate("S", 0, 0).unwrap_err();
        assert!(err.to_string().contains("circular"));
    }

    #[test]
    fn test_division_by_zero() {
        let wb = grid(vec![vec![Cell::formula(
            CellExpr::Number(dec!(1)).div(CellExpr::cell(0, 5)),
            Decimal::ZERO,
            CellFormat::General,
        )]]);
        assert!(wb.evaluate("S", 0, 0).is_err());
    }

    #[test]
    fn test_date_serial() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(date_serial(d), 45351.0);
    }

    #[test]
    fn test_relative_error_floor() {
        assert_eq!(relative_error(0.0, 1e-9), 1e-9);
        assert!((relative_error(1000.0, 1001.0) - 0.001).abs() < 1e-12);
    }

    #[test]
    fn test_cold_evaluation_of_a_long_chain() {
        // each row adds one to the row above, 100k rows deep
        let mut rows = vec![vec![Cell::number(dec!(1), CellFormat::General)]];
        for row in 1..100_000u32 {
            rows.push(vec![Cell::formula(
                CellExpr::cell(row - 1, 0).add(CellExpr::Number(dec!(1))),
                Decimal::from(row + 1),
                CellFormat::General,
            )]);
        }
        let wb = grid(rows);
        assert_eq!(wb.evaluate("S", 99_999, 0).unwrap(), 100_000.0);
    }
}
