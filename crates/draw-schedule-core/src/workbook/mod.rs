//! Spreadsheet projection of a draw schedule.
//!
//! The projector mirrors the generator's recurrence as live cell formulas;
//! the evaluator proves the two agree.

pub mod cell;
pub mod eval;
pub mod projector;

pub use cell::{Cell, CellExpr, CellFormat, CellRef, CellValue, Formula, Literal, RangeRef, Sheet, Workbook};
pub use eval::{verify_projection, Evaluator, Mismatch, VerificationReport, DEFAULT_TOLERANCE};
pub use projector::{
    project, ProjectionContext, ProjectionOptions, ScheduleColumns, SCHEDULE_SHEET, SUMMARY_SHEET,
};

use crate::config::ScheduleConfig;
use crate::schedule::generator::{generate, PeriodRecord};
use crate::ScheduleResult;

/// A projected workbook with the records it was built from.
#[derive(Debug, Clone)]
pub struct ProjectedSchedule {
    pub records: Vec<PeriodRecord>,
    pub workbook: Workbook,
    pub warnings: Vec<String>,
}

/// Resolve, generate and project in one step.
pub fn build_workbook(
    config: &ScheduleConfig,
    options: ProjectionOptions,
) -> ScheduleResult<ProjectedSchedule> {
    let resolved = config.resolve()?;
    let records = generate(
        &resolved.loan,
        &resolved.calendar,
        &resolved.draw,
        &resolved.paydown,
        resolved.interest,
    )?;
    let workbook = project(&records, &ProjectionContext::from_resolved(&resolved, options))?;
    Ok(ProjectedSchedule {
        records,
        workbook,
        warnings: resolved.warnings,
    })
}
