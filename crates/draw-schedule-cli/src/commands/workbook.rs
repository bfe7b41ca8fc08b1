use clap::Args;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::time::Instant;

use draw_schedule_core::types::with_metadata;
use draw_schedule_core::workbook::{build_workbook, verify_projection, ProjectionOptions, DEFAULT_TOLERANCE};

use super::schedule::{load_config, ScheduleArgs};
use crate::xlsx;

/// Arguments for writing the formula workbook
#[derive(Args)]
pub struct WorkbookArgs {
    #[command(flatten)]
    pub schedule: ScheduleArgs,

    /// Destination .xlsx file
    #[arg(long, default_value = "draw_schedule.xlsx")]
    pub out: PathBuf,

    /// Omit the summary sheet (the monthly rate is then inlined in each formula)
    #[arg(long)]
    pub no_summary: bool,
}

pub fn projection_options(schedule: &ScheduleArgs, no_summary: bool) -> ProjectionOptions {
    ProjectionOptions {
        include_summary: !no_summary,
        include_cumulative: !schedule.no_cumulative,
    }
}

pub fn run_workbook(args: WorkbookArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let start = Instant::now();
    let config = load_config(&args.schedule)?;
    let options = projection_options(&args.schedule, args.no_summary);
    let projected = build_workbook(&config, options)?;

    let report = verify_projection(&projected.workbook, &projected.records, &options, DEFAULT_TOLERANCE)?;
    if !report.is_consistent() {
        tracing::warn!(
            mismatches = report.mismatches.len(),
            "workbook formulas do not reproduce the schedule"
        );
    }

    xlsx::write_xlsx(&projected.workbook, &args.out)?;
    tracing::info!(path = %args.out.display(), "wrote workbook");

    let sheets: Vec<&str> = projected.workbook.sheets.iter().map(|s| s.name.as_str()).collect();
    let output = with_metadata(
        "Construction Draw Schedule workbook (live formulas, cached results)",
        &json!({
            "include_summary": options.include_summary,
            "include_cumulative": options.include_cumulative,
            "tolerance": DEFAULT_TOLERANCE,
        }),
        projected.warnings,
        start.elapsed().as_micros() as u64,
        json!({
            "path": args.out.display().to_string(),
            "sheets": sheets,
            "periods": projected.records.len(),
            "formulas": projected.workbook.formula_count(),
            "consistent": report.is_consistent(),
            "max_relative_error": report.max_relative_error,
        }),
    );
    Ok(serde_json::to_value(output)?)
}
