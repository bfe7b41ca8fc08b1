use clap::Args;
use serde_json::{json, Value};
use std::time::Instant;

use draw_schedule_core::types::with_metadata;
use draw_schedule_core::workbook::{build_workbook, verify_projection, DEFAULT_TOLERANCE};

use super::schedule::{load_config, ScheduleArgs};
use super::workbook::projection_options;

/// Arguments for checking the projection in-process
#[derive(Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub schedule: ScheduleArgs,

    /// Check the layout without the summary sheet
    #[arg(long)]
    pub no_summary: bool,

    /// Maximum relative deviation between a formula and its computed value
    #[arg(long, default_value_t = DEFAULT_TOLERANCE)]
    pub tolerance: f64,
}

pub fn run_verify(args: VerifyArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if args.tolerance.is_nan() || args.tolerance < 0.0 {
        return Err("--tolerance must be a non-negative number".into());
    }
    let start = Instant::now();
    let config = load_config(&args.schedule)?;
    let options = projection_options(&args.schedule, args.no_summary);
    let projected = build_workbook(&config, options)?;
    let report = verify_projection(&projected.workbook, &projected.records, &options, args.tolerance)?;

    let output = with_metadata(
        "Formula/value equivalence (f64 evaluation, relative error with unit floor)",
        &json!({
            "tolerance": args.tolerance,
            "include_summary": options.include_summary,
            "include_cumulative": options.include_cumulative,
        }),
        projected.warnings,
        start.elapsed().as_micros() as u64,
        json!({
            "consistent": report.is_consistent(),
            "cells_checked": report.cells_checked,
            "formulas_checked": report.formulas_checked,
            "max_relative_error": report.max_relative_error,
            "mismatches": report.mismatches,
        }),
    );
    Ok(serde_json::to_value(output)?)
}
