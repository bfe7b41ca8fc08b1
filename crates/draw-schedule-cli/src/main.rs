mod commands;
mod input;
mod output;
mod xlsx;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::prelude::*;

use commands::schedule::ScheduleArgs;
use commands::verify::VerifyArgs;
use commands::workbook::WorkbookArgs;

/// Construction-loan draw schedules and formula workbooks
#[derive(Parser)]
#[command(
    name = "drawsched",
    version,
    about = "Construction-loan draw schedules and formula workbooks",
    long_about = "Generates month-by-month construction loan draw schedules with \
                  decimal precision. Interest is either capitalised into the balance \
                  or expensed, paydowns may be gated to a start period, and the \
                  schedule can be written as a spreadsheet whose cells are live \
                  formulas reproducing every computed value."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log debug events to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the draw schedule as a flat table
    Schedule(ScheduleArgs),
    /// Write the schedule to an .xlsx workbook with live formulas
    Workbook(WorkbookArgs),
    /// Project the schedule and check every formula against the computed values
    Verify(VerifyArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Schedule(args) => commands::schedule::run_schedule(args),
        Commands::Workbook(args) => commands::workbook::run_workbook(args),
        Commands::Verify(args) => commands::verify::run_verify(args),
        Commands::Version => {
            println!("drawsched {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            let failed = value
                .get("result")
                .and_then(|r| r.get("consistent"))
                .and_then(|c| c.as_bool())
                == Some(false);
            process::exit(i32::from(failed));
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
