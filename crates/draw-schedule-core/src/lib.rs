pub mod calendar;
pub mod config;
pub mod error;
pub mod parse;
pub mod policy;
pub mod schedule;
pub mod types;

#[cfg(feature = "workbook")]
pub mod workbook;

pub use error::ScheduleError;
pub use types::*;

/// Standard result type for all draw-schedule operations
pub type ScheduleResult<T> = Result<T, ScheduleError>;
