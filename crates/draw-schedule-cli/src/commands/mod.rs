pub mod schedule;
pub mod verify;
pub mod workbook;
