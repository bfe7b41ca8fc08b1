//! `.xlsx` sink for projected workbooks.
//!
//! Literals are written as native numbers, dates and strings; formula cells
//! carry their text plus the computed value as the cached result so viewers
//! that do not recalculate still show the schedule.

use chrono::Datelike;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{
    ExcelDateTime, Format, FormatAlign, FormatBorder, Formula as XlsxFormula, Workbook as XlsxWorkbook,
    Worksheet, XlsxError,
};
use std::path::Path;

use draw_schedule_core::workbook::{CellFormat, CellValue, Literal, Sheet, Workbook, SCHEDULE_SHEET};

struct Formats {
    general: Format,
    header: Format,
    integer: Format,
    currency: Format,
    percent: Format,
    date: Format,
}

impl Formats {
    fn new() -> Self {
        Self {
            general: Format::new(),
            header: Format::new()
                .set_bold()
                .set_align(FormatAlign::Center)
                .set_border(FormatBorder::Thin),
            integer: Format::new().set_num_format("0"),
            currency: Format::new().set_num_format("#,##0.00"),
            percent: Format::new().set_num_format("0.0000%"),
            date: Format::new().set_num_format("yyyy-mm-dd"),
        }
    }

    fn get(&self, format: CellFormat) -> &Format {
        match format {
            CellFormat::General => &self.general,
            CellFormat::Header => &self.header,
            CellFormat::Integer => &self.integer,
            CellFormat::Currency => &self.currency,
            CellFormat::Percent => &self.percent,
            CellFormat::Date => &self.date,
        }
    }
}

fn number(value: Decimal) -> Result<f64, XlsxError> {
    value
        .to_f64()
        .ok_or_else(|| XlsxError::ParameterError(format!("{value} does not fit in a spreadsheet number")))
}

fn write_sheet(worksheet: &mut Worksheet, sheet: &Sheet, formats: &Formats) -> Result<(), XlsxError> {
    worksheet.set_name(&sheet.name)?;

    for (row, col, cell) in sheet.cells() {
        let format = formats.get(cell.format);
        match &cell.value {
            CellValue::Empty => {}
            CellValue::Literal(Literal::Number(value)) => {
                worksheet.write_number_with_format(row, col, number(*value)?, format)?;
            }
            CellValue::Literal(Literal::Date(date)) => {
                let datetime =
                    ExcelDateTime::from_ymd(date.year() as u16, date.month() as u8, date.day() as u8)?;
                worksheet.write_datetime_with_format(row, col, &datetime, format)?;
            }
            CellValue::Literal(Literal::Text(text)) => {
                worksheet.write_string_with_format(row, col, text, format)?;
            }
            CellValue::Formula(formula) => {
                let cached = number(formula.expected)?;
                let xlsx_formula = XlsxFormula::new(formula.text()).set_result(cached.to_string());
                worksheet.write_formula_with_format(row, col, xlsx_formula, format)?;
            }
        }
    }

    let width = sheet.rows.iter().map(Vec::len).max().unwrap_or(0) as u16;
    for col in 0..width {
        worksheet.set_column_width(col, if col == 0 && sheet.name != SCHEDULE_SHEET { 26 } else { 18 })?;
    }
    if sheet.name == SCHEDULE_SHEET {
        worksheet.set_freeze_panes(1, 0)?;
    }
    Ok(())
}

/// Build the in-memory `.xlsx` workbook.
pub fn render(workbook: &Workbook) -> Result<XlsxWorkbook, XlsxError> {
    let formats = Formats::new();
    let mut xlsx = XlsxWorkbook::new();
    for sheet in &workbook.sheets {
        let worksheet = xlsx.add_worksheet();
        write_sheet(worksheet, sheet, &formats)?;
    }
    Ok(xlsx)
}

pub fn write_xlsx(workbook: &Workbook, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut xlsx = render(workbook)?;
    xlsx.save(path)
        .map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use draw_schedule_core::config::{DrawInput, PaydownInput, ScheduleConfig};
    use draw_schedule_core::policy::InterestPolicy;
    use draw_schedule_core::schedule::LoanParameters;
    use draw_schedule_core::workbook::{build_workbook, ProjectionOptions};
    use rust_decimal_macros::dec;

    fn config() -> ScheduleConfig {
        ScheduleConfig {
            loan: LoanParameters {
                principal: dec!(100000),
                annual_rate: dec!(0.12),
                term_periods: 3,
            },
            anchor_date: NaiveDate::from_ymd_opt(2024, 2, 15).unwrap(),
            draw: DrawInput::Fixed { amount: dec!(1000) },
            paydown: PaydownInput::Derived {
                units_per_period: dec!(2),
                amount_per_unit: dec!(250),
            },
            paydown_start_period: Some(2),
            paydown_start_date: None,
            interest: InterestPolicy::Capitalized,
        }
    }

    #[test]
    fn test_render_to_buffer() {
        let projected = build_workbook(&config(), ProjectionOptions::default()).unwrap();
        let mut xlsx = render(&projected.workbook).unwrap();
        let bytes = xlsx.save_to_buffer().unwrap();
        // xlsx files are zip archives
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_render_without_summary() {
        let options = ProjectionOptions {
            include_summary: false,
            include_cumulative: false,
        };
        let projected = build_workbook(&config(), options).unwrap();
        assert_eq!(projected.workbook.sheets.len(), 1);
        let mut xlsx = render(&projected.workbook).unwrap();
        assert!(!xlsx.save_to_buffer().unwrap().is_empty());
    }
}
