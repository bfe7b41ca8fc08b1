//! Flat, display-ready rows: one per period, money to two decimals.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::generator::PeriodRecord;

/// Column headers in output order.
pub const COLUMNS: [&str; 9] = [
    "Period",
    "Date",
    "Beginning Balance",
    "Construction Draw",
    "Interest Draw",
    "Total Draw",
    "Cumulative Drawn",
    "Paydown",
    "Ending Balance",
];

/// One row of the flat schedule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatRow {
    #[serde(rename = "Period")]
    pub period: u32,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Beginning Balance")]
    pub beginning_balance: String,
    #[serde(rename = "Construction Draw")]
    pub construction_draw: String,
    #[serde(rename = "Interest Draw")]
    pub interest_draw: String,
    #[serde(rename = "Total Draw")]
    pub total_draw: String,
    #[serde(rename = "Cumulative Drawn", skip_serializing_if = "Option::is_none", default)]
    pub cumulative_drawn: Option<String>,
    #[serde(rename = "Paydown")]
    pub paydown: String,
    #[serde(rename = "Ending Balance")]
    pub ending_balance: String,
}

impl FlatRow {
    /// Cell texts in column order.
    pub fn cells(&self) -> Vec<String> {
        let mut cells = vec![
            self.period.to_string(),
            self.date.clone(),
            self.beginning_balance.clone(),
            self.construction_draw.clone(),
            self.interest_draw.clone(),
            self.total_draw.clone(),
        ];
        if let Some(cumulative) = &self.cumulative_drawn {
            cells.push(cumulative.clone());
        }
        cells.push(self.paydown.clone());
        cells.push(self.ending_balance.clone());
        cells
    }
}

/// Header row matching [`FlatRow::cells`].
pub fn headers(include_cumulative: bool) -> Vec<&'static str> {
    COLUMNS
        .iter()
        .copied()
        .filter(|c| include_cumulative || *c != "Cumulative Drawn")
        .collect()
}

/// Two-decimal rendering, midpoint away from zero.
pub fn format_money(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{rounded:.2}")
}

pub fn flat_table(records: &[PeriodRecord], include_cumulative: bool) -> Vec<FlatRow> {
    records
        .iter()
        .map(|r| FlatRow {
            period: r.period,
            date: r.date.format("%Y-%m-%d").to_string(),
            beginning_balance: format_money(r.beginning_balance),
            construction_draw: format_money(r.construction_draw),
            interest_draw: format_money(r.interest_draw),
            total_draw: format_money(r.total_draw),
            cumulative_drawn: include_cumulative.then(|| format_money(r.cumulative_drawn)),
            paydown: format_money(r.paydown),
            ending_balance: format_money(r.ending_balance),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample() -> PeriodRecord {
        PeriodRecord {
            period: 1,
            date: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            beginning_balance: dec!(11830000),
            construction_draw: dec!(200000),
            interest_draw: dec!(78866.6666666667),
            total_draw: dec!(278866.6666666667),
            cumulative_drawn: dec!(200000),
            paydown: dec!(150000),
            ending_balance: dec!(11958866.6666666667),
        }
    }

    #[test]
    fn test_two_decimal_rendering() {
        assert_eq!(format_money(dec!(1020.1)), "1020.10");
        assert_eq!(format_money(dec!(0.005)), "0.01");
        assert_eq!(format_money(dec!(-0.005)), "-0.01");
        assert_eq!(format_money(Decimal::ZERO), "0.00");
    }

    #[test]
    fn test_row_columns() {
        let rows = flat_table(&[sample()], true);
        let row = &rows[0];
        assert_eq!(row.date, "2024-02-29");
        assert_eq!(row.interest_draw, "78866.67");
        assert_eq!(row.ending_balance, "11958866.67");
        assert_eq!(row.cells().len(), headers(true).len());
    }

    #[test]
    fn test_cumulative_column_optional() {
        let rows = flat_table(&[sample()], false);
        assert!(rows[0].cumulative_drawn.is_none());
        assert_eq!(rows[0].cells().len(), 8);
        assert!(!headers(false).contains(&"Cumulative Drawn"));
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert!(json.get("Cumulative Drawn").is_none());
        assert_eq!(json["Beginning Balance"], "11830000.00");
    }
}
