//! Workbook grid: sheets, cells, and formula expressions.
//!
//! Formulas are kept as expression trees rather than strings so the same
//! value can be rendered for a spreadsheet (`=C2*Summary!$B$4`) and
//! evaluated in-process when checking a projection.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A reference to a cell by 0-indexed row and column, optionally on
/// another sheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sheet: Option<String>,
    pub row: u32,
    pub col: u16,
    /// Render as `$B$4`
    #[serde(default)]
    pub absolute: bool,
}

impl CellRef {
    pub fn new(row: u32, col: u16) -> Self {
        Self {
            sheet: None,
            row,
            col,
            absolute: false,
        }
    }

    /// Absolute, sheet-qualified reference (`Summary!$B$4`).
    pub fn absolute_on(sheet: &str, row: u32, col: u16) -> Self {
        Self {
            sheet: Some(sheet.to_string()),
            row,
            col,
            absolute: true,
        }
    }

    pub fn on_sheet(mut self, sheet: &str) -> Self {
        self.sheet = Some(sheet.to_string());
        self
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: u16) -> String {
        let mut result = String::new();
        let mut n = col as u32 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }

    /// A1 text without the sheet prefix.
    pub fn address(&self) -> String {
        let dollar = if self.absolute { "$" } else { "" };
        format!(
            "{dollar}{}{dollar}{}",
            Self::col_to_letters(self.col),
            self.row + 1
        )
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{sheet}!")?;
        }
        write!(f, "{}", self.address())
    }
}

/// A rectangular range on one sheet (`Schedule!E2:E37`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeRef {
    pub start: CellRef,
    pub end: CellRef,
}

impl RangeRef {
    /// Column range from `first_row` to `last_row` inclusive.
    pub fn column(col: u16, first_row: u32, last_row: u32) -> Self {
        Self {
            start: CellRef::new(first_row, col),
            end: CellRef::new(last_row, col),
        }
    }

    pub fn on_sheet(mut self, sheet: &str) -> Self {
        self.start.sheet = Some(sheet.to_string());
        self
    }

    pub fn sheet(&self) -> Option<&str> {
        self.start.sheet.as_deref()
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end.address())
    }
}

/// Formula expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellExpr {
    Number(Decimal),
    Ref(CellRef),
    Add(Box<CellExpr>, Box<CellExpr>),
    Sub(Box<CellExpr>, Box<CellExpr>),
    Mul(Box<CellExpr>, Box<CellExpr>),
    Div(Box<CellExpr>, Box<CellExpr>),
    Sum(RangeRef),
}

impl CellExpr {
    pub fn cell(row: u32, col: u16) -> Self {
        CellExpr::Ref(CellRef::new(row, col))
    }

    pub fn add(self, rhs: CellExpr) -> Self {
        CellExpr::Add(Box::new(self), Box::new(rhs))
    }

    pub fn sub(self, rhs: CellExpr) -> Self {
        CellExpr::Sub(Box::new(self), Box::new(rhs))
    }

    pub fn mul(self, rhs: CellExpr) -> Self {
        CellExpr::Mul(Box::new(self), Box::new(rhs))
    }

    pub fn div(self, rhs: CellExpr) -> Self {
        CellExpr::Div(Box::new(self), Box::new(rhs))
    }

    fn precedence(&self) -> u8 {
        match self {
            CellExpr::Add(..) | CellExpr::Sub(..) => 1,
            CellExpr::Mul(..) | CellExpr::Div(..) => 2,
            CellExpr::Number(_) | CellExpr::Ref(_) | CellExpr::Sum(_) => 3,
        }
    }

    fn write_operand(
        f: &mut fmt::Formatter<'_>,
        operand: &CellExpr,
        min_precedence: u8,
    ) -> fmt::Result {
        if operand.precedence() < min_precedence {
            write!(f, "({operand})")
        } else {
            write!(f, "{operand}")
        }
    }
}

impl fmt::Display for CellExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellExpr::Number(n) => {
                if n.is_sign_negative() {
                    write!(f, "({})", n.normalize())
                } else {
                    write!(f, "{}", n.normalize())
                }
            }
            CellExpr::Ref(r) => write!(f, "{r}"),
            CellExpr::Sum(range) => write!(f, "SUM({range})"),
            CellExpr::Add(a, b) => {
                Self::write_operand(f, a, 1)?;
                f.write_str("+")?;
                Self::write_operand(f, b, 1)
            }
            // Right operand of a non-commutative operator binds tighter
            CellExpr::Sub(a, b) => {
                Self::write_operand(f, a, 1)?;
                f.write_str("-")?;
                Self::write_operand(f, b, 2)
            }
            CellExpr::Mul(a, b) => {
                Self::write_operand(f, a, 2)?;
                f.write_str("*")?;
                Self::write_operand(f, b, 2)
            }
            CellExpr::Div(a, b) => {
                Self::write_operand(f, a, 2)?;
                f.write_str("/")?;
                Self::write_operand(f, b, 3)
            }
        }
    }
}

/// A formula and the value it must evaluate to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Formula {
    pub expr: CellExpr,
    pub expected: Decimal,
}

impl Formula {
    /// Spreadsheet text with the leading `=`.
    pub fn text(&self) -> String {
        format!("={}", self.expr)
    }
}

/// A value typed into a cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Literal {
    Number(Decimal),
    Date(NaiveDate),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellValue {
    #[default]
    Empty,
    Literal(Literal),
    Formula(Formula),
}

/// Display format applied by the workbook sink.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellFormat {
    #[default]
    General,
    Header,
    Integer,
    Currency,
    Percent,
    /// `yyyy-mm-dd`
    Date,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub format: CellFormat,
}

impl Cell {
    pub fn number(value: Decimal, format: CellFormat) -> Self {
        Self {
            value: CellValue::Literal(Literal::Number(value)),
            format,
        }
    }

    pub fn date(value: NaiveDate) -> Self {
        Self {
            value: CellValue::Literal(Literal::Date(value)),
            format: CellFormat::Date,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: CellValue::Literal(Literal::Text(value.into())),
            format: CellFormat::General,
        }
    }

    pub fn header(value: impl Into<String>) -> Self {
        Self {
            value: CellValue::Literal(Literal::Text(value.into())),
            format: CellFormat::Header,
        }
    }

    pub fn formula(expr: CellExpr, expected: Decimal, format: CellFormat) -> Self {
        Self {
            value: CellValue::Formula(Formula { expr, expected }),
            format,
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self.value, CellValue::Formula(_))
    }
}

/// A named grid of cells, row-major.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    pub fn cell(&self, row: u32, col: u16) -> Option<&Cell> {
        self.rows.get(row as usize)?.get(col as usize)
    }

    /// Every non-empty cell with its coordinates.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u16, &Cell)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, cell)| cell.value != CellValue::Empty)
                .map(move |(c, cell)| (r as u32, c as u16, cell))
        })
    }
}

/// Ordered collection of sheets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn formula_count(&self) -> usize {
        self.sheets
            .iter()
            .flat_map(|s| s.cells())
            .filter(|(_, _, cell)| cell.is_formula())
            .count()
    }
}
