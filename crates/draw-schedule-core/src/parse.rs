//! Free-form per-period amount lists.
//!
//! Users paste draw or paydown sequences as text ("200000, 150000, 0, ...").
//! Bad entries never abort a schedule: they become zero and are reported
//! back so the caller can surface a warning.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// An entry that could not be read as an amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectedEntry {
    /// 1-based position in the list
    pub position: usize,
    pub text: String,
}

/// Parsed amounts plus the entries that were replaced with zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedAmounts {
    pub values: Vec<Money>,
    pub rejected: Vec<RejectedEntry>,
}

impl ParsedAmounts {
    /// One warning line per rejected entry.
    pub fn warnings(&self, label: &str) -> Vec<String> {
        self.rejected
            .iter()
            .map(|r| {
                format!(
                    "{label} entry {} ('{}') is not a number; using 0",
                    r.position, r.text
                )
            })
            .collect()
    }
}

/// Split `text` on commas, semicolons and newlines and parse each entry.
pub fn parse_amount_list(text: &str) -> ParsedAmounts {
    let mut parsed = ParsedAmounts::default();
    if text.trim().is_empty() {
        return parsed;
    }

    for (idx, raw) in text.split([',', ';', '\n']).enumerate() {
        let entry = raw.trim();
        match parse_amount(entry) {
            Some(value) => parsed.values.push(value),
            None => {
                tracing::warn!(position = idx + 1, entry, "unparsable amount replaced with zero");
                parsed.values.push(Decimal::ZERO);
                parsed.rejected.push(RejectedEntry {
                    position: idx + 1,
                    text: entry.to_string(),
                });
            }
        }
    }
    parsed
}

/// Parse a single amount. Blank text is zero.
pub fn parse_amount(entry: &str) -> Option<Money> {
    let cleaned: String = entry
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != '_')
        .collect();
    if cleaned.is_empty() {
        return Some(Decimal::ZERO);
    }
    Decimal::from_str(&cleaned)
        .or_else(|_| Decimal::from_scientific(&cleaned))
        .ok()
}
