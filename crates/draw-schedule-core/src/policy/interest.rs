use serde::{Deserialize, Serialize};

/// Whether accrued interest is added to the outstanding balance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterestPolicy {
    /// Interest is drawn on the loan and capitalised into the balance
    #[default]
    Capitalized,
    /// Interest is reported but paid outside the loan balance
    ExpensedOnly,
}

impl InterestPolicy {
    pub fn capitalizes(self) -> bool {
        matches!(self, InterestPolicy::Capitalized)
    }

    pub fn label(self) -> &'static str {
        match self {
            InterestPolicy::Capitalized => "capitalized",
            InterestPolicy::ExpensedOnly => "expensed only",
        }
    }
}
