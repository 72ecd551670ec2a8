use serde::{Deserialize, Serialize};
use std::fmt;

/// The financial institution a statement claims to come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Institution {
    pub name: String,
    pub org_id: String,
    /// Intuit's bank id, only emitted for QFX output.
    pub intuit_id: Option<String>,
}

impl Institution {
    /// Issuer id for `INTU.BID`; falls back to the organization id.
    pub fn intuit_bank_id(&self) -> &str {
        self.intuit_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .unwrap_or(self.org_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    pub bank_id: String,
    pub account_id: String,
    /// Free-form, e.g. `CHECKING` or `SAVINGS`.
    pub account_type: String,
}

impl fmt::Display for BankAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({})", self.bank_id, self.account_id, self.account_type)
    }
}
