use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::period::Timestamp;
use crate::transaction::{Transaction, TransactionType};

pub const LANGUAGE: &str = "ENG";

/// Response status. This tool only ever reports success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub code: u32,
    pub severity: String,
}

impl Status {
    pub fn ok() -> Self {
        Status {
            code: 0,
            severity: "INFO".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignOn {
    pub status: Status,
    pub generated_at: Timestamp,
    pub language: String,
    pub org_name: String,
    pub org_id: String,
    /// Set only for QFX output.
    pub intuit_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBlock {
    pub currency: String,
    pub bank_id: String,
    pub account_id: String,
    pub account_type: String,
    pub start: Timestamp,
    pub end: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub amount: Money,
    pub as_of: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub sign_on: SignOn,
    pub transaction_uid: u32,
    pub status: Status,
    pub account: AccountBlock,
    /// Input row order.
    pub transactions: Vec<Transaction>,
    pub ledger_balance: Balance,
    pub available_balance: Balance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatementTotals {
    pub count: usize,
    pub credits: Money,
    pub debits: Money,
    pub net: Money,
}

impl Statement {
    /// Sums transactions by sign. Unrecognized types are still counted by amount.
    ///
    /// `None` if a sum overflows.
    pub fn totals(&self) -> Option<StatementTotals> {
        let mut credits = Money::zero();
        let mut debits = Money::zero();
        for amount in self.transactions.iter().map(|t| t.amount) {
            if amount.is_positive() {
                credits = credits.checked_add(amount)?;
            } else {
                debits = debits.checked_add(amount)?;
            }
        }
        Some(StatementTotals {
            count: self.transactions.len(),
            credits,
            debits,
            net: credits.checked_add(debits)?,
        })
    }

    pub fn unrecognized_types(&self) -> impl Iterator<Item = &TransactionType> {
        self.transactions
            .iter()
            .map(|t| &t.kind)
            .filter(|k| !k.is_recognized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts() -> Timestamp {
        Timestamp::from_date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap())
    }

    fn statement(amounts: &[i64]) -> Statement {
        Statement {
            sign_on: SignOn {
                status: Status::ok(),
                generated_at: ts(),
                language: LANGUAGE.to_string(),
                org_name: "First Bank".to_string(),
                org_id: "1234".to_string(),
                intuit_id: None,
            },
            transaction_uid: 0,
            status: Status::ok(),
            account: AccountBlock {
                currency: "USD".to_string(),
                bank_id: "1".to_string(),
                account_id: "2".to_string(),
                account_type: "CHECKING".to_string(),
                start: ts(),
                end: ts(),
            },
            transactions: amounts
                .iter()
                .map(|&c| Transaction::from_inverted(Money::from_cents(c)))
                .collect(),
            ledger_balance: Balance { amount: Money::zero(), as_of: ts() },
            available_balance: Balance { amount: Money::zero(), as_of: ts() },
        }
    }

    #[test]
    fn totals_split_by_sign() {
        // Source amounts are inverted: 2500 becomes a debit of -25.00.
        let totals = statement(&[2500, -10000, 499]).totals().unwrap();
        assert_eq!(totals.count, 3);
        assert_eq!(totals.credits, Money::from_cents(10000));
        assert_eq!(totals.debits, Money::from_cents(-2999));
        assert_eq!(totals.net, Money::from_cents(7001));
    }

    #[test]
    fn totals_of_empty_statement() {
        let totals = statement(&[]).totals().unwrap();
        assert_eq!(totals.count, 0);
        assert!(totals.net.is_zero());
    }

    #[test]
    fn totals_overflow_is_none() {
        let mut st = statement(&[]);
        let max = Money::from_decimal(rust_decimal::Decimal::MAX);
        st.transactions = vec![
            Transaction::new(TransactionType::Credit, max),
            Transaction::new(TransactionType::Credit, max),
        ];
        assert_eq!(st.totals(), None);

        st.transactions[1] = Transaction::new(TransactionType::Debit, -max);
        let totals = st.totals().unwrap();
        assert!(totals.net.is_zero());
    }

    #[test]
    fn unrecognized_types_are_listed() {
        let mut st = statement(&[100]);
        st.transactions[0].kind = TransactionType::Unrecognized("Card".to_string());
        assert_eq!(st.unrecognized_types().count(), 1);
    }

    #[test]
    fn status_ok_is_info_zero() {
        let s = Status::ok();
        assert_eq!(s.code, 0);
        assert_eq!(s.severity, "INFO");
    }
}
