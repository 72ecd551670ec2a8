use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::Money;
use super::period::Timestamp;

/// OFX `TRNTYPE` values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Debit,
    Credit,
    Interest,
    Dividend,
    Fee,
    ServiceCharge,
    Deposit,
    Atm,
    PointOfSale,
    Transfer,
    Check,
    Payment,
    Cash,
    DirectDeposit,
    DirectDebit,
    RepeatPayment,
    Other,
    /// A value taken verbatim from a type column that is not an OFX code.
    Unrecognized(String),
}

impl TransactionType {
    pub const KNOWN: [TransactionType; 17] = [
        TransactionType::Debit,
        TransactionType::Credit,
        TransactionType::Interest,
        TransactionType::Dividend,
        TransactionType::Fee,
        TransactionType::ServiceCharge,
        TransactionType::Deposit,
        TransactionType::Atm,
        TransactionType::PointOfSale,
        TransactionType::Transfer,
        TransactionType::Check,
        TransactionType::Payment,
        TransactionType::Cash,
        TransactionType::DirectDeposit,
        TransactionType::DirectDebit,
        TransactionType::RepeatPayment,
        TransactionType::Other,
    ];

    pub fn code(&self) -> &str {
        match self {
            TransactionType::Debit => "DEBIT",
            TransactionType::Credit => "CREDIT",
            TransactionType::Interest => "INT",
            TransactionType::Dividend => "DIV",
            TransactionType::Fee => "FEE",
            TransactionType::ServiceCharge => "SRVCHG",
            TransactionType::Deposit => "DEP",
            TransactionType::Atm => "ATM",
            TransactionType::PointOfSale => "POS",
            TransactionType::Transfer => "XFER",
            TransactionType::Check => "CHECK",
            TransactionType::Payment => "PAYMENT",
            TransactionType::Cash => "CASH",
            TransactionType::DirectDeposit => "DIRECTDEP",
            TransactionType::DirectDebit => "DIRECTDEBIT",
            TransactionType::RepeatPayment => "REPEATPMT",
            TransactionType::Other => "OTHER",
            TransactionType::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, TransactionType::Unrecognized(_))
    }

    /// Classification used when the source has no type column: a non-positive
    /// amount is money leaving the account.
    pub fn from_polarity(amount: Money) -> Self {
        if amount.is_positive() {
            TransactionType::Credit
        } else {
            TransactionType::Debit
        }
    }
}

impl FromStr for TransactionType {
    type Err = std::convert::Infallible;

    /// Never fails: anything that is not exactly an OFX code, case and
    /// whitespace included, is kept as `Unrecognized`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(TransactionType::KNOWN
            .into_iter()
            .find(|t| t.code() == s)
            .unwrap_or_else(|| TransactionType::Unrecognized(s.to_string())))
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub kind: TransactionType,
    pub posted: Option<Timestamp>,
    pub date: Option<Timestamp>,
    pub amount: Money,
    pub id: Option<String>,
    pub name: Option<String>,
    pub payee: Option<String>,
    pub memo: Option<String>,
}

impl Transaction {
    pub fn new(kind: TransactionType, amount: Money) -> Self {
        Transaction {
            kind,
            posted: None,
            date: None,
            amount,
            id: None,
            name: None,
            payee: None,
            memo: None,
        }
    }

    /// Builds a transaction from an amount written in the inverted sign
    /// convention (debits positive), flipping it and classifying the result.
    pub fn from_inverted(source_amount: Money) -> Self {
        let amount = -source_amount;
        Transaction::new(TransactionType::from_polarity(amount), amount)
    }
}
