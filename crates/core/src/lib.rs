pub mod account;
pub mod money;
pub mod period;
pub mod settings;
pub mod statement;
pub mod transaction;

pub use account::{BankAccount, Institution};
pub use money::{AmountError, Money};
pub use period::{DateError, StatementPeriod, Timestamp, OFX_DATETIME_FORMAT};
pub use settings::{ColumnMap, Column, ConfigError, OutputFormat, RawSettings, Settings};
pub use statement::{AccountBlock, Balance, SignOn, Statement, StatementTotals, Status};
pub use transaction::{Transaction, TransactionType};
