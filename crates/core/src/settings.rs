use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::account::{BankAccount, Institution};
use crate::money::{AmountError, Money};
use crate::period::{DateError, StatementPeriod, Timestamp};

pub const DEFAULT_CURRENCY: &str = "USD";
pub const DEFAULT_DATE_LAYOUT: &str = "%Y/%m/%d";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required setting {0} not specified via config file or flags")]
    Missing(&'static str),
    #[error("error parsing {field}: {source}")]
    InvalidDate {
        field: &'static str,
        #[source]
        source: DateError,
    },
    #[error("error parsing amount {field}: {source}")]
    InvalidAmount {
        field: &'static str,
        #[source]
        source: AmountError,
    },
    #[error("column {column} must be a 1-based index, got {index}")]
    InvalidColumn { column: Column, index: usize },
    #[error("unknown column {0:?}, expected one of date, posted, name, id, amount, type, memo, payee")]
    UnknownColumn(String),
    #[error("unknown output format {0:?}, expected ofx or qfx")]
    UnknownFormat(String),
    #[error("cannot read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Logical fields a source column can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Column {
    Date,
    Posted,
    Name,
    Id,
    Amount,
    Type,
    Memo,
    Payee,
}

impl Column {
    pub const ALL: [Column; 8] = [
        Column::Date,
        Column::Posted,
        Column::Name,
        Column::Id,
        Column::Amount,
        Column::Type,
        Column::Memo,
        Column::Payee,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Column::Date => "date",
            Column::Posted => "posted",
            Column::Name => "name",
            Column::Id => "id",
            Column::Amount => "amount",
            Column::Type => "type",
            Column::Memo => "memo",
            Column::Payee => "payee",
        }
    }
}

impl FromStr for Column {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Column::ALL
            .into_iter()
            .find(|c| c.key() == key)
            .ok_or_else(|| ConfigError::UnknownColumn(s.to_string()))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Ofx,
    /// Quicken flavour of OFX; adds `INTU.BID` to the sign-on response.
    Qfx,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Ofx => "ofx",
            OutputFormat::Qfx => "qfx",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "ofx" => Ok(OutputFormat::Ofx),
            "qfx" => Ok(OutputFormat::Qfx),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Which source column (1-based) feeds each logical field.
///
/// A field absent from the map is unconfigured; there is no zero sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColumnMap(BTreeMap<Column, NonZeroUsize>);

impl ColumnMap {
    pub fn get(&self, column: Column) -> Option<NonZeroUsize> {
        self.0.get(&column).copied()
    }

    /// The cell for `column`, if the column is configured and the row is long enough.
    pub fn cell<'r, S: AsRef<str>>(&self, column: Column, row: &'r [S]) -> Option<&'r str> {
        let index = self.get(column)?;
        row.get(index.get() - 1).map(|cell| cell.as_ref())
    }
}

/// One layer of unvalidated settings: defaults, a config file, or overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    pub org_name: Option<String>,
    pub org_id: Option<String>,
    pub intuit_id: Option<String>,
    pub bank_id: Option<String>,
    pub account_id: Option<String>,
    pub account_type: Option<String>,
    pub currency: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub asof_date: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub balance: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub avail_balance: Option<String>,
    pub date_layout: Option<String>,
    pub has_header: Option<bool>,
    pub format: Option<String>,
    #[serde(alias = "indices")]
    pub columns: BTreeMap<Column, usize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TextOrNumber {
    Text(String),
    Integer(i64),
    Float(f64),
}

/// Balances may be written as TOML numbers or as bank-formatted strings.
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<TextOrNumber>::deserialize(deserializer)?.map(|v| match v {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Integer(n) => n.to_string(),
        TextOrNumber::Float(f) => f.to_string(),
    }))
}

fn require<'a>(field: &'static str, value: &'a Option<String>) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(field))
}

impl RawSettings {
    pub fn defaults() -> Self {
        RawSettings {
            currency: Some(DEFAULT_CURRENCY.to_string()),
            date_layout: Some(DEFAULT_DATE_LAYOUT.to_string()),
            has_header: Some(true),
            format: Some(OutputFormat::Ofx.to_string()),
            columns: BTreeMap::from([
                (Column::Date, 1),
                (Column::Posted, 2),
                (Column::Name, 3),
                (Column::Id, 4),
                (Column::Amount, 5),
            ]),
            ..RawSettings::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Layers `over` on top of `self`; anything `over` sets wins.
    pub fn merge(self, over: RawSettings) -> RawSettings {
        let mut columns = self.columns;
        columns.extend(over.columns);

        RawSettings {
            org_name: over.org_name.or(self.org_name),
            org_id: over.org_id.or(self.org_id),
            intuit_id: over.intuit_id.or(self.intuit_id),
            bank_id: over.bank_id.or(self.bank_id),
            account_id: over.account_id.or(self.account_id),
            account_type: over.account_type.or(self.account_type),
            currency: over.currency.or(self.currency),
            start_date: over.start_date.or(self.start_date),
            end_date: over.end_date.or(self.end_date),
            asof_date: over.asof_date.or(self.asof_date),
            balance: over.balance.or(self.balance),
            avail_balance: over.avail_balance.or(self.avail_balance),
            date_layout: over.date_layout.or(self.date_layout),
            has_header: over.has_header.or(self.has_header),
            format: over.format.or(self.format),
            columns,
        }
    }

    /// Checks required fields and parses dates and balances once.
    ///
    /// Stops at the first problem; the error always names the offending field.
    pub fn validate(&self) -> Result<Settings, ConfigError> {
        let org_name = require("org_name", &self.org_name)?;
        let org_id = require("org_id", &self.org_id)?;
        let bank_id = require("bank_id", &self.bank_id)?;
        let account_id = require("account_id", &self.account_id)?;
        let account_type = require("account_type", &self.account_type)?;
        let start_date = require("start_date", &self.start_date)?;
        let end_date = require("end_date", &self.end_date)?;
        let asof_date = require("asof_date", &self.asof_date)?;
        let balance = require("balance", &self.balance)?;
        let avail_balance = require("avail_balance", &self.avail_balance)?;

        let format = match self.format.as_deref() {
            Some(f) => f.parse()?,
            None => OutputFormat::default(),
        };

        let mut columns = BTreeMap::new();
        for (&column, &index) in &self.columns {
            let index =
                NonZeroUsize::new(index).ok_or(ConfigError::InvalidColumn { column, index })?;
            columns.insert(column, index);
        }
        if !columns.contains_key(&Column::Amount) {
            return Err(ConfigError::Missing("columns.amount"));
        }

        let date_layout = self
            .date_layout
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_DATE_LAYOUT);
        let parse_date = |field: &'static str, raw: &str| {
            Timestamp::parse(raw, date_layout)
                .map_err(|source| ConfigError::InvalidDate { field, source })
        };
        let period = StatementPeriod {
            start: parse_date("start_date", start_date)?,
            end: parse_date("end_date", end_date)?,
            as_of: parse_date("asof_date", asof_date)?,
        };

        let parse_amount = |field: &'static str, raw: &str| {
            Money::parse(raw).map_err(|source| ConfigError::InvalidAmount { field, source })
        };
        let ledger_balance = parse_amount("balance", balance)?;
        let available_balance = parse_amount("avail_balance", avail_balance)?;

        Ok(Settings {
            institution: Institution {
                name: org_name.to_string(),
                org_id: org_id.to_string(),
                intuit_id: self
                    .intuit_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(str::to_string),
            },
            account: BankAccount {
                bank_id: bank_id.to_string(),
                account_id: account_id.to_string(),
                account_type: account_type.to_string(),
            },
            currency: self
                .currency
                .as_deref()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .unwrap_or(DEFAULT_CURRENCY)
                .to_string(),
            date_layout: date_layout.to_string(),
            columns: ColumnMap(columns),
            period,
            ledger_balance,
            available_balance,
            has_header: self.has_header.unwrap_or(true),
            format,
        })
    }
}

/// Validated, read-only configuration for one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub institution: Institution,
    pub account: BankAccount,
    pub currency: String,
    pub date_layout: String,
    pub columns: ColumnMap,
    pub period: StatementPeriod,
    pub ledger_balance: Money,
    pub available_balance: Money,
    pub has_header: bool,
    pub format: OutputFormat,
}

impl Settings {
    pub fn parse_date(&self, raw: &str) -> Result<Timestamp, DateError> {
        Timestamp::parse(raw, &self.date_layout)
    }
}
