use ofxify_core::{
    AccountBlock, AmountError, Balance, Column, DateError, Money, OutputFormat, Settings, SignOn,
    Statement, Status, Timestamp, Transaction, TransactionType,
};
use std::io::Read;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a single row could not become a transaction.
#[derive(Error, Debug)]
pub enum RowError {
    #[error("missing {column} column (index {index}) in a row of {len} cells")]
    MissingColumn {
        column: Column,
        index: usize,
        len: usize,
    },
    #[error("invalid {column} date {value:?}: {source}")]
    InvalidDate {
        column: Column,
        value: String,
        #[source]
        source: DateError,
    },
    #[error("invalid amount {value:?}: {source}")]
    InvalidAmount {
        value: String,
        #[source]
        source: AmountError,
    },
}

impl RowError {
    pub fn column(&self) -> Column {
        match self {
            RowError::MissingColumn { column, .. } | RowError::InvalidDate { column, .. } => {
                *column
            }
            RowError::InvalidAmount { .. } => Column::Amount,
        }
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            RowError::MissingColumn { .. } => None,
            RowError::InvalidDate { value, .. } | RowError::InvalidAmount { value, .. } => {
                Some(value)
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// The row was left out of the statement.
    Skipped,
    /// The row was kept but one optional field was left empty.
    FieldDropped,
}

/// A diagnosable problem with one input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    /// 1-based line in the source, header included.
    pub line: u64,
    pub kind: IssueKind,
    pub column: Option<Column>,
    pub value: Option<String>,
    pub message: String,
}

impl RowIssue {
    fn from_error(line: u64, kind: IssueKind, err: &RowError) -> Self {
        RowIssue {
            line,
            kind,
            column: Some(err.column()),
            value: err.value().map(str::to_string),
            message: err.to_string(),
        }
    }
}

/// Accumulates transactions from rows into a statement shaped by `Settings`.
pub struct StatementBuilder<'s> {
    settings: &'s Settings,
    statement: Statement,
    issues: Vec<RowIssue>,
}

impl<'s> StatementBuilder<'s> {
    pub fn new(settings: &'s Settings) -> Self {
        let intuit_id = match settings.format {
            OutputFormat::Qfx => Some(settings.institution.intuit_bank_id().to_string()),
            OutputFormat::Ofx => None,
        };
        let period = settings.period;

        let statement = Statement {
            sign_on: SignOn {
                status: Status::ok(),
                generated_at: Timestamp::now(),
                language: ofxify_core::statement::LANGUAGE.to_string(),
                org_name: settings.institution.name.clone(),
                org_id: settings.institution.org_id.clone(),
                intuit_id,
            },
            transaction_uid: 0,
            status: Status::ok(),
            account: AccountBlock {
                currency: settings.currency.clone(),
                bank_id: settings.account.bank_id.clone(),
                account_id: settings.account.account_id.clone(),
                account_type: settings.account.account_type.clone(),
                start: period.start,
                end: period.end,
            },
            transactions: Vec::new(),
            ledger_balance: Balance {
                amount: settings.ledger_balance,
                as_of: period.as_of,
            },
            available_balance: Balance {
                amount: settings.available_balance,
                as_of: period.as_of,
            },
        };

        StatementBuilder {
            settings,
            statement,
            issues: Vec::new(),
        }
    }

    /// Pins `DTSERVER` so repeated runs render identically.
    pub fn with_generated_at(mut self, at: Timestamp) -> Self {
        self.statement.sign_on.generated_at = at;
        self
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn finish(self) -> (Statement, Vec<RowIssue>) {
        (self.statement, self.issues)
    }

    /// Maps one row to a transaction using the configured columns.
    pub fn parse_row<S: AsRef<str>>(&self, row: &[S]) -> Result<Transaction, RowError> {
        self.map_row(row).map(|(transaction, _)| transaction)
    }

    /// Like `parse_row`, but also hands back a transaction-date failure that
    /// was tolerated.
    fn map_row<S: AsRef<str>>(
        &self,
        row: &[S],
    ) -> Result<(Transaction, Option<RowError>), RowError> {
        let columns = &self.settings.columns;

        let posted = match columns.cell(Column::Posted, row) {
            Some(raw) => Some(self.parse_date(Column::Posted, raw)?),
            None => None,
        };

        let (date, dropped) = match columns.cell(Column::Date, row) {
            Some(raw) => match self.parse_date(Column::Date, raw) {
                Ok(date) => (Some(date), None),
                Err(err) => (None, Some(err)),
            },
            None => (None, None),
        };

        let raw_amount = columns
            .cell(Column::Amount, row)
            .ok_or_else(|| RowError::MissingColumn {
                column: Column::Amount,
                index: columns.get(Column::Amount).map_or(0, |i| i.get()),
                len: row.len(),
            })?;
        let amount = Money::parse(raw_amount).map_err(|source| RowError::InvalidAmount {
            value: raw_amount.to_string(),
            source,
        })?;

        let mut transaction = match columns.cell(Column::Type, row) {
            Some(raw) => {
                let kind = match raw.parse::<TransactionType>() {
                    Ok(kind) => kind,
                    Err(never) => match never {},
                };
                Transaction::new(kind, amount)
            }
            // Without a type column the source is assumed to record debits as
            // positive numbers, the reverse of OFX.
            None => Transaction::from_inverted(amount),
        };

        transaction.posted = posted;
        transaction.date = date;
        let text = |column| {
            columns
                .cell(column, row)
                .filter(|cell| !cell.is_empty())
                .map(str::to_string)
        };
        transaction.id = text(Column::Id);
        transaction.name = text(Column::Name);
        transaction.memo = text(Column::Memo);
        transaction.payee = text(Column::Payee);

        Ok((transaction, dropped))
    }

    fn parse_date(&self, column: Column, raw: &str) -> Result<Timestamp, RowError> {
        self.settings
            .parse_date(raw)
            .map_err(|source| RowError::InvalidDate {
                column,
                value: raw.to_string(),
                source,
            })
    }

    fn push_row<S: AsRef<str>>(&mut self, line: u64, row: &[S]) {
        debug!(line, cells = row.len(), "parsing row");

        match self.map_row(row) {
            Ok((transaction, dropped)) => {
                if let Some(err) = dropped {
                    warn!(line, %err, "keeping row without transaction date");
                    self.issues
                        .push(RowIssue::from_error(line, IssueKind::FieldDropped, &err));
                }
                if !transaction.kind.is_recognized() {
                    debug!(line, kind = %transaction.kind, "passing through unrecognized type");
                }
                if let Some(posted) = transaction.posted {
                    if !self.settings.period.contains(posted) {
                        debug!(line, %posted, "posted outside statement period");
                    }
                }
                self.statement.transactions.push(transaction);
            }
            Err(err) => {
                warn!(line, %err, "skipping row");
                self.issues
                    .push(RowIssue::from_error(line, IssueKind::Skipped, &err));
            }
        }
    }

    /// Appends already-split rows, discarding the first when the source has a header.
    pub fn ingest_rows<I, S>(&mut self, rows: I)
    where
        I: IntoIterator<Item = Vec<S>>,
        S: AsRef<str>,
    {
        let skip = usize::from(self.settings.has_header);
        for (index, row) in rows.into_iter().enumerate().skip(skip) {
            self.push_row(index as u64 + 1, &row);
        }
    }

    /// Reads comma-separated rows. Rows that do not fit are recorded as
    /// issues; only a failing reader aborts.
    pub fn ingest_csv<R: Read>(&mut self, data: R) -> Result<(), ImportError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(self.settings.has_header)
            .flexible(true)
            .from_reader(data);

        for result in reader.records() {
            match result {
                Ok(record) => {
                    let line = record.position().map_or(0, |p| p.line());
                    let cells: Vec<&str> = record.iter().collect();
                    self.push_row(line, &cells);
                }
                Err(err) if matches!(err.kind(), csv::ErrorKind::Io(_)) => {
                    return Err(err.into());
                }
                Err(err) => {
                    let line = err.position().map_or(0, |p| p.line());
                    warn!(line, %err, "skipping unreadable record");
                    self.issues.push(RowIssue {
                        line,
                        kind: IssueKind::Skipped,
                        column: None,
                        value: None,
                        message: err.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}
