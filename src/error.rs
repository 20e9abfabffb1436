// Typed failures surfaced by the core.
//
// Every error carries enough context to pinpoint the offending field; row
// errors are wrapped with their 1-based line number and, for file loads,
// the originating path. Nothing is downgraded to a logged warning.

use rust_decimal::Decimal;
use thiserror::Error;

/// A malformed amount expression.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("empty string provided for amount")]
    Empty,

    #[error("no amount provided for exchange")]
    NoAmount,

    #[error("two amounts with no currency to tell them apart")]
    AmbiguousAmounts,

    #[error("colon group `{0}` needs exactly one amount and one currency")]
    BadColonGroup(String),

    #[error("too many amounts specified")]
    TooManyAmounts,

    #[error("competing currencies each need their own amount")]
    CompetingCurrencies,

    #[error("invalid amount - too many entries ({0})")]
    TooManyTokens(usize),

    #[error("one side has to lose while the other gains")]
    SignConflict,

    #[error("uneven exchange: {0} and {1}")]
    UnevenExchange(Decimal, Decimal),
}

/// An unresolvable or malformed account name.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    #[error("no account information specified")]
    Empty,

    #[error("account name `{0}` may not contain spaces")]
    EmbeddedSpace(String),

    #[error("`{0}` is not an account type")]
    InvalidType(String),

    #[error("`{0}` matches more than one account type")]
    AmbiguousType(String),

    #[error("account type `{0}` needs a name")]
    MissingName(String),

    #[error("no suggestion for `{original}`")]
    NoSuggestion { original: String },

    #[error("`{original}` generated the suggestion `{suggestion}`, which is invalid: {source}")]
    BadSuggestion {
        original: String,
        suggestion: String,
        source: Box<AccountError>,
    },
}

/// An unparsable date field.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("could not parse date `{0}`")]
pub struct DateError(pub String);

/// Whatever went wrong inside a single row.
#[derive(Debug, Error)]
pub enum RowError {
    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Date(#[from] DateError),
}

/// Failures from the ledger's batch pipeline.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("no `date` column in header")]
    MissingDateHeader,

    #[error("line {line}: {source}")]
    Row {
        line: usize,
        #[source]
        source: RowError,
    },

    #[error("{file}: {source}")]
    File {
        file: String,
        #[source]
        source: Box<LedgerError>,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    /// Attach the originating file to an error from a multi-file load.
    pub fn in_file(self, file: impl Into<String>) -> Self {
        LedgerError::File {
            file: file.into(),
            source: Box::new(self),
        }
    }
}

/// Converter preset failures.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("no converter named `{0}`")]
    Unknown(String),

    #[error("column `{0}` missing from row")]
    MissingColumn(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Budget file failures.
#[derive(Debug, Error)]
pub enum BudgetError {
    #[error("bad amount `{value}` for `{account}`")]
    BadAmount { account: String, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config {0} does not exist")]
    Missing(String),

    #[error("bad duplicate window `{0}` (want a number of days or `off`)")]
    BadWindow(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
