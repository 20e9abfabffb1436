// Tallybook - Transaction Ingestion & Reconciliation
// Exposes all modules for use in the CLI, the API server, and tests.

pub mod account;
pub mod amount;
pub mod budget;
pub mod client;
pub mod config;
pub mod convert;
pub mod dupes;
pub mod error;
pub mod filters;
pub mod hints;
pub mod ledger;
pub mod report;
pub mod table;
pub mod transaction;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use account::{resolve, Account, AccountType};
pub use amount::Amount;
pub use budget::{load_budgets, Budget};
pub use config::Config;
pub use dupes::{DupePerspectives, DupeTracker};
pub use error::{
    AccountError, AmountError, BudgetError, ConfigError, ConvertError, DateError, LedgerError,
    RowError,
};
pub use filters::TransactionFilter;
pub use hints::Hints;
pub use ledger::{DupeReport, Ledger};
pub use transaction::{parse_date, Transaction, TxId};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
