// Transaction filtering for dump and the reporting paths.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::account::AccountType;
use crate::transaction::Transaction;

/// Criteria a transaction must meet to pass `Ledger::dump`.
///
/// Empty collections and `None` bounds are dont-cares. Serializable so the
/// server can take one in a dump request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFilter {
    /// Keep transactions on or after this date.
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Keep transactions on or before this date.
    #[serde(default)]
    pub end: Option<NaiveDate>,
    /// Canonical account names; either side may match.
    #[serde(default)]
    pub accounts: BTreeSet<String>,
    /// Currencies; either side may match.
    #[serde(default)]
    pub currencies: BTreeSet<String>,
    /// Account types; either side may match.
    #[serde(default)]
    pub types: BTreeSet<AccountType>,
    /// Tags; any overlap matches.
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl TransactionFilter {
    pub fn matches(&self, t: &Transaction) -> bool {
        if let Some(start) = self.start {
            if t.date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if t.date > end {
                return false;
            }
        }

        if !self.accounts.is_empty()
            && !self.accounts.contains(&t.src)
            && !self.accounts.contains(&t.dest)
        {
            return false;
        }

        if !self.currencies.is_empty()
            && !self.currencies.contains(&t.amount.src_currency)
            && !self.currencies.contains(&t.amount.dest_currency)
        {
            return false;
        }

        if !self.types.is_empty()
            && !self.types.contains(&AccountType::of_name(&t.src))
            && !self.types.contains(&AccountType::of_name(&t.dest))
        {
            return false;
        }

        if !self.tags.is_empty() && self.tags.intersection(&t.tags).next().is_none() {
            return false;
        }

        true
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::transaction::parse_date;

    fn tx() -> Transaction {
        Transaction {
            date: parse_date("2023-07-15").unwrap(),
            src: "asset.checking".to_string(),
            dest: "expense.grocery".to_string(),
            amount: Amount::parse("-45.77 mxn", "usd").unwrap(),
            tags: ["food".to_string()].into_iter().collect(),
            notes: String::new(),
        }
    }

    #[test]
    fn default_filter_matches_everything() {
        assert!(TransactionFilter::default().matches(&tx()));
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let mut f = TransactionFilter::default();
        f.start = parse_date("2023-07-15").ok();
        f.end = parse_date("2023-07-15").ok();
        assert!(f.matches(&tx()));

        f.start = parse_date("2023-07-16").ok();
        assert!(!f.matches(&tx()));
    }

    #[test]
    fn either_side_may_satisfy_accounts_and_types() {
        let mut f = TransactionFilter::default();
        f.accounts.insert("expense.grocery".to_string());
        assert!(f.matches(&tx()));

        let mut f = TransactionFilter::default();
        f.types.insert(AccountType::Asset);
        assert!(f.matches(&tx()));

        let mut f = TransactionFilter::default();
        f.types.insert(AccountType::Income);
        assert!(!f.matches(&tx()));
    }

    #[test]
    fn currencies_and_tags_filter() {
        let mut f = TransactionFilter::default();
        f.currencies.insert("mxn".to_string());
        assert!(f.matches(&tx()));

        f.currencies.clear();
        f.currencies.insert("jpy".to_string());
        assert!(!f.matches(&tx()));

        let mut f = TransactionFilter::default();
        f.tags.insert("food".to_string());
        assert!(f.matches(&tx()));
        f.tags.clear();
        f.tags.insert("travel".to_string());
        assert!(!f.matches(&tx()));
    }
}
