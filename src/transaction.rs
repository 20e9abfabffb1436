// The canonical double-entry record and its deduplication identity.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::amount::Amount;
use crate::error::DateError;

/// Index of a record inside the ledger's arena. `load` hands these back as
/// transaction ids; duplicate rows resolve to the id of the canonical record.
pub type TxId = usize;

/// A committed money movement between two accounts.
///
/// `date`, `src`, `dest`, and `amount` are fixed at commit time; the tag set
/// may still grow when a later-arriving duplicate merges in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Canonical name of the losing account.
    pub src: String,
    /// Canonical name of the gaining account.
    pub dest: String,
    pub amount: Amount,
    pub tags: BTreeSet<String>,
    pub notes: String,
}

/// Deduplication identity: account pair plus amount.
///
/// Dates are deliberately excluded - independent sources disagree on them -
/// and tags are excluded so tag sets accumulate instead of splitting buckets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxKey {
    pub src: String,
    pub dest: String,
    pub amount: Amount,
}

impl Transaction {
    pub fn key(&self) -> TxKey {
        TxKey {
            src: self.src.clone(),
            dest: self.dest.clone(),
            amount: self.amount.clone(),
        }
    }

    /// Merge tags in, dropping blanks.
    pub fn add_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(Into::into).filter(|t| !t.is_empty()));
    }
}

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m/%d/%y",
    "%d %b %Y",
    "%b %d, %Y",
];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Parse a date field, trying the formats banks actually export.
pub fn parse_date(s: &str) -> Result<NaiveDate, DateError> {
    let s = s.trim();

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }

    Err(DateError(s.to_string()))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(date: &str, src: &str, dest: &str, amount: &str, tags: &[&str]) -> Transaction {
        Transaction {
            date: parse_date(date).unwrap(),
            src: src.to_string(),
            dest: dest.to_string(),
            amount: Amount::parse(amount, "usd").unwrap(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            notes: String::new(),
        }
    }

    #[test]
    fn key_ignores_date_and_tags() {
        let a = tx("2023-01-17", "asset.checking", "expense.grocery", "-45.77", &["food"]);
        let b = tx("2023-01-19", "asset.checking", "expense.grocery", "-45.77", &[]);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn key_distinguishes_amounts_and_accounts() {
        let a = tx("2023-01-17", "asset.checking", "expense.grocery", "-45.77", &[]);
        let b = tx("2023-01-17", "asset.checking", "expense.grocery", "-45.78", &[]);
        let c = tx("2023-01-17", "asset.checking", "expense.gasoline", "-45.77", &[]);
        assert_ne!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn add_tags_deduplicates_and_drops_blanks() {
        let mut t = tx("2023-01-17", "asset.a", "asset.b", "-1", &["x"]);
        t.add_tags(["x", "", "y"]);
        assert_eq!(t.tags.len(), 2);
        assert!(t.tags.contains("y"));
    }

    #[test]
    fn parses_common_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2024, 12, 25).unwrap();
        for s in [
            "2024-12-25",
            "2024/12/25",
            "12/25/2024",
            "12-25-2024",
            "12/25/24",
            "25 Dec 2024",
            "Dec 25, 2024",
            "2024-12-25 10:30:00",
            " 2024-12-25 ",
        ] {
            assert_eq!(parse_date(s).unwrap(), expected, "format: {s}");
        }
    }

    #[test]
    fn garbage_dates_error() {
        assert!(parse_date("yesterday-ish").is_err());
        assert!(parse_date("").is_err());
    }
}
