// Accounts, their types, and resolution of raw account strings.
//
// A canonical account name embeds its type as the first dot segment, e.g.
// `asset.checking`. Because the type is part of the name, a `void`
// placeholder and a concrete classification of the same trailing name are
// distinct accounts and can never clash.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AccountError;
use crate::hints::Hints;
use crate::transaction::{Transaction, TxId};

// ============================================================================
// ACCOUNT TYPE
// ============================================================================

/// Types dictate how an account's balance reads in reports.
///
///   asset      => positive effect on net worth
///   expense    => money spent on consumables
///   income     => sources of income, eg. an employer
///   investment => brokerage accounts
///   liability  => debts
///   receivable => money owed to you
///   void       => placeholder for unclassified movement
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Asset,
    Expense,
    Income,
    Investment,
    Liability,
    Receivable,
    Void,
}

impl AccountType {
    pub const ALL: [AccountType; 7] = [
        AccountType::Asset,
        AccountType::Expense,
        AccountType::Income,
        AccountType::Investment,
        AccountType::Liability,
        AccountType::Receivable,
        AccountType::Void,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            AccountType::Asset => "asset",
            AccountType::Expense => "expense",
            AccountType::Income => "income",
            AccountType::Investment => "investment",
            AccountType::Liability => "liability",
            AccountType::Receivable => "receivable",
            AccountType::Void => "void",
        }
    }

    /// Resolve a type keyword: exact match, or a unique case-insensitive
    /// prefix (`exp` => expense; `i` is ambiguous).
    pub fn from_keyword(s: &str) -> Result<Self, AccountError> {
        let lower = s.to_ascii_lowercase();

        if let Some(t) = Self::ALL.iter().find(|t| t.keyword() == lower) {
            return Ok(*t);
        }

        let matches: Vec<AccountType> = Self::ALL
            .iter()
            .copied()
            .filter(|t| t.keyword().starts_with(&lower))
            .collect();
        match matches.len() {
            1 => Ok(matches[0]),
            0 => Err(AccountError::InvalidType(s.to_string())),
            _ => Err(AccountError::AmbiguousType(s.to_string())),
        }
    }

    /// The type embedded in a canonical account name. Falls back to `void`
    /// for names that did not come out of the resolver.
    pub fn of_name(name: &str) -> Self {
        name.split('.')
            .next()
            .and_then(|kw| Self::from_keyword(kw).ok())
            .unwrap_or(AccountType::Void)
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

// ============================================================================
// NAME PARSING & RESOLUTION
// ============================================================================

/// Parse a canonical `type.name` account string.
///
/// A bare type with no trailing name is invalid, except `void`, which may
/// stand alone and canonicalizes to `void.void`.
pub fn parse_name(s: &str) -> Result<(String, AccountType), AccountError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(AccountError::Empty);
    }
    if s.chars().any(char::is_whitespace) {
        return Err(AccountError::EmbeddedSpace(s.to_string()));
    }

    let segments: Vec<&str> = s.split('.').filter(|x| !x.is_empty()).collect();
    let Some((first, rest)) = segments.split_first() else {
        return Err(AccountError::Empty);
    };

    let kind = AccountType::from_keyword(first)?;
    if rest.is_empty() {
        if kind == AccountType::Void {
            return Ok(("void.void".to_string(), kind));
        }
        return Err(AccountError::MissingName(kind.keyword().to_string()));
    }

    Ok((format!("{}.{}", kind.keyword(), rest.join(".")), kind))
}

/// Resolve a raw account token into a canonical name.
///
/// `this` substitutes `this_name`; `void` stands for `void.void`. A string
/// that does not parse is retried through the hint table: exact key first,
/// then the first registered key that is a substring of the string.
pub fn resolve(
    raw: &str,
    this_name: &str,
    hints: Option<&Hints>,
) -> Result<(String, AccountType), AccountError> {
    let s = raw.trim();
    let s = match s {
        "this" => this_name,
        "void" => "void.void",
        _ => s,
    };

    match parse_name(s) {
        Ok(parsed) => Ok(parsed),
        Err(err) => {
            let Some(hints) = hints else {
                return Err(err);
            };
            let Some(suggestion) = hints.suggest(s) else {
                return Err(AccountError::NoSuggestion {
                    original: s.to_string(),
                });
            };
            let suggestion = suggestion.to_string();
            parse_name(&suggestion).map_err(|e| AccountError::BadSuggestion {
                original: s.to_string(),
                suggestion,
                source: Box::new(e),
            })
        }
    }
}

// ============================================================================
// ACCOUNT
// ============================================================================

/// An account and its running per-currency balances.
///
/// Created by the ledger on first reference and never destroyed during the
/// process lifetime. Balance entries appear lazily, defaulting to zero on
/// first touch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    pub kind: AccountType,
    pub balances: BTreeMap<String, Decimal>,
    pub transactions: Vec<TxId>,
    /// Most recent currency used in a transaction.
    pub last_currency: Option<String>,
}

impl Account {
    pub fn new(name: &str) -> Self {
        Account {
            name: name.to_string(),
            kind: AccountType::of_name(name),
            balances: BTreeMap::new(),
            transactions: Vec::new(),
            last_currency: None,
        }
    }

    /// Read a balance without inserting the zero entry.
    pub fn balance(&self, currency: &str) -> Decimal {
        self.balances.get(currency).copied().unwrap_or_default()
    }

    /// Update balances for a committed transaction this account is part of
    /// and record the reference. A self-trade applies both sides.
    pub(crate) fn apply(&mut self, id: TxId, t: &Transaction) {
        if self.name == t.src {
            let cur = t.amount.src_currency.clone();
            *self.balances.entry(cur.clone()).or_insert(Decimal::ZERO) += t.amount.src_amount;
            self.last_currency = Some(cur);
        }
        if self.name == t.dest {
            let cur = t.amount.dest_currency.clone();
            *self.balances.entry(cur.clone()).or_insert(Decimal::ZERO) += t.amount.dest_amount;
            self.last_currency = Some(cur);
        }
        self.transactions.push(id);
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_and_name() {
        let (name, kind) = parse_name("asset.checking").unwrap();
        assert_eq!(name, "asset.checking");
        assert_eq!(kind, AccountType::Asset);
    }

    #[test]
    fn joins_extra_segments() {
        let (name, _) = parse_name("expense.food.grocery").unwrap();
        assert_eq!(name, "expense.food.grocery");
    }

    #[test]
    fn unique_prefix_resolves_a_type() {
        let (name, kind) = parse_name("exp.grocery").unwrap();
        assert_eq!(name, "expense.grocery");
        assert_eq!(kind, AccountType::Expense);
    }

    #[test]
    fn ambiguous_prefix_is_rejected() {
        assert_eq!(
            parse_name("in.stocks"),
            Err(AccountError::AmbiguousType("in".to_string()))
        );
    }

    #[test]
    fn bare_type_needs_a_name_except_void() {
        assert!(matches!(
            parse_name("asset"),
            Err(AccountError::MissingName(_))
        ));
        assert_eq!(parse_name("void").unwrap().0, "void.void");
    }

    #[test]
    fn spaces_and_empty_are_invalid() {
        assert!(matches!(
            parse_name("asset.my checking"),
            Err(AccountError::EmbeddedSpace(_))
        ));
        assert_eq!(parse_name(""), Err(AccountError::Empty));
        assert_eq!(parse_name("  "), Err(AccountError::Empty));
    }

    #[test]
    fn unknown_type_is_invalid() {
        assert!(matches!(
            parse_name("grocery.stuff"),
            Err(AccountError::InvalidType(_))
        ));
    }

    #[test]
    fn this_and_void_substitute() {
        let (name, _) = resolve("this", "asset.checking", None).unwrap();
        assert_eq!(name, "asset.checking");

        let (name, kind) = resolve(" void ", "asset.checking", None).unwrap();
        assert_eq!(name, "void.void");
        assert_eq!(kind, AccountType::Void);
    }

    #[test]
    fn hints_rescue_raw_strings() {
        let mut hints = Hints::new();
        hints.load_str("expense.grocery = WALMART\n");

        let (name, _) = resolve("WALMART Store #4", "void.void", Some(&hints)).unwrap();
        assert_eq!(name, "expense.grocery");
    }

    #[test]
    fn missing_suggestion_is_reported() {
        let hints = Hints::new();
        assert!(matches!(
            resolve("mystery", "void.void", Some(&hints)),
            Err(AccountError::NoSuggestion { .. })
        ));
    }

    #[test]
    fn bad_suggestion_names_both_strings() {
        let mut hints = Hints::new();
        hints.load_str("not-an-account = WALMART\n");

        let err = resolve("WALMART Store", "void.void", Some(&hints)).unwrap_err();
        match err {
            AccountError::BadSuggestion {
                original,
                suggestion,
                ..
            } => {
                assert_eq!(original, "WALMART Store");
                assert_eq!(suggestion, "not-an-account");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn no_hints_reraises_the_original_error() {
        assert!(matches!(
            resolve("grocery.stuff", "void.void", None),
            Err(AccountError::InvalidType(_))
        ));
    }

    #[test]
    fn balance_reads_default_to_zero() {
        let account = Account::new("asset.checking");
        assert_eq!(account.balance("usd"), Decimal::ZERO);
        assert!(account.balances.is_empty());
    }
}
