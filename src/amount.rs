// Two-sided amounts and the expression parser.
//
// An amount expression arrives as 1-4 whitespace tokens, optionally with
// `currency:amount` / `amount:currency` colon groups. Parsing classifies the
// token list by (count, numeric positions) and maps each shape to exactly one
// construction rule, so every branch is independently testable.

use std::fmt;
use std::mem;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AmountError;

/// What the source account loses and the destination account gains.
///
/// Signs represent conservation: one side's loss is the other's gain, and a
/// same-currency move must balance exactly. Immutable after construction
/// except for [`Amount::correct`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Amount {
    pub src_currency: String,
    pub src_amount: Decimal,
    pub dest_currency: String,
    pub dest_amount: Decimal,
}

#[derive(Debug, Clone)]
enum Token {
    Num(Decimal),
    Cur(String),
}

fn classify(tok: &str) -> Token {
    match tok.parse::<Decimal>() {
        Ok(n) => Token::Num(n),
        Err(_) => Token::Cur(tok.to_string()),
    }
}

/// Split on whitespace and expand colon groups into two adjacent tokens,
/// normalized currency-first. A group must pair one numeric part with one
/// non-numeric part.
fn tokenize(raw: &str) -> Result<Vec<Token>, AmountError> {
    let mut toks = Vec::new();

    for tok in raw.split_whitespace() {
        if tok.contains(':') {
            let parts: Vec<&str> = tok.split(':').collect();
            if parts.len() != 2 || parts.iter().any(|p| p.is_empty()) {
                return Err(AmountError::BadColonGroup(tok.to_string()));
            }
            match (classify(parts[0]), classify(parts[1])) {
                (Token::Num(n), Token::Cur(c)) | (Token::Cur(c), Token::Num(n)) => {
                    toks.push(Token::Cur(c));
                    toks.push(Token::Num(n));
                }
                _ => return Err(AmountError::BadColonGroup(tok.to_string())),
            }
        } else {
            toks.push(classify(tok));
        }
    }

    Ok(toks)
}

impl Amount {
    /// Construct a validated amount.
    pub fn new(
        src_currency: impl Into<String>,
        src_amount: Decimal,
        dest_currency: impl Into<String>,
        dest_amount: Decimal,
    ) -> Result<Self, AmountError> {
        let src_currency = src_currency.into();
        let dest_currency = dest_currency.into();

        if src_amount * dest_amount > Decimal::ZERO {
            return Err(AmountError::SignConflict);
        }
        if src_currency == dest_currency && src_amount != -dest_amount {
            return Err(AmountError::UnevenExchange(src_amount, dest_amount));
        }

        Ok(Amount {
            src_currency,
            src_amount,
            dest_currency,
            dest_amount,
        })
    }

    /// The zero two-sided amount, used when a row has no amount column.
    pub fn zero(currency: &str) -> Self {
        Amount {
            src_currency: currency.to_string(),
            src_amount: Decimal::ZERO,
            dest_currency: currency.to_string(),
            dest_amount: Decimal::ZERO,
        }
    }

    /// Parse an amount expression.
    ///
    /// `suggestion` is the currency to use for any side the expression does
    /// not name. The accepted shapes:
    ///
    ///   `10`                => suggestion:10 suggestion:-10
    ///   `10 usd` / `usd 10` => usd:10 usd:-10
    ///   `usd:10 20`         => usd:10 suggestion:20
    ///   `10 20 mxn`         => suggestion:10 mxn:20
    ///   `usd:10 mxn:-20`    => usd:10 mxn:-20
    ///   `usd 10 -20 mxn`    => usd:10 mxn:-20
    ///
    /// With three tokens the lone currency pairs with the src side unless it
    /// is the final token, in which case it pairs with dest.
    pub fn parse(raw: &str, suggestion: &str) -> Result<Self, AmountError> {
        let toks = tokenize(raw)?;

        let nums: Vec<Decimal> = toks
            .iter()
            .filter_map(|t| match t {
                Token::Num(n) => Some(*n),
                Token::Cur(_) => None,
            })
            .collect();
        let curs: Vec<&str> = toks
            .iter()
            .filter_map(|t| match t {
                Token::Cur(c) => Some(c.as_str()),
                Token::Num(_) => None,
            })
            .collect();

        match toks.len() {
            0 => Err(AmountError::Empty),
            1 => match nums.len() {
                1 => Amount::new(suggestion, nums[0], suggestion, -nums[0]),
                _ => Err(AmountError::NoAmount),
            },
            2 => match (nums.len(), curs.len()) {
                (1, 1) => Amount::new(curs[0], nums[0], curs[0], -nums[0]),
                (2, 0) => Err(AmountError::AmbiguousAmounts),
                _ => Err(AmountError::NoAmount),
            },
            3 => match (nums.len(), curs.len()) {
                (2, 1) => {
                    let cur_last = matches!(toks.last(), Some(Token::Cur(_)));
                    if cur_last {
                        Amount::new(suggestion, nums[0], curs[0], nums[1])
                    } else {
                        Amount::new(curs[0], nums[0], suggestion, nums[1])
                    }
                }
                (3, 0) => Err(AmountError::TooManyAmounts),
                _ => Err(AmountError::CompetingCurrencies),
            },
            4 => match (nums.len(), curs.len()) {
                (2, 2) => Amount::new(curs[0], nums[0], curs[1], nums[1]),
                (n, _) if n > 2 => Err(AmountError::TooManyAmounts),
                _ => Err(AmountError::CompetingCurrencies),
            },
            n => Err(AmountError::TooManyTokens(n)),
        }
    }

    /// Re-orient so the src side is the losing one.
    ///
    /// Callers that swap src/dest accounts must call this in tandem.
    pub fn correct(&mut self) {
        if self.src_amount > Decimal::ZERO {
            mem::swap(&mut self.src_currency, &mut self.dest_currency);
            mem::swap(&mut self.src_amount, &mut self.dest_amount);
        }
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {}:{}",
            self.src_currency, self.src_amount, self.dest_currency, self.dest_amount
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn parts(a: &Amount) -> (&str, Decimal, &str, Decimal) {
        (
            a.src_currency.as_str(),
            a.src_amount,
            a.dest_currency.as_str(),
            a.dest_amount,
        )
    }

    #[test]
    fn single_numeric_uses_suggestion_both_sides() {
        let a = Amount::parse("10", "usd").unwrap();
        assert_eq!(parts(&a), ("usd", d("10"), "usd", d("-10")));
    }

    #[test]
    fn single_negative_is_valid() {
        let a = Amount::parse("-10", "usd").unwrap();
        assert_eq!(parts(&a), ("usd", d("-10"), "usd", d("10")));
    }

    #[test]
    fn surrounding_whitespace_is_insignificant() {
        let a = Amount::parse("  10  ", "usd").unwrap();
        assert_eq!(a.src_amount, d("10"));
    }

    #[test]
    fn double_overrides_suggestion_either_order() {
        let a = Amount::parse("10 usd", "mxn").unwrap();
        assert_eq!(parts(&a), ("usd", d("10"), "usd", d("-10")));

        let b = Amount::parse("usd 10", "mxn").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn double_with_two_numerics_is_ambiguous() {
        assert_eq!(
            Amount::parse("10 20", "usd"),
            Err(AmountError::AmbiguousAmounts)
        );
    }

    #[test]
    fn double_with_two_currencies_has_no_amount() {
        assert!(Amount::parse("dollar peso", "usd").is_err());
    }

    #[test]
    fn colon_group_binds_src() {
        let a = Amount::parse("10:dollar 20", "yen").unwrap();
        let b = Amount::parse("dollar:10 20", "yen").unwrap();
        assert_eq!(parts(&a), ("dollar", d("10"), "yen", d("20")));
        assert_eq!(a, b);
    }

    #[test]
    fn trailing_currency_binds_dest() {
        let a = Amount::parse("10 20 peso", "yen").unwrap();
        assert_eq!(parts(&a), ("yen", d("10"), "peso", d("20")));
    }

    #[test]
    fn full_conversion_pairs_by_relative_order() {
        let a = Amount::parse("usd:10 mxn:-20", "jpy").unwrap();
        assert_eq!(parts(&a), ("usd", d("10"), "mxn", d("-20")));

        let b = Amount::parse("usd 10 -20 mxn", "jpy").unwrap();
        assert_eq!(parts(&b), ("usd", d("10"), "mxn", d("-20")));
    }

    #[test]
    fn colon_group_needs_one_of_each() {
        assert!(matches!(
            Amount::parse("10:100", "usd"),
            Err(AmountError::BadColonGroup(_))
        ));
        assert!(matches!(
            Amount::parse("dollar:peso", "usd"),
            Err(AmountError::BadColonGroup(_))
        ));
        assert!(matches!(
            Amount::parse("10:peso:dollar:100", "usd"),
            Err(AmountError::BadColonGroup(_))
        ));
        assert!(Amount::parse(":", "usd").is_err());
        assert!(Amount::parse(": :", "usd").is_err());
    }

    #[test]
    fn empty_and_blank_are_errors() {
        assert_eq!(Amount::parse("", "usd"), Err(AmountError::Empty));
        assert_eq!(Amount::parse("   ", "usd"), Err(AmountError::Empty));
    }

    #[test]
    fn three_numerics_are_too_many() {
        assert_eq!(
            Amount::parse("20 10 100", "usd"),
            Err(AmountError::TooManyAmounts)
        );
    }

    #[test]
    fn too_many_tokens() {
        assert!(matches!(
            Amount::parse("a b c d e", "usd"),
            Err(AmountError::TooManyTokens(5))
        ));
        assert!(Amount::parse("dollar peso yen jam", "usd").is_err());
    }

    #[test]
    fn same_currency_must_balance() {
        assert!(matches!(
            Amount::parse("usd:10 usd:100", "jpy"),
            Err(AmountError::UnevenExchange(_, _))
        ));
    }

    #[test]
    fn matching_signs_conflict() {
        assert_eq!(
            Amount::parse("usd:10 mxn:20", "jpy"),
            Err(AmountError::SignConflict)
        );
    }

    #[test]
    fn negative_zero_is_not_a_conflict() {
        let a = Amount::parse("-0.0", "usd").unwrap();
        assert_eq!(a.src_amount, Decimal::ZERO);

        // a zero exchange is even, whatever the sign spelling
        assert!(Amount::new("usd", d("-0.0"), "usd", d("0.0")).is_ok());
    }

    #[test]
    fn correct_swaps_a_gaining_src() {
        let mut a = Amount::parse("10", "usd").unwrap();
        a.correct();
        assert_eq!(parts(&a), ("usd", d("-10"), "usd", d("10")));

        // already oriented: untouched
        let mut b = Amount::parse("-10", "usd").unwrap();
        b.correct();
        assert_eq!(parts(&b), ("usd", d("-10"), "usd", d("10")));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let a = Amount::parse("usd:10 mxn:-20", "jpy").unwrap();
        let b = Amount::parse(&a.to_string(), "jpy").unwrap();
        assert_eq!(a, b);
    }
}
