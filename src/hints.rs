// Hint tables for account resolution, loaded from "colon-conf" files.
//
// A colon-conf is a simple key/value text format whose keys may contain
// anything, colons included. Values may span multiple lines when the
// continuation lines start with whitespace, and `#` begins a full-line
// comment:
//
//     expense.grocery =
//         WALMART
//         TARGET
//     expense.gasoline = BP
//
// Each key is a canonical account string and each value line is a candidate
// substring; the hint table maps the substrings back to their account.

use std::fs;
use std::io;
use std::path::Path;

/// Parse colon-conf text into ordered `(key, value)` pairs.
///
/// Later declarations of the same key replace the earlier value in place.
pub fn colonconf(text: &str) -> Vec<(String, String)> {
    let mut vars: Vec<(String, Vec<String>)> = Vec::new();
    let mut current: Option<usize> = None;

    for line in text.lines() {
        match line.chars().next() {
            Some(c) if !c.is_whitespace() => {
                if line.trim_start().starts_with('#') {
                    continue;
                }

                let (key, value) = match line.split_once('=') {
                    Some((k, v)) => (k.trim().to_string(), v.trim().to_string()),
                    None => (line.trim().to_string(), String::new()),
                };

                if let Some(pos) = vars.iter().position(|(k, _)| *k == key) {
                    vars[pos].1 = vec![value];
                    current = Some(pos);
                } else {
                    vars.push((key, vec![value]));
                    current = Some(vars.len() - 1);
                }
            }
            _ => {
                // continuation of the current variable
                if let Some(pos) = current {
                    vars[pos].1.push(line.trim().to_string());
                }
            }
        }
    }

    vars.into_iter()
        .map(|(k, v)| (k, v.join("\n").trim().to_string()))
        .collect()
}

/// Substring lookup table mapping raw spreadsheet text to account names.
#[derive(Debug, Clone, Default)]
pub struct Hints {
    /// `(pattern, account)` in registration order.
    entries: Vec<(String, String)>,
}

impl Hints {
    pub fn new() -> Self {
        Hints::default()
    }

    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let mut hints = Hints::new();
        hints.load_file(path)?;
        Ok(hints)
    }

    /// Load additional entries from a hints file.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> io::Result<()> {
        let text = fs::read_to_string(path)?;
        self.load_str(&text);
        Ok(())
    }

    /// Load additional entries from colon-conf text.
    pub fn load_str(&mut self, text: &str) {
        for (account, patterns) in colonconf(text) {
            for line in patterns.lines().filter(|l| !l.is_empty()) {
                self.entries.push((line.to_string(), account.clone()));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Suggest an account for a string.
    ///
    /// An exact pattern match wins; otherwise the first registered pattern
    /// that is a substring of `s` does. First come, only served.
    pub fn suggest(&self, s: &str) -> Option<&str> {
        if let Some((_, account)) = self.entries.iter().find(|(p, _)| p == s) {
            return Some(account);
        }

        self.entries
            .iter()
            .find(|(p, _)| s.contains(p.as_str()))
            .map(|(_, account)| account.as_str())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const HINTS: &str = indoc! {"
        # maps raw spreadsheet text to accounts
        expense.computer =
            micro-center

        expense.gasoline = BP
        expense.grocery =
            WALMART
            TARGET
    "};

    #[test]
    fn colonconf_handles_multiline_values_and_comments() {
        let conf = indoc! {"
            simplevar=4
            my:var:name = line1
                line2

            multi:line2 =
                first
                second
            # a comment
        "};

        let parsed = colonconf(conf);
        assert_eq!(
            parsed,
            vec![
                ("simplevar".to_string(), "4".to_string()),
                ("my:var:name".to_string(), "line1\nline2".to_string()),
                ("multi:line2".to_string(), "first\nsecond".to_string()),
            ]
        );
    }

    #[test]
    fn colonconf_replaces_redeclared_keys() {
        let parsed = colonconf("a = 1\na = 2\n");
        assert_eq!(parsed, vec![("a".to_string(), "2".to_string())]);
    }

    #[test]
    fn suggests_exact_then_substring() {
        let mut hints = Hints::new();
        hints.load_str(HINTS);

        assert_eq!(hints.suggest("micro"), None);
        assert_eq!(hints.suggest("micro-center"), Some("expense.computer"));
        assert_eq!(
            hints.suggest("BP BEYOND PETROLEUM #123"),
            Some("expense.gasoline")
        );
        assert_eq!(hints.suggest("WALMART Store"), Some("expense.grocery"));
        assert_eq!(hints.suggest("TARGET #111::HI"), Some("expense.grocery"));
    }

    #[test]
    fn first_registered_pattern_wins() {
        let mut hints = Hints::new();
        hints.load_str("income.first = pay\nincome.second = paycheck\n");

        assert_eq!(hints.suggest("paycheck october"), Some("income.first"));
        // exact match outranks registration order
        assert_eq!(hints.suggest("paycheck"), Some("income.second"));
    }

    #[test]
    fn empty_text_loads_nothing() {
        let mut hints = Hints::new();
        hints.load_str("");
        assert!(hints.is_empty());
    }
}
