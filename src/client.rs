// Client-side loading: find csvs on disk, pair them with hints files, and
// assemble a local ledger.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use crate::hints::Hints;
use crate::ledger::Ledger;
use crate::transaction::TxId;

/// Csvs found at one directory level, with the hints that apply to them.
#[derive(Debug)]
pub struct CsvGroup {
    pub csvs: Vec<PathBuf>,
    pub hints: Option<Hints>,
}

/// Map directories (or single files) to csv paths and hints files.
///
/// A directory is searched recursively; csvs inherit the hints file of the
/// nearest ancestor level unless one exists at their own. A single file
/// pairs with a `hints` file sitting next to it.
pub fn group_csvs(root: &Path, inherited: Option<&Hints>) -> Result<Vec<CsvGroup>> {
    if !root.exists() {
        bail!("{} does not exist", root.display());
    }

    let mut groups = Vec::new();

    if root.is_dir() {
        let mut csvs = Vec::new();
        let mut dirs = Vec::new();
        let mut entries: Vec<PathBuf> = std::fs::read_dir(root)
            .with_context(|| format!("could not read {}", root.display()))?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        entries.sort();

        for path in entries {
            if path.is_dir() {
                dirs.push(path);
            } else if path.extension().and_then(|e| e.to_str()) == Some("csv") {
                csvs.push(path);
            }
        }

        let local = root.join("hints");
        let hints = if local.is_file() {
            Some(Hints::from_file(&local)?)
        } else {
            inherited.cloned()
        };

        groups.push(CsvGroup {
            csvs,
            hints: hints.clone(),
        });
        for dir in dirs {
            groups.extend(group_csvs(&dir, hints.as_ref())?);
        }
    } else if root.is_file() {
        let sibling = root.parent().unwrap_or(Path::new(".")).join("hints");
        let hints = if sibling.is_file() {
            Some(Hints::from_file(&sibling)?)
        } else {
            None
        };
        groups.push(CsvGroup {
            csvs: vec![root.to_path_buf()],
            hints,
        });
    } else {
        bail!("{} is not a regular file or directory", root.display());
    }

    Ok(groups)
}

/// Build a ledger from local csvs.
///
/// `hints_override`, when given, replaces whatever hints file each csv
/// would otherwise have paired with.
pub fn load_from_paths(
    paths: &[PathBuf],
    primary_currency: &str,
    duplicate_window: Option<i64>,
    hints_override: Option<&Hints>,
    skip_invalid: bool,
) -> Result<(Ledger, Vec<TxId>)> {
    let mut groups = Vec::new();
    for path in paths {
        groups.extend(group_csvs(path, None)?);
    }

    if groups.iter().all(|g| g.csvs.is_empty()) {
        bail!("no csvs found in the specified locations");
    }

    let mut ledger = Ledger::new(primary_currency, duplicate_window);
    let mut ids = Vec::new();
    for group in &groups {
        let hints = hints_override.or(group.hints.as_ref());
        for csv in &group.csvs {
            ids.extend(ledger.load_csv_file(csv, hints, skip_invalid)?);
        }
    }

    Ok((ledger, ids))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(path: &Path, text: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, text).unwrap();
    }

    #[test]
    fn groups_inherit_hints_down_the_tree() {
        let root = std::env::temp_dir().join("tallybook-client-test");
        let _ = fs::remove_dir_all(&root);

        write(
            &root.join("hints"),
            "expense.grocery = WALMART\n",
        );
        write(
            &root.join("asset.checking.csv"),
            "date,dest,amount\n2023-07-21,WALMART #4,-45.77\n",
        );
        write(
            &root.join("cards/liability.visa.csv"),
            "date,dest,amount\n2023-07-22,WALMART #9,-12.50\n",
        );

        let (ledger, ids) =
            load_from_paths(&[root.clone()], "usd", Some(5), None, false).unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(ledger.len(), 2);
        // both files resolved WALMART through the root hints
        assert_eq!(
            ledger
                .account("expense.grocery")
                .unwrap()
                .balance("usd")
                .to_string(),
            "58.27"
        );
        assert!(ledger.account("asset.checking").is_some());
        assert!(ledger.account("liability.visa").is_some());

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_paths_error() {
        let missing = PathBuf::from("/no/such/dir");
        assert!(load_from_paths(&[missing], "usd", None, None, false).is_err());
    }
}
