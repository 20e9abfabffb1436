// The ledger: account table, record arena, and the row pipeline.
//
// Rows stage in full before anything commits; a single bad row leaves the
// ledger untouched unless the caller asked for skip-on-invalid semantics.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{self, Read};
use std::mem;
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Trim, WriterBuilder};
use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::account::{resolve, Account};
use crate::amount::Amount;
use crate::dupes::DupeTracker;
use crate::error::{LedgerError, RowError};
use crate::filters::TransactionFilter;
use crate::hints::Hints;
use crate::transaction::{parse_date, Transaction, TxId};

/// One row of `Ledger::report_dupes` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DupeReport {
    /// The reference that was resolved to an already-known event.
    pub id: TxId,
    /// The canonical record it duplicates.
    pub original: TxId,
    pub original_perspective: String,
    pub perspective: String,
}

/// Create an automatic notes suggestion.
///
/// Uses the first three words of either label. When the labels collapse to
/// the same text (likely an exchange within one account, eg. a stock
/// purchase) or are absent, the currencies stand in.
pub fn suggest_notes(src: &str, dest: &str, amount: &Amount) -> String {
    let src = src.split_whitespace().take(3).collect::<Vec<_>>().join(" ");
    let dest = dest.split_whitespace().take(3).collect::<Vec<_>>().join(" ");

    if src == dest {
        return format!("{} -> {}", amount.src_currency, amount.dest_currency);
    }

    [src, dest]
        .iter()
        .filter(|x| !x.is_empty())
        .cloned()
        .collect::<Vec<_>>()
        .join(" -> ")
}

// ============================================================================
// LEDGER
// ============================================================================

/// Memory-resident transaction store for the process lifetime.
#[derive(Debug)]
pub struct Ledger {
    /// Currency used when no better suggestion is available.
    primary_currency: String,
    duplicate_window: Option<i64>,

    accounts: BTreeMap<String, Account>,
    /// Arena of every observed record, committed or duplicate.
    records: Vec<Transaction>,
    /// Committed records, in insertion order.
    committed: Vec<TxId>,

    dupes: DupeTracker,
    /// Number of times a batch has been committed; doubles as the block id.
    num_adds: u64,
}

impl Ledger {
    pub fn new(primary_currency: &str, duplicate_window: Option<i64>) -> Self {
        Ledger {
            primary_currency: primary_currency.to_string(),
            duplicate_window,
            accounts: BTreeMap::new(),
            records: Vec::new(),
            committed: Vec::new(),
            dupes: DupeTracker::new(duplicate_window),
            num_adds: 0,
        }
    }

    pub fn primary_currency(&self) -> &str {
        &self.primary_currency
    }

    pub fn accounts(&self) -> &BTreeMap<String, Account> {
        &self.accounts
    }

    pub fn account(&self, name: &str) -> Option<&Account> {
        self.accounts.get(name)
    }

    pub fn transaction(&self, id: TxId) -> Option<&Transaction> {
        self.records.get(id)
    }

    /// Committed transactions in insertion order.
    pub fn transactions(&self) -> impl Iterator<Item = &Transaction> + '_ {
        self.committed.iter().map(|&id| &self.records[id])
    }

    /// Number of committed transactions.
    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Clear the ledger and start from scratch.
    pub fn clear(&mut self) {
        self.accounts.clear();
        self.records.clear();
        self.committed.clear();
        self.dupes = DupeTracker::new(self.duplicate_window);
        self.num_adds = 0;
    }

    /// Sort committed transactions (and each account's references) by date.
    pub fn sort(&mut self) {
        let records = &self.records;
        self.committed.sort_by_key(|&id| records[id].date);
        for account in self.accounts.values_mut() {
            account.transactions.sort_by_key(|&id| records[id].date);
        }
    }

    // ------------------------------------------------------------------------
    // loading
    // ------------------------------------------------------------------------

    /// Load transactions from csv text. See [`Ledger::load`].
    pub fn load_str(
        &mut self,
        text: &str,
        this_name: &str,
        hints: Option<&Hints>,
        skip_invalid: bool,
    ) -> Result<Vec<TxId>, LedgerError> {
        self.load(text.as_bytes(), this_name, hints, skip_invalid)
    }

    /// Load transactions from csv rows.
    ///
    /// The header must contain `date`; `src`, `dest`, `amount`, `tags`, and
    /// `notes` are optional and column order is irrelevant. `this_name`
    /// substitutes for accounts named `this` and doubles as the perspective
    /// for duplicate detection; empty means an unattributed import.
    ///
    /// All rows stage before any commit. A failing row aborts the whole
    /// batch with its 1-based line number, unless `skip_invalid` silently
    /// drops it.
    pub fn load<R: Read>(
        &mut self,
        reader: R,
        this_name: &str,
        hints: Option<&Hints>,
        skip_invalid: bool,
    ) -> Result<Vec<TxId>, LedgerError> {
        let mut reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);

        let headers = reader.headers()?.clone();
        let col = |name: &str| headers.iter().position(|h| h == name);
        let Some(date_col) = col("date") else {
            return Err(LedgerError::MissingDateHeader);
        };
        let cols = Columns {
            date: date_col,
            src: col("src"),
            dest: col("dest"),
            amount: col("amount"),
            tags: col("tags"),
            notes: col("notes"),
        };

        let perspective = this_name;
        let this_name = if this_name.is_empty() {
            "void.void"
        } else {
            this_name
        };

        // suggestions seen for account names within this batch
        let mut currencies: HashMap<String, String> = HashMap::new();

        let mut staged = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            match self.stage_row(&record, &cols, this_name, hints, &mut currencies) {
                Ok(t) => staged.push(t),
                Err(source) => {
                    if skip_invalid {
                        continue;
                    }
                    return Err(LedgerError::Row {
                        line: i + 2,
                        source,
                    });
                }
            }
        }

        // commit; this cannot fail
        let ids = self.add_transactions(staged, perspective);
        info!(
            rows = ids.len(),
            committed = self.committed.len(),
            perspective,
            "batch committed"
        );
        Ok(ids)
    }

    /// Load a single csv file. The file stem becomes `this_name` and the
    /// perspective; errors carry the path.
    pub fn load_csv_file(
        &mut self,
        path: impl AsRef<Path>,
        hints: Option<&Hints>,
        skip_invalid: bool,
    ) -> Result<Vec<TxId>, LedgerError> {
        let path = path.as_ref();
        let this_name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_string();

        let wrap = |e: LedgerError| e.in_file(path.display().to_string());
        let file = File::open(path).map_err(|e| wrap(e.into()))?;
        self.load(file, &this_name, hints, skip_invalid).map_err(wrap)
    }

    /// Load several csv files, all or nothing per file.
    pub fn load_csv_files<P: AsRef<Path>>(
        &mut self,
        paths: &[P],
        hints: Option<&Hints>,
        skip_invalid: bool,
    ) -> Result<Vec<TxId>, LedgerError> {
        let mut ids = Vec::new();
        for path in paths {
            ids.extend(self.load_csv_file(path, hints, skip_invalid)?);
        }
        Ok(ids)
    }

    /// Parse and resolve one row into a candidate transaction. Pure with
    /// respect to ledger state; only the batch currency cache mutates.
    fn stage_row(
        &self,
        record: &StringRecord,
        cols: &Columns,
        this_name: &str,
        hints: Option<&Hints>,
        currencies: &mut HashMap<String, String>,
    ) -> Result<Transaction, RowError> {
        let field = |i: Option<usize>| i.and_then(|i| record.get(i)).unwrap_or("");

        let date = parse_date(record.get(cols.date).unwrap_or(""))?;

        let mut src_label = field(cols.src).to_string();
        let mut dest_label = field(cols.dest).to_string();

        let src_raw = if src_label.is_empty() { "this" } else { &src_label };
        let dest_raw = if dest_label.is_empty() { "this" } else { &dest_label };
        let (mut src, _) = resolve(src_raw, this_name, hints)?;
        let (mut dest, _) = resolve(dest_raw, this_name, hints)?;

        // suggested currency for the src side: batch cache, then the
        // account's last known currency, then the primary currency
        let suggestion = currencies
            .get(&src)
            .cloned()
            .or_else(|| {
                self.accounts
                    .get(&src)
                    .and_then(|a| a.last_currency.clone())
            })
            .unwrap_or_else(|| self.primary_currency.clone());

        let mut amount = match cols.amount {
            Some(i) => Amount::parse(record.get(i).unwrap_or(""), &suggestion)?,
            None => Amount::zero(&self.primary_currency),
        };

        // the stored src is always the losing side
        if amount.src_amount > Decimal::ZERO {
            mem::swap(&mut src, &mut dest);
            mem::swap(&mut src_label, &mut dest_label);
            amount.correct();
        }

        currencies.insert(src.clone(), amount.src_currency.clone());
        currencies.insert(dest.clone(), amount.dest_currency.clone());

        let notes = match field(cols.notes) {
            "" => suggest_notes(&src_label, &dest_label, &amount),
            given => given.to_string(),
        };

        let tags = field(cols.tags)
            .split(':')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();

        Ok(Transaction {
            date,
            src,
            dest,
            amount,
            tags,
            notes,
        })
    }

    // ------------------------------------------------------------------------
    // committing
    // ------------------------------------------------------------------------

    /// Commit a staged batch under one block id. Duplicates merge their tags
    /// into the canonical record instead of committing.
    pub fn add_transactions(&mut self, staged: Vec<Transaction>, perspective: &str) -> Vec<TxId> {
        self.num_adds += 1;
        let block = self.num_adds;
        staged
            .into_iter()
            .map(|t| self.add_transaction(t, perspective, block))
            .collect()
    }

    fn add_transaction(&mut self, t: Transaction, perspective: &str, block: u64) -> TxId {
        self.ensure_account(&t.src);
        self.ensure_account(&t.dest);

        let id = self.records.len();
        self.records.push(t);

        let (original, stored) = self.dupes.check(&self.records, id, perspective, block);
        match original {
            Some(orig) => {
                let incoming: Vec<String> = self.records[id].tags.iter().cloned().collect();
                self.records[orig].add_tags(incoming);
                debug!(id, orig, perspective, "merged duplicate observation");
            }
            None => {
                self.committed.push(id);
                let t = &self.records[id];
                if let Some(account) = self.accounts.get_mut(&t.src) {
                    account.apply(id, t);
                }
                if t.dest != t.src {
                    if let Some(account) = self.accounts.get_mut(&t.dest) {
                        account.apply(id, t);
                    }
                }
            }
        }

        stored
    }

    fn ensure_account(&mut self, name: &str) {
        if !self.accounts.contains_key(name) {
            self.accounts.insert(name.to_string(), Account::new(name));
        }
    }

    // ------------------------------------------------------------------------
    // reporting & serialization
    // ------------------------------------------------------------------------

    /// Report which of the given references were duplicates.
    ///
    /// `ids` should come from `load`/`add_transactions`.
    pub fn report_dupes(&self, ids: &[TxId]) -> Vec<DupeReport> {
        self.dupes
            .perspectives(&self.records, ids)
            .into_iter()
            .zip(ids.iter().copied())
            .filter_map(|(info, id)| {
                let info = info?;
                (info.original != id).then_some(DupeReport {
                    id,
                    original: info.original,
                    original_perspective: info.original_perspective,
                    perspective: info.perspective,
                })
            })
            .collect()
    }

    /// Dump filtered transactions as a csv string.
    ///
    /// Feeding the output back through `load` on a fresh ledger (duplicate
    /// detection off) reproduces the transaction set.
    pub fn dump(&self, filter: &TransactionFilter) -> Result<String, LedgerError> {
        let mut wtr = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(Vec::new());

        wtr.write_record(["date", "src", "dest", "amount", "tags", "notes"])?;
        for t in self.transactions().filter(|t| filter.matches(t)) {
            let tags: Vec<&str> = t.tags.iter().map(String::as_str).collect();
            wtr.write_record([
                t.date.format("%Y-%m-%d").to_string(),
                t.src.clone(),
                t.dest.clone(),
                t.amount.to_string(),
                tags.join(":"),
                t.notes.clone(),
            ])?;
        }

        let bytes = wtr
            .into_inner()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// A new ledger holding only the matching transactions.
    ///
    /// The copy is built from a dump, so duplicate detection is off in it;
    /// everything it holds was already reconciled here.
    pub fn filtered(&self, filter: &TransactionFilter) -> Result<Ledger, LedgerError> {
        let mut out = Ledger::new(&self.primary_currency, None);
        out.load_str(&self.dump(filter)?, "", None, false)?;
        Ok(out)
    }
}

struct Columns {
    date: usize,
    src: Option<usize>,
    dest: Option<usize>,
    amount: Option<usize>,
    tags: Option<usize>,
    notes: Option<usize>,
}

// ============================================================================
// TESTS
// ============================================================================
