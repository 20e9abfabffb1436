// Duplicate-perspective tracking.
//
// The same real-world event often shows up once per data source - a transfer
// appears in the checking export and again in the brokerage export, days
// apart and with no shared id. Candidates bucket by (src, dest, amount);
// dates are left out of the key because date is exactly the dimension the
// sources disagree on. Within a bucket, groups decide membership from the
// reporting perspective, the observed dates, and the load batch ("block").

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::debug;

use crate::transaction::{Transaction, TxId, TxKey};

/// Where a stored reference came from, for duplicate reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DupePerspectives {
    /// The record the group designated first.
    pub original: TxId,
    /// Perspective the original was stored under.
    pub original_perspective: String,
    /// Perspective the queried reference was stored under.
    pub perspective: String,
}

// ============================================================================
// DUPE GROUP
// ============================================================================

/// One bucket entry: the observations reconciled into a single event.
#[derive(Debug, Default)]
struct DupeGroup {
    /// First transaction entered.
    orig: Option<TxId>,
    /// Holds 2 entries at most.
    dates: BTreeSet<NaiveDate>,
    /// Stored transaction per perspective, in insertion order.
    entries: Vec<(String, TxId)>,
    /// Block of the most recent insertion.
    block: u64,
    /// Second empty-perspective duplicate, when the original itself is the
    /// empty-perspective entry.
    second_empty: Option<TxId>,
}

impl DupeGroup {
    fn entry(&self, perspective: &str) -> Option<TxId> {
        self.entries
            .iter()
            .find(|(p, _)| p == perspective)
            .map(|(_, id)| *id)
    }

    /// Decide whether a transaction belongs to this group.
    ///
    /// Empty perspective: the date must equal the original's, and the empty
    /// slot must be free or the incoming block must equal the recorded one -
    /// same-batch restatements collapse, a later batch starts a new group.
    ///
    /// A named perspective already present only re-matches an exact
    /// restatement from a later batch (same date, higher block), which makes
    /// re-loading a source idempotent. A new named perspective matches on an
    /// already-observed date, or within `window` days while the group still
    /// has a single date on record. A third distinct date never joins.
    fn should_own(
        &self,
        records: &[Transaction],
        t: &Transaction,
        perspective: &str,
        window: Option<i64>,
        block: u64,
    ) -> bool {
        let Some(window) = window else {
            return false;
        };
        let Some(orig) = self.orig else {
            return false;
        };
        let orig_date = records[orig].date;

        if perspective.is_empty() {
            if t.date != orig_date {
                return false;
            }
            return match self.entry("") {
                None => true,
                Some(_) => block == self.block,
            };
        }

        if let Some(stored) = self.entry(perspective) {
            return t.date == records[stored].date && block > self.block;
        }

        let in_range = (t.date - orig_date).num_days().abs() <= window;
        self.dates.contains(&t.date) || (self.dates.len() == 1 && in_range)
    }

    /// Record a transaction in this group. Only call after `should_own`.
    ///
    /// Returns the group's previous original (None when this insertion is
    /// what created the group) and the reference actually retained for the
    /// perspective.
    fn add(
        &mut self,
        records: &[Transaction],
        id: TxId,
        perspective: &str,
        block: u64,
    ) -> (Option<TxId>, TxId) {
        let old_orig = self.orig;

        if perspective.is_empty() {
            if let Some(stored) = self.entry("") {
                self.block = block;
                let kept = if Some(stored) == self.orig {
                    *self.second_empty.get_or_insert(id)
                } else {
                    stored
                };
                return (old_orig, kept);
            }
        } else if let Some(stored) = self.entry(perspective) {
            // same-source restatement: keep what is already stored
            self.block = block;
            return (old_orig, stored);
        }

        self.entries.push((perspective.to_string(), id));
        self.dates.insert(records[id].date);
        self.block = block;
        if self.orig.is_none() {
            self.orig = Some(id);
        }

        (old_orig, id)
    }

    /// Perspectives of a stored reference: the original's and the
    /// reference's own. None if the reference is not in this group.
    fn find_perspectives(&self, id: TxId) -> Option<(String, String)> {
        let first = self.entries.first()?.0.clone();

        if self.second_empty == Some(id) {
            return Some((first, String::new()));
        }

        self.entries
            .iter()
            .find(|(_, t)| *t == id)
            .map(|(p, _)| (first, p.clone()))
    }
}

// ============================================================================
// DUPE TRACKER
// ============================================================================

/// Tracks duplicate transactions across load batches.
#[derive(Debug, Default)]
pub struct DupeTracker {
    /// Day distance within which differing perspectives report one event.
    /// None disables duplicate detection entirely.
    window: Option<i64>,
    buckets: HashMap<TxKey, Vec<DupeGroup>>,
}

impl DupeTracker {
    pub fn new(window: Option<i64>) -> Self {
        DupeTracker {
            window,
            buckets: HashMap::new(),
        }
    }

    /// Determine whether a record is a duplicate and file it.
    ///
    /// Returns `(original, stored)`: `original` is None when the record is a
    /// new economic event; otherwise it names the canonical record to merge
    /// into, and `stored` is the reference retained for this observation.
    pub fn check(
        &mut self,
        records: &[Transaction],
        id: TxId,
        perspective: &str,
        block: u64,
    ) -> (Option<TxId>, TxId) {
        let window = self.window;
        let t = &records[id];
        let bucket = self.buckets.entry(t.key()).or_default();

        if let Some(pos) = bucket
            .iter()
            .position(|g| g.should_own(records, t, perspective, window, block))
        {
            debug!(
                src = %t.src,
                dest = %t.dest,
                perspective,
                block,
                "reconciled as re-observation"
            );
            return bucket[pos].add(records, id, perspective, block);
        }

        let mut group = DupeGroup::default();
        let out = group.add(records, id, perspective, block);
        bucket.push(group);
        out
    }

    /// Map stored references back to their perspectives, None for
    /// references this tracker never returned.
    pub fn perspectives(
        &self,
        records: &[Transaction],
        ids: &[TxId],
    ) -> Vec<Option<DupePerspectives>> {
        ids.iter()
            .map(|&id| {
                let groups = self.buckets.get(&records[id].key())?;
                groups.iter().find_map(|g| {
                    let (original_perspective, perspective) = g.find_perspectives(id)?;
                    Some(DupePerspectives {
                        original: g.orig?,
                        original_perspective,
                        perspective,
                    })
                })
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================
