//! Composite-key index over run records.
//!
//! A single ordered mapping from `(dim, func_id, alg_id)` keys to record
//! lists; the by-dimension, by-function, and by-algorithm views are key-prefix
//! filters over it, so re-grouping is order-independent by construction.
//! Duplicate records for the same key pass through un-deduplicated;
//! completeness validation is where anomalies surface.


use std::collections::{BTreeMap, BTreeSet};

use crate::record::{RunRecord, RunRecordSet};

/// Composite grouping key. The derive order (dim, func, alg) matches the
/// standard nesting order of the downstream statistics.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct GroupKey {
    pub dim: u32,
    pub func_id: u32,
    pub alg_id: String,
}

/// Index of a record set by `(dim, func_id, alg_id)`.
#[derive(Debug)]
pub struct RecordIndex<'a> {
    groups: BTreeMap<GroupKey, Vec<&'a RunRecord>>,
}

impl<'a> RecordIndex<'a> {
    /// Index every record in the set.
    pub fn build(set: &'a RunRecordSet) -> Self {
        let mut groups: BTreeMap<GroupKey, Vec<&RunRecord>> = BTreeMap::new();
        for record in set.iter() {
            let key = GroupKey {
                dim: record.dim,
                func_id: record.func_id,
                alg_id: record.alg_id.clone(),
            };
            groups.entry(key).or_default().push(record);
        }
        Self { groups }
    }

    /// Total number of indexed records.
    pub fn record_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    /// All distinct algorithm identifiers.
    pub fn algorithms(&self) -> BTreeSet<String> {
        self.groups.keys().map(|k| k.alg_id.clone()).collect()
    }

    /// All distinct dimensions, ascending.
    pub fn dimensions(&self) -> Vec<u32> {
        let dims: BTreeSet<u32> = self.groups.keys().map(|k| k.dim).collect();
        dims.into_iter().collect()
    }

    /// All distinct functions within a dimension, ascending.
    pub fn functions(&self, dim: u32) -> Vec<u32> {
        let funcs: BTreeSet<u32> = self
            .groups
            .keys()
            .filter(|k| k.dim == dim)
            .map(|k| k.func_id)
            .collect();
        funcs.into_iter().collect()
    }

    /// All distinct algorithms within a (dimension, function) group.
    pub fn algorithms_in(&self, dim: u32, func_id: u32) -> Vec<&str> {
        self.groups
            .keys()
            .filter(|k| k.dim == dim && k.func_id == func_id)
            .map(|k| k.alg_id.as_str())
            .collect()
    }

    /// Records for one (dimension, function, algorithm) group.
    pub fn records(&self, dim: u32, func_id: u32, alg_id: &str) -> Vec<&'a RunRecord> {
        self.groups
            .iter()
            .filter(|(k, _)| k.dim == dim && k.func_id == func_id && k.alg_id == alg_id)
            .flat_map(|(_, v)| v.iter().copied())
            .collect()
    }

    /// All records for one (dimension, function) group, across algorithms.
    pub fn function_group(&self, dim: u32, func_id: u32) -> Vec<&'a RunRecord> {
        self.groups
            .iter()
            .filter(|(k, _)| k.dim == dim && k.func_id == func_id)
            .flat_map(|(_, v)| v.iter().copied())
            .collect()
    }

    /// All records in one dimension.
    pub fn dimension_group(&self, dim: u32) -> Vec<&'a RunRecord> {
        self.groups
            .iter()
            .filter(|(k, _)| k.dim == dim)
            .flat_map(|(_, v)| v.iter().copied())
            .collect()
    }

    /// Re-group the indexed records by an arbitrary derived key.
    ///
    /// The view preserves every underlying record, so grouping by any key
    /// subset in any nesting order conserves the total record count.
    pub fn group_by<K: Ord>(&self, key: impl Fn(&RunRecord) -> K) -> BTreeMap<K, Vec<&'a RunRecord>> {
        let mut out: BTreeMap<K, Vec<&RunRecord>> = BTreeMap::new();
        for &record in self.groups.values().flatten() {
            out.entry(key(record)).or_default().push(record);
        }
        out
    }

    /// Ordered-fallback lookup: the first algorithm in `preferences` that has
    /// records for the (dimension, function) group.
    ///
    /// Replaces try-each-alias-until-one-has-data iteration with an explicit
    /// optional result.
    pub fn first_with_data(
        &self,
        dim: u32,
        func_id: u32,
        preferences: &[String],
    ) -> Option<(&str, Vec<&'a RunRecord>)> {
        preferences.iter().find_map(|alg_id| {
            let records = self.records(dim, func_id, alg_id);
            if records.is_empty() {
                None
            } else {
                // Borrow the id from the index so the caller is not tied to
                // the preference list's lifetime.
                let key = self
                    .groups
                    .keys()
                    .find(|k| k.dim == dim && k.func_id == func_id && &k.alg_id == alg_id)?;
                Some((key.alg_id.as_str(), records))
            }
        })
    }
}
