//! Run record store.
//!
//! A [`RunRecord`] is one measured trial of one algorithm on one
//! (function, dimension, instance). Records arrive from an external loader
//! already parsed; this module holds them in memory, read-only after
//! construction, and validates the observed instance/trial profile against
//! the expected one.

#[cfg(test)]
mod tests;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::AggregationConfig;
use crate::error::{PerfilarError, Result};

/// One measured trial of one algorithm on one (function, dimension, instance).
///
/// `targets` is strictly decreasing (harder thresholds come later);
/// `evals_to_reach` is aligned with it and its present entries are
/// monotonically non-decreasing. Both invariants are checked at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Algorithm identifier.
    pub alg_id: String,
    /// Test function identifier.
    pub func_id: u32,
    /// Search-space dimension.
    pub dim: u32,
    /// Instance of the test function this trial ran on.
    pub instance_id: u32,
    targets: Vec<f64>,
    evals_to_reach: Vec<Option<u64>>,
    /// Best function value attained in the trial.
    pub final_value: f64,
    /// Evaluation budget the trial consumed.
    pub max_evals: u64,
}

impl RunRecord {
    /// Build a record, validating the threshold and evaluation invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        alg_id: impl Into<String>,
        func_id: u32,
        dim: u32,
        instance_id: u32,
        targets: Vec<f64>,
        evals_to_reach: Vec<Option<u64>>,
        final_value: f64,
        max_evals: u64,
    ) -> Result<Self> {
        if dim == 0 {
            return Err(PerfilarError::usage("run record dimension must be positive"));
        }
        if targets.len() != evals_to_reach.len() {
            return Err(PerfilarError::usage(format!(
                "run record has {} targets but {} evaluation counts",
                targets.len(),
                evals_to_reach.len()
            )));
        }
        if targets.windows(2).any(|w| w[0] <= w[1]) {
            return Err(PerfilarError::usage(
                "run record targets must be strictly decreasing",
            ));
        }
        let mut last = 0u64;
        for evals in evals_to_reach.iter().flatten() {
            if *evals < last {
                return Err(PerfilarError::usage(
                    "evaluations to reach a target must be non-decreasing as targets harden",
                ));
            }
            last = *evals;
        }
        Ok(Self {
            alg_id: alg_id.into(),
            func_id,
            dim,
            instance_id,
            targets,
            evals_to_reach,
            final_value,
            max_evals,
        })
    }

    /// Attempted target thresholds, strictly decreasing.
    pub fn targets(&self) -> &[f64] {
        &self.targets
    }

    /// `(threshold, evaluations-to-reach)` pairs in threshold order.
    pub fn threshold_evals(&self) -> impl Iterator<Item = (f64, Option<u64>)> + '_ {
        self.targets.iter().copied().zip(self.evals_to_reach.iter().copied())
    }

    /// Fewest evaluations after which this trial had a value at or below
    /// `target`, or `None` if it never got there.
    ///
    /// Thresholds decrease and evaluation counts do not, so the first reached
    /// threshold at or below `target` is the cheapest.
    pub fn evals_to_reach(&self, target: f64) -> Option<u64> {
        self.threshold_evals()
            .find(|(threshold, evals)| *threshold <= target && evals.is_some())
            .and_then(|(_, evals)| evals)
    }

    /// Best (smallest) function value reached within `budget` evaluations,
    /// or `None` if no threshold was reached by then.
    pub fn best_value_within(&self, budget: f64) -> Option<f64> {
        let mut best = None;
        for (threshold, evals) in self.threshold_evals() {
            match evals {
                Some(evals) if (evals as f64) <= budget => best = Some(threshold),
                _ => {}
            }
        }
        best
    }

    /// Whether this trial reached a value at or below `target`.
    pub fn reached(&self, target: f64) -> bool {
        self.evals_to_reach(target).is_some()
    }
}

/// Non-fatal diagnostic: an algorithm's observed instance/trial counts for a
/// function diverge from the expected profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletenessWarning {
    pub alg_id: String,
    pub func_id: u32,
    pub dim: u32,
    pub observed: BTreeMap<u32, usize>,
    pub expected: BTreeMap<u32, usize>,
}

impl fmt::Display for CompletenessWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "incomplete data for {} on f{} in {}D: observed instance/trial counts {:?}, expected {:?}",
            self.alg_id, self.func_id, self.dim, self.observed, self.expected
        )
    }
}

/// Read-only collection of run records covering the (function, dimension)
/// pairs under comparison.
#[derive(Debug, Clone, Default)]
pub struct RunRecordSet {
    records: Vec<RunRecord>,
}

impl RunRecordSet {
    /// Build a set from loaded records, keeping only the configured
    /// dimensions of interest.
    pub fn from_records(records: Vec<RunRecord>, config: &AggregationConfig) -> Self {
        let records = records
            .into_iter()
            .filter(|r| config.dimensions_of_interest.contains(&r.dim))
            .collect();
        Self { records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunRecord> {
        self.records.iter()
    }

    /// Compare each algorithm's observed instance/trial counts per
    /// (function, dimension) against its expected profile.
    ///
    /// Divergence is reported, never fatal: partial data still yields valid,
    /// if noisier, statistics downstream.
    pub fn validate_completeness(&self, config: &AggregationConfig) -> Vec<CompletenessWarning> {
        let mut observed: BTreeMap<(String, u32, u32), BTreeMap<u32, usize>> = BTreeMap::new();
        for record in &self.records {
            *observed
                .entry((record.alg_id.clone(), record.func_id, record.dim))
                .or_default()
                .entry(record.instance_id)
                .or_insert(0) += 1;
        }

        let mut warnings = Vec::new();
        for ((alg_id, func_id, dim), counts) in observed {
            let expected = config.expected_profile(&alg_id);
            if &counts != expected {
                warnings.push(CompletenessWarning {
                    alg_id,
                    func_id,
                    dim,
                    observed: counts,
                    expected: expected.clone(),
                });
            }
        }
        warnings
    }
}
