//! Target determination engine.
//!
//! Derives, per (function, dimension), the minimal and median target function
//! values reached at each expected-running-time level of a reference
//! algorithm. When no dedicated reference is configured the reference ERT
//! curve comes from all available records for the function.
//!
//! Targets below the configured floor are clamped up to it: an exact-zero
//! target is not representable under log-scale aggregation and would collapse
//! several (function, dimension) curves together.

pub mod cache;


use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::config::AggregationConfig;
use crate::index::RecordIndex;
use crate::record::RunRecord;

pub use cache::load_or_compute;

/// A reference running-time level, totally ordered so it can key the target
/// mappings deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErtLevel(pub f64);

impl Eq for ErtLevel {}

impl PartialOrd for ErtLevel {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ErtLevel {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// A (function, dimension) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProblemId {
    pub func_id: u32,
    pub dim: u32,
}

/// Mapping from ERT level to per-problem target function values.
pub type TargetMap = BTreeMap<ErtLevel, BTreeMap<ProblemId, f64>>;

/// Minimum- and median-observed target values at each reference ERT level,
/// computed once per distinct algorithm set and cacheable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TargetSet {
    /// Algorithm set the targets were computed for.
    pub algorithms: BTreeSet<String>,
    /// Minimum function value reached within each ERT budget.
    pub min: TargetMap,
    /// Median function value reached at each ERT budget.
    pub median: TargetMap,
}

impl TargetSet {
    pub fn is_empty(&self) -> bool {
        self.min.is_empty() || self.median.is_empty()
    }

    /// ERT levels present, ascending.
    pub fn levels(&self) -> impl Iterator<Item = ErtLevel> + '_ {
        self.min.keys().copied()
    }

    /// Per-function minimum targets at one level, restricted to a dimension.
    pub fn min_targets_for_dim(&self, level: ErtLevel, dim: u32) -> BTreeMap<u32, f64> {
        self.min
            .get(&level)
            .map(|targets| {
                targets
                    .iter()
                    .filter(|(p, _)| p.dim == dim)
                    .map(|(p, &v)| (p.func_id, v))
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Reference curve for one function: at each ERT level, the minimum and
/// median function value reached within that evaluation budget.
#[derive(Debug, Clone, PartialEq)]
pub struct FunTarget {
    pub ert: Vec<f64>,
    pub min_target: Vec<f64>,
    pub median_target: Vec<f64>,
}

/// Expected running time to reach `target`: mean evaluations over all trials,
/// with unsuccessful trials contributing their (penalized) consumed budget.
/// `None` when no trial reached the target.
pub fn expected_running_time(
    records: &[&RunRecord],
    target: f64,
    penalty_multiplier: f64,
) -> Option<f64> {
    let mut successes = 0usize;
    let mut total_evals = 0.0;
    for record in records {
        match record.evals_to_reach(target) {
            Some(evals) => {
                successes += 1;
                total_evals += evals as f64;
            }
            None => total_evals += penalty_multiplier * record.max_evals as f64,
        }
    }
    (successes > 0).then(|| total_evals / successes as f64)
}

/// Median of a sample; averages the two middle values for even counts.
fn median(values: &mut [f64]) -> f64 {
    values.sort_unstable_by(f64::total_cmp);
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        f64::midpoint(values[n / 2 - 1], values[n / 2])
    }
}

/// Compute the reference curve for one function's records.
///
/// Every distinct threshold attempted by the records yields one candidate ERT
/// level; thresholds nobody reached yield none. At each level the minimum and
/// median are taken over the trials that reached at least one threshold
/// within that budget, so both vectors are as long as `ert`.
pub fn function_targets(records: &[&RunRecord], config: &AggregationConfig) -> FunTarget {
    let mut thresholds: Vec<f64> = records
        .iter()
        .flat_map(|r| r.targets().iter().copied())
        .collect();
    // Descending: easier thresholds first, matching increasing ERT.
    thresholds.sort_unstable_by(|a, b| b.total_cmp(a));
    thresholds.dedup();

    let mut ert = Vec::new();
    let mut min_target = Vec::new();
    let mut median_target = Vec::new();
    for threshold in thresholds {
        let Some(level) = expected_running_time(records, threshold, config.penalty_multiplier)
        else {
            continue;
        };
        let mut reached: Vec<f64> = records
            .iter()
            .filter_map(|r| r.best_value_within(level))
            .collect();
        if reached.is_empty() {
            continue;
        }
        let min = reached.iter().copied().fold(f64::INFINITY, f64::min);
        let med = median(&mut reached);
        ert.push(level);
        min_target.push(min);
        median_target.push(med);
    }
    FunTarget { ert, min_target, median_target }
}

/// Determine min/median targets for every (function, dimension) in the index.
///
/// Results are accumulated into explicit local mappings and are identical for
/// identical input records regardless of iteration order. The first value
/// computed for an (ERT level, problem) pair wins, matching the
/// easiest-threshold-first traversal.
pub fn determine_targets(index: &RecordIndex<'_>, config: &AggregationConfig) -> TargetSet {
    let mut set = TargetSet {
        algorithms: index.algorithms(),
        ..TargetSet::default()
    };
    for dim in index.dimensions() {
        for func_id in index.functions(dim) {
            let records = match index.first_with_data(dim, func_id, &config.reference_algorithms) {
                Some((_, records)) => records,
                None => index.function_group(dim, func_id),
            };
            let fun_target = function_targets(&records, config);
            let problem = ProblemId { func_id, dim };
            for i in 0..fun_target.ert.len() {
                let level = ErtLevel(fun_target.ert[i]);
                set.min
                    .entry(level)
                    .or_default()
                    .entry(problem)
                    .or_insert_with(|| fun_target.min_target[i].max(config.target_floor));
                set.median
                    .entry(level)
                    .or_default()
                    .entry(problem)
                    .or_insert_with(|| fun_target.median_target[i].max(config.target_floor));
            }
        }
    }
    set
}
