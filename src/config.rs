//! Aggregation configuration.
//!
//! The floor constant and the "not reached" penalty multiplier are benchmark
//! conventions, not derivable from the aggregation logic, so both are
//! configurable rather than hard-coded.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Settings controlling target determination and distribution construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationConfig {
    /// Smallest representable target function value. Targets below this are
    /// clamped up to it; exact zero breaks log-scale aggregation downstream.
    pub target_floor: f64,

    /// Multiplier applied to an unsuccessful trial's evaluation budget in the
    /// ERT penalty term.
    pub penalty_multiplier: f64,

    /// Dimensions retained when building a record set. Records in other
    /// dimensions are dropped at construction.
    pub dimensions_of_interest: Vec<u32>,

    /// Reference algorithms for target determination, in preference order.
    /// Empty means every function's targets derive from all available records.
    pub reference_algorithms: Vec<String>,

    /// Expected trials per instance id for stochastic algorithms.
    pub expected_instances: BTreeMap<u32, usize>,

    /// Expected trials per instance id for deterministic algorithms.
    pub expected_instances_deterministic: BTreeMap<u32, usize>,

    /// Algorithms validated against the deterministic instance profile.
    pub deterministic_algorithms: BTreeSet<String>,

    /// Fixed-precision target values used for the `_f...D` plot groups.
    pub fixed_targets: Vec<f64>,

    /// ERT levels at or above this value share one combined plot group.
    pub ert_group_cutoff: f64,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            target_floor: 1e-8,
            penalty_multiplier: 1.0,
            dimensions_of_interest: vec![2, 3, 5, 10, 20],
            reference_algorithms: Vec::new(),
            expected_instances: (1..=5).map(|i| (i, 3)).collect(),
            expected_instances_deterministic: (1..=5).map(|i| (i, 1)).collect(),
            deterministic_algorithms: BTreeSet::new(),
            fixed_targets: vec![10.0, 1.0, 0.1, 1e-2, 1e-3, 1e-4, 1e-5, 1e-8],
            ert_group_cutoff: 1e4,
        }
    }
}

impl AggregationConfig {
    /// Expected instance/trial profile for the given algorithm.
    pub fn expected_profile(&self, alg_id: &str) -> &BTreeMap<u32, usize> {
        if self.deterministic_algorithms.contains(alg_id) {
            &self.expected_instances_deterministic
        } else {
            &self.expected_instances
        }
    }
}
