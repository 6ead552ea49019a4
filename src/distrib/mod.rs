//! Empirical distribution builder.
//!
//! From one (function, dimension) group of records and a target function
//! value, builds the curves the plotting layer consumes: the runtime ECDF
//! (proportion of trials that reached the target within an evaluation budget,
//! normalized by dimension), the precision ECDF (proportion of trials at or
//! below a final-value/target ratio), and the ERT-vs-target curve.
//!
//! A group with zero qualifying trials yields an empty curve, never an
//! error; the plotting layer omits empty series.


use serde::Serialize;

use crate::config::AggregationConfig;
use crate::record::RunRecord;
use crate::target::expected_running_time;

/// One step of an empirical distribution function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurvePoint {
    pub x: f64,
    /// Proportion of trials at or below `x`, in [0, 1].
    pub proportion: f64,
}

/// Non-decreasing step curve bounded in [0, 1].
///
/// The final proportion stays below 1 when some trials never met the
/// criterion; they still count in the denominator.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct DistributionCurve {
    points: Vec<CurvePoint>,
}

impl DistributionCurve {
    /// Build from the criterion values of the qualifying trials and the total
    /// trial count (qualifying or not).
    fn from_samples(mut samples: Vec<f64>, total_trials: usize) -> Self {
        if total_trials == 0 {
            return Self::default();
        }
        samples.sort_unstable_by(f64::total_cmp);
        let points = samples
            .into_iter()
            .enumerate()
            .map(|(i, x)| CurvePoint {
                x,
                proportion: (i + 1) as f64 / total_trials as f64,
            })
            .collect();
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Proportion reached at the right end of the curve, 0 when empty.
    pub fn final_proportion(&self) -> f64 {
        self.points.last().map_or(0.0, |p| p.proportion)
    }
}

/// ERT as a function of decreasing target value.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ErtCurve {
    /// `(target, expected running time)` pairs, targets decreasing.
    pub points: Vec<(f64, f64)>,
}

impl ErtCurve {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Runtime ECDF: proportion of trials that reached `target`, as a function of
/// evaluations spent divided by dimension.
pub fn runtime_ecdf(records: &[&RunRecord], target: f64) -> DistributionCurve {
    let samples: Vec<f64> = records
        .iter()
        .filter_map(|r| r.evals_to_reach(target).map(|evals| evals as f64 / r.dim as f64))
        .collect();
    DistributionCurve::from_samples(samples, records.len())
}

/// Precision ECDF: proportion of trials whose final value, as a multiple of
/// the target (`Δf / Δf_target`), is at or below a given ratio. Every trial
/// contributes; unsuccessful ones land at ratios above 1.
pub fn precision_ecdf(records: &[&RunRecord], target: f64) -> DistributionCurve {
    if target <= 0.0 {
        return DistributionCurve::default();
    }
    let samples: Vec<f64> = records.iter().map(|r| r.final_value / target).collect();
    DistributionCurve::from_samples(samples, records.len())
}

/// ERT at each of the group's thresholds at or above the floor, in decreasing
/// target order. Thresholds no trial reached are skipped, so the curve is
/// empty when nothing was ever reached.
pub fn ert_curve(records: &[&RunRecord], config: &AggregationConfig) -> ErtCurve {
    let mut thresholds: Vec<f64> = records
        .iter()
        .flat_map(|r| r.targets().iter().copied())
        .filter(|&t| t >= config.target_floor)
        .collect();
    thresholds.sort_unstable_by(|a, b| b.total_cmp(a));
    thresholds.dedup();

    let points = thresholds
        .into_iter()
        .filter_map(|t| {
            expected_running_time(records, t, config.penalty_multiplier).map(|ert| (t, ert))
        })
        .collect();
    ErtCurve { points }
}

/// Largest per-dimension evaluation budget in the group, used by the plotting
/// layer for x-axis bounds. Zero for an empty group.
pub fn max_evals_over_dim(records: &[&RunRecord]) -> f64 {
    records
        .iter()
        .map(|r| r.max_evals as f64 / r.dim as f64)
        .fold(0.0, f64::max)
}
