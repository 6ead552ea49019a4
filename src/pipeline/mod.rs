//! Batch pipeline.
//!
//! Single-threaded orchestration over a fully loaded record set: validate
//! completeness, load or compute the target set, group ERT levels into
//! labeled target groups, and emit per-(function, dimension, target-level)
//! plot jobs — curves paired with per-algorithm styling metadata and an
//! output path stem — for the plotting collaborator.


use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::AggregationConfig;
use crate::distrib::{
    ert_curve, max_evals_over_dim, precision_ecdf, runtime_ecdf, DistributionCurve, ErtCurve,
};
use crate::error::{PerfilarError, Result};
use crate::index::RecordIndex;
use crate::record::{CompletenessWarning, RunRecordSet};
use crate::target::{cache, ErtLevel, ProblemId, TargetSet};

/// Display attributes for one algorithm's plot series, supplied by an
/// external configuration collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotStyle {
    pub label: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub marker: Option<String>,
    #[serde(default)]
    pub linestyle: Option<String>,
}

/// A labeled bundle of per-problem target mappings.
///
/// Each ERT level below the cutoff gets its own group; levels at or above it
/// share one bucket; `_allerts` collects every level. Fixed-precision groups
/// assign one constant target to every problem in the set.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGroup {
    pub label: String,
    pub levels: Vec<BTreeMap<ProblemId, f64>>,
}

/// One curve handed to the plotting layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PlotCurve {
    Runtime(DistributionCurve),
    Precision(DistributionCurve),
    ErtTarget(ErtCurve),
}

/// One algorithm's series within a figure.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSeries {
    pub alg_id: String,
    pub style: Option<PlotStyle>,
    pub curve: PlotCurve,
}

/// One figure's worth of curves plus the destination path stem.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotJob {
    pub figure_stem: PathBuf,
    pub dim: u32,
    pub func_id: u32,
    pub series: Vec<PlotSeries>,
    /// Largest per-dimension budget in the group, for x-axis bounds.
    pub max_evals_over_dim: f64,
}

/// Everything the pipeline computed for the plotting collaborator.
#[derive(Debug)]
pub struct PipelineOutput {
    pub warnings: Vec<CompletenessWarning>,
    pub targets: TargetSet,
    pub target_groups: Vec<TargetGroup>,
    pub jobs: Vec<PlotJob>,
}

/// Format a level the way figure names expect: `1.0e+04`, `1.0e-08`.
fn format_level(value: f64) -> String {
    let formatted = format!("{value:.1e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exp.abs())
        }
        None => formatted,
    }
}

/// Group the target set's ERT levels into the labeled bundles the
/// performance-profile figures are built from.
pub fn group_target_levels(set: &TargetSet, config: &AggregationConfig) -> Vec<TargetGroup> {
    let mut groups = Vec::new();
    let mut high_levels = Vec::new();
    let mut all_levels = Vec::new();

    for (level, targets) in &set.min {
        if level.0 < config.ert_group_cutoff {
            groups.push(TargetGroup {
                label: format!("_ert{}D", format_level(level.0)),
                levels: vec![targets.clone()],
            });
        } else {
            high_levels.push(targets.clone());
        }
        all_levels.push(targets.clone());
    }
    if !high_levels.is_empty() {
        groups.push(TargetGroup {
            label: format!("_ert{}Dandmore", format_level(config.ert_group_cutoff)),
            levels: high_levels,
        });
    }
    if !all_levels.is_empty() {
        groups.push(TargetGroup { label: "_allerts".to_string(), levels: all_levels });
    }

    let problems: Vec<ProblemId> = set
        .min
        .values()
        .flat_map(|targets| targets.keys().copied())
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    if problems.is_empty() {
        return groups;
    }
    let mut fixed_levels = Vec::new();
    for &target in &config.fixed_targets {
        let level: BTreeMap<ProblemId, f64> =
            problems.iter().map(|&p| (p, target)).collect();
        groups.push(TargetGroup {
            label: format!("_f{}D", format_level(target)),
            levels: vec![level.clone()],
        });
        fixed_levels.push(level);
    }
    if !fixed_levels.is_empty() {
        groups.push(TargetGroup { label: "_allfs".to_string(), levels: fixed_levels });
    }
    groups
}

/// Batch pipeline over one record set.
#[derive(Debug)]
pub struct Pipeline {
    config: AggregationConfig,
    styles: BTreeMap<String, PlotStyle>,
    /// Alias preference lists, one per displayed algorithm; the first alias
    /// with data wins.
    alias_groups: Vec<Vec<String>>,
    output_dir: PathBuf,
}

impl Pipeline {
    pub fn new(
        config: AggregationConfig,
        styles: BTreeMap<String, PlotStyle>,
        alias_groups: Vec<Vec<String>>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self { config, styles, alias_groups, output_dir: output_dir.into() }
    }

    fn style_for(&self, alg_id: &str) -> Option<PlotStyle> {
        self.styles.get(alg_id).cloned()
    }

    /// Alias groups to iterate; when none were configured, every indexed
    /// algorithm stands alone.
    fn effective_alias_groups(&self, index: &RecordIndex<'_>) -> Vec<Vec<String>> {
        if self.alias_groups.is_empty() {
            index.algorithms().into_iter().map(|a| vec![a]).collect()
        } else {
            self.alias_groups.clone()
        }
    }

    /// Run the whole aggregation batch.
    ///
    /// Completeness problems are logged and reported but never abort; an
    /// empty record set is a usage error.
    pub fn run(&self, set: &RunRecordSet, cache_path: &Path) -> Result<PipelineOutput> {
        if set.is_empty() {
            return Err(PerfilarError::usage("no run records to process"));
        }

        let warnings = set.validate_completeness(&self.config);
        for warning in &warnings {
            warn!("{warning}");
        }

        let index = RecordIndex::build(set);
        let targets = cache::load_or_compute(cache_path, &index, &self.config)?;
        let target_groups = group_target_levels(&targets, &self.config);

        let alias_groups = self.effective_alias_groups(&index);
        let mut jobs = Vec::new();
        for dim in index.dimensions() {
            for func_id in index.functions(dim) {
                jobs.push(self.ert_target_job(&index, dim, func_id, &alias_groups));
                for level in targets.levels() {
                    let per_func = targets.min_targets_for_dim(level, dim);
                    if per_func.is_empty() {
                        continue;
                    }
                    // Functions without a target at this level fall back to
                    // zero, which yields empty curves the plotting layer
                    // omits.
                    let target = per_func.get(&func_id).copied().unwrap_or(0.0);
                    jobs.push(self.distribution_job(
                        &index,
                        dim,
                        func_id,
                        level,
                        target,
                        &alias_groups,
                        true,
                    ));
                    jobs.push(self.distribution_job(
                        &index,
                        dim,
                        func_id,
                        level,
                        target,
                        &alias_groups,
                        false,
                    ));
                }
            }
        }

        Ok(PipelineOutput { warnings, targets, target_groups, jobs })
    }

    fn ert_target_job(
        &self,
        index: &RecordIndex<'_>,
        dim: u32,
        func_id: u32,
        alias_groups: &[Vec<String>],
    ) -> PlotJob {
        let group = index.function_group(dim, func_id);
        let series = alias_groups
            .iter()
            .filter_map(|aliases| index.first_with_data(dim, func_id, aliases))
            .map(|(alg_id, records)| PlotSeries {
                alg_id: alg_id.to_string(),
                style: self.style_for(alg_id),
                curve: PlotCurve::ErtTarget(ert_curve(&records, &self.config)),
            })
            .collect();
        PlotJob {
            figure_stem: self.output_dir.join(format!("ppfig_f{func_id:03}_{dim:02}_ert")),
            dim,
            func_id,
            series,
            max_evals_over_dim: max_evals_over_dim(&group),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn distribution_job(
        &self,
        index: &RecordIndex<'_>,
        dim: u32,
        func_id: u32,
        level: ErtLevel,
        target: f64,
        alias_groups: &[Vec<String>],
        runtime: bool,
    ) -> PlotJob {
        let group = index.function_group(dim, func_id);
        let series = alias_groups
            .iter()
            .filter_map(|aliases| index.first_with_data(dim, func_id, aliases))
            .map(|(alg_id, records)| {
                let curve = if runtime {
                    PlotCurve::Runtime(runtime_ecdf(&records, target))
                } else {
                    PlotCurve::Precision(precision_ecdf(&records, target))
                };
                PlotSeries {
                    alg_id: alg_id.to_string(),
                    style: self.style_for(alg_id),
                    curve,
                }
            })
            .collect();
        let prefix = if runtime { "pprldistr" } else { "ppfvdistr" };
        PlotJob {
            figure_stem: self.output_dir.join(format!(
                "{prefix}_f{func_id:03}_{dim:02}_ert{}D",
                format_level(level.0)
            )),
            dim,
            func_id,
            series,
            max_evals_over_dim: max_evals_over_dim(&group),
        }
    }
}
