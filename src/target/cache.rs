//! Persisted target cache.
//!
//! Stores a serializable snapshot of a computed [`TargetSet`] with three
//! fields in fixed order: the algorithm set the targets were computed for,
//! the minimum-target mapping, the median-target mapping. A cache computed
//! for a different baseline is a correctness hazard, so a requested algorithm
//! set that is not covered by the cached one fails loudly instead of
//! recomputing silently.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::AggregationConfig;
use crate::error::{PerfilarError, Result};
use crate::index::RecordIndex;

use super::{determine_targets, ErtLevel, ProblemId, TargetMap, TargetSet};

/// Serializable snapshot of a target set. Field order is the wire order.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TargetSnapshot {
    algorithms: BTreeSet<String>,
    min: Vec<LevelSnapshot>,
    median: Vec<LevelSnapshot>,
}

/// One ERT level's targets.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LevelSnapshot {
    ert: f64,
    targets: Vec<TargetEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TargetEntry {
    func_id: u32,
    dim: u32,
    value: f64,
}

fn snapshot_map(map: &TargetMap) -> Vec<LevelSnapshot> {
    map.iter()
        .map(|(level, targets)| LevelSnapshot {
            ert: level.0,
            targets: targets
                .iter()
                .map(|(problem, &value)| TargetEntry {
                    func_id: problem.func_id,
                    dim: problem.dim,
                    value,
                })
                .collect(),
        })
        .collect()
}

fn restore_map(levels: Vec<LevelSnapshot>) -> TargetMap {
    levels
        .into_iter()
        .map(|level| {
            let targets = level
                .targets
                .into_iter()
                .map(|e| (ProblemId { func_id: e.func_id, dim: e.dim }, e.value))
                .collect();
            (ErtLevel(level.ert), targets)
        })
        .collect()
}

impl From<&TargetSet> for TargetSnapshot {
    fn from(set: &TargetSet) -> Self {
        Self {
            algorithms: set.algorithms.clone(),
            min: snapshot_map(&set.min),
            median: snapshot_map(&set.median),
        }
    }
}

impl TargetSnapshot {
    fn into_target_set(self) -> TargetSet {
        TargetSet {
            algorithms: self.algorithms,
            min: restore_map(self.min),
            median: restore_map(self.median),
        }
    }
}

/// Write the snapshot atomically: serialize to a temporary file in the cache
/// directory, then rename into place so a reader never observes a partial
/// cache.
pub fn persist(path: &Path, set: &TargetSet) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let tmp = match dir {
        Some(dir) => tempfile::NamedTempFile::new_in(dir),
        None => tempfile::NamedTempFile::new(),
    }
    .map_err(|e| PerfilarError::io(format!("creating temporary cache file near {}", path.display()), e))?;
    serde_json::to_writer(tmp.as_file(), &TargetSnapshot::from(set))?;
    tmp.persist(path).map_err(|e| {
        PerfilarError::io(format!("replacing target cache {}", path.display()), e.error)
    })?;
    Ok(())
}

/// Read a previously persisted snapshot. `Ok(None)` when the file is missing
/// or empty.
pub fn load(path: &Path) -> Result<Option<TargetSet>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path)
        .map_err(|e| PerfilarError::io(format!("reading target cache {}", path.display()), e))?;
    if contents.trim().is_empty() {
        return Ok(None);
    }
    let snapshot: TargetSnapshot = serde_json::from_str(&contents)?;
    Ok(Some(snapshot.into_target_set()))
}

/// Load the cached target set for the index's algorithms, or compute and
/// persist a fresh one.
///
/// A cached algorithm set that is not a superset of the requested one means
/// the targets were derived from a different baseline; that is a
/// [`PerfilarError::StaleCache`], never a silent recompute. An empty cached
/// set (no levels) falls through to recomputation.
pub fn load_or_compute(
    path: &Path,
    index: &RecordIndex<'_>,
    config: &AggregationConfig,
) -> Result<TargetSet> {
    let requested = index.algorithms();
    if let Some(cached) = load(path)? {
        if !requested.is_subset(&cached.algorithms) {
            return Err(PerfilarError::StaleCache {
                path: path.to_path_buf(),
                cached: cached.algorithms,
                requested,
            });
        }
        if !cached.is_empty() {
            return Ok(cached);
        }
    }
    let set = determine_targets(index, config);
    persist(path, &set)?;
    Ok(set)
}
