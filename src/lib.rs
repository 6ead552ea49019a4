//! Post-processing for stochastic-optimization benchmark runs.
//!
//! Aggregates raw per-trial measurement records into the statistics that feed
//! performance-profile plots: target function values derived from a reference
//! algorithm's measured running times, expected running times (ERT), and
//! empirical distribution functions over runtime and precision.
//!
//! # Architecture
//!
//! - **[`record`]**: the run-record store — raw per-trial measurements and
//!   completeness validation against expected instance/trial profiles
//! - **[`index`]**: composite-key index grouping records by dimension,
//!   function, and algorithm
//! - **[`target`]**: derives min/median target function values at reference
//!   ERT levels, with a persisted target cache
//! - **[`distrib`]**: builds runtime and precision ECDFs and ERT-vs-target
//!   curves for the plotting layer
//! - **[`pipeline`]**: batch orchestration producing plot jobs
//!
//! # Example
//!
//! ```
//! use perfilar::config::AggregationConfig;
//! use perfilar::index::RecordIndex;
//! use perfilar::record::{RunRecord, RunRecordSet};
//! use perfilar::target::determine_targets;
//!
//! # fn main() -> perfilar::Result<()> {
//! let config = AggregationConfig::default();
//! let record = RunRecord::new(
//!     "cma-es",
//!     1,
//!     2,
//!     1,
//!     vec![10.0, 1.0, 0.1],
//!     vec![Some(50), Some(400), None],
//!     0.5,
//!     1000,
//! )?;
//! let set = RunRecordSet::from_records(vec![record], &config);
//! let index = RecordIndex::build(&set);
//! let targets = determine_targets(&index, &config);
//! assert!(targets.min.values().flat_map(|m| m.values()).all(|&t| t >= config.target_floor));
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod distrib;
pub mod error;
pub mod index;
pub mod pipeline;
pub mod record;
pub mod target;

pub use config::AggregationConfig;
pub use distrib::{ert_curve, precision_ecdf, runtime_ecdf, DistributionCurve, ErtCurve};
pub use error::{PerfilarError, Result};
pub use index::{GroupKey, RecordIndex};
pub use record::{CompletenessWarning, RunRecord, RunRecordSet};
pub use target::{determine_targets, ErtLevel, ProblemId, TargetSet};
