//! Tests for the run record store.

use super::{RunRecord, RunRecordSet};
use crate::config::AggregationConfig;
use crate::error::PerfilarError;

fn record(alg: &str, instance: u32, evals: Vec<Option<u64>>) -> RunRecord {
    RunRecord::new(alg, 1, 5, instance, vec![10.0, 1.0, 0.1], evals, 0.05, 1000).unwrap()
}

// ---------------------------------------------------------------------------
// RunRecord invariants
// ---------------------------------------------------------------------------

#[test]
fn test_new_rejects_increasing_targets() {
    let err = RunRecord::new(
        "a",
        1,
        5,
        1,
        vec![1.0, 10.0],
        vec![Some(1), Some(2)],
        0.5,
        100,
    )
    .unwrap_err();
    assert!(matches!(err, PerfilarError::Usage { .. }));
}

#[test]
fn test_new_rejects_equal_targets() {
    assert!(RunRecord::new(
        "a",
        1,
        5,
        1,
        vec![1.0, 1.0],
        vec![Some(1), Some(2)],
        0.5,
        100
    )
    .is_err());
}

#[test]
fn test_new_rejects_mismatched_lengths() {
    assert!(RunRecord::new("a", 1, 5, 1, vec![1.0], vec![Some(1), Some(2)], 0.5, 100).is_err());
}

#[test]
fn test_new_rejects_decreasing_evals() {
    assert!(RunRecord::new(
        "a",
        1,
        5,
        1,
        vec![10.0, 1.0],
        vec![Some(50), Some(20)],
        0.5,
        100
    )
    .is_err());
}

#[test]
fn test_new_rejects_zero_dim() {
    assert!(RunRecord::new("a", 1, 0, 1, vec![1.0], vec![Some(1)], 0.5, 100).is_err());
}

#[test]
fn test_unreached_gap_allowed() {
    // A missing middle entry does not break monotonicity of present entries.
    let r = RunRecord::new(
        "a",
        1,
        5,
        1,
        vec![10.0, 1.0, 0.1],
        vec![Some(10), None, Some(500)],
        0.05,
        1000,
    )
    .unwrap();
    assert_eq!(r.evals_to_reach(0.1), Some(500));
}

// ---------------------------------------------------------------------------
// Lookup helpers
// ---------------------------------------------------------------------------

#[test]
fn test_evals_to_reach_exact_and_between_thresholds() {
    let r = record("a", 1, vec![Some(10), Some(100), Some(800)]);
    assert_eq!(r.evals_to_reach(10.0), Some(10));
    assert_eq!(r.evals_to_reach(1.0), Some(100));
    // A target between thresholds requires the next harder threshold.
    assert_eq!(r.evals_to_reach(5.0), Some(100));
    assert_eq!(r.evals_to_reach(0.01), None);
}

#[test]
fn test_evals_to_reach_unreached() {
    let r = record("a", 1, vec![Some(10), None, None]);
    assert_eq!(r.evals_to_reach(1.0), None);
    assert!(r.reached(10.0));
    assert!(!r.reached(0.1));
}

#[test]
fn test_best_value_within_budget() {
    let r = record("a", 1, vec![Some(10), Some(100), Some(800)]);
    assert_eq!(r.best_value_within(5.0), None);
    assert_eq!(r.best_value_within(10.0), Some(10.0));
    assert_eq!(r.best_value_within(150.0), Some(1.0));
    assert_eq!(r.best_value_within(1e6), Some(0.1));
}

// ---------------------------------------------------------------------------
// RunRecordSet construction and completeness
// ---------------------------------------------------------------------------

#[test]
fn test_from_records_filters_dimensions() {
    let config = AggregationConfig::default();
    let keep = record("a", 1, vec![Some(1), Some(2), Some(3)]);
    let drop =
        RunRecord::new("a", 1, 7, 1, vec![1.0], vec![Some(1)], 0.5, 100).unwrap();
    let set = RunRecordSet::from_records(vec![keep, drop], &config);
    assert_eq!(set.len(), 1);
    assert_eq!(set.iter().next().unwrap().dim, 5);
}

#[test]
fn test_validate_completeness_full_profile_is_quiet() {
    let config = AggregationConfig::default();
    let mut records = Vec::new();
    for instance in 1..=5 {
        for _ in 0..3 {
            records.push(record("a", instance, vec![Some(1), Some(2), Some(3)]));
        }
    }
    let set = RunRecordSet::from_records(records, &config);
    assert!(set.validate_completeness(&config).is_empty());
}

#[test]
fn test_validate_completeness_reports_missing_instances() {
    let config = AggregationConfig::default();
    let set = RunRecordSet::from_records(
        vec![record("a", 1, vec![Some(1), Some(2), Some(3)])],
        &config,
    );
    let warnings = set.validate_completeness(&config);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].alg_id, "a");
    assert_eq!(warnings[0].observed[&1], 1);
    let message = warnings[0].to_string();
    assert!(message.contains("f1"));
    assert!(message.contains("5D"));
}

#[test]
fn test_validate_completeness_deterministic_profile() {
    let mut config = AggregationConfig::default();
    config.deterministic_algorithms.insert("direct".to_string());
    let records: Vec<_> = (1..=5)
        .map(|instance| record("direct", instance, vec![Some(1), Some(2), Some(3)]))
        .collect();
    let set = RunRecordSet::from_records(records, &config);
    // One trial per instance satisfies the deterministic profile.
    assert!(set.validate_completeness(&config).is_empty());
}
