//! End-to-end aggregation pipeline test over a synthetic benchmark data set.

use std::collections::BTreeMap;

use perfilar::config::AggregationConfig;
use perfilar::index::RecordIndex;
use perfilar::pipeline::{Pipeline, PlotCurve, PlotStyle};
use perfilar::record::{RunRecord, RunRecordSet};
use perfilar::target::{determine_targets, load_or_compute};
use perfilar::PerfilarError;

/// Two algorithms, two functions, two dimensions, three instances each.
fn synthetic_records() -> Vec<RunRecord> {
    let mut records = Vec::new();
    for (alg, base) in [("fast", 10u64), ("slow", 100u64)] {
        for func_id in [1, 2] {
            for dim in [2, 5] {
                for instance in 1..=3 {
                    let step = base * u64::from(instance) * u64::from(dim);
                    // "slow" never reaches the hardest threshold.
                    let hardest = (alg == "fast").then_some(step * 100);
                    records.push(
                        RunRecord::new(
                            alg,
                            func_id,
                            dim,
                            instance,
                            vec![10.0, 1.0, 1e-6],
                            vec![Some(step), Some(step * 10), hardest],
                            if alg == "fast" { 1e-6 } else { 0.9 },
                            step * 200,
                        )
                        .unwrap(),
                    );
                }
            }
        }
    }
    records
}

fn build_set(config: &AggregationConfig) -> RunRecordSet {
    RunRecordSet::from_records(synthetic_records(), config)
}

#[test]
fn pipeline_end_to_end() {
    let config = AggregationConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("targets.json");

    let mut styles = BTreeMap::new();
    styles.insert(
        "fast".to_string(),
        PlotStyle {
            label: "Fast Search".to_string(),
            color: Some("red".to_string()),
            marker: Some("o".to_string()),
            linestyle: None,
        },
    );

    let pipeline = Pipeline::new(config.clone(), styles, Vec::new(), dir.path());
    let set = build_set(&config);
    let output = pipeline.run(&set, &cache_path).unwrap();

    // Every target respects the floor.
    for value in output
        .targets
        .min
        .values()
        .chain(output.targets.median.values())
        .flat_map(|m| m.values())
    {
        assert!(*value >= config.target_floor);
    }

    // Every distribution curve is monotone and bounded.
    for job in &output.jobs {
        for series in &job.series {
            let curve = match &series.curve {
                PlotCurve::Runtime(c) | PlotCurve::Precision(c) => c,
                PlotCurve::ErtTarget(_) => continue,
            };
            assert!(curve.final_proportion() <= 1.0);
            assert!(curve
                .points()
                .windows(2)
                .all(|w| w[0].proportion <= w[1].proportion));
        }
    }

    // Both dimensions produced ERT-vs-target figures.
    let ert_stems: Vec<String> = output
        .jobs
        .iter()
        .filter(|j| matches!(j.series.first().map(|s| &s.curve), Some(PlotCurve::ErtTarget(_))))
        .map(|j| j.figure_stem.file_name().unwrap().to_str().unwrap().to_string())
        .collect();
    assert!(ert_stems.iter().any(|s| s.contains("_02_")));
    assert!(ert_stems.iter().any(|s| s.contains("_05_")));

    // Target groups include the per-level and combined buckets.
    assert!(output.target_groups.iter().any(|g| g.label == "_allerts"));
    assert!(output.target_groups.iter().any(|g| g.label == "_allfs"));

    // A second run against the same cache reproduces the targets.
    let again = pipeline.run(&set, &cache_path).unwrap();
    assert_eq!(again.targets, output.targets);
}

#[test]
fn cache_rejects_grown_algorithm_set() {
    let config = AggregationConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("targets.json");

    let set = build_set(&config);
    let index = RecordIndex::build(&set);
    load_or_compute(&cache_path, &index, &config).unwrap();

    let mut extended = synthetic_records();
    extended.push(
        RunRecord::new("novel", 1, 2, 1, vec![10.0], vec![Some(5)], 9.0, 100).unwrap(),
    );
    let grown = RunRecordSet::from_records(extended, &config);
    let grown_index = RecordIndex::build(&grown);
    let err = load_or_compute(&cache_path, &grown_index, &config).unwrap_err();
    assert!(matches!(err, PerfilarError::StaleCache { .. }));
}

#[test]
fn unsuccessful_trials_stay_in_the_denominator() {
    let config = AggregationConfig::default();
    let records = vec![
        RunRecord::new(
            "a",
            1,
            2,
            1,
            vec![10.0, 1.0],
            vec![Some(10), Some(50)],
            0.5,
            1000,
        )
        .unwrap(),
        RunRecord::new("a", 1, 2, 2, vec![10.0, 1.0], vec![None, None], 50.0, 1000).unwrap(),
    ];
    let set = RunRecordSet::from_records(records, &config);
    let index = RecordIndex::build(&set);
    let group = index.records(2, 1, "a");
    let curve = perfilar::runtime_ecdf(&group, 1.0);
    assert_eq!(curve.points().len(), 1);
    assert!((curve.final_proportion() - 0.5).abs() < 1e-12);
}

#[test]
fn targets_match_direct_determination() {
    let config = AggregationConfig::default();
    let dir = tempfile::tempdir().unwrap();
    let cache_path = dir.path().join("targets.json");

    let set = build_set(&config);
    let index = RecordIndex::build(&set);
    let cached = load_or_compute(&cache_path, &index, &config).unwrap();
    let direct = determine_targets(&index, &config);
    assert_eq!(cached, direct);
}
