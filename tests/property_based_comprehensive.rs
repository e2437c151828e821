//! Property-based tests for classification, gates and report assembly
//!
//! Properties covered:
//! 1. allIssues is newIssues followed by regressions
//! 2. Records sharing an identity count as one unique error
//! 3. Every surviving event carries exactly one label
//! 4. Volume and unique gate boundaries are exclusive
//! 5. A filtered-out event is indistinguishable from an omitted one
//! 6. Severe events force instability with every gate disabled

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use quality_gate::gate::{Aggregates, GateEvaluator, GateKind};
use quality_gate::source::InMemorySource;
use quality_gate::{
    classify, EventFilter, EventRecord, EventStats, GateConfig, QualityGate,
    RawRegressionPartitions, RegressionInput, RegressionResult,
};

const NAMES: [&str; 4] = [
    "IOException",
    "TimeoutException",
    "NullPointerException",
    "IllegalStateException",
];

/// (bucket, name index, hits): bucket 0 non-regressed, 1 new, 2 regression
type RawEvent = (u8, usize, u64);

fn raw_events() -> impl Strategy<Value = Vec<RawEvent>> {
    prop::collection::vec((0u8..3, 0usize..NAMES.len(), 0u64..500), 0..20)
}

fn record(idx: usize, name_idx: usize, hits: u64) -> EventRecord {
    EventRecord {
        id: format!("e{}", idx),
        name: Some(NAMES[name_idx].to_string()),
        error_location: Some(format!("com.example.{}", NAMES[name_idx])),
        stats: Some(EventStats {
            hits,
            invocations: hits * 2,
        }),
        ..EventRecord::default()
    }
}

fn build_partitions(events: &[RawEvent], severe: &[bool]) -> RawRegressionPartitions {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
    let mut partitions = RawRegressionPartitions::empty(start);

    for (idx, &(bucket, name_idx, hits)) in events.iter().enumerate() {
        let event = record(idx, name_idx, hits);
        let is_severe = severe.get(idx).copied().unwrap_or(false);
        match bucket {
            0 => partitions.non_regressions.push(event),
            1 => {
                if is_severe {
                    partitions.critical_new.insert(event.id.clone());
                }
                partitions.new_events.push(event);
            }
            _ => {
                if is_severe {
                    partitions.critical_regressions.insert(event.id.clone());
                }
                partitions
                    .regressions
                    .push(RegressionResult::new(event, EventStats::default()));
            }
        }
    }

    partitions
}

fn evaluate(
    partitions: RawRegressionPartitions,
    gates: &GateConfig,
    regex_filter: Option<&str>,
) -> quality_gate::QualityReport {
    let source = InMemorySource::new(partitions);
    let now = Utc.with_ymd_and_hms(2024, 3, 2, 0, 0, 0).unwrap();
    QualityGate::new(&source)
        .evaluate_at(
            RegressionInput::new("S1", "All Events"),
            gates,
            5,
            regex_filter,
            now,
        )
        .unwrap()
}

fn regression_gates() -> GateConfig {
    GateConfig::from_toml_str(
        r#"
[[gate]]
type = "new_errors"

[[gate]]
type = "unique"
max_errors = 3

[[gate]]
type = "regression"
active_timespan = "1d"
baseline_timespan = "14d"
"#,
    )
    .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_all_issues_is_new_then_regressions(
        events in raw_events(),
        severe in prop::collection::vec(any::<bool>(), 20),
    ) {
        let report = evaluate(build_partitions(&events, &severe), &regression_gates(), None);

        prop_assert_eq!(
            report.all_issues().len(),
            report.new_issues().len() + report.regressions().len()
        );
        let expected: Vec<&str> = report
            .new_issues()
            .iter()
            .chain(report.regressions())
            .map(|e| e.event.id.as_str())
            .collect();
        let actual: Vec<&str> = report.all_issues().iter().map(|e| e.event.id.as_str()).collect();
        prop_assert_eq!(actual, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_shared_identity_counts_once(events in raw_events()) {
        let partitions = build_partitions(&events, &[]);
        let classification = classify(&partitions, &[], &EventFilter::all(), None);

        let mut distinct: Vec<usize> = events.iter().map(|&(_, name_idx, _)| name_idx).collect();
        distinct.sort_unstable();
        distinct.dedup();

        prop_assert_eq!(classification.unique_count(), distinct.len());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_labels_exclusive_and_exhaustive(
        events in raw_events(),
        severe in prop::collection::vec(any::<bool>(), 20),
        duplicate_into_new in any::<bool>(),
    ) {
        let mut partitions = build_partitions(&events, &severe);
        // Re-deliver the first non-regressed record as new; it must still appear once
        if duplicate_into_new {
            if let Some(first) = partitions.non_regressions.first().cloned() {
                partitions.new_events.push(first);
            }
        }

        let classification = classify(&partitions, &[], &EventFilter::all(), None);

        let mut ids: Vec<&str> = classification.events().iter().map(|e| e.event.id.as_str()).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), total);
        prop_assert_eq!(total, events.len());

        let per_label: usize = [
            quality_gate::ClassificationLabel::SevereRegression,
            quality_gate::ClassificationLabel::Regression,
            quality_gate::ClassificationLabel::SevereNew,
            quality_gate::ClassificationLabel::NewIssue,
            quality_gate::ClassificationLabel::NonRegressed,
        ]
        .iter()
        .map(|&label| classification.count(label))
        .sum();
        prop_assert_eq!(per_label, total);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_threshold_boundaries_exclusive(total in 1u64..100_000, unique in 1u64..1_000) {
        let evaluator = GateEvaluator::new();
        let aggregates = Aggregates { total_volume: total, unique_count: Some(unique) };

        let at_max = GateConfig::builder()
            .max_volume(total as i64)
            .max_unique(unique as i64)
            .build()
            .unwrap();
        let results = evaluator.evaluate(&[], &aggregates, &at_max);
        prop_assert!(!results.get(GateKind::Volume).unwrap().passed);
        prop_assert!(!results.get(GateKind::Unique).unwrap().passed);

        let above = GateConfig::builder()
            .max_volume(total as i64 + 1)
            .max_unique(unique as i64 + 1)
            .build()
            .unwrap();
        let results = evaluator.evaluate(&[], &aggregates, &above);
        prop_assert!(results.get(GateKind::Volume).unwrap().passed);
        prop_assert!(results.get(GateKind::Unique).unwrap().passed);
        prop_assert!(!results.unstable());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_filtered_event_same_as_omitted(
        events in raw_events(),
        severe in prop::collection::vec(any::<bool>(), 20),
        extra_bucket in 0u8..3,
        extra_hits in 0u64..500,
        extra_severe in any::<bool>(),
    ) {
        let gates = GateConfig::from_toml_str(
            r#"
[[gate]]
type = "new_errors"

[[gate]]
type = "volume"
max_hits = 1000

[[gate]]
type = "unique"
max_errors = 3

[[gate]]
type = "regression"
active_timespan = "1d"
baseline_timespan = "14d"
"#,
        )
        .unwrap();

        let baseline = evaluate(build_partitions(&events, &severe), &gates, Some("com\\.example"));

        let mut with_extra = build_partitions(&events, &severe);
        let mut outsider = record(999, 0, extra_hits);
        outsider.error_location = Some("org.vendor.Library".to_string());
        outsider.name = Some("VendorError".to_string());
        match extra_bucket {
            0 => with_extra.non_regressions.push(outsider),
            1 => {
                if extra_severe {
                    with_extra.critical_new.insert(outsider.id.clone());
                }
                with_extra.new_events.push(outsider);
            }
            _ => {
                if extra_severe {
                    with_extra.critical_regressions.insert(outsider.id.clone());
                }
                with_extra.regressions.push(RegressionResult::new(outsider, EventStats::default()));
            }
        }
        let filtered = evaluate(with_extra, &gates, Some("com\\.example"));

        prop_assert_eq!(filtered.filtered_out(), 1);
        prop_assert_eq!(filtered.event_volume(), baseline.event_volume());
        prop_assert_eq!(filtered.unique_events_count(), baseline.unique_events_count());
        prop_assert_eq!(filtered.unstable(), baseline.unstable());
        prop_assert_eq!(filtered.gates(), baseline.gates());
        prop_assert_eq!(filtered.all_issues(), baseline.all_issues());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_severe_events_force_instability(
        events in raw_events(),
        severe_idx in 0usize..20,
    ) {
        let partitions = build_partitions(&events, &[]);
        let mut severe = vec![false; 20];
        severe[severe_idx] = true;
        let flagged = build_partitions(&events, &severe);

        let has_severe = events
            .get(severe_idx)
            .map(|&(bucket, _, _)| bucket != 0)
            .unwrap_or(false);

        let plain = evaluate(partitions, &GateConfig::default(), None);
        prop_assert!(!plain.unstable());

        let report = evaluate(flagged, &GateConfig::default(), None);
        if has_severe {
            prop_assert!(report.unstable());
            prop_assert!(report.gates().severity_override());
        }
    }
}
