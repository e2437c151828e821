// Report assembly tests

use super::*;
use crate::event::{EventRecord, EventStats};
use crate::filter::EventFilter;
use crate::gate::{Aggregates, GateConfig, GateEvaluator};
use crate::input::RegressionInput;
use crate::regression::{classify, ClassificationLabel, RawRegressionPartitions, RegressionResult};
use crate::source::{LinkBuilder, NoLinks, TemplateLinkBuilder};
use chrono::{DateTime, TimeZone, Utc};

fn window_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 2, 12, 0, 0).unwrap()
}

fn event(id: &str, name: &str, hits: u64) -> EventRecord {
    EventRecord {
        id: id.to_string(),
        name: Some(name.to_string()),
        error_location: Some(format!("com.example.{}", name)),
        stats: Some(EventStats {
            hits,
            invocations: hits * 10,
        }),
        ..EventRecord::default()
    }
}

fn build(
    partitions: &RawRegressionPartitions,
    gates: &GateConfig,
    top_n: i64,
    links: &dyn LinkBuilder,
) -> QualityReport {
    let classification = classify(partitions, &[], &EventFilter::all(), None);
    let aggregates = Aggregates::from_classification(&classification, gates);
    let results = GateEvaluator::new().evaluate(classification.events(), &aggregates, gates);
    let mut input = RegressionInput::new("S1", "All Events");
    input.applications = vec!["web".to_string()];
    ReportAssembler::new(links, window_start(), now()).assemble(
        &classification,
        results,
        &aggregates,
        gates,
        top_n,
        input,
    )
}

/// One new, one regression, one non-regressed event with a volume gate of 40
fn three_event_partitions() -> RawRegressionPartitions {
    let mut partitions = RawRegressionPartitions::empty(window_start());
    partitions.new_events.push(event("n1", "IOException", 10));
    partitions.regressions.push(RegressionResult::new(
        event("r1", "TimeoutException", 25),
        EventStats {
            hits: 5,
            invocations: 50,
        },
    ));
    partitions.non_regressions.push(event("k1", "KnownError", 3));
    partitions
}

#[test]
fn test_three_event_scenario() {
    let gates = GateConfig::builder()
        .new_errors()
        .max_volume(40)
        .build()
        .unwrap();
    let report = build(&three_event_partitions(), &gates, 5, &NoLinks);

    assert_eq!(report.event_volume(), 38);
    assert_eq!(report.max_event_volume(), 40);
    assert_eq!(report.new_issues().len(), 1);
    assert_eq!(report.new_issues()[0].event.id, "n1");
    assert_eq!(report.regressions().len(), 1);
    assert_eq!(report.regressions()[0].baseline.map(|b| b.hits), Some(5));
    assert_eq!(report.all_issues().len(), 2);
    assert_eq!(report.top_issues().len(), 3);
    // New error gate fails, volume gate passes at 38 < 40
    assert!(report.unstable());
    assert_eq!(report.gates().failed().count(), 1);
}

#[test]
fn test_zero_events_is_stable() {
    let gates = GateConfig::builder()
        .new_errors()
        .resurfaced_errors()
        .max_volume(1)
        .max_unique(1)
        .build()
        .unwrap();
    let report = build(&RawRegressionPartitions::empty(window_start()), &gates, 5, &NoLinks);

    assert!(!report.unstable());
    assert_eq!(report.event_volume(), 0);
    assert_eq!(report.unique_events_count(), 0);
    assert!(report.all_issues().is_empty());
    assert!(report.top_issues().is_empty());
    assert!(report.to_report_string().starts_with("✅ STABLE"));
}

#[test]
fn test_top_n_orders_by_hits() {
    let mut partitions = RawRegressionPartitions::empty(window_start());
    partitions.non_regressions.push(event("a", "A", 10));
    partitions.non_regressions.push(event("b", "B", 30));
    partitions.non_regressions.push(event("c", "C", 20));

    let report = build(&partitions, &GateConfig::default(), 2, &NoLinks);
    let hits: Vec<u64> = report.top_issues().iter().map(|e| e.hits()).collect();
    assert_eq!(hits, vec![30, 20]);
}

#[test]
fn test_top_n_ties_keep_scan_order() {
    let mut partitions = RawRegressionPartitions::empty(window_start());
    partitions.non_regressions.push(event("a", "A", 7));
    partitions.new_events.push(event("b", "B", 7));

    let report = build(&partitions, &GateConfig::default(), 5, &NoLinks);
    let ids: Vec<&str> = report.top_issues().iter().map(|e| e.event.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn test_non_positive_top_n_yields_empty_list() {
    for top_n in [0, -3] {
        let report = build(&three_event_partitions(), &GateConfig::default(), top_n, &NoLinks);
        assert!(report.top_issues().is_empty(), "top_n {}", top_n);
    }
}

#[test]
fn test_issue_lists_put_severe_first() {
    let mut partitions = RawRegressionPartitions::empty(window_start());
    partitions.new_events.push(event("n1", "Plain", 1));
    partitions.new_events.push(event("n2", "Severe", 1));
    partitions.critical_new.insert("n2".to_string());
    partitions.regressions.push(RegressionResult::new(event("r1", "Slow", 4), EventStats::default()));
    partitions.regressions.push(RegressionResult::new(event("r2", "Slower", 9), EventStats::default()));
    partitions.critical_regressions.insert("r2".to_string());

    let report = build(&partitions, &GateConfig::default(), 5, &NoLinks);

    let new_ids: Vec<&str> = report.new_issues().iter().map(|e| e.event.id.as_str()).collect();
    assert_eq!(new_ids, vec!["n2", "n1"]);
    let reg_ids: Vec<&str> = report.regressions().iter().map(|e| e.event.id.as_str()).collect();
    assert_eq!(reg_ids, vec!["r2", "r1"]);
    let all_ids: Vec<&str> = report.all_issues().iter().map(|e| e.event.id.as_str()).collect();
    assert_eq!(all_ids, vec!["n2", "n1", "r2", "r1"]);

    assert_eq!(report.severe_new().count(), 1);
    assert_eq!(report.plain_new().count(), 1);
    assert_eq!(report.severe_regressions().count(), 1);
    assert_eq!(report.plain_regressions().count(), 1);
    // Severe events alone destabilize
    assert!(report.unstable());
}

#[test]
fn test_links_span_baseline_through_now() {
    let links = TemplateLinkBuilder::new("https://app/{service_id}/{event_id}?from={from}&to={to}&apps={applications}");
    let report = build(&three_event_partitions(), &GateConfig::default(), 5, &links);

    // Default baseline is 14 days before the active window start
    assert_eq!(
        report.new_issues()[0].link,
        "https://app/S1/n1?from=2024-02-16T12:00:00Z&to=2024-03-02T12:00:00Z&apps=web"
    );
    let top_link = report
        .top_issues()
        .iter()
        .find(|e| e.event.id == "k1")
        .map(|e| e.link.as_str());
    assert_eq!(
        top_link,
        Some("https://app/S1/k1?from=2024-02-16T12:00:00Z&to=2024-03-02T12:00:00Z&apps=web")
    );
}

#[test]
fn test_thresholds_echoed_only_when_configured() {
    let report = build(&three_event_partitions(), &GateConfig::default(), 5, &NoLinks);
    assert_eq!(report.max_event_volume(), 0);
    assert_eq!(report.max_unique_events(), 0);
    assert_eq!(report.unique_events_count(), 0);

    let gates = GateConfig::builder().max_unique(10).build().unwrap();
    let report = build(&three_event_partitions(), &gates, 5, &NoLinks);
    assert_eq!(report.max_unique_events(), 10);
    assert_eq!(report.unique_events_count(), 3);
}

#[test]
fn test_report_string_sections() {
    let gates = GateConfig::builder().max_volume(40).build().unwrap();
    let report = build(&three_event_partitions(), &gates, 5, &NoLinks);
    let text = report.to_report_string();

    assert!(text.contains("Service: S1  View: All Events"));
    assert!(text.contains("Total Error Volume Gate: Total error volume 38 < 40"));
    assert!(text.contains("New Error Gate: not configured"));
    assert!(text.contains("🆕 New issues (1):"));
    assert!(text.contains("📈 Increasing errors (1):"));
    assert!(text.contains("baseline 5 hits"));
    assert!(!text.contains("Filtered out"));
}

#[test]
fn test_report_labels_serialize() {
    let report = build(&three_event_partitions(), &GateConfig::default(), 1, &NoLinks);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["top_issues"][0]["event"]["id"], "r1");
    assert_eq!(json["unstable"], false);
    assert_eq!(report.top_issues()[0].label, ClassificationLabel::Regression);
}
