// Report assembly: ordered issue lists, top-N, deep links

use crate::gate::{Aggregates, GateConfig, GateResults};
use crate::input::RegressionInput;
use crate::regression::{Classification, ClassificationLabel, LabeledEvent};
use crate::report::model::{QualityReport, ReportEvent};
use crate::source::{LinkBuilder, LinkRequest};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

/// Builds a `QualityReport` from classified events and gate outcomes
///
/// Links are requested once per event id and reused across lists.
pub struct ReportAssembler<'a> {
    links: &'a dyn LinkBuilder,
    active_window_start: DateTime<Utc>,
    now: DateTime<Utc>,
}

impl<'a> ReportAssembler<'a> {
    pub fn new(
        links: &'a dyn LinkBuilder,
        active_window_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            links,
            active_window_start,
            now,
        }
    }

    /// Assemble the report
    ///
    /// `top_n <= 0` yields an empty top list.
    pub fn assemble(
        &self,
        classification: &Classification,
        gate_results: GateResults,
        aggregates: &Aggregates,
        gates: &GateConfig,
        top_n: i64,
        input: RegressionInput,
    ) -> QualityReport {
        let events = classification.events();
        let from =
            self.active_window_start - Duration::minutes(i64::from(input.baseline_timespan));
        let mut cache: HashMap<String, String> = HashMap::new();

        let mut link_for = |event: &LabeledEvent| -> ReportEvent {
            let link = cache
                .entry(event.event.id.clone())
                .or_insert_with(|| {
                    self.links.build_deep_link(&LinkRequest {
                        service_id: &input.service_id,
                        event_id: &event.event.id,
                        from,
                        to: self.now,
                        applications: &input.applications,
                        deployments: &input.deployments,
                        servers: &input.servers,
                    })
                })
                .clone();
            ReportEvent {
                event: event.event.clone(),
                label: event.label,
                link,
                baseline: event.baseline,
                resurfaced: event.resurfaced,
            }
        };

        let new_issues: Vec<ReportEvent> = by_labels(
            events,
            &[ClassificationLabel::SevereNew, ClassificationLabel::NewIssue],
        )
        .map(&mut link_for)
        .collect();

        let regressions: Vec<ReportEvent> = by_labels(
            events,
            &[
                ClassificationLabel::SevereRegression,
                ClassificationLabel::Regression,
            ],
        )
        .map(&mut link_for)
        .collect();

        let top_issues: Vec<ReportEvent> = top_by_volume(events, top_n)
            .into_iter()
            .map(&mut link_for)
            .collect();

        let all_issues: Vec<ReportEvent> =
            new_issues.iter().chain(&regressions).cloned().collect();

        let unstable = gate_results.unstable();

        QualityReport {
            new_issues,
            regressions,
            all_issues,
            top_issues,
            gates: gate_results,
            event_volume: aggregates.total_volume,
            max_event_volume: gates.max_volume().unwrap_or(0),
            unique_events_count: aggregates.unique_count.unwrap_or(0),
            max_unique_events: gates.max_unique().unwrap_or(0),
            filtered_out: classification.filtered_out(),
            unstable,
            generated_at: self.now,
            input,
        }
    }
}

/// Events carrying each label in turn, scan order within a label
fn by_labels<'e>(
    events: &'e [LabeledEvent],
    labels: &'e [ClassificationLabel],
) -> impl Iterator<Item = &'e LabeledEvent> {
    labels
        .iter()
        .flat_map(move |&label| events.iter().filter(move |e| e.label == label))
}

/// Highest hit counts first; ties keep scan order
fn top_by_volume(events: &[LabeledEvent], top_n: i64) -> Vec<&LabeledEvent> {
    let limit = usize::try_from(top_n).unwrap_or(0);
    if limit == 0 {
        return Vec::new();
    }

    let mut sorted: Vec<&LabeledEvent> = events.iter().collect();
    sorted.sort_by(|a, b| b.event.hits().cmp(&a.event.hits()));
    sorted.truncate(limit);
    sorted
}
