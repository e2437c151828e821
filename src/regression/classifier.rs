// Labeling, deduplication and filtering of regression partitions

use crate::event::{EventRecord, EventStats};
use crate::filter::EventFilter;
use crate::regression::partitions::RawRegressionPartitions;
use crate::source::LogSink;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

/// Classification of one event in a report
///
/// Variants are declared in precedence order: when one event id shows up
/// in several partitions the earliest variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ClassificationLabel {
    SevereRegression,
    Regression,
    SevereNew,
    NewIssue,
    NonRegressed,
}

impl ClassificationLabel {
    pub fn is_new(self) -> bool {
        matches!(self, Self::SevereNew | Self::NewIssue)
    }

    pub fn is_regression(self) -> bool {
        matches!(self, Self::SevereRegression | Self::Regression)
    }

    /// Severe labels force instability regardless of configured gates
    pub fn is_severe(self) -> bool {
        matches!(self, Self::SevereNew | Self::SevereRegression)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SevereRegression => "Severe Regression",
            Self::Regression => "Regression",
            Self::SevereNew => "Severe New Issue",
            Self::NewIssue => "New Issue",
            Self::NonRegressed => "Non-Regressed",
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A surviving event with its label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledEvent {
    pub event: EventRecord,
    pub label: ClassificationLabel,
    /// Baseline counters, present for regressions only
    pub baseline: Option<EventStats>,
    /// New event previously seen and resolved
    pub resurfaced: bool,
    /// Exception name is in the configured critical type list
    pub critical_type: bool,
}

/// Classifier output: surviving events in scan order
///
/// Scan order is non-regressed, new, regressed, each in partition order,
/// with every event id kept once at its first position.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    events: Vec<LabeledEvent>,
    filtered_out: usize,
}

impl Classification {
    pub fn events(&self) -> &[LabeledEvent] {
        &self.events
    }

    pub fn into_events(self) -> Vec<LabeledEvent> {
        self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events removed by the regex filter
    pub fn filtered_out(&self) -> usize {
        self.filtered_out
    }

    pub fn with_label(&self, label: ClassificationLabel) -> impl Iterator<Item = &LabeledEvent> {
        self.events.iter().filter(move |e| e.label == label)
    }

    pub fn count(&self, label: ClassificationLabel) -> usize {
        self.with_label(label).count()
    }

    /// Total hits of all surviving events
    pub fn total_volume(&self) -> u64 {
        self.events
            .iter()
            .fold(0u64, |acc, e| acc.saturating_add(e.event.hits()))
    }

    /// Distinct logical errors among surviving events
    ///
    /// Computed on demand; callers without a uniqueness gate skip it.
    pub fn unique_count(&self) -> usize {
        self.events
            .iter()
            .map(|e| e.event.identity())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn has_severe(&self) -> bool {
        self.events.iter().any(|e| e.label.is_severe())
    }

    pub fn has_critical_type(&self) -> bool {
        self.events.iter().any(|e| e.critical_type)
    }
}

struct Candidate<'a> {
    event: &'a EventRecord,
    label: ClassificationLabel,
    baseline: Option<EventStats>,
}

/// Label, deduplicate and filter the partitioned regression result
///
/// `critical_exception_types` marks new events as `SevereNew` on an exact
/// exception name match, on top of the service's own critical and
/// volume-exceeded sets. Events rejected by `filter` are reported to
/// `sink` and excluded from the result entirely.
pub fn classify(
    partitions: &RawRegressionPartitions,
    critical_exception_types: &[String],
    filter: &EventFilter,
    sink: Option<&dyn LogSink>,
) -> Classification {
    warn_orphan_ids(partitions);

    let mut candidates: Vec<Candidate<'_>> = Vec::with_capacity(partitions.event_count());

    for event in &partitions.non_regressions {
        candidates.push(Candidate {
            event,
            label: ClassificationLabel::NonRegressed,
            baseline: None,
        });
    }

    for event in &partitions.new_events {
        let severe = partitions.critical_new.contains(&event.id)
            || partitions.exceeded_new.contains(&event.id)
            || event.has_exception_type(critical_exception_types);
        candidates.push(Candidate {
            event,
            label: if severe {
                ClassificationLabel::SevereNew
            } else {
                ClassificationLabel::NewIssue
            },
            baseline: None,
        });
    }

    for regression in &partitions.regressions {
        let label = if partitions.critical_regressions.contains(&regression.event.id) {
            ClassificationLabel::SevereRegression
        } else {
            ClassificationLabel::Regression
        };
        candidates.push(Candidate {
            event: &regression.event,
            label,
            baseline: Some(regression.baseline),
        });
    }

    // Best candidate per id: lowest label wins, first one on ties
    let mut best: HashMap<&str, usize> = HashMap::with_capacity(candidates.len());
    for (idx, candidate) in candidates.iter().enumerate() {
        best.entry(candidate.event.id.as_str())
            .and_modify(|current| {
                if candidate.label < candidates[*current].label {
                    *current = idx;
                }
            })
            .or_insert(idx);
    }

    let mut emitted: HashSet<&str> = HashSet::with_capacity(best.len());
    let mut result = Classification::default();

    for candidate in &candidates {
        let id = candidate.event.id.as_str();
        if !emitted.insert(id) {
            continue;
        }
        let Some(&winner_idx) = best.get(id) else {
            continue;
        };
        let winner = &candidates[winner_idx];

        if !filter.allows(winner.event) {
            result.filtered_out += 1;
            tracing::debug!("Event {} rejected by regex filter", winner.event.id);
            if let Some(sink) = sink {
                sink.line(&format!(
                    "{} did not match regexFilter and was skipped",
                    winner.event
                ));
            }
            continue;
        }

        result.events.push(LabeledEvent {
            event: winner.event.clone(),
            label: winner.label,
            baseline: winner.baseline,
            resurfaced: winner.label.is_new() && partitions.resurfaced.contains(id),
            critical_type: winner.event.has_exception_type(critical_exception_types),
        });
    }

    tracing::debug!(
        "Classified {} events ({} filtered out)",
        result.events.len(),
        result.filtered_out
    );

    result
}

fn warn_orphan_ids(partitions: &RawRegressionPartitions) {
    let new_ids: HashSet<&str> = partitions.new_events.iter().map(|e| e.id.as_str()).collect();
    let regression_ids: HashSet<&str> = partitions
        .regressions
        .iter()
        .map(|r| r.event.id.as_str())
        .collect();

    let subsets: [(&str, &BTreeSet<String>, &HashSet<&str>); 4] = [
        ("critical_new", &partitions.critical_new, &new_ids),
        ("exceeded_new", &partitions.exceeded_new, &new_ids),
        ("resurfaced", &partitions.resurfaced, &new_ids),
        (
            "critical_regressions",
            &partitions.critical_regressions,
            &regression_ids,
        ),
    ];

    for (name, ids, parent) in subsets {
        for id in ids.iter().filter(|id| !parent.contains(id.as_str())) {
            tracing::warn!("{} references unknown event {}; ignored", name, id);
        }
    }
}
