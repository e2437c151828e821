// Regression partitions as delivered by the analytics service
//
// Rate regression detection (baseline vs. active window) runs service-side.
// What arrives here is the already-partitioned result: non-regressed, new
// and regressed events plus id subsets flagging critical, volume-exceeded
// and resurfaced entries.

use crate::event::{EventRecord, EventStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Baseline-vs-active comparison for one regressed event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegressionResult {
    pub event: EventRecord,
    /// Hit/invocation counters in the baseline window
    #[serde(default)]
    pub baseline: EventStats,
}

impl RegressionResult {
    pub fn new(event: EventRecord, baseline: EventStats) -> Self {
        Self { event, baseline }
    }
}

/// Raw regression result, split by the service
///
/// The id sets reference events of their parent partition:
/// `critical_new`, `exceeded_new` and `resurfaced` point into `new_events`,
/// `critical_regressions` into `regressions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRegressionPartitions {
    /// Start of the active window; deep links reach back a baseline from here
    pub active_window_start: DateTime<Utc>,

    #[serde(default)]
    pub non_regressions: Vec<EventRecord>,

    #[serde(default)]
    pub new_events: Vec<EventRecord>,

    /// New events whose type the service designates critical
    #[serde(default)]
    pub critical_new: BTreeSet<String>,

    /// New events whose own hit count crossed the service's per-event threshold
    #[serde(default)]
    pub exceeded_new: BTreeSet<String>,

    /// New events previously seen and resolved
    #[serde(default)]
    pub resurfaced: BTreeSet<String>,

    #[serde(default)]
    pub regressions: Vec<RegressionResult>,

    #[serde(default)]
    pub critical_regressions: BTreeSet<String>,
}

impl RawRegressionPartitions {
    pub fn empty(active_window_start: DateTime<Utc>) -> Self {
        Self {
            active_window_start,
            non_regressions: Vec::new(),
            new_events: Vec::new(),
            critical_new: BTreeSet::new(),
            exceeded_new: BTreeSet::new(),
            resurfaced: BTreeSet::new(),
            regressions: Vec::new(),
            critical_regressions: BTreeSet::new(),
        }
    }

    /// Number of raw records across all partitions
    pub fn event_count(&self) -> usize {
        self.non_regressions.len() + self.new_events.len() + self.regressions.len()
    }
}
