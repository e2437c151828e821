// Quality report: the immutable result of one evaluation

use crate::event::{EventRecord, EventStats};
use crate::gate::{GateOutcome, GateResults};
use crate::input::RegressionInput;
use crate::regression::ClassificationLabel;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// An event placed in a report list, with its deep link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEvent {
    pub event: EventRecord,
    pub label: ClassificationLabel,
    /// Empty when the link builder could not render one
    pub link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<EventStats>,
    pub resurfaced: bool,
}

impl ReportEvent {
    pub fn hits(&self) -> u64 {
        self.event.hits()
    }

    pub fn calls(&self) -> u64 {
        self.event.invocations()
    }
}

/// Result of one quality gate evaluation
///
/// Owned by the caller; nothing in it changes after assembly.
#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub(crate) input: RegressionInput,
    pub(crate) new_issues: Vec<ReportEvent>,
    pub(crate) regressions: Vec<ReportEvent>,
    pub(crate) all_issues: Vec<ReportEvent>,
    pub(crate) top_issues: Vec<ReportEvent>,
    pub(crate) gates: GateResults,
    pub(crate) event_volume: u64,
    pub(crate) max_event_volume: u64,
    pub(crate) unique_events_count: u64,
    pub(crate) max_unique_events: u64,
    pub(crate) filtered_out: usize,
    pub(crate) unstable: bool,
    pub(crate) generated_at: DateTime<Utc>,
}

impl QualityReport {
    /// The request parameters this report was computed for
    pub fn input(&self) -> &RegressionInput {
        &self.input
    }

    /// Severe new issues first, then plain new issues
    pub fn new_issues(&self) -> &[ReportEvent] {
        &self.new_issues
    }

    /// Severe regressions first, then plain regressions
    pub fn regressions(&self) -> &[ReportEvent] {
        &self.regressions
    }

    /// `new_issues` followed by `regressions`
    pub fn all_issues(&self) -> &[ReportEvent] {
        &self.all_issues
    }

    /// Highest-volume surviving events, any label
    pub fn top_issues(&self) -> &[ReportEvent] {
        &self.top_issues
    }

    pub fn severe_new(&self) -> impl Iterator<Item = &ReportEvent> {
        with_label(&self.new_issues, ClassificationLabel::SevereNew)
    }

    pub fn plain_new(&self) -> impl Iterator<Item = &ReportEvent> {
        with_label(&self.new_issues, ClassificationLabel::NewIssue)
    }

    pub fn severe_regressions(&self) -> impl Iterator<Item = &ReportEvent> {
        with_label(&self.regressions, ClassificationLabel::SevereRegression)
    }

    pub fn plain_regressions(&self) -> impl Iterator<Item = &ReportEvent> {
        with_label(&self.regressions, ClassificationLabel::Regression)
    }

    pub fn gates(&self) -> &GateResults {
        &self.gates
    }

    /// Total hits of surviving events
    pub fn event_volume(&self) -> u64 {
        self.event_volume
    }

    /// Configured volume maximum, 0 when the gate is off
    pub fn max_event_volume(&self) -> u64 {
        self.max_event_volume
    }

    /// Distinct logical errors, 0 when the uniqueness gate is off
    pub fn unique_events_count(&self) -> u64 {
        self.unique_events_count
    }

    pub fn max_unique_events(&self) -> u64 {
        self.max_unique_events
    }

    /// Events dropped by the regex filter
    pub fn filtered_out(&self) -> usize {
        self.filtered_out
    }

    pub fn unstable(&self) -> bool {
        self.unstable
    }

    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Generate human-readable report
    pub fn to_report_string(&self) -> String {
        let mut report = String::new();

        if self.unstable {
            report.push_str("❌ UNSTABLE: quality gates failed\n\n");
        } else {
            report.push_str("✅ STABLE: all quality gates passed\n\n");
        }

        report.push_str(&format!(
            "Service: {}  View: {}\n",
            self.input.service_id, self.input.view_id
        ));
        report.push_str(&format!(
            "Event volume: {}  Unique errors: {}\n",
            self.event_volume, self.unique_events_count
        ));

        report.push_str("\n🚦 Gates:\n");
        for outcome in self.gates.outcomes() {
            report.push_str(&format!(
                "  {} {}: {}\n",
                gate_marker(outcome),
                outcome.kind,
                outcome.message
            ));
        }

        if self.gates.severity_override() {
            report.push_str("  ❗ Severe events present: build marked unstable regardless of gates\n");
        }

        push_events(&mut report, "🆕 New issues", &self.new_issues);
        push_events(&mut report, "📈 Increasing errors", &self.regressions);
        push_events(&mut report, "🔝 Top events", &self.top_issues);

        if self.filtered_out > 0 {
            report.push_str(&format!(
                "\n🔇 Filtered out by regex: {} events\n",
                self.filtered_out
            ));
        }

        report
    }
}

fn with_label(
    list: &[ReportEvent],
    label: ClassificationLabel,
) -> impl Iterator<Item = &ReportEvent> {
    list.iter().filter(move |e| e.label == label)
}

fn gate_marker(outcome: &GateOutcome) -> &'static str {
    match (outcome.enabled, outcome.passed) {
        (false, _) => "⏭️ ",
        (true, true) => "✅",
        (true, false) => "❌",
    }
}

fn push_events(report: &mut String, title: &str, events: &[ReportEvent]) {
    if events.is_empty() {
        return;
    }

    report.push_str(&format!("\n{} ({}):\n", title, events.len()));
    for e in events {
        report.push_str(&format!("  [{}] {}", e.label, e.event));
        if let Some(baseline) = e.baseline {
            report.push_str(&format!(" baseline {} hits", baseline.hits));
        }
        if e.resurfaced {
            report.push_str(" (resurfaced)");
        }
        if !e.link.is_empty() {
            report.push_str(&format!(" {}", e.link));
        }
        report.push('\n');
    }
}
