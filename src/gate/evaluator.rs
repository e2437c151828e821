//! Gate evaluation over classified events
//!
//! ```text
//! classified events ─┬─> Aggregates (volume, unique count)
//!                    └─> GateEvaluator ──> GateResults ──> unstable?
//! ```
//!
//! Threshold gates are half-open: `value < max` passes, `value >= max`
//! fails. On top of the per-gate verdicts, severe events (severe new,
//! severe regression, critical exception type) always make the build
//! unstable, even when no gate covering them is configured.

use crate::gate::config::{Gate, GateConfig, GateKind};
use crate::regression::{Classification, LabeledEvent};
use serde::Serialize;

/// Volume and uniqueness totals over surviving events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Aggregates {
    pub total_volume: u64,
    /// Only computed when a uniqueness gate is configured
    pub unique_count: Option<u64>,
}

impl Aggregates {
    pub fn from_classification(classification: &Classification, gates: &GateConfig) -> Self {
        let unique_count = if gates.is_enabled(GateKind::Unique) {
            Some(classification.unique_count() as u64)
        } else {
            None
        };

        Self {
            total_volume: classification.total_volume(),
            unique_count,
        }
    }
}

/// Outcome of one gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateOutcome {
    pub kind: GateKind,
    pub enabled: bool,
    pub passed: bool,
    /// Events or hits the gate counted (0 when disabled)
    pub count: u64,
    /// Configured maximum for threshold gates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u64>,
    pub message: String,
}

impl GateOutcome {
    fn disabled(kind: GateKind) -> Self {
        Self {
            kind,
            enabled: false,
            passed: true,
            count: 0,
            threshold: None,
            message: "not configured".to_string(),
        }
    }

    fn zero_tolerance(kind: GateKind, count: u64, what: &str) -> Self {
        let passed = count == 0;
        let message = if passed {
            format!("No {}", what)
        } else {
            format!("{} {}", count, what)
        };
        Self {
            kind,
            enabled: true,
            passed,
            count,
            threshold: None,
            message,
        }
    }

    fn below_max(kind: GateKind, value: u64, max: u64, what: &str) -> Self {
        let passed = value < max;
        let message = if passed {
            format!("{} {} < {}", what, value, max)
        } else {
            format!("{} {} reached maximum {}", what, value, max)
        };
        Self {
            kind,
            enabled: true,
            passed,
            count: value,
            threshold: Some(max),
            message,
        }
    }
}

/// Per-gate outcomes plus the overall stability decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GateResults {
    outcomes: Vec<GateOutcome>,
    severity_override: bool,
    unstable: bool,
}

impl GateResults {
    /// One outcome per gate kind, in kind order
    pub fn outcomes(&self) -> &[GateOutcome] {
        &self.outcomes
    }

    pub fn get(&self, kind: GateKind) -> Option<&GateOutcome> {
        self.outcomes.iter().find(|o| o.kind == kind)
    }

    /// Enabled gates that failed
    pub fn failed(&self) -> impl Iterator<Item = &GateOutcome> {
        self.outcomes.iter().filter(|o| o.enabled && !o.passed)
    }

    /// Severe events present, independent of gate configuration
    pub fn severity_override(&self) -> bool {
        self.severity_override
    }

    pub fn unstable(&self) -> bool {
        self.unstable
    }
}

/// Gate evaluation engine
#[derive(Debug, Clone, Copy, Default)]
pub struct GateEvaluator;

impl GateEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Evaluate every gate against the classified events
    pub fn evaluate(
        &self,
        events: &[LabeledEvent],
        aggregates: &Aggregates,
        gates: &GateConfig,
    ) -> GateResults {
        let outcomes: Vec<GateOutcome> = GateKind::ALL
            .iter()
            .map(|&kind| match gates.get(kind) {
                Some(gate) => self.evaluate_gate(gate, events, aggregates),
                None => GateOutcome::disabled(kind),
            })
            .collect();

        let severity_override = events
            .iter()
            .any(|e| e.label.is_severe() || e.critical_type);

        let unstable = severity_override || outcomes.iter().any(|o| o.enabled && !o.passed);

        tracing::debug!(
            "Gates evaluated: {} failed, severity override {}, unstable {}",
            outcomes.iter().filter(|o| o.enabled && !o.passed).count(),
            severity_override,
            unstable
        );

        GateResults {
            outcomes,
            severity_override,
            unstable,
        }
    }

    fn evaluate_gate(
        &self,
        gate: &Gate,
        events: &[LabeledEvent],
        aggregates: &Aggregates,
    ) -> GateOutcome {
        match gate {
            Gate::NewErrors => self.evaluate_new_errors(events),
            Gate::ResurfacedErrors => self.evaluate_resurfaced(events),
            Gate::Volume { max_hits } => GateOutcome::below_max(
                GateKind::Volume,
                aggregates.total_volume,
                *max_hits,
                "Total error volume",
            ),
            Gate::Unique { max_errors } => GateOutcome::below_max(
                GateKind::Unique,
                aggregates.unique_count.unwrap_or(0),
                *max_errors,
                "Unique error count",
            ),
            Gate::CriticalExceptions { .. } => self.evaluate_critical_exceptions(events),
            Gate::Regression(_) => self.evaluate_regressions(events),
        }
    }

    fn evaluate_new_errors(&self, events: &[LabeledEvent]) -> GateOutcome {
        let count = events.iter().filter(|e| e.label.is_new()).count();
        GateOutcome::zero_tolerance(GateKind::NewErrors, count as u64, "new errors")
    }

    fn evaluate_resurfaced(&self, events: &[LabeledEvent]) -> GateOutcome {
        let count = events.iter().filter(|e| e.resurfaced).count();
        GateOutcome::zero_tolerance(
            GateKind::ResurfacedErrors,
            count as u64,
            "resurfaced errors",
        )
    }

    /// Critical-typed events not already counted as severe
    fn evaluate_critical_exceptions(&self, events: &[LabeledEvent]) -> GateOutcome {
        let count = events
            .iter()
            .filter(|e| e.critical_type && !e.label.is_severe())
            .count();
        GateOutcome::zero_tolerance(
            GateKind::CriticalExceptions,
            count as u64,
            "critical exception events",
        )
    }

    fn evaluate_regressions(&self, events: &[LabeledEvent]) -> GateOutcome {
        let count = events.iter().filter(|e| e.label.is_regression()).count();
        GateOutcome::zero_tolerance(GateKind::Regression, count as u64, "increasing errors")
    }
}
