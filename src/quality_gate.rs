//! Quality gate orchestration
//!
//! One call to [`QualityGate::evaluate`] runs a full, self-contained
//! evaluation:
//!
//! ```text
//! RegressionInput + GateConfig
//!        │ validate, compile filter
//!        ▼
//! RegressionDataSource::fetch_regression
//!        │
//!        ▼
//! classify ──> Aggregates ──> GateEvaluator ──> ReportAssembler ──> QualityReport
//! ```
//!
//! Nothing is shared between evaluations; every per-run flag travels in the
//! `RegressionInput` value.

use crate::error::Result;
use crate::filter::EventFilter;
use crate::gate::{Aggregates, GateConfig, GateEvaluator};
use crate::input::RegressionInput;
use crate::regression::classify;
use crate::report::{QualityReport, ReportAssembler};
use crate::source::{LinkBuilder, LogSink, NoLinks, RegressionDataSource};
use chrono::{DateTime, Utc};

/// Evaluates quality gates against one data source
pub struct QualityGate<'a> {
    source: &'a dyn RegressionDataSource,
    links: &'a dyn LinkBuilder,
    sink: Option<&'a dyn LogSink>,
}

impl<'a> QualityGate<'a> {
    /// Gate without deep links or build-log output
    pub fn new(source: &'a dyn RegressionDataSource) -> Self {
        Self {
            source,
            links: &NoLinks,
            sink: None,
        }
    }

    pub fn with_links(mut self, links: &'a dyn LinkBuilder) -> Self {
        self.links = links;
        self
    }

    pub fn with_sink(mut self, sink: &'a dyn LogSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run one evaluation
    ///
    /// Validation and filter compilation happen before the fetch, so a
    /// malformed configuration never reaches the data source.
    pub fn evaluate(
        &self,
        input: RegressionInput,
        gates: &GateConfig,
        top_n: i64,
        regex_filter: Option<&str>,
    ) -> Result<QualityReport> {
        self.evaluate_at(input, gates, top_n, regex_filter, Utc::now())
    }

    /// Same as [`evaluate`](Self::evaluate) with an explicit "now" for links
    pub fn evaluate_at(
        &self,
        mut input: RegressionInput,
        gates: &GateConfig,
        top_n: i64,
        regex_filter: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<QualityReport> {
        input.regex_filter = regex_filter
            .filter(|expr| !expr.is_empty())
            .map(str::to_string);
        gates.apply_to(&mut input);
        input.validate()?;

        let filter = EventFilter::from_expr(input.regex_filter.as_deref())?;

        self.echo_input(&input, top_n);

        let partitions = self.source.fetch_regression(&input)?;
        tracing::debug!(
            "Fetched {} events for service {} view {}",
            partitions.event_count(),
            input.service_id,
            input.view_id
        );

        let classification = classify(
            &partitions,
            &input.critical_exception_types,
            &filter,
            self.sink,
        );
        let aggregates = Aggregates::from_classification(&classification, gates);
        let results = GateEvaluator::new().evaluate(classification.events(), &aggregates, gates);

        let report = ReportAssembler::new(self.links, partitions.active_window_start, now)
            .assemble(&classification, results, &aggregates, gates, top_n, input);

        tracing::info!(
            "Quality gate evaluated: {} new, {} regressions, unstable {}",
            report.new_issues().len(),
            report.regressions().len(),
            report.unstable()
        );

        Ok(report)
    }

    fn echo_input(&self, input: &RegressionInput, top_n: i64) {
        tracing::debug!("Evaluating {:?} (top {})", input, top_n);

        let Some(sink) = self.sink else {
            return;
        };
        sink.line(&format!(
            "Service: {}, view: {}",
            input.service_id, input.view_id
        ));
        sink.line(&format!(
            "Active window: {} min, baseline window: {} min, regressions: {}",
            input.active_timespan, input.baseline_timespan, input.run_regressions
        ));
        if !input.applications.is_empty() {
            sink.line(&format!("Applications: {}", input.applications.join(", ")));
        }
        if !input.deployments.is_empty() {
            sink.line(&format!("Deployments: {}", input.deployments.join(", ")));
        }
        if !input.servers.is_empty() {
            sink.line(&format!("Servers: {}", input.servers.join(", ")));
        }
        if !input.critical_exception_types.is_empty() {
            sink.line(&format!(
                "Critical exception types: {}",
                input.critical_exception_types.join(", ")
            ));
        }
        if let Some(expr) = &input.regex_filter {
            sink.line(&format!("Regex filter: {}", expr));
        }
        sink.line(&format!("Top events: {}", top_n));
    }
}
