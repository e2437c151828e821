//! Run configuration for the quality-gate binary
//!
//! # Example quality-gate.toml
//!
//! ```toml
//! [service]
//! service_id = "S12345"
//! view_id = "All Events"
//! applications = ["web", "worker"]
//! partitions_file = "regression.json"
//!
//! [report]
//! top_events = 5
//! regex_filter = "com\\.example"
//! mark_unstable = true
//! link_template = "https://app.example.com/{service_id}/event/{event_id}?from={from}&to={to}"
//! server_wait = 60
//!
//! [[gate]]
//! type = "new_errors"
//!
//! [[gate]]
//! type = "volume"
//! max_hits = 1000
//! ```
//!
//! Command-line flags override the file: scalar flags replace the file
//! value, and a gate enabled on the command line replaces a file gate of
//! the same kind.

use crate::cli::Cli;
use crate::gate::{GateConfig, GateConfigBuilder, GateSpec, RegressionGateSpec};
use crate::input::{ordered_set, parse_list, RegressionInput};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Default number of top events listed in the report
pub const DEFAULT_TOP_EVENTS: i64 = 5;

/// `[service]`: who to ask and what to include
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    pub service_id: String,
    pub view_id: String,
    pub applications: Vec<String>,
    pub deployments: Vec<String>,
    pub servers: Vec<String>,
    /// Regression partitions exported from the analytics service
    pub partitions_file: Option<PathBuf>,
}

/// `[report]`: presentation and build outcome options
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReportSection {
    pub top_events: i64,
    pub regex_filter: Option<String>,
    pub mark_unstable: bool,
    pub link_template: Option<String>,
    /// Seconds to wait before fetching
    pub server_wait: u64,
    /// Print build-log lines to stderr
    pub verbose: bool,
}

impl Default for ReportSection {
    fn default() -> Self {
        Self {
            top_events: DEFAULT_TOP_EVENTS,
            regex_filter: None,
            mark_unstable: false,
            link_template: None,
            server_wait: 0,
            verbose: false,
        }
    }
}

/// Root of quality-gate.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub service: ServiceSection,
    #[serde(default)]
    pub report: ReportSection,
    /// Gate specs in file order, validated by [`RunConfig::gate_config`]
    #[serde(default)]
    pub gate: Vec<GateSpec>,
}

impl RunConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid run configuration in {}", path.display()))
    }

    /// Parse and validate the gate table up front
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: RunConfig =
            toml::from_str(content).context("Failed to parse run configuration TOML")?;
        config.gate_config()?;
        Ok(config)
    }

    /// Load from `--config` when given, then apply the remaining flags
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mut config = match &cli.config {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        config.gate_config()?;
        Ok(config)
    }

    /// Override file values with command-line flags
    pub fn apply_cli(&mut self, cli: &Cli) {
        if let Some(service_id) = &cli.service_id {
            self.service.service_id = service_id.clone();
        }
        if let Some(view_id) = &cli.view_id {
            self.service.view_id = view_id.clone();
        }
        if let Some(list) = &cli.applications {
            self.service.applications = parse_list(list, "applications");
        }
        if let Some(list) = &cli.deployments {
            self.service.deployments = parse_list(list, "deployments");
        }
        if let Some(list) = &cli.servers {
            self.service.servers = parse_list(list, "servers");
        }
        if let Some(path) = &cli.input {
            self.service.partitions_file = Some(path.clone());
        }

        if let Some(top) = cli.top {
            self.report.top_events = top;
        }
        if let Some(expr) = &cli.regex_filter {
            self.report.regex_filter = Some(expr.clone());
        }
        if let Some(template) = &cli.link_template {
            self.report.link_template = Some(template.clone());
        }
        if let Some(wait) = cli.server_wait {
            self.report.server_wait = wait;
        }
        self.report.mark_unstable |= cli.mark_unstable;
        self.report.verbose |= cli.verbose;

        for spec in cli_gate_specs(cli) {
            self.set_gate(spec);
        }
    }

    /// Replace any gate of the same kind, else append
    pub fn set_gate(&mut self, spec: GateSpec) {
        let kind = spec.kind();
        match self.gate.iter_mut().find(|g| g.kind() == kind) {
            Some(existing) => *existing = spec,
            None => self.gate.push(spec),
        }
    }

    /// Validated gates
    pub fn gate_config(&self) -> Result<GateConfig> {
        let config = GateConfigBuilder::from_specs(self.gate.clone())
            .build()
            .context("Invalid gate configuration")?;
        Ok(config)
    }

    /// Request parameters before gates are applied
    pub fn regression_input(&self) -> RegressionInput {
        let mut input = RegressionInput::new(
            self.service.service_id.trim(),
            self.service.view_id.trim(),
        );
        input.applications = ordered_set(&self.service.applications);
        input.deployments = ordered_set(&self.service.deployments);
        input.servers = ordered_set(&self.service.servers);
        input
    }

    /// Regex filter, with an empty or unresolved value meaning none
    pub fn regex_filter(&self) -> Option<&str> {
        self.report
            .regex_filter
            .as_deref()
            .map(str::trim)
            .filter(|expr| !expr.is_empty() && !crate::input::is_unresolved(expr))
    }
}

fn cli_gate_specs(cli: &Cli) -> Vec<GateSpec> {
    let mut specs = Vec::new();

    if cli.new_errors {
        specs.push(GateSpec::NewErrors);
    }
    if cli.resurfaced_errors {
        specs.push(GateSpec::ResurfacedErrors);
    }
    if let Some(max_hits) = cli.max_volume {
        specs.push(GateSpec::Volume { max_hits });
    }
    if let Some(max_errors) = cli.max_unique {
        specs.push(GateSpec::Unique { max_errors });
    }
    if let Some(list) = &cli.critical_exception_types {
        specs.push(GateSpec::CriticalExceptions {
            types: parse_list(list, "critical_exception_types"),
        });
    }
    if cli.regression {
        specs.push(GateSpec::Regression(RegressionGateSpec {
            active_timespan: cli.active_timespan.clone(),
            baseline_timespan: cli.baseline_timespan.clone(),
            min_volume_threshold: cli.min_volume_threshold,
            min_error_rate_threshold: cli.min_error_rate_threshold,
            regression_delta: cli.regression_delta,
            critical_regression_delta: cli.critical_regression_delta,
            apply_seasonality: cli.apply_seasonality,
        }));
    }

    specs
}
