//! Gate configuration: raw TOML specs, validated gates, builder

use crate::error::{GateError, Result};
use crate::input::{ordered_set, parse_window_minutes, RegressionInput};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Identifies one of the six gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateKind {
    NewErrors,
    ResurfacedErrors,
    Volume,
    Unique,
    CriticalExceptions,
    Regression,
}

impl GateKind {
    pub const ALL: [GateKind; 6] = [
        GateKind::NewErrors,
        GateKind::ResurfacedErrors,
        GateKind::Volume,
        GateKind::Unique,
        GateKind::CriticalExceptions,
        GateKind::Regression,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GateKind::NewErrors => "New Error Gate",
            GateKind::ResurfacedErrors => "Resurfaced Error Gate",
            GateKind::Volume => "Total Error Volume Gate",
            GateKind::Unique => "Unique Error Volume Gate",
            GateKind::CriticalExceptions => "Critical Exception Type Gate",
            GateKind::Regression => "Increasing Errors Gate",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Regression gate settings as written in configuration
///
/// # Example TOML
///
/// ```toml
/// [[gate]]
/// type = "regression"
/// active_timespan = "1d"
/// baseline_timespan = "14d"
/// min_volume_threshold = 20
/// min_error_rate_threshold = 0.1
/// regression_delta = 0.5
/// critical_regression_delta = 1.0
/// apply_seasonality = true
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionGateSpec {
    pub active_timespan: String,
    pub baseline_timespan: String,
    #[serde(default)]
    pub min_volume_threshold: u64,
    #[serde(default)]
    pub min_error_rate_threshold: f64,
    #[serde(default)]
    pub regression_delta: f64,
    #[serde(default)]
    pub critical_regression_delta: f64,
    #[serde(default)]
    pub apply_seasonality: bool,
}

/// One gate as written in configuration, before validation
///
/// Non-positive thresholds and empty type lists mean "not configured".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GateSpec {
    NewErrors,
    ResurfacedErrors,
    Volume { max_hits: i64 },
    Unique { max_errors: i64 },
    CriticalExceptions { types: Vec<String> },
    Regression(RegressionGateSpec),
}

impl GateSpec {
    pub fn kind(&self) -> GateKind {
        match self {
            GateSpec::NewErrors => GateKind::NewErrors,
            GateSpec::ResurfacedErrors => GateKind::ResurfacedErrors,
            GateSpec::Volume { .. } => GateKind::Volume,
            GateSpec::Unique { .. } => GateKind::Unique,
            GateSpec::CriticalExceptions { .. } => GateKind::CriticalExceptions,
            GateSpec::Regression(_) => GateKind::Regression,
        }
    }
}

/// Validated regression gate settings
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegressionSettings {
    /// Active window in minutes (positive)
    pub active_timespan: u32,
    /// Baseline window in minutes (positive)
    pub baseline_timespan: u32,
    pub min_volume_threshold: u64,
    pub min_error_rate_threshold: f64,
    pub regression_delta: f64,
    pub critical_regression_delta: f64,
    pub apply_seasonality: bool,
}

impl RegressionSettings {
    fn from_spec(spec: &RegressionGateSpec) -> Result<Self> {
        let active_timespan =
            parse_window_minutes("regression.active_timespan", &spec.active_timespan)?;
        let baseline_timespan =
            parse_window_minutes("regression.baseline_timespan", &spec.baseline_timespan)?;

        if !(0.0..=1.0).contains(&spec.min_error_rate_threshold) {
            return Err(GateError::validation(
                "regression.min_error_rate_threshold",
                format!("must be in [0, 1], got {}", spec.min_error_rate_threshold),
            ));
        }

        for (field, delta) in [
            ("regression.regression_delta", spec.regression_delta),
            (
                "regression.critical_regression_delta",
                spec.critical_regression_delta,
            ),
        ] {
            if !delta.is_finite() || delta < 0.0 {
                return Err(GateError::validation(
                    field,
                    format!("must be a non-negative number, got {}", delta),
                ));
            }
        }

        Ok(Self {
            active_timespan,
            baseline_timespan,
            min_volume_threshold: spec.min_volume_threshold,
            min_error_rate_threshold: spec.min_error_rate_threshold,
            regression_delta: spec.regression_delta,
            critical_regression_delta: spec.critical_regression_delta,
            apply_seasonality: spec.apply_seasonality,
        })
    }
}

/// A configured, validated gate carrying only its own payload
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Gate {
    NewErrors,
    ResurfacedErrors,
    Volume { max_hits: u64 },
    Unique { max_errors: u64 },
    CriticalExceptions { types: Vec<String> },
    Regression(RegressionSettings),
}

impl Gate {
    pub fn kind(&self) -> GateKind {
        match self {
            Gate::NewErrors => GateKind::NewErrors,
            Gate::ResurfacedErrors => GateKind::ResurfacedErrors,
            Gate::Volume { .. } => GateKind::Volume,
            Gate::Unique { .. } => GateKind::Unique,
            Gate::CriticalExceptions { .. } => GateKind::CriticalExceptions,
            Gate::Regression(_) => GateKind::Regression,
        }
    }

    /// Validate a raw spec; `Ok(None)` when the spec leaves the gate unconfigured
    fn from_spec(spec: &GateSpec) -> Result<Option<Self>> {
        let gate = match spec {
            GateSpec::NewErrors => Gate::NewErrors,
            GateSpec::ResurfacedErrors => Gate::ResurfacedErrors,
            GateSpec::Volume { max_hits } => match u64::try_from(*max_hits) {
                Ok(max_hits) if max_hits > 0 => Gate::Volume { max_hits },
                _ => return Ok(None),
            },
            GateSpec::Unique { max_errors } => match u64::try_from(*max_errors) {
                Ok(max_errors) if max_errors > 0 => Gate::Unique { max_errors },
                _ => return Ok(None),
            },
            GateSpec::CriticalExceptions { types } => {
                let types = ordered_set(types);
                if types.is_empty() {
                    return Ok(None);
                }
                Gate::CriticalExceptions { types }
            }
            GateSpec::Regression(spec) => Gate::Regression(RegressionSettings::from_spec(spec)?),
        };
        Ok(Some(gate))
    }
}

/// Root of a gate configuration file
#[derive(Debug, Clone, Default, Deserialize)]
struct GateFile {
    #[serde(default)]
    gate: Vec<GateSpec>,
}

/// The set of configured gates for one evaluation
///
/// Immutable once built; at most one gate per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GateConfig {
    gates: Vec<Gate>,
}

impl GateConfig {
    pub fn builder() -> GateConfigBuilder {
        GateConfigBuilder::default()
    }

    /// Load gates from a TOML string with a `[[gate]]` array
    ///
    /// # Example TOML
    ///
    /// ```toml
    /// [[gate]]
    /// type = "new_errors"
    ///
    /// [[gate]]
    /// type = "volume"
    /// max_hits = 1000
    ///
    /// [[gate]]
    /// type = "critical_exceptions"
    /// types = ["NullPointerException", "OutOfMemoryError"]
    /// ```
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let file: GateFile = toml::from_str(content).context("Failed to parse gate TOML")?;
        let config = GateConfigBuilder::from_specs(file.gate)
            .build()
            .context("Invalid gate configuration")?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    pub fn get(&self, kind: GateKind) -> Option<&Gate> {
        self.gates.iter().find(|g| g.kind() == kind)
    }

    pub fn is_enabled(&self, kind: GateKind) -> bool {
        self.get(kind).is_some()
    }

    pub fn max_volume(&self) -> Option<u64> {
        match self.get(GateKind::Volume) {
            Some(Gate::Volume { max_hits }) => Some(*max_hits),
            _ => None,
        }
    }

    pub fn max_unique(&self) -> Option<u64> {
        match self.get(GateKind::Unique) {
            Some(Gate::Unique { max_errors }) => Some(*max_errors),
            _ => None,
        }
    }

    pub fn critical_types(&self) -> &[String] {
        match self.get(GateKind::CriticalExceptions) {
            Some(Gate::CriticalExceptions { types }) => types,
            _ => &[],
        }
    }

    pub fn regression(&self) -> Option<&RegressionSettings> {
        match self.get(GateKind::Regression) {
            Some(Gate::Regression(settings)) => Some(settings),
            _ => None,
        }
    }

    /// Copy gate-owned parameters into the request
    ///
    /// Sets `run_regressions` from the presence of a regression gate; the
    /// flag travels with this input only.
    pub fn apply_to(&self, input: &mut RegressionInput) {
        input.run_regressions = false;

        if let Some(settings) = self.regression() {
            input.run_regressions = true;
            input.active_timespan = settings.active_timespan;
            input.baseline_timespan = settings.baseline_timespan;
            input.min_volume_threshold = settings.min_volume_threshold;
            input.min_error_rate_threshold = settings.min_error_rate_threshold;
            input.regression_delta = settings.regression_delta;
            input.critical_regression_delta = settings.critical_regression_delta;
            input.apply_seasonality = settings.apply_seasonality;
        }

        let types = self.critical_types();
        if !types.is_empty() {
            input.critical_exception_types = types.to_vec();
        }
    }
}

/// Collects gate specs and validates them into a [`GateConfig`]
#[derive(Debug, Clone, Default)]
pub struct GateConfigBuilder {
    specs: Vec<GateSpec>,
}

impl GateConfigBuilder {
    pub fn from_specs(specs: Vec<GateSpec>) -> Self {
        Self { specs }
    }

    pub fn gate(mut self, spec: GateSpec) -> Self {
        self.specs.push(spec);
        self
    }

    pub fn new_errors(self) -> Self {
        self.gate(GateSpec::NewErrors)
    }

    pub fn resurfaced_errors(self) -> Self {
        self.gate(GateSpec::ResurfacedErrors)
    }

    pub fn max_volume(self, max_hits: i64) -> Self {
        self.gate(GateSpec::Volume { max_hits })
    }

    pub fn max_unique(self, max_errors: i64) -> Self {
        self.gate(GateSpec::Unique { max_errors })
    }

    pub fn critical_exceptions<I, S>(self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.gate(GateSpec::CriticalExceptions {
            types: types.into_iter().map(Into::into).collect(),
        })
    }

    pub fn regression(self, spec: RegressionGateSpec) -> Self {
        self.gate(GateSpec::Regression(spec))
    }

    /// Validate every spec; duplicates and malformed payloads are rejected
    pub fn build(self) -> Result<GateConfig> {
        let mut gates: Vec<Gate> = Vec::with_capacity(self.specs.len());
        let mut seen: Vec<GateKind> = Vec::with_capacity(self.specs.len());

        for spec in &self.specs {
            let kind = spec.kind();
            if seen.contains(&kind) {
                return Err(GateError::validation(
                    "gate",
                    format!("{} configured more than once", kind),
                ));
            }
            seen.push(kind);

            match Gate::from_spec(spec)? {
                Some(gate) => gates.push(gate),
                None => tracing::debug!("{} left unconfigured by {:?}", kind, spec),
            }
        }

        gates.sort_by_key(Gate::kind);
        Ok(GateConfig { gates })
    }
}
