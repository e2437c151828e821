//! Regression request parameters and their validation

use crate::error::{GateError, Result};
use serde::{Deserialize, Serialize};

/// Default active window: one day
pub const DEFAULT_ACTIVE_TIMESPAN: u32 = 24 * 60;

/// Default baseline window: fourteen days
pub const DEFAULT_BASELINE_TIMESPAN: u32 = 14 * 24 * 60;

/// Separator of the list-string form accepted from build configuration
pub const LIST_SEPARATOR: char = '\'';

/// Request and threshold configuration for one evaluation
///
/// Filter lists are ordered sets: insertion order is kept and duplicates
/// are dropped by [`ordered_set`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionInput {
    pub service_id: String,
    pub view_id: String,

    /// Active window length in minutes
    pub active_timespan: u32,
    /// Baseline window length in minutes
    pub baseline_timespan: u32,

    pub min_volume_threshold: u64,
    pub min_error_rate_threshold: f64,
    pub regression_delta: f64,
    pub critical_regression_delta: f64,
    pub apply_seasonality: bool,

    #[serde(default)]
    pub applications: Vec<String>,
    #[serde(default)]
    pub deployments: Vec<String>,
    #[serde(default)]
    pub servers: Vec<String>,
    #[serde(default)]
    pub critical_exception_types: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_filter: Option<String>,

    /// Whether the data source should compute baseline regressions at all
    #[serde(default)]
    pub run_regressions: bool,
}

impl RegressionInput {
    pub fn new(service_id: impl Into<String>, view_id: impl Into<String>) -> Self {
        Self {
            service_id: service_id.into(),
            view_id: view_id.into(),
            active_timespan: DEFAULT_ACTIVE_TIMESPAN,
            baseline_timespan: DEFAULT_BASELINE_TIMESPAN,
            min_volume_threshold: 0,
            min_error_rate_threshold: 0.0,
            regression_delta: 0.0,
            critical_regression_delta: 0.0,
            apply_seasonality: false,
            applications: Vec::new(),
            deployments: Vec::new(),
            servers: Vec::new(),
            critical_exception_types: Vec::new(),
            regex_filter: None,
            run_regressions: false,
        }
    }

    /// Validate before any remote call
    pub fn validate(&self) -> Result<()> {
        if self.service_id.trim().is_empty() {
            return Err(GateError::validation("service_id", "must not be empty"));
        }

        if self.view_id.trim().is_empty() {
            return Err(GateError::validation("view_id", "must not be empty"));
        }

        if self.run_regressions {
            if self.active_timespan == 0 {
                return Err(GateError::validation(
                    "active_timespan",
                    "must be a positive minute count when regressions run",
                ));
            }
            if self.baseline_timespan == 0 {
                return Err(GateError::validation(
                    "baseline_timespan",
                    "must be a positive minute count when regressions run",
                ));
            }
        }

        if !(0.0..=1.0).contains(&self.min_error_rate_threshold) {
            return Err(GateError::validation(
                "min_error_rate_threshold",
                format!("must be in [0, 1], got {}", self.min_error_rate_threshold),
            ));
        }

        for (field, delta) in [
            ("regression_delta", self.regression_delta),
            ("critical_regression_delta", self.critical_regression_delta),
        ] {
            if !delta.is_finite() || delta < 0.0 {
                return Err(GateError::validation(
                    field,
                    format!("must be a non-negative number, got {}", delta),
                ));
            }
        }

        Ok(())
    }
}

/// Parse a window length such as `"30m"`, `"12h"`, `"1d"` or `"90"` (minutes)
///
/// Zero and unparsable values are rejected with a validation error naming
/// `field`.
pub fn parse_window_minutes(field: &str, value: &str) -> Result<u32> {
    let value = value.trim();
    let invalid = |reason: &str| GateError::validation(field, format!("{} (got {:?})", reason, value));

    let (digits, unit) = match value.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&value[..idx], c.to_ascii_lowercase()),
        Some(_) => (value, 'm'),
        None => return Err(invalid("window must not be empty")),
    };

    let factor: u32 = match unit {
        'm' => 1,
        'h' => 60,
        'd' => 24 * 60,
        _ => return Err(invalid("unknown window unit, expected m, h or d")),
    };

    let count: u32 = digits
        .trim()
        .parse()
        .map_err(|_| invalid("window must be a whole number"))?;

    let minutes = count
        .checked_mul(factor)
        .ok_or_else(|| invalid("window is too long"))?;

    if minutes == 0 {
        return Err(invalid("window must be a positive minute count"));
    }

    Ok(minutes)
}

/// Whether a configuration value is still an unexpanded `${VAR}` placeholder
pub fn is_unresolved(value: &str) -> bool {
    let value = value.trim();
    value.starts_with("${") && value.ends_with('}')
}

/// Parse the apostrophe-separated list form (`"app1'app2"`)
///
/// Unresolved placeholders are ignored.
pub fn parse_list(value: &str, name: &str) -> Vec<String> {
    if value.trim().is_empty() {
        return Vec::new();
    }

    if is_unresolved(value) {
        tracing::warn!("Value {} is unresolved for {}. Ignoring.", value, name);
        return Vec::new();
    }

    ordered_set(value.trim().split(LIST_SEPARATOR))
}

/// Trim, drop empties and duplicates, keep first-seen order
pub fn ordered_set<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut result: Vec<String> = Vec::new();
    for value in values {
        let value = value.as_ref().trim();
        if !value.is_empty() && !result.iter().any(|v| v == value) {
            result.push(value.to_string());
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_uses_default_windows() {
        let input = RegressionInput::new("S1", "All Events");
        assert_eq!(input.active_timespan, 1440);
        assert_eq!(input.baseline_timespan, 20160);
        assert!(!input.run_regressions);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_service_and_view() {
        let input = RegressionInput::new("", "All Events");
        assert_eq!(input.validate().unwrap_err().field(), Some("service_id"));

        let input = RegressionInput::new("S1", "  ");
        assert_eq!(input.validate().unwrap_err().field(), Some("view_id"));
    }

    #[test]
    fn test_zero_window_rejected_only_when_regressions_run() {
        let mut input = RegressionInput::new("S1", "All Events");
        input.active_timespan = 0;
        assert!(input.validate().is_ok());

        input.run_regressions = true;
        assert_eq!(input.validate().unwrap_err().field(), Some("active_timespan"));

        input.active_timespan = 60;
        input.baseline_timespan = 0;
        assert_eq!(
            input.validate().unwrap_err().field(),
            Some("baseline_timespan")
        );
    }

    #[test]
    fn test_validate_rates_and_deltas() {
        let mut input = RegressionInput::new("S1", "All Events");
        input.min_error_rate_threshold = 1.5;
        assert_eq!(
            input.validate().unwrap_err().field(),
            Some("min_error_rate_threshold")
        );

        input.min_error_rate_threshold = 0.1;
        input.critical_regression_delta = -1.0;
        assert_eq!(
            input.validate().unwrap_err().field(),
            Some("critical_regression_delta")
        );

        input.critical_regression_delta = f64::NAN;
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_parse_window_units() {
        assert_eq!(parse_window_minutes("w", "30m").unwrap(), 30);
        assert_eq!(parse_window_minutes("w", "12h").unwrap(), 720);
        assert_eq!(parse_window_minutes("w", "1d").unwrap(), 1440);
        assert_eq!(parse_window_minutes("w", "14D").unwrap(), 20160);
        assert_eq!(parse_window_minutes("w", " 90 ").unwrap(), 90);
    }

    #[test]
    fn test_parse_window_rejects_zero_and_garbage() {
        for bad in ["0", "0d", "", "d", "abc", "1w", "-5m", "1.5h", "99999999d"] {
            let err = parse_window_minutes("active_timespan", bad).unwrap_err();
            assert_eq!(err.field(), Some("active_timespan"), "input {:?}", bad);
        }
    }

    #[test]
    fn test_parse_list_separator() {
        assert_eq!(
            parse_list("app1'app2' app3", "Application Name"),
            vec!["app1", "app2", "app3"]
        );
        assert!(parse_list("", "Application Name").is_empty());
    }

    #[test]
    fn test_parse_list_unresolved_variable() {
        assert!(is_unresolved("${APP_NAME}"));
        assert!(!is_unresolved("app-${X}-1"));
        assert!(parse_list("${APP_NAME}", "Application Name").is_empty());
    }

    #[test]
    fn test_ordered_set_keeps_first_seen_order() {
        assert_eq!(
            ordered_set(["b", "a", "b", " ", "c", "a"]),
            vec!["b", "a", "c"]
        );
    }
}
