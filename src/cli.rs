//! CLI argument parsing for quality-gate

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for the quality report
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format (default)
    Text,
    /// JSON format for machine parsing
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "quality-gate")]
#[command(version)]
#[command(about = "Evaluate error quality gates for a build against a regression result", long_about = None)]
pub struct Cli {
    /// Run configuration file (TOML with [service], [report] and [[gate]])
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Regression partitions JSON exported from the analytics service
    #[arg(short = 'i', long = "input", value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Service identifier
    #[arg(long = "service-id", value_name = "ID")]
    pub service_id: Option<String>,

    /// View name or identifier
    #[arg(long = "view-id", value_name = "VIEW")]
    pub view_id: Option<String>,

    /// Applications to include, apostrophe-separated (e.g. "web'worker")
    #[arg(long = "applications", value_name = "LIST")]
    pub applications: Option<String>,

    /// Deployments to include, apostrophe-separated
    #[arg(long = "deployments", value_name = "LIST")]
    pub deployments: Option<String>,

    /// Servers to include, apostrophe-separated
    #[arg(long = "servers", value_name = "LIST")]
    pub servers: Option<String>,

    /// Fail on any new error
    #[arg(long = "new-errors")]
    pub new_errors: bool,

    /// Fail on any resurfaced error
    #[arg(long = "resurfaced-errors")]
    pub resurfaced_errors: bool,

    /// Maximum total error volume (0 disables the gate)
    #[arg(long = "max-volume", value_name = "HITS", allow_negative_numbers = true)]
    pub max_volume: Option<i64>,

    /// Maximum number of unique errors (0 disables the gate)
    #[arg(long = "max-unique", value_name = "COUNT", allow_negative_numbers = true)]
    pub max_unique: Option<i64>,

    /// Exception types that are always severe, apostrophe-separated
    #[arg(long = "critical-exception-types", value_name = "LIST")]
    pub critical_exception_types: Option<String>,

    /// Enable the increasing errors gate
    #[arg(long = "regression")]
    pub regression: bool,

    /// Active window for regressions (e.g. 30m, 12h, 1d)
    #[arg(long = "active-timespan", value_name = "WINDOW", default_value = "1d")]
    pub active_timespan: String,

    /// Baseline window for regressions
    #[arg(long = "baseline-timespan", value_name = "WINDOW", default_value = "14d")]
    pub baseline_timespan: String,

    /// Minimum hits for an event to be considered for regression
    #[arg(long = "min-volume-threshold", value_name = "HITS", default_value = "0")]
    pub min_volume_threshold: u64,

    /// Minimum error rate (0.0 to 1.0) for regression
    #[arg(long = "min-error-rate-threshold", value_name = "RATE", default_value = "0.0")]
    pub min_error_rate_threshold: f64,

    /// Rate increase that counts as a regression
    #[arg(long = "regression-delta", value_name = "DELTA", default_value = "0.0")]
    pub regression_delta: f64,

    /// Rate increase that counts as a severe regression
    #[arg(long = "critical-regression-delta", value_name = "DELTA", default_value = "0.0")]
    pub critical_regression_delta: f64,

    /// Account for seasonality when comparing windows
    #[arg(long = "apply-seasonality")]
    pub apply_seasonality: bool,

    /// Number of top events to list (0 or less lists none)
    #[arg(long = "top", value_name = "N", allow_negative_numbers = true)]
    pub top: Option<i64>,

    /// Only keep events whose serialized form matches this regex
    #[arg(long = "regex-filter", value_name = "REGEX")]
    pub regex_filter: Option<String>,

    /// Deep link template with {service_id}, {event_id}, {from}, {to}, ...
    #[arg(long = "link-template", value_name = "URL")]
    pub link_template: Option<String>,

    /// Seconds to wait for the analytics service to ingest build data
    #[arg(long = "server-wait", value_name = "SECONDS")]
    pub server_wait: Option<u64>,

    /// Exit with code 2 when the build is unstable
    #[arg(long = "mark-unstable")]
    pub mark_unstable: bool,

    /// Print build-log lines (input echo, filtered events) to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,

    /// Output format (text or json)
    #[arg(long = "format", value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Enable debug tracing output to stderr
    #[arg(long = "debug")]
    pub debug: bool,
}
