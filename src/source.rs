//! External collaborators: regression data, deep links, build-log lines
//!
//! The evaluator only talks to these traits. Shipped implementations cover
//! offline use (partition JSON files, link templates, in-memory logs).

use crate::error::DataSourceError;
use crate::input::RegressionInput;
use crate::regression::RawRegressionPartitions;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Supplier of pre-computed regression partitions
///
/// `input.run_regressions` only tells a source it may skip computing the
/// baseline comparison; partitions already in hand are returned whole.
/// Network, auth and parse failures must surface as `DataSourceError`,
/// never as empty partitions. Retries, if any, happen in here.
pub trait RegressionDataSource {
    fn fetch_regression(
        &self,
        input: &RegressionInput,
    ) -> Result<RawRegressionPartitions, DataSourceError>;
}

/// Parameters for one event deep link
#[derive(Debug, Clone)]
pub struct LinkRequest<'a> {
    pub service_id: &'a str,
    pub event_id: &'a str,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub applications: &'a [String],
    pub deployments: &'a [String],
    pub servers: &'a [String],
}

/// Renders a deep link for an event
///
/// Failures degrade to an empty string; they never abort assembly.
pub trait LinkBuilder {
    fn build_deep_link(&self, request: &LinkRequest<'_>) -> String;
}

/// Write-only sink for human-facing build-log lines
pub trait LogSink: Send + Sync {
    fn line(&self, line: &str);
}

/// Reads partitions from a JSON file produced by an export of the service
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl RegressionDataSource for JsonFileSource {
    fn fetch_regression(
        &self,
        input: &RegressionInput,
    ) -> Result<RawRegressionPartitions, DataSourceError> {
        let content = fs::read_to_string(&self.path).map_err(|source| DataSourceError::Io {
            path: self.path.display().to_string(),
            source,
        })?;

        let partitions: RawRegressionPartitions = serde_json::from_str(&content)?;
        tracing::debug!(
            "Loaded {} events for service {} from {}",
            partitions.event_count(),
            input.service_id,
            self.path.display()
        );

        Ok(partitions)
    }
}

/// Serves a fixed set of partitions
#[derive(Debug, Clone)]
pub struct InMemorySource {
    partitions: RawRegressionPartitions,
}

impl InMemorySource {
    pub fn new(partitions: RawRegressionPartitions) -> Self {
        Self { partitions }
    }
}

impl RegressionDataSource for InMemorySource {
    fn fetch_regression(
        &self,
        _input: &RegressionInput,
    ) -> Result<RawRegressionPartitions, DataSourceError> {
        Ok(self.partitions.clone())
    }
}

/// Link builder that never renders links
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLinks;

impl LinkBuilder for NoLinks {
    fn build_deep_link(&self, _request: &LinkRequest<'_>) -> String {
        String::new()
    }
}

/// Fills placeholders in a URL template
///
/// Placeholders: `{service_id}`, `{event_id}`, `{from}`, `{to}` (RFC 3339,
/// UTC), `{applications}`, `{deployments}`, `{servers}` (comma-joined).
/// Values are substituted verbatim.
#[derive(Debug, Clone)]
pub struct TemplateLinkBuilder {
    template: String,
}

impl TemplateLinkBuilder {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }
}

impl LinkBuilder for TemplateLinkBuilder {
    fn build_deep_link(&self, request: &LinkRequest<'_>) -> String {
        if self.template.is_empty() {
            return String::new();
        }

        self.template
            .replace("{service_id}", request.service_id)
            .replace("{event_id}", request.event_id)
            .replace(
                "{from}",
                &request.from.to_rfc3339_opts(SecondsFormat::Secs, true),
            )
            .replace("{to}", &request.to.to_rfc3339_opts(SecondsFormat::Secs, true))
            .replace("{applications}", &request.applications.join(","))
            .replace("{deployments}", &request.deployments.join(","))
            .replace("{servers}", &request.servers.join(","))
    }
}

/// Collects lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl LogSink for MemorySink {
    fn line(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(line.to_string());
    }
}

/// Writes lines to stderr
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink;

impl LogSink for StderrSink {
    fn line(&self, line: &str) {
        eprintln!("{}", line);
    }
}
