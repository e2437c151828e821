//! quality-gate - Error quality gates for CI builds
//!
//! This library turns a pre-computed regression result from an error
//! analytics service into a build stability decision: events are
//! deduplicated and labeled (new, severe new, regression, severe
//! regression, non-regressed), filtered, measured against configurable
//! gates, and packaged into an immutable [`QualityReport`].
//!
//! ```no_run
//! use quality_gate::{GateConfig, InMemorySource, QualityGate, RawRegressionPartitions, RegressionInput};
//!
//! # fn main() -> quality_gate::Result<()> {
//! let source = InMemorySource::new(RawRegressionPartitions::empty(chrono::Utc::now()));
//! let gates = GateConfig::builder().new_errors().max_volume(1000).build()?;
//!
//! let report = QualityGate::new(&source).evaluate(
//!     RegressionInput::new("S12345", "All Events"),
//!     &gates,
//!     5,
//!     None,
//! )?;
//! println!("{}", report.to_report_string());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod filter;
pub mod gate;
pub mod input;
pub mod quality_gate;
pub mod regression;
pub mod report;
pub mod source;

pub use error::{DataSourceError, GateError, Result};
pub use event::{EventRecord, EventStats};
pub use filter::EventFilter;
pub use gate::{GateConfig, GateKind, GateResults};
pub use input::RegressionInput;
pub use quality_gate::QualityGate;
pub use regression::{classify, ClassificationLabel, RawRegressionPartitions, RegressionResult};
pub use report::{QualityReport, ReportEvent};
pub use source::{InMemorySource, JsonFileSource, LinkBuilder, LogSink, RegressionDataSource};
