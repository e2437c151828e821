// Quality gates: configuration and evaluation
//
// Each gate is independently enabled and carries only its own payload.
// A gate configured with a non-positive threshold or an empty type list is
// treated as not configured, never as "fail immediately".

mod config;
mod evaluator;

pub use config::{
    Gate, GateConfig, GateConfigBuilder, GateKind, GateSpec, RegressionGateSpec,
    RegressionSettings,
};
pub use evaluator::{Aggregates, GateEvaluator, GateOutcome, GateResults};
