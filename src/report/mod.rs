// Quality report: assembly and rendering
//
// The report is built once per evaluation and never mutated afterwards.
// `all_issues` is always `new_issues` followed by `regressions`.

mod assembler;
mod model;

pub use assembler::ReportAssembler;
pub use model::{QualityReport, ReportEvent};

#[cfg(test)]
mod tests;
