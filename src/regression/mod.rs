// Event classification over regression partitions
//
// Takes the partitioned regression result, drops events rejected by the
// regex filter and labels every surviving event exactly once:
//
//   critical regression          -> SevereRegression
//   regression                   -> Regression
//   critical / exceeded / critical-typed new -> SevereNew
//   other new                    -> NewIssue
//   anything else                -> NonRegressed
//
// Non-regressed events never reach the issue lists but still count towards
// volume and uniqueness.

mod classifier;
mod partitions;

pub use classifier::{classify, Classification, ClassificationLabel, LabeledEvent};
pub use partitions::{RawRegressionPartitions, RegressionResult};
