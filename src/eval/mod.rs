//! Held-out evaluation: seeded split, train, predict, accuracy and confusion matrix.

mod harness;
mod split;

pub use harness::{ClassMetrics, ConfusionMatrix, Evaluation, EvaluationHarness, EvaluationReport};
pub use split::{train_test_split, Split};
