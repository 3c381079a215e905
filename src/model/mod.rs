//! Linear maximum-margin classifier separating normal from anomalous requests.

mod svm;

pub use svm::{label_for_margin, AnomalyClassifier, ClassifierModel};
