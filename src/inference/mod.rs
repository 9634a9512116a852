//! Inference: the trained-model path, the heuristic fallback, and the
//! engine that routes between them.

pub mod classifier;
pub mod engine;
pub mod heuristic;

pub use classifier::{round_confidence, Classifier, Prediction};
pub use engine::{ClassifierEngine, Diagnosis};
pub use heuristic::{ColorStats, HeuristicClassifier};
