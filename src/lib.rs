//! # leafcheck
//!
//! Plant-leaf health classification with the Burn framework.
//!
//! The pipeline has two halves sharing one preprocessing contract and one
//! checkpoint format:
//!
//! - **Offline training**: split a raw class-folder tree into reproducible
//!   train/validation sets, fine-tune a CNN over a fixed number of epochs,
//!   and persist a checkpoint whenever validation accuracy strictly
//!   improves.
//! - **Inference**: load the checkpoint once per process and answer
//!   classification requests concurrently over shared read-only state.
//!   When no checkpoint exists, a deterministic color-statistics fallback
//!   answers instead, so the service degrades gracefully.
//!
//! ## Modules
//!
//! - `dataset`: splitting, loading, and batching
//! - `model`: CNN architecture
//! - `training`: epoch loop and best-checkpoint selection
//! - `checkpoint`: the persisted weights + label-mapping artifact
//! - `inference`: trained and heuristic classification paths
//! - `preprocess`: the resolution/normalization contract shared by both halves
//! - `labels`, `recommend`, `utils`: classes, care tips, errors, logging
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use leafcheck::dataset::{default_mapping, split_dataset, SplitConfig};
//! use leafcheck::inference::ClassifierEngine;
//!
//! split_dataset("data/raw".as_ref(), &default_mapping(), "data".as_ref(),
//!     &SplitConfig::default())?;
//! let engine = ClassifierEngine::global("output/model.ckpt".as_ref())?;
//! let diagnosis = engine.diagnose(&image_bytes)?;
//! ```

pub mod backend;
pub mod checkpoint;
pub mod dataset;
pub mod inference;
pub mod labels;
pub mod model;
pub mod preprocess;
pub mod recommend;
pub mod training;
pub mod utils;

pub use backend::{DefaultBackend, TrainingBackend};
pub use checkpoint::{ArtifactMetadata, CheckpointArtifact};
pub use dataset::{
    default_mapping, split_dataset, ClassMapping, LeafDataset, SplitConfig, SplitReport,
};
pub use inference::{Classifier, ClassifierEngine, Diagnosis, HeuristicClassifier, Prediction};
pub use labels::{ClassIndex, ClassLabel};
pub use model::{LeafClassifier, LeafClassifierConfig};
pub use preprocess::Contract;
pub use training::{train, train_from_source, TrainConfig, TrainingRun};
pub use utils::{LeafError, Result};

/// Default seed used for dataset splitting and epoch shuffling
pub const DEFAULT_SEED: u64 = 42;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
