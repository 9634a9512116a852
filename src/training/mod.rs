//! Training: epoch loop, validation, and best-checkpoint selection.

pub mod trainer;

pub use trainer::{train, BestAccuracy, EpochStats, TrainConfig, TrainingRun};

use burn::tensor::backend::AutodiffBackend;

use crate::dataset::split::{split_dataset, ClassMapping, SplitConfig};
use crate::utils::error::Result;

/// Split a raw source tree and train over the result in one call.
///
/// The split lands at `config.data_root`; the artifact, if any epoch
/// improves, at `config.artifact_path`.
pub fn train_from_source<B: AutodiffBackend>(
    source_root: &std::path::Path,
    mapping: &ClassMapping,
    split_config: &SplitConfig,
    config: &TrainConfig,
    device: &B::Device,
) -> Result<TrainingRun> {
    let report = split_dataset(source_root, mapping, &config.data_root, split_config)?;
    tracing::info!("{}", report);
    train::<B>(config, device)
}
