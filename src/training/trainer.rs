//! Training loop with best-checkpoint selection.
//!
//! A single-threaded, batch-sequential loop over a split dataset tree.
//! Each epoch trains on shuffled mini-batches and then measures top-1
//! accuracy on the validation split. A checkpoint is persisted only when
//! an epoch's validation accuracy strictly exceeds the best seen so far in
//! the run; the initial bar is 0.0, so a run where no epoch beats zero
//! writes nothing. Partial epochs are never checkpointed: interrupting a
//! run simply leaves the last-saved artifact in place.

use std::path::PathBuf;

use burn::data::dataset::Dataset;
use burn::module::AutodiffModule;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::backend::{AutodiffBackend, Backend};
use burn::tensor::ElementConversion;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{info, warn};

use crate::checkpoint::CheckpointArtifact;
use crate::dataset::batch::{LeafBatchDataset, LeafBatcher};
use crate::dataset::loader::LeafDataset;
use crate::model::cnn::{LeafClassifier, LeafClassifierConfig};
use crate::preprocess::Contract;
use crate::utils::error::{LeafError, Result};

/// Configuration for a training run
#[derive(Debug, Clone)]
pub struct TrainConfig {
    /// Root of the split dataset tree (`root/{train,val}/{label}/`)
    pub data_root: PathBuf,
    /// Where to write the checkpoint artifact
    pub artifact_path: PathBuf,
    /// Number of passes over the train split
    pub epochs: usize,
    /// Mini-batch size
    pub batch_size: usize,
    /// Learning rate
    pub learning_rate: f64,
    /// Seed for epoch shuffling
    pub seed: u64,
    /// Preprocessing contract, shared with inference
    pub contract: Contract,
    /// Base filter count for the CNN backbone
    pub base_filters: usize,
    /// Dropout rate for the classifier head
    pub dropout_rate: f64,
}

impl TrainConfig {
    /// Defaults mirroring the deployment's training recipe
    pub fn new(data_root: PathBuf, artifact_path: PathBuf) -> Self {
        Self {
            data_root,
            artifact_path,
            epochs: 3,
            batch_size: 16,
            learning_rate: 1e-4,
            seed: 42,
            contract: Contract::default(),
            base_filters: 32,
            dropout_rate: 0.3,
        }
    }
}

/// Tracks the best validation accuracy seen in a run.
///
/// The selection policy is strict improvement only: ties do not count, and
/// the first epoch's accuracy becomes the initial bar by beating 0.0.
#[derive(Debug, Clone, Default)]
pub struct BestAccuracy {
    best: f64,
}

impl BestAccuracy {
    /// Record an observation; returns true iff it strictly improves
    pub fn improves(&mut self, accuracy: f64) -> bool {
        if accuracy > self.best {
            self.best = accuracy;
            true
        } else {
            false
        }
    }

    /// Best accuracy observed so far
    pub fn value(&self) -> f64 {
        self.best
    }
}

/// Per-epoch record of a training run
#[derive(Debug, Clone)]
pub struct EpochStats {
    pub epoch: usize,
    pub avg_loss: f64,
    pub val_accuracy: f64,
    pub checkpointed: bool,
}

/// Outcome of a training run
#[derive(Debug)]
pub struct TrainingRun {
    /// Best validation accuracy reached
    pub best_accuracy: f64,
    /// Per-epoch statistics
    pub epochs: Vec<EpochStats>,
    /// The last artifact written, if any epoch improved over the bar
    pub artifact: Option<CheckpointArtifact>,
}

/// Run training over a split dataset tree.
///
/// Returns `Ok` with `artifact: None` when no epoch improved over the
/// initial bar; dataset problems fail the whole run.
pub fn train<B: AutodiffBackend>(config: &TrainConfig, device: &B::Device) -> Result<TrainingRun> {
    let dataset = LeafDataset::open(&config.data_root)?;

    if dataset.train.is_empty() {
        return Err(LeafError::Dataset(format!(
            "train split under {:?} is empty",
            config.data_root
        )));
    }
    if dataset.val.is_empty() {
        return Err(LeafError::Dataset(format!(
            "validation split under {:?} is empty",
            config.data_root
        )));
    }
    if dataset.train.len() < config.batch_size {
        warn!(
            "train split ({}) is smaller than the batch size ({})",
            dataset.train.len(),
            config.batch_size
        );
    }

    info!(
        "training on {} samples, validating on {} ({} classes, {} epochs, batch {}, lr {})",
        dataset.train.len(),
        dataset.val.len(),
        dataset.num_classes(),
        config.epochs,
        config.batch_size,
        config.learning_rate
    );

    let train_items = LeafBatchDataset::preload(&dataset.train, &config.contract)?;
    let val_items = LeafBatchDataset::preload(&dataset.val, &config.contract)?;

    let batcher = LeafBatcher::<B>::new(device.clone(), &config.contract);
    let inner_device = <B::InnerBackend as Backend>::Device::default();
    let inner_batcher = LeafBatcher::<B::InnerBackend>::new(inner_device, &config.contract);

    let model_config = LeafClassifierConfig {
        num_classes: dataset.num_classes(),
        in_channels: 3,
        base_filters: config.base_filters,
        dropout_rate: config.dropout_rate,
    };
    let mut model = LeafClassifier::<B>::new(&model_config, device);
    let mut optimizer = AdamConfig::new().init();

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut best = BestAccuracy::default();
    let mut artifact = None;
    let mut epochs = Vec::with_capacity(config.epochs);

    for epoch in 0..config.epochs {
        let mut indices: Vec<usize> = (0..train_items.len()).collect();
        indices.shuffle(&mut rng);

        let mut epoch_loss = 0.0f64;
        let mut num_batches = 0usize;

        for chunk in indices.chunks(config.batch_size.max(1)) {
            let items: Vec<_> = chunk.iter().filter_map(|&i| train_items.get(i)).collect();
            if items.is_empty() {
                continue;
            }

            let batch = batcher.batch(items);
            let logits = model.forward(batch.images);

            let loss = CrossEntropyLossConfig::new()
                .init(&logits.device())
                .forward(logits, batch.targets);

            let loss_value: f64 = loss.clone().into_scalar().elem();
            epoch_loss += loss_value;
            num_batches += 1;

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(config.learning_rate, model, grads);
        }

        let avg_loss = epoch_loss / num_batches.max(1) as f64;
        let val_accuracy =
            evaluate(&model.valid(), &val_items, &inner_batcher, config.batch_size)?;

        let checkpointed = best.improves(val_accuracy);
        if checkpointed {
            let snapshot = CheckpointArtifact::from_model(
                &model.valid(),
                &model_config,
                &dataset.classes,
                &config.contract,
                val_accuracy,
            )?;
            snapshot.save(&config.artifact_path)?;
            artifact = Some(snapshot);
        }

        info!(
            "epoch {}/{}: loss {:.4} | val acc {:.3}{}",
            epoch + 1,
            config.epochs,
            avg_loss,
            val_accuracy,
            if checkpointed { " (new best, saved)" } else { "" }
        );

        epochs.push(EpochStats {
            epoch,
            avg_loss,
            val_accuracy,
            checkpointed,
        });
    }

    if artifact.is_none() {
        warn!("no epoch improved over the initial bar; no artifact written");
    }

    Ok(TrainingRun {
        best_accuracy: best.value(),
        epochs,
        artifact,
    })
}

/// Top-1 accuracy of a model over a dataset, without parameter updates
fn evaluate<B: Backend>(
    model: &LeafClassifier<B>,
    dataset: &LeafBatchDataset,
    batcher: &LeafBatcher<B>,
    batch_size: usize,
) -> Result<f64> {
    let len = dataset.len();
    let mut correct = 0usize;
    let mut total = 0usize;

    for start in (0..len).step_by(batch_size.max(1)) {
        let end = (start + batch_size).min(len);
        let items: Vec<_> = (start..end).filter_map(|i| dataset.get(i)).collect();
        if items.is_empty() {
            continue;
        }

        let targets: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let batch = batcher.batch(items);
        let output = model.forward(batch.images);

        let predictions: Vec<i64> = output
            .argmax(1)
            .into_data()
            .to_vec()
            .map_err(|e| LeafError::Model(format!("failed to read predictions: {:?}", e)))?;

        correct += predictions
            .iter()
            .zip(&targets)
            .filter(|(p, t)| p == t)
            .count();
        total += targets.len();
    }

    Ok(if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    })
}
