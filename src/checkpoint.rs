//! The checkpoint artifact exchanged between training and inference.
//!
//! One file holds the trained weights, the exact class list used during
//! training, the model configuration, and the preprocessing contract. The
//! pieces are loaded together and validated together: a weight blob whose
//! output width disagrees with the class list is a corrupt artifact, not a
//! recoverable condition. A later, better checkpoint overwrites the file
//! in place; there is no versioning.

use std::fs;
use std::path::Path;

use burn::module::Module;
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder};
use burn::tensor::backend::Backend;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::labels::{ClassIndex, ClassLabel};
use crate::model::cnn::{LeafClassifier, LeafClassifierConfig};
use crate::preprocess::Contract;
use crate::utils::error::{LeafError, Result};

/// Metadata recorded alongside the weights
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Architecture name
    pub architecture: String,
    /// Validation accuracy the checkpoint was saved at
    pub validation_accuracy: f64,
    /// RFC 3339 timestamp of the save
    pub trained_at: String,
}

/// Persisted bundle of trained weights plus the label/index mapping used at
/// training time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckpointArtifact {
    /// Ordered class list; a label's position is its dense index
    pub classes: Vec<ClassLabel>,
    /// Model record serialized with `BinBytesRecorder`
    pub weights: Vec<u8>,
    /// Architecture configuration the weights were trained under
    pub model_config: LeafClassifierConfig,
    /// Preprocessing contract the weights were trained under
    pub contract: Contract,
    /// Save metadata
    pub metadata: ArtifactMetadata,
}

impl CheckpointArtifact {
    /// Snapshot a trained model into an artifact
    pub fn from_model<B: Backend>(
        model: &LeafClassifier<B>,
        model_config: &LeafClassifierConfig,
        classes: &ClassIndex,
        contract: &Contract,
        validation_accuracy: f64,
    ) -> Result<Self> {
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let weights = recorder
            .record(model.clone().into_record(), ())
            .map_err(|e| LeafError::Serialization(format!("failed to record weights: {:?}", e)))?;

        Ok(Self {
            classes: classes.labels().to_vec(),
            weights,
            model_config: model_config.clone(),
            contract: contract.clone(),
            metadata: ArtifactMetadata {
                architecture: "leaf-cnn".to_string(),
                validation_accuracy,
                trained_at: Utc::now().to_rfc3339(),
            },
        })
    }

    /// Reconstruct the model and class mapping, validating both.
    ///
    /// Fails with [`LeafError::CorruptCheckpoint`] if the class list is not
    /// a valid bijection or the weight shapes do not match its length.
    pub fn into_model<B: Backend>(
        &self,
        device: &B::Device,
    ) -> Result<(LeafClassifier<B>, ClassIndex)> {
        let classes = ClassIndex::new(self.classes.clone())
            .map_err(|e| LeafError::CorruptCheckpoint(format!("invalid class list: {}", e)))?;

        if self.model_config.num_classes != classes.len() {
            return Err(LeafError::CorruptCheckpoint(format!(
                "model configured for {} outputs but artifact lists {} classes",
                self.model_config.num_classes,
                classes.len()
            )));
        }

        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let record = recorder
            .load(self.weights.clone(), device)
            .map_err(|e| {
                LeafError::CorruptCheckpoint(format!("failed to deserialize weights: {:?}", e))
            })?;

        let model = LeafClassifier::<B>::new(&self.model_config, device).load_record(record);

        // The record carries its own shapes; verify the loaded output layer
        // really is as wide as the class list
        if model.output_width() != classes.len() {
            return Err(LeafError::CorruptCheckpoint(format!(
                "weights have output width {} but artifact lists {} classes",
                model.output_width(),
                classes.len()
            )));
        }

        Ok((model, classes))
    }

    /// Write the artifact to a single file, replacing any previous one
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)
            .map_err(|e| LeafError::Serialization(e.to_string()))?;
        fs::write(path, json)?;
        info!(
            "checkpoint saved to {:?} (val acc {:.3})",
            path, self.metadata.validation_accuracy
        );
        Ok(())
    }

    /// Load an artifact from a file.
    ///
    /// Absence of the file is not handled here; callers treat a missing
    /// artifact as the signal to use the fallback classifier.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&json)
            .map_err(|e| LeafError::CorruptCheckpoint(format!("unreadable artifact: {}", e)))?;
        info!("checkpoint loaded from {:?}", path);
        Ok(artifact)
    }
}
