//! Trained-model inference path.
//!
//! A [`Classifier`] owns the model weights and class mapping loaded from a
//! checkpoint artifact. The state is immutable after construction, so one
//! instance can be shared by reference across concurrent callers; the
//! model runs on the plain (non-autodiff) backend, so no gradient state
//! exists on this path.

use std::path::Path;

use burn::tensor::Tensor;
use tracing::info;

use crate::backend::{default_device, DefaultBackend};
use crate::checkpoint::CheckpointArtifact;
use crate::labels::{ClassIndex, ClassLabel};
use crate::model::cnn::LeafClassifier;
use crate::preprocess::Contract;
use crate::utils::error::{LeafError, Result};

/// Result of a single classification
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Predicted class
    pub label: ClassLabel,
    /// Probability of the predicted class, rounded to 3 decimal places
    pub confidence: f32,
}

/// Round a confidence for presentation stability
pub fn round_confidence(confidence: f32) -> f32 {
    (confidence * 1000.0).round() / 1000.0
}

/// Classifier backed by a trained checkpoint
pub struct Classifier {
    model: LeafClassifier<DefaultBackend>,
    classes: ClassIndex,
    contract: Contract,
    device: <DefaultBackend as burn::tensor::backend::Backend>::Device,
}

impl Classifier {
    /// Build a classifier from a loaded artifact, validating it
    pub fn from_artifact(artifact: &CheckpointArtifact) -> Result<Self> {
        let device = default_device();
        let (model, classes) = artifact.into_model::<DefaultBackend>(&device)?;

        info!(
            "classifier ready: {} classes, input {}px, val acc {:.3}",
            classes.len(),
            artifact.contract.size,
            artifact.metadata.validation_accuracy
        );

        Ok(Self {
            model,
            classes,
            contract: artifact.contract.clone(),
            device,
        })
    }

    /// Load the artifact file at `path` and build a classifier from it
    pub fn load(path: &Path) -> Result<Self> {
        let artifact = CheckpointArtifact::load(path)?;
        Self::from_artifact(&artifact)
    }

    /// Labels this classifier can emit
    pub fn classes(&self) -> &ClassIndex {
        &self.classes
    }

    /// Classify raw image bytes.
    ///
    /// Decodes, applies the training-time preprocessing contract, runs a
    /// forward pass, and derives the arg-max label and its softmax
    /// probability. Invalid bytes fail with [`LeafError::Decode`] and leave
    /// no state behind.
    pub fn classify(&self, bytes: &[u8]) -> Result<Prediction> {
        let data = self.contract.tensor_from_bytes(bytes)?;

        let size = self.contract.size as usize;
        let input = Tensor::<DefaultBackend, 1>::from_floats(data.as_slice(), &self.device)
            .reshape([1, 3, size, size]);

        let probabilities: Vec<f32> = self
            .model
            .forward_softmax(input)
            .into_data()
            .to_vec()
            .map_err(|e| LeafError::Model(format!("failed to read probabilities: {:?}", e)))?;

        let (index, confidence) = probabilities
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, &p)| (i, p))
            .ok_or_else(|| LeafError::Model("empty probability vector".to_string()))?;

        let label = self.classes.label_at(index).ok_or_else(|| {
            LeafError::Model(format!("predicted index {} has no label", index))
        })?;

        Ok(Prediction {
            label,
            confidence: round_confidence(confidence),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::cnn::LeafClassifierConfig;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(rgb: [u8; 3]) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 64, Rgb(rgb)));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    fn tiny_classifier() -> Classifier {
        let config = LeafClassifierConfig {
            base_filters: 2,
            ..LeafClassifierConfig::new(4)
        };
        let classes = ClassIndex::new(vec![
            ClassLabel::Healthy,
            ClassLabel::LeafSpot,
            ClassLabel::PestDamage,
            ClassLabel::Yellowing,
        ])
        .unwrap();
        let contract = Contract {
            size: 32,
            ..Contract::default()
        };
        let device = default_device();
        let model = LeafClassifier::<DefaultBackend>::new(&config, &device);
        let artifact =
            CheckpointArtifact::from_model(&model, &config, &classes, &contract, 0.0).unwrap();
        Classifier::from_artifact(&artifact).unwrap()
    }

    #[test]
    fn test_round_confidence() {
        assert_eq!(round_confidence(0.86049), 0.86);
        assert_eq!(round_confidence(0.8605), 0.861);
        assert_eq!(round_confidence(1.0), 1.0);
        assert_eq!(round_confidence(0.0), 0.0);
    }

    #[test]
    fn test_classify_returns_bounded_confidence() {
        let classifier = tiny_classifier();
        let prediction = classifier.classify(&png_bytes([60, 150, 60])).unwrap();

        assert!((0.0..=1.0).contains(&prediction.confidence));
        assert!(classifier.classes().index_of(prediction.label).is_some());
        // Rounded to 3 decimal places exactly
        let scaled = prediction.confidence * 1000.0;
        assert!((scaled - scaled.round()).abs() < 1e-4);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let classifier = tiny_classifier();
        let bytes = png_bytes([120, 90, 200]);
        let a = classifier.classify(&bytes).unwrap();
        let b = classifier.classify(&bytes).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_classify_rejects_invalid_bytes() {
        let classifier = tiny_classifier();
        let result = classifier.classify(b"not an image at all");
        assert!(matches!(result, Err(LeafError::Decode(_))));
    }
}
