//! Inference engine: trained model when an artifact exists, heuristic
//! fallback when it does not.
//!
//! The engine is loaded once per process behind a `OnceLock`, so
//! initialization completes before any concurrent caller can classify, and
//! every caller shares the same read-only state. A missing artifact is a
//! valid, handled condition that selects the fallback; a present but
//! invalid artifact is fatal.

use std::path::Path;
use std::sync::OnceLock;

use serde::Serialize;
use tracing::{info, warn};

use crate::checkpoint::CheckpointArtifact;
use crate::inference::classifier::{Classifier, Prediction};
use crate::inference::heuristic::HeuristicClassifier;
use crate::recommend::care_tips;
use crate::utils::error::Result;

/// Response shape handed to the request-serving layer
#[derive(Debug, Clone, Serialize)]
pub struct Diagnosis {
    /// Human-readable label
    pub label: String,
    /// Confidence in [0,1], rounded to 3 decimal places
    pub confidence: f32,
    /// Care tips for the diagnosed condition
    pub recommendations: Vec<String>,
}

/// The classification entry point: trained or fallback
pub enum ClassifierEngine {
    /// Backed by a loaded checkpoint artifact
    Trained(Classifier),
    /// Checkpoint-free color-statistics fallback
    Heuristic(HeuristicClassifier),
}

static ENGINE: OnceLock<ClassifierEngine> = OnceLock::new();

impl ClassifierEngine {
    /// Load the engine for the artifact at `path`.
    ///
    /// Artifact absent: the heuristic fallback is selected and the service
    /// degrades gracefully. Artifact present but invalid: fatal.
    pub fn load(artifact_path: &Path) -> Result<Self> {
        if !artifact_path.exists() {
            warn!(
                "no checkpoint at {:?}; using heuristic fallback classifier",
                artifact_path
            );
            return Ok(Self::Heuristic(HeuristicClassifier::new()));
        }

        let artifact = CheckpointArtifact::load(artifact_path)?;
        let classifier = Classifier::from_artifact(&artifact)?;
        info!("loaded trained classifier from {:?}", artifact_path);
        Ok(Self::Trained(classifier))
    }

    /// Initialize the process-wide engine, once.
    ///
    /// The first successful call loads and installs the engine; later calls
    /// return the installed instance without touching the filesystem.
    pub fn global(artifact_path: &Path) -> Result<&'static Self> {
        if let Some(engine) = ENGINE.get() {
            return Ok(engine);
        }
        let engine = Self::load(artifact_path)?;
        Ok(ENGINE.get_or_init(|| engine))
    }

    /// Whether the fallback path is active
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Heuristic(_))
    }

    /// Classify raw image bytes
    pub fn classify(&self, bytes: &[u8]) -> Result<Prediction> {
        match self {
            Self::Trained(classifier) => classifier.classify(bytes),
            Self::Heuristic(heuristic) => heuristic.classify(bytes),
        }
    }

    /// Classify and attach presentation label and care tips
    pub fn diagnose(&self, bytes: &[u8]) -> Result<Diagnosis> {
        let prediction = self.classify(bytes)?;
        Ok(Diagnosis {
            label: prediction.label.display_name().to_string(),
            confidence: prediction.confidence,
            recommendations: care_tips(prediction.label)
                .iter()
                .map(|tip| tip.to_string())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{default_device, DefaultBackend};
    use crate::labels::{ClassIndex, ClassLabel};
    use crate::model::cnn::{LeafClassifier, LeafClassifierConfig};
    use crate::preprocess::Contract;
    use crate::utils::error::LeafError;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;
    use tempfile::TempDir;

    fn png_bytes(rgb: [u8; 3]) -> Vec<u8> {
        let img = image::DynamicImage::ImageRgb8(RgbImage::from_pixel(96, 96, Rgb(rgb)));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_missing_artifact_activates_fallback() {
        let dir = TempDir::new().unwrap();
        let engine = ClassifierEngine::load(&dir.path().join("absent.ckpt")).unwrap();

        assert!(engine.is_fallback());
        // Every call routes through the deterministic heuristic
        let prediction = engine.classify(&png_bytes([50, 200, 50])).unwrap();
        assert_eq!(prediction.label, ClassLabel::Healthy);
        assert_eq!(prediction.confidence, 0.86);
    }

    #[test]
    fn test_present_artifact_activates_trained_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.ckpt");

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
        let model = LeafClassifier::<DefaultBackend>::new(&config, &default_device());
        CheckpointArtifact::from_model(&model, &config, &classes, &contract, 0.5)
            .unwrap()
            .save(&path)
            .unwrap();

        let engine = ClassifierEngine::load(&path).unwrap();
        assert!(!engine.is_fallback());

        let prediction = engine.classify(&png_bytes([50, 200, 50])).unwrap();
        assert!((0.0..=1.0).contains(&prediction.confidence));
    }

    #[test]
    fn test_corrupt_artifact_is_fatal() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("model.ckpt");
        std::fs::write(&path, b"garbage").unwrap();

        let result = ClassifierEngine::load(&path);
        assert!(matches!(result, Err(LeafError::CorruptCheckpoint(_))));
    }

    #[test]
    fn test_diagnosis_carries_pretty_label_and_tips() {
        let dir = TempDir::new().unwrap();
        let engine = ClassifierEngine::load(&dir.path().join("absent.ckpt")).unwrap();

        // Dark blue-dominant image routes to Mold on the fallback path
        let diagnosis = engine.diagnose(&png_bytes([40, 50, 90])).unwrap();
        assert_eq!(diagnosis.label, "Mold");
        assert_eq!(diagnosis.confidence, 0.78);
        assert_eq!(diagnosis.recommendations.len(), 3);
    }

    #[test]
    fn test_decode_error_is_surfaced_not_fatal() {
        let dir = TempDir::new().unwrap();
        let engine = ClassifierEngine::load(&dir.path().join("absent.ckpt")).unwrap();

        assert!(matches!(
            engine.classify(b"not an image"),
            Err(LeafError::Decode(_))
        ));
        // The engine keeps answering valid requests afterwards
        assert!(engine.classify(&png_bytes([50, 200, 50])).is_ok());
    }
}
