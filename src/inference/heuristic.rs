//! Checkpoint-free fallback classifier.
//!
//! Classifies from aggregate pixel-color statistics with an ordered
//! decision table: rules are evaluated top to bottom and the first match
//! wins. The thresholds and ordering are fixed; the value of this path is
//! deterministic reproducibility, not accuracy. Pure function of the input
//! bytes, so it is trivially safe under concurrency.

use image::DynamicImage;

use crate::inference::classifier::Prediction;
use crate::labels::ClassLabel;
use crate::preprocess::Contract;
use crate::utils::error::Result;

/// Resolution images are downsampled to before computing statistics
const STAT_SIZE: u32 = 128;

/// Mean R/G/B intensity of a downsampled image, each in [0, 255]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStats {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
}

impl ColorStats {
    /// Compute statistics over a fixed small resize of the image
    pub fn from_image(image: &DynamicImage) -> Self {
        let rgb = image
            .resize_exact(STAT_SIZE, STAT_SIZE, image::imageops::FilterType::Triangle)
            .to_rgb8();

        let n = (STAT_SIZE * STAT_SIZE) as f32;
        let (mut red, mut green, mut blue) = (0.0f32, 0.0f32, 0.0f32);
        for pixel in rgb.pixels() {
            red += pixel[0] as f32;
            green += pixel[1] as f32;
            blue += pixel[2] as f32;
        }

        Self {
            red: red / n,
            green: green / n,
            blue: blue / n,
        }
    }

    /// Share of green in the total intensity
    pub fn green_ratio(&self) -> f32 {
        self.green / (self.red + self.green + self.blue).max(1.0)
    }

    /// Mean intensity across channels
    pub fn brightness(&self) -> f32 {
        (self.red + self.green + self.blue) / 3.0
    }
}

/// One row of the decision table
struct Rule {
    label: ClassLabel,
    confidence: f32,
    applies: fn(&ColorStats) -> bool,
}

/// The decision table, in priority order. First match wins; the thresholds
/// are load-bearing and must not drift.
const DECISION_TABLE: [Rule; 4] = [
    Rule {
        label: ClassLabel::Healthy,
        confidence: 0.86,
        applies: |s| s.green_ratio() > 0.38 && s.green > s.red && s.green > s.blue,
    },
    Rule {
        label: ClassLabel::Yellowing,
        confidence: 0.80,
        applies: |s| s.brightness() > 160.0 && s.green_ratio() < 0.34,
    },
    Rule {
        label: ClassLabel::Mold,
        confidence: 0.78,
        applies: |s| s.blue > s.green && s.brightness() < 120.0,
    },
    Rule {
        label: ClassLabel::LeafSpot,
        confidence: 0.76,
        applies: |s| s.red > s.green && s.brightness() < 140.0,
    },
];

/// Label and confidence when no rule matches
const DEFAULT_RULE: (ClassLabel, f32) = (ClassLabel::PestDamage, 0.74);

/// Deterministic color-statistics classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify from the decision table applied to color statistics
    pub fn classify(&self, bytes: &[u8]) -> Result<Prediction> {
        let image = Contract::decode(bytes)?;
        let stats = ColorStats::from_image(&image);
        Ok(Self::decide(&stats))
    }

    /// Evaluate the decision table against precomputed statistics
    pub fn decide(stats: &ColorStats) -> Prediction {
        for rule in &DECISION_TABLE {
            if (rule.applies)(stats) {
                return Prediction {
                    label: rule.label,
                    confidence: rule.confidence,
                };
            }
        }
        Prediction {
            label: DEFAULT_RULE.0,
            confidence: DEFAULT_RULE.1,
        }
    }
}
