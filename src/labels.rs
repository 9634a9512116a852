//! Canonical leaf-health classes and the label/index bijection.
//!
//! Predictions travel between training and inference as an index into the
//! class list persisted with the checkpoint, so the mapping must be dense,
//! contiguous from zero, and identical on both sides. [`ClassIndex`] holds
//! that mapping as a typed bijection and is validated at artifact load time.

use serde::{Deserialize, Serialize};

use crate::utils::error::{LeafError, Result};

/// One leaf-health category the pipeline can output.
///
/// `raw_name` is the on-disk form used for dataset folders and checkpoint
/// serialization; `display_name` is the presentation form returned to
/// callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClassLabel {
    Healthy,
    #[serde(rename = "Leaf_spot")]
    LeafSpot,
    Yellowing,
    #[serde(rename = "Pest_damage")]
    PestDamage,
    Mold,
}

impl ClassLabel {
    /// Every label the pipeline knows about
    pub const ALL: [ClassLabel; 5] = [
        ClassLabel::Healthy,
        ClassLabel::LeafSpot,
        ClassLabel::Yellowing,
        ClassLabel::PestDamage,
        ClassLabel::Mold,
    ];

    /// Raw name as used for dataset folders and serialization
    pub fn raw_name(&self) -> &'static str {
        match self {
            ClassLabel::Healthy => "Healthy",
            ClassLabel::LeafSpot => "Leaf_spot",
            ClassLabel::Yellowing => "Yellowing",
            ClassLabel::PestDamage => "Pest_damage",
            ClassLabel::Mold => "Mold",
        }
    }

    /// Human-readable name for presentation
    pub fn display_name(&self) -> &'static str {
        match self {
            ClassLabel::Healthy => "Healthy",
            ClassLabel::LeafSpot => "Leaf spot",
            ClassLabel::Yellowing => "Yellowing",
            ClassLabel::PestDamage => "Pest damage",
            ClassLabel::Mold => "Mold",
        }
    }

    /// Parse a raw name back into a label
    pub fn from_raw_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|l| l.raw_name() == name)
    }
}

impl std::fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// A dense, order-stable bijection between [`ClassLabel`]s and indices
/// `[0, N)`.
///
/// The index of a label is its position in the underlying list, so the
/// mapping is contiguous by construction. Construction rejects empty and
/// duplicated class lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassIndex {
    classes: Vec<ClassLabel>,
}

impl ClassIndex {
    /// Build a bijection from an ordered class list
    pub fn new(classes: Vec<ClassLabel>) -> Result<Self> {
        if classes.is_empty() {
            return Err(LeafError::Dataset("class list is empty".to_string()));
        }
        for (i, label) in classes.iter().enumerate() {
            if classes[..i].contains(label) {
                return Err(LeafError::Dataset(format!(
                    "duplicate class '{}' in class list",
                    label.raw_name()
                )));
            }
        }
        Ok(Self { classes })
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the index is empty (never true for a constructed value)
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Dense index for a label, if present
    pub fn index_of(&self, label: ClassLabel) -> Option<usize> {
        self.classes.iter().position(|&l| l == label)
    }

    /// Label at a dense index, if in range
    pub fn label_at(&self, index: usize) -> Option<ClassLabel> {
        self.classes.get(index).copied()
    }

    /// The ordered class list
    pub fn labels(&self) -> &[ClassLabel] {
        &self.classes
    }

    /// Consume into the ordered class list
    pub fn into_labels(self) -> Vec<ClassLabel> {
        self.classes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_name_round_trip() {
        for label in ClassLabel::ALL {
            assert_eq!(ClassLabel::from_raw_name(label.raw_name()), Some(label));
        }
        assert_eq!(ClassLabel::from_raw_name("Rust_disease"), None);
    }

    #[test]
    fn test_display_names() {
        assert_eq!(ClassLabel::LeafSpot.display_name(), "Leaf spot");
        assert_eq!(ClassLabel::PestDamage.display_name(), "Pest damage");
        assert_eq!(ClassLabel::Healthy.to_string(), "Healthy");
    }

    #[test]
    fn test_serde_uses_raw_names() {
        let json = serde_json::to_string(&ClassLabel::LeafSpot).unwrap();
        assert_eq!(json, "\"Leaf_spot\"");
        let back: ClassLabel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ClassLabel::LeafSpot);
    }

    #[test]
    fn test_class_index_bijection() {
        let index = ClassIndex::new(vec![
            ClassLabel::Healthy,
            ClassLabel::LeafSpot,
            ClassLabel::PestDamage,
            ClassLabel::Yellowing,
        ])
        .unwrap();

        assert_eq!(index.len(), 4);
        for label in index.labels().to_vec() {
            let i = index.index_of(label).unwrap();
            assert_eq!(index.label_at(i), Some(label));
        }
        assert!(index.index_of(ClassLabel::Mold).is_none());
        assert!(index.label_at(4).is_none());
    }

    #[test]
    fn test_class_index_rejects_empty() {
        assert!(ClassIndex::new(Vec::new()).is_err());
    }

    #[test]
    fn test_class_index_rejects_duplicates() {
        let result = ClassIndex::new(vec![ClassLabel::Healthy, ClassLabel::Healthy]);
        assert!(result.is_err());
    }
}
