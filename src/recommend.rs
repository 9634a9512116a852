//! Static care-recommendation table, keyed by class label.
//!
//! Bundled with the classifier so a diagnosis can carry actionable tips
//! without consulting any external service. Kept in sync with
//! [`ClassLabel`]'s raw-name variants.

use crate::labels::ClassLabel;

/// Care tips for a diagnosed condition
pub fn care_tips(label: ClassLabel) -> &'static [&'static str] {
    match label {
        ClassLabel::Healthy => &[
            "The leaf looks healthy; continue the usual care routine.",
            "Keep watering even: avoid both drying out and waterlogging.",
            "Inspect the plant periodically to catch problems early.",
        ],
        ClassLabel::LeafSpot => &[
            "Remove affected leaves and dispose of them away from the plant.",
            "Lower humidity and improve air circulation around the foliage.",
            "Apply a fungicide according to its label if spots keep spreading.",
        ],
        ClassLabel::Yellowing => &[
            "Check the watering schedule and make sure the pot drains well.",
            "Check nutrition; nitrogen or iron deficiency is a common cause.",
            "Inspect the plant for viruses and sap-sucking pests.",
        ],
        ClassLabel::PestDamage => &[
            "Inspect the underside of the leaves for insects and webbing.",
            "Treat with a soap solution or an insecticide if needed.",
            "Isolate the plant from other crops until the pests are gone.",
        ],
        ClassLabel::Mold => &[
            "Remove mold-covered leaves and reduce ambient humidity.",
            "Water at the base of the plant, keeping the foliage dry.",
            "Increase spacing and airflow; treat with a fungicide if it persists.",
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_label_has_tips() {
        for label in ClassLabel::ALL {
            assert!(!care_tips(label).is_empty());
        }
    }

    #[test]
    fn test_tips_are_distinct_per_label() {
        assert_ne!(care_tips(ClassLabel::Healthy), care_tips(ClassLabel::Mold));
    }
}
