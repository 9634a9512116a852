//! Dataset splitting: map source class folders onto canonical labels and
//! partition each class into train/validation sets.
//!
//! The split is a deterministic shuffle-then-cut: files are collected in
//! sorted order, shuffled with a seeded ChaCha8 RNG, and cut at the train
//! fraction. Re-running over an unchanged source tree with the same seed
//! reproduces the same file sets. Pre-existing output directories are
//! removed first, so the operation is idempotent.

use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::labels::ClassLabel;
use crate::utils::error::{LeafError, Result};

/// Image extensions the splitter collects (lowercase)
const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Configuration for dataset splitting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of each class cut into the train set
    pub train_fraction: f64,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: 0.8,
            seed: 42,
        }
    }
}

/// Mapping from a source subfolder name to its canonical label.
///
/// Source subfolders absent from the mapping are ignored entirely.
pub type ClassMapping = Vec<(String, ClassLabel)>;

/// The default source mapping for the tomato subset of PlantVillage
pub fn default_mapping() -> ClassMapping {
    vec![
        ("Tomato_healthy".to_string(), ClassLabel::Healthy),
        ("Tomato_Septoria_leaf_spot".to_string(), ClassLabel::LeafSpot),
        (
            "Tomato__Tomato_YellowLeaf__Curl_Virus".to_string(),
            ClassLabel::Yellowing,
        ),
        (
            "Tomato_Spider_mites_Two_spotted_spider_mite".to_string(),
            ClassLabel::PestDamage,
        ),
    ]
}

/// Per-class outcome of a split run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassSplitStat {
    pub label: ClassLabel,
    pub total: usize,
    pub train: usize,
    pub val: usize,
}

/// Report for one split run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitReport {
    /// Resolved directory the class folders were read from
    pub source: PathBuf,
    /// Per-class file counts
    pub classes: Vec<ClassSplitStat>,
    /// Mapped folders that were missing on disk and skipped
    pub skipped: Vec<String>,
    /// Configuration used for the run
    pub config: SplitConfig,
}

impl SplitReport {
    /// Total number of files copied
    pub fn total_files(&self) -> usize {
        self.classes.iter().map(|c| c.total).sum()
    }

    /// Persist the report next to the split tree
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LeafError::Serialization(e.to_string()))?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl std::fmt::Display for SplitReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dataset split:")?;
        writeln!(f, "  Source: {:?}", self.source)?;
        for stat in &self.classes {
            writeln!(
                f,
                "  {:12} total {:5} | train {:5} | val {:5}",
                stat.label.raw_name(),
                stat.total,
                stat.train,
                stat.val
            )?;
        }
        for folder in &self.skipped {
            writeln!(f, "  skipped: {} (folder not found)", folder)?;
        }
        Ok(())
    }
}

/// Split a source tree into `output_root/{train,val}/{label}/`.
///
/// For each mapped subfolder that exists: collect image files, shuffle
/// deterministically, cut at the train fraction, and copy each file into
/// its destination. Mapped folders missing on disk are reported and
/// skipped; failing to locate any class folders at all is fatal.
pub fn split_dataset(
    source_root: &Path,
    mapping: &ClassMapping,
    output_root: &Path,
    config: &SplitConfig,
) -> Result<SplitReport> {
    let source = locate_class_root(source_root)?;
    info!("splitting dataset from {:?}", source);

    // Remove stale outputs so runs do not mix
    for subset in ["train", "val"] {
        let dir = output_root.join(subset);
        if dir.exists() {
            fs::remove_dir_all(&dir)?;
        }
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut classes = Vec::new();
    let mut skipped = Vec::new();

    for (folder, label) in mapping {
        let class_dir = source.join(folder);
        if !class_dir.is_dir() {
            warn!("{}", LeafError::ClassFolderMissing(folder.clone()));
            skipped.push(folder.clone());
            continue;
        }

        let mut files = collect_image_files(&class_dir);
        // Sorted before shuffling so the cut depends only on the seed,
        // not on directory enumeration order
        files.sort();
        files.shuffle(&mut rng);

        let cut = (files.len() as f64 * config.train_fraction) as usize;
        let (train_files, val_files) = files.split_at(cut);

        for (subset, subset_files) in [("train", train_files), ("val", val_files)] {
            let out_dir = output_root.join(subset).join(label.raw_name());
            fs::create_dir_all(&out_dir)?;
            for src in subset_files {
                let name = src
                    .file_name()
                    .ok_or_else(|| LeafError::Dataset(format!("unnamed file {:?}", src)))?;
                fs::copy(src, out_dir.join(name))?;
            }
        }

        info!(
            "{}: total {} | train {} | val {}",
            label.raw_name(),
            files.len(),
            train_files.len(),
            val_files.len()
        );

        classes.push(ClassSplitStat {
            label: *label,
            total: files.len(),
            train: train_files.len(),
            val: val_files.len(),
        });
    }

    Ok(SplitReport {
        source,
        classes,
        skipped,
        config: config.clone(),
    })
}

/// Find the directory that actually contains the class folders.
///
/// Datasets frequently arrive nested one or two levels deep after
/// extraction, so the root itself is checked first and then its
/// subdirectories, breadth enough for common archive layouts.
fn locate_class_root(base: &Path) -> Result<PathBuf> {
    if has_class_directories(base) {
        return Ok(base.to_path_buf());
    }

    for entry in WalkDir::new(base)
        .min_depth(1)
        .max_depth(3)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if entry.file_type().is_dir() && has_class_directories(entry.path()) {
            return Ok(entry.path().to_path_buf());
        }
    }

    Err(LeafError::DatasetNotFound(base.to_path_buf()))
}

/// Whether a directory contains at least one subdirectory with images
fn has_class_directories(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };

    entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .any(|e| !collect_image_files(&e.path()).is_empty())
}

/// Collect image files directly inside a directory
fn collect_image_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.path().to_path_buf())
        .filter(|p| {
            p.extension()
                .and_then(|e| e.to_str())
                .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn make_source(classes: &[(&str, usize)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (folder, count) in classes {
            let class_dir = dir.path().join(folder);
            fs::create_dir_all(&class_dir).unwrap();
            for i in 0..*count {
                fs::write(class_dir.join(format!("img_{:03}.jpg", i)), b"fake").unwrap();
            }
        }
        dir
    }

    fn list_files(dir: &Path) -> BTreeSet<String> {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .map(|e| {
                e.path()
                    .strip_prefix(dir)
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .collect()
    }

    fn tomato_mapping() -> ClassMapping {
        vec![
            ("Tomato_healthy".to_string(), ClassLabel::Healthy),
            ("Tomato_Septoria_leaf_spot".to_string(), ClassLabel::LeafSpot),
        ]
    }

    #[test]
    fn test_split_ratio_and_partition() {
        let source = make_source(&[("Tomato_healthy", 10), ("Tomato_Septoria_leaf_spot", 7)]);
        let output = TempDir::new().unwrap();

        let report = split_dataset(
            source.path(),
            &tomato_mapping(),
            output.path(),
            &SplitConfig::default(),
        )
        .unwrap();

        assert_eq!(report.total_files(), 17);
        for stat in &report.classes {
            // |train| = floor(0.8 * n), train + val = n
            assert_eq!(stat.train, (stat.total as f64 * 0.8) as usize);
            assert_eq!(stat.train + stat.val, stat.total);
        }

        let healthy = report
            .classes
            .iter()
            .find(|c| c.label == ClassLabel::Healthy)
            .unwrap();
        assert_eq!((healthy.train, healthy.val), (8, 2));

        // Train and val are disjoint per class
        let train = list_files(&output.path().join("train").join("Healthy"));
        let val = list_files(&output.path().join("val").join("Healthy"));
        assert!(train.is_disjoint(&val));
        assert_eq!(train.len() + val.len(), 10);
    }

    #[test]
    fn test_split_is_deterministic() {
        let source = make_source(&[("Tomato_healthy", 20), ("Tomato_Septoria_leaf_spot", 15)]);
        let out_a = TempDir::new().unwrap();
        let out_b = TempDir::new().unwrap();
        let config = SplitConfig::default();

        split_dataset(source.path(), &tomato_mapping(), out_a.path(), &config).unwrap();
        split_dataset(source.path(), &tomato_mapping(), out_b.path(), &config).unwrap();

        assert_eq!(list_files(out_a.path()), list_files(out_b.path()));
    }

    #[test]
    fn test_rerun_replaces_previous_output() {
        let source = make_source(&[("Tomato_healthy", 5)]);
        let output = TempDir::new().unwrap();
        let mapping = vec![("Tomato_healthy".to_string(), ClassLabel::Healthy)];

        // Plant a stale file where the train tree will go
        let stale = output.path().join("train").join("Old_class");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("stale.jpg"), b"stale").unwrap();

        split_dataset(source.path(), &mapping, output.path(), &SplitConfig::default()).unwrap();
        assert!(!output.path().join("train").join("Old_class").exists());
    }

    #[test]
    fn test_missing_class_folder_is_skipped_not_fatal() {
        let source = make_source(&[("Tomato_healthy", 4)]);
        let output = TempDir::new().unwrap();
        let mut mapping = tomato_mapping();
        mapping.push(("Tomato_Leaf_Mold".to_string(), ClassLabel::Mold));

        let report =
            split_dataset(source.path(), &mapping, output.path(), &SplitConfig::default()).unwrap();

        assert_eq!(report.classes.len(), 1);
        assert!(report.skipped.contains(&"Tomato_Septoria_leaf_spot".to_string()));
        assert!(report.skipped.contains(&"Tomato_Leaf_Mold".to_string()));
    }

    #[test]
    fn test_unmapped_folders_are_ignored() {
        let source = make_source(&[("Tomato_healthy", 4), ("Potato___healthy", 4)]);
        let output = TempDir::new().unwrap();
        let mapping = vec![("Tomato_healthy".to_string(), ClassLabel::Healthy)];

        let report =
            split_dataset(source.path(), &mapping, output.path(), &SplitConfig::default()).unwrap();

        assert_eq!(report.total_files(), 4);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_nested_source_root_is_located() {
        let outer = TempDir::new().unwrap();
        let nested = outer.path().join("PlantVillage").join("PlantVillage");
        let class_dir = nested.join("Tomato_healthy");
        fs::create_dir_all(&class_dir).unwrap();
        fs::write(class_dir.join("a.png"), b"fake").unwrap();

        let output = TempDir::new().unwrap();
        let mapping = vec![("Tomato_healthy".to_string(), ClassLabel::Healthy)];
        let report =
            split_dataset(outer.path(), &mapping, output.path(), &SplitConfig::default()).unwrap();

        assert_eq!(report.source, nested);
        assert_eq!(report.total_files(), 1);
    }

    #[test]
    fn test_no_class_folders_anywhere_is_fatal() {
        let empty = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();

        let result = split_dataset(
            empty.path(),
            &default_mapping(),
            output.path(),
            &SplitConfig::default(),
        );
        assert!(matches!(result, Err(LeafError::DatasetNotFound(_))));
    }

    #[test]
    fn test_non_image_files_are_not_collected() {
        let source = make_source(&[("Tomato_healthy", 3)]);
        let class_dir = source.path().join("Tomato_healthy");
        fs::write(class_dir.join("notes.txt"), b"not an image").unwrap();
        fs::write(class_dir.join("photo.JPG"), b"fake").unwrap();

        let files = collect_image_files(&class_dir);
        assert_eq!(files.len(), 4); // 3 seeded + uppercase JPG, txt excluded
    }
}
