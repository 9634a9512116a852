//! Loader for a split dataset tree.
//!
//! Reads `root/{train,val}/{label}/*` as produced by the splitter. The
//! label/index mapping is derived from the train split's folder names in
//! sorted order; the validation split must use the same class set, since a
//! checkpoint trained over a miscounted class list would be meaningless.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::labels::{ClassIndex, ClassLabel};
use crate::utils::error::{LeafError, Result};

/// A single labeled image sample in a split tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageSample {
    /// Path to the image file
    pub path: PathBuf,
    /// Dense label index into the dataset's class list
    pub label: usize,
    /// Canonical class
    pub class: ClassLabel,
}

/// A split dataset with its label/index mapping
#[derive(Debug, Clone)]
pub struct LeafDataset {
    /// Root of the split tree
    pub root: PathBuf,
    /// Train samples
    pub train: Vec<ImageSample>,
    /// Validation samples
    pub val: Vec<ImageSample>,
    /// Bijection derived from the train split's sorted folder names
    pub classes: ClassIndex,
}

impl LeafDataset {
    /// Open a split tree at `root/{train,val}/{label}/`
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        let train_dir = root.join("train");
        let val_dir = root.join("val");

        if !train_dir.is_dir() {
            return Err(LeafError::Dataset(format!(
                "no train directory under {:?}",
                root
            )));
        }

        // Sorted folder names define the dense index range
        let mut class_names = class_folder_names(&train_dir)?;
        class_names.sort();

        let mut labels = Vec::with_capacity(class_names.len());
        for name in &class_names {
            let label = ClassLabel::from_raw_name(name).ok_or_else(|| {
                LeafError::Dataset(format!("unknown class folder '{}' in train split", name))
            })?;
            labels.push(label);
        }
        let classes = ClassIndex::new(labels)?;

        let train = collect_samples(&train_dir, &classes)?;
        let val = if val_dir.is_dir() {
            collect_samples(&val_dir, &classes)?
        } else {
            Vec::new()
        };

        info!(
            "loaded dataset from {:?}: {} classes, {} train, {} val",
            root,
            classes.len(),
            train.len(),
            val.len()
        );

        Ok(Self {
            root,
            train,
            val,
            classes,
        })
    }

    /// Number of classes
    pub fn num_classes(&self) -> usize {
        self.classes.len()
    }

    /// Per-class sample counts for the train and validation splits
    pub fn stats(&self) -> DatasetStats {
        let mut train_counts = vec![0usize; self.classes.len()];
        let mut val_counts = vec![0usize; self.classes.len()];
        for sample in &self.train {
            train_counts[sample.label] += 1;
        }
        for sample in &self.val {
            val_counts[sample.label] += 1;
        }

        DatasetStats {
            classes: self.classes.labels().to_vec(),
            train_counts,
            val_counts,
        }
    }
}

/// Per-class counts for a split tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetStats {
    pub classes: Vec<ClassLabel>,
    pub train_counts: Vec<usize>,
    pub val_counts: Vec<usize>,
}

impl DatasetStats {
    pub fn total_train(&self) -> usize {
        self.train_counts.iter().sum()
    }

    pub fn total_val(&self) -> usize {
        self.val_counts.iter().sum()
    }
}

impl std::fmt::Display for DatasetStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Dataset statistics:")?;
        writeln!(f, "  Classes: {}", self.classes.len())?;
        for (i, class) in self.classes.iter().enumerate() {
            writeln!(
                f,
                "  {:3}. {:12} train {:5} | val {:5}",
                i,
                class.raw_name(),
                self.train_counts[i],
                self.val_counts[i]
            )?;
        }
        writeln!(
            f,
            "  Total: train {} | val {}",
            self.total_train(),
            self.total_val()
        )
    }
}

/// Names of subdirectories directly under a split directory
fn class_folder_names(dir: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    Ok(names)
}

/// Collect samples from `dir/{label}/*`, resolving labels via `classes`
fn collect_samples(dir: &Path, classes: &ClassIndex) -> Result<Vec<ImageSample>> {
    let mut samples = Vec::new();

    let mut names = class_folder_names(dir)?;
    names.sort();

    for name in names {
        let class = ClassLabel::from_raw_name(&name).ok_or_else(|| {
            LeafError::Dataset(format!("unknown class folder '{}' in {:?}", name, dir))
        })?;
        let label = classes.index_of(class).ok_or_else(|| {
            LeafError::Dataset(format!(
                "class '{}' present in {:?} but absent from the train split",
                name, dir
            ))
        })?;

        let class_dir = dir.join(&name);
        let mut files: Vec<PathBuf> = WalkDir::new(&class_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .map(|e| e.path().to_path_buf())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| {
                        let e = e.to_lowercase();
                        e == "jpg" || e == "jpeg" || e == "png"
                    })
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        debug!("class '{}' (label {}): {} files", name, label, files.len());

        samples.extend(files.into_iter().map(|path| ImageSample {
            path,
            label,
            class,
        }));
    }

    Ok(samples)
}
