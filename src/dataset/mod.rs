//! Dataset handling: splitting, loading, and batching.
//!
//! The splitter turns a raw class-folder tree into a reproducible
//! `root/{train,val}/{label}/` layout; the loader reads that layout back
//! and derives the dense label/index mapping; the batch module preloads
//! samples through the shared preprocessing contract for Burn.

pub mod batch;
pub mod loader;
pub mod split;

pub use batch::{LeafBatch, LeafBatchDataset, LeafBatcher, LeafItem};
pub use loader::{DatasetStats, ImageSample, LeafDataset};
pub use split::{
    default_mapping, split_dataset, ClassMapping, ClassSplitStat, SplitConfig, SplitReport,
};
