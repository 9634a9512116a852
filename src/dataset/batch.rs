//! Burn integration: in-memory items, dataset, and batching.
//!
//! Items are preprocessed through the shared [`Contract`] when loaded, so
//! the tensors the trainer sees are identical to what the classifier
//! produces at serving time. The batcher only stacks.

use burn::data::dataset::Dataset;
use burn::prelude::*;

use crate::dataset::loader::ImageSample;
use crate::preprocess::Contract;
use crate::utils::error::{LeafError, Result};

/// One image ready for batching: CHW floats plus its label index
#[derive(Clone, Debug)]
pub struct LeafItem {
    /// Preprocessed image data, CHW layout
    pub image: Vec<f32>,
    /// Dense label index
    pub label: usize,
}

impl LeafItem {
    /// Load and preprocess a sample from disk
    pub fn from_sample(sample: &ImageSample, contract: &Contract) -> Result<Self> {
        let bytes = std::fs::read(&sample.path)?;
        let image = contract
            .tensor_from_bytes(&bytes)
            .map_err(|e| LeafError::Dataset(format!("{:?}: {}", sample.path, e)))?;
        Ok(Self {
            image,
            label: sample.label,
        })
    }
}

/// An in-memory dataset of preprocessed items
#[derive(Clone, Debug)]
pub struct LeafBatchDataset {
    items: Vec<LeafItem>,
}

impl LeafBatchDataset {
    /// Preprocess every sample up front.
    ///
    /// A sample that fails to load fails the whole call: training over a
    /// silently shrunken split would skew the class distribution.
    pub fn preload(samples: &[ImageSample], contract: &Contract) -> Result<Self> {
        let items = samples
            .iter()
            .map(|s| LeafItem::from_sample(s, contract))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { items })
    }

    /// Build directly from items (tests, synthetic data)
    pub fn from_items(items: Vec<LeafItem>) -> Self {
        Self { items }
    }
}

impl Dataset<LeafItem> for LeafBatchDataset {
    fn get(&self, index: usize) -> Option<LeafItem> {
        self.items.get(index).cloned()
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// A batch of leaf images for training or evaluation
#[derive(Clone, Debug)]
pub struct LeafBatch<B: Backend> {
    /// Images with shape [batch_size, 3, size, size]
    pub images: Tensor<B, 4>,
    /// Labels with shape [batch_size]
    pub targets: Tensor<B, 1, Int>,
}

/// Stacks preprocessed items into tensors on a device
#[derive(Clone, Debug)]
pub struct LeafBatcher<B: Backend> {
    device: B::Device,
    size: usize,
}

impl<B: Backend> LeafBatcher<B> {
    /// Create a batcher for the given device and contract resolution
    pub fn new(device: B::Device, contract: &Contract) -> Self {
        Self {
            device,
            size: contract.size as usize,
        }
    }

    /// Stack items into one batch
    pub fn batch(&self, items: Vec<LeafItem>) -> LeafBatch<B> {
        let batch_size = items.len();

        let images_data: Vec<f32> = items.iter().flat_map(|item| item.image.clone()).collect();
        let images = Tensor::<B, 4>::from_floats(
            TensorData::new(images_data, [batch_size, 3, self.size, self.size]),
            &self.device,
        );

        let targets_data: Vec<i64> = items.iter().map(|item| item.label as i64).collect();
        let targets = Tensor::<B, 1, Int>::from_data(
            TensorData::new(targets_data, [batch_size]),
            &self.device,
        );

        LeafBatch { images, targets }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{default_device, DefaultBackend};

    fn item(label: usize, size: usize, fill: f32) -> LeafItem {
        LeafItem {
            image: vec![fill; 3 * size * size],
            label,
        }
    }

    #[test]
    fn test_dataset_get_and_len() {
        let dataset = LeafBatchDataset::from_items(vec![item(0, 4, 0.1), item(2, 4, 0.2)]);
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.get(1).unwrap().label, 2);
        assert!(dataset.get(2).is_none());
    }

    #[test]
    fn test_batch_shapes() {
        let contract = Contract {
            size: 4,
            ..Contract::default()
        };
        let batcher = LeafBatcher::<DefaultBackend>::new(default_device(), &contract);

        let batch = batcher.batch(vec![item(0, 4, 0.0), item(1, 4, 1.0), item(3, 4, -1.0)]);
        assert_eq!(batch.images.dims(), [3, 3, 4, 4]);
        assert_eq!(batch.targets.dims(), [3]);

        let targets: Vec<i64> = batch.targets.into_data().to_vec().unwrap();
        assert_eq!(targets, vec![0, 1, 3]);
    }
}
