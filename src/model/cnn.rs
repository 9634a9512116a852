//! CNN architecture for leaf-health classification.
//!
//! A compact convolutional backbone built with Burn: four conv blocks with
//! batch normalization and pooling, global average pooling, and a
//! fully-connected head whose final layer is sized to the number of
//! classes being trained.

use burn::{
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, MaxPool2d, MaxPool2dConfig},
        BatchNorm, BatchNormConfig, Dropout, DropoutConfig, Linear, LinearConfig, PaddingConfig2d,
        Relu,
    },
    tensor::{backend::Backend, Tensor},
};
use serde::{Deserialize, Serialize};

/// Width of the hidden fully-connected layer
const HIDDEN_UNITS: usize = 256;

/// Configuration for the [`LeafClassifier`] model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafClassifierConfig {
    /// Number of output classes
    pub num_classes: usize,
    /// Number of input channels (3 for RGB)
    pub in_channels: usize,
    /// Base number of convolutional filters, doubled per block
    pub base_filters: usize,
    /// Dropout rate for the classifier head
    pub dropout_rate: f64,
}

impl LeafClassifierConfig {
    /// Configuration sized to the given class count, defaults elsewhere
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            in_channels: 3,
            base_filters: 32,
            dropout_rate: 0.3,
        }
    }
}

/// A conv block: Conv2d, BatchNorm, ReLU, and optional MaxPool
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: Conv2d<B>,
    bn: BatchNorm<B, 2>,
    relu: Relu,
    pool: Option<MaxPool2d>,
}

impl<B: Backend> ConvBlock<B> {
    /// Create a new convolutional block
    pub fn new(
        in_channels: usize,
        out_channels: usize,
        kernel_size: usize,
        with_pool: bool,
        device: &B::Device,
    ) -> Self {
        let conv = Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
            .with_padding(PaddingConfig2d::Same)
            .init(device);

        let bn = BatchNormConfig::new(out_channels).init(device);

        let pool = if with_pool {
            Some(MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init())
        } else {
            None
        };

        Self {
            conv,
            bn,
            relu: Relu::new(),
            pool,
        }
    }

    /// Forward pass through the block
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(x);
        let x = self.bn.forward(x);
        let x = self.relu.forward(x);

        match &self.pool {
            Some(pool) => pool.forward(x),
            None => x,
        }
    }
}

/// Leaf-health classifier CNN.
///
/// Four convolutional blocks with doubling filter counts, global average
/// pooling, then a two-layer classifier head with dropout.
#[derive(Module, Debug)]
pub struct LeafClassifier<B: Backend> {
    conv1: ConvBlock<B>,
    conv2: ConvBlock<B>,
    conv3: ConvBlock<B>,
    conv4: ConvBlock<B>,

    global_pool: AdaptiveAvgPool2d,

    fc1: Linear<B>,
    dropout: Dropout,
    fc2: Linear<B>,
}

impl<B: Backend> LeafClassifier<B> {
    /// Create a new classifier from configuration
    pub fn new(config: &LeafClassifierConfig, device: &B::Device) -> Self {
        let base = config.base_filters;

        let conv1 = ConvBlock::new(config.in_channels, base, 3, true, device);
        let conv2 = ConvBlock::new(base, base * 2, 3, true, device);
        let conv3 = ConvBlock::new(base * 2, base * 4, 3, true, device);
        let conv4 = ConvBlock::new(base * 4, base * 8, 3, true, device);

        let global_pool = AdaptiveAvgPool2dConfig::new([1, 1]).init();

        let fc1 = LinearConfig::new(base * 8, HIDDEN_UNITS).init(device);
        let dropout = DropoutConfig::new(config.dropout_rate).init();
        let fc2 = LinearConfig::new(HIDDEN_UNITS, config.num_classes).init(device);

        Self {
            conv1,
            conv2,
            conv3,
            conv4,
            global_pool,
            fc1,
            dropout,
            fc2,
        }
    }

    /// Forward pass.
    ///
    /// Input shape [batch_size, 3, height, width], output logits
    /// [batch_size, num_classes].
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let x = self.conv1.forward(x);
        let x = self.conv2.forward(x);
        let x = self.conv3.forward(x);
        let x = self.conv4.forward(x);

        // [B, C, H, W] -> [B, C, 1, 1] -> [B, C]
        let x = self.global_pool.forward(x);
        let [batch_size, channels, _, _] = x.dims();
        let x = x.reshape([batch_size, channels]);

        let x = self.fc1.forward(x);
        let x = Relu::new().forward(x);
        let x = self.dropout.forward(x);
        self.fc2.forward(x)
    }

    /// Forward pass with softmax applied, for inference
    pub fn forward_softmax(&self, x: Tensor<B, 4>) -> Tensor<B, 2> {
        let logits = self.forward(x);
        burn::tensor::activation::softmax(logits, 1)
    }

    /// Width of the output layer, read from the actual weights.
    ///
    /// After loading a record this reflects the persisted shapes, which is
    /// what artifact validation must compare against the class count.
    pub fn output_width(&self) -> usize {
        self.fc2.weight.val().dims()[1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{default_device, DefaultBackend};

    #[test]
    fn test_output_shape_matches_class_count() {
        let device = default_device();
        let config = LeafClassifierConfig {
            base_filters: 4,
            ..LeafClassifierConfig::new(4)
        };
        let model = LeafClassifier::<DefaultBackend>::new(&config, &device);

        let input = Tensor::<DefaultBackend, 4>::zeros([2, 3, 64, 64], &device);
        let output = model.forward(input);

        assert_eq!(output.dims(), [2, 4]);
        assert_eq!(model.output_width(), 4);
    }

    #[test]
    fn test_softmax_outputs_distribution() {
        let device = default_device();
        let config = LeafClassifierConfig {
            base_filters: 2,
            ..LeafClassifierConfig::new(5)
        };
        let model = LeafClassifier::<DefaultBackend>::new(&config, &device);

        let input = Tensor::<DefaultBackend, 4>::ones([1, 3, 32, 32], &device);
        let probs: Vec<f32> = model
            .forward_softmax(input)
            .into_data()
            .to_vec()
            .unwrap();

        assert_eq!(probs.len(), 5);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4);
        assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
    }
}
