//! Model architecture built with Burn.

pub mod cnn;

pub use cnn::{ConvBlock, LeafClassifier, LeafClassifierConfig};
