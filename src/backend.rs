//! Backend selection for the Burn framework.
//!
//! Training and inference both run on the NdArray (CPU) backend; training
//! wraps it in `Autodiff` for gradient tracking. Inference uses the plain
//! backend, so no gradient state exists on that path.

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::{Autodiff, NdArray};

/// Backend used for inference (no autodiff)
pub type DefaultBackend = NdArray<f32>;

/// Backend used for training
pub type TrainingBackend = Autodiff<DefaultBackend>;

/// Get the default device
pub fn default_device() -> NdArrayDevice {
    NdArrayDevice::Cpu
}

/// Human-readable name for the current backend
pub fn backend_name() -> &'static str {
    "NdArray (CPU)"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_device() {
        assert_eq!(default_device(), NdArrayDevice::Cpu);
    }

    #[test]
    fn test_backend_name() {
        assert!(!backend_name().is_empty());
    }
}
