//! The preprocessing contract shared by training and inference.
//!
//! Both the trainer's batch pipeline and the classifier call through one
//! [`Contract`] value, so the resolution, channel order, and normalization
//! applied at serving time are the same ones the model was trained with.
//! Divergence here degrades accuracy silently, which is why the definition
//! lives in exactly one place.

use image::{imageops::FilterType, DynamicImage};
use serde::{Deserialize, Serialize};

use crate::utils::error::{LeafError, Result};

/// Square resolution the model consumes
pub const MODEL_INPUT_SIZE: u32 = 224;

/// ImageNet normalization mean values (RGB)
const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet normalization std values (RGB)
const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Preprocessing parameters: target resolution and per-channel
/// normalization. Persisted into the checkpoint artifact so a loaded model
/// always serves with the transform it was trained under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    /// Target square resolution
    pub size: u32,
    /// Per-channel normalization mean (RGB, applied after scaling to [0,1])
    pub mean: [f32; 3],
    /// Per-channel normalization std (RGB)
    pub std: [f32; 3],
}

impl Default for Contract {
    fn default() -> Self {
        Self {
            size: MODEL_INPUT_SIZE,
            mean: IMAGENET_MEAN,
            std: IMAGENET_STD,
        }
    }
}

impl Contract {
    /// Length of the tensor produced for one image (CHW)
    pub fn tensor_len(&self) -> usize {
        3 * (self.size as usize) * (self.size as usize)
    }

    /// Decode raw bytes into an image
    pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
        image::load_from_memory(bytes).map_err(|e| LeafError::Decode(e.to_string()))
    }

    /// Resize and normalize an image into a CHW float tensor.
    ///
    /// Pixels are scaled to [0,1] and then normalized per channel. Layout is
    /// all R values, then all G values, then all B values.
    pub fn tensor_from_image(&self, image: &DynamicImage) -> Vec<f32> {
        let rgb = image
            .resize_exact(self.size, self.size, FilterType::Triangle)
            .to_rgb8();

        let num_pixels = (self.size as usize) * (self.size as usize);
        let mut tensor = vec![0.0f32; 3 * num_pixels];

        for (i, pixel) in rgb.pixels().enumerate() {
            for c in 0..3 {
                tensor[c * num_pixels + i] =
                    (pixel[c] as f32 / 255.0 - self.mean[c]) / self.std[c];
            }
        }

        tensor
    }

    /// Decode, resize, and normalize raw image bytes in one step
    pub fn tensor_from_bytes(&self, bytes: &[u8]) -> Result<Vec<f32>> {
        let image = Self::decode(bytes)?;
        Ok(self.tensor_from_image(&image))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_default_contract_matches_model_input() {
        let contract = Contract::default();
        assert_eq!(contract.size, 224);
        assert_eq!(contract.tensor_len(), 3 * 224 * 224);
    }

    #[test]
    fn test_tensor_shape_and_layout() {
        let contract = Contract {
            size: 8,
            ..Contract::default()
        };
        let tensor = contract
            .tensor_from_bytes(&png_bytes(32, 16, [255, 0, 0]))
            .unwrap();
        assert_eq!(tensor.len(), contract.tensor_len());

        // Uniform red input: every value within a channel plane is identical
        let expected_r = (1.0 - contract.mean[0]) / contract.std[0];
        let expected_g = (0.0 - contract.mean[1]) / contract.std[1];
        assert!(tensor[..64].iter().all(|&v| (v - expected_r).abs() < 1e-4));
        assert!(tensor[64..128].iter().all(|&v| (v - expected_g).abs() < 1e-4));
    }

    #[test]
    fn test_decode_rejects_non_image_bytes() {
        let result = Contract::decode(b"definitely not an image");
        assert!(matches!(result, Err(LeafError::Decode(_))));
    }
}
