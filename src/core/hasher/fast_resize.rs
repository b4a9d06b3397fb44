//! SIMD-accelerated grayscale downscaling.
//!
//! Perceptual hashes only need a handful of pixels, so decoded images
//! are reduced to luma first and then shrunk with fast_image_resize.

use fast_image_resize::images::Image;
use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use crate::error::HashError;
use image::{DynamicImage, GrayImage};
use std::path::PathBuf;

fn resize_error(reason: String) -> HashError {
    HashError::Decode {
        path: PathBuf::new(),
        reason,
    }
}

/// Reusable resizer; one per worker thread
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Convert `image` to grayscale and scale it to exactly `width` x `height`
    pub fn resize_to_grayscale(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, HashError> {
        if width == 0 || height == 0 {
            return Err(resize_error(format!("invalid target size {}x{}", width, height)));
        }

        let gray = image.to_luma8();
        let (src_width, src_height) = gray.dimensions();
        if src_width == 0 || src_height == 0 {
            return Err(resize_error("image has no pixels".to_string()));
        }

        let src_image = Image::from_vec_u8(src_width, src_height, gray.into_raw(), PixelType::U8)
            .map_err(|e| resize_error(format!("invalid source buffer: {}", e)))?;
        let mut dst_image = Image::new(width, height, PixelType::U8);

        let options =
            ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| resize_error(format!("resize failed: {}", e)))?;

        GrayImage::from_raw(width, height, dst_image.into_vec())
            .ok_or_else(|| resize_error("resized buffer has the wrong length".to_string()))
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn gradient(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            let r = (x * 255 / width.max(1)) as u8;
            let g = (y * 255 / height.max(1)) as u8;
            Rgb([r, g, 0])
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn resize_produces_hash_grid() {
        let resized = FastResizer::new().resize_to_grayscale(&gradient(200, 100), 9, 8).unwrap();
        assert_eq!(resized.dimensions(), (9, 8));
    }

    #[test]
    fn upscaling_tiny_images_works() {
        let resized = FastResizer::new().resize_to_grayscale(&gradient(3, 2), 9, 8).unwrap();
        assert_eq!(resized.dimensions(), (9, 8));
    }

    #[test]
    fn zero_target_is_rejected() {
        let result = FastResizer::new().resize_to_grayscale(&gradient(10, 10), 0, 8);
        assert!(matches!(result, Err(HashError::Decode { .. })));
    }

    #[test]
    fn resizer_can_be_reused() {
        let mut resizer = FastResizer::new();
        let image = gradient(64, 64);
        let first = resizer.resize_to_grayscale(&image, 9, 8).unwrap();
        let second = resizer.resize_to_grayscale(&image, 9, 8).unwrap();
        assert_eq!(first, second);
    }
}
