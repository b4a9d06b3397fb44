//! Difference Hash (dHash).
//!
//! 1. Convert to grayscale and resize to 9x8
//! 2. Compare each pixel to the one on its right
//! 3. Set the bit when the left pixel is brighter
//!
//! The 64 comparisons are packed row by row, first comparison in the
//! most significant bit.

use super::fast_resize::FastResizer;
use crate::error::HashError;
use image::DynamicImage;

const HASH_SIZE: u32 = 8;

/// 64-bit dHash of a decoded image
pub fn difference_hash(image: &DynamicImage) -> Result<u64, HashError> {
    difference_hash_with(&mut FastResizer::new(), image)
}

/// Same as [`difference_hash`] but reuses an existing resizer
pub fn difference_hash_with(
    resizer: &mut FastResizer,
    image: &DynamicImage,
) -> Result<u64, HashError> {
    // One extra column so every cell has a right-hand neighbour
    let gray = resizer.resize_to_grayscale(image, HASH_SIZE + 1, HASH_SIZE)?;

    let mut hash = 0u64;
    for y in 0..HASH_SIZE {
        for x in 0..HASH_SIZE {
            let left = gray.get_pixel(x, y)[0];
            let right = gray.get_pixel(x + 1, y)[0];
            hash <<= 1;
            if left > right {
                hash |= 1;
            }
        }
    }

    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn solid(value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(100, 100, |_, _| Rgb([value; 3])))
    }

    fn horizontal_gradient(bright_on_left: bool) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(100, 100, |x, _| {
            let v = (x * 255 / 99) as u8;
            let v = if bright_on_left { 255 - v } else { v };
            Rgb([v; 3])
        }))
    }

    #[test]
    fn solid_image_hashes_to_zero() {
        assert_eq!(difference_hash(&solid(128)).unwrap(), 0);
    }

    #[test]
    fn brightening_to_the_right_sets_no_bits() {
        assert_eq!(difference_hash(&horizontal_gradient(false)).unwrap(), 0);
    }

    #[test]
    fn darkening_to_the_right_sets_every_bit() {
        assert_eq!(difference_hash(&horizontal_gradient(true)).unwrap(), u64::MAX);
    }

    #[test]
    fn hash_is_deterministic() {
        let image = horizontal_gradient(true);
        let mut resizer = FastResizer::new();
        assert_eq!(
            difference_hash_with(&mut resizer, &image).unwrap(),
            difference_hash_with(&mut resizer, &image).unwrap()
        );
    }

    #[test]
    fn resized_copy_keeps_its_hash() {
        let original = horizontal_gradient(true);
        let larger = original.resize_exact(400, 300, image::imageops::FilterType::Triangle);
        assert_eq!(
            difference_hash(&original).unwrap(),
            difference_hash(&larger).unwrap()
        );
    }
}
