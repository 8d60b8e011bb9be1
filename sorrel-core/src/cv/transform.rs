// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use fast_image_resize;
use fast_image_resize::{FilterType, PixelType, images::Image};
use image::DynamicImage;

use crate::error::SorrelError;

/// Resize a 2D u8 image using the SIMD-accelerated fast-image-resize crate
///
/// # Arguments
///
/// * `source` - A DynamicImage with u8 subpixel type
/// * `new_width` - New width following resizing
/// * `new_height` - New height following resizing
/// * `pixel_type` - RGB or Luma pixel type
pub fn resize_bilinear_fast(
    source: &DynamicImage,
    new_width: u32,
    new_height: u32,
    pixel_type: PixelType,
) -> Result<Vec<u8>, SorrelError> {
    let mut destination = Image::new(new_width, new_height, pixel_type);

    let mut resizer = fast_image_resize::Resizer::new();
    let option = fast_image_resize::ResizeOptions {
        algorithm: fast_image_resize::ResizeAlg::Convolution(FilterType::Bilinear),
        cropping: fast_image_resize::SrcCropping::None,
        mul_div_alpha: false,
    };

    resizer
        .resize(source, &mut destination, &option)
        .map_err(|_| SorrelError::ImageError("Failed to resize image."))?;

    Ok(destination.into_vec())
}

/// Dimensions (height, width) after scaling the longest side to `target`
///
/// # Examples
///
/// ```
/// use sorrel_core::cv::transform::resize_longest_side;
///
/// assert_eq!(resize_longest_side(512, 256, 1024), (1024, 512));
/// assert_eq!(resize_longest_side(300, 600, 1024), (512, 1024));
/// ```
pub fn resize_longest_side(height: u32, width: u32, target: u32) -> (u32, u32) {
    if height < width {
        (((target as u64 * height as u64) / width as u64).max(1) as u32, target)
    } else {
        (target, ((target as u64 * width as u64) / height as u64).max(1) as u32)
    }
}

#[cfg(test)]
mod test {

    use super::*;
    use image::RgbImage;

    #[test]
    fn test_resize_fast_rgb() {
        let source = DynamicImage::ImageRgb8(RgbImage::new(10, 6));
        let resized = resize_bilinear_fast(&source, 5, 3, PixelType::U8x3).unwrap();
        assert_eq!(resized.len(), 5 * 3 * 3);
    }

    #[test]
    fn test_resize_longest_side_square() {
        assert_eq!(resize_longest_side(100, 100, 1024), (1024, 1024));
        assert_eq!(resize_longest_side(3000, 1, 1024), (1024, 1));
    }
}
