// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::path::Path;

use fast_image_resize::PixelType;
use image::{DynamicImage, RgbImage, open as open_dynamic};
use npyz::{self, DType, NpyFile, TypeChar};

use crate::constant;
use crate::cv::transform;
use crate::error::SorrelError;
use crate::im::SorrelBuffer;
use crate::impl_enum_dispatch;

/// A wrapper for representing and storing array-shaped pixels
///
/// The enum holds the image formats a microscope or an exported figure
/// usually comes in. All external image types (e.g `DynamicImage`) should
/// be converted to a SorrelImage via a method on this enum.
///
/// # Examples
///
/// ```
/// use image::{RgbImage, DynamicImage};
/// use sorrel_core::im::SorrelImage;
///
/// let rgb = RgbImage::new(10, 10);
/// let dynamic = DynamicImage::ImageRgb8(rgb);
/// let image = SorrelImage::new_from_default(dynamic).unwrap();
///
/// assert_eq!(image.shape(), (10, 10, 3));
/// ```
#[derive(Debug, Clone)]
pub enum SorrelImage {
    U8(SorrelBuffer<u8, Vec<u8>>),
    U16(SorrelBuffer<u16, Vec<u16>>),
    F32(SorrelBuffer<f32, Vec<f32>>),
}

// >>> I/O METHODS

impl SorrelImage {
    /// Open a new image from a provided path
    ///
    /// # Arguments
    ///
    /// * `path` - A path to an image with a valid extension
    ///
    /// ```no_run
    /// use sorrel_core::im::SorrelImage;
    /// let image = SorrelImage::open("image.tif");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SorrelImage, SorrelError> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        if let Some(ext) = extension {
            if ext == "npy" {
                let bytes = std::fs::read(&path).map_err(|_| SorrelError::ImageReadError)?;
                let npy = NpyFile::new(&bytes[..]).map_err(|_| SorrelError::ImageReadError)?;
                return Self::new_from_numpy(npy);
            }

            if constant::IMAGE_DYNAMIC_FORMATS.iter().any(|e| e == &ext) {
                let image = open_dynamic(&path).map_err(|_| SorrelError::ImageReadError)?;
                return Self::new_from_default(image);
            }
        }

        Err(SorrelError::ImageExtensionError)
    }

    /// Initialize a new image from a DynamicImage
    ///
    /// Alpha channels are dropped and 32-bit float images are kept as is.
    ///
    /// # Arguments
    ///
    /// * `image` - An 8 or 16-bit grayscale or rgb DynamicImage
    pub fn new_from_default(image: DynamicImage) -> Result<SorrelImage, SorrelError> {
        let width = image.width();
        let height = image.height();

        match image {
            DynamicImage::ImageLuma8(buffer) => Ok(SorrelImage::U8(SorrelBuffer::new(
                width,
                height,
                1,
                buffer.into_raw(),
            )?)),
            DynamicImage::ImageLumaA8(buffer) => Ok(SorrelImage::U8(SorrelBuffer::new(
                width,
                height,
                1,
                buffer
                    .into_raw()
                    .chunks_exact(2)
                    .map(|pixel| pixel[0])
                    .collect(),
            )?)),
            DynamicImage::ImageLuma16(buffer) => Ok(SorrelImage::U16(SorrelBuffer::new(
                width,
                height,
                1,
                buffer.into_raw(),
            )?)),
            DynamicImage::ImageLumaA16(buffer) => Ok(SorrelImage::U16(SorrelBuffer::new(
                width,
                height,
                1,
                buffer
                    .into_raw()
                    .chunks_exact(2)
                    .map(|pixel| pixel[0])
                    .collect(),
            )?)),
            DynamicImage::ImageRgb8(buffer) => Ok(SorrelImage::U8(SorrelBuffer::new(
                width,
                height,
                3,
                buffer.into_raw(),
            )?)),
            DynamicImage::ImageRgba8(buffer) => Ok(SorrelImage::U8(SorrelBuffer::new(
                width,
                height,
                3,
                buffer
                    .into_raw()
                    .chunks_exact(4)
                    .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                    .collect(),
            )?)),
            DynamicImage::ImageRgb16(buffer) => Ok(SorrelImage::U16(SorrelBuffer::new(
                width,
                height,
                3,
                buffer.into_raw(),
            )?)),
            DynamicImage::ImageRgba16(buffer) => Ok(SorrelImage::U16(SorrelBuffer::new(
                width,
                height,
                3,
                buffer
                    .into_raw()
                    .chunks_exact(4)
                    .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                    .collect(),
            )?)),
            DynamicImage::ImageRgb32F(buffer) => Ok(SorrelImage::F32(SorrelBuffer::new(
                width,
                height,
                3,
                buffer.into_raw(),
            )?)),
            DynamicImage::ImageRgba32F(buffer) => Ok(SorrelImage::F32(SorrelBuffer::new(
                width,
                height,
                3,
                buffer
                    .into_raw()
                    .chunks_exact(4)
                    .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
                    .collect(),
            )?)),
            _ => Err(SorrelError::ImageError(
                "A dynamic image with a valid data type was not detected.",
            )),
        }
    }

    /// Initialize a new image from a numpy array buffer
    ///
    /// # Arguments
    ///
    /// * `npy` - A (height, width) or (height, width, channel) shaped numpy array
    pub fn new_from_numpy(npy: NpyFile<&[u8]>) -> Result<SorrelImage, SorrelError> {
        let shape = npy.shape().to_vec();

        let (h, w, c) = match shape.len() {
            2 => (shape[0] as u32, shape[1] as u32, 1u32),
            3 => (shape[0] as u32, shape[1] as u32, shape[2] as u32),
            _ => {
                return Err(SorrelError::ImageError(
                    "Numpy array inputs must have an (H, W) or (H, W, C) shape.",
                ));
            }
        };

        let read_error = |_: std::io::Error| SorrelError::ImageReadError;

        match npy.dtype() {
            DType::Plain(x) => match (x.type_char(), x.size_field()) {
                (TypeChar::Uint, 1) => Ok(SorrelImage::U8(
                    SorrelBuffer::new(w, h, c, npy.into_vec::<u8>().map_err(read_error)?)?,
                )),
                (TypeChar::Uint, 2) => Ok(SorrelImage::U16(SorrelBuffer::new(
                    w,
                    h,
                    c,
                    npy.into_vec::<u16>().map_err(read_error)?,
                )?)),
                (TypeChar::Float, 4) => Ok(SorrelImage::F32(SorrelBuffer::new(
                    w,
                    h,
                    c,
                    npy.into_vec::<f32>().map_err(read_error)?,
                )?)),
                (TypeChar::Float, 8) => Ok(SorrelImage::F32(SorrelBuffer::new(
                    w,
                    h,
                    c,
                    npy.into_vec::<f64>()
                        .map_err(read_error)?
                        .into_iter()
                        .map(|pixel| pixel as f32)
                        .collect(),
                )?)),
                _ => Err(SorrelError::ImageError(
                    "A numpy array with a valid data type was not detected.",
                )),
            },
            _ => Err(SorrelError::ImageError(
                "Only plain numpy arrays are currently supported.",
            )),
        }
    }
}

// <<< I/O METHODS

// >>> PROPERTY METHODS

impl_enum_dispatch!(SorrelImage, U8, U16, F32; width(&self) -> u32);
impl_enum_dispatch!(SorrelImage, U8, U16, F32; height(&self) -> u32);
impl_enum_dispatch!(SorrelImage, U8, U16, F32; channels(&self) -> u32);
impl_enum_dispatch!(SorrelImage, U8, U16, F32; shape(&self) -> (u32, u32, u32));
impl_enum_dispatch!(SorrelImage, U8, U16, F32; len(&self) -> usize);
impl_enum_dispatch!(SorrelImage, U8, U16, F32; is_empty(&self) -> bool);
impl_enum_dispatch!(SorrelImage, U8, U16, F32; to_u8(&self) -> Vec<u8>);
impl_enum_dispatch!(SorrelImage, U8, U16, F32; to_f32(&self) -> Vec<f32>);

// <<< PROPERTY METHODS

// >>> TRANSFORM METHODS

impl SorrelImage {
    /// Create a new image with copied cropped contents
    ///
    /// # Arguments
    ///
    /// * `x` - Minimum x-coordinate (left)
    /// * `y` - Minimum y-coordinate (top)
    /// * `w` - Width of crop
    /// * `h` - Height of crop
    pub fn crop(&self, x: u32, y: u32, w: u32, h: u32) -> Result<SorrelImage, SorrelError> {
        match self {
            SorrelImage::U8(buffer) => Ok(SorrelImage::U8(buffer.crop(x, y, w, h)?)),
            SorrelImage::U16(buffer) => Ok(SorrelImage::U16(buffer.crop(x, y, w, h)?)),
            SorrelImage::F32(buffer) => Ok(SorrelImage::F32(buffer.crop(x, y, w, h)?)),
        }
    }

    /// Convert the image to an 8-bit RGB image
    ///
    /// 16-bit and float images are min-max rescaled to the 8-bit range. A
    /// 1-channel image is repeated three times and images that aren't 1 or
    /// 3 channels are averaged across channels before being repeated.
    ///
    /// # Examples
    ///
    /// ```
    /// use sorrel_core::im::{SorrelBuffer, SorrelImage};
    ///
    /// let image = SorrelImage::U16(SorrelBuffer::new(2, 1, 1, vec![100u16, 300]).unwrap());
    /// let rgb = image.to_rgb8().unwrap();
    ///
    /// assert_eq!(rgb.as_raw(), &[0, 0, 0, 255, 255, 255]);
    /// ```
    pub fn to_rgb8(&self) -> Result<RgbImage, SorrelError> {
        let subpixels: Vec<u8> = match self {
            SorrelImage::U8(buffer) => buffer.as_raw().clone(),
            _ => rescale_u8(&self.to_f32()),
        };

        let c = self.channels() as usize;
        let raw: Vec<u8> = match c {
            3 => subpixels,
            1 => subpixels.iter().flat_map(|&p| [p, p, p]).collect(),
            _ => subpixels
                .chunks_exact(c)
                .flat_map(|pixel| {
                    let mean = pixel.iter().map(|&p| p as u32).sum::<u32>() / c as u32;
                    [mean as u8; 3]
                })
                .collect(),
        };

        RgbImage::from_raw(self.width(), self.height(), raw)
            .ok_or(SorrelError::ImageError("Failed to convert image to RGB."))
    }

    /// Convert to an 8-bit RGB image then resize to the provided dimensions
    ///
    /// # Arguments
    ///
    /// * `width` - Width of resized image
    /// * `height` - Height of resized image
    pub fn resize_rgb8(&self, width: u32, height: u32) -> Result<RgbImage, SorrelError> {
        let rgb = self.to_rgb8()?;

        if rgb.width() == width && rgb.height() == height {
            return Ok(rgb);
        }

        let resized = transform::resize_bilinear_fast(
            &DynamicImage::ImageRgb8(rgb),
            width,
            height,
            PixelType::U8x3,
        )?;

        RgbImage::from_raw(width, height, resized)
            .ok_or(SorrelError::ImageError("Failed to resize image."))
    }
}

/// Min-max rescale subpixels to the 8-bit range
fn rescale_u8(subpixels: &[f32]) -> Vec<u8> {
    let (min, max) = subpixels
        .iter()
        .filter(|p| p.is_finite())
        .fold((f32::MAX, f32::MIN), |(lo, hi), &p| (lo.min(p), hi.max(p)));

    if max <= min {
        return vec![0u8; subpixels.len()];
    }

    let scale = 255.0 / (max - min);

    subpixels
        .iter()
        .map(|&p| {
            if p.is_finite() {
                ((p - min) * scale).round().clamp(0.0, 255.0) as u8
            } else {
                0u8
            }
        })
        .collect()
}

// <<< TRANSFORM METHODS
