// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::collections::BTreeSet;
use std::path::Path;

use image::{ImageBuffer, Luma};
use npyz::{self, DType, NpyFile, TypeChar};

use crate::constant;
use crate::error::SorrelError;
use crate::im::{SorrelBuffer, SorrelImage};
use crate::io::write_numpy;

/// A row-major binary mask with 0 for background and 1 for foreground
///
/// # Examples
///
/// ```
/// use sorrel_core::im::BinaryMask;
///
/// let mask = BinaryMask::new(3, 2, 1, vec![0, 1, 1, 0, 0, 1]).unwrap();
///
/// assert_eq!(mask.foreground_area(), 3);
/// ```
pub type BinaryMask = SorrelBuffer<u8, Vec<u8>>;

/// A row-major label image where 0 is background and k > 0 is the k-th object
pub type LabelImage = SorrelBuffer<u32, Vec<u32>>;

fn lowercase_extension<P: AsRef<Path>>(path: P) -> Option<String> {
    path.as_ref()
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
}

// >>> BINARY MASK METHODS

impl BinaryMask {
    /// Open a binary mask, treating every non-zero pixel as foreground
    ///
    /// # Arguments
    ///
    /// * `path` - A path to a 1-channel image or numpy array
    ///
    /// ```no_run
    /// use sorrel_core::im::BinaryMask;
    /// let mask = BinaryMask::open("mask.png");
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<BinaryMask, SorrelError> {
        let image = SorrelImage::open(path)?;

        if image.channels() != 1 {
            return Err(SorrelError::MaskFormatError);
        }

        let buffer = match &image {
            SorrelImage::U8(b) => b.iter().map(|&p| (p != 0) as u8).collect(),
            SorrelImage::U16(b) => b.iter().map(|&p| (p != 0) as u8).collect(),
            SorrelImage::F32(b) => b.iter().map(|&p| (p != 0.0) as u8).collect(),
        };

        BinaryMask::new(image.width(), image.height(), 1, buffer)
    }

    /// Save a binary mask as an 8-bit image (0/255) or a numpy array (0/1)
    ///
    /// # Arguments
    ///
    /// * `path` - A path to an image with a valid extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SorrelError> {
        match lowercase_extension(&path).as_deref() {
            Some("npy") => write_numpy(
                path,
                self.iter().map(|&p| (p != 0) as u8).collect(),
                vec![self.height() as u64, self.width() as u64],
            ),
            Some(ext) if constant::IMAGE_DYNAMIC_FORMATS.contains(&ext) => {
                ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(
                    self.width(),
                    self.height(),
                    self.iter().map(|&p| if p != 0 { 255 } else { 0 }).collect(),
                )
                .ok_or(SorrelError::ImageWriteError)?
                .save(path)
                .map_err(|_| SorrelError::ImageWriteError)
            }
            _ => Err(SorrelError::ImageExtensionError),
        }
    }

    /// Number of foreground pixels
    pub fn foreground_area(&self) -> u32 {
        self.iter().filter(|&&p| p != 0).count() as u32
    }
}

// <<< BINARY MASK METHODS

// >>> LABEL IMAGE METHODS

impl LabelImage {
    /// Open a label image from a 1-channel 8/16-bit image or an integer numpy array
    ///
    /// # Arguments
    ///
    /// * `path` - A path to a label image with a valid extension
    pub fn open<P: AsRef<Path>>(path: P) -> Result<LabelImage, SorrelError> {
        if lowercase_extension(&path).as_deref() == Some("npy") {
            let bytes = std::fs::read(&path).map_err(|_| SorrelError::ImageReadError)?;
            let npy = NpyFile::new(&bytes[..]).map_err(|_| SorrelError::ImageReadError)?;
            return Self::new_from_numpy(npy);
        }

        let image = SorrelImage::open(path)?;

        if image.channels() != 1 {
            return Err(SorrelError::MaskFormatError);
        }

        let buffer = match &image {
            SorrelImage::U8(b) => b.iter().map(|&p| p as u32).collect(),
            SorrelImage::U16(b) => b.iter().map(|&p| p as u32).collect(),
            SorrelImage::F32(_) => return Err(SorrelError::MaskFormatError),
        };

        LabelImage::new(image.width(), image.height(), 1, buffer)
    }

    /// Initialize a label image from an (H, W) numpy array of unsigned or signed integers
    pub fn new_from_numpy(npy: NpyFile<&[u8]>) -> Result<LabelImage, SorrelError> {
        let shape = npy.shape().to_vec();

        if shape.len() != 2 && !(shape.len() == 3 && shape[2] == 1) {
            return Err(SorrelError::MaskError(
                "Numpy array label images must have an (H, W) shape.",
            ));
        }

        let (h, w) = (shape[0] as u32, shape[1] as u32);
        let read_error = |_: std::io::Error| SorrelError::ImageReadError;

        let buffer: Vec<u32> = match npy.dtype() {
            DType::Plain(x) => match (x.type_char(), x.size_field()) {
                (TypeChar::Uint, 1) => npy
                    .into_vec::<u8>()
                    .map_err(read_error)?
                    .into_iter()
                    .map(|p| p as u32)
                    .collect(),
                (TypeChar::Uint, 2) => npy
                    .into_vec::<u16>()
                    .map_err(read_error)?
                    .into_iter()
                    .map(|p| p as u32)
                    .collect(),
                (TypeChar::Uint, 4) => npy.into_vec::<u32>().map_err(read_error)?,
                (TypeChar::Int, 4) => npy
                    .into_vec::<i32>()
                    .map_err(read_error)?
                    .into_iter()
                    .map(|p| p.max(0) as u32)
                    .collect(),
                (TypeChar::Int, 8) => npy
                    .into_vec::<i64>()
                    .map_err(read_error)?
                    .into_iter()
                    .map(|p| p.clamp(0, u32::MAX as i64) as u32)
                    .collect(),
                _ => return Err(SorrelError::MaskFormatError),
            },
            _ => return Err(SorrelError::MaskFormatError),
        };

        LabelImage::new(w, h, 1, buffer)
    }

    /// Save a label image as a 16-bit tif/png or as a u32 numpy array
    ///
    /// Raster formats are limited to 65,535 labels.
    ///
    /// # Arguments
    ///
    /// * `path` - A path with a .tif, .tiff, .png or .npy extension
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), SorrelError> {
        match lowercase_extension(&path).as_deref() {
            Some("npy") => write_numpy(
                path,
                self.as_raw().clone(),
                vec![self.height() as u64, self.width() as u64],
            ),
            Some("tif") | Some("tiff") | Some("png") => {
                let max = self.max_label();
                if max > u16::MAX as u32 {
                    return Err(SorrelError::LabelOverflowError(max));
                }

                ImageBuffer::<Luma<u16>, Vec<u16>>::from_raw(
                    self.width(),
                    self.height(),
                    self.to_u16(),
                )
                .ok_or(SorrelError::ImageWriteError)?
                .save(path)
                .map_err(|_| SorrelError::ImageWriteError)
            }
            _ => Err(SorrelError::ImageExtensionError),
        }
    }

    /// Largest label present (0 for an all-background image)
    pub fn max_label(&self) -> u32 {
        self.iter().copied().max().unwrap_or(0)
    }

    /// Sorted unique non-zero labels
    pub fn labels(&self) -> Vec<u32> {
        self.iter()
            .filter(|&&x| x != 0)
            .cloned()
            .collect::<BTreeSet<u32>>()
            .into_iter()
            .collect()
    }

    /// Number of pixels owned by each label, indexed by label (index 0 is background)
    ///
    /// # Arguments
    ///
    /// * `n_labels` - Highest label to count; larger labels are ignored
    ///
    /// # Examples
    ///
    /// ```
    /// use sorrel_core::im::LabelImage;
    ///
    /// let labels = LabelImage::new(2, 2, 1, vec![0, 1, 1, 2]).unwrap();
    /// assert_eq!(labels.pixel_counts(3), vec![1, 2, 1, 0]);
    /// ```
    pub fn pixel_counts(&self, n_labels: u32) -> Vec<u32> {
        let mut counts = vec![0u32; n_labels as usize + 1];
        for &label in self.iter() {
            if label <= n_labels {
                counts[label as usize] += 1;
            }
        }

        counts
    }

    /// Whether the pixel at (x, y) lies on the edge of its labeled object
    ///
    /// A labeled pixel is a boundary pixel if any of its 4-neighbours holds a
    /// different label or lies outside the image.
    pub fn is_boundary(&self, x: u32, y: u32) -> bool {
        let (w, h) = (self.width(), self.height());
        let label = self.buffer[(y * w + x) as usize];

        if label == 0 {
            return false;
        }

        if x == 0 || y == 0 || x + 1 == w || y + 1 == h {
            return true;
        }

        [(x - 1, y), (x + 1, y), (x, y - 1), (x, y + 1)]
            .iter()
            .any(|&(nx, ny)| self.buffer[(ny * w + nx) as usize] != label)
    }
}

// <<< LABEL IMAGE METHODS

#[cfg(test)]
mod test {

    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("sorrel_mask_{}_{}", std::process::id(), name))
    }

    #[test]
    fn test_binary_mask_save_open() {
        let mask = BinaryMask::new(3, 2, 1, vec![0, 1, 0, 1, 1, 0]).unwrap();

        for name in ["binary.png", "binary.npy", "binary.tif"] {
            let path = temp_path(name);
            mask.save(&path).unwrap();

            let reopened = BinaryMask::open(&path).unwrap();
            assert_eq!(reopened, mask, "{}", name);

            std::fs::remove_file(&path).unwrap();
        }
    }

    #[test]
    fn test_binary_mask_open_thresholds() {
        let path = temp_path("threshold.png");
        ImageBuffer::<Luma<u8>, Vec<u8>>::from_raw(2, 1, vec![0, 37])
            .unwrap()
            .save(&path)
            .unwrap();

        let mask = BinaryMask::open(&path).unwrap();
        assert_eq!(mask.as_raw(), &[0, 1]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_foreground_area() {
        let mask = BinaryMask::new(2, 2, 1, vec![0, 255, 1, 0]).unwrap();
        assert_eq!(mask.foreground_area(), 2);
    }

    #[test]
    fn test_label_image_save_open() {
        let labels = LabelImage::new(3, 1, 1, vec![0, 300, 2]).unwrap();

        for name in ["labels.tif", "labels.png", "labels.npy"] {
            let path = temp_path(name);
            labels.save(&path).unwrap();

            let reopened = LabelImage::open(&path).unwrap();
            assert_eq!(reopened, labels, "{}", name);

            std::fs::remove_file(&path).unwrap();
        }
    }

    #[test]
    fn test_label_image_overflow() {
        let labels = LabelImage::new(1, 1, 1, vec![70_000]).unwrap();

        let result = labels.save(temp_path("overflow.tif"));
        assert_eq!(result.unwrap_err(), SorrelError::LabelOverflowError(70_000));

        let path = temp_path("overflow.npy");
        labels.save(&path).unwrap();
        assert_eq!(LabelImage::open(&path).unwrap().max_label(), 70_000);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_labels_unique() {
        let labels = LabelImage::new(3, 2, 1, vec![0, 3, 3, 1, 0, 1]).unwrap();
        assert_eq!(labels.labels(), vec![1, 3]);
        assert_eq!(labels.max_label(), 3);
    }

    #[test]
    fn test_is_boundary() {
        #[rustfmt::skip]
        let labels = LabelImage::new(4, 4, 1, vec![
            0, 0, 0, 0,
            0, 1, 1, 0,
            0, 1, 1, 2,
            0, 0, 0, 0,
        ]).unwrap();

        assert!(!labels.is_boundary(0, 0));
        assert!(labels.is_boundary(1, 1));
        assert!(labels.is_boundary(2, 2));
        assert!(labels.is_boundary(3, 2));
    }
}
