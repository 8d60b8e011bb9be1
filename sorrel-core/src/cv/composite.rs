// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::fmt;
use std::str::FromStr;

use crate::cv::connected::first_component_area;
use crate::error::SorrelError;
use crate::im::{BinaryMask, LabelImage};

/// How the area used to order masks is measured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AreaStrategy {
    /// Pixel count of the first 8-connected component in raster order
    #[default]
    FirstComponent,
    /// Pixel count of all foreground pixels
    Total,
}

impl AreaStrategy {
    /// Measure the area of a mask
    pub fn area(&self, mask: &BinaryMask) -> u32 {
        match self {
            AreaStrategy::FirstComponent => {
                first_component_area(mask.width(), mask.height(), mask.as_raw())
            }
            AreaStrategy::Total => mask.foreground_area(),
        }
    }
}

impl FromStr for AreaStrategy {
    type Err = SorrelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "first" | "first-component" | "first_component" => Ok(AreaStrategy::FirstComponent),
            "total" => Ok(AreaStrategy::Total),
            _ => Err(SorrelError::OtherError(format!(
                "Invalid area strategy '{}'. Must be one of: first, total",
                s
            ))),
        }
    }
}

impl fmt::Display for AreaStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaStrategy::FirstComponent => write!(f, "first"),
            AreaStrategy::Total => write!(f, "total"),
        }
    }
}

/// A mask paired with its input position and measured area
#[derive(Debug, Clone, Copy)]
pub struct MaskRecord<'a> {
    pub index: usize,
    pub area: u32,
    pub mask: &'a BinaryMask,
}

/// A label image and the bookkeeping of how each label was assigned
#[derive(Debug, Clone, PartialEq)]
pub struct Composite {
    /// Label image where label k is the k-th mask in descending area order
    pub labels: LabelImage,
    /// Input index of the mask painted with label k (stored at position k - 1)
    pub sources: Vec<usize>,
    /// Measured area of the mask painted with label k (stored at position k - 1)
    pub areas: Vec<u32>,
    /// Input indices of masks without foreground pixels
    pub empty: Vec<usize>,
}

impl Composite {
    /// Number of labels handed out, including labels of empty masks
    pub fn n_labels(&self) -> u32 {
        self.sources.len() as u32
    }

    /// Label assigned to the mask at an input index
    pub fn label_of(&self, index: usize) -> Option<u32> {
        self.sources
            .iter()
            .position(|&source| source == index)
            .map(|position| position as u32 + 1)
    }
}

/// Merge per-object binary masks into one label image
///
/// Masks are ordered by area from largest to smallest (ties keep their input
/// order) and painted in that order with labels 1, 2, ..., each mask
/// overwriting any earlier label on its foreground. Smaller objects lying on
/// top of larger ones therefore stay visible. A mask without foreground still
/// consumes a label and is listed in [`Composite::empty`].
///
/// # Arguments
///
/// * `masks` - Binary masks, one per object, each of `shape`
/// * `shape` - Image shape as (height, width)
/// * `strategy` - How mask areas are measured
///
/// # Examples
///
/// ```
/// use sorrel_core::cv::{AreaStrategy, composite};
/// use sorrel_core::im::BinaryMask;
///
/// let large = BinaryMask::new(3, 2, 1, vec![1, 1, 1, 1, 1, 1]).unwrap();
/// let small = BinaryMask::new(3, 2, 1, vec![0, 0, 0, 0, 1, 0]).unwrap();
///
/// let result = composite(&[small, large], (2, 3), AreaStrategy::default()).unwrap();
///
/// assert_eq!(result.labels.as_raw(), &[1, 1, 1, 1, 2, 1]);
/// assert_eq!(result.sources, vec![1, 0]);
/// ```
pub fn composite(
    masks: &[BinaryMask],
    shape: (u32, u32),
    strategy: AreaStrategy,
) -> Result<Composite, SorrelError> {
    let (height, width) = shape;

    for (index, mask) in masks.iter().enumerate() {
        if (mask.height(), mask.width()) != shape {
            return Err(SorrelError::ShapeMismatchError {
                index,
                expected: shape,
                found: (mask.height(), mask.width()),
            });
        }

        if mask.channels() != 1 {
            return Err(SorrelError::MaskFormatError);
        }
    }

    let mut records: Vec<MaskRecord> = masks
        .iter()
        .enumerate()
        .map(|(index, mask)| MaskRecord {
            index,
            area: strategy.area(mask),
            mask,
        })
        .collect();

    // Stable so equal areas keep input order
    records.sort_by(|a, b| b.area.cmp(&a.area));

    let mut labels = LabelImage::zeros(width, height, 1);
    let mut empty = Vec::new();

    for (position, record) in records.iter().enumerate() {
        let label = position as u32 + 1;
        let mut painted = false;

        for (pixel, &value) in labels.buffer.iter_mut().zip(record.mask.iter()) {
            if value != 0 {
                *pixel = label;
                painted = true;
            }
        }

        if !painted {
            empty.push(record.index);
        }
    }

    empty.sort();

    Ok(Composite {
        labels,
        sources: records.iter().map(|r| r.index).collect(),
        areas: records.iter().map(|r| r.area).collect(),
        empty,
    })
}

/// Merge per-object binary masks into one label image, failing on empty masks
///
/// Behaves like [`composite`] but returns [`SorrelError::EmptyMaskError`]
/// with the input index of the first mask lacking foreground pixels.
pub fn composite_strict(
    masks: &[BinaryMask],
    shape: (u32, u32),
    strategy: AreaStrategy,
) -> Result<Composite, SorrelError> {
    let result = composite(masks, shape, strategy)?;

    match result.empty.first() {
        Some(&index) => Err(SorrelError::EmptyMaskError(index)),
        None => Ok(result),
    }
}
