// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SorrelError {
    BufferSizeError,
    ChannelBoundsError,
    ImageError(&'static str),
    ImageReadError,
    ImageWriteError,
    ImageExtensionError,
    MaskError(&'static str),
    MaskFormatError,
    ShapeMismatchError {
        index: usize,
        expected: (u32, u32),
        found: (u32, u32),
    },
    EmptyMaskError(usize),
    LabelOverflowError(u32),
    PointsReadError(String),
    PointsFormatError(String),
    PointBoundsError {
        row: f32,
        col: f32,
        height: u32,
        width: u32,
    },
    TilingError(&'static str),
    TableWriteError(String),
    NoFileError(String),
    DirError(String),
    OtherError(String),
}

impl fmt::Display for SorrelError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SorrelError::BufferSizeError => {
                write!(
                    f,
                    "[sorrel::BufferSizeError] The buffer does not match provided size"
                )
            }
            SorrelError::ChannelBoundsError => {
                write!(
                    f,
                    "[sorrel::ChannelBoundsError] The indexed channel is out of bounds."
                )
            }
            SorrelError::ImageError(message) => {
                write!(f, "[sorrel::ImageError] Failed to create image. {}", message)
            }
            SorrelError::ImageReadError => {
                write!(f, "[sorrel::ImageReadError] Failed to read image.")
            }
            SorrelError::ImageWriteError => {
                write!(f, "[sorrel::ImageWriteError] Failed to write image.")
            }
            SorrelError::ImageExtensionError => {
                write!(
                    f,
                    "[sorrel::ImageExtensionError] Could not detect a valid image extension for input."
                )
            }
            SorrelError::MaskError(message) => {
                write!(f, "[sorrel::MaskError] Failed to create mask. {}", message)
            }
            SorrelError::MaskFormatError => {
                write!(
                    f,
                    "[sorrel::MaskFormatError] Only 1-channel u8, u16 and u32 masks are currently supported."
                )
            }
            SorrelError::ShapeMismatchError {
                index,
                expected,
                found,
            } => {
                write!(
                    f,
                    "[sorrel::ShapeMismatchError] Mask {} has shape {:?} (height, width) but the image has shape {:?}.",
                    index, found, expected
                )
            }
            SorrelError::EmptyMaskError(index) => {
                write!(
                    f,
                    "[sorrel::EmptyMaskError] Mask {} does not contain any foreground pixels.",
                    index
                )
            }
            SorrelError::LabelOverflowError(max) => {
                write!(
                    f,
                    "[sorrel::LabelOverflowError] Label image holds {} labels which exceeds the 16-bit range of this format. Save as .npy instead.",
                    max
                )
            }
            SorrelError::PointsReadError(message) => {
                write!(
                    f,
                    "[sorrel::PointsReadError] Point prompts could not be read. {}.",
                    message
                )
            }
            SorrelError::PointsFormatError(message) => {
                write!(
                    f,
                    "[sorrel::PointsFormatError] Point prompts are malformed. {}.",
                    message
                )
            }
            SorrelError::PointBoundsError {
                row,
                col,
                height,
                width,
            } => {
                write!(
                    f,
                    "[sorrel::PointBoundsError] Point (row = {}, col = {}) lies outside of the {} x {} image.",
                    row, col, height, width
                )
            }
            SorrelError::TilingError(message) => {
                write!(f, "[sorrel::TilingError] Invalid tiling. {}", message)
            }
            SorrelError::TableWriteError(message) => {
                write!(
                    f,
                    "[sorrel::TableWriteError] Failed to write table. {}.",
                    message
                )
            }
            SorrelError::NoFileError(message) => {
                write!(
                    f,
                    "[sorrel::NoFileError] File could not be found. {}.",
                    message
                )
            }
            SorrelError::DirError(message) => {
                write!(
                    f,
                    "[sorrel::DirError] Directory could not be read. {}.",
                    message
                )
            }
            SorrelError::OtherError(message) => {
                write!(f, "[sorrel::OtherError] Error: {}.", message)
            }
        }
    }
}

impl std::error::Error for SorrelError {}
