// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::Path;

use candle_core::{Device, Result, Tensor};
use candle_transformers::models::segment_anything::sam::Sam;

use sorrel_core::im::{BinaryMask, PointPrompt, SorrelImage};

use crate::load::{load_sam_vit_base, load_sam_vit_tiny};
use crate::preprocess::{postprocess_mask, preprocess_sam, select_best_mask};

/// A model that computes a reusable representation of an image
pub trait Embedder {
    type Embedding;

    /// Compute the embedding of an image
    fn embed(&self, image: &SorrelImage) -> Result<Self::Embedding>;
}

/// A model that predicts an object mask for a point prompt on an embedded image
pub trait PointSegmenter: Embedder {
    /// Predict a binary mask with the (height, width) of the embedded image
    fn segment(&self, embedding: &Self::Embedding, point: &PointPrompt) -> Result<BinaryMask>;
}

/// Image embeddings from a segment anything encoder
pub struct SamEmbedding {
    pub data: Tensor,
    /// (height, width) of the image before resizing
    pub original: (usize, usize),
    /// (height, width) of the image given to the encoder
    pub resized: (usize, usize),
}

/// A segment anything model bound to a device
pub struct SegmentAnything {
    sam: Sam,
    device: Device,
}

impl SegmentAnything {
    pub fn new(sam: Sam, device: &Device) -> Self {
        SegmentAnything {
            sam,
            device: device.clone(),
        }
    }

    fn embed(&self, image: &SorrelImage) -> Result<SamEmbedding> {
        let (tensor, resized) = preprocess_sam(image, &self.device)?;
        let data = self.sam.embeddings(&tensor)?;

        Ok(SamEmbedding {
            data,
            original: (image.height() as usize, image.width() as usize),
            resized,
        })
    }

    fn segment(&self, embedding: &SamEmbedding, point: &PointPrompt) -> Result<BinaryMask> {
        let (h, w) = embedding.original;
        let (rh, rw) = embedding.resized;

        let x = point.col as f64 / w as f64;
        let y = point.row as f64 / h as f64;

        // Best of the multimask outputs by predicted IoU
        let (low_res, iou) =
            self.sam
                .forward_for_embeddings(&embedding.data, rh, rw, &[(x, y, point.positive)], true)?;

        let best = select_best_mask(&low_res, &iou)?;
        let buffer = postprocess_mask(&best, (rh, rw), (h, w))?;

        BinaryMask::new(w as u32, h as u32, 1, buffer).map_err(candle_core::Error::wrap)
    }
}

/// Available segment anything models
pub enum Models {
    SamVitBase(SegmentAnything),
    SamVitTiny(SegmentAnything),
}

impl Models {
    /// Load a model by name from a weights file or from the weights cache
    ///
    /// # Arguments
    ///
    /// * `model_name` - One of sam_vit_b or sam_vit_t
    /// * `weights` - Optional path to a safetensors file
    /// * `device` - Device to run the model on
    /// * `verbose` - Show download progress
    pub fn load(
        model_name: &str,
        weights: Option<&Path>,
        device: &Device,
        verbose: bool,
    ) -> Result<Self> {
        match model_name {
            "sam_vit_b" => {
                let sam = load_sam_vit_base(weights, device, verbose)?;
                Ok(Models::SamVitBase(SegmentAnything::new(sam, device)))
            }
            "sam_vit_t" => {
                let sam = load_sam_vit_tiny(weights, device, verbose)?;
                Ok(Models::SamVitTiny(SegmentAnything::new(sam, device)))
            }
            _ => Err(candle_core::Error::Msg(format!(
                "[sorrel::nn::models] Model {} not found. Available models include: sam_vit_b, sam_vit_t.",
                model_name
            ))),
        }
    }

    pub fn model_name(&self) -> &'static str {
        match self {
            Models::SamVitBase(_) => "sam_vit_b",
            Models::SamVitTiny(_) => "sam_vit_t",
        }
    }

    fn backend(&self) -> &SegmentAnything {
        match self {
            Models::SamVitBase(model) => model,
            Models::SamVitTiny(model) => model,
        }
    }
}

impl Embedder for Models {
    type Embedding = SamEmbedding;

    fn embed(&self, image: &SorrelImage) -> Result<SamEmbedding> {
        self.backend().embed(image)
    }
}

impl PointSegmenter for Models {
    fn segment(&self, embedding: &SamEmbedding, point: &PointPrompt) -> Result<BinaryMask> {
        self.backend().segment(embedding, point)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use sorrel_core::im::SorrelBuffer;

    #[test]
    fn test_unknown_model() {
        let model = Models::load("sam_vit_h", None, &Device::Cpu, false);
        assert!(model.is_err());
    }

    #[test]
    #[ignore = "downloads model weights"]
    fn test_sam_vit_tiny_segment() {
        let mut buffer = vec![0u8; 64 * 48];
        for y in 16..32 {
            for x in 20..40 {
                buffer[y * 64 + x] = 255;
            }
        }

        let image = SorrelImage::U8(SorrelBuffer::new(64, 48, 1, buffer).unwrap());
        let model = Models::load("sam_vit_t", None, &Device::Cpu, true).unwrap();

        let embedding = model.embed(&image).unwrap();
        let mask = model
            .segment(&embedding, &PointPrompt::positive(24.0, 30.0))
            .unwrap();

        assert_eq!(mask.shape(), (48, 64, 1));
        assert_eq!(mask.as_raw()[24 * 64 + 30], 1);
    }
}
