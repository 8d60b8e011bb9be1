// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::{Path, PathBuf};

use candle_core::{DType, Device, Result};
use candle_nn::VarBuilder;
use candle_transformers::models::segment_anything::sam::Sam;

use sorrel_data::data::Weights;

/// Resolve a user supplied weights file or download the weights to the cache
fn weights_path(weights: Weights, path: Option<&Path>, verbose: bool) -> Result<PathBuf> {
    match path {
        Some(path) if path.exists() => Ok(path.to_path_buf()),
        Some(path) => Err(candle_core::Error::Msg(format!(
            "[sorrel::neural::load] Weights file {} does not exist.",
            path.display()
        ))),
        None => weights
            .download(verbose)
            .map_err(|err| candle_core::Error::Msg(err.to_string())),
    }
}

/// Load the ViT-B segment anything model
pub fn load_sam_vit_base(path: Option<&Path>, device: &Device, verbose: bool) -> Result<Sam> {
    let path = weights_path(Weights::SamVitBase, path, verbose)?;

    let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device)? };
    Sam::new(768, 12, 12, &[2, 5, 8, 11], vb)
}

/// Load the TinyViT (mobile) segment anything model
pub fn load_sam_vit_tiny(path: Option<&Path>, device: &Device, verbose: bool) -> Result<Sam> {
    let path = weights_path(Weights::SamVitTiny, path, verbose)?;

    let vb = unsafe { VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device)? };
    Sam::new_tiny(vb)
}
