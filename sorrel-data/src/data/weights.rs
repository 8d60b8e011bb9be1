// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::PathBuf;

use anyhow::{Result, anyhow};

use crate::get_sorrel_cache;
use crate::request;

const HUB_URL: &str = "https://huggingface.co/lmz/candle-sam/resolve/main";

/// Pretrained segment anything weights available to sorrel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weights {
    SamVitBase,
    SamVitTiny,
}

impl Weights {
    /// Select weights by name
    ///
    /// # Examples
    ///
    /// ```
    /// use sorrel_data::data::Weights;
    ///
    /// assert_eq!(Weights::select("sam_vit_t").unwrap(), Weights::SamVitTiny);
    /// assert!(Weights::select("sam_vit_h").is_err());
    /// ```
    pub fn select(weights_name: &str) -> Result<Self> {
        Weights::iter()
            .find(|w| w.model_name() == weights_name)
            .copied()
            .ok_or_else(|| {
                anyhow!(
                    "[sorrel::data::weights] Weights {} not found. Available weights include: {}.",
                    weights_name,
                    Weights::iter()
                        .map(|w| w.model_name())
                        .collect::<Vec<&str>>()
                        .join(", ")
                )
            })
    }

    /// Return an iterator over the enum members.
    pub fn iter() -> impl Iterator<Item = &'static Weights> {
        static WEIGHTS: [Weights; 2] = [Weights::SamVitBase, Weights::SamVitTiny];

        WEIGHTS.iter()
    }

    /// Get the name of the model.
    pub fn model_name(&self) -> &'static str {
        match self {
            Weights::SamVitBase => "sam_vit_b",
            Weights::SamVitTiny => "sam_vit_t",
        }
    }

    /// Get the file name of the safetensors weights.
    pub fn file_name(&self) -> &'static str {
        match self {
            Weights::SamVitBase => "sam_vit_b_01ec64.safetensors",
            Weights::SamVitTiny => "mobile_sam-tiny-vitt.safetensors",
        }
    }

    /// Get the remote location of the weights.
    pub fn url(&self) -> String {
        format!("{}/{}", HUB_URL, self.file_name())
    }

    /// Get the usage license for a model.
    pub fn license(&self) -> &'static str {
        match self {
            Weights::SamVitBase => "Apache License 2.0",
            Weights::SamVitTiny => "Apache License 2.0",
        }
    }

    /// Get the authors of the model weights.
    pub fn data_authors(&self) -> &'static str {
        match self {
            Weights::SamVitBase => "Meta AI (converted by Huggingface/candle)",
            Weights::SamVitTiny => "MobileSAM authors (converted by Huggingface/candle)",
        }
    }

    /// Get the size of the model in GB.
    pub fn data_size(&self) -> &'static str {
        match self {
            Weights::SamVitBase => "0.375",
            Weights::SamVitTiny => "0.040",
        }
    }

    /// Download the weights to the sorrel cache if they are not already present.
    pub fn download(&self, verbose: bool) -> Result<PathBuf> {
        let path = self.path();

        if !path.exists() {
            request::download_file(&self.url(), &get_sorrel_cache(), self.file_name(), !verbose)?;

            if !path.exists() {
                return Err(anyhow!(
                    "[sorrel::data::weights] Failed to download {} weights.",
                    self.model_name()
                ));
            }
        }

        Ok(path)
    }

    /// Get path to model weights.
    pub fn path(&self) -> PathBuf {
        get_sorrel_cache().join(self.file_name())
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_select_roundtrip() {
        for weights in Weights::iter() {
            assert_eq!(&Weights::select(weights.model_name()).unwrap(), weights);
        }
    }

    #[test]
    fn test_url() {
        assert_eq!(
            Weights::SamVitBase.url(),
            "https://huggingface.co/lmz/candle-sam/resolve/main/sam_vit_b_01ec64.safetensors"
        );
    }

    #[test]
    fn test_path_in_cache() {
        let path = Weights::SamVitTiny.path();
        assert!(path.ends_with("mobile_sam-tiny-vitt.safetensors"));
    }
}
