// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use sorrel_core::constant;
use sorrel_core::cv::AreaStrategy;
use sorrel_core::error::SorrelError;

/// Optional settings for `sorrel segment points`
///
/// Every field may be given on the command line or in a JSON file. Command
/// line values take precedence over file values, which take precedence over
/// the defaults.
///
/// ```json
/// {
///     "model": "sam_vit_t",
///     "tile_shape": [512, 512],
///     "halo": [32, 32],
///     "area": "total",
///     "format": "png",
///     "overlay": true
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentConfig {
    pub model: Option<String>,
    pub weights: Option<PathBuf>,
    pub device: Option<String>,
    pub tile_shape: Option<(u32, u32)>,
    pub halo: Option<(u32, u32)>,
    pub area: Option<String>,
    pub strict: Option<bool>,
    pub format: Option<String>,
    pub overlay: Option<bool>,
    pub alpha: Option<f32>,
}

/// Fully resolved settings for `sorrel segment points`
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentSettings {
    pub model: String,
    pub weights: Option<PathBuf>,
    pub device: String,
    pub tile_shape: (u32, u32),
    pub halo: (u32, u32),
    pub area: AreaStrategy,
    pub strict: bool,
    pub format: String,
    pub overlay: bool,
    pub alpha: f32,
}

impl SegmentConfig {
    /// Read a configuration from a JSON file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SegmentConfig, SorrelError> {
        let content = std::fs::read_to_string(&path)
            .map_err(|_| SorrelError::NoFileError(path.as_ref().display().to_string()))?;

        serde_json::from_str(&content).map_err(|err| {
            SorrelError::OtherError(format!(
                "Invalid configuration file {}: {}",
                path.as_ref().display(),
                err
            ))
        })
    }

    /// Fill every unset value with the value from `fallback`
    pub fn or(self, fallback: SegmentConfig) -> SegmentConfig {
        SegmentConfig {
            model: self.model.or(fallback.model),
            weights: self.weights.or(fallback.weights),
            device: self.device.or(fallback.device),
            tile_shape: self.tile_shape.or(fallback.tile_shape),
            halo: self.halo.or(fallback.halo),
            area: self.area.or(fallback.area),
            strict: self.strict.or(fallback.strict),
            format: self.format.or(fallback.format),
            overlay: self.overlay.or(fallback.overlay),
            alpha: self.alpha.or(fallback.alpha),
        }
    }

    /// Apply defaults and validate the values
    pub fn resolve(self) -> Result<SegmentSettings, String> {
        let model = self.model.unwrap_or("sam_vit_b".to_string());
        if !["sam_vit_b", "sam_vit_t"].contains(&model.as_str()) {
            return Err(format!(
                "Invalid model {}. Must be one of: sam_vit_b, sam_vit_t.",
                model
            ));
        }

        let device = self.device.unwrap_or("cpu".to_string());
        if !["cpu", "cuda", "metal"].contains(&device.as_str()) {
            return Err("Invalid device. Must be one of: cpu, metal, cuda.".to_string());
        }

        let tile_shape = self.tile_shape.unwrap_or(constant::DEFAULT_TILE_SHAPE);
        if tile_shape.0 == 0 || tile_shape.1 == 0 {
            return Err("Tile shape must be positive.".to_string());
        }

        let area = self
            .area
            .as_deref()
            .unwrap_or("first")
            .parse::<AreaStrategy>()
            .map_err(|_| "Invalid area strategy. Must be one of: first, total.".to_string())?;

        let format = self.format.unwrap_or("tif".to_string()).to_lowercase();
        if !constant::LABEL_FORMATS.contains(&format.as_str()) {
            return Err(format!(
                "Invalid label format {}. Must be one of: {:?}.",
                format,
                constant::LABEL_FORMATS
            ));
        }

        let alpha = self.alpha.unwrap_or(constant::OVERLAY_ALPHA);
        if !(0.0..=1.0).contains(&alpha) {
            return Err("Overlay alpha must lie in [0, 1].".to_string());
        }

        Ok(SegmentSettings {
            model,
            weights: self.weights,
            device,
            tile_shape,
            halo: self.halo.unwrap_or(constant::DEFAULT_HALO),
            area,
            strict: self.strict.unwrap_or(false),
            format,
            overlay: self.overlay.unwrap_or(false),
            alpha,
        })
    }
}

/// Parse a "height,width" pair from the command line
pub fn parse_shape(value: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = value.split(',').map(|s| s.trim()).collect();

    match parts.as_slice() {
        [h, w] => Ok((
            h.parse().map_err(|_| format!("Invalid height in '{}'", value))?,
            w.parse().map_err(|_| format!("Invalid width in '{}'", value))?,
        )),
        _ => Err(format!("Expected HEIGHT,WIDTH but found '{}'", value)),
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[test]
    fn test_defaults() {
        let settings = SegmentConfig::default().resolve().unwrap();

        assert_eq!(settings.model, "sam_vit_b");
        assert_eq!(settings.device, "cpu");
        assert_eq!(settings.tile_shape, (384, 384));
        assert_eq!(settings.halo, (64, 64));
        assert_eq!(settings.area, AreaStrategy::FirstComponent);
        assert_eq!(settings.format, "tif");
        assert!(!settings.strict);
        assert!(!settings.overlay);
    }

    #[test]
    fn test_command_line_overrides_file() {
        let file: SegmentConfig = serde_json::from_str(
            r#"{"model": "sam_vit_t", "tile_shape": [512, 256], "area": "total", "overlay": true}"#,
        )
        .unwrap();

        let cli = SegmentConfig {
            tile_shape: Some((128, 128)),
            ..Default::default()
        };

        let settings = cli.or(file).resolve().unwrap();

        assert_eq!(settings.model, "sam_vit_t");
        assert_eq!(settings.tile_shape, (128, 128));
        assert_eq!(settings.area, AreaStrategy::Total);
        assert!(settings.overlay);
    }

    #[test]
    fn test_invalid_values() {
        let invalid = [
            SegmentConfig {
                model: Some("sam_vit_h".to_string()),
                ..Default::default()
            },
            SegmentConfig {
                tile_shape: Some((0, 10)),
                ..Default::default()
            },
            SegmentConfig {
                format: Some("jpg".to_string()),
                ..Default::default()
            },
            SegmentConfig {
                area: Some("median".to_string()),
                ..Default::default()
            },
        ];

        for config in invalid {
            assert!(config.resolve().is_err());
        }
    }

    #[test]
    fn test_unknown_field_rejected() {
        let config = serde_json::from_str::<SegmentConfig>(r#"{"tiles": [1, 2]}"#);
        assert!(config.is_err());
    }

    #[test]
    fn test_parse_shape() {
        assert_eq!(parse_shape("384,256"), Ok((384, 256)));
        assert_eq!(parse_shape(" 8 , 9 "), Ok((8, 9)));
        assert!(parse_shape("384").is_err());
        assert!(parse_shape("a,b").is_err());
    }
}
