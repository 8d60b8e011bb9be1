// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::{Path, PathBuf};

use clap::Args;

use sorrel_core::constant;
use sorrel_core::cv;
use sorrel_core::error::SorrelError;
use sorrel_core::im;
use sorrel_core::ut;

#[derive(Debug, Args)]
#[command(about = "Draw a label image and optional point prompts over an image.")]
pub struct OverlayArgs {
    #[arg(short = 'i', long, help = "Input image.", required = true)]
    pub image: Option<String>,

    #[arg(short = 'l', long, help = "Label image.", required = true)]
    pub labels: Option<String>,

    #[arg(short = 'p', long, help = "Point prompts (.csv, .tsv, .txt, .json).")]
    pub points: Option<String>,

    #[arg(short = 'o', long, help = "Output image (e.g. overlay.png).", required = true)]
    pub output: Option<String>,

    #[arg(long, help = "Opacity of labels in the overlay.", default_value_t = constant::OVERLAY_ALPHA)]
    pub alpha: f32,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

pub fn utils_overlay(args: &OverlayArgs) {
    let output = PathBuf::from(args.output.to_owned().unwrap_or_default());

    let valid_extension = output
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| constant::IMAGE_DYNAMIC_FORMATS.contains(&s.to_lowercase().as_str()))
        .unwrap_or(false);

    if !valid_extension {
        eprintln!(
            "[sorrel::utils::overlay] ERROR: Invalid output extension. Must be one of: {:?}.",
            constant::IMAGE_DYNAMIC_FORMATS
        );
        std::process::exit(1);
    }

    render(args, &output).unwrap_or_else(|err| {
        eprintln!("[sorrel::utils::overlay] ERROR: {}", err);
        std::process::exit(1);
    });

    ut::track::progress_log(
        &format!("Complete. Overlay saved to {}.", output.display()),
        args.verbose,
    );
}

fn render(args: &OverlayArgs, output: &Path) -> Result<(), SorrelError> {
    let image = im::SorrelImage::open(args.image.to_owned().unwrap_or_default())?;
    let labels = im::LabelImage::open(args.labels.to_owned().unwrap_or_default())?;

    let points = match args.points.as_ref() {
        Some(path) => im::Points::open(path)?,
        None => im::Points::default(),
    };

    points.validate(image.height(), image.width())?;

    cv::render_overlay(&image, &labels, points.as_slice(), args.alpha)?
        .save(output)
        .map_err(|_| SorrelError::ImageWriteError)
}
