// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::{Path, PathBuf};

use candle_core::{Device, utils::cuda_is_available, utils::metal_is_available};
use clap::Args;
use kdam::{Bar, TqdmIterator};
use polars::prelude::*;

use sorrel_core::constant;
use sorrel_core::cv;
use sorrel_core::error::SorrelError;
use sorrel_core::im;
use sorrel_core::io;
use sorrel_core::ut;
use sorrel_neural::nn::{Models, PointSegmenter};
use sorrel_neural::predictor::Predictor;

use crate::config::{SegmentConfig, SegmentSettings, parse_shape};

#[derive(Debug, Args)]
#[command(about = "Segment one object per point prompt and merge the masks into a label image.")]
pub struct SegmentPointsArgs {
    #[arg(short = 'i', long, help = "Image or image directory.", required = true)]
    pub images: Option<String>,

    #[arg(
        short = 'p',
        long,
        help = "Point prompt file or directory (.csv, .tsv, .txt, .json). Defaults to the image directory."
    )]
    pub points: Option<String>,

    #[arg(short = 'o', long, help = "Output directory.", required = true)]
    pub output: Option<String>,

    #[arg(long, help = "Substring specifying images (e.g. _image).")]
    pub image_substring: Option<String>,

    #[arg(long, help = "Substring specifying point prompts (e.g. _points).")]
    pub points_substring: Option<String>,

    #[arg(short = 'm', long, help = "Model name (sam_vit_b, sam_vit_t).")]
    pub model: Option<String>,

    #[arg(
        long,
        help = "Path to model weights (.safetensors). Defaults to the sorrel cache. Converted micro_sam vit_b_lm weights load with -m sam_vit_b."
    )]
    pub weights: Option<String>,

    #[arg(short = 'd', long, help = "Device (cpu, cuda, metal).")]
    pub device: Option<String>,

    #[arg(long, help = "Tile shape as HEIGHT,WIDTH.", value_parser = parse_shape)]
    pub tile_shape: Option<(u32, u32)>,

    #[arg(long, help = "Tile halo as HEIGHT,WIDTH.", value_parser = parse_shape)]
    pub halo: Option<(u32, u32)>,

    #[arg(long, help = "Mask area used for ordering (first, total).")]
    pub area: Option<String>,

    #[arg(long, help = "Fail an image if any prompt yields an empty mask.")]
    pub strict: bool,

    #[arg(long, help = "Keep empty masks as warnings.", conflicts_with = "strict")]
    pub no_strict: bool,

    #[arg(long, help = "Label image format (tif, tiff, png, npy).")]
    pub format: Option<String>,

    #[arg(long, help = "Save an overlay of labels and prompts for each image.")]
    pub overlay: bool,

    #[arg(long, help = "Skip overlays.", conflicts_with = "overlay")]
    pub no_overlay: bool,

    #[arg(long, help = "Opacity of labels in the overlay.")]
    pub alpha: Option<f32>,

    #[arg(
        short = 'c',
        long,
        help = "JSON configuration file. Command line options take precedence."
    )]
    pub config: Option<String>,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

impl SegmentPointsArgs {
    /// Command line values as a configuration layer
    fn as_config(&self) -> SegmentConfig {
        SegmentConfig {
            model: self.model.to_owned(),
            weights: self.weights.as_ref().map(PathBuf::from),
            device: self.device.to_owned(),
            tile_shape: self.tile_shape,
            halo: self.halo,
            area: self.area.to_owned(),
            strict: switch(self.strict, self.no_strict),
            format: self.format.to_owned(),
            overlay: switch(self.overlay, self.no_overlay),
            alpha: self.alpha,
        }
    }
}

/// A flag pair as an optional setting
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Number of objects, segmented images and failed images
#[derive(Debug, PartialEq)]
struct SegmentSummary {
    objects: usize,
    success: usize,
    failure: usize,
}

/// Per-object rows of the objects table
#[derive(Default)]
struct ObjectRows {
    image: Vec<String>,
    label: Vec<u32>,
    prompt: Vec<u32>,
    row: Vec<f32>,
    col: Vec<f32>,
    positive: Vec<bool>,
    area: Vec<u32>,
    pixels: Vec<u32>,
}

impl ObjectRows {
    fn len(&self) -> usize {
        self.label.len()
    }

    fn extend(&mut self, other: ObjectRows) {
        self.image.extend(other.image);
        self.label.extend(other.label);
        self.prompt.extend(other.prompt);
        self.row.extend(other.row);
        self.col.extend(other.col);
        self.positive.extend(other.positive);
        self.area.extend(other.area);
        self.pixels.extend(other.pixels);
    }

    fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        DataFrame::new(vec![
            Column::new("image".into(), &self.image),
            Column::new("label".into(), &self.label),
            Column::new("prompt".into(), &self.prompt),
            Column::new("row".into(), &self.row),
            Column::new("col".into(), &self.col),
            Column::new("positive".into(), &self.positive),
            Column::new("area".into(), &self.area),
            Column::new("pixels".into(), &self.pixels),
        ])
    }
}

pub fn segment_points(args: &SegmentPointsArgs) {
    let file_config = match &args.config {
        Some(path) => SegmentConfig::open(path).unwrap_or_else(|err| {
            eprintln!("[sorrel::segment::points] ERROR: {}", err);
            std::process::exit(1);
        }),
        None => SegmentConfig::default(),
    };

    let settings = args
        .as_config()
        .or(file_config)
        .resolve()
        .unwrap_or_else(|err| {
            eprintln!("[sorrel::segment::points] ERROR: {}", err);
            std::process::exit(1);
        });

    if let Some(weights) = &settings.weights {
        if !weights.is_file() {
            eprintln!(
                "[sorrel::segment::points] ERROR: Weights file {} does not exist.",
                weights.display()
            );
            std::process::exit(1);
        }
    }

    let image_path = PathBuf::from(args.images.to_owned().unwrap_or_default());
    let pairs = collect_pairs(args, &image_path);

    if pairs.is_empty() {
        eprintln!(
            "[sorrel::segment::points] ERROR: No image and point prompt pairs were detected. Please check your paths and/or substring identifiers."
        );
        std::process::exit(1);
    }

    ut::track::progress_log(
        &format!(
            "Detected {} image and point prompt pairs.",
            ut::track::thousands_format(pairs.len())
        ),
        args.verbose,
    );

    let device = select_device(&settings.device, args.verbose);

    let output = ut::path::create_directory(args.output.to_owned().unwrap_or_default())
        .unwrap_or_else(|_| {
            eprintln!("[sorrel::segment::points] ERROR: Could not create directory.");
            std::process::exit(1);
        });

    ut::track::progress_log(
        &format!("Writing outputs to {}.", output.display()),
        args.verbose,
    );

    ut::track::progress_log(
        &format!("Loading {} model.", settings.model),
        args.verbose,
    );

    let model = Models::load(
        &settings.model,
        settings.weights.as_deref(),
        &device,
        args.verbose,
    )
    .unwrap_or_else(|err| {
        eprintln!(
            "[sorrel::segment::points] ERROR: Failed to load model. {}",
            err
        );
        std::process::exit(1);
    });

    let predictor = Predictor::new(model, settings.tile_shape, settings.halo);

    let pb = ut::track::progress_bar(pairs.len(), "Segmenting", args.verbose);

    let summary = segment_pairs(&pairs, &predictor, &settings, &output, pb).unwrap_or_else(|err| {
        eprintln!("[sorrel::segment::points] ERROR: {}", err);
        std::process::exit(1);
    });

    if args.verbose {
        println!();
    }

    ut::track::progress_log(
        &format!(
            "Complete. {} objects segmented across {} images.",
            ut::track::thousands_format(summary.objects),
            ut::track::thousands_format(summary.success)
        ),
        args.verbose,
    );

    if summary.failure > 0 {
        ut::track::progress_warn(&format!(
            "{} images failed. See {}.",
            ut::track::thousands_format(summary.failure),
            output.join("object_errors.tsv").display()
        ));
    }
}

/// Segment every image and prompt pair and write the per-image and summary outputs
///
/// A failing image is recorded in `object_errors.tsv` and does not stop the
/// remaining images.
fn segment_pairs<M: PointSegmenter>(
    pairs: &[(String, PathBuf, PathBuf)],
    predictor: &Predictor<M>,
    settings: &SegmentSettings,
    output: &Path,
    pb: Bar,
) -> Result<SegmentSummary, SorrelError> {
    let mut objects = ObjectRows::default();
    let mut success: Vec<String> = Vec::with_capacity(pairs.len());
    let mut failure: Vec<String> = Vec::new();

    for (id, image, points) in pairs.iter().tqdm_with_bar(pb) {
        match segment_image(id, image, points, predictor, settings, output) {
            Ok(rows) => {
                success.push(format!("{}\t{}", id, rows.len()));
                objects.extend(rows);
            }
            Err(err) => failure.push(format!("{}\t{}", id, err)),
        }
    }

    if !success.is_empty() {
        let mut df = objects
            .to_dataframe()
            .map_err(|err| SorrelError::TableWriteError(err.to_string()))?;

        io::write_table(&mut df, output.join("objects.csv"))?;
    }

    write_summary(&output.join("object_counts.tsv"), &success)?;
    write_summary(&output.join("object_errors.tsv"), &failure)?;

    Ok(SegmentSummary {
        objects: objects.len(),
        success: success.len(),
        failure: failure.len(),
    })
}

/// Pair images with their point prompt files by identifier
fn collect_pairs(args: &SegmentPointsArgs, image_path: &Path) -> Vec<(String, PathBuf, PathBuf)> {
    if image_path.is_file() {
        let points_path = args.points.as_ref().map(PathBuf::from).unwrap_or_else(|| {
            eprintln!(
                "[sorrel::segment::points] ERROR: A point prompt file (--points/-p) must be provided for a single image."
            );
            std::process::exit(1);
        });

        if !points_path.is_file() {
            eprintln!(
                "[sorrel::segment::points] ERROR: If images is a file then points must be a file."
            );
            std::process::exit(1);
        }

        let id = ut::path::file_id(image_path, args.image_substring.as_deref());
        return vec![(id, image_path.to_path_buf(), points_path)];
    }

    let points_path = args
        .points
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or(image_path.to_path_buf());

    let image_files = ut::path::collect_file_paths(
        image_path,
        constant::SUPPORTED_IMAGE_FORMATS.as_slice(),
        args.image_substring.to_owned(),
    )
    .unwrap_or_else(|err| {
        eprintln!("{}", err);
        std::process::exit(1);
    });

    let points_files = ut::path::collect_file_paths(
        &points_path,
        constant::SUPPORTED_POINT_FORMATS.as_slice(),
        args.points_substring.to_owned(),
    )
    .unwrap_or_else(|err| {
        eprintln!("{}", err);
        std::process::exit(1);
    });

    if image_files.is_empty() {
        eprintln!(
            "[sorrel::segment::points] ERROR: No image files were detected. Please check your path and/or substring identifier."
        );
        std::process::exit(1);
    }

    if points_files.is_empty() {
        eprintln!(
            "[sorrel::segment::points] ERROR: No point prompt files were detected. Please check your path and/or substring identifier."
        );
        std::process::exit(1);
    }

    ut::path::collect_file_pairs(
        &image_files,
        &points_files,
        args.image_substring.to_owned(),
        args.points_substring.to_owned(),
    )
}

/// Select a compute device, exiting if the requested accelerator is missing
fn select_device(device: &str, verbose: bool) -> Device {
    if device == "cuda" && !cuda_is_available() {
        eprintln!(
            "[sorrel::segment::points] ERROR: Device 'cuda' specified but no cuda device was detected."
        );
        std::process::exit(1);
    }

    if device == "metal" && !metal_is_available() {
        eprintln!(
            "[sorrel::segment::points] ERROR: Device 'metal' specified but no metal device was detected."
        );
        std::process::exit(1);
    }

    let selected = match device {
        "cuda" => Device::new_cuda(0),
        "metal" => Device::new_metal(0),
        _ => Ok(Device::Cpu),
    };

    let selected = selected.unwrap_or_else(|err| {
        eprintln!(
            "[sorrel::segment::points] ERROR: Could not initialize {} device. {}",
            device, err
        );
        std::process::exit(1);
    });

    if !matches!(selected, Device::Cpu) {
        ut::track::progress_log(&format!("Using {} device.", device), verbose);
    }

    selected
}

/// Segment every prompt of an image, composite the masks and write the outputs
fn segment_image<M: PointSegmenter>(
    id: &str,
    image_path: &Path,
    points_path: &Path,
    predictor: &Predictor<M>,
    settings: &SegmentSettings,
    output: &Path,
) -> Result<ObjectRows, SorrelError> {
    let image = im::SorrelImage::open(image_path)?;
    let points = im::Points::open(points_path)?;

    let (height, width) = (image.height(), image.width());

    points.validate(height, width)?;

    let masks = predictor
        .predict_all(&image, &points)
        .map_err(|err| SorrelError::OtherError(err.to_string()))?;

    let composite = if settings.strict {
        cv::composite_strict(&masks, (height, width), settings.area)?
    } else {
        cv::composite(&masks, (height, width), settings.area)?
    };

    for &index in composite.empty.iter() {
        let point = points.as_slice()[index];
        ut::track::progress_warn(&format!(
            "{}: prompt {} at (row = {}, col = {}) produced an empty mask.",
            id, index, point.row, point.col
        ));
    }

    composite
        .labels
        .save(output.join(format!("{}_labels.{}", id, settings.format)))?;

    if settings.overlay {
        cv::render_overlay(&image, &composite.labels, points.as_slice(), settings.alpha)?
            .save(output.join(format!("{}_overlay.png", id)))
            .map_err(|_| SorrelError::ImageWriteError)?;
    }

    let pixels = composite.labels.pixel_counts(composite.n_labels());

    let mut rows = ObjectRows::default();
    for (position, (&source, &area)) in composite
        .sources
        .iter()
        .zip(composite.areas.iter())
        .enumerate()
    {
        let label = position as u32 + 1;
        let point = points.as_slice()[source];

        rows.image.push(id.to_string());
        rows.label.push(label);
        rows.prompt.push(source as u32);
        rows.row.push(point.row);
        rows.col.push(point.col);
        rows.positive.push(point.positive);
        rows.area.push(area);
        rows.pixels.push(pixels[label as usize]);
    }

    Ok(rows)
}

/// Write tab-separated summary lines, skipping empty summaries
fn write_summary(path: &Path, lines: &[String]) -> Result<(), SorrelError> {
    if lines.is_empty() {
        return Ok(());
    }

    std::fs::write(path, lines.join("\n"))
        .map_err(|_| SorrelError::TableWriteError(format!("Failed to write {}", path.display())))
}
