// Copyright (c) 2025, Tom Ouellette
// Licensed under the BSD 3-Clause License

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::Args;
use kdam::TqdmParallelIterator;
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use sorrel_core::constant;
use sorrel_core::cv::{self, AreaStrategy};
use sorrel_core::error::SorrelError;
use sorrel_core::im;
use sorrel_core::ut;

#[derive(Debug, Args)]
#[command(about = "Merge a directory of binary masks into a label image.")]
pub struct CompositeArgs {
    #[arg(
        short = 'i',
        long,
        help = "Mask directory or a directory of mask directories.",
        required = true
    )]
    pub input: Option<String>,

    #[arg(
        short = 'o',
        long,
        help = "Output label image (.tif, .tiff, .png, .npy) or output directory.",
        required = true
    )]
    pub output: Option<String>,

    #[arg(long, help = "Mask area used for ordering (first, total).", default_value = "first")]
    pub area: String,

    #[arg(long, help = "Fail if any mask is empty.")]
    pub strict: bool,

    #[arg(
        long,
        help = "Label image format when writing to a directory (tif, tiff, png, npy).",
        default_value = "tif"
    )]
    pub format: String,

    #[arg(long, help = "Substring specifying masks (e.g. _mask).")]
    pub mask_substring: Option<String>,

    #[arg(short = 't', long, help = "Number of threads.")]
    pub threads: Option<usize>,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,
}

pub fn utils_composite(args: &CompositeArgs) {
    if let Some(threads) = args.threads.to_owned() {
        if threads < 1 {
            eprintln!(
                "[sorrel::utils::composite] ERROR: Threads must be set to a positive integer if provided."
            );
            std::process::exit(1);
        }

        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .unwrap_or_else(|_| {
                eprintln!("[sorrel::utils::composite] ERROR: Could not build thread pool.");
                std::process::exit(1);
            });
    }

    let strategy = args.area.parse::<AreaStrategy>().unwrap_or_else(|_| {
        eprintln!("[sorrel::utils::composite] ERROR: Invalid area strategy. Must be one of: first, total.");
        std::process::exit(1);
    });

    let input = PathBuf::from(args.input.to_owned().unwrap_or_default());
    let output = PathBuf::from(args.output.to_owned().unwrap_or_default());

    if !input.is_dir() {
        eprintln!(
            "[sorrel::utils::composite] ERROR: Input {} must be a directory.",
            input.display()
        );
        std::process::exit(1);
    }

    let mut masks = ut::path::collect_file_paths(
        &input,
        constant::SUPPORTED_IMAGE_FORMATS.as_slice(),
        args.mask_substring.to_owned(),
    )
    .unwrap_or_else(|err| {
        eprintln!("{}", err);
        std::process::exit(1);
    });

    // A label image written into the mask directory is not a mask
    masks.retain(|mask| !same_path(mask, &output));

    let output_extension = output
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());

    if !masks.is_empty() {
        let Some(ext) = output_extension else {
            eprintln!(
                "[sorrel::utils::composite] ERROR: If input is a mask directory then output must be a label image file."
            );
            std::process::exit(1);
        };

        if !constant::LABEL_FORMATS.contains(&ext.as_str()) {
            eprintln!(
                "[sorrel::utils::composite] ERROR: Invalid label image extension {}. Must be one of: {:?}.",
                ext,
                constant::LABEL_FORMATS
            );
            std::process::exit(1);
        }

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                eprintln!(
                    "[sorrel::utils::composite] ERROR: Invalid file path. Parent directory of output file path does not exist."
                );
                std::process::exit(1);
            }
        }

        let n_objects = composite_directory(
            &masks,
            &output,
            strategy,
            args.strict,
        )
        .unwrap_or_else(|err| {
            eprintln!("[sorrel::utils::composite] ERROR: {}", err);
            std::process::exit(1);
        });

        ut::track::progress_log(
            &format!(
                "Complete. {} masks merged into {}.",
                ut::track::thousands_format(n_objects),
                output.display()
            ),
            args.verbose,
        );

        return;
    }

    if output_extension.is_some() {
        eprintln!(
            "[sorrel::utils::composite] ERROR: If input is a directory of mask directories then output must be a directory."
        );
        std::process::exit(1);
    }

    let format = args.format.to_lowercase();
    if !constant::LABEL_FORMATS.contains(&format.as_str()) {
        eprintln!(
            "[sorrel::utils::composite] ERROR: Invalid label image format {}. Must be one of: {:?}.",
            format,
            constant::LABEL_FORMATS
        );
        std::process::exit(1);
    }

    let mut directories = collect_directories(&input).unwrap_or_else(|err| {
        eprintln!("{}", err);
        std::process::exit(1);
    });

    directories.retain(|directory| !same_path(directory, &output));

    if directories.is_empty() {
        eprintln!(
            "[sorrel::utils::composite] ERROR: No masks or mask directories were detected. Please check your path and/or substring identifier."
        );
        std::process::exit(1);
    }

    ut::track::progress_log(
        &format!(
            "Detected {} mask directories.",
            ut::track::thousands_format(directories.len())
        ),
        args.verbose,
    );

    let output = ut::path::create_directory(&output).unwrap_or_else(|_| {
        eprintln!("[sorrel::utils::composite] ERROR: Could not create directory.");
        std::process::exit(1);
    });

    let pb = ut::track::progress_bar(directories.len(), "Compositing masks", args.verbose);

    let success: Mutex<Vec<String>> = Mutex::new(Vec::with_capacity(directories.len()));
    let failure: Mutex<Vec<String>> = Mutex::new(Vec::new());

    (0..directories.len())
        .into_par_iter()
        .tqdm_with_bar(pb)
        .for_each(|idx| {
            let directory = &directories[idx];
            let id = directory
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();

            let run = ut::path::collect_file_paths(
                directory,
                constant::SUPPORTED_IMAGE_FORMATS.as_slice(),
                args.mask_substring.to_owned(),
            )
            .and_then(|masks| {
                composite_directory(
                    &masks,
                    &output.join(format!("{}_labels.{}", id, format)),
                    strategy,
                    args.strict,
                )
            });

            match run {
                Ok(n) => success
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(format!("{}\t{}", id, n)),
                Err(err) => failure
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .push(format!("{}\t{}", id, err)),
            }
        });

    let mut success = success.into_inner().unwrap_or_else(|e| e.into_inner());
    let mut failure = failure.into_inner().unwrap_or_else(|e| e.into_inner());

    success.sort();
    failure.sort();

    if args.verbose {
        println!();
    }

    let message = if !failure.is_empty() {
        format!(
            "Complete. {} mask directories succesfully merged. {} mask directories failed.",
            ut::track::thousands_format(success.len()),
            ut::track::thousands_format(failure.len())
        )
    } else {
        format!(
            "Complete. {} mask directories merged.",
            ut::track::thousands_format(success.len())
        )
    };

    ut::track::progress_log(&message, args.verbose);

    for (name, lines) in [("object_counts.tsv", &success), ("object_errors.tsv", &failure)] {
        if !lines.is_empty() {
            std::fs::write(output.join(name), lines.join("\n")).unwrap_or_else(|_| {
                eprintln!("[sorrel::utils::composite] ERROR: Failed to write {}.", name);
                std::process::exit(1);
            });
        }
    }
}

/// Whether two paths name the same existing file or directory
fn same_path(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Sorted sub-directories of a directory
fn collect_directories(directory: &Path) -> Result<Vec<PathBuf>, SorrelError> {
    let mut directories: Vec<PathBuf> = std::fs::read_dir(directory)
        .map_err(|err| SorrelError::DirError(err.to_string()))?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();

    directories.sort();

    Ok(directories)
}

/// Merge masks, in file name order, into a label image and return the number of labels
fn composite_directory(
    masks: &[PathBuf],
    output: &Path,
    strategy: AreaStrategy,
    strict: bool,
) -> Result<u32, SorrelError> {
    let first = masks
        .first()
        .ok_or_else(|| SorrelError::NoFileError("No masks found".to_string()))?;

    let masks = masks
        .iter()
        .map(im::BinaryMask::open)
        .collect::<Result<Vec<im::BinaryMask>, SorrelError>>()?;

    let shape = (masks[0].height(), masks[0].width());

    let composite = if strict {
        cv::composite_strict(&masks, shape, strategy)?
    } else {
        cv::composite(&masks, shape, strategy)?
    };

    for &index in composite.empty.iter() {
        ut::track::progress_warn(&format!(
            "Mask {} in {} is empty.",
            index,
            first
                .parent()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        ));
    }

    composite.labels.save(output)?;

    Ok(composite.n_labels())
}
