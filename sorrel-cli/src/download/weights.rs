// Copyright (c) 2025, Tom Ouellette
// Licensed under the MIT License

use clap::Args;
use colored::Colorize;

use sorrel_core::ut::track::progress_log;
use sorrel_data::data::Weights;

#[derive(Debug, Args)]
#[command(about = "Download pre-trained segment anything weights.")]
pub struct DownloadWeightsArgs {
    #[arg(short, long, help = "Weights name (e.g. sam_vit_b).")]
    pub name: Option<String>,

    #[arg(short = 'v', long, help = "Verbose output.")]
    pub verbose: bool,

    #[arg(long, help = "List all available weights.")]
    pub list: bool,

    #[arg(long, help = "Download all available weights.")]
    pub all: bool,
}

pub fn download_weights(args: &DownloadWeightsArgs) {
    if args.list {
        print_weights();
        return;
    }

    let selected: Vec<Weights> = if args.all {
        progress_log("Downloading all weights to cache", args.verbose);
        Weights::iter().copied().collect()
    } else {
        let Some(name) = args.name.as_ref() else {
            eprintln!(
                "[sorrel::download::weights] ERROR: The weights --name/-n must be specified. Run `sorrel download weights --list` to see all available weights."
            );
            std::process::exit(1);
        };

        let weights = Weights::select(name).unwrap_or_else(|err| {
            eprintln!("[sorrel::download::weights] ERROR: {}", err);
            std::process::exit(1);
        });

        vec![weights]
    };

    for weights in selected {
        match weights.download(args.verbose) {
            Ok(path) => progress_log(
                &format!("{} weights stored at {}", weights.model_name(), path.display()),
                args.verbose,
            ),
            Err(err) => {
                eprintln!(
                    "[sorrel::download::weights] ERROR: Failed to download {}. {}",
                    weights.model_name(),
                    err
                );
                std::process::exit(1);
            }
        }
    }
}

fn print_weights() {
    println!("{:^69}", "\n");
    println!("| {:-^74} |", "");
    println!("| {:^74} |", "sorrel".truecolor(176, 58, 46).bold());
    println!("| {:^74} |", "Pre-trained segment anything weights");
    println!("| {:-^18} | {:-^19} | {:-^10} | {:-^18} |", "", "", "", "");
    println!(
        "| {:^18} | {:^19} | {:^10} | {:^18} |",
        "model".bold(),
        "author".bold(),
        "size (GB)".bold(),
        "license".bold()
    );
    println!("| {:-^18} | {:-^19} | {:-^10} | {:-^18} |", "", "", "", "");

    for weights in Weights::iter() {
        println!(
            "| {:^18} | {:^19} | {:^10} | {:^18} |",
            weights.model_name(),
            weights.data_authors(),
            weights.data_size(),
            weights.license(),
        );
    }

    println!("| {:-^18} | {:-^19} | {:-^10} | {:-^18} |", "", "", "", "");
    println!("{:^69}", "\n");
}
